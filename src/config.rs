use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ConfigError;

/// Calculator settings read from a TOML file.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub defaults: Defaults,
    pub tenure: TenureConfig,
    pub slider: SliderConfig,
}

/// Values a fresh session starts from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    pub interest_rate_percent: f64,
    pub processing_fee_percent: f64,
    pub tenure_months: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            interest_rate_percent: 10.0,
            processing_fee_percent: 1.0,
            tenure_months: 12,
        }
    }
}

/// Tenures offered as buttons, in display order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TenureConfig {
    pub options: Vec<u32>,
}

impl Default for TenureConfig {
    fn default() -> Self {
        Self {
            options: vec![3, 6, 12, 24, 36, 48, 60],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SliderConfig {
    /// Slider movement per key press, as a percent of the slider's range.
    pub step_percent: f64,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self { step_percent: 1.0 }
    }
}

impl Config {
    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to the built-in defaults when the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let options = &self.tenure.options;
        if options.is_empty() {
            return Err(invalid("tenure.options", "at least one tenure is required"));
        }
        if options.contains(&0) {
            return Err(invalid("tenure.options", "tenures must be at least one month"));
        }
        for (i, months) in options.iter().enumerate() {
            if options[..i].contains(months) {
                return Err(invalid(
                    "tenure.options",
                    format!("{months} months is listed twice"),
                ));
            }
        }
        if !options.contains(&self.defaults.tenure_months) {
            return Err(invalid(
                "defaults.tenure_months",
                format!(
                    "{} is not one of the tenure options {options:?}",
                    self.defaults.tenure_months
                ),
            ));
        }

        non_negative("defaults.interest_rate_percent", self.defaults.interest_rate_percent)?;
        non_negative("defaults.processing_fee_percent", self.defaults.processing_fee_percent)?;

        let step = self.slider.step_percent;
        if !step.is_finite() || step <= 0.0 || step > 100.0 {
            return Err(invalid(
                "slider.step_percent",
                format!("must be in (0, 100], got {step}"),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, format!("must be a non-negative number, got {value}")));
    }
    Ok(())
}
