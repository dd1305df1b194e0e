use thiserror::Error;

/// Errors raised by the calculation engine and the loan state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoanError {
    /// The calculation has no numeric answer (zero cost, zero denominator).
    #[error("Undefined calculation: {context}")]
    UndefinedCalculation { context: String },

    #[error("Input out of range for {field}: {reason}")]
    OutOfRangeInput { field: String, reason: String },
}

impl LoanError {
    pub(crate) fn undefined(context: impl Into<String>) -> Self {
        LoanError::UndefinedCalculation {
            context: context.into(),
        }
    }

    pub(crate) fn out_of_range(field: impl Into<String>, reason: impl Into<String>) -> Self {
        LoanError::OutOfRangeInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, LoanError::UndefinedCalculation { .. })
    }
}

pub type LoanResult<T> = Result<T, LoanError>;

/// Errors raised while loading the TOML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}
