use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::LoanResult;
use crate::quote::Quote;
use crate::state::{Edit, LoanState};

const PAGE_MULTIPLIER: f64 = 10.0;
pub const DEFAULT_EXPORT_PATH: &str = "emi_quote.json";

/// The control that receives key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    AssetCost,
    InterestRate,
    ProcessingFee,
    DownPayment,
    MonthlyInstallment,
    Tenure,
}

const FOCUS_ORDER: [Focus; 6] = [
    Focus::AssetCost,
    Focus::InterestRate,
    Focus::ProcessingFee,
    Focus::DownPayment,
    Focus::MonthlyInstallment,
    Focus::Tenure,
];

impl Focus {
    fn position(self) -> usize {
        FOCUS_ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        FOCUS_ORDER[(self.position() + 1) % FOCUS_ORDER.len()]
    }

    pub fn previous(self) -> Self {
        FOCUS_ORDER[(self.position() + FOCUS_ORDER.len() - 1) % FOCUS_ORDER.len()]
    }
}

/// Raw text of the three typed fields.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub asset_cost: String,
    pub interest_rate: String,
    pub processing_fee: String,
}

pub struct App {
    pub focus: Focus,
    pub inputs: Inputs,
    pub state: LoanState,
    pub step_percent: f64,
    pub status: Option<String>,
    pub export_path: PathBuf,
}

impl App {
    pub fn new(config: &Config) -> LoanResult<Self> {
        let state = LoanState::from_config(config)?;
        Ok(Self {
            focus: Focus::AssetCost,
            inputs: Inputs {
                asset_cost: String::new(),
                interest_rate: config.defaults.interest_rate_percent.to_string(),
                processing_fee: config.defaults.processing_fee_percent.to_string(),
            },
            state,
            step_percent: config.slider.step_percent,
            status: None,
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
        })
    }

    /// Handles one key press. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => {
                self.focus = self.focus.previous()
            }
            KeyCode::Char('e') => self.export(),
            _ => match self.focus {
                Focus::AssetCost | Focus::InterestRate | Focus::ProcessingFee => {
                    self.handle_text_input(key)
                }
                Focus::DownPayment | Focus::MonthlyInstallment => self.handle_slider_input(key),
                Focus::Tenure => self.handle_tenure_input(key),
            },
        }
        false
    }

    fn handle_text_input(&mut self, key: KeyEvent) {
        let buffer = match self.focus {
            Focus::AssetCost => &mut self.inputs.asset_cost,
            Focus::InterestRate => &mut self.inputs.interest_rate,
            Focus::ProcessingFee => &mut self.inputs.processing_fee,
            _ => return,
        };

        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => buffer.push(c),
            KeyCode::Char('.') if !buffer.contains('.') => buffer.push('.'),
            KeyCode::Backspace => {
                buffer.pop();
            }
            _ => return,
        }

        let value = parse_input(buffer);
        let edit = match self.focus {
            Focus::AssetCost => Edit::AssetCost(value),
            Focus::InterestRate => Edit::InterestRate(value),
            _ => Edit::ProcessingFee(value),
        };
        self.apply(edit);
    }

    fn handle_slider_input(&mut self, key: KeyEvent) {
        let (current, min, max) = match self.focus {
            Focus::DownPayment => (self.state.down_payment(), 0.0, self.state.asset_cost()),
            _ => match self.state.installment_range() {
                Some((min, max)) => (self.state.monthly_installment(), min, max),
                None => (0.0, 0.0, 0.0),
            },
        };
        let step = ((max - min) * self.step_percent / 100.0).max(1.0);

        let delta = match key.code {
            KeyCode::Right | KeyCode::Char('l') => step,
            KeyCode::Left | KeyCode::Char('h') => -step,
            KeyCode::PageUp => step * PAGE_MULTIPLIER,
            KeyCode::PageDown => -step * PAGE_MULTIPLIER,
            KeyCode::Home => {
                self.apply(self.slider_edit(min));
                return;
            }
            KeyCode::End => {
                self.apply(self.slider_edit(max));
                return;
            }
            _ => return,
        };

        // On a narrow installment range the derived down payment can map
        // back onto the current installment; keep going until it moves.
        let mut target = current + delta;
        loop {
            self.apply(self.slider_edit(target));
            if self.status.is_some()
                || self.slider_value() != current
                || target <= min
                || target >= max
            {
                break;
            }
            target += delta;
        }
    }

    fn slider_edit(&self, target: f64) -> Edit {
        match self.focus {
            Focus::DownPayment => Edit::DownPayment(target),
            _ => Edit::MonthlyInstallment(target),
        }
    }

    fn slider_value(&self) -> f64 {
        match self.focus {
            Focus::DownPayment => self.state.down_payment(),
            _ => self.state.monthly_installment(),
        }
    }

    fn handle_tenure_input(&mut self, key: KeyEvent) {
        let options = self.state.tenure_options();
        let Some(index) = options.iter().position(|m| *m == self.state.tenure_months()) else {
            return;
        };
        let index = match key.code {
            KeyCode::Right | KeyCode::Char('l') => (index + 1).min(options.len() - 1),
            KeyCode::Left | KeyCode::Char('h') => index.saturating_sub(1),
            KeyCode::Home => 0,
            KeyCode::End => options.len() - 1,
            _ => return,
        };
        let months = options[index];
        self.apply(Edit::Tenure(months));
    }

    fn apply(&mut self, edit: Edit) {
        match self.state.apply(edit) {
            Ok(()) => self.status = None,
            Err(err) => {
                warn!(?edit, error = %err, "edit rejected");
                self.status = Some(err.to_string());
            }
        }
    }

    fn export(&mut self) {
        match self.export_quote() {
            Ok(()) => {
                info!(path = %self.export_path.display(), "exported quote");
                self.status = Some(format!("Exported quote to {}", self.export_path.display()));
            }
            Err(err) => {
                warn!(error = %err, "quote export failed");
                self.status = Some(format!("Export failed: {err:#}"));
            }
        }
    }

    pub fn export_quote(&self) -> Result<()> {
        let file = File::create(&self.export_path)
            .with_context(|| format!("creating {}", self.export_path.display()))?;
        Quote::from(&self.state)
            .write_json(BufWriter::new(file))
            .context("writing quote")?;
        Ok(())
    }
}

/// Empty or lone-dot text counts as zero.
fn parse_input(buffer: &str) -> f64 {
    buffer.parse().unwrap_or(0.0)
}
