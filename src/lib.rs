//! EMI loan calculator: calculation engine, interactive state and terminal UI.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod quote;
pub mod state;
pub mod ui;

pub use config::Config;
pub use error::{ConfigError, LoanError, LoanResult};
pub use quote::Quote;
pub use state::{Edit, Field, LoanState, Totals};
