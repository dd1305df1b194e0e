use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

use crate::state::LoanState;

/// Snapshot of a loan state, as printed by `emi quote` or exported from the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub asset_cost: f64,
    pub annual_interest_rate_percent: f64,
    pub processing_fee_percent: f64,
    pub tenure_months: u32,
    pub defined: bool,
    pub down_payment: f64,
    pub down_payment_percent: f64,
    pub monthly_installment: f64,
    pub total_down_payment: f64,
    pub total_installments: f64,
}

impl From<&LoanState> for Quote {
    fn from(state: &LoanState) -> Self {
        let totals = state.totals();
        Self {
            asset_cost: state.asset_cost(),
            annual_interest_rate_percent: state.annual_interest_rate_percent(),
            processing_fee_percent: state.processing_fee_percent(),
            tenure_months: state.tenure_months(),
            defined: state.is_defined(),
            down_payment: state.down_payment(),
            down_payment_percent: state.down_payment_percent(),
            monthly_installment: state.monthly_installment(),
            total_down_payment: totals.down_payment,
            total_installments: totals.installments,
        }
    }
}

impl Quote {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Cost of Asset   {}", format_amount(self.asset_cost))?;
        writeln!(f, "Interest Rate         {}%", self.annual_interest_rate_percent)?;
        writeln!(f, "Processing Fee        {}%", self.processing_fee_percent)?;
        writeln!(f, "Tenure                {} months", self.tenure_months)?;
        if !self.defined {
            return writeln!(f, "No calculation: enter the cost of the asset");
        }
        writeln!(
            f,
            "Down Payment          {} ({:.1}%)",
            format_amount(self.down_payment),
            self.down_payment_percent
        )?;
        writeln!(f, "Loan per Month        {}", format_amount(self.monthly_installment))?;
        writeln!(f, "Total Down Payment    {}", format_amount(self.total_down_payment))?;
        writeln!(f, "Total Loan Amount     {}", format_amount(self.total_installments))
    }
}

/// Whole currency units with comma thousands separators.
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Edit;
    use pretty_assertions::assert_eq;

    fn quote() -> Quote {
        let mut state = LoanState::new(vec![12, 24], 12, 10.0, 1.0).unwrap();
        state.apply(Edit::AssetCost(100_000.0)).unwrap();
        state.apply(Edit::DownPayment(20_000.0)).unwrap();
        Quote::from(&state)
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1_000.0), "1,000");
        assert_eq!(format_amount(83_333.0), "83,333");
        assert_eq!(format_amount(1_234_567.4), "1,234,567");
        assert_eq!(format_amount(-20_800.0), "-20,800");
    }

    #[test]
    fn snapshot_of_state() {
        let quote = quote();
        assert_eq!(
            quote,
            Quote {
                asset_cost: 100_000.0,
                annual_interest_rate_percent: 10.0,
                processing_fee_percent: 1.0,
                tenure_months: 12,
                defined: true,
                down_payment: 20_000.0,
                down_payment_percent: 20.0,
                monthly_installment: 66_667.0,
                total_down_payment: 20_800.0,
                total_installments: 800_004.0,
            }
        );
    }

    #[test]
    fn json_round_trips_through_serde() {
        let quote = quote();
        let json = quote.to_json().unwrap();
        assert!(json.contains("\"monthly_installment\": 66667.0"));
        let parsed: Quote = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, quote);
    }

    #[test]
    fn text_lists_totals() {
        let text = quote().to_string();
        assert!(text.contains("Loan per Month        66,667"));
        assert!(text.contains("Total Down Payment    20,800"));
        assert!(text.contains("Total Loan Amount     800,004"));
        assert!(text.contains("(20.0%)"));
    }

    #[test]
    fn text_for_undefined_state() {
        let state = LoanState::new(vec![12], 12, 10.0, 1.0).unwrap();
        let text = Quote::from(&state).to_string();
        assert!(text.contains("No calculation"));
        assert!(!text.contains("Loan per Month"));
    }
}
