//! Interactive loan state.
//!
//! All mutation goes through [`LoanState::apply`], which assigns the edited
//! field and then runs the recomputation steps listed by [`recompute_plan`].
//! After every successful call the installment equals
//! `engine::monthly_installment` of the current down payment.

use tracing::debug;

use crate::config::Config;
use crate::engine;
use crate::error::{LoanError, LoanResult};

/// A user-editable input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    AssetCost,
    InterestRate,
    ProcessingFee,
    Tenure,
    DownPayment,
    MonthlyInstallment,
}

/// A new value for one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edit {
    AssetCost(f64),
    InterestRate(f64),
    ProcessingFee(f64),
    Tenure(u32),
    DownPayment(f64),
    MonthlyInstallment(f64),
}

impl Edit {
    pub fn field(&self) -> Field {
        match self {
            Edit::AssetCost(_) => Field::AssetCost,
            Edit::InterestRate(_) => Field::InterestRate,
            Edit::ProcessingFee(_) => Field::ProcessingFee,
            Edit::Tenure(_) => Field::Tenure,
            Edit::DownPayment(_) => Field::DownPayment,
            Edit::MonthlyInstallment(_) => Field::MonthlyInstallment,
        }
    }
}

/// One recomputation performed after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Pull the down payment back into `[0, asset_cost]`.
    ClampDownPayment,
    /// Pull the installment back into the installment range.
    ClampInstallment,
    /// Derive the down payment from the installment.
    DownPayment,
    /// Derive the installment from the down payment.
    Installment,
    /// Derive both totals.
    Totals,
}

const AFTER_DOWN_PAYMENT: &[Step] = &[Step::ClampDownPayment, Step::Installment, Step::Totals];
const AFTER_RATE_OR_TENURE: &[Step] = &[Step::Installment, Step::Totals];
const AFTER_FEE: &[Step] = &[Step::Totals];
const AFTER_INSTALLMENT: &[Step] = &[
    Step::ClampInstallment,
    Step::DownPayment,
    Step::Installment,
    Step::Totals,
];

/// Steps run, in order, after `field` changes.
pub fn recompute_plan(field: Field) -> &'static [Step] {
    match field {
        Field::AssetCost | Field::DownPayment => AFTER_DOWN_PAYMENT,
        Field::InterestRate | Field::Tenure => AFTER_RATE_OR_TENURE,
        Field::ProcessingFee => AFTER_FEE,
        Field::MonthlyInstallment => AFTER_INSTALLMENT,
    }
}

/// Amounts shown under the two sliders.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    /// Down payment plus processing fee.
    pub down_payment: f64,
    /// Every installment over the tenure.
    pub installments: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoanState {
    asset_cost: f64,
    annual_interest_rate_percent: f64,
    processing_fee_percent: f64,
    tenure_months: u32,
    tenure_options: Vec<u32>,
    down_payment: f64,
    monthly_installment: f64,
    totals: Totals,
    defined: bool,
}

impl LoanState {
    /// Empty state: no asset cost yet, so the calculation is undefined.
    pub fn new(
        tenure_options: Vec<u32>,
        tenure_months: u32,
        annual_interest_rate_percent: f64,
        processing_fee_percent: f64,
    ) -> LoanResult<Self> {
        if !tenure_options.contains(&tenure_months) {
            return Err(LoanError::out_of_range(
                "tenure_months",
                format!("{tenure_months} is not one of {tenure_options:?}"),
            ));
        }
        ensure_non_negative("annual_interest_rate_percent", annual_interest_rate_percent)?;
        ensure_non_negative("processing_fee_percent", processing_fee_percent)?;

        Ok(Self {
            asset_cost: 0.0,
            annual_interest_rate_percent,
            processing_fee_percent,
            tenure_months,
            tenure_options,
            down_payment: 0.0,
            monthly_installment: 0.0,
            totals: Totals::default(),
            defined: false,
        })
    }

    pub fn from_config(config: &Config) -> LoanResult<Self> {
        Self::new(
            config.tenure.options.clone(),
            config.defaults.tenure_months,
            config.defaults.interest_rate_percent,
            config.defaults.processing_fee_percent,
        )
    }

    pub fn asset_cost(&self) -> f64 {
        self.asset_cost
    }

    pub fn annual_interest_rate_percent(&self) -> f64 {
        self.annual_interest_rate_percent
    }

    pub fn processing_fee_percent(&self) -> f64 {
        self.processing_fee_percent
    }

    pub fn tenure_months(&self) -> u32 {
        self.tenure_months
    }

    pub fn tenure_options(&self) -> &[u32] {
        &self.tenure_options
    }

    pub fn down_payment(&self) -> f64 {
        self.down_payment
    }

    pub fn monthly_installment(&self) -> f64 {
        self.monthly_installment
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// False while the calculation has no numeric answer, e.g. before an
    /// asset cost is entered. Derived amounts are all zero in that case.
    pub fn is_defined(&self) -> bool {
        self.defined
    }

    pub fn down_payment_percent(&self) -> f64 {
        if self.asset_cost > 0.0 {
            self.down_payment * 100.0 / self.asset_cost
        } else {
            0.0
        }
    }

    /// Installment slider bounds, or `None` while undefined.
    pub fn installment_range(&self) -> Option<(f64, f64)> {
        if !self.defined {
            return None;
        }
        engine::installment_range(
            self.asset_cost,
            self.annual_interest_rate_percent,
            self.tenure_months,
        )
        .ok()
    }

    /// Applies one edit and recomputes the dependent fields.
    ///
    /// An out-of-range edit is rejected and leaves the state untouched. An
    /// edit that makes the calculation undefined is accepted: the down
    /// payment, installment and totals drop to zero.
    pub fn apply(&mut self, edit: Edit) -> LoanResult<()> {
        self.validate(edit)?;

        let mut next = self.clone();
        next.assign(edit);

        let plan = recompute_plan(edit.field());
        debug!(field = ?edit.field(), steps = ?plan, "recomputing loan state");

        match next.run(plan) {
            // A fee edit recomputes totals only; they stay zero while undefined.
            Ok(()) if !next.defined => next.reset_derived(),
            Ok(()) => {}
            Err(err) if err.is_undefined() => {
                debug!(field = ?edit.field(), error = %err, "calculation undefined, resetting");
                next.reset_derived();
            }
            Err(err) => return Err(err),
        }

        *self = next;
        Ok(())
    }

    fn validate(&self, edit: Edit) -> LoanResult<()> {
        match edit {
            Edit::AssetCost(value) => ensure_non_negative("asset_cost", value),
            Edit::InterestRate(value) => ensure_non_negative("annual_interest_rate_percent", value),
            Edit::ProcessingFee(value) => ensure_non_negative("processing_fee_percent", value),
            Edit::Tenure(months) if !self.tenure_options.contains(&months) => {
                Err(LoanError::out_of_range(
                    "tenure_months",
                    format!("{months} is not one of {:?}", self.tenure_options),
                ))
            }
            Edit::Tenure(_) => Ok(()),
            Edit::DownPayment(value) => ensure_finite("down_payment", value),
            Edit::MonthlyInstallment(value) => ensure_finite("monthly_installment", value),
        }
    }

    fn assign(&mut self, edit: Edit) {
        match edit {
            Edit::AssetCost(value) => self.asset_cost = value,
            Edit::InterestRate(value) => self.annual_interest_rate_percent = value,
            Edit::ProcessingFee(value) => self.processing_fee_percent = value,
            Edit::Tenure(months) => self.tenure_months = months,
            Edit::DownPayment(value) => self.down_payment = value,
            Edit::MonthlyInstallment(value) => self.monthly_installment = value,
        }
    }

    fn run(&mut self, plan: &[Step]) -> LoanResult<()> {
        for step in plan {
            match step {
                Step::ClampDownPayment => {
                    self.down_payment = self.down_payment.max(0.0).min(self.asset_cost);
                }
                Step::ClampInstallment => {
                    let (min, max) = engine::installment_range(
                        self.asset_cost,
                        self.annual_interest_rate_percent,
                        self.tenure_months,
                    )?;
                    self.monthly_installment = self.monthly_installment.max(min).min(max);
                }
                Step::DownPayment => {
                    let down_payment = engine::down_payment(
                        self.asset_cost,
                        self.annual_interest_rate_percent,
                        self.tenure_months,
                        self.monthly_installment,
                    )?;
                    // Rounding a fractional cost can overshoot it by less than a unit.
                    self.down_payment = down_payment.max(0.0).min(self.asset_cost);
                }
                Step::Installment => {
                    self.monthly_installment = engine::monthly_installment(
                        self.asset_cost,
                        self.annual_interest_rate_percent,
                        self.tenure_months,
                        self.down_payment,
                    )?;
                    self.defined = true;
                }
                Step::Totals => {
                    self.totals = Totals {
                        down_payment: engine::total_down_payment_outlay(
                            self.asset_cost,
                            self.down_payment,
                            self.processing_fee_percent,
                        )?,
                        installments: engine::total_installment_outlay(
                            self.monthly_installment,
                            self.tenure_months,
                        )?,
                    };
                }
            }
        }
        Ok(())
    }

    fn reset_derived(&mut self) {
        self.down_payment = 0.0;
        self.monthly_installment = 0.0;
        self.totals = Totals::default();
        self.defined = false;
    }
}

fn ensure_finite(field: &str, value: f64) -> LoanResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LoanError::out_of_range(field, "must be a finite number"))
    }
}

fn ensure_non_negative(field: &str, value: f64) -> LoanResult<()> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(LoanError::out_of_range(
            field,
            format!("must not be negative (got {value})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const OPTIONS: [u32; 7] = [3, 6, 12, 24, 36, 48, 60];

    fn state() -> LoanState {
        LoanState::new(OPTIONS.to_vec(), 12, 10.0, 1.0).unwrap()
    }

    fn priced(cost: f64) -> LoanState {
        let mut state = state();
        state.apply(Edit::AssetCost(cost)).unwrap();
        state
    }

    fn assert_consistent(state: &LoanState) {
        if !state.is_defined() {
            assert_eq!(state.down_payment(), 0.0);
            assert_eq!(state.monthly_installment(), 0.0);
            return;
        }
        let expected = engine::monthly_installment(
            state.asset_cost(),
            state.annual_interest_rate_percent(),
            state.tenure_months(),
            state.down_payment(),
        )
        .unwrap();
        assert_eq!(state.monthly_installment(), expected);
        assert!(state.down_payment() >= 0.0 && state.down_payment() <= state.asset_cost());
    }

    #[test]
    fn starts_undefined() {
        let state = state();
        assert!(!state.is_defined());
        assert_eq!(state.monthly_installment(), 0.0);
        assert_eq!(state.totals(), Totals::default());
        assert_eq!(state.installment_range(), None);
    }

    #[test]
    fn plans_follow_the_transition_table() {
        assert_eq!(
            recompute_plan(Field::AssetCost),
            &[Step::ClampDownPayment, Step::Installment, Step::Totals]
        );
        assert_eq!(recompute_plan(Field::Tenure), &[Step::Installment, Step::Totals]);
        assert_eq!(recompute_plan(Field::InterestRate), &[Step::Installment, Step::Totals]);
        assert_eq!(recompute_plan(Field::ProcessingFee), &[Step::Totals]);
        assert_eq!(
            recompute_plan(Field::MonthlyInstallment),
            &[
                Step::ClampInstallment,
                Step::DownPayment,
                Step::Installment,
                Step::Totals
            ]
        );
    }

    #[test]
    fn entering_cost_computes_installment_and_totals() {
        let state = priced(100_000.0);
        assert!(state.is_defined());
        assert_eq!(state.monthly_installment(), 83_333.0);
        assert_eq!(
            state.totals(),
            Totals {
                down_payment: 1_000.0,
                installments: 999_996.0,
            }
        );
        assert_eq!(state.installment_range(), Some((0.0, 83_333.0)));
    }

    #[test]
    fn moving_down_payment_updates_installment() {
        let mut state = priced(100_000.0);
        state.apply(Edit::DownPayment(20_000.0)).unwrap();
        assert_eq!(state.down_payment(), 20_000.0);
        assert_eq!(state.monthly_installment(), 66_667.0);
        assert_eq!(state.totals().down_payment, 20_800.0);
        assert_eq!(state.totals().installments, 66_667.0 * 12.0);
        assert_eq!(state.down_payment_percent(), 20.0);
    }

    #[test]
    fn moving_installment_updates_down_payment() {
        let mut state = priced(100_000.0);
        state.apply(Edit::MonthlyInstallment(50_000.0)).unwrap();
        assert_eq!(state.down_payment(), 40_000.0);
        assert_eq!(state.monthly_installment(), 50_000.0);
        assert_consistent(&state);
    }

    #[test]
    fn slider_values_are_clamped() {
        let mut state = priced(100_000.0);

        state.apply(Edit::DownPayment(250_000.0)).unwrap();
        assert_eq!(state.down_payment(), 100_000.0);
        assert_eq!(state.monthly_installment(), 0.0);

        state.apply(Edit::MonthlyInstallment(1_000_000.0)).unwrap();
        assert_eq!(state.monthly_installment(), 83_333.0);
        assert_eq!(state.down_payment(), 0.0);

        state.apply(Edit::DownPayment(-5.0)).unwrap();
        assert_eq!(state.down_payment(), 0.0);
    }

    #[test]
    fn lowering_cost_pulls_down_payment_along() {
        let mut state = priced(100_000.0);
        state.apply(Edit::DownPayment(80_000.0)).unwrap();
        state.apply(Edit::AssetCost(50_000.0)).unwrap();
        assert_eq!(state.down_payment(), 50_000.0);
        assert_consistent(&state);
    }

    #[test]
    fn tenure_change_keeps_down_payment() {
        let mut state = priced(100_000.0);
        state.apply(Edit::DownPayment(20_000.0)).unwrap();
        let before = state.monthly_installment();

        state.apply(Edit::Tenure(60)).unwrap();
        assert_eq!(state.down_payment(), 20_000.0);
        assert!(state.monthly_installment() < before);
        assert_eq!(
            state.totals().installments,
            state.monthly_installment() * 60.0
        );
        assert_consistent(&state);
    }

    #[test]
    fn fee_change_only_touches_totals() {
        let mut state = priced(100_000.0);
        state.apply(Edit::DownPayment(20_000.0)).unwrap();
        state.apply(Edit::ProcessingFee(2.5)).unwrap();
        assert_eq!(state.down_payment(), 20_000.0);
        assert_eq!(state.monthly_installment(), 66_667.0);
        assert_eq!(state.totals().down_payment, 22_000.0);
    }

    #[test]
    fn clearing_cost_resets_sliders() {
        let mut state = priced(100_000.0);
        state.apply(Edit::DownPayment(20_000.0)).unwrap();
        state.apply(Edit::AssetCost(0.0)).unwrap();

        assert!(!state.is_defined());
        assert_eq!(state.down_payment(), 0.0);
        assert_eq!(state.monthly_installment(), 0.0);
        assert_eq!(state.totals(), Totals::default());

        state.apply(Edit::MonthlyInstallment(500.0)).unwrap();
        assert!(!state.is_defined());
        assert_eq!(state.monthly_installment(), 0.0);
    }

    #[test]
    fn fee_change_after_vanishing_rate_keeps_totals_zero() {
        let mut state = priced(100_000.0);
        state.apply(Edit::InterestRate(1e-300)).unwrap();
        assert!(!state.is_defined());

        state.apply(Edit::ProcessingFee(2.0)).unwrap();
        assert!(!state.is_defined());
        assert_eq!(state.down_payment(), 0.0);
        assert_eq!(state.monthly_installment(), 0.0);
        assert_eq!(state.totals(), Totals::default());
    }

    #[test]
    fn fee_change_after_uninvertible_installment_keeps_totals_zero() {
        let mut state = state();
        state.apply(Edit::InterestRate(0.0)).unwrap();
        state.apply(Edit::Tenure(60)).unwrap();
        // 20 / 60 rounds to a zero full-loan installment.
        state.apply(Edit::AssetCost(20.0)).unwrap();
        state.apply(Edit::MonthlyInstallment(0.0)).unwrap();
        assert!(!state.is_defined());

        state.apply(Edit::ProcessingFee(10.0)).unwrap();
        assert!(!state.is_defined());
        assert_eq!(state.totals(), Totals::default());
    }

    #[test]
    fn fee_change_while_undefined_stays_undefined() {
        let mut state = state();
        state.apply(Edit::ProcessingFee(3.0)).unwrap();
        assert!(!state.is_defined());
        assert_eq!(state.processing_fee_percent(), 3.0);
    }

    #[test]
    fn rejected_edits_leave_state_untouched() {
        let mut state = priced(100_000.0);
        state.apply(Edit::DownPayment(20_000.0)).unwrap();
        let before = state.clone();

        for edit in [
            Edit::Tenure(7),
            Edit::AssetCost(-1.0),
            Edit::InterestRate(f64::NAN),
            Edit::ProcessingFee(-0.5),
            Edit::DownPayment(f64::INFINITY),
        ] {
            let err = state.apply(edit).unwrap_err();
            assert!(matches!(err, LoanError::OutOfRangeInput { .. }), "{edit:?}");
            assert_eq!(state, before);
        }
    }

    #[test]
    fn zero_interest_rate_uses_even_split() {
        let mut state = priced(120_000.0);
        state.apply(Edit::InterestRate(0.0)).unwrap();
        assert_eq!(state.monthly_installment(), 10_000.0);
        state.apply(Edit::MonthlyInstallment(7_500.0)).unwrap();
        assert_eq!(state.down_payment(), 30_000.0);
    }

    #[test]
    fn every_edit_keeps_installment_consistent() {
        let mut state = state();
        let edits = [
            Edit::AssetCost(350_000.0),
            Edit::DownPayment(35_000.0),
            Edit::Tenure(36),
            Edit::MonthlyInstallment(4_000.0),
            Edit::InterestRate(12.5),
            Edit::MonthlyInstallment(9_999.0),
            Edit::AssetCost(99_999.5),
            Edit::Tenure(3),
            Edit::DownPayment(12_345.0),
            Edit::ProcessingFee(0.0),
            Edit::AssetCost(0.0),
            Edit::AssetCost(42_000.0),
        ];
        for edit in edits {
            state.apply(edit).unwrap();
            assert_consistent(&state);
        }
    }

    #[test]
    fn rejects_unknown_default_tenure() {
        assert!(LoanState::new(OPTIONS.to_vec(), 18, 10.0, 1.0).is_err());
    }
}
