//! Loan calculation engine.
//!
//! Every function here is pure: the result depends only on the arguments.
//! Amounts are whole currency units after rounding; rates are percentages.

use crate::error::{LoanError, LoanResult};

const MONTHS_PER_YEAR: f64 = 12.0;

/// Rounds to the nearest whole currency unit, halves going up.
pub fn round_currency(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn ensure_non_negative(field: &str, value: f64) -> LoanResult<()> {
    if !value.is_finite() {
        return Err(LoanError::out_of_range(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(LoanError::out_of_range(
            field,
            format!("must not be negative (got {value})"),
        ));
    }
    Ok(())
}

fn ensure_tenure(tenure_months: u32) -> LoanResult<()> {
    if tenure_months == 0 {
        return Err(LoanError::out_of_range(
            "tenure_months",
            "tenure must be at least one month",
        ));
    }
    Ok(())
}

fn ensure_within_cost(asset_cost: f64, down_payment: f64) -> LoanResult<()> {
    if down_payment > asset_cost {
        return Err(LoanError::out_of_range(
            "down_payment",
            format!("{down_payment} exceeds the asset cost {asset_cost}"),
        ));
    }
    Ok(())
}

fn finite(value: f64, context: &str) -> LoanResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LoanError::undefined(format!("{context} is not a finite number")))
    }
}

/// Monthly installment for the amount left after `down_payment`.
///
/// The rate is applied once per year over `tenure_months / 12` years and the
/// result spread over twelve months:
///
/// ```text
/// r = rate / 100, n = tenure / 12
/// emi = round((loan + r (1 + r)^n) / ((1 + r)^n - 1) / 12)
/// ```
///
/// This is not a textbook amortization formula and quoted figures must
/// reproduce it exactly. At zero interest the denominator vanishes and the
/// loan is split evenly across the tenure instead.
pub fn monthly_installment(
    asset_cost: f64,
    annual_interest_rate_percent: f64,
    tenure_months: u32,
    down_payment: f64,
) -> LoanResult<f64> {
    ensure_non_negative("asset_cost", asset_cost)?;
    ensure_non_negative("annual_interest_rate_percent", annual_interest_rate_percent)?;
    ensure_non_negative("down_payment", down_payment)?;
    ensure_tenure(tenure_months)?;

    if asset_cost == 0.0 {
        return Err(LoanError::undefined("asset cost is zero"));
    }
    ensure_within_cost(asset_cost, down_payment)?;

    let loan_amount = asset_cost - down_payment;
    let rate = annual_interest_rate_percent / 100.0;

    if rate == 0.0 {
        return Ok(round_currency(loan_amount / f64::from(tenure_months)));
    }

    let years = f64::from(tenure_months) / MONTHS_PER_YEAR;
    let growth = finite((1.0 + rate).powf(years), "compound growth factor")?;
    let denominator = growth - 1.0;
    if denominator == 0.0 {
        return Err(LoanError::undefined("installment denominator is zero"));
    }

    let numerator = loan_amount + rate * growth;
    finite(
        round_currency(numerator / denominator / MONTHS_PER_YEAR),
        "monthly installment",
    )
}

/// Down payment that brings the installment down to `monthly_installment`.
///
/// Scales the asset cost by the share of the full-loan installment that
/// `monthly_installment` leaves unpaid. Exact when the installment is
/// proportional to the loan amount (zero interest); otherwise it drifts by
/// up to a couple of installment rounding steps.
pub fn down_payment(
    asset_cost: f64,
    annual_interest_rate_percent: f64,
    tenure_months: u32,
    monthly_installment: f64,
) -> LoanResult<f64> {
    ensure_non_negative("monthly_installment", monthly_installment)?;

    let full = self::monthly_installment(asset_cost, annual_interest_rate_percent, tenure_months, 0.0)?;
    if full == 0.0 {
        return Err(LoanError::undefined("full-loan installment is zero"));
    }
    if monthly_installment > full {
        return Err(LoanError::out_of_range(
            "monthly_installment",
            format!("{monthly_installment} exceeds the full-loan installment {full}"),
        ));
    }

    let down_payment_percent = 100.0 - (monthly_installment / full) * 100.0;
    finite(
        round_currency(asset_cost * down_payment_percent / 100.0),
        "down payment",
    )
}

/// Down payment plus the processing fee charged on the financed amount.
pub fn total_down_payment_outlay(
    asset_cost: f64,
    down_payment: f64,
    processing_fee_percent: f64,
) -> LoanResult<f64> {
    ensure_non_negative("asset_cost", asset_cost)?;
    ensure_non_negative("down_payment", down_payment)?;
    ensure_non_negative("processing_fee_percent", processing_fee_percent)?;
    ensure_within_cost(asset_cost, down_payment)?;

    let fee = (asset_cost - down_payment) * (processing_fee_percent / 100.0);
    Ok(round_currency(down_payment + fee))
}

/// Sum of all installments over the tenure.
pub fn total_installment_outlay(monthly_installment: f64, tenure_months: u32) -> LoanResult<f64> {
    ensure_non_negative("monthly_installment", monthly_installment)?;
    Ok(round_currency(monthly_installment * f64::from(tenure_months)))
}

/// Lowest and highest installment for the asset: full down payment first,
/// no down payment second.
pub fn installment_range(
    asset_cost: f64,
    annual_interest_rate_percent: f64,
    tenure_months: u32,
) -> LoanResult<(f64, f64)> {
    let min = monthly_installment(asset_cost, annual_interest_rate_percent, tenure_months, asset_cost)?;
    let max = monthly_installment(asset_cost, annual_interest_rate_percent, tenure_months, 0.0)?;
    Ok((min, max))
}
