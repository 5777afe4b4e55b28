use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{
    LoanTerms, MAX_DURATION_YEARS, MAX_PRINCIPAL, MAX_RATE_PERCENT, decimal_places,
};

pub const LOAN_AMOUNT: &str = "loanAmount";
pub const DEBIT_INTEREST: &str = "debitInterestInPercentage";
pub const INITIAL_REPAYMENT: &str = "initialRepaymentInPercentage";
pub const DURATION: &str = "durationInYears";

const MIN_LOAN_AMOUNT: f64 = 0.01;
const MAX_AMOUNT_DECIMALS: usize = 2;

/// Numeric loan parameters as submitted, before any checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawTerms {
    pub loan_amount: Option<f64>,
    pub debit_interest_in_percentage: Option<f64>,
    pub initial_repayment_in_percentage: Option<f64>,
    pub duration_in_years: Option<u32>,
}

/// HTML form fields as submitted. Values stay strings so that they can be
/// shown back to the user unchanged when validation fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepaymentForm {
    pub loan_amount: Option<String>,
    pub debit_interest_in_percentage: Option<String>,
    pub initial_repayment_in_percentage: Option<String>,
    pub duration_in_years: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|error| error.field == field)
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}

/// Checks numeric input and turns it into [`LoanTerms`], collecting every
/// failing field.
pub fn validate_terms(raw: RawTerms) -> Result<LoanTerms, ValidationErrors> {
    let mut checks = FieldChecks::default();
    let principal = checks.check(LOAN_AMOUNT, check_loan_amount(raw.loan_amount));
    let interest = checks.check(
        DEBIT_INTEREST,
        check_debit_interest(raw.debit_interest_in_percentage),
    );
    let repayment = checks.check(
        INITIAL_REPAYMENT,
        check_initial_repayment(raw.initial_repayment_in_percentage),
    );
    let duration = checks.check(DURATION, check_duration(raw.duration_in_years));
    checks.into_terms(principal, interest, repayment, duration)
}

impl RepaymentForm {
    pub fn validate(&self) -> Result<LoanTerms, ValidationErrors> {
        let mut checks = FieldChecks::default();
        let principal = checks.check(
            LOAN_AMOUNT,
            parse_number(self.loan_amount.as_deref()).and_then(check_loan_amount),
        );
        let interest = checks.check(
            DEBIT_INTEREST,
            parse_number(self.debit_interest_in_percentage.as_deref())
                .and_then(check_debit_interest),
        );
        let repayment = checks.check(
            INITIAL_REPAYMENT,
            parse_number(self.initial_repayment_in_percentage.as_deref())
                .and_then(check_initial_repayment),
        );
        let duration = checks.check(
            DURATION,
            parse_number(self.duration_in_years.as_deref()).and_then(check_duration),
        );
        checks.into_terms(principal, interest, repayment, duration)
    }
}

#[derive(Default)]
struct FieldChecks {
    errors: Vec<FieldError>,
}

impl FieldChecks {
    fn check<T>(&mut self, field: &'static str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.errors.push(FieldError { field, message });
                None
            }
        }
    }

    fn into_terms(
        self,
        principal: Option<f64>,
        interest: Option<f64>,
        repayment: Option<f64>,
        duration: Option<u32>,
    ) -> Result<LoanTerms, ValidationErrors> {
        match (principal, interest, repayment, duration) {
            (Some(principal), Some(interest), Some(repayment), Some(duration))
                if self.errors.is_empty() =>
            {
                Ok(LoanTerms {
                    principal,
                    annual_interest_rate_percent: interest,
                    initial_repayment_rate_percent: repayment,
                    duration_years: duration,
                })
            }
            _ => Err(ValidationErrors {
                errors: self.errors,
            }),
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<&str>) -> Result<Option<T>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<T>()
            .map(Some)
            .map_err(|_| "must be a number".to_string()),
    }
}

fn required<T>(value: Option<T>) -> Result<T, String> {
    value.ok_or_else(|| "is required".to_string())
}

fn finite(value: Option<f64>) -> Result<f64, String> {
    let value = required(value)?;
    if !value.is_finite() {
        return Err("must be a number".to_string());
    }
    Ok(value)
}

fn check_loan_amount(value: Option<f64>) -> Result<f64, String> {
    let amount = finite(value)?;
    if amount < MIN_LOAN_AMOUNT {
        return Err(format!("must be at least {MIN_LOAN_AMOUNT}"));
    }
    if amount > MAX_PRINCIPAL {
        return Err(format!("must be at most {MAX_PRINCIPAL}"));
    }
    if decimal_places(amount) > MAX_AMOUNT_DECIMALS {
        return Err(format!(
            "must have at most {MAX_AMOUNT_DECIMALS} decimal places"
        ));
    }
    Ok(amount)
}

fn check_debit_interest(value: Option<f64>) -> Result<f64, String> {
    let rate = finite(value)?;
    if !(0.0..=MAX_RATE_PERCENT).contains(&rate) {
        return Err(format!("must be between 0 and {MAX_RATE_PERCENT}"));
    }
    Ok(rate)
}

fn check_initial_repayment(value: Option<f64>) -> Result<f64, String> {
    let rate = finite(value)?;
    if !(1.0..=100.0).contains(&rate) {
        return Err("must be between 1 and 100".to_string());
    }
    Ok(rate)
}

fn check_duration(value: Option<u32>) -> Result<u32, String> {
    let years = required(value)?;
    if !(1..=MAX_DURATION_YEARS).contains(&years) {
        return Err(format!("must be between 1 and {MAX_DURATION_YEARS}"));
    }
    Ok(years)
}
