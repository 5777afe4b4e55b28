use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use super::money::to_cents;

pub const MAX_DURATION_YEARS: u32 = 60;
/// Largest accepted principal in major units.
pub const MAX_PRINCIPAL: f64 = 1_000_000_000.0;
/// Upper bound for both the interest and the initial repayment rate.
pub const MAX_RATE_PERCENT: f64 = 100.0;

/// Loan parameters for one schedule computation.
///
/// Rates are percentages as entered by the user (`2.12` means 2.12 %).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanTerms {
    pub principal: f64,
    pub annual_interest_rate_percent: f64,
    pub initial_repayment_rate_percent: f64,
    pub duration_years: u32,
}

impl LoanTerms {
    pub fn principal_in_cents(&self) -> i64 {
        to_cents(self.principal)
    }

    pub(crate) fn check(&self) -> Result<(), ScheduleError> {
        if !self.principal.is_finite() || self.principal_in_cents() <= 0 {
            return Err(ScheduleError::invalid_terms(
                "principal",
                "must be a positive amount of at least one cent",
            ));
        }
        if self.principal > MAX_PRINCIPAL {
            return Err(ScheduleError::invalid_terms(
                "principal",
                format!("must be at most {MAX_PRINCIPAL}"),
            ));
        }
        check_rate(
            "annual_interest_rate_percent",
            self.annual_interest_rate_percent,
        )?;
        check_rate(
            "initial_repayment_rate_percent",
            self.initial_repayment_rate_percent,
        )?;
        if !(1..=MAX_DURATION_YEARS).contains(&self.duration_years) {
            return Err(ScheduleError::invalid_terms(
                "duration_years",
                format!("must be between 1 and {MAX_DURATION_YEARS}"),
            ));
        }
        Ok(())
    }
}

fn check_rate(field: &'static str, rate: f64) -> Result<(), ScheduleError> {
    if !(0.0..=MAX_RATE_PERCENT).contains(&rate) {
        return Err(ScheduleError::invalid_terms(
            field,
            format!("must be between 0 and {MAX_RATE_PERCENT}"),
        ));
    }
    Ok(())
}

/// One row of a repayment schedule. Amounts are in cents.
///
/// `remaining_loan_in_cents` is the negated outstanding balance: debt is
/// negative, so a larger magnitude means more is owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEntry {
    pub date: NaiveDate,
    pub annuity_in_cents: i64,
    pub interest_in_cents: i64,
    pub repayment_in_cents: i64,
    pub remaining_loan_in_cents: i64,
}

/// Result of one computation: the payoff snapshot, every regular month and
/// the settlement entry, ordered by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    duration_years: u32,
    entries: Vec<MonthlyEntry>,
}

impl Schedule {
    pub fn new(duration_years: u32, mut entries: Vec<MonthlyEntry>) -> Self {
        entries.sort_by_key(|entry| entry.date);
        Self {
            duration_years,
            entries,
        }
    }

    pub fn duration_years(&self) -> u32 {
        self.duration_years
    }

    pub fn entries(&self) -> &[MonthlyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The leading entry that models paying the whole loan off today.
    pub fn payoff_entry(&self) -> Option<&MonthlyEntry> {
        self.entries.first()
    }

    /// The trailing entry with accumulated totals and the residual balance.
    pub fn settlement_entry(&self) -> Option<&MonthlyEntry> {
        if self.entries.len() < 2 {
            return None;
        }
        self.entries.last()
    }

    /// Entries between the payoff snapshot and the settlement entry.
    pub fn regular_entries(&self) -> &[MonthlyEntry] {
        match self.entries.len() {
            0..=2 => &[],
            len => &self.entries[1..len - 1],
        }
    }

    pub fn into_entries(self) -> Vec<MonthlyEntry> {
        self.entries
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Invalid loan terms: {field} {reason}")]
    InvalidTerms { field: &'static str, reason: String },

    #[error("Schedule date out of range: {0}")]
    DateOutOfRange(String),
}

impl ScheduleError {
    pub fn invalid_terms(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTerms {
            field,
            reason: reason.into(),
        }
    }
}
