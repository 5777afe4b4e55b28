use chrono::{Local, NaiveDate};
use tracing::debug;

use super::calendar::YearMonth;
use super::types::{LoanTerms, MonthlyEntry, Schedule, ScheduleError};

#[derive(Debug, Default, Clone, Copy)]
struct RunningTotals {
    annuity: i64,
    interest: i64,
    repayment: i64,
}

impl RunningTotals {
    fn add(&mut self, annuity: i64, interest: i64, repayment: i64) -> Result<(), ScheduleError> {
        self.annuity = checked(self.annuity.checked_add(annuity))?;
        self.interest = checked(self.interest.checked_add(interest))?;
        self.repayment = checked(self.repayment.checked_add(repayment))?;
        Ok(())
    }
}

/// Computes the repayment schedule anchored to the current local month.
pub fn compute_schedule(terms: &LoanTerms) -> Result<Schedule, ScheduleError> {
    compute_schedule_from(terms, Local::now().date_naive())
}

/// Computes the repayment schedule anchored to the month containing `today`.
///
/// Every entry is dated at the last day of its month. The first entry models
/// an immediate full repayment, regular repayment starts the following month,
/// and the last entry carries the accumulated totals of all regular months
/// together with whatever balance is left at the end of the duration.
pub fn compute_schedule_from(
    terms: &LoanTerms,
    today: NaiveDate,
) -> Result<Schedule, ScheduleError> {
    terms.check()?;

    let principal_in_cents = terms.principal_in_cents();
    let annuity = annuity_month(terms);

    let current_month = YearMonth::from_date(today);
    let first_month = current_month
        .next()
        .ok_or_else(|| out_of_range(current_month))?;
    let last_month = first_month
        .plus_years(terms.duration_years)
        .ok_or_else(|| out_of_range(first_month))?;

    let mut entries = Vec::with_capacity(terms.duration_years as usize * 12 + 2);
    entries.push(MonthlyEntry {
        date: end_of_month(current_month)?,
        annuity_in_cents: -principal_in_cents,
        interest_in_cents: 0,
        repayment_in_cents: -principal_in_cents,
        remaining_loan_in_cents: -principal_in_cents,
    });

    let mut totals = RunningTotals::default();
    let mut remaining_loan = principal_in_cents;
    let mut month = first_month;
    while month < last_month {
        let interest = monthly_interest(remaining_loan, terms.annual_interest_rate_percent);
        let repayment = checked(annuity.checked_sub(interest))?;
        remaining_loan = checked(remaining_loan.checked_sub(repayment))?;

        entries.push(entry_for(month, annuity, interest, repayment, remaining_loan)?);
        totals.add(annuity, interest, repayment)?;

        month = month.next().ok_or_else(|| out_of_range(month))?;
    }

    // Settlement carries totals, not a further payment.
    entries.push(entry_for(
        last_month,
        totals.annuity,
        totals.interest,
        totals.repayment,
        remaining_loan,
    )?);

    debug!(
        entries = entries.len(),
        annuity_in_cents = annuity,
        residual_in_cents = remaining_loan,
        "computed repayment schedule"
    );

    Ok(Schedule::new(terms.duration_years, entries))
}

/// Fixed monthly annuity in cents.
///
/// The yearly amount is truncated before the integer division by twelve, so
/// the schedule undershoots and the remainder shows up in the settlement
/// entry rather than overpaying.
pub fn annuity_month(terms: &LoanTerms) -> i64 {
    let yearly_rate =
        (terms.annual_interest_rate_percent + terms.initial_repayment_rate_percent) / 100.0;
    (yearly_rate * terms.principal_in_cents() as f64) as i64 / 12
}

/// Interest for one month on `remaining_loan` cents, with ties rounded up.
///
/// Ties go toward positive infinity for negative balances too, so `-0.5`
/// becomes `0`.
pub fn monthly_interest(remaining_loan: i64, annual_interest_rate_percent: f64) -> i64 {
    let monthly_rate = (annual_interest_rate_percent / 100.0) / 12.0;
    (remaining_loan as f64 * monthly_rate + 0.5).floor() as i64
}

fn checked(amount: Option<i64>) -> Result<i64, ScheduleError> {
    amount.ok_or_else(|| {
        ScheduleError::invalid_terms(
            "principal",
            "is too large for the given rates and duration",
        )
    })
}

fn entry_for(
    month: YearMonth,
    annuity: i64,
    interest: i64,
    repayment: i64,
    remaining_loan: i64,
) -> Result<MonthlyEntry, ScheduleError> {
    Ok(MonthlyEntry {
        date: end_of_month(month)?,
        annuity_in_cents: annuity,
        interest_in_cents: interest,
        repayment_in_cents: repayment,
        remaining_loan_in_cents: checked(remaining_loan.checked_neg())?,
    })
}

fn end_of_month(month: YearMonth) -> Result<NaiveDate, ScheduleError> {
    month.at_end_of_month().ok_or_else(|| out_of_range(month))
}

fn out_of_range(month: YearMonth) -> ScheduleError {
    ScheduleError::DateOutOfRange(format!("{:04}-{:02}", month.year(), month.month()))
}
