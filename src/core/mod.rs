mod calendar;
mod engine;
mod money;
mod types;

pub use calendar::YearMonth;
pub use engine::{annuity_month, compute_schedule, compute_schedule_from, monthly_interest};
pub use money::{decimal_places, format_cents, to_cents};
pub use types::{
    LoanTerms, MAX_DURATION_YEARS, MAX_PRINCIPAL, MAX_RATE_PERCENT, MonthlyEntry, Schedule,
    ScheduleError,
};
