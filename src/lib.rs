//! Repayment schedules for fixed-rate annuity loans.
//!
//! [`core`](crate::core) holds the amortization engine and its value types, [`api`] the
//! HTTP form and JSON API in front of it, and [`cli`] the command line.

pub mod api;
pub mod cli;
pub mod core;
