use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::process::ExitCode;
use tracing::error;

use crate::api::{RawTerms, ServerConfig, run_http_server, validate_terms};
use crate::core::{Schedule, compute_schedule, format_cents};

#[derive(Parser, Debug)]
#[command(
    name = "repayment-schedule",
    about = "Repayment schedules for fixed-rate annuity loans"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTML form and the JSON API
    Serve {
        #[arg(long, env = "REPAYMENT_SCHEDULE_HOST", default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(long, env = "REPAYMENT_SCHEDULE_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Print the schedule for one set of loan terms
    Schedule(ScheduleArgs),
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    #[arg(long, help = "Loan amount, at most two decimal places")]
    pub loan_amount: f64,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Annual debit interest in percent, e.g. 2.12"
    )]
    pub debit_interest: f64,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Repayment in the first year in percent of the loan, 1 to 100"
    )]
    pub initial_repayment: f64,
    #[arg(long, help = "Duration in years, 1 to 60")]
    pub duration_years: u32,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

impl From<&ScheduleArgs> for RawTerms {
    fn from(args: &ScheduleArgs) -> Self {
        RawTerms {
            loan_amount: Some(args.loan_amount),
            debit_interest_in_percentage: Some(args.debit_interest),
            initial_repayment_in_percentage: Some(args.initial_repayment),
            duration_in_years: Some(args.duration_years),
        }
    }
}

pub async fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { host, port } => {
            if let Err(err) = run_http_server(ServerConfig::new(host, port)).await {
                error!(%err, "server error");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Command::Schedule(args) => print_schedule(&args),
    }
}

fn print_schedule(args: &ScheduleArgs) -> ExitCode {
    let terms = match validate_terms(RawTerms::from(args)) {
        Ok(terms) => terms,
        Err(errors) => {
            for field_error in errors.errors() {
                eprintln!("{}: {}", field_error.field, field_error.message);
            }
            return ExitCode::from(2);
        }
    };

    let schedule = match compute_schedule(&terms) {
        Ok(schedule) => schedule,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match args.format {
        OutputFormat::Table => print!("{}", render_table(&schedule)),
        OutputFormat::Json => match serde_json::to_string_pretty(&schedule) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("Failed to serialize schedule: {err}");
                return ExitCode::FAILURE;
            }
        },
    }
    ExitCode::SUCCESS
}

fn render_table(schedule: &Schedule) -> String {
    let mut out = table_line("Date", "Remaining loan", "Interest", "Repayment", "Annuity");
    for entry in schedule.entries() {
        out.push_str(&table_line(
            &entry.date.format("%Y-%m-%d").to_string(),
            &format_cents(entry.remaining_loan_in_cents),
            &format_cents(entry.interest_in_cents),
            &format_cents(entry.repayment_in_cents),
            &format_cents(entry.annuity_in_cents),
        ));
    }
    out
}

fn table_line(
    date: &str,
    remaining: &str,
    interest: &str,
    repayment: &str,
    annuity: &str,
) -> String {
    format!("{date:<10}  {remaining:>16}  {interest:>14}  {repayment:>14}  {annuity:>14}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LoanTerms, compute_schedule_from};
    use chrono::NaiveDate;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn schedule_args_parse_from_flags() {
        let cli = Cli::try_parse_from([
            "repayment-schedule",
            "schedule",
            "--loan-amount",
            "100000",
            "--debit-interest",
            "2.12",
            "--initial-repayment",
            "2",
            "--duration-years",
            "10",
            "--format",
            "json",
        ])
        .expect("valid arguments");

        let Command::Schedule(args) = cli.command else {
            panic!("expected schedule subcommand");
        };
        assert_eq!(args.format, OutputFormat::Json);

        let terms = validate_terms(RawTerms::from(&args)).expect("valid terms");
        assert_eq!(terms.principal, 100_000.0);
        assert_eq!(terms.annual_interest_rate_percent, 2.12);
        assert_eq!(terms.initial_repayment_rate_percent, 2.0);
        assert_eq!(terms.duration_years, 10);
    }

    #[test]
    fn serve_uses_defaults() {
        let cli = Cli::try_parse_from(["repayment-schedule", "serve"]).expect("valid arguments");
        let Command::Serve { host, port } = cli.command else {
            panic!("expected serve subcommand");
        };
        // Env fallbacks may override the defaults.
        if std::env::var_os("REPAYMENT_SCHEDULE_PORT").is_none() {
            assert_eq!(port, 8080);
        }
        if std::env::var_os("REPAYMENT_SCHEDULE_HOST").is_none() {
            assert_eq!(host, IpAddr::from([0, 0, 0, 0]));
        }
    }

    #[test]
    fn negative_rates_reach_validation() {
        let cli = Cli::try_parse_from([
            "repayment-schedule",
            "schedule",
            "--loan-amount",
            "1000",
            "--debit-interest",
            "-1",
            "--initial-repayment",
            "2",
            "--duration-years",
            "5",
        ])
        .expect("negative numbers are accepted by the parser");
        let Command::Schedule(args) = cli.command else {
            panic!("expected schedule subcommand");
        };
        assert_eq!(args.format, OutputFormat::Table);
        assert!(validate_terms(RawTerms::from(&args)).is_err());
    }

    #[test]
    fn render_table_lists_every_entry() {
        let terms = LoanTerms {
            principal: 100_000.0,
            annual_interest_rate_percent: 2.12,
            initial_repayment_rate_percent: 2.0,
            duration_years: 10,
        };
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date");
        let schedule = compute_schedule_from(&terms, today).expect("valid terms");
        let table = render_table(&schedule);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 123);
        assert!(lines[0].starts_with("Date"));
        assert_eq!(
            lines[2],
            "2026-11-30        -99,833.34          176.67          166.66          343.33"
        );
        assert!(lines[122].starts_with("2036-11-30"));
        assert!(lines[122].ends_with("41,199.60"));
    }
}
