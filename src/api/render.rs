use super::validation::{
    DEBIT_INTEREST, DURATION, FieldError, INITIAL_REPAYMENT, LOAN_AMOUNT, RepaymentForm,
    ValidationErrors,
};
use crate::core::{LoanTerms, MonthlyEntry, Schedule, format_cents};

pub const FORM_PATH: &str = "/repaymentSchedule";

/// Input page. On a failed submission `errors` is set and the submitted
/// values are shown again.
pub fn form_page(form: &RepaymentForm, errors: Option<&ValidationErrors>) -> String {
    let fields = [
        (LOAN_AMOUNT, "Loan amount", form.loan_amount.as_deref(), "0.01"),
        (
            DEBIT_INTEREST,
            "Debit interest (%)",
            form.debit_interest_in_percentage.as_deref(),
            "0.01",
        ),
        (
            INITIAL_REPAYMENT,
            "Initial repayment (%)",
            form.initial_repayment_in_percentage.as_deref(),
            "0.01",
        ),
        (
            DURATION,
            "Duration (years)",
            form.duration_in_years.as_deref(),
            "1",
        ),
    ];

    let mut body = format!("<form class=\"terms\" method=\"post\" action=\"{FORM_PATH}\">\n");
    for (name, label, value, step) in fields {
        let error = errors.and_then(|errors| errors.for_field(name));
        body.push_str(&field_html(name, label, value.unwrap_or_default(), step, error));
    }
    body.push_str("  <button type=\"submit\">Compute schedule</button>\n</form>\n");

    page("Repayment schedule", &body)
}

fn field_html(
    name: &str,
    label: &str,
    value: &str,
    step: &str,
    error: Option<&FieldError>,
) -> String {
    let class = if error.is_some() { " class=\"invalid\"" } else { "" };
    let mut html = format!(
        "  <label for=\"{name}\">{label}</label>\n  \
         <input id=\"{name}\" name=\"{name}\" type=\"number\" step=\"{step}\" value=\"{}\"{class}>\n",
        escape_html(value)
    );
    if let Some(error) = error {
        html.push_str(&format!(
            "  <span class=\"field-error\">{}</span>\n",
            escape_html(&error.message)
        ));
    }
    html
}

/// Result page: the accepted terms followed by the schedule table.
pub fn schedule_page(terms: &LoanTerms, schedule: &Schedule) -> String {
    let mut body = format!(
        "<dl class=\"terms\">\n  \
         <dt>Loan amount</dt><dd>{}</dd>\n  \
         <dt>Debit interest</dt><dd>{} %</dd>\n  \
         <dt>Initial repayment</dt><dd>{} %</dd>\n  \
         <dt>Duration</dt><dd>{} years</dd>\n</dl>\n",
        format_cents(terms.principal_in_cents()),
        terms.annual_interest_rate_percent,
        terms.initial_repayment_rate_percent,
        schedule.duration_years()
    );

    body.push_str(
        "<table class=\"schedule\">\n  <thead><tr><th>Date</th><th>Remaining loan</th>\
         <th>Interest</th><th>Repayment</th><th>Annuity</th></tr></thead>\n  <tbody>\n",
    );
    let last = schedule.len().saturating_sub(1);
    for (idx, entry) in schedule.entries().iter().enumerate() {
        body.push_str(&row_html(entry, idx == 0 || idx == last));
    }
    body.push_str("  </tbody>\n</table>\n");
    body.push_str(&format!(
        "<a class=\"back\" href=\"{FORM_PATH}\">New calculation</a>\n"
    ));

    page("Repayment schedule", &body)
}

fn row_html(entry: &MonthlyEntry, boundary: bool) -> String {
    let class = if boundary { " class=\"boundary\"" } else { "" };
    format!(
        "    <tr{class}><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        entry.date.format("%Y-%m-%d"),
        format_cents(entry.remaining_loan_in_cents),
        format_cents(entry.interest_in_cents),
        format_cents(entry.repayment_in_cents),
        format_cents(entry.annuity_in_cents),
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<link rel=\"stylesheet\" href=\"/styles.css\">\n</head>\n\
         <body>\n<main>\n<h1>{title}</h1>\n{body}</main>\n</body>\n</html>\n"
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compute_schedule_from;
    use chrono::NaiveDate;

    fn reference_terms() -> LoanTerms {
        LoanTerms {
            principal: 100_000.0,
            annual_interest_rate_percent: 2.12,
            initial_repayment_rate_percent: 2.0,
            duration_years: 10,
        }
    }

    #[test]
    fn escape_html_neutralises_markup() {
        assert_eq!(
            escape_html("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn empty_form_page_has_every_input() {
        let html = form_page(&RepaymentForm::default(), None);
        for name in [LOAN_AMOUNT, DEBIT_INTEREST, INITIAL_REPAYMENT, DURATION] {
            assert!(html.contains(&format!("name=\"{name}\"")), "missing {name}");
        }
        assert!(!html.contains("field-error"));
    }

    #[test]
    fn invalid_form_page_keeps_values_and_lists_errors() {
        let form = RepaymentForm {
            loan_amount: Some("<script>".to_string()),
            debit_interest_in_percentage: Some("2.12".to_string()),
            initial_repayment_in_percentage: Some("2".to_string()),
            duration_in_years: Some("99".to_string()),
        };
        let errors = form.validate().expect_err("must reject");
        let html = form_page(&form, Some(&errors));

        assert!(html.contains("value=\"&lt;script&gt;\""));
        assert!(!html.contains("<script>"));
        assert!(html.contains("value=\"2.12\""));
        assert!(html.contains("must be a number"));
        assert!(html.contains("must be between 1 and 60"));
        assert_eq!(html.matches("class=\"invalid\"").count(), 2);
    }

    #[test]
    fn schedule_page_lists_major_unit_amounts() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date");
        let schedule = compute_schedule_from(&reference_terms(), today).expect("valid terms");
        let html = schedule_page(&reference_terms(), &schedule);

        assert!(html.contains("<dd>100,000.00</dd>"));
        assert!(html.contains("<dd>2.12 %</dd>"));
        assert!(html.contains(
            "<td>2026-11-30</td><td>-99,833.34</td><td>176.67</td><td>166.66</td><td>343.33</td>"
        ));
        assert!(html.contains(
            "<tr class=\"boundary\"><td>2036-11-30</td><td>-77,744.14</td><td>18,943.74</td>\
             <td>22,255.86</td><td>41,199.60</td></tr>"
        ));
        assert_eq!(html.matches("<tr class=\"boundary\">").count(), 2);
        assert_eq!(html.matches("<tr").count(), 123);
    }
}
