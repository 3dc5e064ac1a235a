//! Input validation for the report form, the login form and paging values.
//!
//! Validators return every failed rule as a [`ValidationErrors`] report
//! instead of stopping at the first one, so a form can mark each field.

use std::sync::OnceLock;

use affiliation_api::types::DataType;
use chrono::NaiveDate;
use regex::Regex;

use crate::date_range::{months_between, MAX_RANGE_MONTHS};
use crate::error::{DashboardError, ValidationErrors};

pub const MAX_CODE_LENGTH: usize = 100;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const MAX_PAGE_SIZE: i64 = 100;

pub const FIELD_CODE: &str = "input_value";
pub const FIELD_FROM_DATE: &str = "from_date";
pub const FIELD_TO_DATE: &str = "to_date";
pub const FIELD_DATA_TYPE: &str = "data_type";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PASSWORD: &str = "password";

/// Strip ASCII control characters (0x00-0x1F except space) and trim whitespace.
pub fn sanitize_text(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Raw report form values, as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportForm {
    pub input_value: String,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub summary: bool,
    pub data_type: Option<DataType>,
}

/// A report form that passed every rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedReportForm {
    pub code: String,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub summary: bool,
    pub data_type: DataType,
}

/// Checks the report form against `today` (app zone).
///
/// The range rules only run when both dates are present. The month check
/// compares month indexes, so Jan 31 to Apr 30 passes and Jan 1 to May 1
/// does not.
pub fn validate_report_form(
    form: &ReportForm,
    today: NaiveDate,
) -> Result<ValidatedReportForm, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let code = sanitize_text(&form.input_value);
    if code.is_empty() {
        errors.push(FIELD_CODE, "Input value is required");
    } else if code.chars().count() > MAX_CODE_LENGTH {
        errors.push(FIELD_CODE, "Input value cannot exceed 100 characters");
    }

    if form.from_date.is_some_and(|d| d > today) {
        errors.push(FIELD_FROM_DATE, "From date cannot be in the future");
    }
    if form.to_date.is_some_and(|d| d > today) {
        errors.push(FIELD_TO_DATE, "To date cannot be in the future");
    }

    if form.data_type.is_none() {
        errors.push(FIELD_DATA_TYPE, "Please select a type");
    }

    if let (Some(from), Some(to)) = (form.from_date, form.to_date) {
        if from > to {
            errors.push(FIELD_FROM_DATE, "From date cannot be after to date");
        }
        if months_between(from, to) > MAX_RANGE_MONTHS {
            errors.push(FIELD_TO_DATE, "Date range cannot exceed 3 months");
        }
    }

    errors.into_result(ValidatedReportForm {
        code,
        from_date: form.from_date,
        to_date: form.to_date,
        summary: form.summary,
        data_type: form.data_type.unwrap_or_default(),
    })
}

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"))
        .as_ref()
        .ok()
}

/// Checks login credentials before anything goes over the wire.
///
/// Only the first failing rule per field is reported.
pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let email = email.trim();
    if email.is_empty() {
        errors.push(FIELD_EMAIL, "Email is required");
    } else if !email_pattern().is_some_and(|re| re.is_match(email)) {
        errors.push(FIELD_EMAIL, "Please enter a valid email address");
    }

    let len = password.chars().count();
    if len == 0 {
        errors.push(FIELD_PASSWORD, "Password is required");
    } else if len < MIN_PASSWORD_LENGTH {
        errors.push(FIELD_PASSWORD, "Password must be at least 6 characters");
    } else if len > MAX_PASSWORD_LENGTH {
        errors.push(FIELD_PASSWORD, "Password must be less than 128 characters");
    }

    errors.into_result(())
}

/// Parses a data type name, case-insensitive.
pub fn validate_data_type(input: &str) -> Result<DataType, DashboardError> {
    match input.trim().to_uppercase().as_str() {
        "SALES" => Ok(DataType::Sales),
        "REGISTRATION" => Ok(DataType::Registration),
        _ => Err(single(
            FIELD_DATA_TYPE,
            format!(
                "unknown data type '{}'. Valid values: sales, registration",
                input
            ),
        )),
    }
}

/// Validate page number (must be >= 1).
pub fn validate_page(page: i64) -> Result<i64, DashboardError> {
    if page < 1 {
        return Err(single("page", "page must be >= 1"));
    }
    Ok(page)
}

/// Validate page size (must be 1..=100).
pub fn validate_page_size(page_size: i64) -> Result<i64, DashboardError> {
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(single(
            "page_size",
            format!("page size must be between 1 and {}", MAX_PAGE_SIZE),
        ));
    }
    Ok(page_size)
}

/// Parse a `YYYY-MM-DD` date.
pub fn validate_date(input: &str) -> Result<NaiveDate, DashboardError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        single(
            "date",
            format!("invalid date '{}'. Expected format: YYYY-MM-DD", input),
        )
    })
}

fn single(field: &'static str, message: impl Into<String>) -> DashboardError {
    let mut errors = ValidationErrors::new();
    errors.push(field, message);
    DashboardError::Validation(errors)
}
