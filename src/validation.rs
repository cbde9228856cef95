use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PlanError;

static COURSE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}\d{4}[A-Z]{0,2}$").expect("regex compiles"));

/// Upper-cases and trims `value`, rejecting anything not shaped like `COP3502C`.
pub fn validate_course_code(value: &str) -> Result<String, PlanError> {
    let code = value.trim().to_ascii_uppercase();
    if COURSE_CODE.is_match(&code) {
        Ok(code)
    } else {
        Err(PlanError::InvalidCourseCode(value.trim().to_string()))
    }
}

pub fn validate_course_codes<S: AsRef<str>>(values: &[S]) -> Result<Vec<String>, PlanError> {
    if values.is_empty() {
        return Err(PlanError::EmptyRequest);
    }
    values
        .iter()
        .map(|v| validate_course_code(v.as_ref()))
        .collect()
}
