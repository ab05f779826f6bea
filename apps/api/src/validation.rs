//! Field-level checks shared by the resource services.

use std::str::FromStr;

use url::Url;

use crate::errors::{AppError, FieldErrors};

/// Records an error when `value` is longer than `max` characters.
pub fn check_max_len(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("Ensure this field has no more than {max} characters."),
        );
    }
}

/// Blank, or an absolute http(s) URL no longer than `max` characters.
pub fn check_url(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.is_empty() {
        return;
    }
    check_max_len(errors, field, value, max);
    let valid = Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false);
    if !valid {
        errors.add(field, "Enter a valid URL.");
    }
}

/// Required text: present and not blank once trimmed.
pub fn require_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max: usize,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => {
            check_max_len(errors, field, &v, max);
            Some(v)
        }
        Some(_) => {
            errors.add(field, "This field may not be blank.");
            None
        }
        None => {
            errors.add(field, "This field is required.");
            None
        }
    }
}

/// Form-encoded booleans as browsers and HTTP clients send them.
pub fn parse_form_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Parses a record id taken from the URL. An id that cannot exist is reported
/// the same way as one that does not.
pub fn path_id<T: FromStr>(raw: &str, resource: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("{resource} not found")))
}
