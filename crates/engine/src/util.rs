//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation enforces the same invariants.

use chrono::{Datelike, NaiveDate};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const MIN_PASSWORD_LEN: usize = 6;

/// Collapse inner whitespace of a user supplied name.
pub(crate) fn normalize_display(input: &str) -> Option<String> {
    let mut out = String::new();
    for token in input.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Build the lookup key of a name: accents stripped, lowercase, punctuation
/// folded into single spaces.
pub(crate) fn normalize_key(input: &str) -> Option<String> {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in input.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let normalized = out.trim_end();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

pub(crate) fn parse_date(value: &str) -> ResultEngine<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        EngineError::InvalidDate(format!(
            "Invalid date '{}', expected YYYY-MM-DD",
            value.trim()
        ))
    })
}

pub(crate) fn parse_optional_date(value: Option<&str>) -> ResultEngine<Option<NaiveDate>> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_date(raw).map(Some),
        None => Ok(None),
    }
}

/// First and last day of the given month.
pub(crate) fn month_bounds(year: i32, month: u32) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let invalid = || EngineError::InvalidDate(format!("Invalid month: {year}-{month:02}"));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid)?;
    Ok((first, last))
}

pub(crate) fn month_bounds_of(date: NaiveDate) -> ResultEngine<(NaiveDate, NaiveDate)> {
    month_bounds(date.year(), date.month())
}

/// `"October 2026"`
pub(crate) fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

pub(crate) fn require_amount(amount: Option<i64>) -> ResultEngine<i64> {
    match amount {
        None | Some(0) => Err(EngineError::MissingField("Amount is required".to_string())),
        Some(value) if value < 0 => Err(EngineError::InvalidAmount(
            "Amount must be greater than zero".to_string(),
        )),
        Some(value) => Ok(value),
    }
}

pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(EngineError::InvalidEmail("Invalid email format".to_string()));
    }
    Ok(email)
}

pub(crate) fn validate_password(password: &str) -> ResultEngine<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(EngineError::InvalidPassword(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
