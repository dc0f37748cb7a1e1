//! Input validation for request bodies.
//!
//! Everything here runs before the store is touched and reports problems as
//! [`Error::Validation`].

use super::VacationType;
use crate::auth::UserRole;
use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Fail with one message naming every field that is absent or blank
pub fn require_fields(fields: &[(&str, bool)]) -> Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} {} required",
            missing.join(", "),
            if missing.len() == 1 { "is" } else { "are" }
        )))
    }
}

/// Whether an optional string field carries a non-blank value
pub fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Parse a calendar date that must be written exactly as `YYYY-MM-DD`
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .filter(|d| d.format("%Y-%m-%d").to_string() == value)
        .ok_or_else(|| Error::Validation(format!("{} must be YYYY-MM-DD", field)))
}

/// Parse a clock time that must be written exactly as `HH:MM`
pub fn parse_time(field: &str, value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .ok()
        .filter(|t| t.format("%H:%M").to_string() == value)
        .ok_or_else(|| Error::Validation(format!("{} must be HH:MM", field)))
}

pub fn parse_vacation_type(value: &str) -> Result<VacationType> {
    VacationType::from_str(value.trim()).map_err(|_| {
        let allowed: Vec<&str> = VacationType::ALL.iter().map(|t| t.as_str()).collect();
        Error::Validation(format!("type must be one of: {}", allowed.join(", ")))
    })
}

pub fn parse_role(value: &str) -> Result<UserRole> {
    UserRole::from_str(value.trim())
        .map_err(|_| Error::Validation("role must be employee or manager".to_string()))
}

pub fn parse_description(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("description must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Largest accepted expense amount, 999 999 999 999.99
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 2);

/// Accept a JSON number or a numeric string; the amount must be positive
/// and at most [`MAX_AMOUNT`]
pub fn parse_amount(value: &Value) -> Result<Decimal> {
    let invalid = || Error::Validation("amount must be a positive number".to_string());

    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(invalid()),
    };

    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| invalid())?;

    if amount <= Decimal::ZERO {
        return Err(invalid());
    }
    if amount > MAX_AMOUNT {
        return Err(Error::Validation(format!(
            "amount must not exceed {}",
            MAX_AMOUNT
        )));
    }
    Ok(amount.normalize())
}

/// Parse a username, trimming surrounding whitespace
pub fn parse_username(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("username must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}
