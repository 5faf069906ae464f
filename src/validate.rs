//! Turns raw, user supplied field values into an `InvoiceRecord`.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use rust_decimal::Decimal;

use crate::record::{
    capitalize_first, is_safe_event_name, normalize_event_name, Cost, InvoiceRecord, COST,
    EVENT_NAME, INVOICE_DATE, PURPOSE, STORED_DATE_FORMAT,
};

/// Maximum number of fractional digits in a cost.
const MAX_COST_FRACTIONAL_DIGITS: u32 = 2;

/// Maximum number of integer digits in a cost.
const MAX_COST_INTEGER_DIGITS: u32 = 12;

/// Rejection of a raw field set, addressed to the offending field so that the
/// caller can re-prompt for it.
#[derive(Debug, Error, Eq, PartialEq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub message: String,
    pub field: &'static str,
}

impl ValidationError {
    fn new<S: Into<String>>(field: &'static str, message: S) -> Self {
        Self {
            message: message.into(),
            field,
        }
    }
}

/// Validates and normalizes `raw` into an `InvoiceRecord` submitted by
/// `submitter_id`.
///
/// The purpose has its first character capitalized. Whether the invoice date
/// lies in the future is not checked here.
pub fn validate(
    raw: &HashMap<String, String>,
    submitter_id: &str,
) -> Result<InvoiceRecord, ValidationError> {
    let invoice_date = required(raw, INVOICE_DATE)?;
    let invoice_date = NaiveDate::parse_from_str(invoice_date, STORED_DATE_FORMAT)
        .map_err(|e| {
            ValidationError::new(
                INVOICE_DATE,
                format!("{:?} is not a YYYY-MM-DD date: {}", invoice_date, e),
            )
        })?;

    let event_name = required(raw, EVENT_NAME)?;
    if event_name.is_empty() {
        return Err(ValidationError::new(EVENT_NAME, "must not be empty"));
    }
    if !is_safe_event_name(&normalize_event_name(event_name)) {
        return Err(ValidationError::new(
            EVENT_NAME,
            format!("{:?} must not contain '/', '\\', '..' or NUL", event_name),
        ));
    }

    let purpose = capitalize_first(required(raw, PURPOSE)?);
    let cost = parse_cost(required(raw, COST)?)?;

    Ok(InvoiceRecord {
        invoice_date,
        event_name: event_name.to_string(),
        purpose,
        cost,
        user: submitter_id.to_string(),
    })
}

fn required<'a>(
    raw: &'a HashMap<String, String>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    raw.get(field)
        .map(|v| v.trim())
        .ok_or_else(|| ValidationError::new(field, "missing value"))
}

fn parse_cost(s: &str) -> Result<Cost, ValidationError> {
    let cost: Cost = s.parse().map_err(|_| {
        ValidationError::new(
            COST,
            format!("{:?} is not a decimal number, e.g. 2 or 12.69", s),
        )
    })?;
    if cost.0.is_sign_negative() && !cost.0.is_zero() {
        return Err(ValidationError::new(COST, "must not be negative"));
    }
    if cost.fractional_digits() > MAX_COST_FRACTIONAL_DIGITS {
        return Err(ValidationError::new(
            COST,
            format!(
                "{:?} has more than {} fractional digits",
                s, MAX_COST_FRACTIONAL_DIGITS
            ),
        ));
    }
    if cost.0 >= Decimal::from(10u64.pow(MAX_COST_INTEGER_DIGITS)) {
        return Err(ValidationError::new(
            COST,
            format!(
                "{:?} has more than {} integer digits",
                s, MAX_COST_INTEGER_DIGITS
            ),
        ));
    }
    Ok(cost)
}
