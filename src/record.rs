use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Date format of `invoice_date` as stored in a ledger file.
pub const STORED_DATE_FORMAT: &str = "%Y-%m-%d";

pub const INVOICE_DATE: &str = "invoice_date";
pub const EVENT_NAME: &str = "event_name";
pub const PURPOSE: &str = "purpose";
pub const COST: &str = "cost";
pub const USER: &str = "user";

/// Field names in the order they are written to a ledger file.
pub const FIELDS: [&str; 5] = [INVOICE_DATE, EVENT_NAME, PURPOSE, COST, USER];

/// A single validated expense submission.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvoiceRecord {
    pub invoice_date: NaiveDate,
    pub event_name: String,
    pub purpose: String,
    pub cost: Cost,
    pub user: String,
}

impl InvoiceRecord {
    /// Field values in `FIELDS` order.
    pub fn to_row(&self) -> [String; 5] {
        [
            self.invoice_date.format(STORED_DATE_FORMAT).to_string(),
            self.event_name.clone(),
            self.purpose.clone(),
            self.cost.to_string(),
            self.user.clone(),
        ]
    }
}

/// A non-negative monetary amount.
///
/// Formats with trailing zeros removed but always with at least one
/// fractional digit, e.g. `2.0`, `5.5`, `12.69`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct Cost(pub Decimal);

impl Cost {
    /// Number of fractional digits once trailing zeros are dropped.
    pub fn fractional_digits(&self) -> u32 {
        self.0.normalize().scale()
    }

    /// Sum of all costs rounded to cents, or `None` if the sum overflows.
    pub fn total<'a, I: IntoIterator<Item = &'a Cost>>(costs: I) -> Option<Cost> {
        costs
            .into_iter()
            .try_fold(Decimal::ZERO, |sum, c| sum.checked_add(c.0))
            .map(|sum| Cost(sum.round_dp(2)))
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let d = self.0.normalize();
        if d.scale() == 0 {
            write!(f, "{}.0", d)
        } else {
            write!(f, "{}", d)
        }
    }
}

impl FromStr for Cost {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Cost)
    }
}

/// Lowercases `name` and removes all whitespace from it.
pub fn normalize_event_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether `name` can be used as a ledger file name: non-empty, without path
/// separators, `..` or NUL.
pub fn is_safe_event_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\', '\0']) && !name.contains("..")
}

/// Uppercases the first character of `s`, leaving the rest untouched.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
