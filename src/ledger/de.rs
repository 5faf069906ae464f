use std::fmt;

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer};

use crate::record::{Cost, STORED_DATE_FORMAT};

/// One ledger row, deserialized positionally in `record::FIELDS` order.
#[derive(Debug, serde_derive::Deserialize)]
pub struct Row {
    pub invoice_date: Date,
    pub event_name: String,
    pub purpose: String,
    pub cost: RawCost,
    pub user: String,
}

#[derive(Debug)]
pub struct Date(pub NaiveDate);

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_str(DateVisitor)
    }
}

struct DateVisitor;
impl<'de> de::Visitor<'de> for DateVisitor {
    type Value = Date;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a date string in \"YYYY-MM-DD\" format")
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
        NaiveDate::parse_from_str(s, STORED_DATE_FORMAT)
            .map(Date)
            .map_err(de::Error::custom)
    }
}

/// A cost both as written in the ledger and as a number.
///
/// The written form is what gets displayed, the number is what gets summed.
#[derive(Debug)]
pub struct RawCost {
    pub text: String,
    pub value: Cost,
}

impl<'de> Deserialize<'de> for RawCost {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_str(RawCostVisitor)
    }
}

struct RawCostVisitor;
impl<'de> de::Visitor<'de> for RawCostVisitor {
    type Value = RawCost;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a decimal number")
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
        let value: Cost = s.parse().map_err(de::Error::custom)?;
        Ok(RawCost {
            text: s.to_string(),
            value,
        })
    }
}
