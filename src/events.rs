//! Lookup of event metadata, i.e. the date each event takes place on.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;

use crate::config::Config;
use crate::filespec::{self, FileSpec};
use crate::record::{normalize_event_name, STORED_DATE_FORMAT};

/// Format of event dates as shown in a report.
pub const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y";

/// Read-only source of event dates.
pub trait EventDirectory {
    /// Returns the date of the named event. Fails for unknown events.
    fn event_date(&self, event_name: &str) -> Result<NaiveDate>;

    /// Names of all known events, in display order.
    fn names(&self) -> Vec<String>;
}

/// An `EventDirectory` read from a RON map of event name to `YYYY-MM-DD`
/// date, e.g. `{"Summer_Camp": "2024-07-01"}`.
///
/// Names are matched after normalization, so `"Summer Camp"` and
/// `"summercamp"` refer to the same event.
#[derive(Debug, Default)]
pub struct EventTable {
    /// Keyed by normalized name; values keep the name as written.
    events: BTreeMap<String, (String, NaiveDate)>,
}

impl EventTable {
    pub fn from_file_spec(file_spec: &FileSpec) -> Result<Self> {
        let raw: BTreeMap<String, String> = filespec::read_ron(file_spec)?;
        Self::from_raw(raw).with_context(|| format!("reading events from {}", file_spec))
    }

    pub fn from_raw(raw: BTreeMap<String, String>) -> Result<Self> {
        let mut events = BTreeMap::new();
        for (name, date) in raw {
            let date = NaiveDate::parse_from_str(&date, STORED_DATE_FORMAT)
                .with_context(|| format!("parsing date {:?} of event {:?}", date, name))?;
            let previous = events.insert(normalize_event_name(&name), (name.clone(), date));
            if let Some((other, _)) = previous {
                bail!("events {:?} and {:?} have the same normalized name", other, name);
            }
        }
        Ok(Self { events })
    }
}

impl EventDirectory for EventTable {
    fn event_date(&self, event_name: &str) -> Result<NaiveDate> {
        self.events
            .get(&normalize_event_name(event_name))
            .map(|(_, date)| *date)
            .ok_or_else(|| anyhow!("unknown event {:?}", event_name))
    }

    fn names(&self) -> Vec<String> {
        let mut by_date: Vec<&(String, NaiveDate)> = self.events.values().collect();
        by_date.sort_by_key(|(_, date)| *date);
        by_date.into_iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Formats an event date for display, e.g. `01.07.2024`.
pub fn display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

#[derive(Debug, Args)]
pub struct Cmd {}

impl Cmd {
    /// Prints the known events with their dates, earliest first.
    pub fn run(&self, config: &Config) -> Result<()> {
        let events = EventTable::from_file_spec(&config.events_file())?;
        for name in events.names() {
            println!("{}  {}", display_date(events.event_date(&name)?), name);
        }
        Ok(())
    }
}
