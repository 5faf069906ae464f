use std::collections::HashMap;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::config::Config;
use crate::events::EventTable;
use crate::filespec::{self, FileSpec};
use crate::record::{COST, EVENT_NAME, INVOICE_DATE, PURPOSE};
use crate::report::cmd::{render_event, RenderOptions};
use crate::validate::validate;

#[derive(Debug, Args)]
pub struct Command {
    /// RON map of raw field values, e.g. `{"cost": "12.69", ...}`. "-" reads
    /// from stdin. Individual field flags override values from this file.
    #[arg(long = "fields")]
    fields: Option<FileSpec>,
    /// Name of the event the expense belongs to.
    #[arg(long = "event")]
    event: Option<String>,
    /// Date of the invoice as YYYY-MM-DD.
    #[arg(long = "date")]
    date: Option<String>,
    /// What the money was spent on.
    #[arg(long = "purpose")]
    purpose: Option<String>,
    /// Amount spent, with at most two fractional digits.
    #[arg(long = "cost")]
    cost: Option<String>,
    /// Identifier of the person submitting the invoice.
    #[arg(long = "user")]
    user: String,
    /// Render and compile the event's report after recording the invoice.
    #[arg(long = "render")]
    render: bool,
    /// Keep the compiler's auxiliary and log files when rendering.
    #[arg(long = "keep-intermediates", requires = "render")]
    keep_intermediates: bool,
}

impl Command {
    pub fn run(&self, config: &Config) -> Result<()> {
        let raw = self.raw_fields()?;
        let record = validate(&raw, &self.user)?;

        config
            .ledger_store()
            .append(&record.event_name, &record)
            .with_context(|| format!("recording invoice for event {:?}", record.event_name))?;
        info!(
            event = %record.event_name,
            cost = %record.cost,
            user = %record.user,
            "recorded invoice"
        );

        if self.render {
            let events = EventTable::from_file_spec(&config.events_file())?;
            render_event(
                config,
                &events,
                &record.event_name,
                RenderOptions {
                    compile: true,
                    keep_intermediates: self.keep_intermediates,
                },
            )?;
        }
        Ok(())
    }

    fn raw_fields(&self) -> Result<HashMap<String, String>> {
        let mut raw: HashMap<String, String> = match &self.fields {
            Some(file_spec) => filespec::read_ron(file_spec)?,
            None => HashMap::new(),
        };
        for (key, value) in [
            (INVOICE_DATE, &self.date),
            (EVENT_NAME, &self.event),
            (PURPOSE, &self.purpose),
            (COST, &self.cost),
        ] {
            if let Some(value) = value {
                raw.insert(key.to_string(), value.clone());
            }
        }
        Ok(raw)
    }
}
