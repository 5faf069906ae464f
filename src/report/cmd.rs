use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::config::Config;
use crate::events::{display_date, EventDirectory, EventTable};

#[derive(Debug, Args)]
pub struct Command {
    /// Name of the event to render the report for.
    event: String,
    /// Only write the template fragments, without compiling the report.
    #[arg(long = "no-compile")]
    no_compile: bool,
    /// Keep the compiler's auxiliary and log files.
    #[arg(long = "keep-intermediates")]
    keep_intermediates: bool,
}

impl Command {
    pub fn run(&self, config: &Config) -> Result<()> {
        let events = EventTable::from_file_spec(&config.events_file())?;
        render_event(
            config,
            &events,
            &self.event,
            RenderOptions {
                compile: !self.no_compile,
                keep_intermediates: self.keep_intermediates,
            },
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    pub compile: bool,
    pub keep_intermediates: bool,
}

/// Loads the ledger of `event_name`, writes its report fragments and
/// optionally compiles the report.
pub fn render_event(
    config: &Config,
    events: &dyn EventDirectory,
    event_name: &str,
    options: RenderOptions,
) -> Result<()> {
    let dataset = config
        .ledger_store()
        .load(event_name)
        .with_context(|| format!("loading ledger of event {:?}", event_name))?;
    let event_date = events.event_date(event_name)?;

    let mut assembler = config.report_assembler();
    assembler.assemble(&dataset, &display_date(event_date))?;

    if options.compile {
        let job_id = dataset.job_id();
        config
            .compiler_driver()
            .compile(&assembler, &job_id, options.keep_intermediates)
            .with_context(|| format!("compiling report {:?}", job_id))?;
        info!(job_id = %job_id, "report compiled");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;
    use std::fs;

    use crate::compiler::CompileError;
    use crate::testutil::{invoice, write_ledger};

    fn events() -> EventTable {
        let mut raw = BTreeMap::new();
        raw.insert("Summer_Camp".to_string(), "2024-07-01".to_string());
        EventTable::from_raw(raw).unwrap()
    }

    fn config(root: &std::path::Path) -> Config {
        Config {
            root: root.to_owned(),
            search_path: Some(vec![]),
            ..Config::default()
        }
    }

    #[test]
    fn writes_fragments_without_compiling() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let store = config.ledger_store();
        store
            .append("Summer_Camp", &invoice("2024-03-01", "Summer_Camp", "Tent", "10"))
            .unwrap();
        store
            .append("Summer_Camp", &invoice("2024-01-15", "Summer_Camp", "Food", "5.5"))
            .unwrap();

        render_event(
            &config,
            &events(),
            "Summer_Camp",
            RenderOptions {
                compile: false,
                keep_intermediates: false,
            },
        )
        .unwrap();

        let blocks = dir.path().join("tex/blocks");
        assert_eq!(
            "Food&15.01.2024&\\amount{5.5}\\\\\nTent&01.03.2024&\\amount{10.00}\\\\\n",
            fs::read_to_string(blocks.join("tableitems.tex")).unwrap()
        );
        assert_eq!("Summer", fs::read_to_string(blocks.join("eventname.tex")).unwrap());
        assert_eq!("01.07.2024", fs::read_to_string(blocks.join("eventdate.tex")).unwrap());
        assert_eq!("\\amount{15.50}", fs::read_to_string(blocks.join("total.tex")).unwrap());
    }

    #[test]
    fn empty_ledger_still_compiles() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        write_ledger(
            &config.ledger_store().path_for("Summer_Camp").unwrap(),
            "invoice_date,event_name,purpose,cost,user",
        );

        let err = render_event(
            &config,
            &events(),
            "Summer_Camp",
            RenderOptions {
                compile: true,
                keep_intermediates: false,
            },
        )
        .expect_err("no compiler available");
        // Compilation was attempted despite there being no rows.
        assert!(matches!(
            err.downcast_ref::<CompileError>(),
            Some(CompileError::CompilerNotFound)
        ));
        assert_eq!(
            "\\amount{0.00}",
            fs::read_to_string(dir.path().join("tex/blocks/total.tex")).unwrap()
        );
    }

    #[test]
    fn unknown_event_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        config
            .ledger_store()
            .append("Winter", &invoice("2024-01-15", "Winter", "Skis", "99"))
            .unwrap();

        let result = render_event(
            &config,
            &events(),
            "Winter",
            RenderOptions {
                compile: false,
                keep_intermediates: false,
            },
        );
        assert!(result.is_err());
        assert!(!dir.path().join("tex/blocks").exists());
    }
}
