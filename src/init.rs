use std::path::Path;

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_RON};
use crate::filespec;

/// Report template, embedded so that `init` works from any directory.
pub const DEFAULT_TEMPLATE: &str = include_str!("../tex/main.tex");

const EXAMPLE_EVENTS_RON: &str = r#"{
    "Summer_Camp": "2024-07-01",
}
"#;

#[derive(Debug, Args)]
pub struct Cmd {}

impl Cmd {
    pub fn run(&self, config: &Config) -> Result<()> {
        let written =
            filespec::write_new_file(Path::new(DEFAULT_CONFIG_FILE), DEFAULT_CONFIG_RON)?;
        report(DEFAULT_CONFIG_FILE, written);
        init_tree(config)
    }
}

/// Writes the template and an example event table below `config.root`,
/// leaving existing files alone.
fn init_tree(config: &Config) -> Result<()> {
    let template = config.template_path();
    report(
        &template.to_string_lossy(),
        filespec::write_new_file(&template, DEFAULT_TEMPLATE)?,
    );

    let events = config.events_path();
    report(
        &events.to_string_lossy(),
        filespec::write_new_file(&events, EXAMPLE_EVENTS_RON)?,
    );
    Ok(())
}

fn report(name: &str, written: bool) {
    if written {
        info!("wrote {}", name);
    } else {
        info!("{} already exists, leaving it unchanged", name);
    }
}
