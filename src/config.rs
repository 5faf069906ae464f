//! Locations and settings shared by all subcommands.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde_derive::Deserialize;
use tracing::debug;

use crate::compiler::CompilerDriver;
use crate::filespec::{self, FileSpec};
use crate::ledger::LedgerStore;
use crate::report::ReportAssembler;

/// Config file read from the current directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "eventledger.ron";

/// The default configuration, as written by `init`.
pub const DEFAULT_CONFIG_RON: &str = r#"(
    root: ".",
    ledger_dir: "db",
    template: "tex/main.tex",
    fragments_dir: "tex/blocks",
    output_dir: "out",
    events_file: "events.ron",
    compile_timeout_secs: 300,
    search_path: None,
)
"#;

/// Paths other than `root` are relative to `root` unless absolute.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Working tree of the compiler, and the tree that its intermediate
    /// files are removed from.
    pub root: PathBuf,
    /// Directory holding one ledger file per event.
    pub ledger_dir: PathBuf,
    /// Entry point of the report template.
    pub template: PathBuf,
    /// Directory the template reads fragments from.
    pub fragments_dir: PathBuf,
    /// Directory compiled reports are written to.
    pub output_dir: PathBuf,
    /// RON map of event name to `YYYY-MM-DD` date.
    pub events_file: PathBuf,
    pub compile_timeout_secs: u64,
    /// Directories to look for compilers in instead of `PATH`.
    pub search_path: Option<Vec<PathBuf>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: ".".into(),
            ledger_dir: "db".into(),
            template: "tex/main.tex".into(),
            fragments_dir: "tex/blocks".into(),
            output_dir: "out".into(),
            events_file: "events.ron".into(),
            compile_timeout_secs: 300,
            search_path: None,
        }
    }
}

impl Config {
    /// Reads the config from `path`. Without a path, reads
    /// `DEFAULT_CONFIG_FILE` if it exists and uses defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default_path.exists() {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
                default_path
            }
        };
        debug!(path = ?path, "reading config");
        filespec::read_ron(&FileSpec::Path(path))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    pub fn ledger_store(&self) -> LedgerStore {
        LedgerStore::new(self.resolve(&self.ledger_dir))
    }

    pub fn report_assembler(&self) -> ReportAssembler {
        ReportAssembler::new(self.resolve(&self.fragments_dir))
    }

    pub fn compiler_driver(&self) -> CompilerDriver {
        CompilerDriver {
            root: self.root.clone(),
            template: self.template.clone(),
            output_dir: self.output_dir.clone(),
            timeout: Duration::from_secs(self.compile_timeout_secs),
            search_path: self.search_path.clone(),
        }
    }

    pub fn events_path(&self) -> PathBuf {
        self.resolve(&self.events_file)
    }

    pub fn events_file(&self) -> FileSpec {
        FileSpec::Path(self.events_path())
    }

    pub fn template_path(&self) -> PathBuf {
        self.resolve(&self.template)
    }
}
