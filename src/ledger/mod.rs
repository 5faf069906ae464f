//! Append-only, per-event ledger files.
//!
//! Each event has one comma separated file under the storage root, named by
//! the normalized event name. The first line is a header naming the fields,
//! every following line is one `InvoiceRecord`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::record::{
    capitalize_first, is_safe_event_name, normalize_event_name, Cost, InvoiceRecord, FIELDS,
};

pub mod cmd;
mod de;

/// File extension of ledger files.
pub const LEDGER_EXTENSION: &str = "data";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage error on {path:?}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("bad ledger format in {path:?}: {reason}")]
    Format { path: PathBuf, reason: String },
    #[error("event name {0:?} cannot be used as a ledger file name")]
    BadEventName(String),
}

impl LedgerError {
    fn storage(path: &Path) -> impl FnOnce(io::Error) -> LedgerError + '_ {
        move |source| LedgerError::Storage {
            path: path.to_owned(),
            source,
        }
    }

    fn format<S: Into<String>>(path: &Path, reason: S) -> LedgerError {
        LedgerError::Format {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }

    fn from_csv(path: &Path, err: csv::Error) -> LedgerError {
        let line = err.position().map(|pos| pos.line());
        match err.into_kind() {
            csv::ErrorKind::Io(source) => LedgerError::Storage {
                path: path.to_owned(),
                source,
            },
            kind => {
                let reason = match line {
                    Some(line) => format!("line {}: {:?}", line, kind),
                    None => format!("{:?}", kind),
                };
                LedgerError::format(path, reason)
            }
        }
    }
}

/// Owns the ledger files under one storage root.
#[derive(Debug)]
pub struct LedgerStore {
    dir: PathBuf,
}

impl LedgerStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the ledger file for `event_name`, always directly inside the
    /// storage root.
    pub fn path_for(&self, event_name: &str) -> Result<PathBuf, LedgerError> {
        let name = normalize_event_name(event_name);
        if !is_safe_event_name(&name) {
            return Err(LedgerError::BadEventName(event_name.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", name, LEDGER_EXTENSION)))
    }

    /// Appends `record` to the ledger of `event_name`, creating the storage
    /// root, the file and its header as needed.
    ///
    /// The header and row are buffered and written with a single write.
    pub fn append(&self, event_name: &str, record: &InvoiceRecord) -> Result<(), LedgerError> {
        let path = self.path_for(event_name)?;
        fs::create_dir_all(&self.dir).map_err(LedgerError::storage(&self.dir))?;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(LedgerError::storage(&path))?;
        // An existing but empty file never got its header.
        let is_new = file.metadata().map_err(LedgerError::storage(&path))?.len() == 0;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        if is_new {
            wtr.write_record(FIELDS)
                .map_err(|e| LedgerError::storage(&path)(e.into()))?;
        }
        wtr.write_record(&record.to_row())
            .map_err(|e| LedgerError::storage(&path)(e.into()))?;
        let buf = wtr
            .into_inner()
            .map_err(|e| LedgerError::storage(&path)(e.into_error()))?;

        file.write_all(&buf).map_err(LedgerError::storage(&path))?;
        file.flush().map_err(LedgerError::storage(&path))?;

        if is_new {
            info!(path = ?path, "created ledger");
        }
        debug!(path = ?path, bytes = buf.len(), "appended invoice");
        Ok(())
    }

    /// Loads every row of the ledger of `event_name`.
    pub fn load(&self, event_name: &str) -> Result<ReportDataset, LedgerError> {
        let path = self.path_for(event_name)?;
        let rows = read_rows(&path)?;
        info!(path = ?path, rows = rows.len(), "loaded ledger");
        ReportDataset::new(event_name, rows)
            .ok_or_else(|| LedgerError::format(&path, "sum of costs is out of range"))
    }
}

fn check_header(path: &Path, got: &csv::StringRecord) -> Result<(), LedgerError> {
    if !got.iter().eq(FIELDS.iter().copied()) {
        return Err(LedgerError::format(
            path,
            format!(
                "bad header record, want {:?}, got {:?}",
                FIELDS.join(","),
                got.iter().collect::<Vec<_>>().join(",")
            ),
        ));
    }
    Ok(())
}

fn read_rows(path: &Path) -> Result<Vec<LedgerRow>, LedgerError> {
    let file = File::open(path).map_err(LedgerError::storage(path))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);
    let mut csv_records = rdr.records();

    let header = csv_records
        .next()
        .ok_or_else(|| LedgerError::format(path, "missing header"))?
        .map_err(|e| LedgerError::from_csv(path, e))?;
    check_header(path, &header)?;

    let mut rows = Vec::new();
    for result in csv_records {
        let str_record = result.map_err(|e| LedgerError::from_csv(path, e))?;
        let line = str_record.position().map(|pos| pos.line()).unwrap_or(0);
        if str_record.len() != FIELDS.len() {
            return Err(LedgerError::format(
                path,
                format!(
                    "line {}: expected {} columns, got {}",
                    line,
                    FIELDS.len(),
                    str_record.len()
                ),
            ));
        }
        let row: de::Row = str_record
            .deserialize(None)
            .map_err(|e| LedgerError::format(path, format!("line {}: {}", line, e)))?;
        rows.push(row.into());
    }
    Ok(rows)
}

/// One row of a loaded ledger.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerRow {
    pub invoice_date: NaiveDate,
    pub event_name: String,
    pub purpose: String,
    /// The cost as written in the ledger.
    pub cost_text: String,
    pub cost: Cost,
    pub user: String,
}

impl From<de::Row> for LedgerRow {
    fn from(row: de::Row) -> Self {
        Self {
            invoice_date: row.invoice_date.0,
            event_name: row.event_name,
            purpose: row.purpose,
            cost_text: row.cost.text,
            cost: row.cost.value,
            user: row.user,
        }
    }
}

/// The rows of one event ledger, loaded for rendering.
#[derive(Clone, Debug)]
pub struct ReportDataset {
    event_name: String,
    rows: Vec<LedgerRow>,
    total: Cost,
}

impl ReportDataset {
    /// Creates a dataset from `rows`. The event name is taken from the first
    /// row, falling back to `event_name` when there are no rows.
    ///
    /// Returns `None` if the costs do not sum to a representable total.
    pub fn new(event_name: &str, rows: Vec<LedgerRow>) -> Option<Self> {
        let event_name = normalize_event_name(
            rows.first()
                .map(|row| row.event_name.as_str())
                .unwrap_or(event_name),
        );
        let total = Cost::total(rows.iter().map(|row| &row.cost))?;
        Some(Self {
            event_name,
            rows,
            total,
        })
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Sum of all costs, rounded to cents.
    pub fn total(&self) -> Cost {
        self.total
    }

    /// Normalized event name (lowercase, no whitespace).
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// First `_` delimited token of the normalized event name, capitalized.
    pub fn display_event_name(&self) -> String {
        let first = self.event_name.split('_').next().unwrap_or("");
        capitalize_first(first)
    }

    /// Identifier for compiler output: the normalized event name with
    /// underscores replaced by hyphens.
    pub fn job_id(&self) -> String {
        self.event_name.replace('_', "-")
    }
}
