use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use crate::record::{InvoiceRecord, STORED_DATE_FORMAT};

pub fn invoice(date: &str, event_name: &str, purpose: &str, cost: &str) -> InvoiceRecord {
    InvoiceRecord {
        invoice_date: NaiveDate::parse_from_str(date, STORED_DATE_FORMAT)
            .expect("test date did not parse"),
        event_name: event_name.to_string(),
        purpose: purpose.to_string(),
        cost: cost.parse().expect("test cost did not parse"),
        user: "U1".to_string(),
    }
}

/// Strips the common indentation and blank lines from `content`, so that
/// fixtures can be written inline.
pub fn dedent_lines(content: &str) -> String {
    textwrap::dedent(content)
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(|line| format!("{}\n", line))
        .collect()
}

/// Writes an inline ledger fixture to `path`, creating parent directories.
pub fn write_ledger(path: &Path, content: &str) {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).expect("create ledger dir");
    }
    fs::write(path, dedent_lines(content)).expect("write ledger");
}

#[macro_export]
macro_rules! assert_text_eq {
    ($want:expr, $got:expr, $($context_arg:expr),*) => {
        let want_str: &str = $want.as_ref();
        let got_str: &str = $got.as_ref();
        if want_str != got_str {
            eprintln!($($context_arg,)*);
            text_diff::assert_diff(want_str, got_str, "\n", 0);
        }
    };
    ($want:expr, $got:expr) => {
        let want_str: &str = $want.as_ref();
        let got_str: &str = $got.as_ref();
        if want_str != got_str {
            text_diff::assert_diff(want_str, got_str, "\n", 0);
        }
    };
}
