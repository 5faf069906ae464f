//! Turns a loaded ledger into the fragments read by the report template.

use std::path::PathBuf;

use anyhow::Result;
use itertools::Itertools;
use tracing::info;

use crate::events::DISPLAY_DATE_FORMAT;
use crate::ledger::{LedgerRow, ReportDataset};

pub mod cmd;
pub mod fragments;

pub use fragments::PresentationFragments;

/// A ledger row prepared for display.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportLine {
    pub purpose: String,
    /// Invoice date as `dd.mm.yyyy`.
    pub date: String,
    /// Cost padded for alignment, see `pad_price`.
    pub cost: String,
}

/// Writes presentation fragments for datasets into one directory and
/// remembers whether it has done so.
#[derive(Debug)]
pub struct ReportAssembler {
    fragments_dir: PathBuf,
    is_set: bool,
}

impl ReportAssembler {
    pub fn new<P: Into<PathBuf>>(fragments_dir: P) -> Self {
        Self {
            fragments_dir: fragments_dir.into(),
            is_set: false,
        }
    }

    /// Whether fragments have been written by `assemble`.
    pub fn is_set(&self) -> bool {
        self.is_set
    }

    /// Renders `dataset` and writes the resulting fragments.
    ///
    /// `event_display_date` is written verbatim as the event date label.
    pub fn assemble(
        &mut self,
        dataset: &ReportDataset,
        event_display_date: &str,
    ) -> Result<PresentationFragments> {
        let fragments = render(dataset, event_display_date);
        fragments.write_to(&self.fragments_dir)?;
        self.is_set = true;
        info!(
            dir = ?self.fragments_dir,
            rows = dataset.row_count(),
            total = %fragments.total,
            "assembled report fragments"
        );
        Ok(fragments)
    }
}

/// Renders the fragments for `dataset` without writing them anywhere.
pub fn render(dataset: &ReportDataset, event_display_date: &str) -> PresentationFragments {
    let lines = sorted_by_date(dataset.rows());
    let table_items = lines
        .iter()
        .map(|line| format!("{}\n", fragments::table_row(&line.purpose, &line.date, &line.cost)))
        .collect();
    PresentationFragments {
        table_items,
        event_name: fragments::escape_tex(&dataset.display_event_name()),
        event_date: event_display_date.to_string(),
        total: fragments::amount(&pad_price(&dataset.total().to_string())),
    }
}

/// Orders `rows` by ascending invoice date. Rows with equal dates keep their
/// ledger order.
pub fn sorted_by_date(rows: &[LedgerRow]) -> Vec<ReportLine> {
    rows.iter()
        .sorted_by_key(|row| row.invoice_date)
        .map(|row| ReportLine {
            purpose: row.purpose.clone(),
            date: row.invoice_date.format(DISPLAY_DATE_FORMAT).to_string(),
            cost: pad_price(&row.cost_text),
        })
        .collect()
}

/// Appends a zero to prices written with a single `.0` fractional digit so
/// that they line up with two digit prices. Anything else, including
/// integers such as `2` and prices like `5.5`, is returned unchanged.
pub fn pad_price(price: &str) -> String {
    if price.ends_with(".0") {
        format!("{}0", price)
    } else {
        price.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::io::Write;

    use goldenfile::Mint;
    use test_case::test_case;

    use crate::assert_text_eq;
    use crate::ledger::LedgerStore;
    use crate::report::fragments::{EVENT_DATE_FILE, EVENT_NAME_FILE, TABLE_ITEMS_FILE, TOTAL_FILE};
    use crate::testutil::write_ledger;

    fn load(content: &str) -> ReportDataset {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        write_ledger(&store.path_for("summer_camp").unwrap(), content);
        store.load("summer_camp").unwrap()
    }

    #[test_case("10.0" => "10.00"; "single_zero_padded")]
    #[test_case("0.0" => "0.00"; "zero")]
    #[test_case("12.69" => "12.69"; "two_digits_unchanged")]
    #[test_case("5.10" => "5.10"; "already_padded")]
    #[test_case("2" => "2"; "integer_not_padded")]
    #[test_case("5.5" => "5.5"; "other_single_digit_not_padded")]
    fn padding(price: &str) -> String {
        pad_price(price)
    }

    #[test]
    fn rows_sorted_by_date() {
        let dataset = load(
            "
            invoice_date,event_name,purpose,cost,user
            2024-03-01,Summer_Camp,Tent,10.0,U1
            2024-01-15,Summer_Camp,Food,5.5,U2
            2024-02-20,Summer_Camp,Rope,2,U1
            ",
        );
        let dates: Vec<String> = sorted_by_date(dataset.rows())
            .into_iter()
            .map(|line| line.date)
            .collect();
        assert_eq!(vec!["15.01.2024", "20.02.2024", "01.03.2024"], dates);
    }

    #[test]
    fn equal_dates_keep_ledger_order() {
        let dataset = load(
            "
            invoice_date,event_name,purpose,cost,user
            2024-02-01,Summer_Camp,Second,1.0,U1
            2024-01-01,Summer_Camp,First,1.0,U1
            2024-02-01,Summer_Camp,Third,1.0,U1
            2024-02-01,Summer_Camp,Fourth,1.0,U1
            ",
        );
        let purposes: Vec<String> = sorted_by_date(dataset.rows())
            .into_iter()
            .map(|line| line.purpose)
            .collect();
        assert_eq!(vec!["First", "Second", "Third", "Fourth"], purposes);
    }

    #[test]
    fn padding_is_display_only() {
        let dataset = load(
            "
            invoice_date,event_name,purpose,cost,user
            2024-03-01,Summer_Camp,Tent,10.0,U1
            2024-01-15,Summer_Camp,Food,5.5,U2
            2024-02-20,Summer_Camp,Rope,2,U1
            ",
        );
        assert_eq!("17.5", dataset.total().to_string());

        let fragments = render(&dataset, "01.07.2024");
        assert_text_eq!(
            "Food&15.01.2024&\\amount{5.5}\\\\\n\
             Rope&20.02.2024&\\amount{2}\\\\\n\
             Tent&01.03.2024&\\amount{10.00}\\\\\n",
            fragments.table_items
        );
        // Only the ".0" suffix is padded: "5.5" and "2" are shown as stored.
        assert_eq!("\\amount{17.50}", fragments.total);
        assert_eq!("17.5", dataset.total().to_string());
    }

    #[test]
    fn empty_dataset() {
        let dataset = load(
            "
            invoice_date,event_name,purpose,cost,user
            ",
        );
        let fragments = render(&dataset, "01.07.2024");
        assert_eq!("", fragments.table_items);
        assert_eq!("\\amount{0.00}", fragments.total);
        assert_eq!("Summer", fragments.event_name);
    }

    #[test]
    fn assemble_writes_fragments() {
        let dataset = load(
            "
            invoice_date,event_name,purpose,cost,user
            2024-03-01,Summer_Camp,Tent,10.0,U1
            2024-01-15,Summer_Camp,Food & drinks,5.5,U2
            2024-02-20,Summer_Camp,Rope,2,U1
            2024-01-15,Summer_Camp,Gas 100%,20.25,U3
            ",
        );
        let dir = tempfile::tempdir().unwrap();
        let blocks = dir.path().join("tex").join("blocks");
        let mut assembler = ReportAssembler::new(&blocks);
        assert!(!assembler.is_set());

        let fragments = assembler.assemble(&dataset, "01.07.2024").unwrap();
        assert!(assembler.is_set());

        let mut mint = Mint::new("testdata/report");
        for name in [TABLE_ITEMS_FILE, EVENT_NAME_FILE, EVENT_DATE_FILE, TOTAL_FILE] {
            let differ = Box::new(goldenfile::differs::text_diff);
            let mut out = mint
                .new_goldenfile_with_differ(name, differ)
                .expect("new goldenfile");
            let written = fs::read_to_string(blocks.join(name)).expect("read fragment");
            out.write_all(written.as_bytes()).expect("write output");
        }
        assert_eq!("\\amount{37.75}", fragments.total);
    }

    #[test]
    fn assemble_replaces_previous_fragments() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler = ReportAssembler::new(dir.path());
        let first = load(
            "
            invoice_date,event_name,purpose,cost,user
            2024-03-01,Summer_Camp,Tent,10.0,U1
            2024-01-15,Summer_Camp,Food,5.5,U2
            ",
        );
        assembler.assemble(&first, "01.07.2024").unwrap();
        let second = load(
            "
            invoice_date,event_name,purpose,cost,user
            2024-03-01,Summer_Camp,Tent,10.0,U1
            ",
        );
        assembler.assemble(&second, "02.07.2024").unwrap();

        let items = fs::read_to_string(dir.path().join(TABLE_ITEMS_FILE)).unwrap();
        assert_eq!(1, items.lines().count());
        let date = fs::read_to_string(dir.path().join(EVENT_DATE_FILE)).unwrap();
        assert_eq!("02.07.2024", date);
    }
}
