//! The small TeX snippets read by the report template.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::filespec;

pub const TABLE_ITEMS_FILE: &str = "tableitems.tex";
pub const EVENT_NAME_FILE: &str = "eventname.tex";
pub const EVENT_DATE_FILE: &str = "eventdate.tex";
pub const TOTAL_FILE: &str = "total.tex";

/// Rendered fragments of one report.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PresentationFragments {
    /// One table row per invoice, each terminated by a newline.
    pub table_items: String,
    pub event_name: String,
    pub event_date: String,
    pub total: String,
}

impl PresentationFragments {
    /// Writes each fragment to its own file in `dir`, replacing whatever was
    /// there before.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).with_context(|| format!("creating directory {:?}", dir))?;
        for (name, content) in [
            (TABLE_ITEMS_FILE, &self.table_items),
            (EVENT_NAME_FILE, &self.event_name),
            (EVENT_DATE_FILE, &self.event_date),
            (TOTAL_FILE, &self.total),
        ] {
            filespec::replace_file(&dir.join(name), content)?;
        }
        Ok(())
    }
}

/// Wraps a cost in the template's currency macro.
pub fn amount(cost: &str) -> String {
    format!("\\amount{{{}}}", cost)
}

/// One row of the invoice table: `purpose&date&\amount{cost}\\`.
pub fn table_row(purpose: &str, date: &str, cost: &str) -> String {
    format!("{}&{}&{}\\\\", escape_tex(purpose), date, amount(cost))
}

/// Escapes characters that TeX would otherwise interpret.
pub fn escape_tex(s: &str) -> String {
    lazy_static! {
        static ref TEX_SPECIAL_RX: Regex = Regex::new(r"[&%$#_{}\\~^]").unwrap();
    }
    TEX_SPECIAL_RX
        .replace_all(s, |caps: &Captures| match &caps[0] {
            "\\" => r"\textbackslash{}".to_string(),
            "~" => r"\textasciitilde{}".to_string(),
            "^" => r"\textasciicircum{}".to_string(),
            other => format!("\\{}", other),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_case::test_case;

    #[test_case("Pizza" => "Pizza"; "plain")]
    #[test_case("Food & drinks" => "Food \\& drinks"; "ampersand")]
    #[test_case("100% $5 #1" => "100\\% \\$5 \\#1"; "percent_dollar_hash")]
    #[test_case("a_b {c}" => "a\\_b \\{c\\}"; "underscore_braces")]
    #[test_case("C:\\temp" => "C:\\textbackslash{}temp"; "backslash")]
    #[test_case("~a^b" => "\\textasciitilde{}a\\textasciicircum{}b"; "tilde_caret")]
    #[test_case("\\&" => "\\textbackslash{}\\&"; "backslash_not_doubled")]
    fn escape(s: &str) -> String {
        escape_tex(s)
    }

    #[test]
    fn row_format() {
        assert_eq!(
            "Tent&01.03.2024&\\amount{10.00}\\\\",
            table_row("Tent", "01.03.2024", "10.00")
        );
    }
}
