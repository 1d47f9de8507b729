//! Publication CSV parser
//!
//! The dataset is parsed positionally with a plain comma split. Quoted
//! fields are not honored: a comma inside quotes still splits the row, and
//! every `"` is stripped from the values.

use spacebio_common::db::models::NewPublication;
use tracing::debug;

/// Title used when the first column is empty
pub const UNTITLED: &str = "Untitled";

// Column positions
const TITLE: usize = 0;
const AUTHORS: usize = 1;
const YEAR: usize = 2;
const ABSTRACT: usize = 3;
const KEYWORDS: usize = 4;
const DOI: usize = 5;
const PUBLICATION_URL: usize = 6;
const ORGANISMS: usize = 7;
const EXPERIMENT_TYPE: usize = 8;
const RESEARCH_AREA: usize = 9;

/// Parse a whole CSV body. The first line is the header; blank lines are skipped.
pub fn parse_publications(csv: &str) -> Vec<NewPublication> {
    let mut lines = csv.split('\n');

    if let Some(header) = lines.next() {
        debug!(headers = ?split_row(header), "CSV headers");
    }

    lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_row(&split_row(line)))
        .collect()
}

/// Naive comma split; each value trimmed with quotes removed
pub fn split_row(line: &str) -> Vec<String> {
    line.split(',')
        .map(|v| v.trim().replace('"', ""))
        .collect()
}

/// Map positional values onto a publication
pub fn parse_row(values: &[String]) -> NewPublication {
    let column = |i: usize| values.get(i).map(String::as_str).filter(|v| !v.is_empty());
    let text = |i: usize| column(i).map(str::to_string);
    let list = |i: usize| column(i).map(split_list).unwrap_or_default();

    NewPublication {
        title: text(TITLE).unwrap_or_else(|| UNTITLED.to_string()),
        authors: list(AUTHORS),
        year: column(YEAR).and_then(parse_year),
        abstract_text: text(ABSTRACT),
        keywords: list(KEYWORDS),
        doi: text(DOI),
        publication_url: text(PUBLICATION_URL),
        organisms: list(ORGANISMS),
        experiment_type: text(EXPERIMENT_TYPE),
        research_area: text(RESEARCH_AREA),
    }
}

/// Split a `;`-separated cell and trim each element. Empty elements are
/// kept, so `"bone;"` yields `["bone", ""]`; an empty cell is handled by
/// the caller and maps to no elements.
pub fn split_list(cell: &str) -> Vec<String> {
    cell.split(';').map(|s| s.trim().to_string()).collect()
}

/// Leading-integer parse: optional sign then digits, anything after is ignored
pub fn parse_year(value: &str) -> Option<i32> {
    let value = value.trim_start();
    let sign_len = usize::from(value.starts_with(['+', '-']));
    let digits = value[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();

    if digits == 0 {
        return None;
    }

    value[..sign_len + digits].parse().ok()
}
