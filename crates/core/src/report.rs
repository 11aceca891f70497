//! Result tables as the operator sees them.
//!
//! Turns the raw summaries of a [`WorkflowSnapshot`] into titled tables of
//! display strings: headers derived from the wire field names, spend shown
//! as dollars, application lists joined.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::backend::{GartnerRow, TaxonomyRow, UploadSummaryRow};
use crate::workflow::WorkflowSnapshot;

static CAPITALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z])").unwrap());

/// A titled table of display strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    fn new(title: &str, keys: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            title: title.to_string(),
            headers: keys.iter().map(|k| column_header(k)).collect(),
            rows,
        }
    }
}

/// `totalSpend` -> `Total Spend`, `l1` -> `L1`.
pub fn column_header(key: &str) -> String {
    let spaced = CAPITALS.replace_all(key, " $1");
    let trimmed = spaced.trim();

    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Dollar amount with en-US grouping and at most two decimals.
///
/// `1250000.0` -> `$1,250,000`, `340250.5` -> `$340,250.5`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return format!("${}", value);
    }

    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let decimals = match fraction {
        0 => String::new(),
        f if f % 10 == 0 => format!(".{}", f / 10),
        f => format!(".{:02}", f),
    };

    format!("{}${}{}", sign, grouped, decimals)
}

pub fn upload_table(rows: &[UploadSummaryRow]) -> Option<ResultTable> {
    if rows.is_empty() {
        return None;
    }
    Some(ResultTable::new(
        "Upload summary",
        &["applicationType", "count", "totalSpend"],
        rows.iter()
            .map(|r| {
                vec![
                    r.application_type.clone(),
                    r.count.to_string(),
                    format_currency(r.total_spend),
                ]
            })
            .collect(),
    ))
}

pub fn taxonomy_table(rows: &[TaxonomyRow]) -> Option<ResultTable> {
    if rows.is_empty() {
        return None;
    }
    Some(ResultTable::new(
        "Taxonomy mapping output",
        &["l1", "applicationsCount", "spend"],
        rows.iter()
            .map(|r| {
                vec![
                    r.l1.clone(),
                    r.applications_count.to_string(),
                    format_currency(r.spend),
                ]
            })
            .collect(),
    ))
}

pub fn gartner_table(rows: &[GartnerRow]) -> Option<ResultTable> {
    if rows.is_empty() {
        return None;
    }
    Some(ResultTable::new(
        "Gartner best-in-class mapping",
        &["l1", "l2", "top5AppNames", "marketLeaders"],
        rows.iter()
            .map(|r| {
                vec![
                    r.l1.clone(),
                    r.l2.clone(),
                    r.top5_app_names.join(", "),
                    r.market_leaders.clone(),
                ]
            })
            .collect(),
    ))
}

/// Tables to show for `snapshot`, in display order.
///
/// The upload summary appears only once revealed; empty summaries produce
/// no table.
pub fn result_tables(snapshot: &WorkflowSnapshot) -> Vec<ResultTable> {
    let upload = snapshot
        .upload
        .summary
        .as_deref()
        .filter(|_| snapshot.upload.revealed)
        .and_then(upload_table);
    let taxonomy = snapshot.taxonomy.table.as_deref().and_then(taxonomy_table);
    let gartner = snapshot.gartner.table.as_deref().and_then(gartner_table);

    [upload, taxonomy, gartner].into_iter().flatten().collect()
}
