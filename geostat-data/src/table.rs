//! Row-oriented download shapes for spreadsheet and document exports.

use crate::decade::DecadeBucket;
use crate::flow::FlowGraph;
use crate::pivot::PivotedRow;
use geostat_core::Language;

/// Something that can be written as a header row followed by records.
pub trait Tabular {
    fn headers(&self) -> Vec<String>;
    fn records(&self) -> Vec<Vec<String>>;
}

/// Integers without a fractional part, other values as-is, gaps empty.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", v as i64),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

impl Tabular for [PivotedRow] {
    fn headers(&self) -> Vec<String> {
        let mut headers = vec!["year".to_string()];
        if let Some(first) = self.first() {
            headers.extend(first.labels().map(str::to_string));
        }
        headers
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.iter()
            .map(|row| {
                let mut record = vec![row.year.clone()];
                record.extend(row.values.iter().map(|v| format_number(v.value)));
                record
            })
            .collect()
    }
}

impl Tabular for [DecadeBucket] {
    fn headers(&self) -> Vec<String> {
        let mut headers = vec!["period".to_string()];
        if let Some(first) = self.first() {
            headers.extend(first.values.iter().map(|v| v.label.clone()));
        }
        headers
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.iter()
            .map(|bucket| {
                let mut record = vec![bucket.label.clone()];
                record.extend(bucket.values.iter().map(|v| format_number(Some(v.value))));
                record
            })
            .collect()
    }
}

/// Edge list of a flow graph with node names in one language.
pub struct FlowTable<'a> {
    pub graph: &'a FlowGraph,
    pub language: Language,
}

impl Tabular for FlowTable<'_> {
    fn headers(&self) -> Vec<String> {
        vec!["source".to_string(), "target".to_string(), "value".to_string()]
    }

    fn records(&self) -> Vec<Vec<String>> {
        let name = |i: usize| {
            self.graph
                .nodes
                .get(i)
                .map(|n| n.name(self.language).to_string())
                .unwrap_or_default()
        };
        self.graph
            .edges
            .iter()
            .map(|e| vec![name(e.source), name(e.target), format_number(Some(e.weight))])
            .collect()
    }
}
