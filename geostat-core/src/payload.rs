//! Lenient readers for statistics API response bodies.
//!
//! `data` responses look like `{ "data": { "data": [rows], "categories": [..] } }`,
//! `metadata` responses like
//! `{ "data": { "metadata": { "variables": [{ "valueTexts": [..] }, ..] } } }`.
//! Missing pieces are logged and treated as empty so that a chart can still
//! render whatever series did arrive.

use crate::observation::{ObservationRow, ValueLabel};
use log::warn;
use serde::Serialize;
use serde_json::Value;

/// Rows and optional symbolic category keys of a `data` response.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DataPayload {
    pub rows: Vec<ObservationRow>,
    pub categories: Vec<String>,
}

impl DataPayload {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Label lists of a `metadata` response, one per dataset variable.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub variables: Vec<Vec<ValueLabel>>,
}

impl Metadata {
    /// Labels of variable `index`; empty when the variable does not exist.
    pub fn variable(&self, index: usize) -> &[ValueLabel] {
        self.variables
            .get(index)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.variables.iter().all(|v| v.is_empty())
    }
}

/// Read a `data` response body.
pub fn parse_data(body: &Value) -> DataPayload {
    let inner = body.get("data");
    let rows = match inner.and_then(|d| d.get("data")) {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                match ObservationRow::try_from(item.clone()) {
                    Ok(row) => Some(row),
                    Err(e) => {
                        warn!("Skipping observation row {}: {}", i, e);
                        None
                    }
                }
            })
            .collect(),
        Some(other) => {
            warn!("data.data is not an array: {}", type_name(other));
            Vec::new()
        }
        None => {
            warn!("Response has no data.data field");
            Vec::new()
        }
    };
    let categories = match inner.and_then(|d| d.get("categories")) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    };
    DataPayload { rows, categories }
}

/// Read a `metadata` response body.
pub fn parse_metadata(body: &Value) -> Metadata {
    let variables = body
        .get("data")
        .and_then(|d| d.get("metadata"))
        .and_then(|m| m.get("variables"));
    let variables = match variables {
        Some(Value::Array(vars)) => vars
            .iter()
            .enumerate()
            .map(|(i, var)| match var.get("valueTexts") {
                Some(Value::Array(texts)) => {
                    let texts = texts.iter().filter_map(scalar_text).collect::<Vec<_>>();
                    ValueLabel::from_texts(&texts)
                }
                _ => {
                    warn!("Metadata variable {} has no valueTexts", i);
                    Vec::new()
                }
            })
            .collect(),
        _ => {
            warn!("Response has no data.metadata.variables array");
            Vec::new()
        }
    };
    Metadata { variables }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
