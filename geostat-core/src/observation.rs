use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key under which every observation row carries its year.
pub const YEAR_KEY: &str = "year";

/// One entry of a metadata label list.
///
/// `id` is the zero-based position of the label in its list; observation rows
/// use the stringified `id` as the key of the matching value.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct ValueLabel {
    pub name: String,
    pub id: usize,
}

impl ValueLabel {
    /// Build labels from an ordered list of display texts.
    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Vec<ValueLabel> {
        texts
            .iter()
            .enumerate()
            .map(|(id, name)| ValueLabel {
                name: name.as_ref().to_string(),
                id,
            })
            .collect()
    }

    /// The positional key used by observation rows.
    pub fn key(&self) -> String {
        self.id.to_string()
    }

    /// Numeric reading of the label text, for year label lists.
    pub fn as_year(&self) -> Option<i32> {
        self.name.trim().parse::<i32>().ok()
    }
}

/// A year-keyed observation record as served by the statistics API.
///
/// Every field other than `year` is kept verbatim; values may be JSON numbers
/// or numeric strings depending on the dataset.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct ObservationRow {
    pub year: i32,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl ObservationRow {
    pub fn new(year: i32) -> Self {
        ObservationRow {
            year,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert used mostly by tests and fixtures.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Value at `key` coerced to a float. Missing, null and non-numeric values
    /// yield `None`.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.raw(key).and_then(coerce_number)
    }

    /// Value at `key` coerced to a float, defaulting to `0.0`.
    pub fn number_or_zero(&self, key: &str) -> f64 {
        self.number(key).unwrap_or(0.0)
    }

    /// Index rows by year. Later duplicates of a year are ignored.
    pub fn by_year(rows: &[ObservationRow]) -> BTreeMap<i32, &ObservationRow> {
        let mut result = BTreeMap::new();
        for row in rows {
            result.entry(row.year).or_insert(row);
        }
        result
    }
}

/// Coerce a JSON scalar to a finite float. Strings are read up to the end of
/// their leading number, so `"12,5"` is `12` and `"5 t"` is `5`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - end - 1;
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    text[..end].parse::<f64>().ok()
}

fn coerce_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

impl TryFrom<Value> for ObservationRow {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => map.try_into(),
            other => Err(format!("observation row is not an object: {}", other)),
        }
    }
}

impl TryFrom<Map<String, Value>> for ObservationRow {
    type Error = String;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        let year = map
            .remove(YEAR_KEY)
            .ok_or_else(|| "observation row has no year".to_string())?;
        let year = coerce_year(&year).ok_or_else(|| format!("unreadable year: {}", year))?;
        Ok(ObservationRow {
            year,
            fields: map.into_iter().collect(),
        })
    }
}
