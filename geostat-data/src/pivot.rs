//! Selecting labeled series out of positional observation rows and pivoting
//! them into one row per year.

use geostat_core::{ObservationRow, ValueLabel};
use log::debug;
use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};
use std::collections::HashSet;

/// Key carrying the year of a serialized [`PivotedRow`].
pub const YEAR_COLUMN: &str = "year";

/// What a pivoted cell holds when the source value is missing or not numeric.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum MissingValue {
    /// Report `0.0`.
    #[default]
    Zero,
    /// Report no value, leaving a gap in the series.
    Gap,
}

/// Chart family consuming a pivoted series.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SeriesKind {
    Line,
    Bar,
    Area,
}

impl SeriesKind {
    /// Line charts break at missing years; bars and stacked areas treat them
    /// as zero.
    pub fn missing_value(&self) -> MissingValue {
        match self {
            SeriesKind::Line => MissingValue::Gap,
            SeriesKind::Bar | SeriesKind::Area => MissingValue::Zero,
        }
    }
}

impl std::str::FromStr for SeriesKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "line" => Ok(SeriesKind::Line),
            "bar" => Ok(SeriesKind::Bar),
            "area" => Ok(SeriesKind::Area),
            other => Err(format!("unknown series kind: {}", other)),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct SeriesValue {
    pub label: String,
    pub value: Option<f64>,
}

/// One year of a pivoted series set. Serializes as
/// `{"year": "<year>", "<label>": value, ...}` in selection order.
#[derive(Debug, PartialEq, Clone)]
pub struct PivotedRow {
    pub year: String,
    pub values: Vec<SeriesValue>,
}

impl PivotedRow {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.label == label)
            .and_then(|v| v.value)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.label.as_str())
    }
}

impl Serialize for PivotedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        check_columns(YEAR_COLUMN, self.labels()).map_err(S::Error::custom)?;
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(YEAR_COLUMN, &self.year)?;
        for v in &self.values {
            map.serialize_entry(&v.label, &v.value)?;
        }
        map.end()
    }
}

/// Labels at the selected positions. Positions without a label are dropped,
/// as are repeats of an already selected position.
pub fn select_labels<'a>(labels: &'a [ValueLabel], selected: &[usize]) -> Vec<&'a ValueLabel> {
    let mut seen = HashSet::new();
    selected
        .iter()
        .filter(|&&i| seen.insert(i))
        .filter_map(|&i| {
            let label = labels.get(i);
            if label.is_none() {
                debug!("No label at position {}, dropping it from the selection", i);
            }
            label
        })
        .collect()
}

/// Column names for `names` that are distinct from each other and from
/// `reserved`. A clashing name gets a ` (2)`, ` (3)`, ... suffix.
pub fn unique_columns<S: AsRef<str>>(reserved: &str, names: &[S]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    used.insert(reserved.to_string());
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let mut column = name.to_string();
            let mut n = 2;
            while used.contains(&column) {
                column = format!("{} ({})", name, n);
                n += 1;
            }
            if column != name {
                debug!("Column {:?} renamed to {:?}", name, column);
            }
            used.insert(column.clone());
            column
        })
        .collect()
}

/// Fails when a column repeats or equals the `reserved` key.
pub(crate) fn check_columns<'a>(
    reserved: &str,
    columns: impl Iterator<Item = &'a str>,
) -> Result<(), String> {
    let mut seen = HashSet::new();
    for column in columns {
        if column == reserved {
            return Err(format!("column {:?} clashes with the {:?} key", column, reserved));
        }
        if !seen.insert(column) {
            return Err(format!("column {:?} appears more than once", column));
        }
    }
    Ok(())
}

/// Pivot positional rows into one row per year label.
///
/// Each selected label contributes a column read from the row key equal to the
/// label's id. Years without a matching row are omitted; output follows the
/// order of `years`.
pub fn pivot(
    labels: &[ValueLabel],
    rows: &[ObservationRow],
    selected: &[usize],
    years: &[ValueLabel],
    missing: MissingValue,
) -> Vec<PivotedRow> {
    let series = select_labels(labels, selected)
        .into_iter()
        .map(|label| (label.name.clone(), label.key()))
        .collect::<Vec<_>>();
    pivot_columns(&series, rows, years, missing)
}

/// Pivot rows whose values are keyed by symbolic category keys.
///
/// `category_keys[i]` is the row key holding the value of the label with id
/// `i`. Selected labels without a category key are dropped.
pub fn pivot_by_keys(
    category_keys: &[String],
    labels: &[ValueLabel],
    rows: &[ObservationRow],
    selected: &[usize],
    years: &[ValueLabel],
    missing: MissingValue,
) -> Vec<PivotedRow> {
    let series = select_labels(labels, selected)
        .into_iter()
        .filter_map(|label| {
            category_keys
                .get(label.id)
                .map(|key| (label.name.clone(), key.clone()))
        })
        .collect::<Vec<_>>();
    pivot_columns(&series, rows, years, missing)
}

fn pivot_columns(
    series: &[(String, String)],
    rows: &[ObservationRow],
    years: &[ValueLabel],
    missing: MissingValue,
) -> Vec<PivotedRow> {
    let names = series.iter().map(|(label, _)| label.as_str()).collect::<Vec<_>>();
    let columns = unique_columns(YEAR_COLUMN, &names);
    let by_year = ObservationRow::by_year(rows);
    years
        .iter()
        .filter_map(|year_label| {
            let row = by_year.get(&year_label.as_year()?)?;
            let values = series
                .iter()
                .zip(&columns)
                .map(|((_, key), label)| SeriesValue {
                    label: label.clone(),
                    value: read_value(row, key, missing),
                })
                .collect();
            Some(PivotedRow {
                year: year_label.name.clone(),
                values,
            })
        })
        .collect()
}

fn read_value(row: &ObservationRow, key: &str, missing: MissingValue) -> Option<f64> {
    match missing {
        MissingValue::Zero => Some(row.number_or_zero(key)),
        MissingValue::Gap => row.number(key),
    }
}

/// Ascending year labels for every distinct year present in `rows`, for
/// datasets whose metadata carries no year variable.
pub fn years_from_rows(rows: &[ObservationRow]) -> Vec<ValueLabel> {
    let years = ObservationRow::by_year(rows)
        .keys()
        .map(|y| y.to_string())
        .collect::<Vec<_>>();
    ValueLabel::from_texts(&years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labels() -> Vec<ValueLabel> {
        ValueLabel::from_texts(&["Surface water", "Groundwater", "Sea water"])
    }

    fn years() -> Vec<ValueLabel> {
        ValueLabel::from_texts(&["2020", "2021"])
    }

    #[test]
    fn test_year_without_row_is_omitted() {
        let rows = vec![ObservationRow::new(2020).with("0", "5").with("1", "7")];
        let pivoted = pivot(&labels(), &rows, &[0, 1], &years(), MissingValue::Zero);
        assert_eq!(pivoted.len(), 1);
        assert_eq!(pivoted[0].year, "2020");
        assert_eq!(pivoted[0].get("Surface water"), Some(5.0));
        assert_eq!(pivoted[0].get("Groundwater"), Some(7.0));
        assert_eq!(pivoted[0].values.len(), 2);
    }

    #[test]
    fn test_out_of_range_selection_is_dropped() {
        let rows = vec![ObservationRow::new(2021).with("2", 3)];
        let pivoted = pivot(&labels(), &rows, &[2, 9], &years(), MissingValue::Zero);
        assert_eq!(pivoted.len(), 1);
        assert_eq!(pivoted[0].labels().collect::<Vec<_>>(), vec!["Sea water"]);
    }

    #[test]
    fn test_missing_value_policies() {
        let rows = vec![ObservationRow::new(2020).with("0", "..")];
        let zero = pivot(&labels(), &rows, &[0, 1], &years(), MissingValue::Zero);
        assert_eq!(zero[0].values[0].value, Some(0.0));
        assert_eq!(zero[0].values[1].value, Some(0.0));

        let gap = pivot(&labels(), &rows, &[0, 1], &years(), SeriesKind::Line.missing_value());
        assert_eq!(gap[0].values[0].value, None);
        assert_eq!(gap[0].values[1].value, None);
    }

    #[test]
    fn test_every_row_has_same_labels_in_year_order() {
        let rows = vec![
            ObservationRow::new(2021).with("0", 2),
            ObservationRow::new(2020).with("1", 1),
        ];
        let pivoted = pivot(&labels(), &rows, &[1, 0], &years(), MissingValue::Zero);
        assert_eq!(
            pivoted.iter().map(|r| r.year.as_str()).collect::<Vec<_>>(),
            vec!["2020", "2021"]
        );
        for row in &pivoted {
            assert_eq!(
                row.labels().collect::<Vec<_>>(),
                vec!["Groundwater", "Surface water"]
            );
        }
    }

    #[test]
    fn test_empty_inputs_give_empty_pivot() {
        assert!(pivot(&[], &[], &[0, 1], &years(), MissingValue::Zero).is_empty());
        let rows = vec![ObservationRow::new(2020).with("0", 1)];
        assert!(pivot(&labels(), &rows, &[0], &[], MissingValue::Zero).is_empty());
    }

    #[test]
    fn test_pivot_by_category_keys() {
        let keys = vec!["forest".to_string(), "field".to_string()];
        let names = ValueLabel::from_texts(&["Forest fires", "Field fires", "Unkeyed"]);
        let rows = vec![ObservationRow::new(2020).with("forest", 12).with("field", "4")];
        let pivoted = pivot_by_keys(&keys, &names, &rows, &[1, 0, 2], &years(), MissingValue::Zero);
        assert_eq!(pivoted.len(), 1);
        assert_eq!(pivoted[0].get("Field fires"), Some(4.0));
        assert_eq!(pivoted[0].get("Forest fires"), Some(12.0));
        assert_eq!(pivoted[0].values.len(), 2);
    }

    #[test]
    fn test_serializes_flat_in_label_order() {
        let row = PivotedRow {
            year: "2020".to_string(),
            values: vec![
                SeriesValue { label: "b".into(), value: Some(1.5) },
                SeriesValue { label: "a".into(), value: None },
            ],
        };
        let text = serde_json::to_string(&row).unwrap();
        assert_eq!(text, r#"{"year":"2020","b":1.5,"a":null}"#);
        assert_eq!(serde_json::to_value(&row).unwrap()["b"], json!(1.5));
    }

    #[test]
    fn test_repeated_selection_is_dropped() {
        let rows = vec![ObservationRow::new(2020).with("0", 5).with("1", 9)];
        let pivoted = pivot(&labels(), &rows, &[0, 0, 1, 0], &years(), MissingValue::Zero);
        assert_eq!(
            pivoted[0].labels().collect::<Vec<_>>(),
            vec!["Surface water", "Groundwater"]
        );
    }

    #[test]
    fn test_clashing_label_names_are_renamed() {
        let names = ValueLabel::from_texts(&["A", "year", "A"]);
        let rows = vec![ObservationRow::new(2020).with("0", 5).with("1", 9).with("2", 1)];
        let pivoted = pivot(&names, &rows, &[0, 1, 2], &years(), MissingValue::Zero);
        assert_eq!(
            serde_json::to_value(&pivoted).unwrap(),
            json!([{"year": "2020", "A": 5.0, "year (2)": 9.0, "A (2)": 1.0}])
        );
    }

    #[test]
    fn test_serializing_clashing_columns_fails() {
        let row = PivotedRow {
            year: "2020".to_string(),
            values: vec![SeriesValue { label: "year".into(), value: Some(1.0) }],
        };
        assert!(serde_json::to_string(&row).is_err());
        let row = PivotedRow {
            year: "2020".to_string(),
            values: vec![
                SeriesValue { label: "a".into(), value: Some(1.0) },
                SeriesValue { label: "a".into(), value: Some(2.0) },
            ],
        };
        assert!(serde_json::to_string(&row).is_err());
    }

    #[test]
    fn test_unique_columns() {
        assert_eq!(
            unique_columns("year", &["x", "x", "x (2)", "year"]),
            vec!["x", "x (2)", "x (2) (2)", "year (2)"]
        );
    }

    #[test]
    fn test_years_from_rows() {
        let rows = vec![
            ObservationRow::new(2003),
            ObservationRow::new(2001),
            ObservationRow::new(2003),
        ];
        let names: Vec<String> = years_from_rows(&rows).into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["2001", "2003"]);
    }

    #[test]
    fn test_series_kind_from_str() {
        assert_eq!("Bar".parse::<SeriesKind>(), Ok(SeriesKind::Bar));
        assert!("pie".parse::<SeriesKind>().is_err());
    }
}
