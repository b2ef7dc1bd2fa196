//! Averages of yearly rows over fixed year ranges, used by the decade heatmap.

use crate::pivot::{check_columns, select_labels, unique_columns};
use geostat_core::{ObservationRow, ValueLabel};
use log::warn;
use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};

/// Key carrying the bucket label of a serialized [`DecadeBucket`].
pub const LABEL_COLUMN: &str = "label";

/// A half-open year range `[start, end)`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct YearBucket {
    pub start: i32,
    pub end: i32,
    pub label: String,
}

impl YearBucket {
    /// Bucket labeled with its inclusive years, e.g. `1990-1999`.
    pub fn new(start: i32, end: i32) -> Self {
        YearBucket {
            start,
            end,
            label: format!("{}-{}", start, end - 1),
        }
    }

    /// `count` consecutive decades beginning at `first_start`. Stops early at
    /// the last decade whose end fits in an `i32`.
    pub fn decades(first_start: i32, count: u16) -> Vec<YearBucket> {
        let buckets: Vec<YearBucket> = (0..i32::from(count))
            .map_while(|i| {
                let start = first_start.checked_add(i * 10)?;
                let end = start.checked_add(10)?;
                Some(YearBucket::new(start, end))
            })
            .collect();
        if buckets.len() < usize::from(count) {
            warn!(
                "Only {} of {} decades from {} fit the year range",
                buckets.len(),
                count,
                first_start
            );
        }
        buckets
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year < self.end
    }
}

/// A region (or any category) and the row key holding its values.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RegionColumn {
    pub label: String,
    pub key: String,
}

impl RegionColumn {
    pub fn new(label: &str, key: &str) -> Self {
        RegionColumn {
            label: label.to_string(),
            key: key.to_string(),
        }
    }

    /// Columns for the selected metadata labels, keyed by label id. Repeated
    /// positions are dropped and clashing names renamed.
    pub fn from_labels(labels: &[ValueLabel], selected: &[usize]) -> Vec<RegionColumn> {
        let selected = select_labels(labels, selected);
        let names = selected.iter().map(|l| l.name.as_str()).collect::<Vec<_>>();
        selected
            .iter()
            .zip(unique_columns(LABEL_COLUMN, &names))
            .map(|(l, name)| RegionColumn::new(&name, &l.key()))
            .collect()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct BucketValue {
    pub label: String,
    pub value: f64,
}

/// One bucket of averaged values. Serializes as
/// `{"label": "<bucket>", "<region>": value, ...}`.
#[derive(Debug, PartialEq, Clone)]
pub struct DecadeBucket {
    pub label: String,
    pub values: Vec<BucketValue>,
}

impl DecadeBucket {
    pub fn get(&self, region: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.label == region)
            .map(|v| v.value)
    }
}

impl Serialize for DecadeBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        check_columns(LABEL_COLUMN, self.values.iter().map(|v| v.label.as_str()))
            .map_err(S::Error::custom)?;
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(LABEL_COLUMN, &self.label)?;
        for v in &self.values {
            map.serialize_entry(&v.label, &v.value)?;
        }
        map.end()
    }
}

/// Average each region over the rows falling in each bucket.
///
/// Only strictly positive values count toward an average, which is rounded
/// to the nearest integer; a bucket/region with no such value reports `0`.
/// Exactly one bucket is returned per entry of `buckets`, in order.
pub fn aggregate_by_decade(
    rows: &[ObservationRow],
    regions: &[RegionColumn],
    buckets: &[YearBucket],
) -> Vec<DecadeBucket> {
    buckets
        .iter()
        .map(|bucket| {
            let in_bucket: Vec<&ObservationRow> =
                rows.iter().filter(|r| bucket.contains(r.year)).collect();
            let values = regions
                .iter()
                .map(|region| BucketValue {
                    label: region.label.clone(),
                    value: positive_average(in_bucket.iter().filter_map(|r| r.number(&region.key))),
                })
                .collect();
            DecadeBucket {
                label: bucket.label.clone(),
                values,
            }
        })
        .collect()
}

fn positive_average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| *v > 0.0)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions() -> Vec<RegionColumn> {
        vec![
            RegionColumn::new("Tbilisi", "0"),
            RegionColumn::new("Kakheti", "1"),
        ]
    }

    #[test]
    fn test_every_boundary_gets_a_bucket() {
        let rows = vec![ObservationRow::new(1995).with("0", 13.2).with("1", 12)];
        let buckets = vec![YearBucket::new(1990, 2000), YearBucket::new(2000, 2010)];
        let result = aggregate_by_decade(&rows, &regions(), &buckets);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].label, "1990-1999");
        assert_eq!(result[0].get("Tbilisi"), Some(13.0));
        assert_eq!(result[1].label, "2000-2009");
        assert!(result[1].values.iter().all(|v| v.value == 0.0));
        assert_eq!(result[1].values.len(), 2);
    }

    #[test]
    fn test_non_positive_values_are_excluded() {
        let rows = vec![
            ObservationRow::new(2001).with("0", 0),
            ObservationRow::new(2002).with("0", -5),
            ObservationRow::new(2003).with("0", 20),
        ];
        let result = aggregate_by_decade(&rows, &regions(), &YearBucket::decades(2000, 1));
        assert_eq!(result[0].get("Tbilisi"), Some(20.0));
        assert_eq!(result[0].get("Kakheti"), Some(0.0));
    }

    #[test]
    fn test_average_is_rounded() {
        let rows = vec![
            ObservationRow::new(1980).with("1", 10),
            ObservationRow::new(1989).with("1", "11"),
            ObservationRow::new(1990).with("1", 1000),
        ];
        let result = aggregate_by_decade(&rows, &regions(), &YearBucket::decades(1980, 1));
        assert_eq!(result[0].get("Kakheti"), Some(11.0));
    }

    #[test]
    fn test_bucket_end_is_exclusive() {
        let bucket = YearBucket::new(1990, 2000);
        assert!(bucket.contains(1990));
        assert!(bucket.contains(1999));
        assert!(!bucket.contains(2000));
    }

    #[test]
    fn test_decades_are_consecutive() {
        let decades = YearBucket::decades(1980, 4);
        assert_eq!(decades.len(), 4);
        assert_eq!(decades[3], YearBucket::new(2010, 2020));
        assert_eq!(decades[3].label, "2010-2019");
    }

    #[test]
    fn test_custom_boundaries_keep_order() {
        let buckets = vec![YearBucket::new(2010, 2015), YearBucket::new(2000, 2010)];
        let rows = vec![ObservationRow::new(2012).with("0", 4)];
        let result = aggregate_by_decade(&rows, &regions(), &buckets);
        assert_eq!(result[0].label, "2010-2014");
        assert_eq!(result[0].get("Tbilisi"), Some(4.0));
        assert_eq!(result[1].get("Tbilisi"), Some(0.0));
    }

    #[test]
    fn test_regions_from_labels() {
        let labels = ValueLabel::from_texts(&["Tbilisi", "Imereti", "Guria"]);
        let columns = RegionColumn::from_labels(&labels, &[2, 0, 5]);
        assert_eq!(columns, vec![RegionColumn::new("Guria", "2"), RegionColumn::new("Tbilisi", "0")]);
    }

    #[test]
    fn test_decades_stop_before_overflow() {
        let decades = YearBucket::decades(i32::MAX - 25, 5);
        assert_eq!(decades.len(), 2);
        assert_eq!(decades[1].end, i32::MAX - 5);
        assert_eq!(YearBucket::decades(2000, u16::MAX).len(), usize::from(u16::MAX));
    }

    #[test]
    fn test_regions_from_repeated_and_clashing_labels() {
        let labels = ValueLabel::from_texts(&["Guria", "label", "Guria"]);
        let columns = RegionColumn::from_labels(&labels, &[0, 0, 1, 2]);
        assert_eq!(
            columns,
            vec![
                RegionColumn::new("Guria", "0"),
                RegionColumn::new("label (2)", "1"),
                RegionColumn::new("Guria (2)", "2"),
            ]
        );
    }

    #[test]
    fn test_serializing_clashing_regions_fails() {
        let bucket = DecadeBucket {
            label: "1990-1999".to_string(),
            values: vec![BucketValue { label: "label".into(), value: 1.0 }],
        };
        assert!(serde_json::to_string(&bucket).is_err());
    }

    #[test]
    fn test_serializes_flat() {
        let bucket = DecadeBucket {
            label: "1990-1999".to_string(),
            values: vec![BucketValue { label: "Guria".into(), value: 14.0 }],
        };
        assert_eq!(
            serde_json::to_string(&bucket).unwrap(),
            r#"{"label":"1990-1999","Guria":14.0}"#
        );
    }
}
