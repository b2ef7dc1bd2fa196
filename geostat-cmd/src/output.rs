//! Writing tables as CSV and values as JSON, to a file or stdout.

use anyhow::Context;
use geostat_data::table::Tabular;
use log::info;
use serde::Serialize;
use std::io::Write;

/// Write `table` as CSV to `path`, or to stdout when no path is given.
pub fn write_table<T: Tabular + ?Sized>(table: &T, path: Option<&str>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path))?;
            write_csv(table, file)?;
            info!("Wrote {}", path);
        }
        None => write_csv(table, std::io::stdout().lock())?,
    }
    Ok(())
}

/// Serialize a table as CSV into any writer.
pub fn write_csv<T: Tabular + ?Sized, W: Write>(table: &T, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    wtr.write_record(table.headers())?;
    for record in table.records() {
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `value` as pretty JSON to `path`, or to stdout when no path is given.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: Option<&str>) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("Failed to write {}", path))?;
            info!("Wrote {}", path);
        }
        None => println!("{}", text),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geostat_data::decade::{BucketValue, DecadeBucket};

    #[test]
    fn test_write_csv() {
        let buckets = vec![
            DecadeBucket {
                label: "1990-1999".into(),
                values: vec![BucketValue { label: "Kvemo Kartli".into(), value: 12.0 }],
            },
            DecadeBucket {
                label: "2000-2009".into(),
                values: vec![BucketValue { label: "Kvemo Kartli".into(), value: 0.0 }],
            },
        ];
        let mut out = Vec::new();
        write_csv(buckets.as_slice(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "period,Kvemo Kartli\n1990-1999,12\n2000-2009,0\n"
        );
    }
}
