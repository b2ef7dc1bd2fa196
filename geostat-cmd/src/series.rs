//! `pivot` and `decades` subcommands.

use crate::output::{write_json, write_table};
use anyhow::Context;
use clap::Args;
use geostat_core::{client::StatsClient, Language};
use geostat_data::{
    decade::{aggregate_by_decade, RegionColumn, YearBucket},
    pivot::{pivot, pivot_by_keys, years_from_rows, SeriesKind},
};
use log::{info, warn};

#[derive(Args, Debug)]
pub struct PivotArgs {
    /// Dataset id, e.g. water-abstraction
    #[arg(short, long)]
    pub dataset: String,

    /// Comma-separated label positions to include
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub select: Vec<usize>,

    /// Metadata variable holding the series labels
    #[arg(long, default_value_t = 0)]
    pub label_variable: usize,

    /// Metadata variable holding the year labels (default: years present in the data)
    #[arg(long)]
    pub year_variable: Option<usize>,

    /// Chart family: line leaves gaps for missing values, bar and area use zero
    #[arg(long, default_value = "line")]
    pub kind: SeriesKind,

    /// Rows are keyed by the dataset's category keys instead of label positions
    #[arg(long)]
    pub by_category: bool,

    /// Output path (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write JSON instead of CSV
    #[arg(long)]
    pub json: bool,
}

pub async fn run_pivot(
    client: &StatsClient,
    language: Language,
    args: &PivotArgs,
) -> anyhow::Result<()> {
    let (data, metadata) = client
        .fetch_series(&args.dataset, language)
        .await
        .with_context(|| format!("Failed to fetch {}", args.dataset))?;

    let labels = metadata.variable(args.label_variable);
    let years = match args.year_variable {
        Some(v) => metadata.variable(v).to_vec(),
        None => years_from_rows(&data.rows),
    };
    let missing = args.kind.missing_value();
    let rows = if args.by_category {
        pivot_by_keys(&data.categories, labels, &data.rows, &args.select, &years, missing)
    } else {
        pivot(labels, &data.rows, &args.select, &years, missing)
    };

    if rows.is_empty() {
        warn!("No data available for {}", args.dataset);
    } else {
        info!(
            "Pivoted {} into {} years x {} series",
            args.dataset,
            rows.len(),
            rows[0].values.len()
        );
    }

    if args.json {
        write_json(&rows, args.output.as_deref())
    } else {
        write_table(rows.as_slice(), args.output.as_deref())
    }
}

#[derive(Args, Debug)]
pub struct DecadesArgs {
    /// Dataset id, e.g. air-temperature
    #[arg(short, long)]
    pub dataset: String,

    /// Comma-separated region label positions to include
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub regions: Vec<usize>,

    /// Metadata variable holding the region labels
    #[arg(long, default_value_t = 0)]
    pub region_variable: usize,

    /// First year of the first decade
    #[arg(long, default_value_t = 1980)]
    pub first: i32,

    /// Number of decades
    #[arg(long, default_value_t = 4)]
    pub count: u16,

    /// Output path (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write JSON instead of CSV
    #[arg(long)]
    pub json: bool,
}

pub async fn run_decades(
    client: &StatsClient,
    language: Language,
    args: &DecadesArgs,
) -> anyhow::Result<()> {
    let (data, metadata) = client
        .fetch_series(&args.dataset, language)
        .await
        .with_context(|| format!("Failed to fetch {}", args.dataset))?;

    let regions = RegionColumn::from_labels(metadata.variable(args.region_variable), &args.regions);
    if regions.is_empty() {
        warn!("None of the selected regions exist in {}", args.dataset);
    }
    let buckets = YearBucket::decades(args.first, args.count);
    let result = aggregate_by_decade(&data.rows, &regions, &buckets);
    info!(
        "Averaged {} rows into {} decades for {} regions",
        data.rows.len(),
        result.len(),
        regions.len()
    );

    if args.json {
        write_json(&result, args.output.as_deref())
    } else {
        write_table(result.as_slice(), args.output.as_deref())
    }
}
