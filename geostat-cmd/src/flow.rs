//! `flow` subcommand: one year of a two-level dataset as a flow graph.

use crate::output::{write_json, write_table};
use anyhow::Context;
use clap::Args;
use geostat_core::{client::StatsClient, Language, ObservationRow};
use geostat_data::{
    flow::{build_flow, build_tiered_flow, pair_key, FlowGraph, LocalizedLabel},
    table::FlowTable,
};
use log::{info, warn};

#[derive(Args, Debug)]
pub struct FlowArgs {
    /// Dataset id, e.g. forest-resources
    #[arg(short, long)]
    pub dataset: String,

    /// Year to build the flow for
    #[arg(short, long)]
    pub year: i32,

    /// Metadata variable holding the top-level categories
    #[arg(long, default_value_t = 0)]
    pub top_variable: usize,

    /// Metadata variable holding the second-level categories
    #[arg(long, default_value_t = 1)]
    pub second_variable: usize,

    /// Georgian name of the root node
    #[arg(long, default_value = "სულ")]
    pub root_ge: String,

    /// English name of the root node
    #[arg(long, default_value = "Total")]
    pub root_en: String,

    /// Top-level category that aggregates the others and feeds the leaves
    #[arg(long)]
    pub central: Option<String>,

    /// Output path (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Write the node/edge graph as JSON instead of an edge CSV
    #[arg(long)]
    pub json: bool,
}

pub async fn run_flow(client: &StatsClient, language: Language, args: &FlowArgs) -> anyhow::Result<()> {
    let (data, (georgian, english)) = tokio::try_join!(
        client.fetch_data_for_year(&args.dataset, language, args.year),
        client.fetch_localized_metadata(&args.dataset)
    )
    .with_context(|| format!("Failed to fetch {} for {}", args.dataset, args.year))?;

    let row = data
        .rows
        .iter()
        .find(|r| r.year == args.year)
        .with_context(|| format!("{} has no data for {}", args.dataset, args.year))?;

    let top = LocalizedLabel::zip(
        georgian.variable(args.top_variable),
        english.variable(args.top_variable),
    );
    let second = LocalizedLabel::zip(
        georgian.variable(args.second_variable),
        english.variable(args.second_variable),
    );
    let graph = build(row, args, &top, &second);

    if graph.edges.is_empty() {
        warn!("No positive flows in {} for {}", args.dataset, args.year);
    }
    info!(
        "Built flow with {} nodes and {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );

    if args.json {
        write_json(&graph, args.output.as_deref())
    } else {
        let table = FlowTable {
            graph: &graph,
            language,
        };
        write_table(&table, args.output.as_deref())
    }
}

fn build(
    row: &ObservationRow,
    args: &FlowArgs,
    top: &[LocalizedLabel],
    second: &[LocalizedLabel],
) -> FlowGraph {
    let root = LocalizedLabel::new(0, &args.root_ge, &args.root_en);
    match &args.central {
        Some(central) => build_tiered_flow(row, &root, top, central, second, pair_key),
        None => build_flow(row, &root, top, second, pair_key),
    }
}
