//! Command implementations for the geostat CLI.
//!
//! Provides subcommands for inspecting the chart catalog and for fetching
//! datasets from the statistics API and reshaping them into chart tables.

use clap::{Args, Subcommand};
use geostat_core::{client::StatsClient, config::ClientConfig, Language};

pub mod catalog;
pub mod flow;
pub mod output;
pub mod series;

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Statistics API base URL (overrides GEOSTAT_API_BASE)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Request timeout in seconds (overrides GEOSTAT_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Language of labels and titles: ge or en
    #[arg(long, global = true, default_value = "ge")]
    pub lang: Language,
}

impl GlobalOptions {
    /// Environment configuration with command-line overrides applied.
    pub fn client_config(&self) -> geostat_core::Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;
        if let Some(base) = &self.api_base {
            config = config.with_base_url(base)?;
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout_secs(secs)?;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the normalized chart catalog
    Catalog(catalog::CatalogArgs),

    /// Fetch a dataset and pivot selected series into one row per year
    Pivot(series::PivotArgs),

    /// Fetch a dataset and average selected regions per decade
    Decades(series::DecadesArgs),

    /// Fetch one year of a two-level dataset and build its flow graph
    Flow(flow::FlowArgs),
}

pub async fn run(options: GlobalOptions, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Catalog(args) => catalog::run_catalog(&args, options.lang),
        Command::Pivot(args) => {
            let client = StatsClient::new(options.client_config()?)?;
            series::run_pivot(&client, options.lang, &args).await
        }
        Command::Decades(args) => {
            let client = StatsClient::new(options.client_config()?)?;
            series::run_decades(&client, options.lang, &args).await
        }
        Command::Flow(args) => {
            let client = StatsClient::new(options.client_config()?)?;
            flow::run_flow(&client, options.lang, &args).await
        }
    }
}
