//! `catalog` subcommand: list chart identifiers.

use crate::output::write_json;
use anyhow::Context;
use clap::Args;
use geostat_core::{catalog::Catalog, Language};

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Catalog JSON to normalize instead of the embedded one
    #[arg(short, long)]
    pub file: Option<String>,

    /// Only list charts directly under this group, e.g. nature/forestandfieldfires
    #[arg(short, long)]
    pub group: Option<String>,

    /// Print normalized JSON instead of `chartID<TAB>title` lines
    #[arg(long)]
    pub json: bool,
}

pub fn run_catalog(args: &CatalogArgs, language: Language) -> anyhow::Result<()> {
    let loaded;
    let catalog = match &args.file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalog {}", path))?;
            loaded = Catalog::load(&text).with_context(|| format!("Invalid catalog {}", path))?;
            &loaded
        }
        None => Catalog::builtin(),
    };

    let charts = match &args.group {
        Some(group) => {
            let path: Vec<&str> = group.split('/').filter(|s| !s.is_empty()).collect();
            catalog.charts_in(&path)?
        }
        None => catalog.leaves(),
    };

    if args.json {
        return write_json(&charts, None);
    }
    for chart in listing(&charts, language) {
        println!("{}", chart);
    }
    Ok(())
}

fn listing(
    charts: &[&geostat_core::catalog::NormalizedChartDefinition],
    language: Language,
) -> Vec<String> {
    charts
        .iter()
        .map(|c| format!("{}\t{}", c.chart_id, c.title(language)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_uses_language() {
        let catalog = Catalog::builtin();
        let charts = catalog.charts_in(&["transport"]).unwrap();
        assert_eq!(
            listing(&charts, Language::English),
            vec!["registered-road-vehicles\tRegistered Road Vehicles"]
        );
        assert_eq!(
            listing(&charts, Language::Georgian),
            vec!["registered-road-vehicles\tრეგისტრირებული საგზაო სატრანსპორტო საშუალებები"]
        );
    }
}
