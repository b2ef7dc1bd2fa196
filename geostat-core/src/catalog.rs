//! Static chart catalog and chart identifier synthesis.
//!
//! The catalog is a nested structure of localized chart titles and page paths.
//! Sequences hold either leaf chart definitions or single-key grouping objects
//! whose value is a further sequence. Normalization gives every leaf a stable,
//! URL-safe `chartID` used as its DOM anchor and deep-link target.

use crate::error::{GeostatError, Result};
use crate::language::Language;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Embedded catalog of every chart on the site, keyed by page section.
pub static CATALOG_JSON: &str = include_str!("../../fixtures/charts.json");

/// Field under which the synthesized identifier is attached to a leaf.
pub const CHART_ID_KEY: &str = "chartID";

/// Title field used as the identifier candidate.
const ID_SOURCE_KEY: &str = "title_en";

/// Prefix for identifiers of leaves without a usable English title.
pub const DEFAULT_FALLBACK_PREFIX: &str = "chart";

/// A leaf of the catalog: titles and page paths in both languages.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ChartDefinition {
    #[serde(default)]
    pub title_ge: String,
    #[serde(default)]
    pub title_en: String,
    #[serde(default)]
    pub path_ge: String,
    #[serde(default)]
    pub path_en: String,
}

/// A chart definition with its resolved identifier.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct NormalizedChartDefinition {
    #[serde(flatten)]
    pub definition: ChartDefinition,
    #[serde(rename = "chartID")]
    pub chart_id: String,
}

impl NormalizedChartDefinition {
    pub fn title(&self, language: Language) -> &str {
        match language {
            Language::Georgian => &self.definition.title_ge,
            Language::English => &self.definition.title_en,
        }
    }

    pub fn path(&self, language: Language) -> &str {
        match language {
            Language::Georgian => &self.definition.path_ge,
            Language::English => &self.definition.path_en,
        }
    }

    /// Fragment that scrolls a page to this chart.
    pub fn anchor(&self) -> String {
        format!("#{}", self.chart_id)
    }
}

/// Lowercase, trim, turn whitespace runs into single hyphens and drop every
/// character outside `[a-z0-9-]`.
pub fn clean_identifier(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut cleaned = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for c in lowered.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                cleaned.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            cleaned.push(c);
        }
    }
    cleaned
}

/// Attach a unique `chartID` to every leaf of a catalog sequence.
///
/// Anything that is not a sequence is returned unchanged. Identifiers are
/// unique within this call only; normalizing the same input twice yields the
/// same identifiers.
pub fn normalize(node: Value, fallback_prefix: &str) -> Value {
    let mut seen = HashSet::new();
    normalize_with(node, fallback_prefix, &mut seen)
}

/// Normalize a top-level object of named sections in one pass, using each
/// section name as its fallback prefix.
pub fn normalize_sections(sections: Map<String, Value>) -> Map<String, Value> {
    let mut seen = HashSet::new();
    sections
        .into_iter()
        .map(|(key, value)| {
            let normalized = normalize_with(value, &key, &mut seen);
            (key, normalized)
        })
        .collect()
}

fn normalize_with(node: Value, prefix: &str, seen: &mut HashSet<String>) -> Value {
    match node {
        Value::Array(entries) => Value::Array(
            entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| normalize_entry(entry, index, prefix, seen))
                .collect(),
        ),
        other => other,
    }
}

fn normalize_entry(entry: Value, index: usize, prefix: &str, seen: &mut HashSet<String>) -> Value {
    match entry {
        Value::Object(map) if is_group(&map) => Value::Object(
            map.into_iter()
                .map(|(key, children)| {
                    let child_prefix = format!("{}-{}", prefix, key);
                    let children = normalize_with(children, &child_prefix, seen);
                    (key, children)
                })
                .collect(),
        ),
        Value::Object(mut map) => {
            let chart_id = issue_identifier(candidate(&map, prefix, index), seen);
            map.insert(CHART_ID_KEY.to_string(), Value::String(chart_id));
            Value::Object(map)
        }
        other => other,
    }
}

fn is_group(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.values().all(Value::is_array)
}

fn candidate(map: &Map<String, Value>, prefix: &str, index: usize) -> String {
    let fallback = || clean_identifier(&format!("{}-{}", prefix, index));
    match map.get(ID_SOURCE_KEY).and_then(Value::as_str) {
        Some(title) if !title.trim().is_empty() => {
            let cleaned = clean_identifier(title);
            if cleaned.is_empty() {
                fallback()
            } else {
                cleaned
            }
        }
        _ => fallback(),
    }
}

fn issue_identifier(candidate: String, seen: &mut HashSet<String>) -> String {
    let mut resolved = candidate.clone();
    let mut suffix = 1usize;
    while seen.contains(&resolved) {
        resolved = format!("{}-{}", candidate, suffix);
        suffix += 1;
    }
    seen.insert(resolved.clone());
    resolved
}

/// Typed view of a normalized catalog.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
#[serde(untagged)]
pub enum CatalogNode {
    Group {
        key: String,
        children: Vec<CatalogNode>,
    },
    Leaf(NormalizedChartDefinition),
}

impl CatalogNode {
    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a NormalizedChartDefinition>) {
        match self {
            CatalogNode::Group { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            CatalogNode::Leaf(leaf) => out.push(leaf),
        }
    }
}

/// The chart catalog as a tree of named groups and normalized leaves.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Catalog {
    pub roots: Vec<CatalogNode>,
}

impl Catalog {
    /// Parse and normalize a catalog document.
    ///
    /// Accepts either a top-level sequence, or an object of named sections
    /// (each becomes a root group).
    pub fn load(json: &str) -> Result<Catalog> {
        let value: Value = serde_json::from_str(json)?;
        Catalog::from_raw(value)
    }

    /// Normalize an already-parsed catalog document.
    pub fn from_raw(value: Value) -> Result<Catalog> {
        match value {
            Value::Array(_) => {
                let normalized = normalize(value, DEFAULT_FALLBACK_PREFIX);
                Ok(Catalog {
                    roots: nodes_from_value(&normalized)?,
                })
            }
            Value::Object(sections) => {
                let roots = normalize_sections(sections)
                    .iter()
                    .map(|(key, children)| {
                        Ok(CatalogNode::Group {
                            key: key.clone(),
                            children: nodes_from_value(children)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Catalog { roots })
            }
            _ => Err(GeostatError::InvalidPayload(
                "catalog must be an array or an object of sections".to_string(),
            )),
        }
    }

    /// The embedded site catalog, normalized once per process.
    pub fn builtin() -> &'static Catalog {
        static BUILTIN: OnceLock<Catalog> = OnceLock::new();
        BUILTIN.get_or_init(|| match Catalog::load(CATALOG_JSON) {
            Ok(catalog) => catalog,
            Err(e) => panic!("failed to parse embedded chart catalog: {}", e),
        })
    }

    /// Every leaf, depth first in catalog order.
    pub fn leaves(&self) -> Vec<&NormalizedChartDefinition> {
        let mut out = Vec::new();
        for root in &self.roots {
            root.collect_leaves(&mut out);
        }
        out
    }

    pub fn find(&self, chart_id: &str) -> Option<&NormalizedChartDefinition> {
        self.leaves().into_iter().find(|leaf| leaf.chart_id == chart_id)
    }

    /// Children of the group reached by following `path` through group keys,
    /// e.g. `["nature", "forestandfieldfires"]`.
    pub fn group(&self, path: &[&str]) -> Option<&[CatalogNode]> {
        let mut level: &[CatalogNode] = &self.roots;
        for segment in path {
            level = level.iter().find_map(|node| match node {
                CatalogNode::Group { key, children } if key == segment => {
                    Some(children.as_slice())
                }
                _ => None,
            })?;
        }
        Some(level)
    }

    /// Like [`Catalog::group`], but reports the missing path as an error.
    pub fn require_group(&self, path: &[&str]) -> Result<&[CatalogNode]> {
        self.group(path)
            .ok_or_else(|| GeostatError::CatalogNotFound(path.join("/")))
    }

    /// Leaves directly under a group (nested groups are not descended).
    pub fn charts_in(&self, path: &[&str]) -> Result<Vec<&NormalizedChartDefinition>> {
        Ok(self
            .require_group(path)?
            .iter()
            .filter_map(|node| match node {
                CatalogNode::Leaf(leaf) => Some(leaf),
                CatalogNode::Group { .. } => None,
            })
            .collect())
    }
}

fn nodes_from_value(value: &Value) -> Result<Vec<CatalogNode>> {
    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(GeostatError::InvalidPayload(format!(
                "catalog group is not a sequence: {}",
                other
            )))
        }
    };
    let mut nodes = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Value::Object(map) if is_group(map) => {
                for (key, children) in map {
                    nodes.push(CatalogNode::Group {
                        key: key.clone(),
                        children: nodes_from_value(children)?,
                    });
                }
            }
            Value::Object(_) => {
                let leaf: NormalizedChartDefinition = serde_json::from_value(entry.clone())?;
                nodes.push(CatalogNode::Leaf(leaf));
            }
            other => warn!("Ignoring catalog entry that is not an object: {}", other),
        }
    }
    Ok(nodes)
}
