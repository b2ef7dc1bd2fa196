//! Node/link graphs for flow (Sankey) diagrams.
//!
//! A single period's observation row is read as a two-level taxonomy: a
//! synthetic root feeds top-level categories, which feed second-level
//! categories. Edge weights come from the row; only strictly positive weights
//! produce edges.

use geostat_core::{Language, ObservationRow, ValueLabel};
use log::warn;
use serde::Serialize;
use std::collections::HashMap;

/// A category name in both languages.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct LocalizedLabel {
    pub id: usize,
    pub name_ge: String,
    pub name_en: String,
}

impl LocalizedLabel {
    pub fn new(id: usize, name_ge: &str, name_en: &str) -> Self {
        LocalizedLabel {
            id,
            name_ge: name_ge.to_string(),
            name_en: name_en.to_string(),
        }
    }

    /// Pair Georgian and English label lists by position. English names
    /// missing from a shorter list fall back to the Georgian text.
    pub fn zip(georgian: &[ValueLabel], english: &[ValueLabel]) -> Vec<LocalizedLabel> {
        georgian
            .iter()
            .map(|ge| {
                let en = english
                    .get(ge.id)
                    .map(|en| en.name.as_str())
                    .unwrap_or(ge.name.as_str());
                LocalizedLabel::new(ge.id, &ge.name, en)
            })
            .collect()
    }

    pub fn name(&self, language: Language) -> &str {
        match language {
            Language::Georgian => &self.name_ge,
            Language::English => &self.name_en,
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.name_en == name || self.name_ge == name
    }

    fn stable_name(&self) -> &str {
        if self.name_en.is_empty() {
            &self.name_ge
        } else {
            &self.name_en
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct FlowNode {
    pub index: usize,
    pub name_ge: String,
    pub name_en: String,
    /// Larger of the node's outgoing and incoming weight sums.
    pub value: f64,
}

impl FlowNode {
    pub fn name(&self, language: Language) -> &str {
        match language {
            Language::Georgian => &self.name_ge,
            Language::English => &self.name_en,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct FlowEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

#[derive(Debug, Default, PartialEq, Clone, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node_named(&self, name_en: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.name_en == name_en)
    }

    pub fn edges_from(&self, source: usize) -> impl Iterator<Item = &FlowEdge> {
        self.edges.iter().filter(move |e| e.source == source)
    }

    fn finish(mut self) -> Self {
        let mut outgoing = vec![0.0; self.nodes.len()];
        let mut incoming = vec![0.0; self.nodes.len()];
        for edge in &self.edges {
            outgoing[edge.source] += edge.weight;
            incoming[edge.target] += edge.weight;
        }
        for node in &mut self.nodes {
            node.value = outgoing[node.index].max(incoming[node.index]);
        }
        self
    }
}

impl geostat_core::fetch_state::EmptyResult for FlowGraph {
    fn is_empty_result(&self) -> bool {
        self.edges.is_empty()
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
enum Tier {
    Root,
    Top,
    Central,
    Leaf,
}

/// Assigns node indices in first-seen order. Nodes are keyed by tier and
/// stable name, so repeated references resolve to the same index and equal
/// names on different tiers never merge.
#[derive(Debug, Default)]
struct NodeRegistry {
    index: HashMap<(Tier, String), usize>,
    nodes: Vec<FlowNode>,
}

impl NodeRegistry {
    fn intern(&mut self, tier: Tier, label: &LocalizedLabel) -> usize {
        let key = (tier, label.stable_name().to_string());
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(FlowNode {
            index: i,
            name_ge: label.name_ge.clone(),
            name_en: label.name_en.clone(),
            value: 0.0,
        });
        self.index.insert(key, i);
        i
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

/// Build a root → top → second flow from one period's row.
///
/// `key_fn(second_id, top_id)` names the row field holding the value of that
/// pair. A root → top edge carries the sum of the top category's positive
/// values and is only emitted when that sum is positive.
pub fn build_flow<F>(
    row: &ObservationRow,
    root: &LocalizedLabel,
    top: &[LocalizedLabel],
    second: &[LocalizedLabel],
    key_fn: F,
) -> FlowGraph
where
    F: Fn(usize, usize) -> String,
{
    let mut registry = NodeRegistry::default();
    let root_index = registry.intern(Tier::Root, root);
    let top_indices: Vec<usize> = top.iter().map(|t| registry.intern(Tier::Top, t)).collect();
    let second_indices: Vec<usize> = second
        .iter()
        .map(|s| registry.intern(Tier::Leaf, s))
        .collect();

    let mut root_edges = Vec::new();
    let mut child_edges = Vec::new();
    for (t, &top_index) in top.iter().zip(&top_indices) {
        let mut total = 0.0;
        for (s, &second_index) in second.iter().zip(&second_indices) {
            if let Some(weight) = positive(row.number(&key_fn(s.id, t.id))) {
                total += weight;
                child_edges.push(FlowEdge {
                    source: top_index,
                    target: second_index,
                    weight,
                });
            }
        }
        if total > 0.0 {
            root_edges.push(FlowEdge {
                source: root_index,
                target: top_index,
                weight: total,
            });
        }
    }
    root_edges.extend(child_edges);

    FlowGraph {
        nodes: registry.nodes,
        edges: root_edges,
    }
    .finish()
}

/// Build a root → top → central → leaf flow.
///
/// `central` names the top-level category that aggregates the others (e.g. a
/// national authority) and distributes to the leaves. Every other top
/// category flows root → top → central with its positive sum over leaves; the
/// central category then flows to each leaf with its own positive values.
/// Returns an empty graph if `central` is not among `top`.
pub fn build_tiered_flow<F>(
    row: &ObservationRow,
    root: &LocalizedLabel,
    top: &[LocalizedLabel],
    central: &str,
    leaves: &[LocalizedLabel],
    key_fn: F,
) -> FlowGraph
where
    F: Fn(usize, usize) -> String,
{
    let Some(central_label) = top.iter().find(|t| t.matches(central)) else {
        warn!("Central category {:?} not found among top-level categories", central);
        return FlowGraph::default();
    };

    let mut registry = NodeRegistry::default();
    let root_index = registry.intern(Tier::Root, root);
    let mut feeders = Vec::new();
    let mut central_index = None;
    for t in top {
        if t.id == central_label.id {
            central_index = Some(registry.intern(Tier::Central, t));
        } else {
            feeders.push((t, registry.intern(Tier::Top, t)));
        }
    }
    let central_index = match central_index {
        Some(i) => i,
        None => registry.intern(Tier::Central, central_label),
    };
    let leaf_indices: Vec<usize> = leaves
        .iter()
        .map(|l| registry.intern(Tier::Leaf, l))
        .collect();

    let mut edges = Vec::new();
    let mut feeder_edges = Vec::new();
    for (t, top_index) in feeders {
        let total: f64 = leaves
            .iter()
            .filter_map(|l| positive(row.number(&key_fn(l.id, t.id))))
            .sum();
        if total > 0.0 {
            edges.push(FlowEdge {
                source: root_index,
                target: top_index,
                weight: total,
            });
            feeder_edges.push(FlowEdge {
                source: top_index,
                target: central_index,
                weight: total,
            });
        }
    }
    edges.extend(feeder_edges);
    for (l, &leaf_index) in leaves.iter().zip(&leaf_indices) {
        if let Some(weight) = positive(row.number(&key_fn(l.id, central_label.id))) {
            edges.push(FlowEdge {
                source: central_index,
                target: leaf_index,
                weight,
            });
        }
    }

    FlowGraph {
        nodes: registry.nodes,
        edges,
    }
    .finish()
}

/// `"{second}_{top}"`, the key layout used by two-dimensional datasets.
pub fn pair_key(second_id: usize, top_id: usize) -> String {
    format!("{}_{}", second_id, top_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> LocalizedLabel {
        LocalizedLabel::new(0, "სულ", "Total")
    }

    fn forest_types() -> Vec<LocalizedLabel> {
        vec![
            LocalizedLabel::new(0, "წიწვოვანი", "Coniferous"),
            LocalizedLabel::new(1, "ფოთლოვანი", "Deciduous"),
        ]
    }

    fn purposes() -> Vec<LocalizedLabel> {
        vec![
            LocalizedLabel::new(0, "საშეშე", "Firewood"),
            LocalizedLabel::new(1, "სამასალე", "Timber"),
        ]
    }

    #[test]
    fn test_only_positive_top_categories_get_root_edges() {
        let row = ObservationRow::new(2020)
            .with("0_0", 0)
            .with("1_0", 0)
            .with("0_1", 4)
            .with("1_1", 6);
        let graph = build_flow(&row, &root(), &forest_types(), &purposes(), pair_key);
        let root_edges: Vec<&FlowEdge> = graph.edges_from(0).collect();
        assert_eq!(root_edges.len(), 1);
        assert_eq!(root_edges[0].target, 2);
        assert_eq!(root_edges[0].weight, 10.0);
        assert_eq!(graph.edges.len(), 3);
    }

    #[test]
    fn test_nodes_registered_in_first_seen_order() {
        let row = ObservationRow::new(2020);
        let graph = build_flow(&row, &root(), &forest_types(), &purposes(), pair_key);
        let names: Vec<&str> = graph.nodes.iter().map(|n| n.name_en.as_str()).collect();
        assert_eq!(names, vec!["Total", "Coniferous", "Deciduous", "Firewood", "Timber"]);
        assert!(graph.edges.is_empty());
        assert!(graph.nodes.iter().enumerate().all(|(i, n)| n.index == i));
    }

    #[test]
    fn test_repeated_names_share_a_node() {
        let row = ObservationRow::new(2020).with("0_0", 3).with("1_0", 2);
        let seconds = vec![
            LocalizedLabel::new(0, "სხვა", "Other"),
            LocalizedLabel::new(1, "სხვა", "Other"),
        ];
        let graph = build_flow(&row, &root(), &forest_types()[..1], &seconds, pair_key);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.node_named("Other").unwrap().value, 5.0);
    }

    #[test]
    fn test_negative_and_missing_values_emit_no_edges() {
        let row = ObservationRow::new(2020)
            .with("0_0", -3)
            .with("1_0", "..")
            .with("0_1", 2);
        let graph = build_flow(&row, &root(), &forest_types(), &purposes(), pair_key);
        assert!(graph.edges.iter().all(|e| e.weight > 0.0));
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn test_node_value_is_max_of_in_and_out() {
        let row = ObservationRow::new(2020).with("0_0", 4).with("1_0", 1);
        let graph = build_flow(&row, &root(), &forest_types(), &purposes(), pair_key);
        assert_eq!(graph.nodes[0].value, 5.0);
        assert_eq!(graph.node_named("Coniferous").unwrap().value, 5.0);
        assert_eq!(graph.node_named("Firewood").unwrap().value, 4.0);
        assert_eq!(graph.node_named("Deciduous").unwrap().value, 0.0);
    }

    fn authorities() -> Vec<LocalizedLabel> {
        vec![
            LocalizedLabel::new(0, "ეროვნული სააგენტო", "National Agency"),
            LocalizedLabel::new(1, "აჭარა", "Adjara"),
            LocalizedLabel::new(2, "აფხაზეთი", "Abkhazia"),
        ]
    }

    fn categories() -> Vec<LocalizedLabel> {
        vec![
            LocalizedLabel::new(0, "ნაკრძალი", "Strict Nature Reserve"),
            LocalizedLabel::new(1, "ეროვნული პარკი", "National Park"),
        ]
    }

    #[test]
    fn test_tiered_flow_routes_through_central_node() {
        let row = ObservationRow::new(2021)
            .with("0_0", 100)
            .with("1_0", 50)
            .with("0_1", 10)
            .with("1_1", 5)
            .with("0_2", 0);
        let graph = build_tiered_flow(
            &row,
            &root(),
            &authorities(),
            "National Agency",
            &categories(),
            pair_key,
        );
        let central = graph.node_named("National Agency").unwrap().index;
        let adjara = graph.node_named("Adjara").unwrap().index;
        let abkhazia = graph.node_named("Abkhazia").unwrap().index;

        let from_root: Vec<&FlowEdge> = graph.edges_from(0).collect();
        assert_eq!(from_root.len(), 1);
        assert_eq!(from_root[0].target, adjara);
        assert_eq!(from_root[0].weight, 15.0);
        assert_eq!(graph.edges_from(abkhazia).count(), 0);

        let to_central: Vec<&FlowEdge> = graph.edges_from(adjara).collect();
        assert_eq!(to_central.len(), 1);
        assert_eq!(to_central[0].target, central);

        let from_central: Vec<f64> = graph.edges_from(central).map(|e| e.weight).collect();
        assert_eq!(from_central, vec![100.0, 50.0]);
        assert_eq!(graph.nodes[central].value, 150.0);
    }

    #[test]
    fn test_tiered_flow_is_acyclic() {
        let row = ObservationRow::new(2021).with("0_0", 1).with("0_1", 1);
        let graph = build_tiered_flow(
            &row,
            &root(),
            &authorities(),
            "ეროვნული სააგენტო",
            &categories(),
            pair_key,
        );
        assert_eq!(graph.edges.len(), 3);
        assert!(is_acyclic(&graph));
    }

    /// Kahn's algorithm: every node can be removed in topological order.
    fn is_acyclic(graph: &FlowGraph) -> bool {
        let mut in_degree = vec![0usize; graph.nodes.len()];
        for edge in &graph.edges {
            in_degree[edge.target] += 1;
        }
        let mut ready: Vec<usize> = (0..graph.nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut removed = 0;
        while let Some(node) = ready.pop() {
            removed += 1;
            for edge in graph.edges_from(node) {
                in_degree[edge.target] -= 1;
                if in_degree[edge.target] == 0 {
                    ready.push(edge.target);
                }
            }
        }
        removed == graph.nodes.len()
    }

    #[test]
    fn test_unknown_central_gives_empty_graph() {
        let row = ObservationRow::new(2021).with("0_0", 1);
        let graph = build_tiered_flow(&row, &root(), &authorities(), "Ministry", &categories(), pair_key);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_zip_localized_labels() {
        let ge = ValueLabel::from_texts(&["წყალი", "ტყე"]);
        let en = ValueLabel::from_texts(&["Water"]);
        let zipped = LocalizedLabel::zip(&ge, &en);
        assert_eq!(zipped[0].name(Language::English), "Water");
        assert_eq!(zipped[1].name(Language::English), "ტყე");
        assert_eq!(zipped[1].name(Language::Georgian), "ტყე");
    }
}
