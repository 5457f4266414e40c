//! Raw payload to indexed graph: ids, retained edges, degree counts.

use std::collections::HashMap;

use log::debug;

use super::types::{GraphData, GraphNode, NodeId};

/// Smallest node radius, graph units.
pub const MIN_RADIUS: f64 = 6.0;
/// Largest node radius, graph units.
pub const MAX_RADIUS: f64 = 22.0;
/// Nodes with at least this many dependents are drawn as critical.
pub const CRITICAL_DEPENDENTS: usize = 5;

/// Edge with both endpoints resolved to node indices.
#[derive(Clone, Debug, PartialEq)]
pub struct SimEdge {
	/// Index of the dependent node.
	pub source: usize,
	/// Index of the node depended upon.
	pub target: usize,
	/// Dependency kind from the payload.
	pub kind: String,
}

/// In-degree ("dependents") and out-degree ("dependencies") per node id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DerivedCounts {
	/// Incoming edges per node, after host overrides.
	pub dependents: HashMap<NodeId, usize>,
	/// Outgoing edges per node.
	pub dependencies: HashMap<NodeId, usize>,
}

impl DerivedCounts {
	fn from_edges(nodes: &[GraphNode], edges: &[SimEdge]) -> Self {
		let mut counts = Self::default();
		for edge in edges {
			*counts
				.dependencies
				.entry(nodes[edge.source].id.clone())
				.or_default() += 1;
			*counts
				.dependents
				.entry(nodes[edge.target].id.clone())
				.or_default() += 1;
		}
		counts
	}
}

/// Input graph with dangling edges removed and lookups prepared.
#[derive(Clone, Debug, Default)]
pub struct NormalizedGraph {
	/// Nodes with duplicate ids removed, in input order.
	pub nodes: Vec<GraphNode>,
	/// Edges whose endpoints both exist.
	pub edges: Vec<SimEdge>,
	/// Node id to position in `nodes`.
	pub index: HashMap<NodeId, usize>,
	/// Per-id degree counts.
	pub counts: DerivedCounts,
	/// Undirected 1-hop neighbors per node index.
	pub adjacency: Vec<Vec<usize>>,
	display_dependents: Vec<usize>,
}

/// Node radius from its dependent count, clamped to `[6, 22]`.
pub fn node_radius(dependents: usize) -> f64 {
	(8.0 + dependents as f64 * 1.5).clamp(MIN_RADIUS, MAX_RADIUS)
}

/// Build the derived graph: dedupe ids, drop dangling edges, count degrees
/// and apply host dependent-count overrides.
pub fn normalize(
	data: &GraphData,
	dependent_override: Option<&HashMap<NodeId, usize>>,
) -> NormalizedGraph {
	let mut index = HashMap::with_capacity(data.nodes.len());
	let mut nodes = Vec::with_capacity(data.nodes.len());
	for node in &data.nodes {
		if index.contains_key(&node.id) {
			debug!("duplicate node id {}, keeping first occurrence", node.id);
			continue;
		}
		index.insert(node.id.clone(), nodes.len());
		nodes.push(node.clone());
	}

	let mut edges = Vec::with_capacity(data.edges.len());
	let mut dropped = 0usize;
	for edge in &data.edges {
		if let (Some(&source), Some(&target)) = (index.get(&edge.source), index.get(&edge.target))
		{
			edges.push(SimEdge {
				source,
				target,
				kind: edge.dependency_kind.clone(),
			});
		} else {
			dropped += 1;
		}
	}
	if dropped > 0 {
		debug!("dropped {dropped} edges with missing endpoints");
	}

	let counts = DerivedCounts::from_edges(&nodes, &edges);

	let mut adjacency = vec![Vec::new(); nodes.len()];
	for edge in &edges {
		if edge.source == edge.target {
			continue;
		}
		adjacency[edge.source].push(edge.target);
		adjacency[edge.target].push(edge.source);
	}

	let mut graph = NormalizedGraph {
		nodes,
		edges,
		index,
		counts,
		adjacency,
		display_dependents: Vec::new(),
	};
	graph.apply_dependent_override(dependent_override);
	graph
}

impl NormalizedGraph {
	/// Recompute the dependent counts used for sizing, preferring host-supplied values.
	pub fn apply_dependent_override(&mut self, overrides: Option<&HashMap<NodeId, usize>>) {
		self.display_dependents = self
			.nodes
			.iter()
			.map(|node| {
				overrides
					.and_then(|o| o.get(&node.id).copied())
					.or_else(|| self.counts.dependents.get(&node.id).copied())
					.unwrap_or(0)
			})
			.collect();
	}

	/// Number of retained nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Whether no nodes were retained.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Dependents shown for a node, override included.
	pub fn dependents(&self, idx: usize) -> usize {
		self.display_dependents.get(idx).copied().unwrap_or(0)
	}

	/// Outgoing edge count of a node.
	pub fn dependencies(&self, idx: usize) -> usize {
		self.nodes
			.get(idx)
			.and_then(|n| self.counts.dependencies.get(&n.id).copied())
			.unwrap_or(0)
	}

	/// Node radius from its displayed dependents.
	pub fn radius(&self, idx: usize) -> f64 {
		node_radius(self.dependents(idx))
	}

	/// Whether the node gets the critical stroke.
	pub fn is_critical(&self, idx: usize) -> bool {
		self.dependents(idx) >= CRITICAL_DEPENDENTS
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::dependency_graph::types::{GraphEdge, Network};

	fn node(id: &str) -> GraphNode {
		GraphNode {
			id: id.into(),
			contract_address: format!("C{}", id.to_uppercase()),
			name: id.into(),
			network: Network::Testnet,
			is_verified: false,
			category: None,
			tags: Vec::new(),
		}
	}

	fn edge(source: &str, target: &str) -> GraphEdge {
		GraphEdge {
			source: source.into(),
			target: target.into(),
			dependency_kind: "calls".into(),
		}
	}

	#[test]
	fn drops_dangling_edges() {
		let data = GraphData {
			nodes: vec![node("a")],
			edges: vec![edge("a", "missing")],
		};
		let graph = normalize(&data, None);
		assert_eq!(graph.len(), 1);
		assert!(graph.edges.is_empty());
		assert!(graph.counts.dependents.is_empty());
	}

	#[test]
	fn counts_degrees() {
		let data = GraphData {
			nodes: vec![node("a"), node("b"), node("c")],
			edges: vec![edge("a", "c"), edge("b", "c"), edge("c", "a")],
		};
		let graph = normalize(&data, None);
		assert_eq!(graph.counts.dependents["c"], 2);
		assert_eq!(graph.counts.dependents["a"], 1);
		assert_eq!(graph.counts.dependencies["a"], 1);
		assert_eq!(graph.dependencies(2), 1);
		assert_eq!(graph.adjacency[2].len(), 3);
	}

	#[test]
	fn radius_bounds() {
		assert_eq!(node_radius(0), 8.0);
		assert_eq!(node_radius(4), 14.0);
		assert_eq!(node_radius(100), MAX_RADIUS);
	}

	#[test]
	fn override_drives_size_and_criticality() {
		let data = GraphData {
			nodes: vec![node("a"), node("b")],
			edges: vec![edge("a", "b")],
		};
		let overrides = HashMap::from([("a".to_string(), 7usize)]);
		let graph = normalize(&data, Some(&overrides));
		assert!(graph.is_critical(0));
		assert_eq!(graph.radius(0), 18.5);
		// b falls back to its computed in-degree
		assert_eq!(graph.dependents(1), 1);
		assert!(!graph.is_critical(1));
	}

	#[test]
	fn duplicate_ids_keep_first() {
		let mut second = node("a");
		second.name = "shadow".into();
		let data = GraphData {
			nodes: vec![node("a"), second],
			edges: Vec::new(),
		};
		let graph = normalize(&data, None);
		assert_eq!(graph.len(), 1);
		assert_eq!(graph.nodes[0].name, "a");
	}
}
