//! Retained scene: what gets painted this frame, independent of the backend.

use super::interaction::{EdgeEmphasis, InteractionState};
use super::normalize::NormalizedGraph;
use super::policy::RenderPolicy;
use super::search::SearchMatches;
use super::simulation::ForceSimulation;
use super::types::Network;
use super::viewport::ViewTransform;

pub const BACKGROUND: &str = "#030712";
pub const EMPTY_MESSAGE: &str = "No contracts to display";

const EDGE_COLOR: &str = "#4b5563";
const EDGE_CONNECTED_COLOR: &str = "#60a5fa";
const NODE_STROKE: &str = "#1f2937";
const CRITICAL_STROKE: &str = "#f59e0b";
pub const SEARCH_RING: &str = "#facc15";
pub const SELECTION_RING: &str = "#f9fafb";
pub const PIN_COLOR: &str = "#f43f5e";
pub const LABEL_COLOR: &str = "#d1d5db";
pub const ARROW_SIZE: f64 = 6.0;

fn network_color(network: Network) -> &'static str {
	match network {
		Network::Mainnet => "#22c55e",
		Network::Testnet => "#3b82f6",
		Network::Futurenet => "#a855f7",
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
	pub id: String,
	pub x: f64,
	pub y: f64,
	pub radius: f64,
	pub fill: &'static str,
	pub stroke: &'static str,
	pub stroke_width: f64,
	pub opacity: f64,
	pub search_match: bool,
	pub selected: bool,
	pub pinned: bool,
	pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneEdge {
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
	pub color: &'static str,
	pub width: f64,
	pub opacity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
	pub width: f64,
	pub height: f64,
	pub transform: ViewTransform,
	pub edges: Vec<SceneEdge>,
	pub nodes: Vec<SceneNode>,
	pub show_arrows: bool,
}

impl Scene {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

pub struct SceneInputs<'a> {
	pub graph: &'a NormalizedGraph,
	pub sim: &'a ForceSimulation,
	pub interaction: &'a InteractionState,
	pub search: &'a SearchMatches,
	pub policy: &'a RenderPolicy,
	pub transform: ViewTransform,
	pub width: f64,
	pub height: f64,
}

pub fn build_scene(inputs: &SceneInputs<'_>) -> Scene {
	let SceneInputs {
		graph,
		sim,
		interaction,
		search,
		policy,
		..
	} = *inputs;
	let sim_nodes = sim.nodes();

	let edges = graph
		.edges
		.iter()
		.filter_map(|edge| {
			let (s, t) = (sim_nodes.get(edge.source)?, sim_nodes.get(edge.target)?);
			let (dx, dy) = (t.x - s.x, t.y - s.y);
			let dist = (dx * dx + dy * dy).sqrt();
			if dist < 0.001 {
				return None;
			}
			let (ux, uy) = (dx / dist, dy / dist);
			let (color, width, opacity) = match interaction.edge_emphasis(edge.source, edge.target) {
				EdgeEmphasis::Normal => (EDGE_COLOR, 1.0, 0.6),
				EdgeEmphasis::Connected => (EDGE_CONNECTED_COLOR, 2.0, 1.0),
				EdgeEmphasis::Dimmed => (EDGE_COLOR, 1.0, 0.08),
			};
			Some(SceneEdge {
				x1: s.x + ux * s.radius,
				y1: s.y + uy * s.radius,
				x2: t.x - ux * t.radius,
				y2: t.y - uy * t.radius,
				color,
				width,
				opacity,
			})
		})
		.collect();

	let nodes = graph
		.nodes
		.iter()
		.zip(sim_nodes)
		.enumerate()
		.map(|(idx, (node, sim_node))| {
			let critical = graph.is_critical(idx);
			SceneNode {
				id: node.id.clone(),
				x: sim_node.x,
				y: sim_node.y,
				radius: sim_node.radius,
				fill: network_color(node.network),
				stroke: if critical { CRITICAL_STROKE } else { NODE_STROKE },
				stroke_width: if critical { 2.5 } else { 1.5 },
				opacity: interaction.node_opacity(idx),
				search_match: search.is_match(idx),
				selected: interaction.selected() == Some(idx),
				pinned: interaction.is_pinned(&node.id),
				label: policy.show_labels.then(|| node.name.clone()),
			}
		})
		.collect();

	Scene {
		width: inputs.width,
		height: inputs.height,
		transform: inputs.transform,
		edges,
		nodes,
		show_arrows: policy.show_arrows,
	}
}

/// Hover card content for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	pub x: f64,
	pub y: f64,
	pub name: String,
	pub address: String,
	pub network: Network,
	pub category: Option<String>,
	pub verified: bool,
	pub dependents: usize,
}

/// Shorten long contract addresses to `first6…last4`.
pub fn truncate_address(address: &str) -> String {
	let chars: Vec<char> = address.chars().collect();
	if chars.len() <= 12 {
		return address.to_string();
	}
	let head: String = chars[..6].iter().collect();
	let tail: String = chars[chars.len() - 4..].iter().collect();
	format!("{head}…{tail}")
}

pub fn tooltip_for(graph: &NormalizedGraph, idx: usize, pointer: (f64, f64)) -> Option<Tooltip> {
	let node = graph.nodes.get(idx)?;
	Some(Tooltip {
		x: pointer.0,
		y: pointer.1,
		name: node.name.clone(),
		address: truncate_address(&node.contract_address),
		network: node.network,
		category: node.category.clone(),
		verified: node.is_verified,
		dependents: graph.dependents(idx),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn truncates_long_addresses() {
		assert_eq!(truncate_address("CSHORT"), "CSHORT");
		assert_eq!(
			truncate_address("CAS3J7GYLGXMF6TDJBBYYSE3HQ6BBSMLNUQ34T6TZMYMW2EVH34XOWMA"),
			"CAS3J7…OWMA"
		);
		assert_eq!(truncate_address("ÄÖÜäöüßÄÖÜäöü"), "ÄÖÜäöü…Üäöü");
	}
}
