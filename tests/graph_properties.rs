#![cfg(not(target_arch = "wasm32"))]

use dependency_graph_canvas::dependency_graph::interaction::InteractionState;
use dependency_graph_canvas::dependency_graph::normalize::{
	MAX_RADIUS, MIN_RADIUS, node_radius, normalize,
};
use dependency_graph_canvas::dependency_graph::policy::{ForceParams, RenderPolicy, SizeTier};
use dependency_graph_canvas::dependency_graph::search::SearchMatches;
use dependency_graph_canvas::dependency_graph::simulation::ForceSimulation;
use dependency_graph_canvas::dependency_graph::viewport::{
	MAX_SCALE, MIN_SCALE, PanDirection, ViewConfig, Viewport,
};
use dependency_graph_canvas::dependency_graph::{GraphData, GraphEdge, GraphNode, Network};
use proptest::prelude::*;

fn node(i: usize) -> GraphNode {
	GraphNode {
		id: format!("n{i}"),
		contract_address: format!("CADDR{i:04}"),
		name: format!("Node {i}"),
		network: Network::Testnet,
		is_verified: true,
		category: None,
		tags: Vec::new(),
	}
}

fn graph(n: usize, edges: &[(usize, usize)]) -> GraphData {
	GraphData {
		nodes: (0..n).map(node).collect(),
		edges: edges
			.iter()
			.map(|&(s, t)| GraphEdge {
				source: format!("n{s}"),
				target: format!("n{t}"),
				dependency_kind: "calls".into(),
			})
			.collect(),
	}
}

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
	(0usize..40).prop_flat_map(|n| {
		let edges = prop::collection::vec((0usize..n + 10, 0usize..n + 10), 0..80);
		(Just(n), edges)
	})
}

proptest! {
	#[test]
	fn retained_edges_have_both_endpoints((n, edges) in graph_strategy()) {
		let g = normalize(&graph(n, &edges), None);
		let expected = edges.iter().filter(|(s, t)| *s < n && *t < n).count();
		prop_assert_eq!(g.edges.len(), expected);
		for edge in &g.edges {
			prop_assert!(edge.source < g.len());
			prop_assert!(edge.target < g.len());
		}
	}

	#[test]
	fn degree_sums_match_edge_count((n, edges) in graph_strategy()) {
		let g = normalize(&graph(n, &edges), None);
		let dependents: usize = (0..g.len()).map(|i| g.dependents(i)).sum();
		let dependencies: usize = (0..g.len()).map(|i| g.dependencies(i)).sum();
		prop_assert_eq!(dependents, g.edges.len());
		prop_assert_eq!(dependencies, g.edges.len());
	}

	#[test]
	fn radius_is_monotonic_and_bounded(a in 0usize..10_000, b in 0usize..10_000) {
		let (lo, hi) = (a.min(b), a.max(b));
		prop_assert!(node_radius(lo) <= node_radius(hi));
		prop_assert!((MIN_RADIUS..=MAX_RADIUS).contains(&node_radius(a)));
	}

	#[test]
	fn pin_twice_restores_unfixed(n in 1usize..30, pick in 0usize..30) {
		let g = normalize(&graph(n, &[]), None);
		let mut sim = ForceSimulation::new(&g, ForceParams::default());
		let mut state = InteractionState::default();
		let idx = pick % n;
		let id = g.nodes[idx].id.clone();
		prop_assert!(state.toggle_pin(idx, &id, &mut sim));
		prop_assert!(sim.is_fixed(idx));
		prop_assert!(!state.toggle_pin(idx, &id, &mut sim));
		prop_assert!(!sim.is_fixed(idx));
		prop_assert!(state.pins().is_empty());
	}

	#[test]
	fn search_cursor_wraps(n in 1usize..50) {
		let nodes: Vec<GraphNode> = (0..n).map(node).collect();
		let mut search = SearchMatches::default();
		search.set_query("node", &nodes);
		prop_assert_eq!(search.len(), n);
		for _ in 0..n {
			search.next();
		}
		prop_assert_eq!(search.cursor(), 0);
		search.prev();
		prop_assert_eq!(search.cursor(), n - 1);
	}

	#[test]
	fn scale_stays_clamped(ops in prop::collection::vec(0u8..6, 0..120)) {
		let mut vp = Viewport::new(800.0, 600.0, ViewConfig::default());
		for op in ops {
			match op {
				0 => vp.zoom_in(),
				1 => vp.zoom_out(),
				2 => vp.wheel(-1.0, 100.0, 100.0),
				3 => vp.wheel(1.0, 700.0, 500.0),
				4 => vp.pan(PanDirection::Left),
				_ => vp.advance(0.1),
			}
			let k = vp.transform().k;
			prop_assert!((MIN_SCALE..=MAX_SCALE).contains(&k));
			prop_assert!((MIN_SCALE..=MAX_SCALE).contains(&vp.target().k));
		}
	}
}

#[test]
fn tier_boundaries() {
	assert_eq!(SizeTier::for_node_count(200), SizeTier::Small);
	assert_eq!(SizeTier::for_node_count(201), SizeTier::Large);
	assert_eq!(SizeTier::for_node_count(500), SizeTier::Large);
	assert_eq!(SizeTier::for_node_count(501), SizeTier::VeryLarge);

	let large = RenderPolicy::for_node_count(201);
	assert!(!large.show_labels && large.show_arrows);
	let very_large = RenderPolicy::for_node_count(501);
	assert!(!very_large.show_labels && !very_large.show_arrows);
	assert_eq!(very_large.force.alpha_decay, 0.06);
}
