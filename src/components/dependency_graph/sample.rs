//! Synthetic registry graphs for the demo page and stress tests.

use super::types::{GraphData, GraphEdge, GraphNode, Network};

const CATEGORIES: &[&str] = &["defi", "nft", "oracle", "dao", "bridge", "token"];
const DEPENDENCY_KINDS: &[&str] = &["calls", "imports", "proxies"];

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = (seed.wrapping_add(1).wrapping_mul(9301).wrapping_add(49297)) % 233280;
	(x as f64) / 233280.0
}

/// Generate `n` contracts where each depends on one or two earlier contracts.
///
/// Targets are drawn with probability skewed toward low indices, which produces
/// a handful of heavily depended-on hub contracts.
pub fn sample_graph(n: usize, seed: usize) -> GraphData {
	let nodes: Vec<GraphNode> = (0..n)
		.map(|i| GraphNode {
			id: format!("contract-{i}"),
			contract_address: format!("C{:055X}", (i as u64).wrapping_mul(2_654_435_761)),
			name: format!("Contract {i}"),
			network: match i % 3 {
				0 => Network::Mainnet,
				1 => Network::Testnet,
				_ => Network::Futurenet,
			},
			is_verified: i % 4 != 0,
			category: Some(CATEGORIES[i % CATEGORIES.len()].to_string()),
			tags: vec![format!("tier-{}", i % 5)],
		})
		.collect();

	let mut edges = Vec::with_capacity(n + n / 3);
	for i in 1..n {
		let extra = rand_simple(i.wrapping_mul(31).wrapping_add(seed)) < 0.3;
		for k in 0..(1 + usize::from(extra)) {
			let r = rand_simple(i.wrapping_mul(7919).wrapping_add(seed.wrapping_mul(104_729)) + k);
			let target = (r.powi(3) * i as f64) as usize;
			edges.push(GraphEdge {
				source: format!("contract-{i}"),
				target: format!("contract-{target}"),
				dependency_kind: DEPENDENCY_KINDS[(i + k) % DEPENDENCY_KINDS.len()].to_string(),
			});
		}
	}

	GraphData { nodes, edges }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn edges_point_backwards() {
		let data = sample_graph(100, 3);
		assert_eq!(data.nodes.len(), 100);
		assert!(data.edges.len() >= 99);
		for edge in &data.edges {
			let source: usize = edge.source["contract-".len()..].parse().unwrap();
			let target: usize = edge.target["contract-".len()..].parse().unwrap();
			assert!(target < source);
		}
	}

	#[test]
	fn produces_hubs() {
		let data = sample_graph(1000, 1);
		let into_first_ten = data
			.edges
			.iter()
			.filter(|e| {
				e.target["contract-".len()..]
					.parse::<usize>()
					.is_ok_and(|t| t < 10)
			})
			.count();
		// uniform targets would put roughly 1% of edges here
		assert!(into_first_ten * 10 > data.edges.len());
	}

	#[test]
	fn deterministic_per_seed() {
		assert_eq!(sample_graph(50, 9), sample_graph(50, 9));
	}
}
