use std::collections::HashMap;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Identifier of a contract node, as issued by the registry.
pub type NodeId = String;

/// Network a contract is deployed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
	/// Public main network.
	Mainnet,
	/// Public test network.
	Testnet,
	/// Preview network for upcoming protocol features.
	Futurenet,
}

impl fmt::Display for Network {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Network::Mainnet => write!(f, "mainnet"),
			Network::Testnet => write!(f, "testnet"),
			Network::Futurenet => write!(f, "futurenet"),
		}
	}
}

/// Minimal contract info needed to draw a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	/// Unique node id; edges refer to it.
	pub id: NodeId,
	/// On-chain contract address.
	#[serde(rename = "contract_id")]
	pub contract_address: String,
	/// Display name.
	pub name: String,
	/// Network the contract is deployed on.
	pub network: Network,
	/// Whether the source is verified.
	pub is_verified: bool,
	/// Free-form category, e.g. `token`.
	#[serde(default)]
	pub category: Option<String>,
	/// Free-form tags.
	#[serde(default)]
	pub tags: Vec<String>,
}

/// A dependency relationship: `source` depends on `target`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
	/// The dependent contract.
	pub source: NodeId,
	/// The contract it depends on.
	pub target: NodeId,
	/// Kind of dependency, e.g. `calls`.
	#[serde(rename = "dependency_type")]
	pub dependency_kind: String,
}

/// Flat node/edge list as returned by the registry graph endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	/// Contracts.
	pub nodes: Vec<GraphNode>,
	/// Dependencies between contracts.
	pub edges: Vec<GraphEdge>,
}

impl GraphData {
	/// Parse a registry graph response.
	pub fn from_json(json: &str) -> serde_json::Result<Self> {
		serde_json::from_str(json)
	}

	/// Identity of the graph: node ids in order plus every edge triple.
	///
	/// Two payloads with the same fingerprint are treated as the same graph
	/// instance, so pins and layout survive a re-render.
	pub fn fingerprint(&self) -> u64 {
		let mut hasher = DefaultHasher::new();
		self.nodes.len().hash(&mut hasher);
		for node in &self.nodes {
			node.id.hash(&mut hasher);
		}
		self.edges.hash(&mut hasher);
		hasher.finish()
	}

	/// Whether there are no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

/// Per-render options supplied by the host alongside the graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphOptions {
	/// Case-insensitive name or address substring. Blank matches nothing.
	pub search_query: String,
	/// Precomputed dependent counts that take precedence over in-degree.
	pub dependent_counts: Option<HashMap<NodeId, usize>>,
	/// Node the host wants selected.
	pub selected_node: Option<NodeId>,
}
