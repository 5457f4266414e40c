//! Substring search over node names and addresses.

use super::types::GraphNode;

/// Nodes matching the current query and a cursor over them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchMatches {
	query: String,
	matches: Vec<usize>,
	cursor: usize,
}

fn node_matches(node: &GraphNode, needle: &str) -> bool {
	node.name.to_lowercase().contains(needle) || node.contract_address.to_lowercase().contains(needle)
}

impl SearchMatches {
	/// Apply a new query. Returns true when the match list or cursor changed.
	pub fn set_query(&mut self, query: &str, nodes: &[GraphNode]) -> bool {
		if query == self.query {
			return false;
		}
		self.query = query.to_string();
		self.cursor = 0;
		self.matches = Self::collect(&self.query, nodes);
		true
	}

	/// Recompute matches after node metadata changed, keeping the query.
	/// The cursor stays put unless it fell off the end.
	pub fn refresh(&mut self, nodes: &[GraphNode]) {
		self.matches = Self::collect(&self.query, nodes);
		if self.cursor >= self.matches.len() {
			self.cursor = 0;
		}
	}

	fn collect(query: &str, nodes: &[GraphNode]) -> Vec<usize> {
		let needle = query.trim().to_lowercase();
		if needle.is_empty() {
			return Vec::new();
		}
		nodes
			.iter()
			.enumerate()
			.filter(|(_, node)| node_matches(node, &needle))
			.map(|(idx, _)| idx)
			.collect()
	}

	/// Query the matches were computed for.
	pub fn query(&self) -> &str {
		&self.query
	}

	/// Matching node indices in node order.
	pub fn matches(&self) -> &[usize] {
		&self.matches
	}

	/// Position of the current match in `matches`.
	pub fn cursor(&self) -> usize {
		self.cursor
	}

	/// Number of matches.
	pub fn len(&self) -> usize {
		self.matches.len()
	}

	/// Whether nothing matches.
	pub fn is_empty(&self) -> bool {
		self.matches.is_empty()
	}

	/// Node index under the cursor.
	pub fn current(&self) -> Option<usize> {
		self.matches.get(self.cursor).copied()
	}

	/// Whether node `idx` matches the query.
	pub fn is_match(&self, idx: usize) -> bool {
		self.matches.contains(&idx)
	}

	/// Advance the cursor, wrapping at the end.
	pub fn next(&mut self) -> Option<usize> {
		if self.matches.is_empty() {
			return None;
		}
		self.cursor = (self.cursor + 1) % self.matches.len();
		self.current()
	}

	/// Move the cursor back, wrapping at the start.
	pub fn prev(&mut self) -> Option<usize> {
		if self.matches.is_empty() {
			return None;
		}
		self.cursor = (self.cursor + self.matches.len() - 1) % self.matches.len();
		self.current()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::dependency_graph::types::Network;

	fn nodes() -> Vec<GraphNode> {
		[("Token Swap", "CSWAP01"), ("Price Oracle", "CORACLE"), ("swap router", "CROUTE")]
			.iter()
			.enumerate()
			.map(|(i, (name, addr))| GraphNode {
				id: i.to_string(),
				contract_address: addr.to_string(),
				name: name.to_string(),
				network: Network::Mainnet,
				is_verified: true,
				category: None,
				tags: Vec::new(),
			})
			.collect()
	}

	#[test]
	fn matches_name_or_address_case_insensitively() {
		let mut search = SearchMatches::default();
		assert!(search.set_query("SWAP", &nodes()));
		assert_eq!(search.matches(), &[0, 2]);

		search.set_query("oracle", &nodes());
		assert_eq!(search.matches(), &[1]);
	}

	#[test]
	fn no_matches_keeps_cursor_at_zero() {
		let mut search = SearchMatches::default();
		search.set_query("zzz", &nodes());
		assert!(search.is_empty());
		assert_eq!(search.cursor(), 0);
		assert_eq!(search.next(), None);
		assert_eq!(search.prev(), None);
		assert_eq!(search.cursor(), 0);
	}

	#[test]
	fn cursor_wraps_and_resets_on_new_query() {
		let mut search = SearchMatches::default();
		search.set_query("c", &nodes());
		assert_eq!(search.len(), 3);
		assert_eq!(search.prev(), Some(2));
		assert_eq!(search.next(), Some(0));
		search.next();
		assert_eq!(search.cursor(), 1);

		search.set_query("swap", &nodes());
		assert_eq!(search.cursor(), 0);
	}

	#[test]
	fn blank_query_matches_nothing() {
		let mut search = SearchMatches::default();
		search.set_query("   ", &nodes());
		assert!(search.is_empty());
		assert!(!search.set_query("   ", &nodes()));
	}
}
