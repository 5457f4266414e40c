//! Size-tier policy: the one place node-count thresholds are decided.

use serde::Deserialize;

/// Graphs above this many nodes drop labels and use tighter physics.
pub const LARGE_THRESHOLD: usize = 200;
/// Graphs above this many nodes also drop arrow markers.
pub const VERY_LARGE_THRESHOLD: usize = 500;

/// Discrete performance/quality mode selected by node count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeTier {
	/// Up to 200 nodes: labels, arrows, full physics.
	Small,
	/// Up to 500 nodes: no labels.
	Large,
	/// Above 500 nodes: no labels, no arrows.
	VeryLarge,
}

impl SizeTier {
	/// Tier for a graph of `count` nodes.
	pub fn for_node_count(count: usize) -> Self {
		if count > VERY_LARGE_THRESHOLD {
			SizeTier::VeryLarge
		} else if count > LARGE_THRESHOLD {
			SizeTier::Large
		} else {
			SizeTier::Small
		}
	}
}

/// Force parameters. Tier defaults are empirical and can be overridden by the host.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForceParams {
	/// Rest length of a link.
	pub link_distance: f64,
	/// Link constraint passes per tick.
	pub link_iterations: usize,
	/// Negative repels.
	pub charge_strength: f64,
	/// Charge is ignored beyond this distance.
	pub charge_distance_max: f64,
	/// Barnes–Hut accuracy: a quad whose size over distance is below this
	/// acts as a single body.
	pub theta: f64,
	/// Added to each radius for collision.
	pub collision_padding: f64,
	/// Rate at which alpha approaches its target.
	pub alpha_decay: f64,
	/// The layout settles once alpha drops below this.
	pub alpha_min: f64,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
	/// Alpha target while a node is being dragged.
	pub drag_alpha_target: f64,
}

impl ForceParams {
	/// Defaults for a size tier.
	pub fn for_tier(tier: SizeTier) -> Self {
		let base = Self::default();
		match tier {
			SizeTier::Small => base,
			SizeTier::Large => Self {
				link_distance: 50.0,
				link_iterations: 1,
				charge_strength: -120.0,
				charge_distance_max: 200.0,
				collision_padding: 2.0,
				alpha_decay: 0.04,
				..base
			},
			SizeTier::VeryLarge => Self {
				link_distance: 50.0,
				link_iterations: 1,
				charge_strength: -60.0,
				charge_distance_max: 200.0,
				theta: 1.0,
				collision_padding: 2.0,
				alpha_decay: 0.06,
				..base
			},
		}
	}
}

impl Default for ForceParams {
	fn default() -> Self {
		Self {
			link_distance: 80.0,
			link_iterations: 2,
			charge_strength: -180.0,
			charge_distance_max: 400.0,
			theta: 0.9,
			collision_padding: 4.0,
			alpha_decay: 0.025,
			alpha_min: 0.001,
			velocity_decay: 0.4,
			drag_alpha_target: 0.3,
		}
	}
}

/// Everything that varies with graph size, computed once per graph.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPolicy {
	/// Tier the policy was derived from.
	pub tier: SizeTier,
	/// Physics parameters in effect.
	pub force: ForceParams,
	/// Draw node names under nodes.
	pub show_labels: bool,
	/// Draw arrow heads on edges.
	pub show_arrows: bool,
	/// Delay before the first fit-to-view, giving the layout time to spread out.
	pub initial_fit_delay_ms: u32,
}

impl RenderPolicy {
	/// Policy for a graph of `count` nodes.
	pub fn for_node_count(count: usize) -> Self {
		let tier = SizeTier::for_node_count(count);
		Self {
			tier,
			force: ForceParams::for_tier(tier),
			show_labels: tier == SizeTier::Small,
			show_arrows: tier != SizeTier::VeryLarge,
			initial_fit_delay_ms: match tier {
				SizeTier::Small => 600,
				SizeTier::Large => 1000,
				SizeTier::VeryLarge => 1500,
			},
		}
	}

	/// Replace the tier force defaults with host parameters.
	pub fn with_force(mut self, force: ForceParams) -> Self {
		self.force = force;
		self
	}

	/// Large or very large.
	pub fn is_large(&self) -> bool {
		self.tier != SizeTier::Small
	}

	/// Above the very-large threshold.
	pub fn is_very_large(&self) -> bool {
		self.tier == SizeTier::VeryLarge
	}
}
