//! Drag, pin, hover and selection state. Every write to a node's fixed
//! position goes through here so the integrator sees a single writer.

use std::collections::HashSet;

use super::simulation::ForceSimulation;
use super::types::NodeId;
use super::viewport::ViewTransform;

/// Pointer travel (screen px) under which a press+release counts as a click.
pub const CLICK_SLOP: f64 = 3.0;
/// Opacity of nodes outside the selected neighborhood.
pub const SELECTION_FADE: f64 = 0.15;
/// Opacity of nodes outside the hovered neighborhood.
pub const HOVER_FADE: f64 = 0.3;
const PIN_REHEAT: f64 = 0.3;

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct DragState {
	pub node: usize,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PanState {
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start: ViewTransform,
	pub moved: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) enum Gesture {
	#[default]
	Idle,
	Dragging(DragState),
	Panning(PanState),
}

/// How an edge is drawn relative to the current hover/selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeEmphasis {
	/// Default look.
	Normal,
	/// Touches the selected node; recolored to stand out.
	Connected,
	/// Unrelated to the focused node.
	Dimmed,
}

/// Gesture, pins, selection and hover for one mounted graph.
#[derive(Clone, Debug, Default)]
pub struct InteractionState {
	pub(crate) gesture: Gesture,
	pins: HashSet<NodeId>,
	selected: Option<usize>,
	hovered: Option<usize>,
	pointer: (f64, f64),
	neighbors: HashSet<usize>,
}

impl InteractionState {
	/// Index of the selected node.
	pub fn selected(&self) -> Option<usize> {
		self.selected
	}

	/// Index of the node under the pointer.
	pub fn hovered(&self) -> Option<usize> {
		self.hovered
	}

	/// Last pointer position in screen pixels.
	pub fn pointer(&self) -> (f64, f64) {
		self.pointer
	}

	/// Record the pointer position for tooltips.
	pub fn set_pointer(&mut self, sx: f64, sy: f64) {
		self.pointer = (sx, sy);
	}

	/// Ids of pinned nodes.
	pub fn pins(&self) -> &HashSet<NodeId> {
		&self.pins
	}

	/// Whether the node with `id` is pinned.
	pub fn is_pinned(&self, id: &str) -> bool {
		self.pins.contains(id)
	}

	/// Whether a node drag is in progress.
	pub fn is_dragging(&self) -> bool {
		matches!(self.gesture, Gesture::Dragging(_))
	}

	fn refresh_neighbors(&mut self, adjacency: &[Vec<usize>]) {
		self.neighbors.clear();
		if let Some(idx) = self.selected.or(self.hovered) {
			if let Some(adjacent) = adjacency.get(idx) {
				self.neighbors.extend(adjacent.iter().copied());
			}
		}
	}

	/// Hover a node, or clear hover with `None`.
	pub fn set_hover(&mut self, node: Option<usize>, adjacency: &[Vec<usize>]) {
		if self.hovered == node {
			return;
		}
		self.hovered = node;
		self.refresh_neighbors(adjacency);
	}

	/// Select a node and remember its 1-hop neighbors.
	pub fn select(&mut self, node: Option<usize>, adjacency: &[Vec<usize>]) {
		self.selected = node;
		self.refresh_neighbors(adjacency);
	}

	/// Drop the selection and its neighborhood.
	pub fn clear_selection(&mut self, adjacency: &[Vec<usize>]) {
		self.select(None, adjacency);
	}

	/// Opacity for a node: selection dims everything outside the 1-hop
	/// neighborhood, hover does the same more gently.
	pub fn node_opacity(&self, idx: usize) -> f64 {
		let (active, fade) = match (self.selected, self.hovered) {
			(Some(sel), _) => (sel, SELECTION_FADE),
			(None, Some(hov)) => (hov, HOVER_FADE),
			(None, None) => return 1.0,
		};
		if idx == active || self.neighbors.contains(&idx) {
			1.0
		} else {
			fade
		}
	}

	/// Emphasis of the edge `source -> target`.
	pub fn edge_emphasis(&self, source: usize, target: usize) -> EdgeEmphasis {
		match (self.selected, self.hovered) {
			(Some(sel), _) if source == sel || target == sel => EdgeEmphasis::Connected,
			(Some(_), _) => EdgeEmphasis::Dimmed,
			(None, Some(hov)) if source == hov || target == hov => EdgeEmphasis::Normal,
			(None, Some(_)) => EdgeEmphasis::Dimmed,
			(None, None) => EdgeEmphasis::Normal,
		}
	}

	/// Press on a node: hold it at its current position and warm the layout.
	pub fn begin_drag(&mut self, idx: usize, sx: f64, sy: f64, sim: &mut ForceSimulation) {
		let Some((x, y)) = sim.position(idx) else {
			return;
		};
		sim.fix(idx, x, y);
		let target = sim.params().drag_alpha_target;
		sim.set_alpha_target(target);
		self.gesture = Gesture::Dragging(DragState {
			node: idx,
			start_x: sx,
			start_y: sy,
			node_start_x: x,
			node_start_y: y,
			moved: false,
		});
	}

	/// Move the dragged node with the pointer, at zoom `k`.
	pub fn drag_to(&mut self, sx: f64, sy: f64, k: f64, sim: &mut ForceSimulation) {
		let Gesture::Dragging(drag) = &mut self.gesture else {
			return;
		};
		if (sx - drag.start_x).hypot(sy - drag.start_y) >= CLICK_SLOP {
			drag.moved = true;
		}
		if !drag.moved {
			return;
		}
		let nx = drag.node_start_x + (sx - drag.start_x) / k;
		let ny = drag.node_start_y + (sy - drag.start_y) / k;
		sim.fix(drag.node, nx, ny);
	}

	/// Release a dragged node. Pinned nodes keep their (possibly relocated) fix.
	/// Returns the node and whether the pointer moved far enough to be a drag.
	pub fn end_drag(&mut self, id: &str, sim: &mut ForceSimulation) -> Option<(usize, bool)> {
		let Gesture::Dragging(drag) = std::mem::take(&mut self.gesture) else {
			return None;
		};
		if !self.pins.contains(id) {
			sim.release(drag.node);
		}
		sim.set_alpha_target(0.0);
		Some((drag.node, drag.moved))
	}

	/// Start a background drag from `transform`.
	pub fn begin_pan(&mut self, sx: f64, sy: f64, transform: ViewTransform) {
		self.gesture = Gesture::Panning(PanState {
			start_x: sx,
			start_y: sy,
			transform_start: transform,
			moved: false,
		});
	}

	/// Transform for the pan gesture at pointer `(sx, sy)`, if panning.
	pub fn pan_to(&mut self, sx: f64, sy: f64) -> Option<ViewTransform> {
		let Gesture::Panning(pan) = &mut self.gesture else {
			return None;
		};
		if (sx - pan.start_x).hypot(sy - pan.start_y) >= CLICK_SLOP {
			pan.moved = true;
		}
		pan.moved.then(|| {
			pan.transform_start
				.translated(sx - pan.start_x, sy - pan.start_y)
		})
	}

	/// Finish a pan gesture. Returns whether the pointer moved.
	pub fn end_pan(&mut self) -> Option<bool> {
		match std::mem::take(&mut self.gesture) {
			Gesture::Panning(pan) => Some(pan.moved),
			other => {
				self.gesture = other;
				None
			}
		}
	}

	/// Double-click toggle. Returns true when the node is now pinned.
	pub fn toggle_pin(&mut self, idx: usize, id: &str, sim: &mut ForceSimulation) -> bool {
		let pinned = if self.pins.remove(id) {
			sim.release(idx);
			false
		} else {
			let Some((x, y)) = sim.position(idx) else {
				return false;
			};
			self.pins.insert(id.to_string());
			sim.fix(idx, x, y);
			true
		};
		sim.reheat(PIN_REHEAT);
		pinned
	}

	/// Abort any gesture, e.g. when the pointer leaves the canvas. Dragged nodes
	/// for which `pinned` holds stay fixed.
	pub fn cancel_gestures(&mut self, sim: &mut ForceSimulation, pinned: impl Fn(usize) -> bool) {
		if let Gesture::Dragging(drag) = std::mem::take(&mut self.gesture) {
			if !pinned(drag.node) {
				sim.release(drag.node);
			}
			sim.set_alpha_target(0.0);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::dependency_graph::normalize::normalize;
	use crate::components::dependency_graph::policy::ForceParams;
	use crate::components::dependency_graph::sample::sample_graph;

	fn setup() -> ForceSimulation {
		let graph = normalize(&sample_graph(12, 2), None);
		ForceSimulation::new(&graph, ForceParams::default())
	}

	#[test]
	fn double_click_round_trips() {
		let mut sim = setup();
		let mut state = InteractionState::default();
		assert!(!state.is_pinned("contract-4") && !sim.is_fixed(4));

		assert!(state.toggle_pin(4, "contract-4", &mut sim));
		assert!(state.is_pinned("contract-4") && sim.is_fixed(4));

		assert!(!state.toggle_pin(4, "contract-4", &mut sim));
		assert!(!state.is_pinned("contract-4") && !sim.is_fixed(4));
	}

	#[test]
	fn drag_release_unfixes_unpinned_node() {
		let mut sim = setup();
		let mut state = InteractionState::default();
		state.begin_drag(2, 100.0, 100.0, &mut sim);
		assert!(sim.is_fixed(2));
		assert_eq!(sim.alpha_target(), 0.3);

		state.drag_to(140.0, 100.0, 2.0, &mut sim);
		let (x0, _) = match &state.gesture {
			Gesture::Dragging(d) => (d.node_start_x, d.node_start_y),
			_ => panic!("not dragging"),
		};
		assert_eq!(sim.position(2).map(|p| p.0), Some(x0 + 20.0));

		assert_eq!(state.end_drag("contract-2", &mut sim), Some((2, true)));
		assert!(!sim.is_fixed(2));
		assert_eq!(sim.alpha_target(), 0.0);
	}

	#[test]
	fn dragging_pinned_node_relocates_pin() {
		let mut sim = setup();
		let mut state = InteractionState::default();
		state.toggle_pin(5, "contract-5", &mut sim);
		state.begin_drag(5, 0.0, 0.0, &mut sim);
		state.drag_to(0.0, 50.0, 1.0, &mut sim);
		state.end_drag("contract-5", &mut sim);

		let node = sim.node(5).unwrap().clone();
		assert!(node.is_fixed());
		assert_eq!(node.fy, Some(node.y));
		sim.tick();
		assert_eq!(sim.node(5).unwrap().fy, Some(node.y));
	}

	#[test]
	fn small_motion_is_a_click() {
		let mut sim = setup();
		let mut state = InteractionState::default();
		state.begin_drag(1, 10.0, 10.0, &mut sim);
		state.drag_to(11.0, 11.0, 1.0, &mut sim);
		assert_eq!(state.end_drag("contract-1", &mut sim), Some((1, false)));
	}

	#[test]
	fn selection_overrides_hover_dimming() {
		// 0 - 1 - 2, with 3 isolated
		let adjacency = vec![vec![1], vec![0, 2], vec![1], vec![]];
		let mut state = InteractionState::default();

		state.set_hover(Some(0), &adjacency);
		assert_eq!(state.node_opacity(3), HOVER_FADE);
		assert_eq!(state.node_opacity(1), 1.0);
		assert_eq!(state.edge_emphasis(0, 1), EdgeEmphasis::Normal);
		assert_eq!(state.edge_emphasis(1, 2), EdgeEmphasis::Dimmed);

		state.select(Some(2), &adjacency);
		assert_eq!(state.node_opacity(2), 1.0);
		assert_eq!(state.node_opacity(1), 1.0);
		assert_eq!(state.node_opacity(0), SELECTION_FADE);
		assert_eq!(state.edge_emphasis(1, 2), EdgeEmphasis::Connected);
		assert_eq!(state.edge_emphasis(0, 1), EdgeEmphasis::Dimmed);

		state.clear_selection(&adjacency);
		state.set_hover(None, &adjacency);
		assert_eq!(state.node_opacity(3), 1.0);
		assert_eq!(state.edge_emphasis(0, 1), EdgeEmphasis::Normal);
	}

	#[test]
	fn pan_gesture_tracks_pointer() {
		let mut state = InteractionState::default();
		state.begin_pan(10.0, 10.0, ViewTransform::new(400.0, 300.0, 1.0));
		assert_eq!(state.pan_to(11.0, 10.0), None);
		assert_eq!(
			state.pan_to(30.0, 0.0),
			Some(ViewTransform::new(420.0, 290.0, 1.0))
		);
		assert_eq!(state.end_pan(), Some(true));
		assert_eq!(state.gesture, Gesture::Idle);
	}
}
