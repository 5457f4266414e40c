//! One mounted graph instance: derived data, physics, viewport and
//! interaction state, rebuilt whole whenever the graph identity changes.

use log::{debug, info};

use super::commands::GraphCommands;
use super::config::EngineConfig;
use super::export::{self, ExportedFile};
use super::interaction::{Gesture, InteractionState};
use super::keyboard::{KeyCommand, key_command};
use super::normalize::{NormalizedGraph, normalize};
use super::policy::RenderPolicy;
use super::scene::{Scene, SceneInputs, Tooltip, build_scene, tooltip_for};
use super::search::SearchMatches;
use super::simulation::ForceSimulation;
use super::types::{GraphData, GraphOptions, NodeId};
use super::viewport::{PanDirection, Viewport};

/// Extra hit area around a node, in graph units.
const HIT_PADDING: f64 = 2.0;

/// What a press+release without drag landed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickTarget {
	/// A node, by id.
	Node(NodeId),
	/// Empty canvas; clears the selection.
	Background,
}

/// Everything behind one mounted `DependencyGraph`, free of browser calls.
pub struct GraphEngine {
	graph: NormalizedGraph,
	policy: RenderPolicy,
	sim: ForceSimulation,
	viewport: Viewport,
	interaction: InteractionState,
	search: SearchMatches,
	options: GraphOptions,
	config: EngineConfig,
	fingerprint: u64,
	initial_fit_done: bool,
}

impl GraphEngine {
	/// Normalize `data`, pick the size tier and start the layout.
	pub fn new(
		data: &GraphData,
		options: GraphOptions,
		config: EngineConfig,
		width: f64,
		height: f64,
	) -> Self {
		let graph = normalize(data, options.dependent_counts.as_ref());
		let mut policy = RenderPolicy::for_node_count(graph.len());
		if let Some(force) = config.force.clone() {
			policy = policy.with_force(force);
		}
		let sim = ForceSimulation::new(&graph, policy.force.clone());
		info!(
			"dependency graph: {} nodes, {} edges, {:?} tier",
			graph.len(),
			graph.edges.len(),
			policy.tier
		);

		let mut engine = Self {
			viewport: Viewport::new(width, height, config.view.clone()),
			graph,
			policy,
			sim,
			interaction: InteractionState::default(),
			search: SearchMatches::default(),
			options: GraphOptions::default(),
			config,
			fingerprint: data.fingerprint(),
			initial_fit_done: false,
		};
		engine.set_options(options);
		engine
	}

	/// Take a new payload. Same identity keeps layout and pins but picks up
	/// renamed or re-flagged nodes; a different graph tears everything down.
	/// Returns true when rebuilt.
	pub fn load(&mut self, data: &GraphData, options: GraphOptions) -> bool {
		if data.fingerprint() == self.fingerprint {
			if self.refresh_nodes(data) {
				self.search.refresh(&self.graph.nodes);
			}
			self.set_options(options);
			return false;
		}
		let (width, height) = (self.viewport.width, self.viewport.height);
		*self = Self::new(data, options, self.config.clone(), width, height);
		true
	}

	/// Apply host options: dependent overrides, selection and search query.
	pub fn set_options(&mut self, options: GraphOptions) {
		if options.dependent_counts != self.options.dependent_counts {
			self.graph
				.apply_dependent_override(options.dependent_counts.as_ref());
			self.sim.set_radii(&self.graph);
		}
		if options.selected_node != self.options.selected_node {
			self.select_node(options.selected_node.as_deref());
		}
		let query = options.search_query.clone();
		self.options = options;
		self.set_search_query(&query);
	}

	/// Copy node metadata from a payload with the same identity. Later
	/// duplicates of an id were dropped on normalize and are skipped here too.
	fn refresh_nodes(&mut self, data: &GraphData) -> bool {
		let mut changed = false;
		let mut kept = 0;
		for node in &data.nodes {
			let Some(current) = self.graph.nodes.get_mut(kept) else {
				break;
			};
			if current.id != node.id {
				continue;
			}
			kept += 1;
			if current != node {
				*current = node.clone();
				changed = true;
			}
		}
		if changed {
			debug!("node metadata refreshed in place");
		}
		changed
	}

	/// Identity of the loaded graph.
	pub fn fingerprint(&self) -> u64 {
		self.fingerprint
	}

	/// Normalized graph data.
	pub fn graph(&self) -> &NormalizedGraph {
		&self.graph
	}

	/// Tier policy for this graph.
	pub fn policy(&self) -> &RenderPolicy {
		&self.policy
	}

	/// Layout state.
	pub fn simulation(&self) -> &ForceSimulation {
		&self.sim
	}

	/// Pan/zoom state.
	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	/// Pan/zoom state, mutable.
	pub fn viewport_mut(&mut self) -> &mut Viewport {
		&mut self.viewport
	}

	/// Gesture, pin and selection state.
	pub fn interaction(&self) -> &InteractionState {
		&self.interaction
	}

	/// Current search matches.
	pub fn search(&self) -> &SearchMatches {
		&self.search
	}

	/// Whether the graph has no nodes.
	pub fn is_empty(&self) -> bool {
		self.graph.is_empty()
	}

	/// Whether the deferred first fit has run.
	pub fn initial_fit_done(&self) -> bool {
		self.initial_fit_done
	}

	/// Id of the selected node.
	pub fn selected_id(&self) -> Option<&str> {
		self.interaction
			.selected()
			.and_then(|idx| self.graph.nodes.get(idx))
			.map(|n| n.id.as_str())
	}

	/// One animation frame: a physics tick if the layout is still warm, and
	/// `dt` seconds of viewport animation. Returns whether positions moved.
	pub fn tick(&mut self, dt: f64) -> bool {
		self.viewport.advance(dt);
		!self.graph.is_empty() && self.sim.step()
	}

	/// Deferred first fit, run once the layout has spread out.
	pub fn apply_initial_fit(&mut self) {
		if self.initial_fit_done {
			return;
		}
		self.initial_fit_done = true;
		debug!("initial fit after {} ticks", self.sim.ticks());
		self.viewport.reset();
	}

	/// Follow a canvas resize.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport.resize(width, height);
	}

	/// Recompute matches and focus the first one.
	pub fn set_search_query(&mut self, query: &str) {
		if self.search.query() == query {
			return;
		}
		self.search.set_query(query, &self.graph.nodes);
		self.focus_current_match();
	}

	fn focus_current_match(&mut self) {
		if let Some(idx) = self.search.current() {
			self.focus_index(idx);
		}
	}

	fn focus_index(&mut self, idx: usize) {
		if let Some((x, y)) = self.sim.position(idx) {
			self.viewport.focus(x, y);
		}
	}

	/// Animate one pan step.
	pub fn pan(&mut self, direction: PanDirection) {
		self.viewport.pan(direction);
	}

	/// Select by id. Unknown ids clear the selection.
	pub fn select_node(&mut self, id: Option<&str>) {
		let idx = id.and_then(|id| self.graph.index.get(id).copied());
		self.interaction.select(idx, &self.graph.adjacency);
	}

	/// Drop the selection.
	pub fn clear_selection(&mut self) {
		self.interaction.clear_selection(&self.graph.adjacency);
	}

	/// Topmost node under the screen point.
	pub fn node_at(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.viewport.transform().screen_to_graph(sx, sy);
		self.sim
			.nodes()
			.iter()
			.enumerate()
			.rev()
			.find(|(_, n)| (n.x - gx).hypot(n.y - gy) <= n.radius + HIT_PADDING)
			.map(|(idx, _)| idx)
	}

	/// Press on a node starts a drag, anywhere else a pan.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		self.interaction.set_pointer(sx, sy);
		match self.node_at(sx, sy) {
			Some(idx) => self.interaction.begin_drag(idx, sx, sy, &mut self.sim),
			None => self
				.interaction
				.begin_pan(sx, sy, self.viewport.transform()),
		}
	}

	/// Continue a drag or pan, or update hover.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		self.interaction.set_pointer(sx, sy);
		if self.interaction.is_dragging() {
			let k = self.viewport.transform().k;
			self.interaction.drag_to(sx, sy, k, &mut self.sim);
			return;
		}
		if let Some(transform) = self.interaction.pan_to(sx, sy) {
			self.viewport.set_transform(transform);
			return;
		}
		let hovered = self.node_at(sx, sy);
		self.interaction.set_hover(hovered, &self.graph.adjacency);
	}

	/// Finish the current gesture. A press that did not move is a click,
	/// which updates the selection and is reported to the caller.
	pub fn pointer_up(&mut self, sx: f64, sy: f64) -> Option<ClickTarget> {
		self.interaction.set_pointer(sx, sy);
		if let Some(idx) = self.dragged_node() {
			let id = self.graph.nodes[idx].id.clone();
			let (_, moved) = self.interaction.end_drag(&id, &mut self.sim)?;
			if moved {
				return None;
			}
			self.interaction.select(Some(idx), &self.graph.adjacency);
			return Some(ClickTarget::Node(id));
		}
		match self.interaction.end_pan() {
			Some(false) => {
				self.clear_selection();
				Some(ClickTarget::Background)
			}
			_ => None,
		}
	}

	fn dragged_node(&self) -> Option<usize> {
		match &self.interaction.gesture {
			Gesture::Dragging(drag) => Some(drag.node),
			_ => None,
		}
	}

	/// Pointer left the canvas: abort gestures and hide the tooltip.
	pub fn pointer_leave(&mut self) {
		let pinned = self
			.dragged_node()
			.is_some_and(|idx| self.interaction.is_pinned(&self.graph.nodes[idx].id));
		self.interaction.cancel_gestures(&mut self.sim, |_| pinned);
		self.interaction.set_hover(None, &self.graph.adjacency);
	}

	/// Toggle the pin of the node under the pointer. Returns the new pinned state.
	pub fn double_click(&mut self, sx: f64, sy: f64) -> Option<bool> {
		let idx = self.node_at(sx, sy)?;
		Some(self.toggle_pin(idx))
	}

	/// Pin or unpin node `idx`. Returns the new pinned state.
	pub fn toggle_pin(&mut self, idx: usize) -> bool {
		let id = self.graph.nodes[idx].id.clone();
		self.interaction.toggle_pin(idx, &id, &mut self.sim)
	}

	/// Zoom about the pointer, without animation.
	pub fn wheel(&mut self, delta_y: f64, sx: f64, sy: f64) {
		self.viewport.wheel(delta_y, sx, sy);
	}

	/// Run a keyboard shortcut. Returns the command that ran, if any.
	pub fn handle_key(&mut self, key: &str, editing_text: bool) -> Option<KeyCommand> {
		let command = key_command(key, editing_text)?;
		match command {
			KeyCommand::ZoomIn => self.zoom_in(),
			KeyCommand::ZoomOut => self.zoom_out(),
			KeyCommand::Reset => self.reset_zoom(),
			KeyCommand::Pan(direction) => self.pan(direction),
			KeyCommand::ClearSelection => self.clear_selection(),
		}
		Some(command)
	}

	/// Snapshot of what to draw, shared by the canvas and export.
	pub fn scene(&self) -> Scene {
		build_scene(&SceneInputs {
			graph: &self.graph,
			sim: &self.sim,
			interaction: &self.interaction,
			search: &self.search,
			policy: &self.policy,
			transform: self.viewport.transform(),
			width: self.viewport.width,
			height: self.viewport.height,
		})
	}

	/// Tooltip for the hovered node, hidden while dragging.
	pub fn tooltip(&self) -> Option<Tooltip> {
		if self.interaction.is_dragging() {
			return None;
		}
		let idx = self.interaction.hovered()?;
		tooltip_for(&self.graph, idx, self.interaction.pointer())
	}
}

impl GraphCommands for GraphEngine {
	fn zoom_in(&mut self) {
		self.viewport.zoom_in();
	}

	fn zoom_out(&mut self) {
		self.viewport.zoom_out();
	}

	fn reset_zoom(&mut self) {
		self.viewport.reset();
	}

	/// Center on a node's current position. Unknown ids are ignored.
	fn focus_on_node(&mut self, id: &str) {
		if let Some(&idx) = self.graph.index.get(id) {
			self.focus_index(idx);
		}
	}

	fn pan_up(&mut self) {
		self.pan(PanDirection::Up);
	}

	fn pan_down(&mut self) {
		self.pan(PanDirection::Down);
	}

	fn pan_left(&mut self) {
		self.pan(PanDirection::Left);
	}

	fn pan_right(&mut self) {
		self.pan(PanDirection::Right);
	}

	fn next_match(&mut self) {
		if self.search.next().is_some() {
			self.focus_current_match();
		}
	}

	fn prev_match(&mut self) {
		if self.search.prev().is_some() {
			self.focus_current_match();
		}
	}

	fn export_svg(&mut self) -> Option<ExportedFile> {
		export::export_svg(&self.scene())
	}

	fn export_png(&mut self) -> export::Result<Option<ExportedFile>> {
		export::export_png(&self.scene())
	}
}
