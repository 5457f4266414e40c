//! Imperative control surface for hosts: toolbar buttons, search
//! navigation and export.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{error, warn};

use super::download::offer_download;
use super::engine::GraphEngine;
use super::export::{self, ExportedFile};

/// Commands a host can issue against a mounted graph. Implemented by the
/// engine itself and by [`GraphHandle`], which forwards to it.
///
/// Commands without a target are no-ops: an unknown node id, no search
/// matches, or exporting an empty graph.
pub trait GraphCommands {
	/// One zoom step in about the canvas center.
	fn zoom_in(&mut self);
	/// One zoom step out about the canvas center.
	fn zoom_out(&mut self);
	/// Scale 1 with the graph origin centered.
	fn reset_zoom(&mut self);
	/// Center the view on a node.
	fn focus_on_node(&mut self, id: &str);
	/// Move the camera up one step.
	fn pan_up(&mut self);
	/// Move the camera down one step.
	fn pan_down(&mut self);
	/// Move the camera left one step.
	fn pan_left(&mut self);
	/// Move the camera right one step.
	fn pan_right(&mut self);
	/// Focus the next search match, wrapping.
	fn next_match(&mut self);
	/// Focus the previous search match, wrapping.
	fn prev_match(&mut self);
	/// Standalone SVG of the current view. `None` when the graph is empty.
	fn export_svg(&mut self) -> Option<ExportedFile>;
	/// PNG of the current view at on-screen size. `Ok(None)` when the graph is empty.
	fn export_png(&mut self) -> export::Result<Option<ExportedFile>>;
}

/// Shared handle to a mounted [`GraphEngine`].
///
/// The component fills it on mount and empties it on teardown, so commands
/// issued after unmount are silently dropped. Each mount gets a new
/// generation; a torn-down instance can only empty the handle if nothing
/// has mounted on it since.
#[derive(Clone, Default)]
pub struct GraphHandle {
	inner: Rc<RefCell<Option<GraphEngine>>>,
	generation: Rc<Cell<u64>>,
}

impl GraphHandle {
	/// An empty handle; pass it to `DependencyGraph` to have it filled.
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether a component currently owns an engine behind this handle.
	pub fn is_mounted(&self) -> bool {
		self.inner.try_borrow().is_ok_and(|e| e.is_some())
	}

	/// Install `engine`, replacing any previous one. Returns the mount generation.
	pub(crate) fn attach(&self, engine: GraphEngine) -> u64 {
		let generation = self.generation.get() + 1;
		self.generation.set(generation);
		match self.inner.try_borrow_mut() {
			Ok(mut slot) => *slot = Some(engine),
			Err(_) => warn!("graph engine busy, mount dropped"),
		}
		generation
	}

	/// Drop the engine if it still belongs to the mount `generation`.
	pub(crate) fn detach(&self, generation: u64) -> bool {
		if self.generation.get() != generation {
			return false;
		}
		match self.inner.try_borrow_mut() {
			Ok(mut slot) => slot.take().is_some(),
			Err(_) => false,
		}
	}

	/// Run `f` against the engine if one is mounted and not already borrowed.
	pub fn with<R>(&self, f: impl FnOnce(&mut GraphEngine) -> R) -> Option<R> {
		let Ok(mut slot) = self.inner.try_borrow_mut() else {
			warn!("graph engine busy, command dropped");
			return None;
		};
		slot.as_mut().map(f)
	}

	/// Export SVG and hand it to the browser as a download.
	pub fn download_svg(&mut self) {
		if let Some(file) = self.export_svg() {
			if let Err(err) = offer_download(&file) {
				error!("SVG download failed: {err}");
			}
		}
	}

	/// Export PNG and hand it to the browser as a download.
	pub fn download_png(&mut self) {
		match self.export_png() {
			Ok(Some(file)) => {
				if let Err(err) = offer_download(&file) {
					error!("PNG download failed: {err}");
				}
			}
			Ok(None) => {}
			Err(err) => error!("PNG export failed: {err}"),
		}
	}
}

impl GraphCommands for GraphHandle {
	fn zoom_in(&mut self) {
		self.with(|e| e.zoom_in());
	}

	fn zoom_out(&mut self) {
		self.with(|e| e.zoom_out());
	}

	fn reset_zoom(&mut self) {
		self.with(|e| e.reset_zoom());
	}

	fn focus_on_node(&mut self, id: &str) {
		self.with(|e| e.focus_on_node(id));
	}

	fn pan_up(&mut self) {
		self.with(|e| e.pan_up());
	}

	fn pan_down(&mut self) {
		self.with(|e| e.pan_down());
	}

	fn pan_left(&mut self) {
		self.with(|e| e.pan_left());
	}

	fn pan_right(&mut self) {
		self.with(|e| e.pan_right());
	}

	fn next_match(&mut self) {
		self.with(|e| e.next_match());
	}

	fn prev_match(&mut self) {
		self.with(|e| e.prev_match());
	}

	fn export_svg(&mut self) -> Option<ExportedFile> {
		self.with(|e| e.export_svg()).flatten()
	}

	fn export_png(&mut self) -> export::Result<Option<ExportedFile>> {
		self.with(|e| e.export_png()).unwrap_or(Ok(None))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::dependency_graph::config::EngineConfig;
	use crate::components::dependency_graph::sample::sample_graph;
	use crate::components::dependency_graph::types::GraphOptions;

	fn mounted(n: usize) -> GraphHandle {
		let handle = GraphHandle::new();
		handle.attach(engine(n));
		handle
	}

	#[test]
	fn unmounted_handle_is_inert() {
		let mut handle = GraphHandle::new();
		assert!(!handle.is_mounted());
		handle.zoom_in();
		handle.next_match();
		assert_eq!(handle.export_svg(), None);
		assert!(matches!(handle.export_png(), Ok(None)));
	}

	#[test]
	fn commands_compose_from_target() {
		let mut handle = mounted(8);
		handle.pan_left();
		handle.pan_left();
		handle.zoom_in();
		let target = handle.with(|e| e.viewport().target()).unwrap();
		assert!((target.k - 1.3).abs() < 1e-9);
		// (320 + 200 - 320) * 1.3 + 320
		assert!((target.x - 580.0).abs() < 1e-9);
	}

	fn engine(n: usize) -> GraphEngine {
		GraphEngine::new(
			&sample_graph(n, 1),
			GraphOptions::default(),
			EngineConfig::default(),
			640.0,
			480.0,
		)
	}

	#[test]
	fn detach_drops_engine() {
		let handle = GraphHandle::new();
		let generation = handle.attach(engine(3));
		let other = handle.clone();
		assert!(other.is_mounted());
		assert!(handle.detach(generation));
		assert!(!other.is_mounted());
		assert_eq!(other.with(|_| ()), None);
	}

	#[test]
	fn stale_teardown_keeps_remounted_engine() {
		let handle = GraphHandle::new();
		let first = handle.attach(engine(3));
		let second = handle.attach(engine(7));
		assert_ne!(first, second);

		// the first instance tears down after the second mounted
		assert!(!handle.detach(first));
		assert!(handle.is_mounted());
		assert_eq!(handle.with(|e| e.graph().len()), Some(7));

		assert!(handle.detach(second));
		assert!(!handle.is_mounted());
	}

	#[test]
	fn export_svg_of_mounted_graph() {
		let mut handle = mounted(4);
		let file = handle.export_svg().unwrap();
		let svg = String::from_utf8(file.bytes).unwrap();
		assert!(svg.contains("data-id=\"contract-3\""));
		assert!(svg.contains(">Contract 0</text>"));
	}
}
