//! Pan/zoom transform between graph space and screen pixels.

use serde::Deserialize;

/// Smallest zoom factor.
pub const MIN_SCALE: f64 = 0.05;
/// Largest zoom factor.
pub const MAX_SCALE: f64 = 8.0;

/// Tunables for programmatic viewport changes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
	/// Pixels moved by one directional pan.
	pub pan_step: f64,
	/// Multiplier applied by one zoom in/out command.
	pub zoom_step: f64,
	/// Scale used when centering on a node.
	pub focus_scale: f64,
	/// Length of programmatic viewport animations.
	pub transition_ms: f64,
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			pan_step: 100.0,
			zoom_step: 1.3,
			focus_scale: 2.0,
			transition_ms: 350.0,
		}
	}
}

/// Screen = graph * k + (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Screen-space translation.
	pub x: f64,
	/// Screen-space translation.
	pub y: f64,
	/// Scale.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// The scale is clamped to [`MIN_SCALE`, `MAX_SCALE`].
	pub fn new(x: f64, y: f64, k: f64) -> Self {
		Self {
			x,
			y,
			k: clamp_scale(k),
		}
	}

	/// Map a canvas pixel to graph coordinates.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Map graph coordinates to a canvas pixel.
	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(gx * self.k + self.x, gy * self.k + self.y)
	}

	/// Rescale by `factor` keeping the screen point `(ax, ay)` stationary.
	pub fn zoomed_at(&self, factor: f64, ax: f64, ay: f64) -> Self {
		let k = clamp_scale(self.k * factor);
		let ratio = k / self.k;
		Self {
			x: ax - (ax - self.x) * ratio,
			y: ay - (ay - self.y) * ratio,
			k,
		}
	}

	/// Same scale, shifted by `(dx, dy)` pixels.
	pub fn translated(&self, dx: f64, dy: f64) -> Self {
		Self {
			x: self.x + dx,
			y: self.y + dy,
			k: self.k,
		}
	}

	fn lerp(&self, to: &Self, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

/// Clamp a scale into the allowed zoom range.
pub fn clamp_scale(k: f64) -> f64 {
	if k.is_finite() {
		k.clamp(MIN_SCALE, MAX_SCALE)
	} else {
		1.0
	}
}

fn ease_in_out_cubic(t: f64) -> f64 {
	let t = t.clamp(0.0, 1.0);
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

#[derive(Clone, Debug)]
struct Transition {
	from: ViewTransform,
	to: ViewTransform,
	elapsed: f64,
	duration: f64,
}

/// Direction of a fixed-step pan. `Up` moves the camera up, so content moves down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanDirection {
	/// Camera moves up.
	Up,
	/// Camera moves down.
	Down,
	/// Camera moves left.
	Left,
	/// Camera moves right.
	Right,
}

/// Owns the current transform and animates programmatic changes to it.
#[derive(Clone, Debug)]
pub struct Viewport {
	/// Canvas size in pixels.
	pub width: f64,
	/// Canvas size in pixels.
	pub height: f64,
	transform: ViewTransform,
	transition: Option<Transition>,
	config: ViewConfig,
}

impl Viewport {
	/// Identity-scaled view with the graph origin at the canvas center.
	pub fn new(width: f64, height: f64, config: ViewConfig) -> Self {
		Self {
			width,
			height,
			transform: ViewTransform::new(width / 2.0, height / 2.0, 1.0),
			transition: None,
			config,
		}
	}

	/// The transform to draw with this frame.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Where the transform ends up once any running animation completes.
	pub fn target(&self) -> ViewTransform {
		self.transition
			.as_ref()
			.map_or(self.transform, |t| t.to)
	}

	/// Whether a programmatic transition is running.
	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	/// Animation and step settings.
	pub fn config(&self) -> &ViewConfig {
		&self.config
	}

	/// Advance the running animation by `dt` seconds.
	pub fn advance(&mut self, dt: f64) {
		let Some(transition) = self.transition.as_mut() else {
			return;
		};
		transition.elapsed += dt.max(0.0);
		let t = transition.elapsed / transition.duration;
		if t >= 1.0 {
			self.transform = transition.to;
			self.transition = None;
		} else {
			self.transform = transition.from.lerp(&transition.to, ease_in_out_cubic(t));
		}
	}

	/// Jump to the end of the running animation.
	pub fn finish_animation(&mut self) {
		if let Some(transition) = self.transition.take() {
			self.transform = transition.to;
		}
	}

	fn animate_to(&mut self, to: ViewTransform) {
		let duration = self.config.transition_ms / 1000.0;
		if duration <= 0.0 {
			self.transform = to;
			self.transition = None;
			return;
		}
		self.transition = Some(Transition {
			from: self.transform,
			to,
			elapsed: 0.0,
			duration,
		});
	}

	fn set_immediate(&mut self, to: ViewTransform) {
		self.transition = None;
		self.transform = to;
	}

	/// Animate one zoom step in about the canvas center.
	pub fn zoom_in(&mut self) {
		let to = self
			.target()
			.zoomed_at(self.config.zoom_step, self.width / 2.0, self.height / 2.0);
		self.animate_to(to);
	}

	/// Animate one zoom step out about the canvas center.
	pub fn zoom_out(&mut self) {
		let to = self
			.target()
			.zoomed_at(1.0 / self.config.zoom_step, self.width / 2.0, self.height / 2.0);
		self.animate_to(to);
	}

	/// Unit scale with the graph origin centered in the viewport.
	pub fn reset(&mut self) {
		self.animate_to(ViewTransform::new(self.width / 2.0, self.height / 2.0, 1.0));
	}

	/// Center on graph point `(gx, gy)` at the focus scale.
	pub fn focus(&mut self, gx: f64, gy: f64) {
		let k = clamp_scale(self.config.focus_scale);
		self.animate_to(ViewTransform::new(
			self.width / 2.0 - gx * k,
			self.height / 2.0 - gy * k,
			k,
		));
	}

	/// Animate one pan step.
	pub fn pan(&mut self, direction: PanDirection) {
		let step = self.config.pan_step;
		let (dx, dy) = match direction {
			PanDirection::Up => (0.0, step),
			PanDirection::Down => (0.0, -step),
			PanDirection::Left => (step, 0.0),
			PanDirection::Right => (-step, 0.0),
		};
		let to = self.target().translated(dx, dy);
		self.animate_to(to);
	}

	/// Wheel zoom around the pointer; applied immediately.
	pub fn wheel(&mut self, delta_y: f64, sx: f64, sy: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let to = self.transform.zoomed_at(factor, sx, sy);
		self.set_immediate(to);
	}

	/// Background drag pan; applied immediately.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		let to = self.transform.translated(dx, dy);
		self.set_immediate(to);
	}

	/// Jump to an absolute transform, used by the drag-pan gesture.
	pub fn set_transform(&mut self, transform: ViewTransform) {
		self.set_immediate(ViewTransform::new(transform.x, transform.y, transform.k));
	}

	/// Track the container size without re-fitting the view.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn viewport() -> Viewport {
		Viewport::new(800.0, 600.0, ViewConfig::default())
	}

	#[test]
	fn zoom_is_clamped() {
		let mut vp = viewport();
		for _ in 0..100 {
			vp.zoom_in();
			vp.advance(0.1);
			assert!(vp.transform().k <= MAX_SCALE);
		}
		vp.finish_animation();
		assert_eq!(vp.transform().k, MAX_SCALE);

		for _ in 0..200 {
			vp.zoom_out();
			vp.advance(0.1);
			assert!(vp.transform().k >= MIN_SCALE);
		}
		vp.finish_animation();
		assert_eq!(vp.transform().k, MIN_SCALE);
	}

	#[test]
	fn zoom_keeps_center_stationary() {
		let mut vp = viewport();
		let before = vp.transform().screen_to_graph(400.0, 300.0);
		vp.zoom_in();
		vp.finish_animation();
		let after = vp.transform().screen_to_graph(400.0, 300.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
	}

	#[test]
	fn programmatic_changes_animate() {
		let mut vp = viewport();
		vp.focus(100.0, 50.0);
		assert!(vp.is_animating());
		assert_eq!(vp.transform(), ViewTransform::new(400.0, 300.0, 1.0));
		vp.advance(0.1);
		let mid = vp.transform();
		assert!(mid.k > 1.0 && mid.k < 2.0);
		vp.advance(1.0);
		assert!(!vp.is_animating());
		let (sx, sy) = vp.transform().graph_to_screen(100.0, 50.0);
		assert!((sx - 400.0).abs() < 1e-9 && (sy - 300.0).abs() < 1e-9);
	}

	#[test]
	fn successive_pans_compose() {
		let mut vp = viewport();
		vp.pan(PanDirection::Right);
		vp.pan(PanDirection::Right);
		vp.pan(PanDirection::Up);
		vp.finish_animation();
		assert_eq!(vp.transform(), ViewTransform::new(200.0, 400.0, 1.0));
	}

	#[test]
	fn pointer_changes_are_immediate() {
		let mut vp = viewport();
		vp.zoom_in();
		vp.pan_by(10.0, -5.0);
		assert!(!vp.is_animating());
		assert_eq!(vp.transform(), ViewTransform::new(410.0, 295.0, 1.0));

		vp.wheel(-1.0, 0.0, 0.0);
		assert!((vp.transform().k - 1.1).abs() < 1e-9);
	}

	#[test]
	fn resize_does_not_refit() {
		let mut vp = viewport();
		vp.resize(1024.0, 768.0);
		assert_eq!(vp.transform(), ViewTransform::new(400.0, 300.0, 1.0));
		vp.reset();
		vp.finish_animation();
		assert_eq!(vp.transform(), ViewTransform::new(512.0, 384.0, 1.0));
	}
}
