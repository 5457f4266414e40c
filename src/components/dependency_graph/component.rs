use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent,
	WheelEvent, Window,
};

use super::commands::GraphHandle;
use super::config::EngineConfig;
use super::engine::{ClickTarget, GraphEngine};
use super::keyboard::{KeyCommand, is_text_entry};
use super::render;
use super::types::{GraphData, GraphOptions, NodeId};

/// Largest frame delta fed to the viewport animator, in seconds.
const MAX_FRAME_DT: f64 = 0.1;

type Listener<E> = Rc<RefCell<Option<Closure<dyn FnMut(E)>>>>;

fn window_size(window: &Window) -> (f64, f64) {
	let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64());
	(
		dim(window.inner_width()).unwrap_or(800.0),
		dim(window.inner_height()).unwrap_or(600.0),
	)
}

fn canvas_size(
	canvas: &HtmlCanvasElement,
	window: &Window,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		return window_size(window);
	}
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| p.client_width() as f64)),
		height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| p.client_height() as f64)),
	)
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn editing_text(ev: &KeyboardEvent) -> bool {
	ev.target()
		.and_then(|t| t.dyn_into::<HtmlElement>().ok())
		.is_some_and(|el| is_text_entry(&el.tag_name(), el.is_content_editable()))
}

/// Arm the deferred first fit. Stale timers from a replaced graph are ignored.
fn schedule_initial_fit(handle: &GraphHandle, timer: &Rc<Cell<Option<i32>>>) {
	let Some(window) = web_sys::window() else {
		return;
	};
	let Some((fingerprint, delay)) =
		handle.with(|e| (e.fingerprint(), e.policy().initial_fit_delay_ms))
	else {
		return;
	};
	if let Some(id) = timer.take() {
		window.clear_timeout_with_handle(id);
	}
	let (handle, timer_done) = (handle.clone(), timer.clone());
	let cb = Closure::once_into_js(move || {
		timer_done.set(None);
		handle.with(|e| {
			if e.fingerprint() == fingerprint {
				e.apply_initial_fit();
			}
		});
	});
	match window.set_timeout_with_callback_and_timeout_and_arguments_0(
		cb.unchecked_ref(),
		delay as i32,
	) {
		Ok(id) => timer.set(Some(id)),
		Err(err) => warn!("initial fit timer not armed: {err:?}"),
	}
}

/// Interactive dependency graph on a canvas.
///
/// Pan by dragging the background, zoom with the wheel, drag nodes to move
/// them, double-click to pin. Hosts drive it imperatively through `handle`.
#[component]
pub fn DependencyGraph(
	/// Graph to draw. A payload with new ids or edges rebuilds the layout.
	#[prop(into)]
	data: Signal<GraphData>,
	/// Highlights matching nodes and focuses the current match.
	#[prop(optional, into)]
	search_query: MaybeProp<String>,
	/// Dependent counts to show instead of the ones derived from edges.
	#[prop(optional, into)]
	dependent_counts: MaybeProp<HashMap<NodeId, usize>>,
	/// Host-driven selection.
	#[prop(optional, into)]
	selected_node: MaybeProp<NodeId>,
	/// Called with the clicked node, or `None` for background clicks and Escape.
	#[prop(optional, into)]
	on_node_click: Option<Callback<Option<NodeId>>>,
	/// Filled with the engine while mounted.
	#[prop(optional)]
	handle: Option<GraphHandle>,
	/// Viewport and force overrides, read once at mount.
	#[prop(optional)]
	config: EngineConfig,
	/// Size the canvas to the window instead of its parent.
	#[prop(default = false)]
	fullscreen: bool,
	/// Fixed canvas width in pixels.
	#[prop(default = None)]
	width: Option<f64>,
	/// Fixed canvas height in pixels.
	#[prop(default = None)]
	height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let handle = handle.unwrap_or_default();
	let alive = Arc::new(AtomicBool::new(true));
	let generation: Rc<Cell<Option<u64>>> = Rc::new(Cell::new(None));
	let fit_timer: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Listener<web_sys::Event> = Rc::new(RefCell::new(None));
	let keydown_cb: Listener<KeyboardEvent> = Rc::new(RefCell::new(None));

	let options = move || GraphOptions {
		search_query: search_query.get().unwrap_or_default(),
		dependent_counts: dependent_counts.get(),
		selected_node: selected_node.get(),
	};

	let notify = move |target: Option<ClickTarget>| {
		let Some(cb) = on_node_click else {
			return;
		};
		match target {
			Some(ClickTarget::Node(id)) => cb.run(Some(id)),
			Some(ClickTarget::Background) => cb.run(None),
			None => {}
		}
	};

	let (handle_init, alive_init, timer_init) = (handle.clone(), alive.clone(), fit_timer.clone());
	let (animate_init, resize_init, keydown_init) =
		(animate.clone(), resize_cb.clone(), keydown_cb.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if generation.get().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas;
		let Some(window) = web_sys::window() else {
			warn!("no window, graph not mounted");
			return;
		};

		let (w, h) = canvas_size(&canvas, &window, fullscreen, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("2d canvas context unavailable");
			return;
		};

		// Replaces whatever engine the handle held; a previous instance that
		// has not torn down yet can no longer detach it.
		let initial = untrack(options);
		let mounted = handle_init.attach(GraphEngine::new(
			&data.get_untracked(),
			initial,
			config.clone(),
			w,
			h,
		));
		generation.set(Some(mounted));
		schedule_initial_fit(&handle_init, &timer_init);

		let (handle_resize, canvas_resize, alive_resize) =
			(handle_init.clone(), canvas.clone(), alive_init.clone());
		*resize_init.borrow_mut() = Some(Closure::new(move |_: web_sys::Event| {
			if !alive_resize.load(Ordering::Relaxed) {
				return;
			}
			let Some(win) = web_sys::window() else {
				return;
			};
			let (nw, nh) = canvas_size(&canvas_resize, &win, fullscreen, width, height);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			handle_resize.with(|e| e.resize(nw, nh));
		}));
		if let Some(ref cb) = *resize_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (handle_key, alive_key) = (handle_init.clone(), alive_init.clone());
		*keydown_init.borrow_mut() = Some(Closure::new(move |ev: KeyboardEvent| {
			if !alive_key.load(Ordering::Relaxed) {
				return;
			}
			let command = handle_key
				.with(|e| e.handle_key(&ev.key(), editing_text(&ev)))
				.flatten();
			match command {
				Some(KeyCommand::ClearSelection) => notify(Some(ClickTarget::Background)),
				Some(_) => ev.prevent_default(),
				None => {}
			}
		}));
		if let Some(ref cb) = *keydown_init.borrow() {
			let _ = window.add_event_listener_with_callback("keydown", cb.as_ref().unchecked_ref());
		}

		let (handle_anim, animate_inner, alive_anim) =
			(handle_init.clone(), animate_init.clone(), alive_init.clone());
		let (timer_anim, resize_anim, keydown_anim) =
			(timer_init.clone(), resize_init.clone(), keydown_init.clone());
		let last_frame: Cell<Option<f64>> = Cell::new(None);
		*animate_init.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			let Some(win) = web_sys::window() else {
				return;
			};
			if !alive_anim.load(Ordering::Relaxed) {
				if let Some(id) = timer_anim.take() {
					win.clear_timeout_with_handle(id);
				}
				if let Some(cb) = resize_anim.borrow_mut().take() {
					let _ = win
						.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
				if let Some(cb) = keydown_anim.borrow_mut().take() {
					let _ = win
						.remove_event_listener_with_callback("keydown", cb.as_ref().unchecked_ref());
				}
				if handle_anim.detach(mounted) {
					debug!("dependency graph unmounted");
				}
				return;
			}

			let dt = last_frame
				.replace(Some(timestamp))
				.map_or(0.0, |prev| ((timestamp - prev) / 1000.0).clamp(0.0, MAX_FRAME_DT));
			handle_anim.with(|e| {
				e.tick(dt);
				render::render(&e.scene(), e.tooltip().as_ref(), &ctx);
			});
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// Incoming props after mount. A new graph identity rebuilds the engine
	// and re-arms the deferred fit.
	let (handle_props, timer_props) = (handle.clone(), fit_timer.clone());
	Effect::new(move |_| {
		let graph = data.get();
		let opts = options();
		let rebuilt = handle_props.with(|e| e.load(&graph, opts));
		if rebuilt == Some(true) {
			schedule_initial_fit(&handle_props, &timer_props);
		}
	});

	let alive_cleanup = alive.clone();
	on_cleanup(move || alive_cleanup.store(false, Ordering::Relaxed));

	let handle_md = handle.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			handle_md.with(|e| e.pointer_down(x, y));
		}
	};

	let handle_mm = handle.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			handle_mm.with(|e| e.pointer_move(x, y));
		}
	};

	let handle_mu = handle.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		notify(handle_mu.with(|e| e.pointer_up(x, y)).flatten());
	};

	let handle_ml = handle.clone();
	let on_mouseleave = move |_: MouseEvent| {
		handle_ml.with(|e| e.pointer_leave());
	};

	let handle_dbl = handle.clone();
	let on_dblclick = move |ev: MouseEvent| {
		ev.prevent_default();
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			handle_dbl.with(|e| e.double_click(x, y));
		}
	};

	let handle_wh = handle;
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			handle_wh.with(|e| e.wheel(ev.delta_y(), x, y));
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="dependency-graph-canvas"
			tabindex="0"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
