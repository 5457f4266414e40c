use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::scene::{
	ARROW_SIZE, BACKGROUND, EMPTY_MESSAGE, LABEL_COLOR, PIN_COLOR, SEARCH_RING, SELECTION_RING,
	Scene, Tooltip,
};

const TOOLTIP_BG: &str = "rgba(17, 24, 39, 0.95)";
const TOOLTIP_BORDER: &str = "#374151";
const TOOLTIP_MUTED: &str = "#9ca3af";
const TOOLTIP_LINE: f64 = 16.0;

pub fn render(scene: &Scene, tooltip: Option<&Tooltip>, ctx: &CanvasRenderingContext2d) {
	ctx.set_global_alpha(1.0);
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, scene.width, scene.height);

	if scene.is_empty() {
		ctx.set_fill_style_str(LABEL_COLOR);
		ctx.set_font("14px sans-serif");
		ctx.set_text_align("center");
		let _ = ctx.fill_text(EMPTY_MESSAGE, scene.width / 2.0, scene.height / 2.0);
		ctx.set_text_align("start");
		return;
	}

	let t = scene.transform;
	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_edges(scene, ctx);
	draw_nodes(scene, ctx);
	ctx.restore();

	if let Some(tooltip) = tooltip {
		draw_tooltip(tooltip, scene, ctx);
	}
}

fn draw_edges(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	for edge in &scene.edges {
		let (dx, dy) = (edge.x2 - edge.x1, edge.y2 - edge.y1);
		let dist = dx.hypot(dy);
		if dist < 0.001 {
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		let head = if scene.show_arrows { ARROW_SIZE.min(dist) } else { 0.0 };

		ctx.set_global_alpha(edge.opacity);
		ctx.set_stroke_style_str(edge.color);
		ctx.set_line_width(edge.width);
		ctx.begin_path();
		ctx.move_to(edge.x1, edge.y1);
		ctx.line_to(edge.x2 - ux * head, edge.y2 - uy * head);
		ctx.stroke();

		if scene.show_arrows {
			let (back_x, back_y) = (edge.x2 - ux * head, edge.y2 - uy * head);
			let (px, py) = (-uy * head * 0.5, ux * head * 0.5);
			ctx.set_fill_style_str(edge.color);
			ctx.begin_path();
			ctx.move_to(edge.x2, edge.y2);
			ctx.line_to(back_x + px, back_y + py);
			ctx.line_to(back_x - px, back_y - py);
			ctx.close_path();
			ctx.fill();
		}
	}
	ctx.set_global_alpha(1.0);
}

fn ring(ctx: &CanvasRenderingContext2d, x: f64, y: f64, r: f64, color: &str, width: f64) {
	ctx.begin_path();
	let _ = ctx.arc(x, y, r, 0.0, 2.0 * PI);
	ctx.set_stroke_style_str(color);
	ctx.set_line_width(width);
	ctx.stroke();
}

fn draw_nodes(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	let k = scene.transform.k;
	ctx.set_text_align("center");
	for node in &scene.nodes {
		let (x, y, r) = (node.x, node.y, node.radius);
		ctx.set_global_alpha(node.opacity);

		ctx.begin_path();
		let _ = ctx.arc(x, y, r, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.fill);
		ctx.fill();
		ctx.set_stroke_style_str(node.stroke);
		ctx.set_line_width(node.stroke_width);
		ctx.stroke();

		if node.search_match {
			ring(ctx, x, y, r + 4.0, SEARCH_RING, 2.0);
		}
		if node.selected {
			ring(ctx, x, y, r + 2.0, SELECTION_RING, 2.0);
		}
		if node.pinned {
			ctx.begin_path();
			let _ = ctx.arc(x + r * 0.7, y - r * 0.7, 3.0, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(PIN_COLOR);
			ctx.fill();
		}
		if let Some(label) = &node.label {
			ctx.set_fill_style_str(LABEL_COLOR);
			ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
			let _ = ctx.fill_text(label, x, y + r + 12.0);
		}
	}
	ctx.set_text_align("start");
	ctx.set_global_alpha(1.0);
}

/// Hover card in screen space, flipped to stay inside the canvas.
fn draw_tooltip(tooltip: &Tooltip, scene: &Scene, ctx: &CanvasRenderingContext2d) {
	let mut lines = vec![
		(tooltip.name.clone(), LABEL_COLOR),
		(tooltip.address.clone(), TOOLTIP_MUTED),
		(
			format!(
				"{} · {}",
				tooltip.network,
				if tooltip.verified { "verified" } else { "unverified" }
			),
			TOOLTIP_MUTED,
		),
	];
	if let Some(category) = &tooltip.category {
		lines.push((category.clone(), TOOLTIP_MUTED));
	}
	lines.push((format!("{} dependents", tooltip.dependents), TOOLTIP_MUTED));

	let longest = lines.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
	let (w, h) = (longest as f64 * 7.0 + 20.0, lines.len() as f64 * TOOLTIP_LINE + 12.0);
	let mut x = tooltip.x + 14.0;
	let mut y = tooltip.y + 14.0;
	if x + w > scene.width {
		x = tooltip.x - w - 14.0;
	}
	if y + h > scene.height {
		y = tooltip.y - h - 14.0;
	}

	ctx.set_fill_style_str(TOOLTIP_BG);
	ctx.fill_rect(x, y, w, h);
	ctx.set_stroke_style_str(TOOLTIP_BORDER);
	ctx.set_line_width(1.0);
	ctx.stroke_rect(x, y, w, h);

	ctx.set_font("12px sans-serif");
	for (i, (line, color)) in lines.iter().enumerate() {
		ctx.set_fill_style_str(color);
		let _ = ctx.fill_text(line, x + 10.0, y + 6.0 + TOOLTIP_LINE * (i as f64 + 0.75));
	}
}
