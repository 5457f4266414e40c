//! Vector and raster serialization of the current scene.

use std::fmt::Write as _;

use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::scene::{
	ARROW_SIZE, BACKGROUND, EMPTY_MESSAGE, LABEL_COLOR, PIN_COLOR, SEARCH_RING, SELECTION_RING,
	Scene,
};

/// Download name of the SVG export.
pub const SVG_FILE_NAME: &str = "dependency-graph.svg";
/// Download name of the PNG export.
pub const PNG_FILE_NAME: &str = "dependency-graph.png";

/// Failures while exporting or downloading the graph.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
	/// The generated SVG did not parse.
	#[error("failed to parse SVG")]
	SvgParse,
	/// Zero or oversized raster dimensions.
	#[error("failed to allocate pixmap for raster rendering")]
	PixmapAlloc,
	/// PNG encoding failed.
	#[error("failed to encode PNG")]
	PngEncode,
	/// Built without the `raster` feature.
	#[error("raster export is not available in this build")]
	RasterUnavailable,
	/// The browser refused the download.
	#[error("browser download failed: {0}")]
	Download(String),
}

/// Result alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// A file ready to be offered to the user.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedFile {
	/// Suggested download name.
	pub name: &'static str,
	/// MIME type for the download blob.
	pub mime: &'static str,
	/// File contents.
	pub bytes: Vec<u8>,
}

fn escape_xml_into(out: &mut String, text: &str) {
	for ch in text.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(ch),
		}
	}
}

/// Serialize the scene as a standalone SVG document at on-screen size.
pub fn scene_to_svg(scene: &Scene) -> String {
	let mut out = String::with_capacity(256 + scene.nodes.len() * 200 + scene.edges.len() * 120);
	let (w, h) = (scene.width.max(1.0), scene.height.max(1.0));
	let _ = write!(
		out,
		r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
	);

	if scene.is_empty() {
		let _ = write!(
			out,
			r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-family="sans-serif" font-size="14" fill="{LABEL_COLOR}">{EMPTY_MESSAGE}</text></svg>"#,
			w / 2.0,
			h / 2.0
		);
		return out;
	}

	if scene.show_arrows {
		let _ = write!(
			out,
			r#"<defs><marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="{ARROW_SIZE}" markerHeight="{ARROW_SIZE}" orient="auto-start-reverse"><path d="M0,0L10,5L0,10z" fill="{}"/></marker></defs>"#,
			"#6b7280"
		);
	}

	let t = scene.transform;
	let _ = write!(
		out,
		r#"<g transform="translate({:.3},{:.3}) scale({:.4})">"#,
		t.x, t.y, t.k
	);

	out.push_str(r#"<g class="edges">"#);
	for edge in &scene.edges {
		let _ = write!(
			out,
			r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{}" stroke-opacity="{}""#,
			edge.x1, edge.y1, edge.x2, edge.y2, edge.color, edge.width, edge.opacity
		);
		if scene.show_arrows {
			out.push_str(r#" marker-end="url(#arrow)""#);
		}
		out.push_str("/>");
	}
	out.push_str("</g>");

	out.push_str(r#"<g class="nodes">"#);
	for node in &scene.nodes {
		let (x, y, r) = (node.x, node.y, node.radius);
		out.push_str(r#"<g data-id=""#);
		escape_xml_into(&mut out, &node.id);
		let _ = write!(out, r#"" opacity="{}">"#, node.opacity);
		let _ = write!(
			out,
			r#"<circle cx="{x:.2}" cy="{y:.2}" r="{r:.2}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
			node.fill, node.stroke, node.stroke_width
		);
		if node.search_match {
			let _ = write!(
				out,
				r#"<circle cx="{x:.2}" cy="{y:.2}" r="{:.2}" fill="none" stroke="{SEARCH_RING}" stroke-width="2"/>"#,
				r + 4.0
			);
		}
		if node.selected {
			let _ = write!(
				out,
				r#"<circle cx="{x:.2}" cy="{y:.2}" r="{:.2}" fill="none" stroke="{SELECTION_RING}" stroke-width="2"/>"#,
				r + 2.0
			);
		}
		if node.pinned {
			let _ = write!(
				out,
				r#"<circle cx="{:.2}" cy="{:.2}" r="3" fill="{PIN_COLOR}"/>"#,
				x + r * 0.7,
				y - r * 0.7
			);
		}
		if let Some(label) = &node.label {
			let _ = write!(
				out,
				r#"<text x="{x:.2}" y="{:.2}" text-anchor="middle" font-family="sans-serif" font-size="10" fill="{LABEL_COLOR}">"#,
				y + r + 12.0
			);
			escape_xml_into(&mut out, label);
			out.push_str("</text>");
		}
		out.push_str("</g>");
	}
	out.push_str("</g></g></svg>");
	out
}

/// `data:` URL for the SVG, base64-encoded from its UTF-8 bytes so
/// non-ASCII names survive an image decoder round trip.
pub fn svg_data_url(svg: &str) -> String {
	format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()))
}

/// Vector export; `None` for an empty graph.
pub fn export_svg(scene: &Scene) -> Option<ExportedFile> {
	if scene.is_empty() {
		return None;
	}
	Some(ExportedFile {
		name: SVG_FILE_NAME,
		mime: "image/svg+xml",
		bytes: scene_to_svg(scene).into_bytes(),
	})
}

/// Raster export on the dark background; `None` for an empty graph.
pub fn export_png(scene: &Scene) -> Result<Option<ExportedFile>> {
	if scene.is_empty() {
		return Ok(None);
	}
	let svg = scene_to_svg(scene);
	let bytes = svg_to_png(
		&svg,
		scene.width.round().max(1.0) as u32,
		scene.height.round().max(1.0) as u32,
	)?;
	Ok(Some(ExportedFile {
		name: PNG_FILE_NAME,
		mime: "image/png",
		bytes,
	}))
}

/// Bundled so labels rasterize the same everywhere; the browser build has
/// no access to system fonts.
#[cfg(feature = "raster")]
const LABEL_FONT: &[u8] = include_bytes!("../../../assets/DejaVuSans.ttf");
#[cfg(feature = "raster")]
const LABEL_FONT_FAMILY: &str = "DejaVu Sans";

/// Rasterize an SVG document onto the dark background at `width` x `height`.
#[cfg(feature = "raster")]
pub fn svg_to_png(svg: &str, width: u32, height: u32) -> Result<Vec<u8>> {
	use resvg::{tiny_skia, usvg};

	let mut opt = usvg::Options {
		font_family: LABEL_FONT_FAMILY.to_string(),
		..usvg::Options::default()
	};
	let fontdb = opt.fontdb_mut();
	fontdb.load_font_data(LABEL_FONT.to_vec());
	fontdb.set_sans_serif_family(LABEL_FONT_FAMILY);
	// extra coverage for scripts the bundled face lacks
	#[cfg(not(target_arch = "wasm32"))]
	fontdb.load_system_fonts();

	// Parsed from bytes, never from a lossy string re-encoding.
	let tree = usvg::Tree::from_data(svg.as_bytes(), &opt).map_err(|_| ExportError::SvgParse)?;

	let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(ExportError::PixmapAlloc)?;
	let [r, g, b] = background_rgb();
	pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));

	let size = tree.size();
	let transform = tiny_skia::Transform::from_scale(
		width as f32 / size.width().max(1.0),
		height as f32 / size.height().max(1.0),
	);
	resvg::render(&tree, transform, &mut pixmap.as_mut());
	pixmap.encode_png().map_err(|_| ExportError::PngEncode)
}

/// Rasterization is compiled out; always fails.
#[cfg(not(feature = "raster"))]
pub fn svg_to_png(_svg: &str, _width: u32, _height: u32) -> Result<Vec<u8>> {
	Err(ExportError::RasterUnavailable)
}

fn background_rgb() -> [u8; 3] {
	let hex = BACKGROUND.trim_start_matches('#');
	let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2).unwrap_or("00"), 16).unwrap_or(0);
	[channel(0), channel(2), channel(4)]
}
