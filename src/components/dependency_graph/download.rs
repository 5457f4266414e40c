//! Browser glue that hands an exported file to the user.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use super::export::{ExportError, ExportedFile, Result};

fn js_err(err: JsValue) -> ExportError {
	ExportError::Download(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

/// Wrap the bytes in a Blob and click a temporary `<a download>` for it.
pub fn offer_download(file: &ExportedFile) -> Result<()> {
	let window = web_sys::window().ok_or_else(|| ExportError::Download("no window".into()))?;
	let document = window
		.document()
		.ok_or_else(|| ExportError::Download("no document".into()))?;

	let bytes = js_sys::Uint8Array::from(file.bytes.as_slice());
	let parts = js_sys::Array::of1(&bytes);
	let options = BlobPropertyBag::new();
	options.set_type(file.mime);
	let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(js_err)?;
	let url = Url::create_object_url_with_blob(&blob).map_err(js_err)?;

	let anchor: HtmlAnchorElement = document
		.create_element("a")
		.map_err(js_err)?
		.dyn_into()
		.map_err(|_| ExportError::Download("anchor element cast".into()))?;
	anchor.set_href(&url);
	anchor.set_download(file.name);
	anchor.click();

	let _ = Url::revoke_object_url(&url);
	log::debug!("offered {} ({} bytes)", file.name, file.bytes.len());
	Ok(())
}
