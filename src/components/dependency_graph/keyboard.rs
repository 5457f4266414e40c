//! Keyboard shortcuts, kept free of DOM types.

use super::viewport::PanDirection;

/// Action bound to a keyboard shortcut.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
	/// `+` or `=`.
	ZoomIn,
	/// `-`.
	ZoomOut,
	/// `r`: reset zoom.
	Reset,
	/// Arrow keys.
	Pan(PanDirection),
	/// Escape.
	ClearSelection,
}

/// Map a `KeyboardEvent.key` value to a command.
///
/// Shortcuts are suppressed entirely while the user is typing in a text field.
pub fn key_command(key: &str, editing_text: bool) -> Option<KeyCommand> {
	if editing_text {
		return None;
	}
	match key {
		"+" | "=" => Some(KeyCommand::ZoomIn),
		"-" => Some(KeyCommand::ZoomOut),
		"r" | "R" => Some(KeyCommand::Reset),
		"ArrowUp" => Some(KeyCommand::Pan(PanDirection::Up)),
		"ArrowDown" => Some(KeyCommand::Pan(PanDirection::Down)),
		"ArrowLeft" => Some(KeyCommand::Pan(PanDirection::Left)),
		"ArrowRight" => Some(KeyCommand::Pan(PanDirection::Right)),
		"Escape" => Some(KeyCommand::ClearSelection),
		_ => None,
	}
}

/// Whether an element with this tag name captures typing.
pub fn is_text_entry(tag_name: &str, content_editable: bool) -> bool {
	content_editable
		|| tag_name.eq_ignore_ascii_case("input")
		|| tag_name.eq_ignore_ascii_case("textarea")
		|| tag_name.eq_ignore_ascii_case("select")
}
