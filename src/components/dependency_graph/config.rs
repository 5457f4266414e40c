use serde::Deserialize;

use super::policy::ForceParams;
use super::viewport::ViewConfig;

/// Host-tunable engine settings. Everything has a default, so `{}` is valid.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Viewport animation and step sizes.
	pub view: ViewConfig,
	/// Replaces the size-tier force defaults when set.
	pub force: Option<ForceParams>,
}

impl EngineConfig {
	/// Parse a config where every field is optional.
	pub fn from_json(json: &str) -> serde_json::Result<Self> {
		serde_json::from_str(json)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_config_uses_defaults() {
		let config = EngineConfig::from_json("{}").unwrap();
		assert_eq!(config, EngineConfig::default());
		assert_eq!(config.view.pan_step, 100.0);
	}

	#[test]
	fn overrides_nested_fields() {
		let config = EngineConfig::from_json(
			r#"{"view": {"transition_ms": 0}, "force": {"charge_strength": -30.0}}"#,
		)
		.unwrap();
		assert_eq!(config.view.transition_ms, 0.0);
		assert_eq!(config.view.zoom_step, 1.3);
		assert_eq!(config.force.map(|f| f.charge_strength), Some(-30.0));
	}
}
