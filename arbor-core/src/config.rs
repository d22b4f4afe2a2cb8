//! Engine configuration.
//!
//! Every field has a default, so hosts may pass a partial JSON object (or
//! none at all) to override only what they need.

use serde::Deserialize;

use crate::animation::DEFAULT_TRANSITION_MS;
use crate::error::{EngineError, Result};
use crate::layout::{LayoutConfig, LinkAnchor};
use crate::viewport::{MAX_SCALE, MIN_SCALE};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Container widths below this use the compact preset.
    pub breakpoint: f64,
    /// Container heights are raised to at least this.
    pub min_height: f64,
    pub wide: LayoutConfig,
    pub compact: LayoutConfig,
    /// Applied to both presets.
    pub link_anchor: LinkAnchor,
    pub transition_ms: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            breakpoint: 600.0,
            min_height: 600.0,
            wide: LayoutConfig::wide(),
            compact: LayoutConfig::compact(),
            link_anchor: LinkAnchor::Card,
            transition_ms: DEFAULT_TRANSITION_MS,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config; an empty string means all defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the viewport and layout cannot work with.
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.min_scale) || !positive(self.max_scale) {
            return Err(EngineError::InvalidConfig(format!(
                "scale bounds must be positive, got [{}, {}]",
                self.min_scale, self.max_scale
            )));
        }
        if self.min_scale > self.max_scale {
            return Err(EngineError::InvalidConfig(format!(
                "min_scale {} exceeds max_scale {}",
                self.min_scale, self.max_scale
            )));
        }
        for (name, preset) in [("wide", &self.wide), ("compact", &self.compact)] {
            if !positive(preset.card_width) || !positive(preset.card_height) {
                return Err(EngineError::InvalidConfig(format!("{} card size must be positive", name)));
            }
        }
        if self.transition_ms.is_nan() || self.transition_ms < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "transition_ms must be non-negative, got {}",
                self.transition_ms
            )));
        }
        Ok(())
    }

    pub fn wide_layout(&self) -> LayoutConfig {
        LayoutConfig { link_anchor: self.link_anchor, ..self.wide.clone() }
    }

    pub fn compact_layout(&self) -> LayoutConfig {
        LayoutConfig { link_anchor: self.link_anchor, ..self.compact.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json(r#"{"transition_ms": 250, "link_anchor": "point"}"#).unwrap();
        assert_eq!(cfg.transition_ms, 250.0);
        assert_eq!(cfg.breakpoint, 600.0);
        assert_eq!(cfg.compact_layout().link_anchor, LinkAnchor::Point);
        assert_eq!(cfg.wide_layout().card_width, 260.0);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(EngineConfig::from_json("  ").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_non_positive_scale_bounds_rejected() {
        for json in [
            r#"{"min_scale": 0}"#,
            r#"{"min_scale": -1}"#,
            r#"{"max_scale": 0}"#,
            r#"{"min_scale": 2, "max_scale": 1}"#,
        ] {
            assert!(
                matches!(EngineConfig::from_json(json), Err(EngineError::InvalidConfig(_))),
                "accepted {}",
                json
            );
        }
        assert!(EngineConfig::from_json(r#"{"min_scale": 0.5, "max_scale": 4}"#).is_ok());
    }

    #[test]
    fn test_zero_card_size_rejected() {
        let json = r#"{"compact": {"card_width": 0, "card_height": 100, "h_gap": 40, "v_gap": 20, "margin_left": 60}}"#;
        assert!(matches!(EngineConfig::from_json(json), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_json_errors() {
        assert!(EngineConfig::from_json("{breakpoint:").is_err());
    }
}
