// sizing.rs
//
// Container size tracking.
//
// Every real change of the container box produces a fresh LayoutConfig:
// the compact preset below the breakpoint, the wide one otherwise. Crossing
// the breakpoint is not required for a new config, since card spacing feeds
// the layout directly. Degenerate sizes are dropped and the last good size
// stays in effect.

use log::warn;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::layout::LayoutConfig;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Result of an accepted size change.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeChange {
    pub dimensions: Dimensions,
    pub layout: LayoutConfig,
    /// The change moved across the breakpoint.
    pub crossed_breakpoint: bool,
}

#[derive(Debug, Clone)]
pub struct ResponsiveSizing {
    breakpoint: f64,
    min_height: f64,
    wide: LayoutConfig,
    compact: LayoutConfig,
    current: Option<Dimensions>,
}

impl ResponsiveSizing {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            breakpoint: config.breakpoint,
            min_height: config.min_height,
            wide: config.wide_layout(),
            compact: config.compact_layout(),
            current: None,
        }
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.current
    }

    pub fn is_compact(&self, width: f64) -> bool {
        width < self.breakpoint
    }

    pub fn layout_for(&self, width: f64) -> LayoutConfig {
        if self.is_compact(width) { self.compact.clone() } else { self.wide.clone() }
    }

    /// Layout config for the last accepted size, or the wide preset before
    /// the first observation.
    pub fn current_layout(&self) -> LayoutConfig {
        match self.current {
            Some(d) => self.layout_for(d.width),
            None => self.wide.clone(),
        }
    }

    /// Feed a container size. Returns `None` when nothing changed or the
    /// size is unusable.
    pub fn observe(&mut self, width: f64, height: f64) -> Option<SizeChange> {
        let raw = Dimensions { width, height };
        if !raw.is_usable() {
            warn!("ignoring container size {}x{}", width, height);
            return None;
        }
        let dimensions = Dimensions { width, height: height.max(self.min_height) };
        if self.current == Some(dimensions) {
            return None;
        }
        let crossed_breakpoint = match self.current {
            Some(prev) => self.is_compact(prev.width) != self.is_compact(width),
            None => false,
        };
        self.current = Some(dimensions);
        Some(SizeChange { dimensions, layout: self.layout_for(width), crossed_breakpoint })
    }
}
