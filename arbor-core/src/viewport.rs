//! Pan/zoom transform applied on top of the laid-out scene.
//!
//! The transform is composed after layout, so gestures only ever change
//! these three numbers and never cause a re-layout. Scale is clamped on
//! every write.

use std::fmt;

use serde::Serialize;

use crate::layout::PointF;

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 3.0;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ViewportTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl ViewportTransform {
    pub const IDENTITY: Self = Self { translate_x: 0.0, translate_y: 0.0, scale: 1.0 };

    /// Layout space -> screen space.
    pub fn apply(&self, p: PointF) -> PointF {
        PointF {
            x: p.x * self.scale + self.translate_x,
            y: p.y * self.scale + self.translate_y,
        }
    }

    /// Screen space -> layout space.
    pub fn invert(&self, p: PointF) -> PointF {
        PointF {
            x: (p.x - self.translate_x) / self.scale,
            y: (p.y - self.translate_y) / self.scale,
        }
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// SVG `transform` attribute value.
impl fmt::Display for ViewportTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "translate({},{}) scale({})", self.translate_x, self.translate_y, self.scale)
    }
}

/// How a wheel event's delta is measured (DOM `WheelEvent.deltaMode`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WheelDeltaMode {
    Pixel,
    Line,
    Page,
}

impl WheelDeltaMode {
    pub fn from_dom(mode: u32) -> Self {
        match mode {
            1 => WheelDeltaMode::Line,
            2 => WheelDeltaMode::Page,
            _ => WheelDeltaMode::Pixel,
        }
    }

    fn factor(self) -> f64 {
        match self {
            WheelDeltaMode::Pixel => 0.002,
            WheelDeltaMode::Line => 0.05,
            WheelDeltaMode::Page => 1.0,
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct Drag {
    pointer: PointF,
    translate: PointF,
}

type Listener = Box<dyn FnMut(&ViewportTransform)>;

pub struct ViewportController {
    transform: ViewportTransform,
    min_scale: f64,
    max_scale: f64,
    drag: Option<Drag>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for ViewportController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportController")
            .field("transform", &self.transform)
            .field("min_scale", &self.min_scale)
            .field("max_scale", &self.max_scale)
            .field("dragging", &self.drag.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(MIN_SCALE, MAX_SCALE)
    }
}

impl ViewportController {
    /// Bounds that are not positive and finite fall back to the defaults.
    pub fn new(min_scale: f64, max_scale: f64) -> Self {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        let min_scale = if usable(min_scale) { min_scale } else { MIN_SCALE };
        let max_scale = if usable(max_scale) { max_scale } else { MAX_SCALE };
        let (min_scale, max_scale) = if min_scale <= max_scale { (min_scale, max_scale) } else { (max_scale, min_scale) };
        Self {
            transform: ViewportTransform::IDENTITY,
            min_scale,
            max_scale,
            drag: None,
            listeners: Vec::new(),
        }
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn scale_extent(&self) -> (f64, f64) {
        (self.min_scale, self.max_scale)
    }

    /// Register a callback run after every transform change.
    pub fn on_transform(&mut self, callback: impl FnMut(&ViewportTransform) + 'static) {
        self.listeners.push(Box::new(callback));
    }

    /// Put the root at `(margin_left, height / 2)` on screen, scale 1.
    pub fn center_on(&mut self, root: PointF, margin_left: f64, height: f64) {
        self.drag = None;
        self.set(ViewportTransform {
            translate_x: margin_left - root.x,
            translate_y: height / 2.0 - root.y,
            scale: 1.0,
        });
    }

    /// Replace the transform; scale is clamped, non-finite parts are ignored.
    pub fn set(&mut self, t: ViewportTransform) {
        let current = self.transform;
        let pick = |v: f64, old: f64| if v.is_finite() { v } else { old };
        self.transform = ViewportTransform {
            translate_x: pick(t.translate_x, current.translate_x),
            translate_y: pick(t.translate_y, current.translate_y),
            scale: self.clamp_scale(pick(t.scale, current.scale)),
        };
        self.notify();
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let t = self.transform;
        self.set(ViewportTransform { translate_x: t.translate_x + dx, translate_y: t.translate_y + dy, ..t });
    }

    /// Multiply the scale by `factor`, keeping the screen point `anchor` fixed.
    /// Factors that overflow to infinity or underflow to zero land on the
    /// nearest scale bound.
    pub fn zoom_at(&mut self, factor: f64, anchor: PointF) {
        if factor.is_nan() || factor < 0.0 {
            return;
        }
        let t = self.transform;
        let scale = self.clamp_scale(t.scale * factor);
        let fixed = t.invert(anchor);
        self.set(ViewportTransform {
            translate_x: anchor.x - fixed.x * scale,
            translate_y: anchor.y - fixed.y * scale,
            scale,
        });
    }

    /// Wheel zoom at the pointer: `2^(-delta_y * mode factor * (10 if ctrl))`.
    pub fn wheel(&mut self, delta_y: f64, mode: WheelDeltaMode, ctrl_key: bool, anchor: PointF) {
        let boost = if ctrl_key { 10.0 } else { 1.0 };
        let delta = -delta_y * mode.factor() * boost;
        self.zoom_at(2f64.powf(delta), anchor);
    }

    /// Two-finger pinch: scale by the ratio of finger distances.
    pub fn pinch(&mut self, previous_distance: f64, distance: f64, midpoint: PointF) {
        if previous_distance <= 0.0 || distance <= 0.0 {
            return;
        }
        self.zoom_at(distance / previous_distance, midpoint);
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        let t = self.transform;
        self.drag = Some(Drag {
            pointer: PointF { x, y },
            translate: PointF { x: t.translate_x, y: t.translate_y },
        });
    }

    /// Pan while a pointer is held; ignored otherwise.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let Some(drag) = self.drag else { return };
        let t = self.transform;
        self.set(ViewportTransform {
            translate_x: drag.translate.x + (x - drag.pointer.x),
            translate_y: drag.translate.y + (y - drag.pointer.y),
            ..t
        });
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_scale, self.max_scale)
    }

    fn notify(&mut self) {
        let t = self.transform;
        for listener in self.listeners.iter_mut() {
            listener(&t);
        }
    }
}
