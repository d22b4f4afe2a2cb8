// Link geometry.
//
// Links read left-to-right: a horizontal cubic from the parent anchor to the
// child anchor, both control points on the vertical line halfway between.

use serde::Serialize;

use super::{LayoutConfig, LinkAnchor, PointF};

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct CubicLink {
    pub start: PointF,
    pub c1: PointF,
    pub c2: PointF,
    pub end: PointF,
}

impl CubicLink {
    pub fn horizontal(start: PointF, end: PointF) -> Self {
        let mid_x = (start.x + end.x) / 2.0;
        CubicLink {
            start,
            c1: PointF { x: mid_x, y: start.y },
            c2: PointF { x: mid_x, y: end.y },
            end,
        }
    }

    /// Degenerate curve sitting on a single point. Entering links grow out of
    /// one and exiting links shrink into one.
    pub fn collapsed(at: PointF) -> Self {
        CubicLink { start: at, c1: at, c2: at, end: at }
    }

    /// Point on the curve, `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> PointF {
        let u = 1.0 - t;
        let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
        PointF {
            x: a * self.start.x + b * self.c1.x + c * self.c2.x + d * self.end.x,
            y: a * self.start.y + b * self.c1.y + c * self.c2.y + d * self.end.y,
        }
    }

    pub fn to_svg_path(&self) -> String {
        format!(
            "M{},{}C{},{} {},{} {},{}",
            self.start.x, self.start.y, self.c1.x, self.c1.y, self.c2.x, self.c2.y, self.end.x, self.end.y
        )
    }
}

/// Where a link leaves the parent.
pub fn parent_anchor(cfg: &LayoutConfig, parent: PointF) -> PointF {
    match cfg.link_anchor {
        LinkAnchor::Card => PointF { x: parent.x + cfg.card_width, y: parent.y },
        LinkAnchor::Point => parent,
    }
}

/// Link between two laid-out node positions.
pub fn link_between(cfg: &LayoutConfig, parent: PointF, child: PointF) -> CubicLink {
    CubicLink::horizontal(parent_anchor(cfg, parent), child)
}
