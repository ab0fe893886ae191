//! Edge shapes for a circular layout.
//!
//! Two opposite edges between neighbouring states would otherwise be drawn on top of each other.
//! They are told apart by their direction around the circle: the edge that runs against the node
//! order (`(i - j) mod N == 1`) is pushed outward and bent the other way, the edge that runs with
//! it (`(j - i) mod N == 1`) stays on the circle and keeps its label inside. Chords between
//! non-neighbours keep the default bend. Self pairs become small open arcs outside the node.
//!
//! Curves are quadratic Béziers in matplotlib's `arc3` convention: the control point sits at the
//! chord midpoint offset by `rad * (dy, -dx)`.

use crate::config::GeometryConfig;
use crate::error::Result;
use crate::layout::CircularLayout;
use crate::model::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    Loop,
    Outer,
    Inner,
    /// Two-state layouts, where each edge is both outer and inner.
    Mutual,
    Plain,
}

/// Position of a directed edge relative to the cyclic node order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Adjacency {
    /// The target immediately precedes the source.
    pub outer: bool,
    /// The target immediately follows the source.
    pub inner: bool,
}

impl Adjacency {
    pub fn classify(i: usize, j: usize, n: usize) -> Self {
        if n == 0 {
            return Self::default();
        }
        let (i, j, n) = (i as i64, j as i64, n as i64);
        Self {
            outer: (i - j).rem_euclid(n) == 1,
            inner: (j - i).rem_euclid(n) == 1,
        }
    }

    pub fn kind(self) -> CurveKind {
        match (self.outer, self.inner) {
            (true, true) => CurveKind::Mutual,
            (true, false) => CurveKind::Outer,
            (false, true) => CurveKind::Inner,
            (false, false) => CurveKind::Plain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveGeometry {
    pub kind: CurveKind,
    pub adjacency: Adjacency,
    pub source_angle: f64,
    pub target_angle: f64,
    pub start: Point,
    pub end: Point,
    pub control: Point,
    /// Signed `arc3` bend.
    pub curvature: f64,
    /// Factor the endpoints were pushed out by (1 unless outer).
    pub stretch: f64,
    pub shrink_start: f64,
    pub shrink_end: f64,
    /// Explicit label base replacing the control point (two-state layouts only).
    pub label_override: Option<Point>,
    /// Scaled from `control` (or `label_override`) of the full curve, before any shrink.
    pub label_anchor: Point,
}

impl CurveGeometry {
    /// Point on the quadratic curve at `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> Point {
        let a = self.start.lerp(self.control, t);
        let b = self.control.lerp(self.end, t);
        a.lerp(b, t)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopGeometry {
    pub angle: f64,
    pub center: Point,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    /// Number of points the arc is drawn with.
    pub samples: usize,
    pub label_anchor: Point,
}

impl LoopGeometry {
    /// The arc sampled at its own `samples` count.
    pub fn polyline(&self) -> Vec<Point> {
        self.points(self.samples)
    }

    /// `samples` evenly spaced points from `start_angle` to `end_angle`; the arrow tip is last.
    pub fn points(&self, samples: usize) -> Vec<Point> {
        let samples = samples.max(2);
        let step = (self.end_angle - self.start_angle) / (samples - 1) as f64;
        (0..samples)
            .map(|k| {
                let theta = self.start_angle + step * k as f64;
                let p = Point::polar(self.radius, theta);
                Point::new(self.center.x + p.x, self.center.y + p.y)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum EdgeGeometry {
    Curve(CurveGeometry),
    Loop(LoopGeometry),
}

impl EdgeGeometry {
    pub fn kind(&self) -> CurveKind {
        match self {
            EdgeGeometry::Curve(c) => c.kind,
            EdgeGeometry::Loop(_) => CurveKind::Loop,
        }
    }

    pub fn label_anchor(&self) -> Point {
        match self {
            EdgeGeometry::Curve(c) => c.label_anchor,
            EdgeGeometry::Loop(l) => l.label_anchor,
        }
    }

    pub fn as_curve(&self) -> Option<&CurveGeometry> {
        match self {
            EdgeGeometry::Curve(c) => Some(c),
            EdgeGeometry::Loop(_) => None,
        }
    }

    pub fn as_loop(&self) -> Option<&LoopGeometry> {
        match self {
            EdgeGeometry::Loop(l) => Some(l),
            EdgeGeometry::Curve(_) => None,
        }
    }
}

/// `arc3` control point for a chord from `start` to `end`.
pub fn arc3_control(start: Point, end: Point, rad: f64) -> Point {
    let mid = start.lerp(end, 0.5);
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    Point::new(mid.x + rad * dy, mid.y - rad * dx)
}

pub struct EdgeGeometryPlanner<'a> {
    layout: &'a CircularLayout,
    config: &'a GeometryConfig,
}

impl<'a> EdgeGeometryPlanner<'a> {
    pub fn new(layout: &'a CircularLayout, config: &'a GeometryConfig) -> Self {
        Self { layout, config }
    }

    pub fn plan(&self, source: &str, target: &str) -> Result<EdgeGeometry> {
        let order = self.layout.order();
        let i = order.require(source)?;
        let j = order.require(target)?;
        Ok(self.plan_indices(i, j))
    }

    fn plan_indices(&self, i: usize, j: usize) -> EdgeGeometry {
        if i == j {
            EdgeGeometry::Loop(self.self_loop(i))
        } else {
            EdgeGeometry::Curve(self.curve(i, j))
        }
    }

    fn angle(&self, i: usize) -> f64 {
        self.layout.angles()[i]
    }

    fn self_loop(&self, i: usize) -> LoopGeometry {
        let cfg = self.config;
        let r = self.layout.radius();
        let angle = self.angle(i);
        let center = Point::polar(cfg.loop_stretch * r, angle);
        LoopGeometry {
            angle,
            center,
            radius: cfg.loop_radius * r,
            start_angle: angle - PI + cfg.loop_gap,
            end_angle: angle + PI - cfg.loop_gap,
            samples: cfg.loop_samples.max(2),
            label_anchor: center.scale(cfg.loop_stretch),
        }
    }

    fn curve(&self, i: usize, j: usize) -> CurveGeometry {
        let cfg = self.config;
        let n = self.layout.len();
        let r = self.layout.radius();
        let adjacency = Adjacency::classify(i, j, n);
        let (source_angle, target_angle) = (self.angle(i), self.angle(j));

        let (stretch, curvature, shrink) = if adjacency.outer {
            (
                cfg.stretch_outer,
                -cfg.curvature,
                cfg.shrink * cfg.stretch_outer.powi(2),
            )
        } else {
            (1.0, cfg.curvature, cfg.shrink)
        };

        let start = Point::polar(r * stretch, source_angle);
        let end = Point::polar(r * stretch, target_angle);
        let control = arc3_control(start, end, curvature);

        // With two states the curves coincide in shape, so labels alternate sides of the chord.
        let label_override = (n == 2).then(|| {
            let side = if i % 2 == 0 { 1.0 } else { -1.0 };
            Point::polar(r, self.layout.rotation() - FRAC_PI_2 * side)
        });
        let label_scale = if adjacency.inner {
            cfg.stretch_inner
        } else {
            cfg.label_stretch
        };
        let label_anchor = label_override.unwrap_or(control).scale(label_scale);

        CurveGeometry {
            kind: adjacency.kind(),
            adjacency,
            source_angle,
            target_angle,
            start,
            end,
            control,
            curvature,
            stretch,
            shrink_start: shrink,
            shrink_end: shrink,
            label_override,
            label_anchor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::NodeOrder;

    fn layout(states: &[&str]) -> CircularLayout {
        CircularLayout::new(NodeOrder::from_states(states.iter().copied()), 0.0, 1.0)
    }

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn arc3_offsets_control_by_rotated_chord() {
        let c = arc3_control(Point::new(0.0, 0.0), Point::new(2.0, 0.0), 0.5);
        assert!(close(c, Point::new(1.0, -1.0)));
    }

    #[test]
    fn outer_edge_is_stretched_and_mirrored() {
        let l = layout(&["a", "b", "c", "d"]);
        let cfg = GeometryConfig::default();
        let planner = EdgeGeometryPlanner::new(&l, &cfg);

        let g = planner.plan("b", "a").unwrap();
        let c = g.as_curve().unwrap();
        assert_eq!(c.kind, CurveKind::Outer);
        assert!((c.start.norm() - 1.1).abs() < 1e-12);
        assert!((c.end.norm() - 1.1).abs() < 1e-12);
        assert_eq!(c.curvature, -0.3);
        assert!((c.shrink_start - 20.0 * 1.21).abs() < 1e-9);
        assert!(close(c.label_anchor, c.control.scale(1.12)));

        let g = planner.plan("a", "b").unwrap();
        let c = g.as_curve().unwrap();
        assert_eq!(c.kind, CurveKind::Inner);
        assert!((c.start.norm() - 1.0).abs() < 1e-12);
        assert_eq!(c.curvature, 0.3);
        assert_eq!(c.shrink_end, 20.0);
        assert!(close(c.label_anchor, c.control.scale(0.6)));
    }

    #[test]
    fn loop_hangs_outside_its_node() {
        let l = layout(&["a", "b", "c"]);
        let cfg = GeometryConfig::default();
        let planner = EdgeGeometryPlanner::new(&l, &cfg);
        let g = planner.plan("b", "b").unwrap();
        let lp = g.as_loop().unwrap();
        let angle = l.angle(1).unwrap();
        assert!(close(lp.center, Point::polar(1.4, angle)));
        assert!(close(lp.label_anchor, Point::polar(1.96, angle)));
        assert_eq!(lp.radius, 0.3);

        assert_eq!(lp.samples, 50);
        let pts = lp.polyline();
        assert_eq!(pts.len(), 50);
        // The open side of the loop faces the origin.
        let gap_mid = Point::polar(0.3, angle + PI);
        let gap_mid = Point::new(lp.center.x + gap_mid.x, lp.center.y + gap_mid.y);
        let first = pts[0];
        let last = pts[pts.len() - 1];
        assert!(first.norm() < lp.center.norm());
        assert!(last.norm() < lp.center.norm());
        assert!(pts.iter().all(|p| p.distance(gap_mid) > 0.2));
    }

    #[test]
    fn two_states_alternate_label_sides() {
        let l = layout(&["rainy", "sunny"]);
        let cfg = GeometryConfig::default();
        let planner = EdgeGeometryPlanner::new(&l, &cfg);
        let rs = planner.plan("rainy", "sunny").unwrap();
        let sr = planner.plan("sunny", "rainy").unwrap();
        let (rs, sr) = (rs.as_curve().unwrap(), sr.as_curve().unwrap());
        assert_eq!(rs.kind, CurveKind::Mutual);
        assert_eq!(sr.kind, CurveKind::Mutual);
        assert!(close(rs.label_override.unwrap(), Point::new(0.0, -1.0)));
        assert!(close(sr.label_override.unwrap(), Point::new(0.0, 1.0)));
        assert!(close(rs.label_anchor, Point::new(0.0, -0.6)));
        assert!(close(sr.label_anchor, Point::new(0.0, 0.6)));
    }

    #[test]
    fn unknown_state_is_an_error() {
        let l = layout(&["a"]);
        let cfg = GeometryConfig::default();
        let planner = EdgeGeometryPlanner::new(&l, &cfg);
        assert!(planner.plan("a", "zz").is_err());
    }
}
