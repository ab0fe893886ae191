use crate::{Error, Result};
use carousel_core::{
    ArrowHead, CurveGeometry, DrawCommand, EdgeCommand, EdgeGeometry, LoopGeometry, NodeCommand,
    Plan, Point,
};
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    /// Width and height of the square output, in px.
    pub size: f64,
    /// px per point, applied to node clearance, line widths, marker sizes and font sizes.
    pub px_per_point: f64,
    /// Multiplier for the plan's arrowhead dimensions.
    pub arrow_scale: f64,
    /// Root `<svg id>`.
    pub diagram_id: Option<String>,
    /// Fill of a full-size backdrop rect; `None` leaves the SVG transparent.
    pub background: Option<String>,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            size: 600.0,
            px_per_point: 1.0,
            arrow_scale: 3.0,
            diagram_id: None,
            background: Some("white".to_string()),
        }
    }
}

impl SvgRenderOptions {
    fn validate(&self) -> Result<()> {
        let checks = [
            ("size", self.size),
            ("px_per_point", self.px_per_point),
        ];
        for (name, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidOption { name, value });
            }
        }
        if !(self.arrow_scale.is_finite() && self.arrow_scale >= 0.0) {
            return Err(Error::InvalidOption {
                name: "arrow_scale",
                value: self.arrow_scale,
            });
        }
        Ok(())
    }
}

/// Maps plan coordinates (y up, centred) to SVG pixels (y down, origin top-left).
struct Viewport {
    min: f64,
    max: f64,
    scale: f64,
}

impl Viewport {
    fn map(&self, p: Point) -> Point {
        Point::new((p.x - self.min) * self.scale, (self.max - p.y) * self.scale)
    }
}

pub fn render_svg(plan: &Plan, options: &SvgRenderOptions) -> Result<String> {
    options.validate()?;
    let span = plan.extent.span();
    if !(span.is_finite() && span > 0.0) {
        return Err(Error::InvalidOption {
            name: "extent",
            value: span,
        });
    }
    let vp = Viewport {
        min: plan.extent.min,
        max: plan.extent.max,
        scale: options.size / span,
    };

    let diagram_id = options.diagram_id.as_deref().unwrap_or("carousel");
    let size = fmt(options.size);

    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        r#"<svg id="{id}" xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}" role="graphics-document document" aria-roledescription="markov">"#,
        id = escape_xml(diagram_id),
    );
    out.push_str(
        r#"<style>
.edge { fill: none; stroke-linecap: round; }
.label { text-anchor: middle; dominant-baseline: central; }
</style>
"#,
    );
    if let Some(bg) = options.background.as_deref() {
        let _ = writeln!(
            &mut out,
            r#"<rect class="background" x="0" y="0" width="{size}" height="{size}" fill="{}"/>"#,
            escape_xml(&css_color(bg))
        );
    }

    let mut skipped = 0usize;
    out.push_str(r#"<g class="edges">"#);
    for e in plan.edges() {
        if !render_edge(&mut out, &vp, e, options) {
            skipped += 1;
        }
    }
    out.push_str("</g>\n");

    out.push_str(r#"<g class="nodes">"#);
    for n in plan.nodes() {
        render_node(&mut out, &vp, n, options);
    }
    out.push_str("</g>\n");

    out.push_str(r#"<g class="labels">"#);
    for c in &plan.commands {
        match c {
            DrawCommand::Node(n) => {
                if let Some(label) = n.label.as_deref() {
                    render_text(
                        &mut out,
                        "label node-label",
                        vp.map(n.label_position),
                        label,
                        &n.color,
                        &n.font.family,
                        n.font.size * options.px_per_point,
                    );
                }
            }
            DrawCommand::Edge(e) => {
                if let Some(label) = e.label.as_deref() {
                    render_text(
                        &mut out,
                        "label edge-label",
                        vp.map(e.label_position),
                        label,
                        &e.label_color,
                        &e.font.family,
                        e.font.size * options.px_per_point,
                    );
                }
            }
        }
    }
    out.push_str("</g>\n");
    out.push_str("</svg>\n");

    tracing::debug!(
        nodes = plan.nodes().count(),
        edges = plan.edges().count(),
        skipped,
        "rendered svg"
    );
    Ok(out)
}

/// Returns false when the edge was too short to draw after clearing its nodes.
fn render_edge(out: &mut String, vp: &Viewport, e: &EdgeCommand, options: &SvgRenderOptions) -> bool {
    let stroke = escape_xml(&css_color(&e.color));
    let width = e.width * options.px_per_point;
    let (d, tip, tail) = match &e.geometry {
        EdgeGeometry::Curve(c) => match curve_path(vp, c, options.px_per_point) {
            Some(v) => v,
            None => {
                tracing::trace!(source = %e.source, target = %e.target, "edge shorter than node clearance");
                return false;
            }
        },
        EdgeGeometry::Loop(l) => loop_path(vp, l),
    };
    let _ = write!(
        out,
        r#"<path class="edge" data-source="{}" data-target="{}" d="{d}" stroke="{stroke}" stroke-width="{}"/>"#,
        escape_xml(&e.source),
        escape_xml(&e.target),
        fmt(width),
    );
    render_arrow_head(out, tip, tail, e.arrow, options, &stroke);
    true
}

/// Path data, tip, and a point just behind the tip giving the arrow direction.
fn curve_path(vp: &Viewport, c: &CurveGeometry, px_per_point: f64) -> Option<(String, Point, Point)> {
    let p0 = vp.map(c.start);
    let p1 = vp.map(c.control);
    let p2 = vp.map(c.end);
    let (a, b) = trim_params(
        p0,
        p1,
        p2,
        c.shrink_start * px_per_point,
        c.shrink_end * px_per_point,
    )?;
    let q0 = blossom(p0, p1, p2, a, a);
    let q1 = blossom(p0, p1, p2, a, b);
    let q2 = blossom(p0, p1, p2, b, b);
    let d = format!(
        "M{},{} Q{},{} {},{}",
        fmt(q0.x),
        fmt(q0.y),
        fmt(q1.x),
        fmt(q1.y),
        fmt(q2.x),
        fmt(q2.y)
    );
    let tail = if q1.distance(q2) > 1e-9 { q1 } else { q0 };
    Some((d, q2, tail))
}

fn loop_path(vp: &Viewport, l: &LoopGeometry) -> (String, Point, Point) {
    let pts: Vec<Point> = l.polyline().into_iter().map(|p| vp.map(p)).collect();
    let mut d = String::new();
    for (i, p) in pts.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(&mut d, "{cmd}{},{} ", fmt(p.x), fmt(p.y));
    }
    let d = d.trim_end().to_string();
    // `LoopGeometry::points` always yields at least two points.
    let tip = pts[pts.len() - 1];
    let tail = pts[pts.len() - 2];
    (d, tip, tail)
}

fn render_arrow_head(
    out: &mut String,
    tip: Point,
    tail: Point,
    arrow: ArrowHead,
    options: &SvgRenderOptions,
    fill: &str,
) {
    let len = tail.distance(tip);
    if len <= 1e-9 {
        return;
    }
    let scale = options.arrow_scale * options.px_per_point;
    let (ux, uy) = ((tip.x - tail.x) / len, (tip.y - tail.y) / len);
    let head_len = arrow.length * scale;
    let half_w = arrow.width * scale / 2.0;
    let base = Point::new(tip.x - ux * head_len, tip.y - uy * head_len);
    let left = Point::new(base.x - uy * half_w, base.y + ux * half_w);
    let right = Point::new(base.x + uy * half_w, base.y - ux * half_w);
    let _ = write!(
        out,
        r#"<polygon class="arrow-head" points="{},{} {},{} {},{}" fill="{fill}"/>"#,
        fmt(tip.x),
        fmt(tip.y),
        fmt(left.x),
        fmt(left.y),
        fmt(right.x),
        fmt(right.y),
    );
}

fn render_node(out: &mut String, vp: &Viewport, n: &NodeCommand, options: &SvgRenderOptions) {
    // Marker sizes are areas in pt², like a scatter plot.
    let r = n.size.max(0.0).sqrt() / 2.0 * options.px_per_point;
    let c = vp.map(n.position);
    let opacity = if n.marker_visible { "1" } else { "0" };
    let _ = write!(
        out,
        r#"<circle class="node" data-state="{}" cx="{}" cy="{}" r="{}" fill="{}" fill-opacity="{opacity}"/>"#,
        escape_xml(&n.state),
        fmt(c.x),
        fmt(c.y),
        fmt(r),
        escape_xml(&css_color(&n.color)),
    );
}

fn render_text(
    out: &mut String,
    class: &str,
    at: Point,
    text: &str,
    color: &str,
    family: &str,
    size_px: f64,
) {
    let _ = write!(
        out,
        r#"<text class="{class}" x="{}" y="{}" fill="{}" font-family="{}" font-size="{}">{}</text>"#,
        fmt(at.x),
        fmt(at.y),
        escape_xml(&css_color(color)),
        escape_xml(family),
        fmt(size_px),
        escape_xml(text),
    );
}

/// Polar form `f(u, v)` of the quadratic through `p0, p1, p2`; `f(a, a)`, `f(a, b)`, `f(b, b)` are
/// the control points of the sub-curve on `[a, b]`.
fn blossom(p0: Point, p1: Point, p2: Point, u: f64, v: f64) -> Point {
    let w0 = (1.0 - u) * (1.0 - v);
    let w1 = (1.0 - u) * v + u * (1.0 - v);
    let w2 = u * v;
    Point::new(
        w0 * p0.x + w1 * p1.x + w2 * p2.x,
        w0 * p0.y + w1 * p1.y + w2 * p2.y,
    )
}

const TRIM_SAMPLES: usize = 64;

/// Curve parameters at which the arc length from the start reaches `shrink_a`, and the arc length
/// to the end reaches `shrink_b`. `None` if nothing is left in between.
fn trim_params(p0: Point, p1: Point, p2: Point, shrink_a: f64, shrink_b: f64) -> Option<(f64, f64)> {
    let mut lengths = Vec::with_capacity(TRIM_SAMPLES + 1);
    lengths.push(0.0);
    let mut prev = p0;
    for k in 1..=TRIM_SAMPLES {
        let t = k as f64 / TRIM_SAMPLES as f64;
        let p = blossom(p0, p1, p2, t, t);
        let last = lengths[k - 1];
        lengths.push(last + prev.distance(p));
        prev = p;
    }
    let total = lengths[TRIM_SAMPLES];
    if shrink_a + shrink_b >= total {
        return None;
    }
    let a = param_at_length(&lengths, shrink_a.max(0.0));
    let b = param_at_length(&lengths, total - shrink_b.max(0.0));
    (a < b).then_some((a, b))
}

fn param_at_length(lengths: &[f64], target: f64) -> f64 {
    let n = lengths.len() - 1;
    for k in 1..=n {
        if lengths[k] >= target {
            let seg = lengths[k] - lengths[k - 1];
            let frac = if seg > 0.0 {
                (target - lengths[k - 1]) / seg
            } else {
                0.0
            };
            return ((k - 1) as f64 + frac) / n as f64;
        }
    }
    1.0
}

/// Expands matplotlib's single-letter color codes; anything else is passed through.
fn css_color(color: &str) -> String {
    match color {
        "k" => "black",
        "w" => "white",
        "r" => "red",
        "g" => "green",
        "b" => "blue",
        "c" => "cyan",
        "m" => "magenta",
        "y" => "yellow",
        other => other,
    }
    .to_string()
}

fn fmt(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut r = (v * 1000.0).round() / 1000.0;
    if r.abs() < 0.0005 {
        r = 0.0;
    }
    let mut s = format!("{r:.3}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" { "0".to_string() } else { s }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
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
    out
}
