use crate::error::{Error, Result};
use crate::style::{LabelFormat, StyleSpec};
use crate::table::State;
use serde::{Deserialize, Serialize};

/// Options for a single plan pass. Every field has a default, so a JSON document only needs to
/// carry the options it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanConfig {
    /// Angle of the first state, in radians.
    pub rotation: f64,
    pub radius: f64,
    pub node_labels: StyleSpec<String>,
    pub edge_labels: StyleSpec<String>,
    /// Template for `Auto` edge labels; see [`LabelFormat`].
    pub edge_label_format: String,
    pub node_colors: StyleSpec<String>,
    pub edge_colors: StyleSpec<String>,
    pub node_sizes: StyleSpec<f64>,
    pub edge_widths: StyleSpec<f64>,
    /// Multiplier applied to weights when edge widths are derived from the table.
    pub edge_scale: f64,
    pub self_loops: bool,
    /// Pairs to draw instead of every ordered pair of the node order.
    pub edge_set: Option<Vec<(State, State)>>,
    /// Node order to use instead of the table's rows + column-only states.
    pub node_set: Option<Vec<State>>,
    pub geometry: GeometryConfig,
    pub fonts: FontConfig,
    pub defaults: StyleDefaults,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            radius: 1.0,
            node_labels: StyleSpec::Auto,
            edge_labels: StyleSpec::Off,
            edge_label_format: LabelFormat::DEFAULT.to_string(),
            node_colors: StyleSpec::Off,
            edge_colors: StyleSpec::Off,
            node_sizes: StyleSpec::Uniform(2.0),
            edge_widths: StyleSpec::Auto,
            edge_scale: 4.0,
            self_loops: true,
            edge_set: None,
            node_set: None,
            geometry: GeometryConfig::default(),
            fonts: FontConfig::default(),
            defaults: StyleDefaults::default(),
        }
    }
}

impl PlanConfig {
    pub fn validate(&self) -> Result<LabelFormat> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(Error::InvalidRadius {
                radius: self.radius,
            });
        }
        LabelFormat::parse(&self.edge_label_format)
    }

    /// Half-width of the square view that frames the scene, loops and labels included.
    pub fn view_half_extent(&self) -> f64 {
        self.geometry.extent_factor.powi(2) * self.radius
    }
}

/// Shape constants for edges and self-loops. Lengths are fractions of the layout radius unless
/// noted otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeometryConfig {
    /// Outward stretch of the endpoints of an outer edge.
    pub stretch_outer: f64,
    /// Label pull-in for inner edges.
    pub stretch_inner: f64,
    /// Label push-out for every other curved edge.
    pub label_stretch: f64,
    /// Arc bend; outer edges use the negated value.
    pub curvature: f64,
    /// Distance kept clear of each node, in renderer units (points).
    pub shrink: f64,
    pub loop_stretch: f64,
    pub loop_radius: f64,
    /// Angular half-gap of a self-loop, facing the circle's centre.
    pub loop_gap: f64,
    /// Points per self-loop arc; carried on each loop's geometry.
    pub loop_samples: usize,
    pub head_length: f64,
    pub head_width: f64,
    pub extent_factor: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            stretch_outer: 1.1,
            stretch_inner: 0.6,
            label_stretch: 1.12,
            curvature: 0.3,
            shrink: 20.0,
            loop_stretch: 1.4,
            loop_radius: 0.3,
            loop_gap: std::f64::consts::FRAC_PI_4,
            loop_samples: 50,
            head_length: 3.0,
            head_width: 2.0,
            extent_factor: 1.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontConfig {
    pub family: String,
    pub node_size: f64,
    pub edge_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "DejaVu Sans".to_string(),
            node_size: 10.0,
            edge_size: 10.0,
        }
    }
}

/// Values used wherever a style attribute is off or a keyed lookup misses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleDefaults {
    pub color: String,
    pub node_size: f64,
    pub edge_width: f64,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            color: "black".to_string(),
            node_size: 20.0,
            edge_width: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: PlanConfig = serde_json::from_str(
            r#"{"radius": 2, "edgeLabels": true, "nodeColors": {"a": "red"}, "geometry": {"curvature": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(cfg.radius, 2.0);
        assert_eq!(cfg.edge_labels, StyleSpec::Auto);
        assert_eq!(cfg.node_labels, StyleSpec::Auto);
        assert_eq!(cfg.node_sizes, StyleSpec::Uniform(2.0));
        assert_eq!(cfg.geometry.curvature, 0.5);
        assert_eq!(cfg.geometry.stretch_outer, 1.1);
        assert_eq!(cfg.edge_label_format, "{2:.2f}");
    }

    #[test]
    fn validate_rejects_bad_radius_and_format() {
        let cfg = PlanConfig {
            radius: 0.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidRadius { .. })));

        let cfg = PlanConfig {
            edge_label_format: "{9}".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(Error::InvalidLabelFormat { .. })
        ));
    }

    #[test]
    fn view_extent_is_squared_factor() {
        let cfg = PlanConfig {
            radius: 2.0,
            ..Default::default()
        };
        assert!((cfg.view_half_extent() - 1.4 * 1.4 * 2.0).abs() < 1e-12);
    }
}
