use crate::geometry::EdgeGeometry;
use crate::table::State;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn polar(radius: f64, angle: f64) -> Self {
        Self {
            x: radius * angle.cos(),
            y: radius * angle.sin(),
        }
    }

    pub fn scale(self, k: f64) -> Self {
        Self {
            x: self.x * k,
            y: self.y * k,
        }
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn lerp(self, other: Point, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Square scene bounds `[min, max]` on both axes, centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewExtent {
    pub min: f64,
    pub max: f64,
}

impl ViewExtent {
    pub fn symmetric(half: f64) -> Self {
        Self {
            min: -half,
            max: half,
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCommand {
    pub state: State,
    pub index: usize,
    pub angle: f64,
    pub position: Point,
    pub color: String,
    pub size: f64,
    pub label: Option<String>,
    pub label_position: Point,
    /// The marker is hidden when a label is drawn in its place.
    pub marker_visible: bool,
    pub font: FontSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrowHead {
    pub length: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeCommand {
    pub source: State,
    pub target: State,
    pub weight: f64,
    pub geometry: EdgeGeometry,
    pub color: String,
    pub width: f64,
    pub label: Option<String>,
    pub label_position: Point,
    pub label_color: String,
    pub font: FontSpec,
    pub arrow: ArrowHead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Node(NodeCommand),
    Edge(EdgeCommand),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub radius: f64,
    pub rotation: f64,
    pub commands: Vec<DrawCommand>,
    pub extent: ViewExtent,
}

impl Plan {
    pub fn nodes(&self) -> impl Iterator<Item = &NodeCommand> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Node(n) => Some(n),
            DrawCommand::Edge(_) => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeCommand> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Edge(e) => Some(e),
            DrawCommand::Node(_) => None,
        })
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&EdgeCommand> {
        self.edges()
            .find(|e| e.source == source && e.target == target)
    }
}
