//! Node ordering and circular placement.

use crate::error::{Error, Result};
use crate::model::Point;
use crate::table::{State, WeightTable};
use rustc_hash::FxHashMap;

/// Deduplicated sequence of states. The index of a state drives both its angle and the adjacency
/// test used to bend paired edges apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOrder {
    states: Vec<State>,
    index: FxHashMap<State, usize>,
}

impl NodeOrder {
    /// Rows first, then column-only states.
    pub fn from_table(table: &WeightTable) -> Self {
        Self::from_states(table.states())
    }

    /// Keeps the first occurrence of each state.
    pub fn from_states<S: Into<State>>(states: impl IntoIterator<Item = S>) -> Self {
        let mut out = Self::default();
        for s in states {
            let s: State = s.into();
            if out.index.contains_key(&s) {
                continue;
            }
            out.index.insert(s.clone(), out.states.len());
            out.states.push(s);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.states.get(index).map(String::as_str)
    }

    pub fn index_of(&self, state: &str) -> Option<usize> {
        self.index.get(state).copied()
    }

    pub fn require(&self, state: &str) -> Result<usize> {
        self.index_of(state).ok_or_else(|| Error::UnknownState {
            state: state.to_string(),
        })
    }

    /// Every ordered pair, row-major, self pairs included.
    pub fn all_pairs(&self) -> Vec<(State, State)> {
        let mut out = Vec::with_capacity(self.len() * self.len());
        for a in &self.states {
            for b in &self.states {
                out.push((a.clone(), b.clone()));
            }
        }
        out
    }
}

/// States evenly spaced on a circle, the first one at `rotation`.
#[derive(Debug, Clone)]
pub struct CircularLayout {
    order: NodeOrder,
    rotation: f64,
    radius: f64,
    angles: Vec<f64>,
}

impl CircularLayout {
    pub fn new(order: NodeOrder, rotation: f64, radius: f64) -> Self {
        let n = order.len();
        let step = std::f64::consts::TAU / (n.max(1) as f64);
        let angles = (0..n).map(|i| rotation + step * i as f64).collect();
        Self {
            order,
            rotation,
            radius,
            angles,
        }
    }

    pub fn order(&self) -> &NodeOrder {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    pub fn angle(&self, index: usize) -> Option<f64> {
        self.angles.get(index).copied()
    }

    pub fn angle_of(&self, state: &str) -> Option<f64> {
        self.order.index_of(state).and_then(|i| self.angle(i))
    }

    /// Position of the node at `index` on the circle of radius `r`.
    pub fn position(&self, index: usize) -> Option<Point> {
        self.angle(index).map(|a| Point::polar(self.radius, a))
    }
}
