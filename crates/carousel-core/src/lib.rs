#![forbid(unsafe_code)]

//! Headless circular layouts for weighted directed graphs (typically Markov-chain transition
//! matrices).
//!
//! `carousel-core` places the states of a [`WeightTable`] on a circle, shapes every directed edge
//! so that opposite edges between neighbours do not overlap, resolves per-node / per-edge styles
//! and returns a [`Plan`] of abstract draw commands. It draws nothing itself; see
//! `carousel-render` for an SVG backend.
//!
//! ```
//! use carousel_core::{PlanConfig, StyleSpec, WeightTable, plan};
//!
//! let table = WeightTable::from_matrix(
//!     ["rainy", "sunny"],
//!     vec![vec![0.5, 0.5], vec![0.4, 0.6]],
//! )?;
//! let config = PlanConfig {
//!     edge_labels: StyleSpec::Auto,
//!     ..Default::default()
//! };
//! let plan = plan(&table, &config)?;
//! assert_eq!(plan.edge("rainy", "sunny").and_then(|e| e.label.as_deref()), Some("0.50"));
//! # Ok::<(), carousel_core::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod plan;
pub mod style;
pub mod table;

pub use config::{FontConfig, GeometryConfig, PlanConfig, StyleDefaults};
pub use error::{Error, Result};
pub use geometry::{
    Adjacency, CurveGeometry, CurveKind, EdgeGeometry, EdgeGeometryPlanner, LoopGeometry,
};
pub use layout::{CircularLayout, NodeOrder};
pub use model::{
    ArrowHead, DrawCommand, EdgeCommand, FontSpec, NodeCommand, Plan, Point, ViewExtent,
};
pub use plan::plan;
pub use style::{LabelFormat, ResolvedStyles, StyleKey, StyleMap, StyleResolver, StyleSpec};
pub use table::{State, WeightTable};
