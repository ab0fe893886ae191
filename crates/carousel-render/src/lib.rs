#![forbid(unsafe_code)]

//! Reference SVG backend for `carousel-core` plans.
//!
//! The planner only knows about abstract geometry; this crate maps a
//! [`Plan`](carousel_core::Plan) onto a square SVG viewport. Distances the planner expresses in
//! points (node clearance, font sizes, line widths) are converted with
//! [`SvgRenderOptions::px_per_point`]. `carousel::render::render_table` plans and renders in one
//! call.

pub mod svg;

pub use svg::{SvgRenderOptions, render_svg};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid render option {name}: {value}")]
    InvalidOption { name: &'static str, value: f64 },
    #[error(transparent)]
    Plan(#[from] carousel_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
