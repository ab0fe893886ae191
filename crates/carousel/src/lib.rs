#![forbid(unsafe_code)]

//! `carousel` lays out Markov-chain transition graphs on a circle, headlessly.
//!
//! The planning core is re-exported at the crate root.
//!
//! # Features
//!
//! - `render`: enable SVG output (`carousel::render`)

pub use carousel_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use carousel_render::{SvgRenderOptions, render_svg};

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Plan(#[from] carousel_core::Error),
        #[error(transparent)]
        Render(#[from] carousel_render::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Converts an arbitrary string into a conservative SVG `id` token, so several diagrams can
    /// be inlined in one document.
    pub fn sanitize_svg_id(raw: &str) -> String {
        let raw = raw.trim();
        let mut out = String::with_capacity(raw.len() + 4);
        for ch in raw.chars() {
            let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.';
            out.push(if ok { ch } else { '-' });
        }
        while out.contains("--") {
            out = out.replace("--", "-");
        }
        let out = out.trim_matches('-');
        if out.is_empty() {
            return "carousel".to_string();
        }
        if out.starts_with(|c: char| c.is_ascii_alphabetic()) {
            out.to_string()
        } else {
            format!("c-{out}")
        }
    }

    /// Plans `table` with `config` and renders the result as SVG.
    pub fn render_table(
        table: &carousel_core::WeightTable,
        config: &carousel_core::PlanConfig,
        options: &SvgRenderOptions,
    ) -> Result<String> {
        let plan = carousel_core::plan(table, config)?;
        Ok(render_svg(&plan, options)?)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn svg_ids_are_sanitized() {
            assert_eq!(sanitize_svg_id(" weather chain "), "weather-chain");
            assert_eq!(sanitize_svg_id("42"), "c-42");
            assert_eq!(sanitize_svg_id("<>"), "carousel");
        }

        #[test]
        fn plan_errors_surface_as_headless_errors() {
            let table = carousel_core::WeightTable::from_matrix(["a"], vec![vec![1.0]]).unwrap();
            let config = carousel_core::PlanConfig {
                radius: 0.0,
                ..Default::default()
            };
            let err = render_table(&table, &config, &SvgRenderOptions::default()).unwrap_err();
            assert!(matches!(err, HeadlessError::Plan(_)));
        }
    }
}
