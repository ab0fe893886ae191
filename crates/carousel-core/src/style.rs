//! Style inputs and their resolution into per-node / per-edge values.
//!
//! Every stylable attribute accepts a [`StyleSpec`]: derive it from the data (`Auto`), leave it at
//! its default (`Off`), broadcast one value (`Uniform`), or look it up per element (`Keyed`).
//! Keyed lookups never fail; an element without an entry gets the attribute's default.

use crate::config::PlanConfig;
use crate::error::{Error, Result};
use crate::layout::NodeOrder;
use crate::table::{State, WeightTable};
use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Separator between the two states of a pair key in the serialized form of a [`StyleMap`].
pub const PAIR_SEPARATOR: &str = "->";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum StyleSpec<T> {
    Auto,
    #[default]
    Off,
    Uniform(T),
    Keyed(StyleMap<T>),
}

impl<T> From<bool> for StyleSpec<T> {
    fn from(flag: bool) -> Self {
        if flag { StyleSpec::Auto } else { StyleSpec::Off }
    }
}

impl<T> From<StyleMap<T>> for StyleSpec<T> {
    fn from(map: StyleMap<T>) -> Self {
        StyleSpec::Keyed(map)
    }
}

/// Per-state and per-ordered-pair style values.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleMap<T> {
    states: IndexMap<State, T>,
    pairs: IndexMap<State, IndexMap<State, T>>,
}

impl<T> Default for StyleMap<T> {
    fn default() -> Self {
        Self {
            states: IndexMap::new(),
            pairs: IndexMap::new(),
        }
    }
}

impl<T> StyleMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: impl Into<State>, value: T) -> Self {
        self.insert_state(state, value);
        self
    }

    pub fn with_pair(mut self, from: impl Into<State>, to: impl Into<State>, value: T) -> Self {
        self.insert_pair(from, to, value);
        self
    }

    pub fn insert_state(&mut self, state: impl Into<State>, value: T) {
        self.states.insert(state.into(), value);
    }

    pub fn insert_pair(&mut self, from: impl Into<State>, to: impl Into<State>, value: T) {
        self.pairs
            .entry(from.into())
            .or_default()
            .insert(to.into(), value);
    }

    pub fn state(&self, state: &str) -> Option<&T> {
        self.states.get(state)
    }

    pub fn pair(&self, from: &str, to: &str) -> Option<&T> {
        self.pairs.get(from).and_then(|m| m.get(to))
    }

    pub fn len(&self) -> usize {
        self.states.len() + self.pairs.values().map(IndexMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> FromIterator<(String, T)> for StyleMap<T> {
    /// Keys of the form `"a->b"` become pair entries, anything else a state entry.
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut map = StyleMap::new();
        for (key, value) in iter {
            match key.split_once(PAIR_SEPARATOR) {
                Some((from, to)) => map.insert_pair(from.trim(), to.trim(), value),
                None => map.insert_state(key, value),
            }
        }
        map
    }
}

impl<T: Serialize> Serialize for StyleMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.len()))?;
        for (state, value) in &self.states {
            out.serialize_entry(state, value)?;
        }
        for (from, targets) in &self.pairs {
            for (to, value) in targets {
                out.serialize_entry(&format!("{from}{PAIR_SEPARATOR}{to}"), value)?;
            }
        }
        out.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for StyleMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = IndexMap::<String, T>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStyleSpec<T> {
    Flag(bool),
    Keyed(StyleMap<T>),
    Uniform(T),
}

impl<T: Serialize> Serialize for StyleSpec<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            StyleSpec::Auto => serializer.serialize_bool(true),
            StyleSpec::Off => serializer.serialize_bool(false),
            StyleSpec::Uniform(v) => v.serialize(serializer),
            StyleSpec::Keyed(m) => m.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for StyleSpec<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(
            match Option::<RawStyleSpec<T>>::deserialize(deserializer)? {
                None | Some(RawStyleSpec::Flag(false)) => StyleSpec::Off,
                Some(RawStyleSpec::Flag(true)) => StyleSpec::Auto,
                Some(RawStyleSpec::Keyed(m)) => StyleSpec::Keyed(m),
                Some(RawStyleSpec::Uniform(v)) => StyleSpec::Uniform(v),
            },
        )
    }
}

/// An element a style value can be looked up for.
pub trait StyleKey {
    fn lookup<'m, T>(&self, map: &'m StyleMap<T>) -> Option<&'m T>;
}

impl StyleKey for State {
    fn lookup<'m, T>(&self, map: &'m StyleMap<T>) -> Option<&'m T> {
        map.state(self)
    }
}

/// Edges fall back from the exact pair to the source state.
impl StyleKey for (State, State) {
    fn lookup<'m, T>(&self, map: &'m StyleMap<T>) -> Option<&'m T> {
        map.pair(&self.0, &self.1).or_else(|| map.state(&self.0))
    }
}

/// Resolves `spec` for every element. `auto` derives a value from the data; `fallback` is used
/// for `Off` and for keyed misses.
pub fn resolve<K: StyleKey, T: Clone>(
    spec: &StyleSpec<T>,
    elements: &[K],
    fallback: Option<&T>,
    mut auto: impl FnMut(&K) -> Result<Option<T>>,
) -> Result<Vec<Option<T>>> {
    elements
        .iter()
        .map(|k| match spec {
            StyleSpec::Auto => auto(k),
            StyleSpec::Off => Ok(fallback.cloned()),
            StyleSpec::Uniform(v) => Ok(Some(v.clone())),
            StyleSpec::Keyed(map) => Ok(k.lookup(map).or(fallback).cloned()),
        })
        .collect()
}

fn total<T: Clone>(values: Vec<Option<T>>, default: &T) -> Vec<T> {
    values
        .into_iter()
        .map(|v| v.unwrap_or_else(|| default.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
enum FieldSpec {
    Plain,
    Fixed(usize),
    Percent(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field { index: usize, spec: FieldSpec },
}

/// Edge label template over the positional fields `{0}` (source), `{1}` (target) and `{2}`
/// (weight). The weight accepts `:.Nf` and `:.N%` precision specs; `{}` numbers fields in order
/// and `{{` / `}}` are literal braces.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelFormat {
    segments: Vec<Segment>,
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self {
            segments: vec![Segment::Field {
                index: 2,
                spec: FieldSpec::Fixed(2),
            }],
        }
    }
}

impl LabelFormat {
    pub const DEFAULT: &'static str = "{2:.2f}";

    pub fn parse(format: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidLabelFormat {
            format: format.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut next_auto = 0usize;
        let mut chars = format.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("single '}' encountered")),
                '{' => {
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => body.push(c),
                            None => return Err(invalid("unterminated field")),
                        }
                    }
                    let (index, spec) = match body.split_once(':') {
                        Some((i, s)) => (i, Some(s)),
                        None => (body.as_str(), None),
                    };
                    let index = if index.is_empty() {
                        next_auto += 1;
                        next_auto - 1
                    } else {
                        index
                            .parse::<usize>()
                            .map_err(|_| invalid("field index must be 0, 1 or 2"))?
                    };
                    if index > 2 {
                        return Err(invalid("field index must be 0, 1 or 2"));
                    }
                    let spec = match spec {
                        None | Some("") => FieldSpec::Plain,
                        Some(s) => {
                            if index != 2 {
                                return Err(invalid("only the weight field takes a format spec"));
                            }
                            parse_precision(s).ok_or_else(|| invalid("unsupported format spec"))?
                        }
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field { index, spec });
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    pub fn format(&self, from: &str, to: &str, weight: f64) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::Field { index: 0, .. } => out.push_str(from),
                Segment::Field { index: 1, .. } => out.push_str(to),
                Segment::Field { spec, .. } => out.push_str(&format_weight(weight, spec)),
            }
        }
        out
    }
}

fn parse_precision(spec: &str) -> Option<FieldSpec> {
    let rest = spec.strip_prefix('.')?;
    if let Some(digits) = rest.strip_suffix('f') {
        return digits.parse().ok().map(FieldSpec::Fixed);
    }
    if let Some(digits) = rest.strip_suffix('%') {
        return digits.parse().ok().map(FieldSpec::Percent);
    }
    None
}

fn format_weight(weight: f64, spec: &FieldSpec) -> String {
    match spec {
        FieldSpec::Fixed(p) => format!("{weight:.p$}"),
        FieldSpec::Percent(p) => format!("{:.p$}%", weight * 100.0),
        FieldSpec::Plain => plain_weight(weight),
    }
}

/// Shortest round-trip form; whole numbers keep a `.0`, and magnitudes outside
/// `[1e-4, 1e16)` switch to `1e+16` style exponents.
fn plain_weight(weight: f64) -> String {
    let magnitude = weight.abs();
    if !weight.is_finite() || weight == 0.0 || (1e-4..1e16).contains(&magnitude) {
        if weight.is_finite() && weight.fract() == 0.0 {
            return format!("{weight:.1}");
        }
        return weight.to_string();
    }
    let sci = format!("{weight:e}");
    match sci.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => sci,
    }
}

/// Fully resolved style values, index-aligned with the node order and the edge list.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyles {
    pub node_labels: Vec<Option<String>>,
    pub node_colors: Vec<String>,
    pub node_sizes: Vec<f64>,
    pub edge_labels: Vec<Option<String>>,
    pub edge_colors: Vec<String>,
    pub edge_widths: Vec<f64>,
}

/// Resolves the six stylable attributes of a [`PlanConfig`] against a weight table.
pub struct StyleResolver<'a> {
    table: &'a WeightTable,
    config: &'a PlanConfig,
    label_format: &'a LabelFormat,
}

impl<'a> StyleResolver<'a> {
    pub fn new(
        table: &'a WeightTable,
        config: &'a PlanConfig,
        label_format: &'a LabelFormat,
    ) -> Self {
        Self {
            table,
            config,
            label_format,
        }
    }

    pub fn node_labels(&self, nodes: &[State]) -> Result<Vec<Option<String>>> {
        resolve(&self.config.node_labels, nodes, None, |n| Ok(Some(n.clone())))
    }

    pub fn node_colors(&self, nodes: &[State]) -> Result<Vec<String>> {
        let default = &self.config.defaults.color;
        let values = resolve(&self.config.node_colors, nodes, Some(default), |_| {
            Ok(Some(default.clone()))
        })?;
        Ok(total(values, default))
    }

    pub fn node_sizes(&self, nodes: &[State]) -> Result<Vec<f64>> {
        let default = &self.config.defaults.node_size;
        let values = resolve(&self.config.node_sizes, nodes, Some(default), |n| {
            self.table.get(n, n).map(Some)
        })?;
        Ok(total(values, default))
    }

    pub fn edge_labels(&self, edges: &[(State, State)]) -> Result<Vec<Option<String>>> {
        resolve(&self.config.edge_labels, edges, None, |(a, b)| {
            let w = self.table.get(a, b)?;
            Ok(Some(self.label_format.format(a, b, w)))
        })
    }

    pub fn edge_colors(&self, edges: &[(State, State)]) -> Result<Vec<String>> {
        let default = &self.config.defaults.color;
        let values = resolve(&self.config.edge_colors, edges, Some(default), |_| {
            Ok(Some(default.clone()))
        })?;
        Ok(total(values, default))
    }

    pub fn edge_widths(&self, edges: &[(State, State)]) -> Result<Vec<f64>> {
        let default = &self.config.defaults.edge_width;
        let scale = self.config.edge_scale;
        let values = resolve(&self.config.edge_widths, edges, Some(default), |(a, b)| {
            Ok(Some(self.table.get(a, b)? * scale))
        })?;
        Ok(total(values, default))
    }

    pub fn resolve_all(&self, order: &NodeOrder, edges: &[(State, State)]) -> Result<ResolvedStyles> {
        let nodes = order.states();
        Ok(ResolvedStyles {
            node_labels: self.node_labels(nodes)?,
            node_colors: self.node_colors(nodes)?,
            node_sizes: self.node_sizes(nodes)?,
            edge_labels: self.edge_labels(edges)?,
            edge_colors: self.edge_colors(edges)?,
            edge_widths: self.edge_widths(edges)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_is_two_decimals() {
        let f = LabelFormat::parse(LabelFormat::DEFAULT).unwrap();
        assert_eq!(f, LabelFormat::default());
        assert_eq!(f.format("a", "b", 0.5), "0.50");
        assert_eq!(f.format("a", "b", 0.126), "0.13");
    }

    #[test]
    fn format_fields_and_escapes() {
        let f = LabelFormat::parse("{0}->{1}: {2:.1%} {{p}}").unwrap();
        assert_eq!(f.format("x", "y", 0.25), "x->y: 25.0% {p}");

        let f = LabelFormat::parse("{} to {} ({})").unwrap();
        assert_eq!(f.format("x", "y", 1.0), "x to y (1.0)");
        assert_eq!(f.format("x", "y", 0.3), "x to y (0.3)");
    }

    #[test]
    fn bare_weight_switches_to_exponent_outside_normal_range() {
        let f = LabelFormat::parse("{2}").unwrap();
        assert_eq!(f.format("a", "b", 1e16), "1e+16");
        assert_eq!(f.format("a", "b", 2.5e17), "2.5e+17");
        assert_eq!(f.format("a", "b", 1e-5), "1e-05");
        assert_eq!(f.format("a", "b", 9999999999999998.0), "9999999999999998.0");
        assert_eq!(f.format("a", "b", 0.0001), "0.0001");
        assert_eq!(f.format("a", "b", 0.0), "0.0");
    }

    #[test]
    fn format_rejects_bad_templates() {
        for bad in ["{3}", "{0:.2f}", "{2:x}", "{2", "oops}", "{a}"] {
            assert!(
                matches!(LabelFormat::parse(bad), Err(Error::InvalidLabelFormat { .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn edge_lookup_falls_back_from_pair_to_source() {
        let map = StyleMap::new()
            .with_state("a", "red".to_string())
            .with_pair("a", "b", "blue".to_string());
        let edges = vec![
            ("a".to_string(), "b".to_string()),
            ("a".to_string(), "c".to_string()),
            ("c".to_string(), "a".to_string()),
        ];
        let black = "black".to_string();
        let out = resolve(&StyleSpec::Keyed(map), &edges, Some(&black), |_| Ok(None)).unwrap();
        assert_eq!(
            out,
            [
                Some("blue".to_string()),
                Some("red".to_string()),
                Some("black".to_string())
            ]
        );
    }

    #[test]
    fn style_spec_json_forms() {
        let auto: StyleSpec<f64> = serde_json::from_str("true").unwrap();
        assert_eq!(auto, StyleSpec::Auto);
        let off: StyleSpec<f64> = serde_json::from_str("false").unwrap();
        assert_eq!(off, StyleSpec::Off);
        let null: StyleSpec<f64> = serde_json::from_str("null").unwrap();
        assert_eq!(null, StyleSpec::Off);
        let uniform: StyleSpec<f64> = serde_json::from_str("2.5").unwrap();
        assert_eq!(uniform, StyleSpec::Uniform(2.5));
        let color: StyleSpec<String> = serde_json::from_str(r#""orange""#).unwrap();
        assert_eq!(color, StyleSpec::Uniform("orange".to_string()));

        let keyed: StyleSpec<String> =
            serde_json::from_str(r#"{"sunny": "orange", "rainy -> sunny": "blue"}"#).unwrap();
        let StyleSpec::Keyed(map) = &keyed else {
            panic!("expected keyed spec, got {keyed:?}");
        };
        assert_eq!(map.state("sunny").map(String::as_str), Some("orange"));
        assert_eq!(map.pair("rainy", "sunny").map(String::as_str), Some("blue"));

        let json = serde_json::to_string(&keyed).unwrap();
        assert_eq!(json, r#"{"sunny":"orange","rainy->sunny":"blue"}"#);
    }
}
