//! Square (or rectangular) state-indexed weight tables.
//!
//! A [`WeightTable`] is the only input the planner reads data from. Rows are source states,
//! columns are destination states. Column-only states are appended to the default node order, so a
//! table does not have to be square, but every pair the planner visits must have an entry.

use crate::error::{Error, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type State = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableDocument", into = "TableDocument")]
pub struct WeightTable {
    rows: Vec<State>,
    columns: Vec<State>,
    row_index: FxHashMap<State, usize>,
    column_index: FxHashMap<State, usize>,
    /// Row-major, `rows.len() * columns.len()` values.
    values: Vec<f64>,
}

fn index_labels(labels: &[State]) -> Result<FxHashMap<State, usize>> {
    let mut index = FxHashMap::default();
    for (i, label) in labels.iter().enumerate() {
        if index.insert(label.clone(), i).is_some() {
            return Err(Error::DuplicateState {
                state: label.clone(),
            });
        }
    }
    Ok(index)
}

impl WeightTable {
    /// Builds a table with distinct row and column labels. `values[r][c]` is the weight of
    /// `rows[r] -> columns[c]`.
    pub fn from_rows_and_columns<S: Into<State>>(
        rows: impl IntoIterator<Item = S>,
        columns: impl IntoIterator<Item = S>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let rows: Vec<State> = rows.into_iter().map(Into::into).collect();
        let columns: Vec<State> = columns.into_iter().map(Into::into).collect();
        if values.len() != rows.len() {
            return Err(Error::Shape {
                axis: "rows".to_string(),
                expected: rows.len(),
                found: values.len(),
            });
        }
        let mut flat = Vec::with_capacity(rows.len() * columns.len());
        for (label, row) in rows.iter().zip(&values) {
            if row.len() != columns.len() {
                return Err(Error::Shape {
                    axis: format!("row {label}"),
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        Ok(Self {
            row_index: index_labels(&rows)?,
            column_index: index_labels(&columns)?,
            rows,
            columns,
            values: flat,
        })
    }

    /// Builds a square table that uses the same labels for both axes.
    pub fn from_matrix<S: Into<State>>(
        labels: impl IntoIterator<Item = S>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let labels: Vec<State> = labels.into_iter().map(Into::into).collect();
        Self::from_rows_and_columns(labels.clone(), labels, values)
    }

    /// Builds a square table from sparse `(from, to) -> weight` entries. Cells without an entry are
    /// zero; entries naming a state outside `labels` are ignored.
    pub fn from_pairs<S: Into<State>>(
        labels: impl IntoIterator<Item = S>,
        pairs: impl IntoIterator<Item = ((S, S), f64)>,
    ) -> Result<Self> {
        let labels: Vec<State> = labels.into_iter().map(Into::into).collect();
        let n = labels.len();
        let mut table = Self::from_matrix(labels, vec![vec![0.0; n]; n])?;
        for ((from, to), weight) in pairs {
            let (from, to): (State, State) = (from.into(), to.into());
            match table.cell_mut(&from, &to) {
                Some(cell) => *cell = weight,
                None => tracing::debug!(%from, %to, "ignoring weight for unlisted state"),
            }
        }
        Ok(table)
    }

    /// Builds a square table from a weighted edge list. States are numbered in order of first
    /// appearance; later duplicates of an edge overwrite earlier ones.
    pub fn from_edges<S: Into<State>>(edges: impl IntoIterator<Item = (S, S, f64)>) -> Self {
        let edges: Vec<(State, State, f64)> = edges
            .into_iter()
            .map(|(a, b, w)| (a.into(), b.into(), w))
            .collect();
        let mut labels: Vec<State> = Vec::new();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for (a, b, _) in &edges {
            for s in [a, b] {
                if seen.insert(s.as_str()) {
                    labels.push(s.clone());
                }
            }
        }
        let n = labels.len();
        let row_index = labels
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect::<FxHashMap<_, _>>();
        let mut values = vec![0.0; n * n];
        for (a, b, w) in &edges {
            values[row_index[a] * n + row_index[b]] = *w;
        }
        Self {
            column_index: row_index.clone(),
            row_index,
            columns: labels.clone(),
            rows: labels,
            values,
        }
    }

    /// Estimates transition probabilities from an observed state sequence.
    ///
    /// Rows are the (sorted) states observed as a predecessor, columns the (sorted) states observed
    /// as a successor; each row is normalized to sum to one. A state that only ever appears last
    /// becomes a column-only state.
    pub fn from_sequence<S: AsRef<str>>(sequence: &[S]) -> Self {
        let mut rows: Vec<State> = Vec::new();
        let mut columns: Vec<State> = Vec::new();
        for w in sequence.windows(2) {
            rows.push(w[0].as_ref().to_string());
            columns.push(w[1].as_ref().to_string());
        }
        rows.sort();
        rows.dedup();
        columns.sort();
        columns.dedup();

        let row_index: FxHashMap<State, usize> = rows
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        let column_index: FxHashMap<State, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();

        let width = columns.len();
        let mut values = vec![0.0; rows.len() * width];
        for w in sequence.windows(2) {
            let r = row_index[w[0].as_ref()];
            let c = column_index[w[1].as_ref()];
            values[r * width + c] += 1.0;
        }
        for row in values.chunks_mut(width.max(1)) {
            let total: f64 = row.iter().sum();
            if total > 0.0 {
                row.iter_mut().for_each(|v| *v /= total);
            }
        }

        Self {
            rows,
            columns,
            row_index,
            column_index,
            values,
        }
    }

    pub fn rows(&self) -> &[State] {
        &self.rows
    }

    pub fn columns(&self) -> &[State] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }

    /// Row states followed by column states that are not also rows.
    pub fn states(&self) -> Vec<State> {
        let mut out = self.rows.clone();
        out.extend(
            self.columns
                .iter()
                .filter(|c| !self.row_index.contains_key(*c))
                .cloned(),
        );
        out
    }

    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.row_index.contains_key(from) && self.column_index.contains_key(to)
    }

    /// Weight of `from -> to`. Pairs outside the table are a configuration error.
    pub fn get(&self, from: &str, to: &str) -> Result<f64> {
        match (self.row_index.get(from), self.column_index.get(to)) {
            (Some(&r), Some(&c)) => Ok(self.values[r * self.columns.len() + c]),
            _ => Err(Error::MissingEntry {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }

    fn cell_mut(&mut self, from: &str, to: &str) -> Option<&mut f64> {
        let r = *self.row_index.get(from)?;
        let c = *self.column_index.get(to)?;
        let width = self.columns.len();
        self.values.get_mut(r * width + c)
    }

    fn row_values(&self, r: usize) -> &[f64] {
        let width = self.columns.len();
        &self.values[r * width..(r + 1) * width]
    }
}

impl fmt::Display for WeightTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = (0..self.rows.len())
            .map(|r| self.row_values(r).iter().map(|v| format!("{v}")).collect())
            .collect();
        let head_width = self.rows.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(c, label)| {
                cells
                    .iter()
                    .map(|row| row[c].chars().count())
                    .chain(std::iter::once(label.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:head_width$}", "")?;
        for (label, w) in self.columns.iter().zip(&widths) {
            write!(f, "  {label:>w$}")?;
        }
        for (label, row) in self.rows.iter().zip(&cells) {
            writeln!(f)?;
            write!(f, "{label:<head_width$}")?;
            for (cell, w) in row.iter().zip(&widths) {
                write!(f, "  {cell:>w$}")?;
            }
        }
        Ok(())
    }
}

/// JSON shape of a table: either `states` (square) or `rows` + `columns`, plus a row-major
/// `matrix`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    states: Option<Vec<State>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rows: Option<Vec<State>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    columns: Option<Vec<State>>,
    matrix: Vec<Vec<f64>>,
}

impl TryFrom<TableDocument> for WeightTable {
    type Error = Error;

    fn try_from(doc: TableDocument) -> Result<Self> {
        match (doc.states, doc.rows, doc.columns) {
            (Some(states), None, None) => Self::from_matrix(states, doc.matrix),
            (None, Some(rows), Some(columns)) => {
                Self::from_rows_and_columns(rows, columns, doc.matrix)
            }
            (None, Some(rows), None) => Self::from_matrix(rows, doc.matrix),
            _ => Err(Error::Shape {
                axis: "labels (use `states`, or `rows` with optional `columns`)".to_string(),
                expected: 1,
                found: 0,
            }),
        }
    }
}

impl From<WeightTable> for TableDocument {
    fn from(table: WeightTable) -> Self {
        let matrix = (0..table.rows.len())
            .map(|r| table.row_values(r).to_vec())
            .collect();
        if table.rows == table.columns {
            Self {
                states: Some(table.rows),
                rows: None,
                columns: None,
                matrix,
            }
        } else {
            Self {
                states: None,
                rows: Some(table.rows),
                columns: Some(table.columns),
                matrix,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_sequence_matches_crosstab_normalization() {
        let seq = [
            "sunny", "sunny", "rainy", "rainy", "sunny", "sunny", "sunny", "rainy",
        ];
        let t = WeightTable::from_sequence(&seq);
        assert_eq!(t.rows(), ["rainy", "sunny"]);
        assert_eq!(t.columns(), ["rainy", "sunny"]);
        assert_eq!(t.get("rainy", "rainy").unwrap(), 0.5);
        assert_eq!(t.get("rainy", "sunny").unwrap(), 0.5);
        assert_eq!(t.get("sunny", "rainy").unwrap(), 0.4);
        assert!((t.get("sunny", "sunny").unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn from_sequence_keeps_terminal_state_as_column_only() {
        let t = WeightTable::from_sequence(&["a", "a", "b"]);
        assert_eq!(t.rows(), ["a"]);
        assert_eq!(t.columns(), ["a", "b"]);
        assert_eq!(t.states(), ["a", "b"]);
        assert!(t.get("b", "a").is_err());
    }

    #[test]
    fn from_pairs_zero_fills_and_ignores_unknown_states() {
        let t = WeightTable::from_pairs(["a", "b"], [(("a", "b"), 0.7), (("a", "z"), 1.0)]).unwrap();
        assert_eq!(t.get("a", "b").unwrap(), 0.7);
        assert_eq!(t.get("b", "a").unwrap(), 0.0);
        assert!(!t.contains("a", "z"));
    }

    #[test]
    fn from_edges_numbers_states_by_first_appearance() {
        let t = WeightTable::from_edges([("x", "y", 2.0), ("z", "x", 1.0), ("x", "y", 3.0)]);
        assert_eq!(t.states(), ["x", "y", "z"]);
        assert_eq!(t.get("x", "y").unwrap(), 3.0);
        assert_eq!(t.get("z", "x").unwrap(), 1.0);
        assert_eq!(t.get("y", "z").unwrap(), 0.0);
    }

    #[test]
    fn display_aligns_columns() {
        let t = WeightTable::from_matrix(["rainy", "sunny"], vec![vec![0.5, 0.5], vec![0.4, 0.6]])
            .unwrap();
        let text = t.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "       rainy  sunny");
        assert_eq!(lines[1], "rainy    0.5    0.5");
        assert_eq!(lines[2], "sunny    0.4    0.6");
    }
}
