//! Tabular Data Model
//! Tagged cells, named columns, and the dataset that owns them.

use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum DatasetError {
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
    #[error("Column '{name}' has {found} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        expected: usize,
        found: usize,
    },
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A single dynamically-typed cell.
#[derive(Debug, Clone)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Bit pattern used for equality and hashing; folds -0.0 into 0.0.
    fn number_key(v: f64) -> u64 {
        if v == 0.0 {
            0.0f64.to_bits()
        } else {
            v.to_bits()
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => Self::number_key(*a) == Self::number_key(*b),
            (Cell::Text(a), Cell::Text(b)) => a == b,
            (Cell::Missing, Cell::Missing) => true,
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Number(v) => Self::number_key(*v).hash(state),
            Cell::Text(s) => s.hash(state),
            Cell::Missing => {}
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Missing => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// True when every non-missing cell is a number. An all-missing column counts.
    pub fn is_numeric(&self) -> bool {
        self.cells
            .iter()
            .all(|c| matches!(c, Cell::Number(_) | Cell::Missing))
    }

    /// Numeric with only whole values and no gaps; written as integers.
    pub fn is_integer_like(&self) -> bool {
        !self.cells.is_empty()
            && self
                .cells
                .iter()
                .all(|c| matches!(c, Cell::Number(v) if v.fract() == 0.0 && v.abs() < 9.0e15))
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_missing()).count()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.cells.iter().map(Cell::as_f64).collect()
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Ordered named columns with an explicit row count.
///
/// Column names are unique and every column holds exactly `height` cells.
/// The row count survives projection down to zero columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    height: usize,
}

impl Dataset {
    /// Build a dataset; the height is taken from the first column.
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let height = columns.first().map(|c| c.cells.len()).unwrap_or(0);
        Self::with_height(columns, height)
    }

    /// Build a dataset with an explicit row count.
    pub fn with_height(columns: Vec<Column>, height: usize) -> Result<Self, DatasetError> {
        let mut seen = std::collections::HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(DatasetError::DuplicateColumn(col.name.clone()));
            }
            if col.cells.len() != height {
                return Err(DatasetError::RaggedColumn {
                    name: col.name.clone(),
                    expected: height,
                    found: col.cells.len(),
                });
            }
        }
        Ok(Self { columns, height })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_numeric()).collect()
    }

    /// Cells of one row, in column order.
    pub fn row(&self, index: usize) -> Vec<&Cell> {
        self.columns.iter().map(|c| &c.cells[index]).collect()
    }

    /// First `n` rows as a new dataset.
    pub fn head(&self, n: usize) -> Dataset {
        let height = n.min(self.height);
        Dataset {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.cells[..height].to_vec()))
                .collect(),
            height,
        }
    }

    /// Keep rows whose flag is set, preserving order.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.height);
        for col in &mut self.columns {
            let mut flags = keep.iter();
            col.cells.retain(|_| *flags.next().unwrap_or(&false));
        }
        self.height = keep.iter().filter(|k| **k).count();
    }

    /// Keep the listed columns (dataset order), dropping the rest.
    pub(crate) fn retain_columns(&mut self, keep: impl Fn(&str) -> bool) {
        self.columns.retain(|c| keep(&c.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f64) -> Cell {
        Cell::Number(v)
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Dataset::new(vec![
            Column::new("a", vec![num(1.0)]),
            Column::new("a", vec![num(2.0)]),
        ])
        .unwrap_err();
        assert_eq!(err, DatasetError::DuplicateColumn("a".into()));
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = Dataset::new(vec![
            Column::new("a", vec![num(1.0), num(2.0)]),
            Column::new("b", vec![num(1.0)]),
        ])
        .unwrap_err();
        assert!(matches!(err, DatasetError::RaggedColumn { found: 1, .. }));
    }

    #[test]
    fn numeric_predicate_ignores_missing() {
        let col = Column::new("a", vec![num(1.0), Cell::Missing]);
        assert!(col.is_numeric());
        assert!(!col.is_integer_like());

        let mixed = Column::new("b", vec![num(1.0), Cell::Text("x".into())]);
        assert!(!mixed.is_numeric());
    }

    #[test]
    fn missing_cells_compare_equal() {
        assert_eq!(Cell::Missing, Cell::Missing);
        assert_eq!(num(0.0), num(-0.0));
        assert_ne!(num(1.0), Cell::Text("1".into()));
    }

    #[test]
    fn head_truncates_rows() {
        let ds = Dataset::new(vec![Column::new(
            "a",
            (0..10).map(|i| num(i as f64)).collect(),
        )])
        .unwrap();
        let head = ds.head(5);
        assert_eq!(head.height(), 5);
        assert_eq!(head.row(4), vec![&num(4.0)]);
        assert_eq!(ds.head(50).height(), 10);
    }

    #[test]
    fn display_trims_whole_numbers() {
        assert_eq!(num(3.0).to_string(), "3");
        assert_eq!(num(2.5).to_string(), "2.5");
        assert_eq!(Cell::Missing.to_string(), "");
    }
}
