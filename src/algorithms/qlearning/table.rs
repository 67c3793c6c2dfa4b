//! Dense square value tables.

use crate::index::StationIdx;

/// Dense `size × size` table of values indexed by `(source, target)`.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    size: usize,
    values: Vec<f64>,
}

impl QTable {
    /// All-zero table.
    pub fn new(size: usize) -> Self {
        Self::filled(size, 0.0)
    }

    pub fn filled(size: usize, value: f64) -> Self {
        Self {
            size,
            values: vec![value; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, source: StationIdx, target: StationIdx) -> f64 {
        self.values[source.0 * self.size + target.0]
    }

    pub fn set(&mut self, source: StationIdx, target: StationIdx, value: f64) {
        self.values[source.0 * self.size + target.0] = value;
    }

    pub fn row(&self, source: StationIdx) -> &[f64] {
        let start = source.0 * self.size;
        &self.values[start..start + self.size]
    }

    /// Largest value in the row of `source`; zero for an empty table.
    pub fn row_max(&self, source: StationIdx) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        self.row(source)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Rows in source order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.size.max(1))
    }
}
