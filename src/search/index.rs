use std::time::Instant;

use tracing::debug;

use crate::data::datatable::DataRow;
use crate::search::normalize::normalize_value;

/// Normalized tokens for every source row, aligned to the current field order.
///
/// The index does not track the rows it was built from. Whoever reorders
/// fields or replaces rows must call [`SearchIndex::invalidate`]; queries
/// against an invalidated index rebuild it first.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    rows: Vec<Vec<String>>,
    indexed: bool,
}

impl SearchIndex {
    /// An empty, not-yet-built index
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(source: &[DataRow]) -> Self {
        let mut index = Self::new();
        index.rebuild(source);
        index
    }

    /// Replace the index contents with tokens for `source`
    pub fn rebuild(&mut self, source: &[DataRow]) {
        let start = Instant::now();
        self.rows = source
            .iter()
            .map(|row| row.values.iter().map(normalize_value).collect())
            .collect();
        self.indexed = true;
        debug!(target: "search_index", "Indexed {} rows in {:?}", self.rows.len(), start.elapsed());
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    pub fn invalidate(&mut self) {
        if self.indexed {
            debug!(target: "search_index", "Index invalidated");
        }
        self.indexed = false;
    }

    /// Tokens of the source row at `index`
    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
