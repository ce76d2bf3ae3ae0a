use crate::data::datatable::{DataRow, DataTable};
use crate::data::order::OrderKeys;

/// The working rows: an ordered list of source-row indices.
///
/// A view is rebuilt wholesale by every filter, sort or reset. It never
/// aliases the source storage, so nothing done to a view can change the
/// source rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataView {
    /// Source row indices in display order
    visible_rows: Vec<usize>,
}

impl DataView {
    /// A view showing every source row in source order
    pub fn all(row_count: usize) -> Self {
        Self {
            visible_rows: (0..row_count).collect(),
        }
    }

    /// A view over specific source rows
    pub fn with_rows(rows: Vec<usize>) -> Self {
        Self { visible_rows: rows }
    }

    /// Keep the source rows accepted by `predicate`, preserving source order
    pub fn filter<F>(source: &DataTable, predicate: F) -> Self
    where
        F: Fn(usize, &DataRow) -> bool,
    {
        Self {
            visible_rows: source
                .rows()
                .iter()
                .enumerate()
                .filter(|(i, row)| predicate(*i, row))
                .map(|(i, _)| i)
                .collect(),
        }
    }

    /// Stable sort by the given keys
    pub fn sort_by(&mut self, keys: &OrderKeys, source: &DataTable) {
        keys.sort(&mut self.visible_rows, source.rows());
    }

    /// Back to source order, keeping the current row set
    pub fn sort_by_source_order(&mut self) {
        self.visible_rows.sort_unstable();
    }

    pub fn row_count(&self) -> usize {
        self.visible_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible_rows.is_empty()
    }

    /// Source index of the working row at `index`
    pub fn source_index(&self, index: usize) -> Option<usize> {
        self.visible_rows.get(index).copied()
    }

    /// Working row at `index`, resolved against the source
    pub fn get_row<'a>(&self, source: &'a DataTable, index: usize) -> Option<&'a DataRow> {
        source.row(self.source_index(index)?)
    }

    /// Get visible row indices
    pub fn visible_row_indices(&self) -> &[usize] {
        &self.visible_rows
    }
}
