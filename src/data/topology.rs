//! Column topology: the current order of fields and everything keyed by
//! field position (cached widths, hidden set, fixed columns).
//!
//! Moving a column produces a [`ColumnMove`] permutation. The topology
//! applies it to its own state; the owner of the rows and order keys applies
//! the same permutation to them so every positional index stays valid.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::data::field::{Align, Field};

/// Permutation produced by moving one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMove {
    /// `permutation[new_position] = old_position`
    pub permutation: Vec<usize>,
    /// `old_to_new[old_position] = new_position`
    pub old_to_new: Vec<usize>,
}

impl ColumnMove {
    /// Permutation moving the column at `from` to `to`, shifting the columns
    /// in between by one. `None` when nothing would move or a position is
    /// out of range.
    pub fn new(from: usize, to: usize, len: usize) -> Option<Self> {
        if from == to || from >= len || to >= len {
            return None;
        }

        let mut permutation: Vec<usize> = (0..len).collect();
        let moved = permutation.remove(from);
        permutation.insert(to, moved);

        let mut old_to_new = vec![0; len];
        for (new_position, &old_position) in permutation.iter().enumerate() {
            old_to_new[old_position] = new_position;
        }

        Some(Self {
            permutation,
            old_to_new,
        })
    }

    /// Reorder a per-column sequence
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        self.permutation
            .iter()
            .filter_map(|&old| items.get(old).cloned())
            .collect()
    }

    pub fn new_position_of(&self, old_position: usize) -> Option<usize> {
        self.old_to_new.get(old_position).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColumnTopology {
    fields: Vec<Field>,
    widths: Vec<u32>,
    hidden: BTreeSet<usize>,
    fixed_columns: usize,
}

impl ColumnTopology {
    pub fn new(fields: Vec<Field>, fixed_columns: usize) -> Self {
        let widths = vec![0; fields.len()];
        let fixed_columns = fixed_columns.min(fields.len());
        Self {
            fields,
            widths,
            hidden: BTreeSet::new(),
            fixed_columns,
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, position: usize) -> Option<&Field> {
        self.fields.get(position)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn fixed_columns(&self) -> usize {
        self.fixed_columns
    }

    /// Current position of the field called `name`
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Positions (in display order) of every field whose name is listed.
    /// Names are resolved on each call so the result follows column moves.
    pub fn positions_of<S: AsRef<str>>(&self, names: &[S]) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| names.iter().any(|n| n.as_ref().trim() == f.name))
            .map(|(i, _)| i)
            .collect()
    }

    /// Move the field at `from` to `to`. Returns the permutation so the caller
    /// can apply it to row cells and order keys.
    pub fn move_column(&mut self, from: usize, to: usize) -> Option<ColumnMove> {
        let len = self.fields.len();
        let Some(column_move) = ColumnMove::new(from, to, len) else {
            if from != to {
                warn!(target: "topology", "Rejected column move {} -> {} (field count {})", from, to, len);
            }
            return None;
        };

        self.fields = column_move.apply(&self.fields);
        self.widths = column_move.apply(&self.widths);
        self.hidden = self
            .hidden
            .iter()
            .filter_map(|&old| column_move.new_position_of(old))
            .collect();

        debug!(target: "topology", "Moved column {} -> {}, permutation {:?}", from, to, column_move.permutation);
        Some(column_move)
    }

    pub fn hidden(&self) -> &BTreeSet<usize> {
        &self.hidden
    }

    pub fn is_hidden(&self, position: usize) -> bool {
        self.hidden.contains(&position)
    }

    /// Show or hide a column. Hiding is refused when it would leave no
    /// visible column; the return value says whether the request was applied.
    pub fn set_visible(&mut self, position: usize, visible: bool) -> bool {
        if position >= self.fields.len() {
            warn!(target: "topology", "Visibility change for unknown column {}", position);
            return false;
        }

        if visible {
            self.hidden.remove(&position);
            return true;
        }

        let remaining = self
            .visible_positions()
            .into_iter()
            .filter(|&p| p != position)
            .count();
        if remaining == 0 {
            debug!(target: "topology", "Refusing to hide the last visible column {}", position);
            return false;
        }

        self.hidden.insert(position);
        true
    }

    pub fn set_visible_by_name(&mut self, name: &str, visible: bool) -> bool {
        match self.position_of(name) {
            Some(position) => self.set_visible(position, visible),
            None => false,
        }
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
    }

    /// Positions a presenter should draw: not in the hidden set and not
    /// marked hidden by the field's own alignment
    pub fn visible_positions(&self) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(i, f)| !self.hidden.contains(i) && f.align != Align::Hidden)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn widths(&self) -> &[u32] {
        &self.widths
    }

    /// Record an observed width; cached widths never shrink
    pub fn observe_width(&mut self, position: usize, width: u32) -> u32 {
        match self.widths.get_mut(position) {
            Some(cached) => {
                if width > *cached {
                    *cached = width;
                }
                *cached
            }
            None => width,
        }
    }

    pub fn reset_widths(&mut self) {
        self.widths.iter_mut().for_each(|w| *w = 0);
    }

    /// Left offset of each fixed column: the summed widths of the fixed
    /// columns before it
    pub fn fixed_offsets(&self) -> Vec<u32> {
        let mut offset = 0;
        self.widths
            .iter()
            .take(self.fixed_columns)
            .map(|&w| {
                let left = offset;
                offset += w;
                left
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topology() -> ColumnTopology {
        ColumnTopology::new(
            vec![Field::new("id"), Field::new("name"), Field::new("city")],
            1,
        )
    }

    #[test]
    fn test_column_move_permutation() {
        let mv = ColumnMove::new(0, 2, 4).unwrap();
        assert_eq!(mv.permutation, vec![1, 2, 0, 3]);
        assert_eq!(mv.old_to_new, vec![2, 0, 1, 3]);
        assert_eq!(mv.apply(&["a", "b", "c", "d"]), vec!["b", "c", "a", "d"]);

        let back = ColumnMove::new(2, 0, 4).unwrap();
        assert_eq!(back.apply(&mv.apply(&["a", "b", "c", "d"])), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_move_rejects_out_of_range() {
        assert!(ColumnMove::new(1, 1, 3).is_none());
        assert!(ColumnMove::new(0, 3, 3).is_none());
        let mut t = topology();
        assert!(t.move_column(5, 0).is_none());
        assert_eq!(t.fields()[0].name, "id");
    }

    #[test]
    fn test_move_remaps_hidden_and_widths() {
        let mut t = topology();
        t.observe_width(0, 40);
        t.observe_width(2, 90);
        assert!(t.set_visible(2, false));

        t.move_column(2, 0).unwrap();
        let names: Vec<_> = t.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["city", "id", "name"]);
        assert_eq!(t.widths(), &[90, 40, 0]);
        assert!(t.is_hidden(0));
        assert_eq!(t.positions_of(&["name"]), vec![2]);
    }

    #[test]
    fn test_cannot_hide_last_visible_column() {
        let mut t = topology();
        assert!(t.set_visible(0, false));
        assert!(t.set_visible(1, false));
        assert!(!t.set_visible(2, false));
        assert_eq!(t.hidden().len(), 2);
        assert_eq!(t.visible_positions(), vec![2]);

        // Hiding an already hidden column is a no-op, not a refusal
        assert!(t.set_visible(0, false));
        assert!(t.set_visible(1, true));
        assert_eq!(t.visible_positions(), vec![1, 2]);
    }

    #[test]
    fn test_widths_never_shrink() {
        let mut t = topology();
        assert_eq!(t.observe_width(1, 50), 50);
        assert_eq!(t.observe_width(1, 30), 50);
        t.reset_widths();
        assert_eq!(t.observe_width(1, 30), 30);
    }

    #[test]
    fn test_fixed_offsets() {
        let mut t = ColumnTopology::new(
            vec![Field::new("a"), Field::new("b"), Field::new("c")],
            2,
        );
        t.observe_width(0, 40);
        t.observe_width(1, 25);
        assert_eq!(t.fixed_offsets(), vec![0, 40]);
    }
}
