//! Multi-key ordering of working rows.
//!
//! An order key is a signed, 1-based field position: `3` sorts the third
//! field ascending, `-3` sorts it descending. Keys are compared in priority
//! order and the sort is stable, so rows equal on every key keep their
//! relative order.

use std::cmp::Ordering;
use std::fmt;

use tracing::debug;

use crate::data::datatable::DataRow;
use crate::data::datavalue_compare::compare_optional_datavalues;

/// How a header activation changes the key list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// The activated column becomes the only key
    #[default]
    Single,
    /// The activated column is appended, or flipped in place if present
    Multi,
}

/// A non-zero signed field position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderKey(i32);

impl OrderKey {
    /// Build from the signed wire form. Zero is rejected.
    pub fn from_raw(raw: i32) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    pub fn ascending(position: usize) -> Self {
        Self(position as i32 + 1)
    }

    pub fn descending(position: usize) -> Self {
        Self(-(position as i32 + 1))
    }

    /// 0-based field position
    pub fn position(&self) -> usize {
        self.0.unsigned_abs() as usize - 1
    }

    pub fn is_ascending(&self) -> bool {
        self.0 > 0
    }

    pub fn reversed(&self) -> Self {
        Self(-self.0)
    }

    pub fn raw(&self) -> i32 {
        self.0
    }

    fn compare(&self, a: &DataRow, b: &DataRow) -> Ordering {
        let position = self.position();
        let ordering = compare_optional_datavalues(a.get(position), b.get(position));
        if self.is_ascending() {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prioritized list of order keys; each field appears at most once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderKeys {
    keys: Vec<OrderKey>,
}

impl OrderKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from wire keys, dropping zero, out-of-range and repeated fields
    pub fn from_raw(raw: &[i32], field_count: usize) -> Self {
        let mut keys = Self::new();
        for &value in raw {
            let Some(key) = OrderKey::from_raw(value) else {
                debug!(target: "order", "Dropping zero order key");
                continue;
            };
            if key.position() >= field_count {
                debug!(target: "order", "Dropping out-of-range order key {}", value);
                continue;
            }
            if keys.find(key.position()).is_some() {
                debug!(target: "order", "Dropping repeated order key {}", value);
                continue;
            }
            keys.keys.push(key);
        }
        keys
    }

    pub fn keys(&self) -> &[OrderKey] {
        &self.keys
    }

    /// Signed wire form of the key list
    pub fn raw(&self) -> Vec<i32> {
        self.keys.iter().map(OrderKey::raw).collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    fn find(&self, position: usize) -> Option<usize> {
        self.keys.iter().position(|k| k.position() == position)
    }

    /// Direction of the key for `position`: `Some(true)` ascending,
    /// `Some(false)` descending, `None` when the field is not sorted
    pub fn direction_of(&self, position: usize) -> Option<bool> {
        self.find(position).map(|i| self.keys[i].is_ascending())
    }

    /// Apply a header activation for the 0-based `position`
    pub fn toggle(&mut self, position: usize, mode: SortMode) {
        let existing = self.find(position);
        match mode {
            SortMode::Single => {
                let key = match existing {
                    Some(i) => self.keys[i].reversed(),
                    None => OrderKey::ascending(position),
                };
                self.keys = vec![key];
            }
            SortMode::Multi => match existing {
                Some(i) => self.keys[i] = self.keys[i].reversed(),
                None => self.keys.push(OrderKey::ascending(position)),
            },
        }
        debug!(target: "order", "Order keys now {:?}", self.raw());
    }

    /// Remap every key through an old-position to new-position table
    pub fn remap(&mut self, old_to_new: &[usize]) {
        for key in &mut self.keys {
            if let Some(&new_position) = old_to_new.get(key.position()) {
                *key = if key.is_ascending() {
                    OrderKey::ascending(new_position)
                } else {
                    OrderKey::descending(new_position)
                };
            }
        }
    }

    /// Lexicographic comparison across all keys; equal when keys run out
    pub fn compare(&self, a: &DataRow, b: &DataRow) -> Ordering {
        for key in &self.keys {
            let ordering = key.compare(a, b);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable sort of an index list over `rows`
    pub fn sort(&self, indices: &mut [usize], rows: &[DataRow]) {
        if self.keys.is_empty() {
            return;
        }
        indices.sort_by(|&a, &b| match (rows.get(a), rows.get(b)) {
            (Some(ra), Some(rb)) => self.compare(ra, rb),
            _ => Ordering::Equal,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::DataValue;

    fn rows() -> Vec<DataRow> {
        vec![
            DataRow::new(vec![DataValue::from("Bob"), DataValue::Integer(2)]),
            DataRow::new(vec![DataValue::from("Alice"), DataValue::Integer(2)]),
            DataRow::new(vec![DataValue::from("Alice"), DataValue::Integer(1)]),
            DataRow::new(vec![DataValue::from("Bob"), DataValue::Integer(1)]),
        ]
    }

    #[test]
    fn test_single_mode_toggle() {
        let mut keys = OrderKeys::new();
        keys.toggle(1, SortMode::Single);
        assert_eq!(keys.raw(), vec![2]);
        keys.toggle(1, SortMode::Single);
        assert_eq!(keys.raw(), vec![-2]);
        keys.toggle(1, SortMode::Single);
        assert_eq!(keys.raw(), vec![2]);
        keys.toggle(0, SortMode::Single);
        assert_eq!(keys.raw(), vec![1]);
    }

    #[test]
    fn test_multi_mode_flips_in_place() {
        let mut keys = OrderKeys::new();
        keys.toggle(0, SortMode::Multi);
        keys.toggle(1, SortMode::Multi);
        keys.toggle(0, SortMode::Multi);
        assert_eq!(keys.raw(), vec![-1, 2]);
    }

    #[test]
    fn test_from_raw_drops_invalid() {
        let keys = OrderKeys::from_raw(&[0, 3, -3, 9, -1], 3);
        assert_eq!(keys.raw(), vec![3, -1]);
    }

    #[test]
    fn test_multi_key_sort_with_tie_break() {
        let rows = rows();
        let mut keys = OrderKeys::new();
        keys.toggle(0, SortMode::Multi);
        keys.toggle(1, SortMode::Multi);
        keys.toggle(1, SortMode::Multi); // second key descending

        let mut indices: Vec<usize> = (0..rows.len()).collect();
        keys.sort(&mut indices, &rows);
        assert_eq!(indices, vec![1, 2, 0, 3]);
    }

    #[test]
    fn test_sort_is_stable_on_full_ties() {
        let rows = rows();
        let keys = OrderKeys::from_raw(&[1], 2);
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        keys.sort(&mut indices, &rows);
        // Alice rows keep source order, then Bob rows keep source order
        assert_eq!(indices, vec![1, 2, 0, 3]);

        let keys = OrderKeys::from_raw(&[-1], 2);
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        keys.sort(&mut indices, &rows);
        assert_eq!(indices, vec![0, 3, 1, 2]);
    }

    #[test]
    fn test_remap_keeps_sign() {
        let mut keys = OrderKeys::from_raw(&[1, -3], 3);
        // move field 0 to position 2: old 0 -> 2, old 1 -> 0, old 2 -> 1
        keys.remap(&[2, 0, 1]);
        assert_eq!(keys.raw(), vec![3, -2]);
    }
}
