use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// A single cell value in the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
}

impl DataValue {
    /// Infer a typed value from raw text (CSV cells, form input)
    pub fn infer(value: &str) -> Self {
        if value.is_empty() || value.eq_ignore_ascii_case("null") {
            return DataValue::Null;
        }

        if value.eq_ignore_ascii_case("true") {
            return DataValue::Boolean(true);
        }
        if value.eq_ignore_ascii_case("false") {
            return DataValue::Boolean(false);
        }

        if let Ok(i) = value.parse::<i64>() {
            return DataValue::Integer(i);
        }

        if let Ok(f) = value.parse::<f64>() {
            return DataValue::Float(f);
        }

        DataValue::String(value.to_string())
    }

    /// Convert a JSON cell. Nested arrays and objects keep their JSON text.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => DataValue::Null,
            JsonValue::Bool(b) => DataValue::Boolean(*b),
            JsonValue::Number(n) => n
                .as_i64()
                .map(DataValue::Integer)
                .or_else(|| n.as_f64().map(DataValue::Float))
                .unwrap_or(DataValue::Null),
            JsonValue::String(s) => DataValue::String(s.clone()),
            other => DataValue::String(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// Numeric view of the value, used by column roll-ups
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Integer(i) => Some(*i as f64),
            DataValue::Float(f) => Some(*f),
            DataValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            DataValue::String(s) => s.trim().parse::<f64>().ok(),
            DataValue::Null => None,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::Null => write!(f, ""),
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::String(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Integer(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Boolean(value)
    }
}

/// A row of data, positionally aligned to the current field order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub values: Vec<DataValue>,
}

impl DataRow {
    pub fn new(values: Vec<DataValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&DataValue> {
        self.values.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut DataValue> {
        self.values.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pad with nulls or truncate so the row has exactly `width` cells
    pub fn fit_to(&mut self, width: usize) {
        self.values.resize(width, DataValue::Null);
    }

    /// Reorder cells in place so that `new[i] = old[permutation[i]]`
    pub fn permute(&mut self, permutation: &[usize]) {
        let old = std::mem::take(&mut self.values);
        self.values = permutation
            .iter()
            .map(|&src| old.get(src).cloned().unwrap_or(DataValue::Null))
            .collect();
    }

    /// Display form of every cell
    pub fn to_strings(&self) -> Vec<String> {
        self.values.iter().map(|v| v.to_string()).collect()
    }
}

impl<V: Into<DataValue>> FromIterator<V> for DataRow {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        DataRow::new(iter.into_iter().map(Into::into).collect())
    }
}

/// The source rows of a loaded dataset.
///
/// This is the single mutable store: filtering and sorting never touch it,
/// they produce index lists over it. Only column reordering (a physical
/// permutation of every row) and deliberate edits through a formatting hook
/// change its contents.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    rows: Vec<DataRow>,
    column_count: usize,
}

impl DataTable {
    /// Create a table, normalizing every row to `column_count` cells
    pub fn new(column_count: usize, mut rows: Vec<DataRow>) -> Self {
        for row in &mut rows {
            if row.len() != column_count {
                row.fit_to(column_count);
            }
        }
        Self { rows, column_count }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&DataRow> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut DataRow> {
        self.rows.get_mut(index)
    }

    pub fn get_value(&self, row: usize, column: usize) -> Option<&DataValue> {
        self.rows.get(row)?.get(column)
    }

    /// Apply a column permutation to every row
    pub fn permute_columns(&mut self, permutation: &[usize]) {
        for row in &mut self.rows {
            row.permute(permutation);
        }
    }
}
