use std::fmt;

use crate::data::datatable::DataRow;
use crate::data::field::{ColumnOp, Field};

/// One cell of the totals row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TotalCell {
    /// Column has no roll-up configured
    Empty,
    Count(usize),
    Sum(f64),
    /// `NaN` when there were no rows; check the row count before trusting it
    Average(f64),
}

impl TotalCell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TotalCell::Empty => None,
            TotalCell::Count(n) => Some(*n as f64),
            TotalCell::Sum(v) | TotalCell::Average(v) => Some(*v),
        }
    }
}

impl fmt::Display for TotalCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TotalCell::Empty => Ok(()),
            TotalCell::Count(n) => write!(f, "{}", n),
            TotalCell::Sum(v) | TotalCell::Average(v) => write!(f, "{}", v),
        }
    }
}

/// Roll up every field over the working rows (`working` indexes `rows`).
/// Non-numeric cells add nothing to sums and averages.
pub fn compute_totals(working: &[usize], rows: &[DataRow], fields: &[Field]) -> Vec<TotalCell> {
    let count = working.len();
    fields
        .iter()
        .enumerate()
        .map(|(position, field)| match field.col_op {
            ColumnOp::None => TotalCell::Empty,
            ColumnOp::Count => TotalCell::Count(count),
            ColumnOp::Sum => TotalCell::Sum(column_sum(working, rows, position)),
            ColumnOp::Average => {
                TotalCell::Average(column_sum(working, rows, position) / count as f64)
            }
        })
        .collect()
}

fn column_sum(working: &[usize], rows: &[DataRow], position: usize) -> f64 {
    working
        .iter()
        .filter_map(|&i| rows.get(i)?.get(position)?.as_f64())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::DataValue;

    fn fields() -> Vec<Field> {
        vec![
            Field::new("name").with_col_op(ColumnOp::Count),
            Field::new("saldo").with_col_op(ColumnOp::Sum),
            Field::new("edad").with_col_op(ColumnOp::Average),
            Field::new("city"),
        ]
    }

    fn rows() -> Vec<DataRow> {
        vec![
            DataRow::new(vec![
                "Juan".into(),
                DataValue::Integer(100),
                DataValue::Integer(30),
                "Madrid".into(),
            ]),
            DataRow::new(vec![
                "Ana".into(),
                DataValue::Float(250.5),
                DataValue::Integer(40),
                "Sevilla".into(),
            ]),
            DataRow::new(vec![
                "Luis".into(),
                DataValue::Null,
                DataValue::Integer(50),
                "Bilbao".into(),
            ]),
        ]
    }

    #[test]
    fn test_totals_over_working_subset() {
        let totals = compute_totals(&[0, 1], &rows(), &fields());
        assert_eq!(totals[0], TotalCell::Count(2));
        assert_eq!(totals[1], TotalCell::Sum(350.5));
        assert_eq!(totals[2], TotalCell::Average(35.0));
        assert_eq!(totals[3], TotalCell::Empty);
        assert_eq!(totals[3].to_string(), "");
    }

    #[test]
    fn test_nulls_skipped_in_sum() {
        let totals = compute_totals(&[0, 1, 2], &rows(), &fields());
        assert_eq!(totals[1], TotalCell::Sum(350.5));
        assert_eq!(totals[2], TotalCell::Average(40.0));
    }

    #[test]
    fn test_average_of_nothing_is_nan() {
        let totals = compute_totals(&[], &rows(), &fields());
        assert_eq!(totals[0], TotalCell::Count(0));
        match totals[2] {
            TotalCell::Average(v) => assert!(v.is_nan()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
