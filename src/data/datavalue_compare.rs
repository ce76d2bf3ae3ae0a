use crate::data::datatable::DataValue;
use std::cmp::Ordering;

/// Rank used when two values of unrelated types meet in a sort.
/// Order: Null < Boolean < Integer/Float < String
fn type_rank(value: &DataValue) -> u8 {
    match value {
        DataValue::Null => 0,
        DataValue::Boolean(_) => 1,
        DataValue::Integer(_) | DataValue::Float(_) => 2,
        DataValue::String(_) => 3,
    }
}

/// Compare two raw cell values the way a column sort sees them
pub fn compare_datavalues(a: &DataValue, b: &DataValue) -> Ordering {
    match (a, b) {
        (DataValue::Integer(a), DataValue::Integer(b)) => a.cmp(b),

        (DataValue::Float(a), DataValue::Float(b)) => a.total_cmp(b),

        // Compare actual numeric values, not types
        (DataValue::Integer(i), DataValue::Float(f)) => {
            (*i as f64).total_cmp(f)
        }
        (DataValue::Float(f), DataValue::Integer(i)) => {
            f.total_cmp(&(*i as f64))
        }

        (DataValue::String(a), DataValue::String(b)) => a.cmp(b),

        (DataValue::Boolean(a), DataValue::Boolean(b)) => a.cmp(b),

        (DataValue::Null, DataValue::Null) => Ordering::Equal,

        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Compare DataValues with optional values (missing cells sort first)
pub fn compare_optional_datavalues(a: Option<&DataValue>, b: Option<&DataValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_datavalues(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_numeric_compare() {
        assert_eq!(
            compare_datavalues(&DataValue::Integer(2), &DataValue::Float(2.5)),
            Ordering::Less
        );
        assert_eq!(
            compare_datavalues(&DataValue::Float(3.0), &DataValue::Integer(3)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_cross_type_rank() {
        assert_eq!(
            compare_datavalues(&DataValue::Null, &DataValue::Boolean(false)),
            Ordering::Less
        );
        assert_eq!(
            compare_datavalues(&DataValue::String("1".into()), &DataValue::Integer(9)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_nan_has_a_fixed_place() {
        let nan = DataValue::infer("NaN");
        assert!(matches!(nan, DataValue::Float(f) if f.is_nan()));
        assert_eq!(
            compare_datavalues(&nan, &DataValue::Float(1e300)),
            Ordering::Greater
        );
        assert_eq!(
            compare_datavalues(&DataValue::Integer(5), &nan),
            Ordering::Less
        );

        let mut values: Vec<DataValue> = (0..200)
            .map(|i| {
                if i % 3 == 0 {
                    DataValue::infer("NaN")
                } else {
                    DataValue::Float((i % 7) as f64)
                }
            })
            .collect();
        values.sort_by(compare_datavalues);
        let first_nan = values
            .iter()
            .position(|v| matches!(v, DataValue::Float(f) if f.is_nan()))
            .unwrap();
        assert!(values[first_nan..]
            .iter()
            .all(|v| matches!(v, DataValue::Float(f) if f.is_nan())));
    }
}
