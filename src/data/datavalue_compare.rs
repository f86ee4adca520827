use crate::data::datatable::DataValue;
use std::cmp::Ordering;

/// Rank used to keep mixed columns totally ordered: nulls first, then
/// anything with a numeric reading, then everything else as text.
fn rank(value: &DataValue) -> (u8, Option<f64>) {
    match value {
        DataValue::Null => (0, None),
        other => match other.as_number() {
            Some(n) => (1, Some(n)),
            None => (2, None),
        },
    }
}

/// Total ordering of two values for sorting. Numbers and numeric-looking
/// text compare numerically; remaining values compare by their text.
pub fn compare_datavalues(a: &DataValue, b: &DataValue) -> Ordering {
    let (rank_a, num_a) = rank(a);
    let (rank_b, num_b) = rank(b);
    match rank_a.cmp(&rank_b) {
        Ordering::Equal => match (num_a, num_b) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ if rank_a == 0 => Ordering::Equal,
            _ => a.to_string().cmp(&b.to_string()),
        },
        other => other,
    }
}

/// Compare DataValues with optional values (handling None)
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
    fn test_integer_comparison() {
        assert_eq!(
            compare_datavalues(&DataValue::Integer(1), &DataValue::Integer(2)),
            Ordering::Less
        );
        assert_eq!(
            compare_datavalues(&DataValue::Integer(2), &DataValue::Integer(2)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_string_comparison() {
        assert_eq!(
            compare_datavalues(&"apple".into(), &"banana".into()),
            Ordering::Less
        );
    }

    #[test]
    fn test_mixed_numeric_comparison() {
        assert_eq!(
            compare_datavalues(&DataValue::Integer(10), &DataValue::Float(9.5)),
            Ordering::Greater
        );
        assert_eq!(
            compare_datavalues(&DataValue::Integer(10), &"9".into()),
            Ordering::Greater
        );
    }

    #[test]
    fn test_numbers_sort_before_text() {
        assert_eq!(
            compare_datavalues(&DataValue::Integer(1), &"abc".into()),
            Ordering::Less
        );
        assert_eq!(
            compare_datavalues(&"x10".into(), &DataValue::Float(f64::NAN)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_numeric_text_is_consistent_with_numbers() {
        let nine = DataValue::Integer(9);
        let ten_text: DataValue = "10".into();
        let nine_text: DataValue = "9".into();
        assert_eq!(compare_datavalues(&nine, &ten_text), Ordering::Less);
        assert_eq!(compare_datavalues(&nine_text, &ten_text), Ordering::Less);
        assert_eq!(compare_datavalues(&ten_text, &nine_text), Ordering::Greater);
        assert_eq!(compare_datavalues(&nine, &nine_text), Ordering::Equal);
    }

    #[test]
    fn test_ordering_is_transitive_over_mixed_values() {
        let values: Vec<DataValue> = vec![
            DataValue::Null,
            DataValue::Integer(9),
            DataValue::Integer(10),
            "9".into(),
            "10".into(),
            " 7 ".into(),
            DataValue::Float(9.5),
            DataValue::Boolean(true),
            "x9".into(),
            "x10".into(),
            "".into(),
            DataValue::Float(f64::INFINITY),
        ];
        for a in &values {
            assert_eq!(compare_datavalues(a, a), Ordering::Equal);
            for b in &values {
                assert_eq!(compare_datavalues(a, b), compare_datavalues(b, a).reverse());
                for c in &values {
                    if compare_datavalues(a, b) != Ordering::Greater
                        && compare_datavalues(b, c) != Ordering::Greater
                    {
                        assert_ne!(
                            compare_datavalues(a, c),
                            Ordering::Greater,
                            "{:?} <= {:?} <= {:?}",
                            a,
                            b,
                            c
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_null_comparison() {
        assert_eq!(
            compare_datavalues(&DataValue::Null, &DataValue::Integer(1)),
            Ordering::Less
        );
        assert_eq!(
            compare_optional_datavalues(None, Some(&DataValue::Null)),
            Ordering::Less
        );
    }
}
