//! Hashable, structurally comparable form of JSON parameter values.
//!
//! Grid points and observed assignments are compared through this form only.
//! Numbers compare by numeric value (`1 == 1.0`, `-0.0 == 0`), arrays compare
//! element-wise at any depth, and objects compare by their key-sorted entries.

use serde_json::{Number, Value};

/// Largest magnitude at which an integral `f64` is folded into [`CanonicalValue::Int`].
const INTEGRAL_FLOAT_LIMIT: f64 = 1.7014118346046923e38; // 2^127

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Int(i128),
    /// Bit pattern of a finite, non-integral (or out-of-range) float.
    Float(u64),
    String(String),
    Seq(Box<[CanonicalValue]>),
    Map(Box<[(String, CanonicalValue)]>),
}

/// One point of the grid, or one projected observed assignment, in canonical form.
pub type GridKey = Box<[CanonicalValue]>;

impl CanonicalValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::from_number(n),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Seq(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => {
                let mut entries: Vec<(String, CanonicalValue)> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                Self::Map(entries.into_boxed_slice())
            }
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return Self::Int(i128::from(i));
        }
        if let Some(u) = n.as_u64() {
            return Self::Int(i128::from(u));
        }
        match n.as_f64() {
            Some(f) => Self::from_float(f),
            None => Self::String(n.to_string()),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_float(f: f64) -> Self {
        if f.is_finite() && f.fract() == 0.0 && f.abs() < INTEGRAL_FLOAT_LIMIT {
            // also folds -0.0 into 0
            Self::Int(f as i128)
        } else {
            Self::Float(f.to_bits())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn canon(v: Value) -> CanonicalValue {
        CanonicalValue::from_json(&v)
    }

    #[test]
    fn integers_and_integral_floats_are_equal() {
        assert_eq!(canon(json!(1)), canon(json!(1.0)));
        assert_eq!(canon(json!(0)), canon(json!(-0.0)));
        assert_eq!(canon(json!(u64::MAX)), CanonicalValue::Int(i128::from(u64::MAX)));
        assert_ne!(canon(json!(1)), canon(json!(1.5)));
        assert_ne!(canon(json!(1)), canon(json!("1")));
        assert_ne!(canon(json!(true)), canon(json!(1)));
    }

    #[test]
    fn nested_sequences_compare_element_wise() {
        let a = canon(json!([[7, 8], ["9", [10, 11]]]));
        let b = canon(json!([[7.0, 8], ["9", [10, 11.0]]]));
        assert_eq!(a, b);
        assert_ne!(a, canon(json!([[7, 8], ["9", [10, 12]]])));
        assert_ne!(canon(json!([1, 2])), canon(json!([2, 1])));
    }

    #[test]
    fn objects_ignore_key_order() {
        let a = canon(json!({"x": 1, "y": [1, 2]}));
        let b = canon(json!({"y": [1, 2], "x": 1.0}));
        assert_eq!(a, b);
    }

    #[test]
    fn canonical_tuples_dedup_in_sets() {
        let keys: HashSet<GridKey> = [
            vec![canon(json!([2, 3])), canon(json!("a"))],
            vec![canon(json!([2.0, 3.0])), canon(json!("a"))],
            vec![canon(json!([3, 4])), canon(json!("a"))],
        ]
        .into_iter()
        .map(Vec::into_boxed_slice)
        .collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn integral_floats_beyond_i64_match_u64() {
        let above_i64 = 18_446_744_073_709_549_568u64; // 2^64 - 2048, exact in f64
        assert_eq!(canon(json!(above_i64)), canon(json!(above_i64 as f64)));
        assert_eq!(canon(json!(1.0e20)), CanonicalValue::Int(100_000_000_000_000_000_000));
    }

    #[test]
    fn large_floats_keep_their_bits() {
        let big: f64 = 1.0e300;
        assert_eq!(canon(json!(big)), CanonicalValue::Float(big.to_bits()));
    }
}
