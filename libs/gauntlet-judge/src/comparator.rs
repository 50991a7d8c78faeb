/// Result Comparator - Deterministic Output Judgement
///
/// **Critical Properties:**
/// - Knows nothing about Docker or language runtimes
/// - Pure function: (actual, expected, policy) → bool
/// - Structural and order-sensitive for sequences unless the challenge is
///   flagged order-independent
/// - Exact for integers, booleans, null; byte-for-byte for strings with no
///   implicit trimming; tolerance-based for floats
///
/// Determinism here is what makes the whole judge reproducible: the same
/// (actual, expected) pair under the same policy always judges the same way.
use gauntlet_common::config::FloatTolerance;
use serde_json::{Number, Value};

#[derive(Debug, Clone, Copy)]
pub struct Comparator {
    tolerance: FloatTolerance,
    order_independent: bool,
}

impl Comparator {
    pub fn new(tolerance: FloatTolerance, order_independent: bool) -> Self {
        Self {
            tolerance,
            order_independent,
        }
    }

    /// Decide whether `actual` matches `expected`.
    pub fn matches(&self, actual: &Value, expected: &Value) -> bool {
        match (actual, expected) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => self.numbers_match(a, b),
            (Value::Array(a), Value::Array(b)) => {
                if self.order_independent {
                    self.multisets_match(a, b)
                } else {
                    a.len() == b.len()
                        && a.iter().zip(b.iter()).all(|(x, y)| self.matches(x, y))
                }
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| self.matches(v, w)))
            }
            // Mixed shapes never match, with one exception: integer vs
            // float of the same numeric value, handled above.
            _ => false,
        }
    }

    fn numbers_match(&self, a: &Number, b: &Number) -> bool {
        // Both integral: exact comparison, no tolerance.
        if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
            return x == y;
        }
        if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
            return x == y;
        }
        // At least one float (or ranges that only meet in f64): tolerance.
        match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => self.tolerance.within(x, y),
            _ => false,
        }
    }

    /// Order-independent sequence match: every expected element must be
    /// consumed by exactly one distinct actual element. Quadratic, but test
    /// outputs are small and element matching still honors the tolerance.
    fn multisets_match(&self, actual: &[Value], expected: &[Value]) -> bool {
        if actual.len() != expected.len() {
            return false;
        }
        let mut used = vec![false; actual.len()];
        for want in expected {
            let found = actual.iter().enumerate().find(|(i, got)| {
                !used[*i] && self.matches(got, want)
            });
            match found {
                Some((i, _)) => used[i] = true,
                None => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ordered() -> Comparator {
        Comparator::new(FloatTolerance::default(), false)
    }

    fn unordered() -> Comparator {
        Comparator::new(FloatTolerance::default(), true)
    }

    #[test]
    fn test_scalars_exact() {
        let cmp = ordered();
        assert!(cmp.matches(&json!(42), &json!(42)));
        assert!(!cmp.matches(&json!(42), &json!(43)));
        assert!(cmp.matches(&json!(true), &json!(true)));
        assert!(!cmp.matches(&json!(true), &json!(false)));
        assert!(cmp.matches(&json!(null), &json!(null)));
    }

    #[test]
    fn test_strings_byte_exact_no_trimming() {
        let cmp = ordered();
        assert!(cmp.matches(&json!("hello"), &json!("hello")));
        assert!(!cmp.matches(&json!("hello "), &json!("hello")));
        assert!(!cmp.matches(&json!("Hello"), &json!("hello")));
    }

    #[test]
    fn test_arrays_order_sensitive_by_default() {
        let cmp = ordered();
        assert!(cmp.matches(&json!([0, 1]), &json!([0, 1])));
        assert!(!cmp.matches(&json!([1, 0]), &json!([0, 1])));
        assert!(!cmp.matches(&json!([0, 1, 2]), &json!([0, 1])));
    }

    #[test]
    fn test_order_independent_flag() {
        let cmp = unordered();
        assert!(cmp.matches(&json!([1, 0]), &json!([0, 1])));
        assert!(cmp.matches(&json!([3, 1, 2]), &json!([1, 2, 3])));
        // Multiset, not set: duplicates must balance.
        assert!(!cmp.matches(&json!([1, 1, 2]), &json!([1, 2, 2])));
    }

    #[test]
    fn test_nested_structures() {
        let cmp = ordered();
        let a = json!({"pairs": [[0, 1], [2, 3]], "count": 2});
        let b = json!({"count": 2, "pairs": [[0, 1], [2, 3]]});
        assert!(cmp.matches(&a, &b));
        let c = json!({"pairs": [[2, 3], [0, 1]], "count": 2});
        assert!(!cmp.matches(&c, &b));
    }

    #[test]
    fn test_object_key_sets_must_match() {
        let cmp = ordered();
        assert!(!cmp.matches(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!cmp.matches(&json!({"a": 1, "b": 2}), &json!({"a": 1})));
    }

    #[test]
    fn test_float_tolerance() {
        let cmp = ordered();
        assert!(cmp.matches(&json!(0.1 + 0.2), &json!(0.3)));
        assert!(!cmp.matches(&json!(0.31), &json!(0.3)));
        // Integer against float of the same value matches under tolerance.
        assert!(cmp.matches(&json!(1), &json!(1.0)));
    }

    #[test]
    fn test_integers_never_tolerant() {
        let cmp = Comparator::new(
            FloatTolerance {
                absolute: 10.0,
                relative: 0.0,
            },
            false,
        );
        // A sloppy tolerance policy must not blur integer equality.
        assert!(!cmp.matches(&json!(5), &json!(6)));
    }

    #[test]
    fn test_mixed_shapes_never_match() {
        let cmp = ordered();
        assert!(!cmp.matches(&json!("1"), &json!(1)));
        assert!(!cmp.matches(&json!([1]), &json!(1)));
        assert!(!cmp.matches(&json!(null), &json!(0)));
    }
}
