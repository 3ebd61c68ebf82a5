//! Per-column expectations used on the expected side of a match.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

type Check = dyn Fn(Option<&Value>) -> bool + Send + Sync;

/// A test over a single live cell. `None` means the live row has no such
/// column.
#[derive(Clone)]
pub struct ColumnPredicate {
    description: String,
    check: Arc<Check>,
}

impl ColumnPredicate {
    pub fn new<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    pub fn accepts(&self, value: Option<&Value>) -> bool {
        (self.check)(value)
    }

    /// Text shown for this expectation in diagnostics.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for ColumnPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ColumnPredicate")
            .field(&self.description)
            .finish()
    }
}

impl PartialEq for ColumnPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.description == other.description
    }
}

impl From<Value> for ColumnPredicate {
    fn from(value: Value) -> Self {
        equal_to(value)
    }
}

/// Equal to `expected`. Numbers compare by value, so `3` equals `3.0`.
pub fn equal_to(expected: impl Into<Value>) -> ColumnPredicate {
    let expected = expected.into();
    ColumnPredicate::new(expected.to_string(), move |actual| {
        actual.map_or(false, |actual| values_equal(&expected, actual))
    })
}

pub fn any_value() -> ColumnPredicate {
    ColumnPredicate::new("ANYTHING", |_| true)
}

/// Null, or absent from the live row.
pub fn is_null() -> ColumnPredicate {
    ColumnPredicate::new("null", |actual| actual.map_or(true, Value::is_null))
}

pub fn not_null() -> ColumnPredicate {
    ColumnPredicate::new("not null", |actual| actual.map_or(false, |v| !v.is_null()))
}

pub fn one_of<I, V>(candidates: I) -> ColumnPredicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let candidates: Vec<Value> = candidates.into_iter().map(Into::into).collect();
    let description = format!(
        "one of [{}]",
        candidates
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    ColumnPredicate::new(description, move |actual| {
        actual.map_or(false, |actual| {
            candidates.iter().any(|c| values_equal(c, actual))
        })
    })
}

/// Arbitrary check on a present value.
pub fn satisfies<F>(description: impl Into<String>, check: F) -> ColumnPredicate
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    ColumnPredicate::new(description, move |actual| actual.map_or(false, |v| check(v)))
}

fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(e), Value::Number(a)) => match (e.as_i64(), a.as_i64()) {
            (Some(e), Some(a)) => e == a,
            _ => match (e.as_u64(), a.as_u64()) {
                (Some(e), Some(a)) => e == a,
                _ => e.as_f64() == a.as_f64(),
            },
        },
        _ => expected == actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_to_describes_json_literal() {
        assert_eq!(equal_to("description").description(), "\"description\"");
        assert_eq!(equal_to(3).description(), "3");
    }

    #[test]
    fn equal_to_compares_numbers_by_value() {
        let p = equal_to(3);
        assert!(p.accepts(Some(&json!(3))));
        assert!(p.accepts(Some(&json!(3.0))));
        assert!(!p.accepts(Some(&json!(4))));
        assert!(!p.accepts(Some(&json!("3"))));
        assert!(!p.accepts(None));
    }

    #[test]
    fn null_predicates() {
        assert!(is_null().accepts(None));
        assert!(is_null().accepts(Some(&Value::Null)));
        assert!(!is_null().accepts(Some(&json!(0))));
        assert!(not_null().accepts(Some(&json!(0))));
        assert!(!not_null().accepts(None));
    }

    #[test]
    fn one_of_and_satisfies() {
        let p = one_of(["a", "b"]);
        assert_eq!(p.description(), "one of [\"a\", \"b\"]");
        assert!(p.accepts(Some(&json!("b"))));
        assert!(!p.accepts(Some(&json!("c"))));

        let positive = satisfies("positive", |v| v.as_i64().map_or(false, |n| n > 0));
        assert!(positive.accepts(Some(&json!(5))));
        assert!(!positive.accepts(Some(&json!(-5))));
        assert!(!positive.accepts(None));
    }

    #[test]
    fn any_value_accepts_everything() {
        assert!(any_value().accepts(None));
        assert!(any_value().accepts(Some(&json!({"k": 1}))));
    }
}
