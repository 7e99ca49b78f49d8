//! Composable filter predicates for queries.
//!
//! Combinators are small predicate factories: each returns a [`Predicate`]
//! closure over a state value. `all_of`/`any_of`/`not` compose other
//! predicates and satisfy the usual boolean-logic laws.

use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// A shared predicate over state values.
pub type Predicate = Rc<dyn Fn(&Value) -> bool>;

/// Numeric less-than. False for non-numeric values.
pub fn lt(limit: impl Into<f64>) -> Predicate {
    let limit = limit.into();
    Rc::new(move |v: &Value| v.as_f64().map_or(false, |n| n < limit))
}

/// Numeric greater-than. False for non-numeric values.
pub fn gt(limit: impl Into<f64>) -> Predicate {
    let limit = limit.into();
    Rc::new(move |v: &Value| v.as_f64().map_or(false, |n| n > limit))
}

/// Numeric less-than-or-equal. False for non-numeric values.
pub fn lte(limit: impl Into<f64>) -> Predicate {
    let limit = limit.into();
    Rc::new(move |v: &Value| v.as_f64().map_or(false, |n| n <= limit))
}

/// Numeric greater-than-or-equal. False for non-numeric values.
pub fn gte(limit: impl Into<f64>) -> Predicate {
    let limit = limit.into();
    Rc::new(move |v: &Value| v.as_f64().map_or(false, |n| n >= limit))
}

/// Structural equality with a literal.
pub fn eq(expected: impl Into<Value>) -> Predicate {
    let expected = expected.into();
    Rc::new(move |v: &Value| *v == expected)
}

/// Structural inequality with a literal.
pub fn neq(expected: impl Into<Value>) -> Predicate {
    let expected = expected.into();
    Rc::new(move |v: &Value| *v != expected)
}

/// Membership in a literal set.
pub fn one_of<I, V>(values: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    Rc::new(move |v: &Value| values.contains(v))
}

/// Euclidean proximity for 2-D points.
///
/// Accepts `{"x": .., "y": ..}` mappings and `[x, y]` pairs; anything else
/// is never within range.
pub fn within(center: (f64, f64), max_distance: f64) -> Predicate {
    Rc::new(move |v: &Value| {
        point_coords(v).map_or(false, |(x, y)| {
            let dx = x - center.0;
            let dy = y - center.1;
            (dx * dx + dy * dy).sqrt() <= max_distance
        })
    })
}

fn point_coords(v: &Value) -> Option<(f64, f64)> {
    if let Some(arr) = v.as_array() {
        if arr.len() != 2 {
            return None;
        }
        return Some((arr[0].as_f64()?, arr[1].as_f64()?));
    }
    let obj = v.as_object()?;
    Some((obj.get("x")?.as_f64()?, obj.get("y")?.as_f64()?))
}

/// Conjunction: true iff every predicate accepts the value.
pub fn all_of(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    let predicates: Vec<Predicate> = predicates.into_iter().collect();
    Rc::new(move |v: &Value| predicates.iter().all(|p| p(v)))
}

/// Disjunction: true iff any predicate accepts the value.
pub fn any_of(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    let predicates: Vec<Predicate> = predicates.into_iter().collect();
    Rc::new(move |v: &Value| predicates.iter().any(|p| p(v)))
}

/// Negation.
pub fn not(predicate: Predicate) -> Predicate {
    Rc::new(move |v: &Value| !predicate(v))
}

/// How a single filter field is matched.
#[derive(Clone)]
enum FieldMatch {
    /// Equality with a literal.
    Literal(Value),
    /// Predicate applied to the field's value.
    Predicate(Predicate),
}

/// A query filter: an optional whole-element predicate plus per-field
/// conditions. All conditions must hold (AND semantics); a missing field
/// fails its condition.
///
/// # Examples
///
/// ```
/// use gamekit_state::{lt, Filter};
/// use serde_json::json;
///
/// let wounded = Filter::new().field("hp", lt(10)).field_eq("alive", true);
/// assert!(wounded.matches(&json!({"hp": 8, "alive": true})));
/// assert!(!wounded.matches(&json!({"hp": 20, "alive": true})));
/// assert!(!wounded.matches(&json!({"alive": true})));
/// ```
#[derive(Clone, Default)]
pub struct Filter {
    predicate: Option<Predicate>,
    fields: Vec<(String, FieldMatch)>,
}

impl Filter {
    /// An empty filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter that applies a predicate to the whole element.
    pub fn predicate(p: Predicate) -> Self {
        Self {
            predicate: Some(p),
            fields: Vec::new(),
        }
    }

    /// Require a field to satisfy a predicate (builder pattern).
    pub fn field(mut self, name: impl Into<String>, p: Predicate) -> Self {
        self.fields.push((name.into(), FieldMatch::Predicate(p)));
        self
    }

    /// Require a field to equal a literal (builder pattern).
    pub fn field_eq(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), FieldMatch::Literal(value.into())));
        self
    }

    /// Check whether a value passes every condition of this filter.
    pub fn matches(&self, v: &Value) -> bool {
        if let Some(p) = &self.predicate {
            if !p(v) {
                return false;
            }
        }
        self.fields.iter().all(|(name, m)| {
            v.get(name).map_or(false, |field| match m {
                FieldMatch::Literal(expected) => field == expected,
                FieldMatch::Predicate(p) => p(field),
            })
        })
    }
}

// Closures have no useful Debug; show field names and whether a
// whole-element predicate is present.
impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("predicate", &self.predicate.is_some())
            .field(
                "fields",
                &self
                    .fields
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
