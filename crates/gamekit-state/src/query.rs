//! Path resolution and ad-hoc queries over a state tree.
//!
//! Reads never fail: a missing path yields `None`/`false`/an empty vec.
//! The "error" concept is reserved for failed mutations.

use crate::filter::{Filter, Predicate};
use crate::path::{Path, Seg};
use crate::pattern::{Pattern, PatternSeg};
use serde_json::Value;

/// Get a reference to the value at a concrete (wildcard-free) path.
pub fn get_at_path<'a>(tree: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = tree;
    for seg in path.iter() {
        current = match seg {
            Seg::Key(key) => current.get(key)?,
            Seg::Index(idx) => current.get(idx)?,
        };
    }
    Some(current)
}

/// Resolve a dot-separated path, returning `None` the moment traversal
/// hits a non-traversable value or missing key.
///
/// A `*` segment expands over the sequence at that position and collects
/// the remainder of the path from every element, preserving order and
/// arity: elements whose remainder does not resolve contribute `null`.
/// A `*` over a non-sequence yields `None`.
///
/// # Examples
///
/// ```
/// use gamekit_state::get;
/// use serde_json::json;
///
/// let state = json!({"party": [{"hp": 20}, {"hp": 15}]});
/// assert_eq!(get(&state, "party.0.hp"), Some(json!(20)));
/// assert_eq!(get(&state, "party.*.hp"), Some(json!([20, 15])));
/// assert_eq!(get(&state, "party.9.hp"), None);
/// ```
pub fn get(tree: &Value, path: &str) -> Option<Value> {
    resolve(tree, Pattern::parse(path).segments())
}

fn resolve(tree: &Value, segments: &[PatternSeg]) -> Option<Value> {
    match segments {
        [] => Some(tree.clone()),
        [PatternSeg::Seg(Seg::Key(key)), rest @ ..] => {
            resolve(tree.get(key)?, rest)
        }
        [PatternSeg::Seg(Seg::Index(idx)), rest @ ..] => {
            resolve(tree.get(idx)?, rest)
        }
        [PatternSeg::Any, rest @ ..] => {
            let arr = tree.as_array()?;
            Some(Value::Array(
                arr.iter()
                    .map(|item| resolve(item, rest).unwrap_or(Value::Null))
                    .collect(),
            ))
        }
    }
}

/// True iff the path resolves to a value (including `null`).
pub fn has(tree: &Value, path: &str) -> bool {
    get(tree, path).is_some()
}

/// True iff the path resolves and the predicate accepts the value.
pub fn has_matching(tree: &Value, path: &str, predicate: &Predicate) -> bool {
    get(tree, path).map_or(false, |v| predicate(&v))
}

/// Resolve a path and filter the result.
///
/// A sequence result is filtered element-wise; a single non-sequence value
/// is wrapped as a one-element sequence before filtering; a missing path
/// returns an empty vec.
///
/// # Examples
///
/// ```
/// use gamekit_state::{lt, query, Filter};
/// use serde_json::json;
///
/// let state = json!({"party": [
///     {"id": "alice", "hp": 20},
///     {"id": "bob", "hp": 8},
/// ]});
/// let wounded = query(&state, "party", Some(&Filter::new().field("hp", lt(10))));
/// assert_eq!(wounded, vec![json!({"id": "bob", "hp": 8})]);
/// ```
pub fn query(tree: &Value, path: &str, filter: Option<&Filter>) -> Vec<Value> {
    let resolved = match get(tree, path) {
        Some(v) => v,
        None => return Vec::new(),
    };
    let candidates = match resolved {
        Value::Array(items) => items,
        single => vec![single],
    };
    match filter {
        Some(filter) => candidates
            .into_iter()
            .filter(|item| filter.matches(item))
            .collect(),
        None => candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{eq, gt, lt};
    use crate::Filter;
    use serde_json::json;

    fn fixture() -> Value {
        json!({
            "turn": 3,
            "party": [
                {"id": "alice", "hp": 20, "pos": {"x": 0.0, "y": 0.0}},
                {"id": "bob", "hp": 8, "pos": {"x": 3.0, "y": 4.0}},
            ],
            "flags": {"paused": false},
        })
    }

    #[test]
    fn test_get_scalar() {
        assert_eq!(get(&fixture(), "turn"), Some(json!(3)));
    }

    #[test]
    fn test_get_nested_index() {
        assert_eq!(get(&fixture(), "party.1.id"), Some(json!("bob")));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let state = fixture();
        assert_eq!(get(&state, "party.9.id"), None);
        assert_eq!(get(&state, "nothing.here"), None);
        assert_eq!(get(&state, "turn.sub"), None);
    }

    #[test]
    fn test_get_empty_path_returns_root() {
        let state = fixture();
        assert_eq!(get(&state, ""), Some(state));
    }

    #[test]
    fn test_get_wildcard_collects_in_order() {
        assert_eq!(get(&fixture(), "party.*.hp"), Some(json!([20, 8])));
    }

    #[test]
    fn test_get_wildcard_missing_field_yields_null() {
        let state = json!({"party": [{"hp": 20}, {"mp": 5}]});
        assert_eq!(get(&state, "party.*.hp"), Some(json!([20, null])));
    }

    #[test]
    fn test_get_wildcard_over_non_array_returns_none() {
        assert_eq!(get(&fixture(), "flags.*.x"), None);
    }

    #[test]
    fn test_has() {
        let state = fixture();
        assert!(has(&state, "party.0.hp"));
        assert!(!has(&state, "party.0.mp"));
    }

    #[test]
    fn test_has_null_value_counts_as_present() {
        let state = json!({"target": null});
        assert!(has(&state, "target"));
    }

    #[test]
    fn test_has_matching() {
        let state = fixture();
        assert!(has_matching(&state, "turn", &gt(2)));
        assert!(!has_matching(&state, "turn", &gt(5)));
        assert!(!has_matching(&state, "missing", &gt(0)));
    }

    #[test]
    fn test_query_array_with_field_filter() {
        let wounded = query(
            &fixture(),
            "party",
            Some(&Filter::new().field("hp", lt(10))),
        );
        assert_eq!(wounded.len(), 1);
        assert_eq!(wounded[0]["id"], "bob");
    }

    #[test]
    fn test_query_field_eq_literal() {
        let found = query(
            &fixture(),
            "party",
            Some(&Filter::new().field_eq("id", "alice")),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["hp"], 20);
    }

    #[test]
    fn test_query_multiple_fields_are_anded() {
        let found = query(
            &fixture(),
            "party",
            Some(&Filter::new().field_eq("id", "alice").field("hp", lt(10))),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_query_wraps_single_value() {
        let result = query(&fixture(), "turn", None);
        assert_eq!(result, vec![json!(3)]);
    }

    #[test]
    fn test_query_single_value_filtered_out() {
        let result = query(&fixture(), "turn", Some(&Filter::predicate(eq(99))));
        assert!(result.is_empty());
    }

    #[test]
    fn test_query_missing_path_is_empty() {
        assert!(query(&fixture(), "inventory.items", None).is_empty());
    }

    #[test]
    fn test_query_predicate_filter() {
        let hps = query(
            &fixture(),
            "party.*.hp",
            Some(&Filter::predicate(lt(10))),
        );
        assert_eq!(hps, vec![json!(8)]);
    }
}
