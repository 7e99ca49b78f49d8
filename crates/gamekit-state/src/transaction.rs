//! The atomic transaction executor.
//!
//! [`transaction`] is a pure function: it never performs I/O and never
//! mutates its input, so it is safe to call repeatedly for "what-if"
//! evaluation without committing anything to a store.

use crate::diff::{compute_diff, Diff};
use crate::error::TransactionError;
use crate::mutation::Mutation;
use serde_json::Value;

/// Reserved for future event routing; always empty in the base engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Effect {
    /// Event name.
    pub name: String,
    /// Event payload.
    pub payload: Value,
}

/// Outcome of applying a batch of mutations to a state snapshot.
///
/// When `valid` is false, `state` equals the pre-transaction snapshot,
/// `diff` is empty, and `error` describes the failure.
#[derive(Clone, Debug)]
pub struct TransactionResult {
    /// The resulting tree (the original snapshot on failure).
    pub state: Value,
    /// Changes between the snapshot and the resulting tree.
    pub diff: Diff,
    /// Reserved for future event routing; always empty here.
    pub effects: Vec<Effect>,
    /// Whether every mutation applied.
    pub valid: bool,
    /// The failure, when `valid` is false.
    pub error: Option<TransactionError>,
}

/// Apply an ordered batch of mutations to a state snapshot, all-or-nothing.
///
/// Folds each mutation's `apply` in list order into a running value. If
/// any application fails the whole batch is abandoned and the original
/// snapshot is returned untouched; callers must never assume partial
/// mutations became visible. On success the result carries the structural
/// diff between the snapshot and the final tree.
///
/// # Examples
///
/// ```
/// use gamekit_state::{set, transaction};
/// use serde_json::json;
///
/// let state = json!({"turn": 1});
/// let result = transaction(&state, &[set("turn", 2), set("score", 100)]);
/// assert!(result.valid);
/// assert_eq!(result.state["turn"], 2);
/// assert_eq!(result.diff.len(), 2);
///
/// // A failing mutation aborts the whole batch.
/// use gamekit_state::push;
/// let result = transaction(&state, &[set("turn", 2), push("turn", "x")]);
/// assert!(!result.valid);
/// assert_eq!(result.state, state);
/// assert!(result.diff.is_empty());
/// ```
pub fn transaction(state: &Value, mutations: &[Mutation]) -> TransactionResult {
    let mut current = state.clone();

    for (idx, mutation) in mutations.iter().enumerate() {
        match mutation.apply(&current) {
            Ok(next) => current = next,
            Err(source) => {
                let applied = mutations[..idx]
                    .iter()
                    .map(|m| m.description().to_owned())
                    .collect();
                return TransactionResult {
                    state: state.clone(),
                    diff: Diff::default(),
                    effects: Vec::new(),
                    valid: false,
                    error: Some(TransactionError {
                        failed: mutation.description().to_owned(),
                        applied,
                        source,
                    }),
                };
            }
        }
    }

    let diff = compute_diff(state, &current);
    TransactionResult {
        state: current,
        diff,
        effects: Vec::new(),
        valid: true,
        error: None,
    }
}
