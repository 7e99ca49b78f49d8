//! Reactive, transactional state container for a game runtime.
//!
//! `gamekit-state` holds an arbitrary nested game-state tree, applies
//! batches of named mutations atomically, computes structural diffs
//! between before/after states, notifies path-scoped observers, and
//! answers ad-hoc path/filter queries. Consumers treat the store as the
//! single source of truth and never mutate state directly.
//!
//! # Core Concepts
//!
//! - **Mutation**: a named, path-addressed pure transform built with
//!   [`set`], [`update`], [`push`], [`remove_where`], [`remove_key`]
//! - **Transaction**: an ordered mutation batch applied all-or-nothing by
//!   [`transaction`], yielding a [`TransactionResult`]
//! - **Diff**: the complete list of leaf-level changes between two trees,
//!   from [`compute_diff`]
//! - **Observer**: a callback subscribed to an exact or wildcard path
//!   pattern, fired synchronously per matching diff entry
//! - **GameStore**: composes the above behind `dispatch` / `observe` /
//!   `query` / `get` / `has` / `replace_state` / `history`
//!
//! # Deterministic State Transitions
//!
//! ```text
//! State' = transaction(State, mutations).state
//! ```
//!
//! `transaction` is a pure function that never mutates its input: the same
//! snapshot and mutation batch always produce the same result, so it can
//! also be called directly (without a store) for "what-if" previews.
//!
//! # Quick Start
//!
//! ```
//! use gamekit_state::{create_store, lt, set, update, Filter};
//! use serde_json::json;
//!
//! let store = create_store(json!({
//!     "turn": 1,
//!     "party": [
//!         {"id": "alice", "hp": 20},
//!         {"id": "bob", "hp": 15},
//!     ],
//! }));
//!
//! // Observe a wildcard pattern; fires once per changed member.
//! let sub = store.observe("party.*.hp", |new, old, ctx| {
//!     println!("{} changed: {:?} -> {:?}", ctx.path, old, new);
//! });
//!
//! // Dispatch an atomic batch.
//! let result = store.dispatch(vec![
//!     set("turn", 2),
//!     update("party.1.hp", |hp| {
//!         json!(hp.and_then(serde_json::Value::as_i64).unwrap_or(0) - 7)
//!     }),
//! ]);
//! assert!(result.valid);
//!
//! // Query with filter combinators.
//! let wounded = store.query("party", Some(&Filter::new().field("hp", lt(10))));
//! assert_eq!(wounded[0]["id"], "bob");
//!
//! sub.unsubscribe();
//! ```

mod diff;
mod error;
mod filter;
mod mutation;
mod observer;
mod path;
mod pattern;
mod query;
mod store;
mod transaction;

// Core types
pub use diff::{compute_diff, Diff, DiffEntry};
pub use error::{
    value_type_name, HistoryError, StoreError, StoreResult, TransactionError,
};
pub use mutation::{
    push, remove_key, remove_where, set, update, Mutation, MutationKind, RemoveFn, UpdateFn,
};
pub use path::{Path, Seg};
pub use pattern::{Pattern, PatternSeg};
pub use transaction::{transaction, Effect, TransactionResult};

// Query surface
pub use filter::{
    all_of, any_of, eq, gt, gte, lt, lte, neq, not, one_of, within, Filter, Predicate,
};
pub use query::{get, get_at_path, has, has_matching, query};

// Store surface
pub use observer::{ChangeContext, ObserverFn, ObserverRegistry, Unsubscriber};
pub use store::{create_store, GameStore, TransactionRecord};

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
