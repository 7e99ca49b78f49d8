//! The store: one live state tree, one observer registry, one history.
//!
//! A [`GameStore`] is the single source of truth for game state. Consumers
//! never mutate it directly: they dispatch batches of mutations, observe
//! path patterns, and run path/filter queries. Everything is synchronous;
//! `dispatch` runs mutation application, diffing, the history append, and
//! observer notification to completion before returning.

use crate::diff::Diff;
use crate::error::HistoryError;
use crate::filter::{Filter, Predicate};
use crate::mutation::Mutation;
use crate::observer::{ChangeContext, ObserverFn, ObserverRegistry, Unsubscriber};
use crate::pattern::Pattern;
use crate::query;
use crate::transaction::{transaction, TransactionResult};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};

/// One committed transaction, as recorded in store history.
///
/// Records are appended in dispatch order, only for valid transactions,
/// and are never rewritten. Mutation closures are not serializable; use
/// [`descriptions`](TransactionRecord::descriptions) for logs and audits.
#[derive(Clone, Debug)]
pub struct TransactionRecord {
    /// Commit time, unix epoch milliseconds.
    pub timestamp: u64,
    /// The committed mutations, in application order.
    pub mutations: Vec<Mutation>,
    /// The diff the transaction produced.
    pub diff: Diff,
}

impl TransactionRecord {
    /// Descriptions of the committed mutations, in order.
    pub fn descriptions(&self) -> Vec<&str> {
        self.mutations.iter().map(|m| m.description()).collect()
    }
}

/// The reactive, transactional state container.
///
/// Single-threaded by contract: mutation closures and observer callbacks
/// are `Rc`-shared and the engine performs no internal locking. Callers
/// using multiple logical threads must serialize access externally.
///
/// Observer callbacks run inline inside the dispatching call. A callback
/// that dispatches on the same store re-enters the engine; this is
/// supported (all internal borrows are released before notification) but
/// remains a documented hazard for callers to reason about.
///
/// # Examples
///
/// ```
/// use gamekit_state::{create_store, set, update};
/// use serde_json::json;
///
/// let store = create_store(json!({"turn": 1, "party": [{"hp": 20}]}));
///
/// let result = store.dispatch(vec![set("turn", 2)]);
/// assert!(result.valid);
/// assert_eq!(store.get("turn"), Some(json!(2)));
/// assert_eq!(store.history_len(), 1);
/// ```
pub struct GameStore {
    initial: Value,
    state: RefCell<Value>,
    observers: Rc<ObserverRegistry>,
    history: RefCell<Vec<TransactionRecord>>,
}

/// Create a store owning `initial_state`. One store per session.
pub fn create_store(initial_state: Value) -> GameStore {
    GameStore::new(initial_state)
}

impl GameStore {
    /// Create a store owning `initial_state`.
    pub fn new(initial_state: Value) -> Self {
        Self {
            initial: initial_state.clone(),
            state: RefCell::new(initial_state),
            observers: Rc::new(ObserverRegistry::new()),
            history: RefCell::new(Vec::new()),
        }
    }

    /// Apply an ordered batch of mutations atomically.
    ///
    /// On success the live tree is swapped to the result, a record is
    /// appended to history, and matching observers fire synchronously with
    /// the transaction's diff. On failure the store, its history, and its
    /// observers are left exactly as they were; inspect
    /// [`TransactionResult::valid`] and `error`.
    pub fn dispatch(&self, mutations: Vec<Mutation>) -> TransactionResult {
        let before = self.state.borrow().clone();
        let result = transaction(&before, &mutations);

        if result.valid {
            *self.state.borrow_mut() = result.state.clone();
            self.history.borrow_mut().push(TransactionRecord {
                timestamp: unix_millis(),
                mutations,
                diff: result.diff.clone(),
            });
            debug!(
                changes = result.diff.len(),
                history = self.history.borrow().len(),
                "transaction committed"
            );
            // All RefCell borrows are released here so observer callbacks
            // may re-enter the store.
            self.observers.notify(&result.diff);
        } else if let Some(err) = &result.error {
            debug!(error = %err, "transaction rejected");
        }

        result
    }

    /// Snapshot of the current state tree.
    ///
    /// The returned value is an owned deep copy: holding it gives no way
    /// to reach, observe, or mutate the live tree.
    pub fn get_state(&self) -> Value {
        self.state.borrow().clone()
    }

    /// Snapshot of the state the store was created with.
    pub fn initial_state(&self) -> Value {
        self.initial.clone()
    }

    /// Subscribe a callback to an exact or wildcard path pattern.
    ///
    /// The callback receives `(new_value, old_value, context)` per
    /// matching diff entry; `context.path` is the concrete changed path.
    /// The returned handle unsubscribes; calling it repeatedly is a no-op.
    pub fn observe(
        &self,
        pattern: &str,
        callback: impl Fn(Option<&Value>, Option<&Value>, &ChangeContext) + 'static,
    ) -> Unsubscriber {
        let callback: ObserverFn = Rc::new(callback);
        let id = self.observers.subscribe(Pattern::parse(pattern), callback);
        Unsubscriber::new(Rc::clone(&self.observers), id)
    }

    /// Resolve a dot-path against the current tree. Never fails: a missing
    /// path is `None`.
    pub fn get(&self, path: &str) -> Option<Value> {
        query::get(&self.state.borrow(), path)
    }

    /// True iff the path resolves to a value.
    pub fn has(&self, path: &str) -> bool {
        query::has(&self.state.borrow(), path)
    }

    /// True iff the path resolves and the predicate accepts the value.
    pub fn has_matching(&self, path: &str, predicate: &Predicate) -> bool {
        query::has_matching(&self.state.borrow(), path, predicate)
    }

    /// Resolve a path and filter the result; missing paths yield an empty
    /// vec.
    pub fn query(&self, path: &str, filter: Option<&Filter>) -> Vec<Value> {
        query::query(&self.state.borrow(), path, filter)
    }

    /// Unconditionally swap the live tree.
    ///
    /// No history record is appended and no observers fire. Intended for
    /// snapshot restore, deserialization, and rewind, not for gameplay
    /// mutation; gameplay goes through [`dispatch`](GameStore::dispatch).
    pub fn replace_state(&self, new_state: Value) {
        trace!("state replaced wholesale");
        *self.state.borrow_mut() = new_state;
    }

    /// The committed transaction records, in dispatch order.
    pub fn history(&self) -> Vec<TransactionRecord> {
        self.history.borrow().clone()
    }

    /// Number of committed transactions since store creation.
    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    /// Drop all history records. The live state is untouched; replay is no
    /// longer possible past this point.
    pub fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }

    /// Reconstruct the tree as it was after committed transaction `index`.
    ///
    /// Re-runs transactions `0..=index` from the initial snapshot without
    /// touching the live state. Because [`replace_state`] bypasses
    /// history, replay reflects committed transactions only.
    pub fn replay_to(&self, index: usize) -> Result<Value, HistoryError> {
        let records = self.history.borrow().clone();
        if index >= records.len() {
            return Err(HistoryError::InvalidReplayIndex {
                index,
                len: records.len(),
            });
        }

        let mut state = self.initial.clone();
        for (i, record) in records.iter().take(index + 1).enumerate() {
            let result = transaction(&state, &record.mutations);
            if let Some(source) = result.error {
                return Err(HistoryError::ReplayFailed { index: i, source });
            }
            state = result.state;
        }
        Ok(state)
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{push, set, update};
    use serde_json::json;

    fn party_store() -> GameStore {
        create_store(json!({
            "turn": 1,
            "party": [
                {"id": "alice", "hp": 20},
                {"id": "bob", "hp": 15},
            ],
        }))
    }

    #[test]
    fn test_dispatch_commits_and_appends_history() {
        let store = party_store();
        let result = store.dispatch(vec![set("turn", 2), set("score", 100)]);

        assert!(result.valid);
        assert_eq!(store.get("turn"), Some(json!(2)));
        assert_eq!(store.get("score"), Some(json!(100)));
        assert_eq!(store.history_len(), 1);
        assert_eq!(
            store.history()[0].descriptions(),
            vec!["set turn", "set score"]
        );
    }

    #[test]
    fn test_failed_dispatch_leaves_store_untouched() {
        let store = party_store();
        let before = store.get_state();

        let result = store.dispatch(vec![set("turn", 2), push("turn", "invalid")]);

        assert!(!result.valid);
        assert!(result.error.is_some());
        assert_eq!(store.get_state(), before);
        assert_eq!(store.get("turn"), Some(json!(1)));
        assert_eq!(store.history_len(), 0);
    }

    #[test]
    fn test_failed_dispatch_fires_no_observers() {
        let store = party_store();
        let fired = Rc::new(RefCell::new(0));
        let count = fired.clone();
        store.observe("turn", move |_, _, _| *count.borrow_mut() += 1);

        store.dispatch(vec![set("turn", 2), push("turn", "invalid")]);
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn test_observer_receives_before_after_and_concrete_path() {
        let store = party_store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        store.observe("party.0.hp", move |new, old, ctx| {
            sink.borrow_mut()
                .push((new.cloned(), old.cloned(), ctx.path.to_string()));
        });

        store.dispatch(vec![update("party.0.hp", |hp| {
            json!(hp.and_then(Value::as_i64).unwrap_or(0) - 5)
        })]);

        assert_eq!(
            *seen.borrow(),
            vec![(
                Some(json!(15)),
                Some(json!(20)),
                "party.0.hp".to_owned()
            )]
        );
    }

    #[test]
    fn test_replace_state_is_silent() {
        let store = party_store();
        let fired = Rc::new(RefCell::new(0));
        let count = fired.clone();
        store.observe("turn", move |_, _, _| *count.borrow_mut() += 1);

        let snapshot = json!({"turn": 42});
        store.replace_state(snapshot.clone());

        assert_eq!(store.get_state(), snapshot);
        assert_eq!(store.history_len(), 0);
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn test_query_delegates_to_current_tree() {
        let store = party_store();
        store.dispatch(vec![set("party.1.hp", 8)]);

        let wounded = store.query(
            "party",
            Some(&Filter::new().field("hp", crate::filter::lt(10))),
        );
        assert_eq!(wounded, vec![json!({"id": "bob", "hp": 8})]);
    }

    #[test]
    fn test_has_and_has_matching() {
        let store = party_store();
        assert!(store.has("party.1.hp"));
        assert!(!store.has("party.2.hp"));
        assert!(store.has_matching("turn", &crate::filter::eq(1)));
    }

    #[test]
    fn test_unsubscribe_handle() {
        let store = party_store();
        let fired = Rc::new(RefCell::new(0));
        let count = fired.clone();
        let sub = store.observe("turn", move |_, _, _| *count.borrow_mut() += 1);

        store.dispatch(vec![set("turn", 2)]);
        sub.unsubscribe();
        sub.unsubscribe(); // no-op
        store.dispatch(vec![set("turn", 3)]);

        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn test_history_timestamps_monotonic() {
        let store = party_store();
        store.dispatch(vec![set("turn", 2)]);
        store.dispatch(vec![set("turn", 3)]);
        let history = store.history();
        assert!(history[0].timestamp <= history[1].timestamp);
    }

    #[test]
    fn test_replay_to_reconstructs_intermediate_states() {
        let store = party_store();
        store.dispatch(vec![set("turn", 2)]);
        store.dispatch(vec![set("turn", 3)]);
        store.dispatch(vec![set("turn", 4)]);

        assert_eq!(store.replay_to(0).unwrap()["turn"], 2);
        assert_eq!(store.replay_to(1).unwrap()["turn"], 3);
        // Live state unaffected by replay.
        assert_eq!(store.get("turn"), Some(json!(4)));
    }

    #[test]
    fn test_replay_invalid_index() {
        let store = party_store();
        assert!(matches!(
            store.replay_to(0),
            Err(HistoryError::InvalidReplayIndex { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_clear_history_keeps_state() {
        let store = party_store();
        store.dispatch(vec![set("turn", 2)]);
        store.clear_history();
        assert_eq!(store.history_len(), 0);
        assert_eq!(store.get("turn"), Some(json!(2)));
    }

    #[test]
    fn test_initial_state_retained() {
        let store = party_store();
        store.dispatch(vec![set("turn", 99)]);
        assert_eq!(store.initial_state()["turn"], 1);
    }
}
