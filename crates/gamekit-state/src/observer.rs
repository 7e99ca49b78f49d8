//! Path-scoped observer registry.
//!
//! Observers subscribe to exact or wildcard path patterns and fire
//! synchronously, in registration order, once per matching diff entry.
//! The registry belongs to a single store instance; there is no
//! process-wide singleton.

use crate::diff::Diff;
use crate::path::Path;
use crate::pattern::Pattern;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Context passed to an observer invocation.
///
/// `path` is the concrete path of the specific change, with any wildcards
/// in the subscribed pattern resolved to the actual key or index.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeContext {
    /// Concrete path of the change.
    pub path: Path,
}

/// Observer callback: `(new_value, old_value, context)`.
///
/// `None` means the value was absent on that side of the change.
pub type ObserverFn = Rc<dyn Fn(Option<&Value>, Option<&Value>, &ChangeContext)>;

struct Subscription {
    id: u64,
    pattern: Pattern,
    callback: ObserverFn,
}

/// Registry of pattern subscriptions for one store.
#[derive(Default)]
pub struct ObserverRegistry {
    subscriptions: RefCell<Vec<Subscription>>,
    next_id: Cell<u64>,
}

impl ObserverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for a pattern. Returns the subscription id.
    pub fn subscribe(&self, pattern: Pattern, callback: ObserverFn) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscriptions.borrow_mut().push(Subscription {
            id,
            pattern,
            callback,
        });
        id
    }

    /// Remove a subscription. Removing an unknown id is a no-op.
    pub fn unsubscribe(&self, id: u64) -> bool {
        let mut subs = self.subscriptions.borrow_mut();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    /// True if no subscriptions are registered.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.borrow().is_empty()
    }

    /// Fire every subscription whose pattern matches a diff entry.
    ///
    /// For each entry, matching callbacks are snapshotted before any of
    /// them runs, so a callback may subscribe, unsubscribe, or dispatch on
    /// the same store without deadlocking the registry.
    pub fn notify(&self, diff: &Diff) {
        for entry in diff {
            let matching: Vec<ObserverFn> = self
                .subscriptions
                .borrow()
                .iter()
                .filter(|s| s.pattern.matches(&entry.path))
                .map(|s| Rc::clone(&s.callback))
                .collect();
            if matching.is_empty() {
                continue;
            }
            let ctx = ChangeContext {
                path: entry.path.clone(),
            };
            for callback in matching {
                callback(entry.to.as_ref(), entry.from.as_ref(), &ctx);
            }
        }
    }
}

/// Handle that removes a subscription from its registry.
///
/// Calling [`unsubscribe`](Unsubscriber::unsubscribe) more than once is a
/// no-op. Subscriptions never auto-expire; dropping the handle without
/// calling it leaves the observer registered.
pub struct Unsubscriber {
    registry: Rc<ObserverRegistry>,
    id: u64,
}

impl Unsubscriber {
    pub(crate) fn new(registry: Rc<ObserverRegistry>, id: u64) -> Self {
        Self { registry, id }
    }

    /// Remove the subscription. Idempotent.
    pub fn unsubscribe(&self) {
        self.registry.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute_diff;
    use serde_json::json;

    fn record_paths(log: Rc<RefCell<Vec<String>>>) -> ObserverFn {
        Rc::new(move |_new, _old, ctx| log.borrow_mut().push(ctx.path.to_string()))
    }

    #[test]
    fn test_exact_pattern_fires_once() {
        let registry = ObserverRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry.subscribe(Pattern::parse("turn"), record_paths(log.clone()));

        let diff = compute_diff(&json!({"turn": 1}), &json!({"turn": 2}));
        registry.notify(&diff);

        assert_eq!(*log.borrow(), vec!["turn".to_owned()]);
    }

    #[test]
    fn test_wildcard_fires_per_concrete_path() {
        let registry = ObserverRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry.subscribe(Pattern::parse("party.*.hp"), record_paths(log.clone()));

        let diff = compute_diff(
            &json!({"party": [{"hp": 20}, {"hp": 15}]}),
            &json!({"party": [{"hp": 12}, {"hp": 8}]}),
        );
        registry.notify(&diff);

        assert_eq!(
            *log.borrow(),
            vec!["party.0.hp".to_owned(), "party.1.hp".to_owned()]
        );
    }

    #[test]
    fn test_callbacks_receive_new_and_old_values() {
        let registry = ObserverRegistry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        registry.subscribe(
            Pattern::parse("party.0.hp"),
            Rc::new(move |new, old, _ctx| {
                sink.borrow_mut().push((old.cloned(), new.cloned()));
            }),
        );

        let diff = compute_diff(
            &json!({"party": [{"hp": 20}]}),
            &json!({"party": [{"hp": 15}]}),
        );
        registry.notify(&diff);

        assert_eq!(
            *seen.borrow(),
            vec![(Some(json!(20)), Some(json!(15)))]
        );
    }

    #[test]
    fn test_registration_order_preserved() {
        let registry = ObserverRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let sink = log.clone();
            registry.subscribe(
                Pattern::parse("turn"),
                Rc::new(move |_, _, _| sink.borrow_mut().push(tag)),
            );
        }

        registry.notify(&compute_diff(&json!({"turn": 1}), &json!({"turn": 2})));
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_segment_count_mismatch_never_matches() {
        let registry = ObserverRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry.subscribe(Pattern::parse("party.*"), record_paths(log.clone()));

        let diff = compute_diff(
            &json!({"party": [{"hp": 20}]}),
            &json!({"party": [{"hp": 15}]}),
        );
        // Change is at party.0.hp (three segments); party.* has two.
        registry.notify(&diff);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_unsubscribe_stops_firing() {
        let registry = ObserverRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = registry.subscribe(Pattern::parse("turn"), record_paths(log.clone()));

        assert!(registry.unsubscribe(id));
        registry.notify(&compute_diff(&json!({"turn": 1}), &json!({"turn": 2})));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_unsubscriber_is_idempotent() {
        let registry = Rc::new(ObserverRegistry::new());
        let id = registry.subscribe(Pattern::parse("turn"), Rc::new(|_, _, _| {}));
        let handle = Unsubscriber::new(registry.clone(), id);

        handle.unsubscribe();
        handle.unsubscribe();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_callback_may_mutate_registry() {
        let registry = Rc::new(ObserverRegistry::new());
        let reg2 = registry.clone();
        registry.subscribe(
            Pattern::parse("turn"),
            Rc::new(move |_, _, _| {
                reg2.subscribe(Pattern::parse("score"), Rc::new(|_, _, _| {}));
            }),
        );

        registry.notify(&compute_diff(&json!({"turn": 1}), &json!({"turn": 2})));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_length_entry_matches_length_pattern() {
        let registry = ObserverRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry.subscribe(Pattern::parse("log.length"), record_paths(log.clone()));

        let diff = compute_diff(&json!({"log": ["a"]}), &json!({"log": ["a", "b"]}));
        registry.notify(&diff);
        assert_eq!(*log.borrow(), vec!["log.length".to_owned()]);
    }

    #[test]
    fn test_added_path_old_value_absent() {
        let registry = ObserverRegistry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        registry.subscribe(
            Pattern::parse("score"),
            Rc::new(move |new, old, _| {
                sink.borrow_mut().push((old.is_none(), new.cloned()));
            }),
        );

        registry.notify(&compute_diff(&json!({}), &json!({"score": 100})));
        assert_eq!(*seen.borrow(), vec![(true, Some(json!(100)))]);
    }
}
