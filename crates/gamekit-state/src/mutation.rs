//! Mutation primitives: self-describing, path-addressed state edits.
//!
//! Mutations are the only way external code changes a store. Each one is a
//! pure value-level transform `state -> state`: applying it never touches
//! the input tree, and a failed application leaves nothing behind. Batches
//! of mutations are committed atomically by the transaction executor.

use crate::error::{value_type_name, StoreError, StoreResult};
use crate::path::{Path, Seg};
use crate::query::get_at_path;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// Function applied by an `update` mutation.
///
/// Receives the current value at the path (`None` when the path does not
/// resolve) and returns the replacement value.
pub type UpdateFn = Rc<dyn Fn(Option<&Value>) -> Value>;

/// Predicate used by a `remove_where` mutation.
pub type RemoveFn = Rc<dyn Fn(&Value) -> bool>;

/// The edit a mutation performs at its path.
#[derive(Clone)]
pub enum MutationKind {
    /// Replace the value at the path.
    Set(Value),
    /// Transform the current value (possibly absent) at the path.
    Update(UpdateFn),
    /// Append an item to the sequence at the path.
    Push(Value),
    /// Drop every sequence item the predicate accepts.
    RemoveWhere(RemoveFn),
    /// Remove the final segment's key from its parent mapping.
    RemoveKey,
}

impl MutationKind {
    /// Short name of the edit, used in descriptions and logs.
    pub fn name(&self) -> &'static str {
        match self {
            MutationKind::Set(_) => "set",
            MutationKind::Update(_) => "update",
            MutationKind::Push(_) => "push",
            MutationKind::RemoveWhere(_) => "remove_where",
            MutationKind::RemoveKey => "remove_key",
        }
    }
}

/// A named, path-addressed pure transformation of a state tree.
///
/// Built via [`set`], [`update`], [`push`], [`remove_where`] or
/// [`remove_key`]; there is no raw "patch state directly" entry point.
/// Mutations are cheap to clone (closures are shared behind `Rc`).
#[derive(Clone)]
pub struct Mutation {
    kind: MutationKind,
    path: Path,
    description: String,
}

impl Mutation {
    fn new(kind: MutationKind, path: Path) -> Self {
        let description = format!("{} {path}", kind.name());
        Self {
            kind,
            path,
            description,
        }
    }

    /// The path this mutation targets.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Human-readable description, e.g. `set party.0.hp`.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Short name of the edit kind (`set`, `push`, ...).
    #[inline]
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Apply this mutation to a state tree, producing a new tree.
    ///
    /// Pure: the input is never modified. Errors are caught by the
    /// transaction executor and roll the whole batch back.
    pub fn apply(&self, state: &Value) -> StoreResult<Value> {
        let mut next = state.clone();
        match &self.kind {
            MutationKind::Set(value) => {
                set_at_path(&mut next, self.path.segments(), value.clone(), &self.path)?;
            }
            MutationKind::Update(f) => {
                let replacement = f(get_at_path(state, &self.path));
                set_at_path(&mut next, self.path.segments(), replacement, &self.path)?;
            }
            MutationKind::Push(item) => {
                let target = resolve_mut(&mut next, &self.path)?;
                match target {
                    Value::Array(arr) => arr.push(item.clone()),
                    other => {
                        return Err(StoreError::type_mismatch(
                            self.path.clone(),
                            "array",
                            value_type_name(other),
                        ))
                    }
                }
            }
            MutationKind::RemoveWhere(pred) => {
                let target = resolve_mut(&mut next, &self.path)?;
                match target {
                    Value::Array(arr) => arr.retain(|item| !pred(item)),
                    other => {
                        return Err(StoreError::type_mismatch(
                            self.path.clone(),
                            "array",
                            value_type_name(other),
                        ))
                    }
                }
            }
            MutationKind::RemoveKey => {
                let key = match self.path.last() {
                    Some(Seg::Key(k)) => k.clone(),
                    Some(Seg::Index(_)) => {
                        return Err(StoreError::invalid_mutation(format!(
                            "remove_key requires a mapping key, got index at {}",
                            self.path
                        )))
                    }
                    None => {
                        return Err(StoreError::invalid_mutation(
                            "remove_key requires a non-root path",
                        ))
                    }
                };
                // parent() is Some: the root case was rejected above
                let parent = self.path.parent().unwrap_or_else(Path::root);
                let target = resolve_mut(&mut next, &parent)?;
                match target {
                    Value::Object(obj) => {
                        obj.remove(&key);
                    }
                    other => {
                        return Err(StoreError::type_mismatch(
                            parent,
                            "object",
                            value_type_name(other),
                        ))
                    }
                }
            }
        }
        Ok(next)
    }
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("kind", &self.kind_name())
            .field("path", &self.path)
            .finish()
    }
}

/// Replace the value at `path` with `value`.
///
/// Fails if an intermediate segment does not resolve to a container of the
/// matching kind. A missing final mapping key is created; sequence indices
/// must be in bounds.
///
/// # Examples
///
/// ```
/// use gamekit_state::set;
/// use serde_json::json;
///
/// let state = json!({"turn": 1});
/// let next = set("turn", 2).apply(&state).unwrap();
/// assert_eq!(next["turn"], 2);
/// assert_eq!(state["turn"], 1); // input untouched
/// ```
pub fn set(path: &str, value: impl Into<Value>) -> Mutation {
    Mutation::new(MutationKind::Set(value.into()), Path::parse(path))
}

/// Read the current value at `path`, apply `f`, and write the result back
/// via the same path-set logic as [`set`].
///
/// `f` receives `None` when the path does not resolve.
pub fn update(path: &str, f: impl Fn(Option<&Value>) -> Value + 'static) -> Mutation {
    Mutation::new(MutationKind::Update(Rc::new(f)), Path::parse(path))
}

/// Append `item` to the sequence at `path`. Fails if the value there is
/// not a sequence.
pub fn push(path: &str, item: impl Into<Value>) -> Mutation {
    Mutation::new(MutationKind::Push(item.into()), Path::parse(path))
}

/// Drop every item of the sequence at `path` for which `pred` is true.
/// Fails if the value there is not a sequence.
pub fn remove_where(path: &str, pred: impl Fn(&Value) -> bool + 'static) -> Mutation {
    Mutation::new(MutationKind::RemoveWhere(Rc::new(pred)), Path::parse(path))
}

/// Remove the final segment's key from its parent mapping. The resulting
/// mapping has no entry for that key. Removing an absent key is a no-op.
pub fn remove_key(path: &str) -> Mutation {
    Mutation::new(MutationKind::RemoveKey, Path::parse(path))
}

/// Strict traversal to a mutable reference, erroring where a read would
/// simply yield nothing.
fn resolve_mut<'a>(current: &'a mut Value, path: &Path) -> StoreResult<&'a mut Value> {
    let mut node = current;
    for (depth, seg) in path.iter().enumerate() {
        let at = || Path::from_segments(path.segments()[..=depth].to_vec());
        node = match (seg, node) {
            (Seg::Key(key), Value::Object(obj)) => obj
                .get_mut(key)
                .ok_or_else(|| StoreError::path_not_found(at()))?,
            (Seg::Index(idx), Value::Array(arr)) => {
                let len = arr.len();
                arr.get_mut(*idx)
                    .ok_or_else(|| StoreError::index_out_of_bounds(at(), *idx, len))?
            }
            (Seg::Key(_), other) => {
                return Err(StoreError::type_mismatch(
                    at(),
                    "object",
                    value_type_name(other),
                ))
            }
            (Seg::Index(_), other) => {
                return Err(StoreError::type_mismatch(
                    at(),
                    "array",
                    value_type_name(other),
                ))
            }
        };
    }
    Ok(node)
}

/// Recursively set a value at a path.
///
/// Intermediate segments must already resolve to a container of the
/// matching kind; only the final mapping key may be absent.
fn set_at_path(
    current: &mut Value,
    segments: &[Seg],
    value: Value,
    full_path: &Path,
) -> StoreResult<()> {
    match segments {
        [] => {
            *current = value;
            Ok(())
        }
        [Seg::Key(key)] => match current {
            Value::Object(obj) => {
                obj.insert(key.clone(), value);
                Ok(())
            }
            other => Err(StoreError::type_mismatch(
                full_path.clone(),
                "object",
                value_type_name(other),
            )),
        },
        [Seg::Index(idx)] => match current {
            Value::Array(arr) => {
                let len = arr.len();
                match arr.get_mut(*idx) {
                    Some(slot) => {
                        *slot = value;
                        Ok(())
                    }
                    None => Err(StoreError::index_out_of_bounds(
                        full_path.clone(),
                        *idx,
                        len,
                    )),
                }
            }
            other => Err(StoreError::type_mismatch(
                full_path.clone(),
                "array",
                value_type_name(other),
            )),
        },
        [Seg::Key(key), rest @ ..] => match current {
            Value::Object(obj) => {
                let child = obj
                    .get_mut(key)
                    .ok_or_else(|| StoreError::path_not_found(full_path.clone()))?;
                set_at_path(child, rest, value, full_path)
            }
            other => Err(StoreError::type_mismatch(
                full_path.clone(),
                "object",
                value_type_name(other),
            )),
        },
        [Seg::Index(idx), rest @ ..] => match current {
            Value::Array(arr) => {
                let len = arr.len();
                let child = arr.get_mut(*idx).ok_or_else(|| {
                    StoreError::index_out_of_bounds(full_path.clone(), *idx, len)
                })?;
                set_at_path(child, rest, value, full_path)
            }
            other => Err(StoreError::type_mismatch(
                full_path.clone(),
                "array",
                value_type_name(other),
            )),
        },
    }
}
