//! Structural diffs between two state trees.
//!
//! [`compute_diff`] walks both trees in lock-step and produces the
//! complete, order-stable list of leaf-level changes. Every entry
//! corresponds to a real value change, and every change is represented by
//! some entry; structurally equal trees produce an empty diff.

use crate::path::{Path, Seg};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One leaf-level change between two trees.
///
/// `None` on either side means the value was absent there (a key or index
/// that exists on only one side).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Concrete path of the change.
    pub path: Path,
    /// Value before the change, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Value>,
    /// Value after the change, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Value>,
}

impl DiffEntry {
    /// Create a diff entry.
    #[inline]
    pub fn new(path: Path, from: Option<Value>, to: Option<Value>) -> Self {
        Self { path, from, to }
    }
}

/// The complete list of leaf-level changes between two state trees.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    entries: Vec<DiffEntry>,
}

impl Diff {
    /// The changes, in pre-order walk order.
    #[inline]
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    /// Check if this diff is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over the entries.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter()
    }

    /// Find the entry for a concrete path, if any.
    pub fn entry_at(&self, path: &Path) -> Option<&DiffEntry> {
        self.entries.iter().find(|e| &e.path == path)
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a DiffEntry;
    type IntoIter = std::slice::Iter<'a, DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Compute the structural diff between two state trees.
///
/// Rules, applied per subtree:
/// - equal subtrees contribute nothing;
/// - if either side is not a container, or the container kinds differ, or
///   either side is `null`, one entry is emitted and descent stops;
/// - sequences are compared index-by-index up to the longer length, with a
///   synthetic `<path>.length` entry when lengths differ;
/// - mappings are compared over the union of keys, with keys present on
///   only one side emitting an absent-paired entry.
///
/// Root-level scalar replacement is reported at path `root`.
///
/// # Examples
///
/// ```
/// use gamekit_state::{compute_diff, path};
/// use serde_json::json;
///
/// let before = json!({"turn": 1, "party": [{"hp": 20}]});
/// let after = json!({"turn": 2, "party": [{"hp": 20}]});
/// let diff = compute_diff(&before, &after);
/// assert_eq!(diff.len(), 1);
/// assert_eq!(diff.entries()[0].path, path!("turn"));
/// assert_eq!(diff.entries()[0].from, Some(json!(1)));
/// assert_eq!(diff.entries()[0].to, Some(json!(2)));
/// ```
pub fn compute_diff(before: &Value, after: &Value) -> Diff {
    let mut entries = Vec::new();
    walk(&Path::root(), before, after, &mut entries);
    Diff { entries }
}

fn walk(path: &Path, before: &Value, after: &Value, out: &mut Vec<DiffEntry>) {
    if before == after {
        return;
    }
    match (before, after) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, before_child) in a {
                let child_path = path.with_segment(Seg::key(key));
                match b.get(key) {
                    Some(after_child) => walk(&child_path, before_child, after_child, out),
                    None => out.push(DiffEntry::new(
                        child_path,
                        Some(before_child.clone()),
                        None,
                    )),
                }
            }
            for (key, after_child) in b {
                if !a.contains_key(key) {
                    out.push(DiffEntry::new(
                        path.with_segment(Seg::key(key)),
                        None,
                        Some(after_child.clone()),
                    ));
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            let longer = a.len().max(b.len());
            for idx in 0..longer {
                let child_path = path.with_segment(Seg::index(idx));
                match (a.get(idx), b.get(idx)) {
                    (Some(x), Some(y)) => walk(&child_path, x, y, out),
                    (Some(x), None) => {
                        out.push(DiffEntry::new(child_path, Some(x.clone()), None))
                    }
                    (None, Some(y)) => {
                        out.push(DiffEntry::new(child_path, None, Some(y.clone())))
                    }
                    (None, None) => unreachable!("index below max of both lengths"),
                }
            }
            if a.len() != b.len() {
                out.push(DiffEntry::new(
                    path.with_segment(Seg::key("length")),
                    Some(Value::from(a.len() as u64)),
                    Some(Value::from(b.len() as u64)),
                ));
            }
        }
        // Scalars, nulls, and container-kind mismatches: one leaf entry,
        // no descent.
        _ => out.push(DiffEntry::new(
            path.clone(),
            Some(before.clone()),
            Some(after.clone()),
        )),
    }
}
