//! Error types for store operations.
//!
//! Mutation failures are the only recoverable error kind in this engine;
//! they are caught by the transaction executor and surfaced as a
//! [`TransactionError`] value on the result, never as a panic across
//! `dispatch`. Path-resolution failures in reads are not errors at all.

use crate::path::Path;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while applying a single mutation.
#[derive(Clone, Debug, Error)]
pub enum StoreError {
    /// Path does not resolve in the state tree.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The path that was not found.
        path: Path,
    },

    /// Sequence index is out of bounds.
    #[error("index {index} out of bounds (len: {len}) at path {path}")]
    IndexOutOfBounds {
        /// The path to the sequence.
        path: Path,
        /// The index that was accessed.
        index: usize,
        /// The actual length of the sequence.
        len: usize,
    },

    /// Type mismatch when traversing or mutating a value.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The path where the mismatch occurred.
        path: Path,
        /// The expected type.
        expected: &'static str,
        /// The actual type found.
        found: &'static str,
    },

    /// Malformed mutation (e.g. `remove_key` on the root path).
    #[error("invalid mutation: {message}")]
    InvalidMutation {
        /// Description of what went wrong.
        message: String,
    },
}

impl StoreError {
    /// Create a path not found error.
    #[inline]
    pub fn path_not_found(path: Path) -> Self {
        StoreError::PathNotFound { path }
    }

    /// Create an index out of bounds error.
    #[inline]
    pub fn index_out_of_bounds(path: Path, index: usize, len: usize) -> Self {
        StoreError::IndexOutOfBounds { path, index, len }
    }

    /// Create a type mismatch error.
    #[inline]
    pub fn type_mismatch(path: Path, expected: &'static str, found: &'static str) -> Self {
        StoreError::TypeMismatch {
            path,
            expected,
            found,
        }
    }

    /// Create an invalid mutation error.
    #[inline]
    pub fn invalid_mutation(message: impl Into<String>) -> Self {
        StoreError::InvalidMutation {
            message: message.into(),
        }
    }
}

/// A failed transaction, carried on [`TransactionResult`](crate::TransactionResult).
///
/// Records which mutation failed, the descriptions of the mutations that
/// had already been applied to the working copy (none of which became
/// visible), and the underlying mutation error.
#[derive(Clone, Debug, Error)]
#[error("transaction failed at `{failed}`: {source}")]
pub struct TransactionError {
    /// Description of the mutation that failed.
    pub failed: String,
    /// Descriptions of the mutations applied before the failure.
    pub applied: Vec<String>,
    /// The underlying mutation error.
    #[source]
    pub source: StoreError,
}

/// Errors from history replay.
#[derive(Clone, Debug, Error)]
pub enum HistoryError {
    /// Replay index is past the end of history.
    #[error("invalid replay index: {index}, history length: {len}")]
    InvalidReplayIndex {
        /// The requested index.
        index: usize,
        /// The current history length.
        len: usize,
    },

    /// A committed transaction failed to re-apply.
    ///
    /// Mutations are pure, so this indicates a non-deterministic mutation
    /// closure rather than a store bug.
    #[error("replay failed at transaction {index}: {source}")]
    ReplayFailed {
        /// Index of the history record that failed.
        index: usize,
        /// The underlying transaction error.
        #[source]
        source: TransactionError,
    },
}

/// Get the type name of a state tree value.
#[inline]
pub fn value_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
