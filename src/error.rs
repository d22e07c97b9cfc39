//! Error taxonomy.
//!
//! A small `thiserror`-derived enum of variants, in the same shape used
//! elsewhere in this codebase for fallible boundaries.
//!
//! Missing-pair and zero-length-vector are *not* represented here — both are
//! treated as ordinary values (`count` returns 0.0, `should_merge` returns
//! `false`), never as an error.

use crate::entity::EntityId;

/// Result type used throughout this crate.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors the merge engine and clustering loop can surface.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// The backing store failed to read or write a pair/membership record.
    ///
    /// Fatal to the merge in progress: the caller should abort the run. The
    /// store is expected to be consistent up to the last completed merge,
    /// since each merge call is atomic from this crate's perspective.
    #[error("store I/O failure: {0}")]
    Store(String),

    /// Both operands of a merge named the same entity.
    ///
    /// Not permitted; callers must not pass identical entities into
    /// `merge_ortho` / `merge_semantic`.
    #[error("cannot merge entity {0} with itself")]
    SelfMerge(EntityId),
}

impl ClusterError {
    /// Wrap an arbitrary store-backend error message as [`ClusterError::Store`].
    pub fn store(msg: impl Into<String>) -> Self {
        ClusterError::Store(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_merge_message_names_the_entity() {
        let err = ClusterError::SelfMerge(EntityId(4));
        assert_eq!(err.to_string(), "cannot merge entity e4 with itself");
    }

    #[test]
    fn store_error_wraps_message() {
        let err = ClusterError::store("disk full");
        assert_eq!(err.to_string(), "store I/O failure: disk full");
    }
}
