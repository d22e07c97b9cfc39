//! Engine configuration.
//!
//! A plain struct, a `Default` impl holding the documented defaults, and
//! `with_*` builder setters for ergonomic construction. `serde` is
//! feature-gated so a host binary can deserialize this from whatever config
//! format it prefers — this crate does not read files or environment
//! variables itself.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All tunables for a clustering run, with their documented defaults.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterConfig {
    /// `θ` — minimum cosine similarity for a merge. Default 0.65.
    pub cosine_threshold: f64,
    /// `α` — fraction of unshared mass crossing into a class. Default 0.3.
    pub merge_fraction: f64,
    /// Minimum observation total for an entity to be ranked. Default 20.
    pub min_observations: f64,
    /// Initial block size for the chunked scan. Default 20.
    pub initial_chunk_size: usize,
    /// Coefficient on `|classes|²` for the skip-ahead. Default 0.35.
    pub skip_fraction: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cosine_threshold: 0.65,
            merge_fraction: 0.3,
            min_observations: 20.0,
            initial_chunk_size: 20,
            skip_fraction: 0.35,
        }
    }
}

impl ClusterConfig {
    /// Start from the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override `cosine_threshold`.
    pub fn with_cosine_threshold(mut self, theta: f64) -> Self {
        self.cosine_threshold = theta;
        self
    }

    /// Override `merge_fraction`.
    pub fn with_merge_fraction(mut self, alpha: f64) -> Self {
        self.merge_fraction = alpha;
        self
    }

    /// Override `min_observations`.
    pub fn with_min_observations(mut self, min_obs: f64) -> Self {
        self.min_observations = min_obs;
        self
    }

    /// Override `initial_chunk_size`.
    pub fn with_initial_chunk_size(mut self, size: usize) -> Self {
        self.initial_chunk_size = size;
        self
    }

    /// Override `skip_fraction`.
    pub fn with_skip_fraction(mut self, fraction: f64) -> Self {
        self.skip_fraction = fraction;
        self
    }
}
