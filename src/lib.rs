//! # disjunct-sieve
//!
//! Agglomerative clustering over sparse observation vectors. Each observed
//! entity — a word — is a sparse non-negative vector whose basis elements
//! are contexts (disjuncts) and whose coefficients are observation counts.
//! Entities compared by cosine similarity above a threshold are merged into
//! a *class* entity whose vector is a linear combination of the inputs; the
//! constituents are then reprojected orthogonal to the class, preserving
//! total observation mass modulo a clamping rule that keeps counts
//! non-negative.
//!
//! ## Layout
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`store`] | Store Adapter — the trait boundary to an external backend, plus [`store::InMemoryStore`] |
//! | [`rank`] | Support/Rank Index — cached observation totals, filtered/sorted candidate lists |
//! | [`similarity`] | Similarity Oracle — cosine similarity and the merge-threshold test |
//! | [`merge`] | Merge Engine — `merge_ortho` and `merge_semantic` |
//! | [`assign`] | Assignment Controller — single-word placement and class expansion |
//! | [`cluster`] | Clustering Loop — the ranked, chunked, full-corpus driver |
//!
//! This crate owns none of its inputs: the backing atomspace, the
//! similarity cache, disjunct-level clustering, raw observation loading,
//! and any CLI/REPL surface are all external collaborators reached through
//! [`store::SectionStore`].
#![deny(unsafe_code)]

pub mod assign;
pub mod cluster;
pub mod config;
pub mod entity;
pub mod error;
pub mod merge;
pub mod rank;
pub mod similarity;
pub mod store;

pub use cluster::{ClusterReport, ClusterStrategy, ClusteringLoop};
pub use config::ClusterConfig;
pub use entity::{BasisId, Entity, EntityId, EntityKind};
pub use error::{ClusterError, ClusterResult};
pub use store::{InMemoryStore, SectionStore};
