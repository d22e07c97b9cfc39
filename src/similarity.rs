//! Similarity Oracle.
//!
//! Cosine similarity computed by co-iterating the two entities' sparse
//! vectors through `SectionStore::paired_right_stars`. Every comparison
//! emits a `tracing::debug!` event carrying the fields an observability
//! layer needs to reconstruct a merge decision after the fact.

use std::time::Instant;

use crate::config::ClusterConfig;
use crate::entity::EntityId;
use crate::store::SectionStore;

/// Cosine similarity between `a` and `b`'s vectors.
///
/// Returns 0.0 if either side has empty support — cosine is undefined there,
/// and 0.0 makes `should_merge` reject the pair without a special case.
pub fn cosine(store: &dyn SectionStore, a: EntityId, b: EntityId) -> f64 {
    let pairs = store.paired_right_stars(a, b);

    let mut dot = 0.0;
    let mut sq_a = 0.0;
    let mut sq_b = 0.0;
    for (sa, sb) in pairs {
        let ca = sa.map_or(0.0, |(_, c)| c);
        let cb = sb.map_or(0.0, |(_, c)| c);
        dot += ca * cb;
        sq_a += ca * ca;
        sq_b += cb * cb;
    }

    if sq_a <= 0.0 || sq_b <= 0.0 {
        return 0.0;
    }
    dot / (sq_a.sqrt() * sq_b.sqrt())
}

/// `cosine(a, b) >= θ`, where `θ` is `config.cosine_threshold`.
///
/// Deterministic and symmetric (P5): depends only on the counts currently in
/// the store, and `cosine(a, b) == cosine(b, a)` because co-iteration is
/// symmetric in its two arguments.
pub fn should_merge(store: &dyn SectionStore, config: &ClusterConfig, a: EntityId, b: EntityId) -> bool {
    let start = Instant::now();
    let sim = cosine(store, a, b);
    let verdict = sim >= config.cosine_threshold;

    tracing::debug!(
        cosine = sim,
        a_kind = %store.kind(a),
        b_kind = %store.kind(b),
        a_name = store.name(a),
        b_name = store.name(b),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        verdict,
        "similarity comparison"
    );

    verdict
}
