//! Merge Engine — the largest and most intricate component. Two merge
//! policies, both built on the same three-pass shape:
//! build a class vector, dot it against each constituent, then
//! orthogonalize (or project) the constituents against it.
//!
//! Pass 1 is buffered in a local map before anything touches the store, so
//! an empty result (disjoint supports, α = 0) never creates a class entity
//! or persists a membership record — only once Pass 1 proves the class has
//! positive mass do we allocate `K` and write anything.
//!
//! Private pass-functions are named for the thing they do; invariants worth
//! calling out get an `I-*` tag in their doc comment, same as elsewhere in
//! this crate.

use hashbrown::HashMap;

use crate::config::ClusterConfig;
use crate::entity::{BasisId, EntityId};
use crate::error::{ClusterError, ClusterResult};
use crate::store::SectionStore;

/// Orthogonal merge.
///
/// `wa` may be atomic or a class; `wb` must be atomic. Returns the class `K`
/// — either newly created (if `wa` was atomic) or `wa` itself (if it was
/// already a class). A merge whose resulting class vector has zero length
/// is a no-op: `wa` is returned unchanged and nothing is created or
/// persisted (covers the `α = 0` with disjoint supports boundary).
pub fn merge_ortho(
    store: &mut dyn SectionStore,
    config: &ClusterConfig,
    wa: EntityId,
    wb: EntityId,
) -> ClusterResult<EntityId> {
    if wa == wb {
        return Err(ClusterError::SelfMerge(wa));
    }
    let wa_is_atomic = store.kind(wa).is_atomic();
    let alpha = config.merge_fraction;

    // Pass 1 — build the class vector (I-MERGE-001: buffered, not written,
    // until we know it has positive mass).
    let pairs = store.paired_right_stars(wa, wb);
    let mut k_vector: HashMap<BasisId, f64> = HashMap::with_capacity(pairs.len());
    let mut l2 = 0.0_f64;
    for (sa, sb) in pairs {
        let basis = sa.map(|(b, _)| b).or_else(|| sb.map(|(b, _)| b))
            .expect("co-iteration never yields two absent slots");
        let a = sa.map_or(0.0, |(_, c)| c);
        let w = sb.map_or(0.0, |(_, c)| c);
        let k = match (sa.is_some(), sb.is_some()) {
            (true, true) => a + w,
            (true, false) if wa_is_atomic => alpha * a,
            (true, false) => a, // lone side belongs to a class: take full mass
            (false, true) => alpha * w,
            (false, false) => unreachable!(),
        };
        if k > 0.0 {
            l2 += k * k;
            k_vector.insert(basis, k);
        }
    }

    if l2 <= 0.0 {
        return Ok(wa);
    }

    let (k, created) = if wa_is_atomic {
        let name = format!("{}+{}", store.name(wa), store.name(wb));
        (store.create_class(name), true)
    } else {
        (wa, false)
    };

    for (basis, count) in &k_vector {
        store.set_count(k, *basis, *count);
    }
    if created {
        store.persist_membership(wa, k);
    }
    store.persist_membership(wb, k);

    // Pass 2 + 3 — dot product and orthogonalization, per constituent.
    if wa_is_atomic {
        orthogonalize_against(store, k, wa, l2);
    }
    orthogonalize_against(store, k, wb, l2);

    Ok(k)
}

/// Pass 2 (dot product) + Pass 3 (orthogonalize-and-clamp) for one
/// constituent `e` against the class `k`.
///
/// `orth = count(e,b) - u*count(k,b)`; a non-positive result deletes the
/// pair (I-MERGE-002: this is the zero-clamp — it breaks linearity and is
/// the accepted lossy step that keeps counts non-negative).
fn orthogonalize_against(store: &mut dyn SectionStore, k: EntityId, e: EntityId, l2: f64) {
    let pairs = store.paired_right_stars(k, e);
    let dot: f64 = pairs
        .iter()
        .map(|(sk, se)| sk.map_or(0.0, |(_, c)| c) * se.map_or(0.0, |(_, c)| c))
        .sum();
    let u = dot / l2;

    for (sk, se) in pairs {
        let basis = sk.map(|(b, _)| b).or_else(|| se.map(|(b, _)| b))
            .expect("co-iteration never yields two absent slots");
        let ck = sk.map_or(0.0, |(_, c)| c);
        let ce = se.map_or(0.0, |(_, c)| c);
        store.set_count(e, basis, ce - u * ck);
    }
}

/// Semantic merge — overlap-only class construction.
///
/// Only the shared support `S = support(wa) ∩ support(wb)` contributes to
/// `K`; the rest of each constituent's mass is left behind as a residual
/// (not orthogonalized). When `config.merge_fraction > 0`, a further
/// α-scaled `v_B − v_clamp` is folded back into `K` at every basis, where
/// `v_perp = v_B − u·v_A` is `WB`'s component orthogonal to `WA` and
/// `v_clamp = max(v_perp, 0)`. A sigmoid variant of this redistribution is
/// mentioned but left unspecified; this is the plain linear reading.
pub fn merge_semantic(
    store: &mut dyn SectionStore,
    config: &ClusterConfig,
    wa: EntityId,
    wb: EntityId,
) -> ClusterResult<EntityId> {
    if wa == wb {
        return Err(ClusterError::SelfMerge(wa));
    }
    let wa_is_atomic = store.kind(wa).is_atomic();
    let alpha = config.merge_fraction;

    let pairs = store.paired_right_stars(wa, wb);

    // Overlap-only projection: v_A-pi, v_B-pi.
    let mut k_contribution: HashMap<BasisId, f64> = HashMap::new();
    let mut wa_overlap: HashMap<BasisId, f64> = HashMap::new();
    let mut wb_overlap: HashMap<BasisId, f64> = HashMap::new();
    for (sa, sb) in &pairs {
        if let (Some((b, ca)), Some((_, cb))) = (sa, sb) {
            wa_overlap.insert(*b, *ca);
            wb_overlap.insert(*b, *cb);
            let contribution = if wa_is_atomic { ca + cb } else { *cb };
            k_contribution.insert(*b, contribution);
        }
    }

    if alpha > 0.0 {
        let l2_a: f64 = pairs.iter().map(|(sa, _)| sa.map_or(0.0, |(_, c)| c * c)).sum();
        if l2_a > 0.0 {
            let dot_ab: f64 = pairs
                .iter()
                .map(|(sa, sb)| sa.map_or(0.0, |(_, c)| c) * sb.map_or(0.0, |(_, c)| c))
                .sum();
            let u = dot_ab / l2_a;
            for (sa, sb) in &pairs {
                let basis = sa.map(|(b, _)| b).or_else(|| sb.map(|(b, _)| b))
                    .expect("co-iteration never yields two absent slots");
                let ca = sa.map_or(0.0, |(_, c)| c);
                let cb = sb.map_or(0.0, |(_, c)| c);
                let v_perp = cb - u * ca;
                let v_clamp = v_perp.max(0.0);
                let term = alpha * (cb - v_clamp);
                if term > 0.0 {
                    *k_contribution.entry(basis).or_insert(0.0) += term;
                }
            }
        }
    }

    if !k_contribution.values().any(|&v| v > 0.0) {
        return Ok(wa);
    }

    let (k, created) = if wa_is_atomic {
        let name = format!("{}+{}", store.name(wa), store.name(wb));
        (store.create_class(name), true)
    } else {
        (wa, false)
    };

    if wa_is_atomic {
        for (&basis, &contribution) in &k_contribution {
            if contribution > 0.0 {
                store.set_count(k, basis, contribution);
            }
        }
    } else {
        for (&basis, &delta) in &k_contribution {
            if delta != 0.0 {
                let existing = store.count(k, basis);
                store.set_count(k, basis, existing + delta);
            }
        }
    }

    if created {
        store.persist_membership(wa, k);
    }
    store.persist_membership(wb, k);

    if wa_is_atomic {
        for (&basis, &v) in &wa_overlap {
            let residual = store.count(wa, basis) - v;
            store.set_count(wa, basis, residual);
        }
    }
    for (&basis, &v) in &wb_overlap {
        let residual = store.count(wb, basis) - v;
        store.set_count(wb, basis, residual);
    }

    Ok(k)
}
