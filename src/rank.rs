//! Support/Rank Index.
//!
//! Caches each entity's observation total so `trim_and_rank` does not have to
//! re-sum a sparse vector on every call. The cache is a snapshot: totals may
//! lag mutations, and the index exposes a refresh-on-demand primitive rather
//! than auto-updating — `refresh` is that primitive. Whether a caller
//! re-ranks between blocks is left to the caller; this index does not do it
//! automatically.

use hashbrown::HashMap;

use crate::entity::EntityId;
use crate::store::SectionStore;

/// Per-entity observation totals, refreshed on demand.
#[derive(Default)]
pub struct ObservationIndex {
    totals: HashMap<EntityId, f64>,
}

impl ObservationIndex {
    /// Construct an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialise `entity`'s wildcard total into the cache, overwriting any
    /// previous value. Equivalent to `refresh`; kept as a separate name for
    /// the "issue a prefetch for every candidate before ranking" call site.
    pub fn prefetch(&mut self, store: &dyn SectionStore, entity: EntityId) {
        self.totals.insert(entity, store.wildcard_total(entity));
    }

    /// Re-fetch `entity`'s total from the store.
    pub fn refresh(&mut self, store: &dyn SectionStore, entity: EntityId) {
        self.prefetch(store, entity);
    }

    /// The cached total for `entity`, or 0.0 if never prefetched.
    pub fn observation_total(&self, entity: EntityId) -> f64 {
        self.totals.get(&entity).copied().unwrap_or(0.0)
    }

    /// Filter entities below `min_obs`, then sort descending by cached total.
    ///
    /// Stable on ties — entities with equal totals keep their relative
    /// order from `entities`.
    pub fn trim_and_rank(&self, entities: &[EntityId], min_obs: f64) -> Vec<EntityId> {
        let mut ranked: Vec<EntityId> = entities
            .iter()
            .copied()
            .filter(|&e| self.observation_total(e) >= min_obs)
            .collect();
        ranked.sort_by(|&a, &b| {
            self.observation_total(b)
                .partial_cmp(&self.observation_total(a))
                .unwrap_or(core::cmp::Ordering::Equal)
        });
        ranked
    }
}
