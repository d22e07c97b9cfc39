//! Store Adapter.
//!
//! `SectionStore` is the abstraction boundary to the external atomspace: any
//! backend that can upsert/delete `(entity, basis) -> count` pairs, answer a
//! right-star query, and record membership satisfies it. This crate ships one
//! backend, [`InMemoryStore`], built on `hashbrown::HashMap` as a
//! context-keyed map with get-or-create access — one open-ended sparse
//! vector per entity.
//!
//! # Invariants
//! - **I-STORE-001** — sparsity: `set_count` with `c <= 0.0` removes the
//!   pair; it never exists with a non-positive count.
//! - **I-STORE-002** — `paired_right_stars` yields exactly one tuple per basis
//!   in `support(a) ∪ support(b)`; at most one slot per tuple is `None`.

use hashbrown::HashMap;

use crate::entity::{BasisId, Entity, EntityId, EntityKind};

/// A single `(entity, basis, count)` observation, used by `right_stars`.
pub type Pair = (BasisId, f64);

/// Store adapter contract.
///
/// Implementors back this crate's merge algebra with persistent storage.
/// Every method here is meant to be cheap enough to call from the merge
/// engine's inner loops; a real backend should cache aggressively and
/// treat `set_count`/`persist_membership` as the only required durability
/// points.
pub trait SectionStore {
    /// Current count of `(entity, basis)`, or 0.0 if the pair does not exist.
    fn count(&self, entity: EntityId, basis: BasisId) -> f64;

    /// Upsert `(entity, basis) <- count` if `count > 0.0`; otherwise delete
    /// the pair from both the in-memory index and the durable store.
    fn set_count(&mut self, entity: EntityId, basis: BasisId, count: f64);

    /// Every extant pair with `entity` on the left, order unspecified.
    fn right_stars(&self, entity: EntityId) -> Vec<Pair>;

    /// Co-iteration over the union of bases of `a` and `b`.
    ///
    /// For each basis in `support(a) ∪ support(b)`, yields a tuple whose
    /// slots are the `(basis, count)` pair on that side, or `None` if that
    /// side has no pair at this basis. Order is unspecified but consistent
    /// within one call.
    fn paired_right_stars(
        &self,
        a: EntityId,
        b: EntityId,
    ) -> Vec<(Option<Pair>, Option<Pair>)>;

    /// Sum of all counts for `entity` — the cached "wildcard" total. The
    /// rank index fetches this before ranking.
    fn wildcard_total(&self, entity: EntityId) -> f64;

    /// Record `atomic ∈ class`.
    fn persist_membership(&mut self, atomic: EntityId, class: EntityId);

    /// Every atomic entity currently recorded as a member of `class`.
    fn members_of(&self, class: EntityId) -> Vec<EntityId>;

    /// Atomic or class (needed by the merge engine's dynamic dispatch).
    fn kind(&self, entity: EntityId) -> EntityKind;

    /// Display name, for observability only.
    fn name(&self, entity: EntityId) -> &str;
}

/// Reference in-memory backend for [`SectionStore`].
///
/// Good enough to back this crate's tests and small corpora; a production
/// deployment is expected to bring its own atomspace-backed adapter.
#[derive(Default)]
pub struct InMemoryStore {
    entities: HashMap<EntityId, Entity>,
    vectors: HashMap<EntityId, HashMap<BasisId, f64>>,
    members: HashMap<EntityId, Vec<EntityId>>,
    next_id: u32,
}

impl InMemoryStore {
    /// Construct an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Register a new atomic entity (a word) and return its id.
    pub fn create_atomic(&mut self, name: impl Into<Box<str>>) -> EntityId {
        let id = self.alloc_id();
        self.entities.insert(id, Entity::atomic(id, name));
        self.vectors.insert(id, HashMap::new());
        id
    }

    /// Register a new class entity and return its id.
    ///
    /// Used internally by the merge engine the first time two atomic
    /// entities merge; exposed publicly so tests and host code can pre-seed
    /// class corpora too.
    pub fn create_class(&mut self, name: impl Into<Box<str>>) -> EntityId {
        let id = self.alloc_id();
        self.entities.insert(id, Entity::class(id, name));
        self.vectors.insert(id, HashMap::new());
        id
    }

    /// Directly set a count, bypassing nothing — identical to `set_count`,
    /// exposed under a friendlier name for test/corpus setup.
    pub fn seed(&mut self, entity: EntityId, basis: BasisId, count: f64) {
        self.set_count(entity, basis, count);
    }

    /// Total number of registered entities (atomic + class).
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Registered entity metadata, if `id` is known to this store.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    fn vector(&self, entity: EntityId) -> Option<&HashMap<BasisId, f64>> {
        self.vectors.get(&entity)
    }
}

impl SectionStore for InMemoryStore {
    fn count(&self, entity: EntityId, basis: BasisId) -> f64 {
        self.vector(entity)
            .and_then(|v| v.get(&basis))
            .copied()
            .unwrap_or(0.0)
    }

    fn set_count(&mut self, entity: EntityId, basis: BasisId, count: f64) {
        let vector = self.vectors.entry(entity).or_insert_with(HashMap::new);
        if count > 0.0 {
            vector.insert(basis, count);
        } else {
            vector.remove(&basis);
        }
    }

    fn right_stars(&self, entity: EntityId) -> Vec<Pair> {
        match self.vector(entity) {
            Some(v) => v.iter().map(|(&b, &c)| (b, c)).collect(),
            None => Vec::new(),
        }
    }

    fn paired_right_stars(
        &self,
        a: EntityId,
        b: EntityId,
    ) -> Vec<(Option<Pair>, Option<Pair>)> {
        let empty = HashMap::new();
        let va = self.vector(a).unwrap_or(&empty);
        let vb = self.vector(b).unwrap_or(&empty);

        let mut bases: hashbrown::HashSet<BasisId> =
            hashbrown::HashSet::with_capacity(va.len() + vb.len());
        bases.extend(va.keys().copied());
        bases.extend(vb.keys().copied());

        bases
            .into_iter()
            .map(|basis| {
                let sa = va.get(&basis).map(|&c| (basis, c));
                let sb = vb.get(&basis).map(|&c| (basis, c));
                (sa, sb)
            })
            .collect()
    }

    fn wildcard_total(&self, entity: EntityId) -> f64 {
        self.vector(entity).map_or(0.0, |v| v.values().sum())
    }

    fn persist_membership(&mut self, atomic: EntityId, class: EntityId) {
        let members = self.members.entry(class).or_insert_with(Vec::new);
        if !members.contains(&atomic) {
            members.push(atomic);
        }
    }

    fn members_of(&self, class: EntityId) -> Vec<EntityId> {
        self.members.get(&class).cloned().unwrap_or_default()
    }

    fn kind(&self, entity: EntityId) -> EntityKind {
        self.entities
            .get(&entity)
            .map(|e| e.kind)
            .unwrap_or(EntityKind::Atomic)
    }

    fn name(&self, entity: EntityId) -> &str {
        self.entities.get(&entity).map_or("?", |e| &e.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_count_upserts_positive_and_deletes_non_positive() {
        let mut store = InMemoryStore::new();
        let a = store.create_atomic("a");
        let x = BasisId(0);

        assert_eq!(store.count(a, x), 0.0);
        store.set_count(a, x, 4.0);
        assert_eq!(store.count(a, x), 4.0);

        store.set_count(a, x, 0.0);
        assert_eq!(store.count(a, x), 0.0);
        assert!(store.right_stars(a).is_empty());
    }

    #[test]
    fn negative_count_also_deletes() {
        let mut store = InMemoryStore::new();
        let a = store.create_atomic("a");
        let x = BasisId(0);
        store.set_count(a, x, 3.0);
        store.set_count(a, x, -1.0);
        assert_eq!(store.count(a, x), 0.0);
    }

    #[test]
    fn paired_right_stars_unions_supports() {
        let mut store = InMemoryStore::new();
        let a = store.create_atomic("a");
        let b = store.create_atomic("b");
        store.seed(a, BasisId(0), 4.0);
        store.seed(a, BasisId(1), 2.0);
        store.seed(b, BasisId(0), 2.0);
        store.seed(b, BasisId(2), 5.0);

        let mut pairs = store.paired_right_stars(a, b);
        pairs.sort_by_key(|(sa, sb)| sa.or(*sb).unwrap().0 .0);

        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0], (Some((BasisId(0), 4.0)), Some((BasisId(0), 2.0))));
        assert_eq!(pairs[1], (Some((BasisId(1), 2.0)), None));
        assert_eq!(pairs[2], (None, Some((BasisId(2), 5.0))));
    }

    #[test]
    fn wildcard_total_sums_support() {
        let mut store = InMemoryStore::new();
        let a = store.create_atomic("a");
        store.seed(a, BasisId(0), 3.0);
        store.seed(a, BasisId(1), 7.0);
        assert_eq!(store.wildcard_total(a), 10.0);
    }

    #[test]
    fn membership_is_idempotent_and_queryable() {
        let mut store = InMemoryStore::new();
        let w = store.create_atomic("w");
        let k = store.create_class("k");
        store.persist_membership(w, k);
        store.persist_membership(w, k);
        assert_eq!(store.members_of(k), vec![w]);
    }

    #[test]
    fn kind_and_name_reflect_creation() {
        let mut store = InMemoryStore::new();
        let w = store.create_atomic("dog");
        let k = store.create_class("animal");
        assert_eq!(store.kind(w), EntityKind::Atomic);
        assert_eq!(store.kind(k), EntityKind::Class);
        assert_eq!(store.name(w), "dog");
        assert_eq!(store.name(k), "animal");
    }
}
