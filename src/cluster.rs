//! Clustering Loop — the sieve-style driver that ties every other component
//! together: rank via [`crate::rank`], skip the frontier already exhausted
//! by a previous run, chunk the rest into geometrically growing blocks, and
//! block-assign each one.

use crate::config::ClusterConfig;
use crate::entity::EntityId;
use crate::error::ClusterResult;
use crate::rank::ObservationIndex;
use crate::similarity::should_merge;
use crate::store::SectionStore;
use crate::{assign, merge};

/// How block-assign decides when a new multi-member class is promoted.
/// The run uses one strategy throughout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterStrategy {
    /// A word that matches no true class tries to expand-merge with the
    /// rest of its block; a resulting ≥2-member class is appended.
    TrueClassesOnly,
    /// A word that matches no true class is checked against a pool of
    /// provisional singletons; two singletons that match each other are
    /// promoted into a new true class together.
    WithProvisionalSingletons,
}

/// Summary of one `ClusteringLoop::run` call, handed back to the caller's
/// own logging/metrics layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterReport {
    pub true_classes: Vec<EntityId>,
    pub blocks_processed: usize,
    pub entities_considered: usize,
    pub entities_skipped: usize,
}

/// The floor of `skip_fraction * |existing_classes|^2`.
///
/// Implements the `n^2` reading of the skip-ahead formula (see DESIGN.md
/// for the judgment call this resolves).
pub fn skip_count(skip_fraction: f64, existing_class_count: usize) -> usize {
    (skip_fraction * (existing_class_count as f64).powi(2)).floor() as usize
}

/// Partition `entities` into blocks starting at `initial_size` and doubling
/// each block. The final block may be shorter.
pub fn chunk_ranked(entities: &[EntityId], initial_size: usize) -> Vec<Vec<EntityId>> {
    let mut blocks = Vec::new();
    let mut start = 0;
    let mut size = initial_size.max(1);
    while start < entities.len() {
        let end = (start + size).min(entities.len());
        blocks.push(entities[start..end].to_vec());
        start = end;
        size *= 2;
    }
    blocks
}

/// Drives the full-corpus, ranked-and-chunked clustering pass.
pub struct ClusteringLoop {
    config: ClusterConfig,
    strategy: ClusterStrategy,
}

impl ClusteringLoop {
    /// Construct a loop with `TrueClassesOnly` strategy.
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            strategy: ClusterStrategy::TrueClassesOnly,
        }
    }

    /// Override the controller strategy.
    pub fn with_strategy(mut self, strategy: ClusterStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Run one sieve pass over `entities`, extending `true_classes` in place
    /// and returning it plus a [`ClusterReport`]. The rank is computed once
    /// at the start of the run (see DESIGN.md's "stale rank" judgment call)
    /// — a caller that wants fresher ranks between blocks must drive its
    /// own sequence of shorter `run` calls.
    pub fn run(
        &self,
        store: &mut dyn SectionStore,
        entities: &[EntityId],
        mut true_classes: Vec<EntityId>,
    ) -> ClusterResult<ClusterReport> {
        let mut index = ObservationIndex::new();
        for &e in entities {
            index.prefetch(store, e);
        }
        let ranked = index.trim_and_rank(entities, self.config.min_observations);

        let skip = skip_count(self.config.skip_fraction, true_classes.len()).min(ranked.len());
        let surviving: Vec<EntityId> = ranked.into_iter().skip(skip).collect();
        let total = surviving.len();

        let blocks = chunk_ranked(&surviving, self.config.initial_chunk_size);
        let mut provisional: Vec<EntityId> = Vec::new();
        let mut processed = 0usize;
        let mut blocks_processed = 0usize;

        for block in &blocks {
            self.block_assign(store, block, &mut true_classes, &mut provisional)?;
            processed += block.len();
            blocks_processed += 1;

            tracing::info!(
                remaining = total.saturating_sub(processed),
                true_class_count = true_classes.len(),
                "clustering block processed"
            );
        }

        Ok(ClusterReport {
            true_classes,
            blocks_processed,
            entities_considered: total,
            entities_skipped: skip,
        })
    }

    fn block_assign(
        &self,
        store: &mut dyn SectionStore,
        block: &[EntityId],
        true_classes: &mut Vec<EntityId>,
        provisional: &mut Vec<EntityId>,
    ) -> ClusterResult<()> {
        for (i, &word) in block.iter().enumerate() {
            let placed = assign::assign_word_to_class(store, &self.config, word, true_classes)?;
            if placed != word {
                continue; // merged into an existing true class, step 4 "advance"
            }

            match self.strategy {
                ClusterStrategy::TrueClassesOnly => {
                    let rest = &block[i + 1..];
                    let expanded = assign::assign_expand_class(store, &self.config, word, rest)?;
                    if expanded != word && store.members_of(expanded).len() >= 2 {
                        true_classes.push(expanded);
                    }
                }
                ClusterStrategy::WithProvisionalSingletons => {
                    let partner = provisional
                        .iter()
                        .position(|&ps| should_merge(store, &self.config, ps, word));
                    match partner {
                        Some(idx) => {
                            let ps = provisional.remove(idx);
                            let class = merge::merge_ortho(store, &self.config, ps, word)?;
                            true_classes.push(class);
                        }
                        None => provisional.push(word),
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::BasisId;
    use crate::store::InMemoryStore;

    #[test]
    fn scenario_s5_chunking_over_seventy_entities() {
        let entities: Vec<EntityId> = (0..70).map(EntityId).collect();
        let blocks = chunk_ranked(&entities, 20);
        let sizes: Vec<usize> = blocks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![20, 40, 10]);
    }

    #[test]
    fn chunking_exact_multiple_has_no_short_final_block() {
        let entities: Vec<EntityId> = (0..60).map(EntityId).collect();
        let blocks = chunk_ranked(&entities, 20);
        let sizes: Vec<usize> = blocks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![20, 40]);
    }

    #[test]
    fn skip_count_is_quadratic_in_class_count() {
        assert_eq!(skip_count(0.35, 0), 0);
        assert_eq!(skip_count(0.35, 10), 35); // floor(0.35*100)
    }

    #[test]
    fn scenario_s6_two_mutually_similar_words_form_one_true_class() {
        let mut store = InMemoryStore::new();
        let w1 = store.create_atomic("w1");
        let w2 = store.create_atomic("w2");
        store.seed(w1, BasisId(0), 100.0);
        store.seed(w2, BasisId(0), 100.0);

        let loop_ = ClusteringLoop::new(ClusterConfig::default().with_min_observations(1.0));
        let report = loop_
            .run(&mut store, &[w1, w2], Vec::new())
            .unwrap();

        assert_eq!(report.true_classes.len(), 1);
        let members = store.members_of(report.true_classes[0]);
        assert_eq!(members.len(), 2);
        assert!(members.contains(&w1) && members.contains(&w2));
    }

    #[test]
    fn dissimilar_entities_never_form_a_class() {
        let mut store = InMemoryStore::new();
        let w1 = store.create_atomic("w1");
        let w2 = store.create_atomic("w2");
        store.seed(w1, BasisId(0), 100.0);
        store.seed(w2, BasisId(1), 100.0);

        let loop_ = ClusteringLoop::new(ClusterConfig::default().with_min_observations(1.0));
        let report = loop_
            .run(&mut store, &[w1, w2], Vec::new())
            .unwrap();

        assert!(report.true_classes.is_empty());
    }

    #[test]
    fn entities_below_min_observations_are_dropped_before_clustering() {
        let mut store = InMemoryStore::new();
        let rare = store.create_atomic("rare");
        let common_a = store.create_atomic("common_a");
        let common_b = store.create_atomic("common_b");
        store.seed(rare, BasisId(0), 1.0);
        store.seed(common_a, BasisId(1), 100.0);
        store.seed(common_b, BasisId(1), 100.0);

        let loop_ = ClusteringLoop::new(ClusterConfig::default().with_min_observations(20.0));
        let report = loop_
            .run(&mut store, &[rare, common_a, common_b], Vec::new())
            .unwrap();

        assert_eq!(report.entities_considered, 2); // rare filtered out
        assert_eq!(report.true_classes.len(), 1);
    }

    #[test]
    fn provisional_singleton_strategy_pairs_up_matching_singletons() {
        let mut store = InMemoryStore::new();
        let a = store.create_atomic("a");
        let b = store.create_atomic("b");
        let lonely = store.create_atomic("lonely");
        store.seed(a, BasisId(0), 50.0);
        store.seed(b, BasisId(0), 50.0);
        store.seed(lonely, BasisId(1), 50.0);

        let loop_ = ClusteringLoop::new(ClusterConfig::default().with_min_observations(1.0))
            .with_strategy(ClusterStrategy::WithProvisionalSingletons);
        let report = loop_
            .run(&mut store, &[a, b, lonely], Vec::new())
            .unwrap();

        assert_eq!(report.true_classes.len(), 1);
        let members = store.members_of(report.true_classes[0]);
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn skip_ahead_drops_the_front_of_the_ranked_list() {
        let mut store = InMemoryStore::new();
        let mut entities = Vec::new();
        for i in 0..5 {
            let e = store.create_atomic(format!("e{i}"));
            store.seed(e, BasisId(0), 100.0 - i as f64); // descending totals
            entities.push(e);
        }
        // skip_fraction chosen so that with 1 existing class, skip_count = floor(4*1) = 4
        let config = ClusterConfig::default()
            .with_min_observations(1.0)
            .with_skip_fraction(4.0);
        let loop_ = ClusteringLoop::new(config);
        let pre_existing = vec![store.create_class("placeholder")];
        let report = loop_.run(&mut store, &entities, pre_existing).unwrap();
        assert_eq!(report.entities_skipped, 4);
        assert_eq!(report.entities_considered, 1);
    }
}
