//! Assignment Controller.
//!
//! Places a single word against a list of classes, and expands a class
//! against a list of candidates. The parallel dispatch in
//! `assign_word_to_class` is gated behind the `parallel` feature (default
//! on): gather every hit, then pick the lowest input index, so the result
//! never depends on which comparison happens to finish first.

use crate::config::ClusterConfig;
use crate::entity::EntityId;
use crate::error::ClusterResult;
use crate::merge::merge_ortho;
use crate::similarity::should_merge;
use crate::store::SectionStore;

/// Try to place `word` into the first matching class of `class_list`.
/// Scans in list order and merges on the first hit; returns `word`
/// unchanged if nothing matches.
///
/// With the `parallel` feature the similarity scan itself runs over
/// `class_list` via `rayon`, but the *merge* always executes serially
/// afterward against the lowest-indexed hit — this keeps the "a word joins
/// at most one class per pass" invariant intact regardless of how the scan
/// was scheduled.
pub fn assign_word_to_class(
    store: &mut dyn SectionStore,
    config: &ClusterConfig,
    word: EntityId,
    class_list: &[EntityId],
) -> ClusterResult<EntityId> {
    match first_match(store, config, word, class_list) {
        Some(class) => merge_ortho(store, config, class, word),
        None => Ok(word),
    }
}

#[cfg(feature = "parallel")]
fn first_match(
    store: &dyn SectionStore,
    config: &ClusterConfig,
    word: EntityId,
    class_list: &[EntityId],
) -> Option<EntityId> {
    use rayon::prelude::*;

    class_list
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &class)| {
            if should_merge(store, config, class, word) {
                Some((idx, class))
            } else {
                None
            }
        })
        .min_by_key(|&(idx, _)| idx)
        .map(|(_, class)| class)
}

#[cfg(not(feature = "parallel"))]
fn first_match(
    store: &dyn SectionStore,
    config: &ClusterConfig,
    word: EntityId,
    class_list: &[EntityId],
) -> Option<EntityId> {
    class_list
        .iter()
        .copied()
        .find(|&class| should_merge(store, config, class, word))
}

/// Iteratively fold every matching candidate into `class`.
///
/// Each accepted candidate changes `class`'s vector, so the scan is
/// strictly sequential (unlike `assign_word_to_class`'s read-only pass).
pub fn assign_expand_class(
    store: &mut dyn SectionStore,
    config: &ClusterConfig,
    class: EntityId,
    candidate_list: &[EntityId],
) -> ClusterResult<EntityId> {
    let mut current = class;
    for &candidate in candidate_list {
        if should_merge(store, config, current, candidate) {
            current = merge_ortho(store, config, current, candidate)?;
        }
    }
    Ok(current)
}
