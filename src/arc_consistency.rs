//! This module contains an implementation of the AC-3 algorithm for establishing arc consistency
//! between crossing slots. For our purposes, a grid is arc-consistent when, for every slot `x`
//! and every slot `y` crossing it, each option left for `x` is supported by some *other* option
//! for `y` that has the same letter in the shared cell.
//!
//! We keep revising arcs until no more eliminations are possible, or until some slot runs out of
//! options entirely.

use std::collections::{HashSet, VecDeque};

use crate::domains::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::types::WordId;
use crate::util::{build_glyph_counts_for_cell, glyph_count};
use crate::word_list::WordList;
use crate::CHECK_INVARIANTS;

/// A directed constraint between a slot and one of its crossings: options for `slot_id` need
/// support from options for `neighbor_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotArc {
    pub slot_id: SlotId,
    pub neighbor_id: SlotId,
}

impl SlotArc {
    #[must_use]
    pub fn new(slot_id: SlotId, neighbor_id: SlotId) -> SlotArc {
        SlotArc {
            slot_id,
            neighbor_id,
        }
    }
}

/// Result from a successful call to `establish_arc_consistency`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arcs were taken off the worklist.
    pub arcs_processed: usize,

    /// How many of those arcs removed at least one option.
    pub revisions: usize,
}

/// Result from a failed call to `establish_arc_consistency`, identifying the slot whose domain
/// was wiped out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
}

/// Result from a call to `establish_arc_consistency`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Find the options for `slot_id` that have no support in `neighbor_id`'s domain. A word never
/// counts as support for itself.
fn find_unsupported_options(
    config: &GridConfig,
    word_list: &WordList,
    domains: &Domains,
    slot_id: SlotId,
    neighbor_id: SlotId,
) -> HashSet<WordId> {
    let Some((slot_cell, neighbor_cell)) = config.overlap(slot_id, neighbor_id) else {
        return HashSet::new();
    };

    let neighbor_counts =
        build_glyph_counts_for_cell(word_list, domains.options(neighbor_id), neighbor_cell);

    domains
        .options(slot_id)
        .iter()
        .copied()
        .filter(|&word_id| {
            let word = word_list.get_word(word_id);
            let glyph = word.glyphs.get(slot_cell).copied();
            let mut support = glyph_count(&neighbor_counts, glyph);

            // If this same word is also an option for the neighbor and lines up with itself, it
            // was counted above but can't be used.
            if glyph.is_some()
                && word.glyphs.get(neighbor_cell).copied() == glyph
                && domains.contains(neighbor_id, word_id)
            {
                support -= 1;
            }

            support == 0
        })
        .collect()
}

/// Make `slot_id` arc consistent with `neighbor_id` by removing every option with no compatible
/// partner. Slots that don't cross are left alone. Returns whether any option was removed.
pub fn revise(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut Domains,
    slot_id: SlotId,
    neighbor_id: SlotId,
) -> bool {
    let eliminations = find_unsupported_options(config, word_list, domains, slot_id, neighbor_id);

    if eliminations.is_empty() {
        return false;
    }

    log::trace!(
        "revising slot {slot_id} against slot {neighbor_id} removed {} option(s)",
        eliminations.len()
    );
    domains.eliminate(slot_id, &eliminations);
    true
}

/// Every directed arc in the grid: one for each slot and each of its neighbors.
#[must_use]
pub fn all_arcs(config: &GridConfig) -> Vec<SlotArc> {
    config
        .slot_configs
        .iter()
        .flat_map(|slot_config| {
            config
                .neighbors(slot_config.id)
                .iter()
                .map(move |&neighbor_id| SlotArc::new(slot_config.id, neighbor_id))
        })
        .collect()
}

/// Shrink `domains` until every arc is consistent. If `initial_arcs` is `None`, start from every
/// arc in the grid; otherwise only the given arcs are checked at first, and further arcs are
/// queued as their dependencies change. Fails as soon as any slot has no options left.
pub fn establish_arc_consistency(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut Domains,
    initial_arcs: Option<Vec<SlotArc>>,
) -> ArcConsistencyResult {
    // A slot that starts out empty may have no crossings to notice it, so check up front.
    if let Some(slot_id) = domains.first_empty_slot() {
        log::debug!("slot {slot_id} has no options before arc consistency");
        return Err(ArcConsistencyFailure { slot_id });
    }

    let checking_all_arcs = initial_arcs.is_none();
    let mut queue: VecDeque<SlotArc> = initial_arcs.unwrap_or_else(|| all_arcs(config)).into();
    let mut result = ArcConsistencySuccess::default();

    while let Some(SlotArc {
        slot_id,
        neighbor_id,
    }) = queue.pop_front()
    {
        result.arcs_processed += 1;

        if !revise(config, word_list, domains, slot_id, neighbor_id) {
            continue;
        }
        result.revisions += 1;

        if domains.is_empty(slot_id) {
            log::debug!("arc consistency wiped out slot {slot_id}");
            return Err(ArcConsistencyFailure { slot_id });
        }

        // Anything relying on this slot for support needs to be rechecked.
        queue.extend(
            config
                .neighbors(slot_id)
                .iter()
                .filter(|&&other_id| other_id != neighbor_id)
                .map(|&other_id| SlotArc::new(other_id, slot_id)),
        );
    }

    if CHECK_INVARIANTS && checking_all_arcs {
        for arc in all_arcs(config) {
            assert!(
                find_unsupported_options(config, word_list, domains, arc.slot_id, arc.neighbor_id)
                    .is_empty(),
                "Arc {arc:?} still inconsistent after AC-3"
            );
        }
    }

    log::debug!(
        "arc consistency established after {} arcs ({} revisions)",
        result.arcs_processed,
        result.revisions
    );

    Ok(result)
}
