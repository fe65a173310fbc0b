//! This module implements grid-filling using a classic depth-first backtracking search. Before
//! searching we prune every slot's options with node consistency and AC-3; during the search we
//! order slots by minimum remaining values (breaking ties by degree) and words by how few options
//! they rule out for crossing slots, and we check the whole partial assignment for consistency
//! after every tentative choice.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::arc_consistency::{
    establish_arc_consistency, ArcConsistencyFailure, ArcConsistencySuccess,
};
use crate::assignment::Assignment;
use crate::domains::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::types::WordId;
use crate::util::{build_glyph_counts_for_cell, glyph_count, GlyphCounts};
use crate::word_list::WordList;
use crate::CHECK_INVARIANTS;

/// How many search states should we visit before checking whether we've passed our deadline or
/// been asked to abort?
pub const INTERRUPT_FREQUENCY: usize = 10;

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: usize,
    pub backtracks: usize,
    pub arcs_processed: usize,
    pub revisions: usize,
    pub initial_arc_consistency_time: Duration,
    pub search_time: Duration,
    pub total_time: Duration,
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillFailure {
    /// Arc consistency emptied this slot's options before search began.
    #[error("No solution: slot {slot_id} has no possible words")]
    Unsatisfiable { slot_id: SlotId },

    /// Search tried every consistent assignment without completing the grid.
    #[error("No solution: search exhausted")]
    SearchExhausted,

    #[error("Fill timed out")]
    Timeout,

    #[error("Fill aborted")]
    Abort,
}

impl FillFailure {
    /// Did we prove that the grid can't be filled (as opposed to giving up early)?
    #[must_use]
    pub fn is_no_solution(&self) -> bool {
        matches!(
            self,
            FillFailure::Unsatisfiable { .. } | FillFailure::SearchExhausted
        )
    }
}

/// Check that the words in `assignment` are all different, each has its slot's length, and every
/// pair of assigned crossing slots agree on their shared cell.
#[must_use]
pub fn is_consistent(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> bool {
    let mut seen_words: HashSet<WordId> = HashSet::with_capacity(assignment.len());

    for (slot_id, word_id) in assignment.iter() {
        if !seen_words.insert(word_id) {
            return false;
        }
        if word_list.get_word(word_id).len() != config.slot_configs[slot_id].length {
            return false;
        }
    }

    assignment.iter().all(|(slot_id, word_id)| {
        let word = word_list.get_word(word_id);

        config.neighbors(slot_id).iter().all(|&neighbor_id| {
            let (Some(neighbor_word_id), Some((cell, neighbor_cell))) = (
                assignment.get(neighbor_id),
                config.overlap(slot_id, neighbor_id),
            ) else {
                return true;
            };

            word.glyphs.get(cell) == word_list.get_word(neighbor_word_id).glyphs.get(neighbor_cell)
        })
    })
}

/// Choose the unassigned slot with the fewest remaining options, preferring the one with the most
/// crossings when there's a tie. Returns `None` once every slot is assigned.
#[must_use]
pub fn select_unassigned_slot(
    config: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
) -> Option<SlotId> {
    (0..config.slot_count())
        .filter(|&slot_id| !assignment.contains(slot_id))
        .min_by_key(|&slot_id| {
            (
                domains.len(slot_id),
                Reverse(config.neighbors(slot_id).len()),
            )
        })
}

/// List the options for a slot, ordered by how many options each one would rule out in the
/// domains of unassigned crossing slots (fewest first).
#[must_use]
pub fn order_domain_values(
    config: &GridConfig,
    word_list: &WordList,
    domains: &Domains,
    assignment: &Assignment,
    slot_id: SlotId,
) -> Vec<WordId> {
    // For each unassigned crossing: the shared cell on both sides, and the glyphs the crossing's
    // options have there.
    let crossings: Vec<(SlotId, usize, usize, GlyphCounts)> = config
        .neighbors(slot_id)
        .iter()
        .filter(|&&neighbor_id| !assignment.contains(neighbor_id))
        .filter_map(|&neighbor_id| {
            let (cell, neighbor_cell) = config.overlap(slot_id, neighbor_id)?;
            Some((
                neighbor_id,
                cell,
                neighbor_cell,
                build_glyph_counts_for_cell(word_list, domains.options(neighbor_id), neighbor_cell),
            ))
        })
        .collect();

    let mut values = domains.options(slot_id).to_vec();

    values.sort_by_cached_key(|&word_id| {
        let word = word_list.get_word(word_id);
        crossings
            .iter()
            .map(|(neighbor_id, cell, neighbor_cell, counts)| {
                let glyph = word.glyphs.get(*cell).copied();
                let mut compatible = glyph_count(counts, glyph) as usize;

                // The word can't be reused in the crossing slot even if it fits there.
                if compatible > 0
                    && domains.contains(*neighbor_id, word_id)
                    && word.glyphs.get(*neighbor_cell).copied() == glyph
                {
                    compatible -= 1;
                }

                domains.len(*neighbor_id) - compatible
            })
            .sum::<usize>()
    });

    values
}

/// The state of a single search: fixed inputs, limits, and running statistics.
struct Search<'a> {
    config: &'a GridConfig,
    word_list: &'a WordList,
    domains: &'a Domains,
    deadline: Option<Instant>,
    abort: Option<&'a AtomicBool>,
    statistics: Statistics,
}

impl Search<'_> {
    fn check_interrupts(&self) -> Result<(), FillFailure> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(FillFailure::Timeout);
            }
        }
        if let Some(abort) = self.abort {
            if abort.load(Ordering::Relaxed) {
                return Err(FillFailure::Abort);
            }
        }
        Ok(())
    }

    /// Try to extend `assignment` to a complete, consistent assignment. On success the
    /// assignment is left complete; otherwise it's returned to the state it was passed in.
    fn backtrack(&mut self, assignment: &mut Assignment) -> Result<bool, FillFailure> {
        self.statistics.states += 1;

        if self.statistics.states % INTERRUPT_FREQUENCY == 0 {
            self.check_interrupts()?;
        }

        let Some(slot_id) = select_unassigned_slot(self.config, self.domains, assignment) else {
            return Ok(true);
        };

        let values = order_domain_values(
            self.config,
            self.word_list,
            self.domains,
            assignment,
            slot_id,
        );

        for word_id in values {
            assignment.insert(slot_id, word_id);

            if is_consistent(self.config, self.word_list, assignment) {
                log::trace!(
                    "trying {:?} in slot {slot_id} at depth {}",
                    self.word_list.get_word(word_id).normalized_string,
                    assignment.len()
                );

                if self.backtrack(assignment)? {
                    return Ok(true);
                }
            }

            assignment.remove(slot_id);
        }

        self.statistics.backtracks += 1;
        Ok(false)
    }
}

/// Search for a complete assignment extending `assignment`, using `domains` as the options for
/// each slot. Returns `None` if there isn't one, including when `assignment` is already
/// inconsistent.
#[must_use]
pub fn backtrack(
    config: &GridConfig,
    word_list: &WordList,
    domains: &Domains,
    mut assignment: Assignment,
) -> Option<Assignment> {
    // Search only checks the choices it makes itself.
    if !is_consistent(config, word_list, &assignment) {
        return None;
    }

    let mut search = Search {
        config,
        word_list,
        domains,
        deadline: None,
        abort: None,
        statistics: Statistics::default(),
    };

    matches!(search.backtrack(&mut assignment), Ok(true)).then_some(assignment)
}

/// Search for a valid fill for the given grid using the given words, giving up if we pass the
/// timeout or the abort flag is set.
pub fn find_fill(
    config: &GridConfig,
    word_list: &WordList,
    timeout: Option<Duration>,
    abort: Option<&AtomicBool>,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();
    let deadline = timeout.map(|timeout| start + timeout);
    let mut statistics = Statistics::default();

    let mut domains = Domains::new(config, word_list);
    domains.enforce_node_consistency(config, word_list);

    // If we can't even establish arc consistency, there's no point searching.
    let ArcConsistencySuccess {
        arcs_processed,
        revisions,
    } = establish_arc_consistency(config, word_list, &mut domains, None).map_err(
        |ArcConsistencyFailure { slot_id }| {
            log::debug!("grid is unsatisfiable: slot {slot_id} has no options");
            FillFailure::Unsatisfiable { slot_id }
        },
    )?;
    statistics.arcs_processed = arcs_processed;
    statistics.revisions = revisions;
    statistics.initial_arc_consistency_time = start.elapsed();

    let mut search = Search {
        config,
        word_list,
        domains: &domains,
        deadline,
        abort,
        statistics,
    };
    let mut assignment = Assignment::new(config.slot_count());
    let found = search.backtrack(&mut assignment);

    let mut statistics = search.statistics;
    statistics.search_time = start.elapsed() - statistics.initial_arc_consistency_time;
    statistics.total_time = start.elapsed();
    log::debug!("search finished with {found:?}: {statistics:?}");

    if !found? {
        return Err(FillFailure::SearchExhausted);
    }

    if CHECK_INVARIANTS {
        assert!(
            assignment.is_complete() && is_consistent(config, word_list, &assignment),
            "Search returned an invalid assignment"
        );
    }

    Ok(FillSuccess {
        statistics,
        assignment,
    })
}
