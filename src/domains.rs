//! The set of words still possible for each slot. Domains start out as the whole word list and
//! only ever shrink: first by length (node consistency), then by arc consistency.

use std::collections::HashSet;

use crate::grid_config::{GridConfig, SlotId};
use crate::types::WordId;
use crate::word_list::WordList;
use crate::CHECK_INVARIANTS;

/// The remaining options for every slot in a grid. Each slot's options are kept in ascending
/// `WordId` order so that membership can be checked with a binary search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    options: Vec<Vec<WordId>>,
}

impl Domains {
    /// Give every slot in the grid every word in the list.
    #[must_use]
    pub fn new(config: &GridConfig, word_list: &WordList) -> Domains {
        Domains {
            options: (0..config.slot_count())
                .map(|_| (0..word_list.len()).collect())
                .collect(),
        }
    }

    /// Build domains from explicit option lists, one per slot.
    #[must_use]
    pub fn from_options(mut options: Vec<Vec<WordId>>) -> Domains {
        for slot_options in &mut options {
            slot_options.sort_unstable();
            slot_options.dedup();
        }
        Domains { options }
    }

    /// Remove every option whose length doesn't match its slot's length.
    pub fn enforce_node_consistency(&mut self, config: &GridConfig, word_list: &WordList) {
        for slot_config in &config.slot_configs {
            self.options[slot_config.id]
                .retain(|&word_id| word_list.get_word(word_id).len() == slot_config.length);
        }

        if CHECK_INVARIANTS {
            for slot_config in &config.slot_configs {
                assert!(
                    self.options[slot_config.id]
                        .iter()
                        .all(|&word_id| word_list.get_word(word_id).len() == slot_config.length),
                    "Option with wrong length left in slot {}",
                    slot_config.id
                );
            }
        }

        log::debug!(
            "node consistency left domain sizes {:?}",
            self.options.iter().map(Vec::len).collect::<Vec<_>>()
        );
    }

    #[must_use]
    pub fn options(&self, slot_id: SlotId) -> &[WordId] {
        &self.options[slot_id]
    }

    #[must_use]
    pub fn len(&self, slot_id: SlotId) -> usize {
        self.options[slot_id].len()
    }

    #[must_use]
    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.options[slot_id].is_empty()
    }

    #[must_use]
    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.options[slot_id].binary_search(&word_id).is_ok()
    }

    /// The number of slots these domains cover.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.options.len()
    }

    /// The first slot whose domain is empty, if any.
    #[must_use]
    pub fn first_empty_slot(&self) -> Option<SlotId> {
        self.options.iter().position(Vec::is_empty)
    }

    /// Remove the given words from a slot's domain.
    pub fn eliminate(&mut self, slot_id: SlotId, eliminations: &HashSet<WordId>) {
        self.options[slot_id].retain(|word_id| !eliminations.contains(word_id));
    }
}

#[cfg(test)]
mod tests {
    use crate::domains::Domains;
    use crate::grid_config::{Direction, GridConfig, SlotSpec};
    use crate::word_list::WordList;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn two_slot_config() -> GridConfig {
        GridConfig::from_slot_specs(&[
            SlotSpec {
                start_cell: (0, 0),
                direction: Direction::Across,
                length: 3,
            },
            SlotSpec {
                start_cell: (0, 2),
                direction: Direction::Across,
                length: 4,
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_initializes_every_slot_with_every_word() {
        let config = two_slot_config();
        let word_list = WordList::from_words(["cat", "door", "a"]);

        let domains = Domains::new(&config, &word_list);

        assert_eq!(domains.slot_count(), 2);
        assert_eq!(domains.options(0), &[0, 1, 2]);
        assert_eq!(domains.options(1), &[0, 1, 2]);
    }

    #[test]
    fn test_node_consistency_prunes_by_length() {
        let config = two_slot_config();
        let word_list = WordList::from_words(["cat", "door", "a", "dog"]);

        let mut domains = Domains::new(&config, &word_list);
        domains.enforce_node_consistency(&config, &word_list);

        assert_eq!(domains.options(0), &[0, 3]);
        assert_eq!(domains.options(1), &[1]);
        assert!(domains.contains(0, 3));
        assert!(!domains.contains(0, 1));
        assert_eq!(domains.first_empty_slot(), None);
    }

    #[test]
    fn test_node_consistency_can_empty_a_domain() {
        let config = two_slot_config();
        let word_list = WordList::from_words(["cat"]);

        let mut domains = Domains::new(&config, &word_list);
        domains.enforce_node_consistency(&config, &word_list);

        assert!(!domains.is_empty(0));
        assert!(domains.is_empty(1));
        assert_eq!(domains.first_empty_slot(), Some(1));
    }

    #[test]
    fn test_eliminate() {
        let mut domains = Domains::from_options(vec![vec![4, 1, 2, 1]]);
        assert_eq!(domains.options(0), &[1, 2, 4]);

        domains.eliminate(0, &HashSet::from([2, 7]));
        assert_eq!(domains.options(0), &[1, 4]);
        assert_eq!(domains.len(0), 2);
    }

    proptest! {
        #[test]
        fn prop_node_consistency_leaves_only_matching_lengths(
            words in prop::collection::vec("[a-e]{1,6}", 0..40),
            lengths in prop::collection::vec(2usize..6, 1..5),
        ) {
            let specs: Vec<SlotSpec> = lengths
                .iter()
                .enumerate()
                .map(|(row, &length)| SlotSpec {
                    start_cell: (0, row * 2),
                    direction: Direction::Across,
                    length,
                })
                .collect();
            let config = GridConfig::from_slot_specs(&specs).unwrap();
            let word_list = WordList::from_words(&words);

            let mut domains = Domains::new(&config, &word_list);
            domains.enforce_node_consistency(&config, &word_list);

            for slot_config in &config.slot_configs {
                let expected = word_list
                    .words
                    .iter()
                    .filter(|word| word.len() == slot_config.length)
                    .count();
                prop_assert_eq!(domains.len(slot_config.id), expected);
                for &word_id in domains.options(slot_config.id) {
                    prop_assert_eq!(word_list.get_word(word_id).len(), slot_config.length);
                }
            }
        }
    }
}
