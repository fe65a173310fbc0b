//! The words chosen for each slot during a fill, in the order they were chosen.

use crate::grid_config::SlotId;
use crate::types::WordId;

/// A mapping from slot to chosen word. Lookups are indexed by `SlotId`; iteration follows the
/// order in which slots were assigned, not grid order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    word_ids: Vec<Option<WordId>>,
    order: Vec<SlotId>,
}

impl Assignment {
    /// An empty assignment for a grid with `slot_count` slots.
    #[must_use]
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            word_ids: vec![None; slot_count],
            order: Vec::with_capacity(slot_count),
        }
    }

    /// The word assigned to this slot, if any.
    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.word_ids[slot_id]
    }

    #[must_use]
    pub fn contains(&self, slot_id: SlotId) -> bool {
        self.word_ids[slot_id].is_some()
    }

    /// Assign a word to a slot, replacing (and returning) any previous word without changing the
    /// slot's position in the choice order.
    pub fn insert(&mut self, slot_id: SlotId, word_id: WordId) -> Option<WordId> {
        let previous = self.word_ids[slot_id].replace(word_id);
        if previous.is_none() {
            self.order.push(slot_id);
        }
        previous
    }

    /// Unassign a slot, returning the word it held.
    pub fn remove(&mut self, slot_id: SlotId) -> Option<WordId> {
        let previous = self.word_ids[slot_id].take();
        if previous.is_some() {
            // Search always undoes its most recent choice, so this is normally the last entry.
            if let Some(position) = self.order.iter().rposition(|&id| id == slot_id) {
                self.order.remove(position);
            }
        }
        previous
    }

    /// The number of assigned slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Does every slot in the grid have a word?
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.order.len() == self.word_ids.len()
    }

    /// Iterate over `(slot, word)` pairs in the order the slots were assigned.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.order
            .iter()
            .filter_map(|&slot_id| self.word_ids[slot_id].map(|word_id| (slot_id, word_id)))
    }
}

#[cfg(test)]
mod tests {
    use crate::assignment::Assignment;

    #[test]
    fn test_tracks_choice_order() {
        let mut assignment = Assignment::new(3);
        assert!(assignment.is_empty());

        assert_eq!(assignment.insert(2, 10), None);
        assert_eq!(assignment.insert(0, 11), None);
        assert_eq!(assignment.insert(2, 12), Some(10));

        assert_eq!(assignment.iter().collect::<Vec<_>>(), vec![(2, 12), (0, 11)]);
        assert_eq!(assignment.len(), 2);
        assert!(!assignment.is_complete());

        assignment.insert(1, 13);
        assert!(assignment.is_complete());

        assert_eq!(assignment.remove(0), Some(11));
        assert_eq!(assignment.remove(0), None);
        assert_eq!(assignment.iter().collect::<Vec<_>>(), vec![(2, 12), (1, 13)]);
        assert!(!assignment.contains(0));
        assert_eq!(assignment.get(1), Some(13));
    }
}
