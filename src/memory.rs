//! Per-instance node state.
//!
//! A [`Frame`] is the mutable half of a running tree: one state slot for each
//! stateful node, addressed through the slot table of its [`TreeGraph`], and a
//! bitset telling which nodes currently hold initialized state. Slots are
//! allocated once when the frame is created and reinitialized in place, so
//! ticking never allocates for node state.

use crate::{NodeIndex, NodeState, TreeGraph};

const WORD_BITS: usize = u64::BITS as usize;

/// One bit per node index; a set bit means the node is relevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevantNodes {
    words: Vec<u64>,
    len: usize,
}

impl RelevantNodes {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; (len + WORD_BITS - 1) / WORD_BITS],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Out of range indices read as not relevant.
    pub fn get(&self, index: NodeIndex) -> bool {
        index < self.len && self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    pub fn set(&mut self, index: NodeIndex, value: bool) {
        assert!(index < self.len, "node index {index} out of range");
        let word = &mut self.words[index / WORD_BITS];
        if value {
            *word |= 1 << (index % WORD_BITS);
        } else {
            *word &= !(1 << (index % WORD_BITS));
        }
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn none(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }

    /// Indices of the set bits, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.len).filter(move |index| self.get(*index))
    }
}

/// State memory of one tree for one agent.
pub struct Frame {
    states: Vec<NodeState>,
    persistent: Vec<NodeState>,
    pub(crate) relevant: RelevantNodes,
}

/// The persistent slots of a frame, detached from it.
///
/// A sub-tree keeps these for the whole life of its instance while the rest
/// of its nested frame comes and goes with the sub-tree's relevancy.
pub struct PersistentSlots(Vec<NodeState>);

impl PersistentSlots {
    pub fn new(graph: &TreeGraph) -> Self {
        let slots: Vec<_> = (0..graph.len())
            .filter(|&index| graph.persistent_slot(index).is_some())
            .filter_map(|index| graph.node(index).new_persistent_state())
            .collect();
        debug_assert_eq!(slots.len(), graph.persistent_slots());
        Self(slots)
    }
}

impl Frame {
    pub fn new(graph: &TreeGraph) -> Self {
        Self::with_persistent(graph, PersistentSlots::new(graph))
    }

    /// A frame with fresh relevancy-scoped slots around existing persistent
    /// ones. `persistent` must come from the same graph.
    pub fn with_persistent(graph: &TreeGraph, persistent: PersistentSlots) -> Self {
        let states: Vec<_> = (0..graph.len())
            .filter(|&index| graph.state_slot(index).is_some())
            .filter_map(|index| graph.node(index).new_state())
            .collect();
        debug_assert_eq!(states.len(), graph.state_slots());
        Self {
            states,
            persistent: persistent.0,
            relevant: RelevantNodes::new(graph.len()),
        }
    }

    /// Drops the relevancy-scoped slots and hands back the persistent ones.
    pub fn into_persistent(self) -> PersistentSlots {
        PersistentSlots(self.persistent)
    }

    pub fn relevant(&self) -> &RelevantNodes {
        &self.relevant
    }

    pub(crate) fn slot(&self, slot: usize) -> Option<&NodeState> {
        self.states.get(slot)
    }

    pub(crate) fn slot_mut(&mut self, slot: usize) -> Option<&mut NodeState> {
        self.states.get_mut(slot)
    }

    pub(crate) fn persistent_slot(&self, slot: usize) -> Option<&NodeState> {
        self.persistent.get(slot)
    }

    pub(crate) fn persistent_slot_mut(&mut self, slot: usize) -> Option<&mut NodeState> {
        self.persistent.get_mut(slot)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("states", &self.states.len())
            .field("persistent", &self.persistent.len())
            .field("relevant", &self.relevant.iter().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn relevant_bits_across_words() {
        let mut bits = RelevantNodes::new(130);
        assert!(bits.none());
        bits.set(0, true);
        bits.set(64, true);
        bits.set(129, true);
        assert_eq!(bits.count(), 3);
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![0, 64, 129]);
        assert!(!bits.get(130));

        bits.set(64, false);
        assert!(!bits.get(64));
        assert_eq!(bits.count(), 2);

        bits.clear();
        assert!(bits.none());
    }
}
