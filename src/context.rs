use crate::{
    BehaviorResult, Frame, KnowledgeSelector, KnowledgeStore, KnowledgeValue, NodeIndex,
    TagLookup, TreeGraph,
};
use rand::{rngs::SmallRng, Rng};

/// Everything a node sees during one call: time, knowledge, and the state
/// frame of the tree it belongs to.
///
/// A context always points at one "current" node. State accessors read and
/// write that node's slot; [`Self::tick_child_node`] and
/// [`Self::release_node`] move the pointer for the duration of the call.
pub struct UpdateContext<'a> {
    /// Seconds since the previous tick.
    pub delta_time: f32,
    /// Seconds since the instance started, including this tick. Kept in
    /// double precision so long-running instances still advance.
    pub time: f64,
    knowledge: &'a mut dyn KnowledgeStore,
    tags: Option<&'a dyn TagLookup>,
    rng: &'a mut SmallRng,
    graph: &'a TreeGraph,
    frame: &'a mut Frame,
    node: NodeIndex,
}

impl<'a> UpdateContext<'a> {
    pub(crate) fn new(
        delta_time: f32,
        time: f64,
        knowledge: &'a mut dyn KnowledgeStore,
        tags: Option<&'a dyn TagLookup>,
        rng: &'a mut SmallRng,
        graph: &'a TreeGraph,
        frame: &'a mut Frame,
    ) -> Self {
        Self {
            delta_time,
            time,
            knowledge,
            tags,
            rng,
            graph,
            node: graph.root(),
            frame,
        }
    }

    /// A context for a nested tree that shares this context's time, knowledge
    /// and random source, but runs on its own graph and frame.
    pub fn nested<'b>(&'b mut self, graph: &'b TreeGraph, frame: &'b mut Frame) -> UpdateContext<'b> {
        UpdateContext {
            delta_time: self.delta_time,
            time: self.time,
            knowledge: &mut *self.knowledge,
            tags: self.tags,
            rng: &mut *self.rng,
            graph,
            node: graph.root(),
            frame,
        }
    }

    pub fn node(&self) -> NodeIndex {
        self.node
    }

    pub fn graph(&self) -> &'a TreeGraph {
        self.graph
    }

    pub fn children(&self) -> &'a [NodeIndex] {
        self.graph.children(self.node)
    }

    pub fn is_relevant(&self, index: NodeIndex) -> bool {
        self.frame.relevant.get(index)
    }

    pub fn knowledge(&self) -> &dyn KnowledgeStore {
        &*self.knowledge
    }

    pub fn knowledge_mut(&mut self) -> &mut dyn KnowledgeStore {
        &mut *self.knowledge
    }

    pub fn resolve<T: KnowledgeValue>(&self, selector: &KnowledgeSelector<T>) -> Option<T> {
        selector.resolve(&*self.knowledge)
    }

    pub fn tags(&self) -> Option<&'a dyn TagLookup> {
        self.tags
    }

    /// Uniform sample in `[-deviation, deviation]`; exactly 0 when there is
    /// no deviation.
    pub fn random_deviation(&mut self, deviation: f32) -> f32 {
        if deviation > 0. {
            self.rng.gen_range(-deviation..=deviation)
        } else {
            0.
        }
    }

    /// The current node's relevancy-scoped state. Only meaningful while the
    /// node is relevant.
    pub fn state<T: 'static>(&self) -> Option<&T> {
        let slot = self.graph.state_slot(self.node)?;
        self.frame.slot(slot)?.downcast_ref()
    }

    pub fn state_mut<T: 'static>(&mut self) -> Option<&mut T> {
        let slot = self.graph.state_slot(self.node)?;
        self.frame.slot_mut(slot)?.downcast_mut()
    }

    /// The current node's state that lives as long as the frame, regardless of
    /// relevancy.
    pub fn persistent_state<T: 'static>(&self) -> Option<&T> {
        let slot = self.graph.persistent_slot(self.node)?;
        self.frame.persistent_slot(slot)?.downcast_ref()
    }

    pub fn persistent_state_mut<T: 'static>(&mut self) -> Option<&mut T> {
        let slot = self.graph.persistent_slot(self.node)?;
        self.frame.persistent_slot_mut(slot)?.downcast_mut()
    }

    /// Run a child through its whole lifecycle for this tick.
    ///
    /// Makes the child relevant (initializing its state) if it was not, then
    /// returns `None` without updating it if its `can_update` gate is closed.
    /// Otherwise updates and post-processes it; a terminal result releases
    /// the child before returning.
    pub fn tick_child_node(&mut self, child: NodeIndex) -> Option<BehaviorResult> {
        let parent = std::mem::replace(&mut self.node, child);
        let node = self.graph.node(child);

        if !self.frame.relevant.get(child) {
            self.frame.relevant.set(child, true);
            node.init_state(self);
        }

        let result = if node.can_update(self) {
            let mut result = node.update(self);
            node.post_update(self, &mut result);
            if result != BehaviorResult::Running {
                node.become_irrelevant(self);
            }
            Some(result)
        } else {
            None
        };

        self.node = parent;
        result
    }

    /// Tick the only child of the current node. A closed gate on the child
    /// counts as a failure, and a node without children succeeds.
    pub fn tick_decorated_child(&mut self) -> BehaviorResult {
        match self.children().first() {
            Some(&child) => self
                .tick_child_node(child)
                .unwrap_or(BehaviorResult::Fail),
            None => BehaviorResult::Success,
        }
    }

    /// Deliver `become_irrelevant` to a node if it is relevant.
    pub fn release_node(&mut self, index: NodeIndex) {
        if !self.frame.relevant.get(index) {
            return;
        }
        let parent = std::mem::replace(&mut self.node, index);
        self.graph.node(index).become_irrelevant(self);
        self.node = parent;
    }

    /// Release every relevant child of the current node, in order.
    pub fn release_children(&mut self) {
        for &child in self.children() {
            self.release_node(child);
        }
    }

    /// Release the current node's own state and clear its relevancy bit.
    /// Children are not touched.
    pub fn release_self(&mut self) {
        let node = self.graph.node(self.node);
        node.release_state(self);
        self.frame.relevant.set(self.node, false);
    }

    /// Release every relevant node of this frame, root first so irrelevance
    /// propagates depth-first through the relevant chain.
    pub fn release_all(&mut self) {
        self.release_node(self.graph.root());
        for index in 0..self.graph.len() {
            self.release_node(index);
        }
    }
}
