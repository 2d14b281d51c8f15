use crate::{
    BehaviorResult, Frame, Knowledge, KnowledgeStore, NodeIndex, TagLookup, TreeGraph,
    UpdateContext,
};
use rand::{rngs::SmallRng, SeedableRng};
use std::sync::Arc;
use tracing::trace;

/// One agent running a shared tree.
///
/// Ticking an instance touches only its own frame, knowledge and random
/// source, so instances of the same tree can be ticked on different threads.
/// Dropping an instance releases every node that still holds state.
pub struct BehaviorInstance<K: KnowledgeStore = Knowledge> {
    tree: Arc<TreeGraph>,
    frame: Frame,
    knowledge: K,
    rng: SmallRng,
    tags: Option<Arc<dyn TagLookup + Send + Sync>>,
    time: f64,
    accumulated: f32,
}

impl<K: KnowledgeStore> BehaviorInstance<K> {
    pub fn new(tree: Arc<TreeGraph>, knowledge: K) -> Self {
        Self {
            frame: Frame::new(&tree),
            tree,
            knowledge,
            rng: SmallRng::from_entropy(),
            tags: None,
            time: 0.,
            accumulated: 0.,
        }
    }

    /// Makes random deviations reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn with_tag_lookup(mut self, tags: Arc<dyn TagLookup + Send + Sync>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Ticks the tree once, `delta_time` seconds after the previous tick.
    pub fn tick(&mut self, delta_time: f32) -> BehaviorResult {
        self.time += f64::from(delta_time);
        let mut ctx = UpdateContext::new(
            delta_time,
            self.time,
            &mut self.knowledge,
            self.tags.as_deref().map(|tags| tags as &dyn TagLookup),
            &mut self.rng,
            &self.tree,
            &mut self.frame,
        );
        let root = self.tree.root();
        ctx.tick_child_node(root).unwrap_or(BehaviorResult::Fail)
    }

    /// Accumulates time and ticks once a whole period of the tree's
    /// `update_fps` has passed. Returns `None` when no tick happened.
    pub fn advance(&mut self, delta_time: f32) -> Option<BehaviorResult> {
        self.accumulated += delta_time;
        let update_fps = self.tree.settings().update_fps;
        if update_fps > 0. && self.accumulated < update_fps.recip() {
            return None;
        }
        let delta_time = std::mem::take(&mut self.accumulated);
        Some(self.tick(delta_time))
    }

    /// Releases every relevant node, as if the tree had stopped being ticked.
    /// Persistent state such as cooldowns is kept.
    pub fn reset(&mut self) {
        if self.frame.relevant().none() {
            return;
        }
        trace!(relevant = self.frame.relevant().count(), "releasing instance");
        let mut ctx = UpdateContext::new(
            0.,
            self.time,
            &mut self.knowledge,
            self.tags.as_deref().map(|tags| tags as &dyn TagLookup),
            &mut self.rng,
            &self.tree,
            &mut self.frame,
        );
        ctx.release_all();
        self.accumulated = 0.;
    }

    pub fn tree(&self) -> &Arc<TreeGraph> {
        &self.tree
    }

    pub fn knowledge(&self) -> &K {
        &self.knowledge
    }

    pub fn knowledge_mut(&mut self) -> &mut K {
        &mut self.knowledge
    }

    pub fn is_relevant(&self, index: NodeIndex) -> bool {
        self.frame.relevant().get(index)
    }

    pub fn relevant_count(&self) -> usize {
        self.frame.relevant().count()
    }

    /// Seconds ticked so far.
    pub fn time(&self) -> f64 {
        self.time
    }
}

impl<K: KnowledgeStore> Drop for BehaviorInstance<K> {
    fn drop(&mut self) {
        self.reset();
    }
}
