use crate::{
    error::ParamError, BehaviorNode, BehaviorResult, Frame, KnowledgeSelector, NodeParams,
    NodeState, NumChildren, PersistentSlots, TreeGraph, TreeSettings, UpdateContext,
};
use std::sync::Arc;
use tracing::{trace, warn};

/// Shared traversal of the compound nodes.
///
/// Resumes at the stored child index and walks children in order. A skipped
/// child (closed `can_update` gate) is passed over. `Running` stores the
/// child index and suspends; `stop_on` ends the traversal with that result;
/// running out of children yields `exhausted`. On either terminal outcome the
/// index is reset and every child still holding state is released, including
/// the ones that were skipped.
fn tick_compound(
    ctx: &mut UpdateContext,
    stop_on: BehaviorResult,
    exhausted: BehaviorResult,
) -> BehaviorResult {
    let from = ctx.state::<usize>().copied().unwrap_or(0);
    for (i, &child) in ctx.children().iter().enumerate().skip(from) {
        match ctx.tick_child_node(child) {
            None => trace!(node = ctx.node(), child, "skipped child"),
            Some(BehaviorResult::Running) => {
                if let Some(current) = ctx.state_mut::<usize>() {
                    *current = i;
                }
                return BehaviorResult::Running;
            }
            Some(result) if result == stop_on => {
                finish_compound(ctx);
                return result;
            }
            Some(_) => (),
        }
    }
    finish_compound(ctx);
    exhausted
}

fn finish_compound(ctx: &mut UpdateContext) {
    reset_current_child(ctx);
    ctx.release_children();
}

fn reset_current_child(ctx: &mut UpdateContext) {
    if let Some(current) = ctx.state_mut::<usize>() {
        *current = 0;
    }
}

/// Succeeds once every child has succeeded; fails on the first failure.
#[derive(Default)]
pub struct SequenceNode;

impl BehaviorNode for SequenceNode {
    fn max_children(&self) -> NumChildren {
        NumChildren::Infinite
    }

    fn new_state(&self) -> Option<NodeState> {
        Some(Box::new(0usize))
    }

    fn init_state(&self, ctx: &mut UpdateContext) {
        reset_current_child(ctx);
    }

    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        tick_compound(ctx, BehaviorResult::Fail, BehaviorResult::Success)
    }
}

/// Succeeds on the first child that succeeds; fails once every child failed.
#[derive(Default)]
pub struct SelectorNode;

impl BehaviorNode for SelectorNode {
    fn max_children(&self) -> NumChildren {
        NumChildren::Infinite
    }

    fn new_state(&self) -> Option<NodeState> {
        Some(Box::new(0usize))
    }

    fn init_state(&self, ctx: &mut UpdateContext) {
        reset_current_child(ctx);
    }

    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        tick_compound(ctx, BehaviorResult::Success, BehaviorResult::Fail)
    }
}

/// The top of every tree: a [`SequenceNode`] that also carries the tree's
/// [`TreeSettings`].
#[derive(Default)]
pub struct RootNode {
    settings: TreeSettings,
}

impl RootNode {
    pub fn new(settings: TreeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }
}

impl BehaviorNode for RootNode {
    fn max_children(&self) -> NumChildren {
        NumChildren::Infinite
    }

    fn new_state(&self) -> Option<NodeState> {
        Some(Box::new(0usize))
    }

    fn init_state(&self, ctx: &mut UpdateContext) {
        reset_current_child(ctx);
    }

    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        tick_compound(ctx, BehaviorResult::Fail, BehaviorResult::Success)
    }

    fn tree_settings(&self) -> Option<&TreeSettings> {
        Some(&self.settings)
    }
}

/// Waits for a while, then succeeds.
pub struct DelayNode {
    wait_time: KnowledgeSelector<f32>,
    deviation: f32,
}

impl DelayNode {
    pub fn new(wait_time: impl Into<KnowledgeSelector<f32>>) -> Self {
        Self {
            wait_time: wait_time.into(),
            deviation: 0.,
        }
    }

    pub fn with_deviation(mut self, deviation: f32) -> Self {
        self.deviation = deviation;
        self
    }

    pub fn from_params(params: &NodeParams) -> Result<Self, ParamError> {
        Ok(Self {
            wait_time: params.selector("wait_time", 3.)?,
            deviation: params.literal_or("deviation", 0.)?,
        })
    }
}

impl BehaviorNode for DelayNode {
    fn provided_params(&self) -> &'static [&'static str] {
        &["wait_time", "deviation"]
    }

    /// Time left, or `None` if the wait time could not be resolved.
    fn new_state(&self) -> Option<NodeState> {
        Some(Box::new(None::<f32>))
    }

    fn init_state(&self, ctx: &mut UpdateContext) {
        let time_left = ctx
            .resolve(&self.wait_time)
            .map(|wait_time| wait_time + ctx.random_deviation(self.deviation));
        if let Some(state) = ctx.state_mut::<Option<f32>>() {
            *state = time_left;
        }
    }

    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        let delta_time = ctx.delta_time;
        match ctx.state_mut::<Option<f32>>() {
            Some(Some(time_left)) => {
                *time_left -= delta_time;
                if *time_left <= 0. {
                    BehaviorResult::Success
                } else {
                    BehaviorResult::Running
                }
            }
            _ => BehaviorResult::Fail,
        }
    }
}

/// Finishes immediately with a fixed result.
pub struct ForceFinishNode {
    result: BehaviorResult,
}

impl ForceFinishNode {
    pub fn new(result: BehaviorResult) -> Self {
        Self { result }
    }

    pub fn from_params(params: &NodeParams) -> Result<Self, ParamError> {
        Ok(Self::new(
            params.literal_or("result", BehaviorResult::Success)?,
        ))
    }
}

impl BehaviorNode for ForceFinishNode {
    fn provided_params(&self) -> &'static [&'static str] {
        &["result"]
    }

    fn update(&self, _ctx: &mut UpdateContext) -> BehaviorResult {
        self.result
    }
}

/// Runs another tree as a nested frame.
///
/// The nested frame is created when this node becomes relevant and dropped
/// when it stops being relevant, after every nested node still holding state
/// has been released. Only the nested persistent slots (cooldowns) are kept,
/// for as long as the instance lives.
pub struct SubTreeNode {
    tree: Arc<TreeGraph>,
}

impl SubTreeNode {
    pub fn new(tree: Arc<TreeGraph>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &Arc<TreeGraph> {
        &self.tree
    }
}

impl BehaviorNode for SubTreeNode {
    fn new_state(&self) -> Option<NodeState> {
        Some(Box::new(None::<Frame>))
    }

    /// Nested persistent slots while no nested frame holds them.
    fn new_persistent_state(&self) -> Option<NodeState> {
        Some(Box::new(Some(PersistentSlots::new(&self.tree))))
    }

    fn init_state(&self, ctx: &mut UpdateContext) {
        let persistent = ctx
            .persistent_state_mut::<Option<PersistentSlots>>()
            .and_then(Option::take)
            .unwrap_or_else(|| PersistentSlots::new(&self.tree));
        let frame = Frame::with_persistent(&self.tree, persistent);
        if let Some(state) = ctx.state_mut::<Option<Frame>>() {
            *state = Some(frame);
        }
    }

    fn release_state(&self, ctx: &mut UpdateContext) {
        let Some(mut frame) = ctx.state_mut::<Option<Frame>>().and_then(Option::take) else {
            return;
        };
        ctx.nested(&self.tree, &mut frame).release_all();
        if let Some(state) = ctx.persistent_state_mut::<Option<PersistentSlots>>() {
            *state = Some(frame.into_persistent());
        }
        trace!(node = ctx.node(), "released nested frame");
    }

    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        if let Some(expected) = &self.tree.settings().knowledge_schema {
            let actual = ctx.knowledge().schema();
            if actual != Some(expected.as_str()) {
                warn!(
                    node = ctx.node(),
                    expected = expected.as_str(),
                    actual = ?actual,
                    "sub-tree knowledge schema mismatch"
                );
                return BehaviorResult::Fail;
            }
        }

        let Some(mut frame) = ctx.state_mut::<Option<Frame>>().and_then(Option::take) else {
            return BehaviorResult::Fail;
        };
        let root = self.tree.root();
        let result = ctx
            .nested(&self.tree, &mut frame)
            .tick_child_node(root)
            .unwrap_or(BehaviorResult::Fail);
        if let Some(state) = ctx.state_mut::<Option<Frame>>() {
            *state = Some(frame);
        }
        result
    }
}

#[cfg(test)]
mod test;
