//! Nodes wrapping exactly one child.
//!
//! The child is ticked by the default [`BehaviorNode::update`]; decorators
//! customize the gate in front of it (`can_update`) or the result behind it
//! (`post_update`).

use crate::{
    error::ParamError, ActorId, BehaviorNode, BehaviorResult, KnowledgeSelector,
    KnowledgeSelectorAny, NodeParams, NodeState, NumChildren, Symbol, UpdateContext,
    ValueComparison,
};
use tracing::warn;

macro_rules! single_child {
    () => {
        fn max_children(&self) -> NumChildren {
            NumChildren::Finite(1)
        }
    };
}

/// Swaps `Success` and `Fail`.
#[derive(Default)]
pub struct InvertNode;

impl BehaviorNode for InvertNode {
    single_child!();

    fn post_update(&self, _ctx: &mut UpdateContext, result: &mut BehaviorResult) {
        *result = match *result {
            BehaviorResult::Success => BehaviorResult::Fail,
            BehaviorResult::Fail => BehaviorResult::Success,
            BehaviorResult::Running => BehaviorResult::Running,
        };
    }
}

#[derive(Default)]
pub struct ForceSuccessNode;

impl BehaviorNode for ForceSuccessNode {
    single_child!();

    fn post_update(&self, _ctx: &mut UpdateContext, result: &mut BehaviorResult) {
        if *result != BehaviorResult::Running {
            *result = BehaviorResult::Success;
        }
    }
}

#[derive(Default)]
pub struct ForceFailedNode;

impl BehaviorNode for ForceFailedNode {
    single_child!();

    fn post_update(&self, _ctx: &mut UpdateContext, result: &mut BehaviorResult) {
        if *result != BehaviorResult::Running {
            *result = BehaviorResult::Fail;
        }
    }
}

/// Restarts a succeeding child until it has succeeded `loop_count` times.
/// A failure ends the loop at once.
pub struct LoopNode {
    loop_count: KnowledgeSelector<i32>,
}

impl LoopNode {
    pub fn new(loop_count: impl Into<KnowledgeSelector<i32>>) -> Self {
        Self {
            loop_count: loop_count.into(),
        }
    }

    pub fn from_params(params: &NodeParams) -> Result<Self, ParamError> {
        Ok(Self {
            loop_count: params.selector("loop_count", 3)?,
        })
    }
}

impl BehaviorNode for LoopNode {
    single_child!();

    fn provided_params(&self) -> &'static [&'static str] {
        &["loop_count"]
    }

    /// Remaining iterations; read from knowledge only when the loop starts.
    fn new_state(&self) -> Option<NodeState> {
        Some(Box::new(None::<i32>))
    }

    fn init_state(&self, ctx: &mut UpdateContext) {
        let loops = ctx.resolve(&self.loop_count);
        if let Some(state) = ctx.state_mut::<Option<i32>>() {
            *state = loops;
        }
    }

    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        if !matches!(ctx.state::<Option<i32>>(), Some(Some(_))) {
            return BehaviorResult::Fail;
        }
        ctx.tick_decorated_child()
    }

    fn post_update(&self, ctx: &mut UpdateContext, result: &mut BehaviorResult) {
        if *result != BehaviorResult::Success {
            return;
        }
        if let Some(Some(loops)) = ctx.state_mut::<Option<i32>>() {
            *loops -= 1;
            if *loops > 0 {
                // The child was released on success, so the next tick starts
                // it afresh.
                *result = BehaviorResult::Running;
            }
        }
    }
}

/// Fails if its child has not finished within `max_duration` seconds.
pub struct TimeLimitNode {
    max_duration: KnowledgeSelector<f32>,
    deviation: f32,
}

impl TimeLimitNode {
    pub fn new(max_duration: impl Into<KnowledgeSelector<f32>>) -> Self {
        Self {
            max_duration: max_duration.into(),
            deviation: 0.,
        }
    }

    pub fn with_deviation(mut self, deviation: f32) -> Self {
        self.deviation = deviation;
        self
    }

    pub fn from_params(params: &NodeParams) -> Result<Self, ParamError> {
        Ok(Self {
            max_duration: params.selector("max_duration", 3.)?,
            deviation: params.literal_or("deviation", 0.)?,
        })
    }
}

impl BehaviorNode for TimeLimitNode {
    single_child!();

    fn provided_params(&self) -> &'static [&'static str] {
        &["max_duration", "deviation"]
    }

    fn new_state(&self) -> Option<NodeState> {
        Some(Box::new(None::<f32>))
    }

    fn init_state(&self, ctx: &mut UpdateContext) {
        let time_left = ctx
            .resolve(&self.max_duration)
            .map(|duration| duration + ctx.random_deviation(self.deviation));
        if let Some(state) = ctx.state_mut::<Option<f32>>() {
            *state = time_left;
        }
    }

    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        let delta_time = ctx.delta_time;
        let expired = match ctx.state_mut::<Option<f32>>() {
            Some(Some(time_left)) => {
                *time_left -= delta_time;
                *time_left <= 0.
            }
            _ => return BehaviorResult::Fail,
        };
        if expired {
            ctx.release_children();
            return BehaviorResult::Fail;
        }
        ctx.tick_decorated_child()
    }
}

/// Keeps its subtree from running again until `min_duration` seconds after
/// it last finished.
///
/// The end of the cooldown is persistent state: it keeps counting while the
/// node is not relevant.
pub struct CooldownNode {
    min_duration: KnowledgeSelector<f32>,
    deviation: f32,
}

impl CooldownNode {
    pub fn new(min_duration: impl Into<KnowledgeSelector<f32>>) -> Self {
        Self {
            min_duration: min_duration.into(),
            deviation: 0.,
        }
    }

    pub fn with_deviation(mut self, deviation: f32) -> Self {
        self.deviation = deviation;
        self
    }

    pub fn from_params(params: &NodeParams) -> Result<Self, ParamError> {
        Ok(Self {
            min_duration: params.selector("min_duration", 3.)?,
            deviation: params.literal_or("deviation", 0.)?,
        })
    }
}

impl BehaviorNode for CooldownNode {
    single_child!();

    fn provided_params(&self) -> &'static [&'static str] {
        &["min_duration", "deviation"]
    }

    /// Instance time at which the cooldown ends.
    fn new_persistent_state(&self) -> Option<NodeState> {
        Some(Box::new(0f64))
    }

    fn can_update(&self, ctx: &UpdateContext) -> bool {
        ctx.persistent_state::<f64>()
            .map_or(true, |end_time| ctx.time >= *end_time)
    }

    fn post_update(&self, ctx: &mut UpdateContext, result: &mut BehaviorResult) {
        if *result == BehaviorResult::Running {
            return;
        }
        let duration = ctx.resolve(&self.min_duration).unwrap_or_else(|| {
            warn!(node = ctx.node(), "cooldown duration is not available");
            0.
        });
        let end_time = ctx.time + f64::from(duration + ctx.random_deviation(self.deviation));
        if let Some(state) = ctx.persistent_state_mut::<f64>() {
            *state = end_time;
        }
    }
}

/// Lets its child run only while a knowledge value compares true against a
/// constant.
pub struct KnowledgeConditionalNode {
    value_a: KnowledgeSelectorAny,
    value_b: f32,
    comparison: ValueComparison,
}

impl KnowledgeConditionalNode {
    pub fn new(value_a: KnowledgeSelectorAny, comparison: ValueComparison, value_b: f32) -> Self {
        Self {
            value_a,
            value_b,
            comparison,
        }
    }

    pub fn from_params(params: &NodeParams) -> Result<Self, ParamError> {
        Ok(Self {
            value_a: params.selector_any("value_a", "0"),
            value_b: params.literal_or("value_b", 0.)?,
            comparison: params.literal_or("comparison", ValueComparison::Equal)?,
        })
    }
}

impl BehaviorNode for KnowledgeConditionalNode {
    single_child!();

    fn provided_params(&self) -> &'static [&'static str] {
        &["value_a", "value_b", "comparison"]
    }

    fn can_update(&self, ctx: &UpdateContext) -> bool {
        self.value_a
            .resolve(ctx.knowledge())
            .map_or(false, |a| self.comparison.compare(a, self.value_b))
    }
}

/// Like [`KnowledgeConditionalNode`], but both sides may come from knowledge.
pub struct KnowledgeValuesConditionalNode {
    value_a: KnowledgeSelectorAny,
    value_b: KnowledgeSelectorAny,
    comparison: ValueComparison,
}

impl KnowledgeValuesConditionalNode {
    pub fn new(
        value_a: KnowledgeSelectorAny,
        comparison: ValueComparison,
        value_b: KnowledgeSelectorAny,
    ) -> Self {
        Self {
            value_a,
            value_b,
            comparison,
        }
    }

    pub fn from_params(params: &NodeParams) -> Result<Self, ParamError> {
        Ok(Self {
            value_a: params.selector_any("value_a", "0"),
            value_b: params.selector_any("value_b", "0"),
            comparison: params.literal_or("comparison", ValueComparison::Equal)?,
        })
    }
}

impl BehaviorNode for KnowledgeValuesConditionalNode {
    single_child!();

    fn provided_params(&self) -> &'static [&'static str] {
        &["value_a", "value_b", "comparison"]
    }

    fn can_update(&self, ctx: &UpdateContext) -> bool {
        let knowledge = ctx.knowledge();
        match (self.value_a.resolve(knowledge), self.value_b.resolve(knowledge)) {
            (Some(a), Some(b)) => self.comparison.compare(a, b),
            _ => false,
        }
    }
}

/// Lets its child run only if an actor carries a tag (or, inverted, lacks
/// it).
pub struct HasTagNode {
    actor: KnowledgeSelector<ActorId>,
    tag: Symbol,
    invert: bool,
}

impl HasTagNode {
    pub fn new(actor: impl Into<KnowledgeSelector<ActorId>>, tag: impl Into<Symbol>) -> Self {
        Self {
            actor: actor.into(),
            tag: tag.into(),
            invert: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    pub fn from_params(params: &NodeParams) -> Result<Self, ParamError> {
        Ok(Self {
            actor: params.selector("actor", ActorId(0))?,
            tag: params.symbol("tag")?.ok_or_else(|| ParamError::Missing {
                key: "tag".to_owned(),
            })?,
            invert: params.literal_or("invert", false)?,
        })
    }
}

impl BehaviorNode for HasTagNode {
    single_child!();

    fn provided_params(&self) -> &'static [&'static str] {
        &["actor", "tag", "invert"]
    }

    /// An actor that cannot be resolved fails the check, inverted or not.
    fn can_update(&self, ctx: &UpdateContext) -> bool {
        let (Some(actor), Some(tags)) = (ctx.resolve(&self.actor), ctx.tags()) else {
            return false;
        };
        tags.has_tag(actor, self.tag) != self.invert
    }
}
