use crate::{
    decorators::{
        CooldownNode, ForceFailedNode, ForceSuccessNode, HasTagNode, InvertNode,
        KnowledgeConditionalNode, KnowledgeValuesConditionalNode, LoopNode, TimeLimitNode,
    },
    error::ParamError,
    nodes::{DelayNode, ForceFinishNode, SelectorNode, SequenceNode},
    BehaviorNode, NodeParams,
};
use std::collections::HashMap;

pub type Constructor =
    Box<dyn Fn(&NodeParams) -> Result<Box<dyn BehaviorNode>, ParamError> + Send + Sync>;

/// Wraps a constructor of a node without parameters.
pub fn boxify<T>(cons: impl (Fn() -> T) + Send + Sync + 'static) -> Constructor
where
    T: BehaviorNode + 'static,
{
    Box::new(
        move |_: &NodeParams| -> Result<Box<dyn BehaviorNode>, ParamError> {
            Ok(Box::new(cons()))
        },
    )
}

/// Wraps a constructor that configures the node from its parameters.
pub fn boxify_params<T>(
    cons: impl (Fn(&NodeParams) -> Result<T, ParamError>) + Send + Sync + 'static,
) -> Constructor
where
    T: BehaviorNode + 'static,
{
    Box::new(
        move |params: &NodeParams| -> Result<Box<dyn BehaviorNode>, ParamError> {
            Ok(Box::new(cons(params)?))
        },
    )
}

/// Node types a loader can instantiate by name.
pub struct Registry {
    node_types: HashMap<String, Constructor>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut ret = Self {
            node_types: HashMap::new(),
        };
        ret.register("Sequence", boxify(|| SequenceNode));
        ret.register("Selector", boxify(|| SelectorNode));
        ret.register("Fallback", boxify(|| SelectorNode));
        ret.register("Invert", boxify(|| InvertNode));
        ret.register("Inverter", boxify(|| InvertNode));
        ret.register("ForceSuccess", boxify(|| ForceSuccessNode));
        ret.register("ForceFailed", boxify(|| ForceFailedNode));
        ret.register("ForceFailure", boxify(|| ForceFailedNode));
        ret.register("Loop", boxify_params(LoopNode::from_params));
        ret.register("TimeLimit", boxify_params(TimeLimitNode::from_params));
        ret.register("Cooldown", boxify_params(CooldownNode::from_params));
        ret.register(
            "KnowledgeConditional",
            boxify_params(KnowledgeConditionalNode::from_params),
        );
        ret.register(
            "KnowledgeValuesConditional",
            boxify_params(KnowledgeValuesConditionalNode::from_params),
        );
        ret.register("HasTag", boxify_params(HasTagNode::from_params));
        ret.register("Delay", boxify_params(DelayNode::from_params));
        ret.register("ForceFinish", boxify_params(ForceFinishNode::from_params));
        ret
    }
}

impl Registry {
    /// A registry without the built-in node types.
    pub fn empty() -> Self {
        Self {
            node_types: HashMap::new(),
        }
    }

    pub fn register(&mut self, type_name: impl ToString, constructor: Constructor) {
        self.node_types.insert(type_name.to_string(), constructor);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.node_types.contains_key(type_name)
    }

    /// `None` if the type is not registered.
    pub fn build(
        &self,
        type_name: &str,
        params: &NodeParams,
    ) -> Option<Result<Box<dyn BehaviorNode>, ParamError>> {
        self.node_types
            .get(type_name)
            .map(|constructor| constructor(params))
    }
}
