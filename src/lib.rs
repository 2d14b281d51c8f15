//! # behavior-tree-arena (Rust crate)
//!
//! A behavior tree interpreter for driving many concurrent agents from one
//! shared tree definition.
//!
//!
//! ## Overview
//!
//! A tree is compiled once into an immutable [`TreeGraph`] and shared through
//! an `Arc`. Each agent owns a [`BehaviorInstance`], which holds nothing but a
//! small [`Frame`] of per-node state, a bitset of the nodes that currently hold
//! live state ("relevant" nodes), and the agent's knowledge store.
//!
//! Nodes never store per-agent data in `self`. Everything that changes while
//! ticking lives in the frame and is reached through the [`UpdateContext`]
//! passed to every call, so `&self` is all a node gets.
//!
//!
//! ## How it looks like
//!
//! Define a node by implementing [`BehaviorNode`].
//! Only `update` is interesting for most leaves.
//!
//! ```rust
//! use behavior_tree_arena::*;
//!
//! struct ReportAmmo;
//!
//! impl BehaviorNode for ReportAmmo {
//!     fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
//!         match ctx.knowledge().get::<i32>("Blackboard/Ammo") {
//!             Some(ammo) if *ammo > 0 => BehaviorResult::Success,
//!             _ => BehaviorResult::Fail,
//!         }
//!     }
//! }
//! ```
//!
//! Then build a tree and tick it.
//!
//! ```rust
//! # use behavior_tree_arena::*;
//! # use std::sync::Arc;
//! # struct ReportAmmo;
//! # impl BehaviorNode for ReportAmmo {}
//! let mut root = BehaviorNodeContainer::new_node(RootNode::default());
//! root.add_child(BehaviorNodeContainer::new_node(DelayNode::new(0.5))).unwrap();
//! root.add_child(BehaviorNodeContainer::new_node(ReportAmmo)).unwrap();
//!
//! let tree = Arc::new(TreeGraph::new(root));
//! let mut instance = BehaviorInstance::new(tree, Knowledge::new());
//! assert_eq!(instance.tick(0.25), BehaviorResult::Running);
//! assert_eq!(instance.tick(0.25), BehaviorResult::Success);
//! ```
//!
//!
//! ## State and relevancy
//!
//! A node that needs memory between ticks declares it with
//! [`BehaviorNode::new_state`] and reinitializes it in
//! [`BehaviorNode::init_state`], which runs exactly once each time the node
//! becomes relevant. [`BehaviorNode::release_state`] runs exactly once when it
//! stops being relevant, either because it finished or because its parent
//! moved on. State that must outlive relevancy (cooldown timers) is declared
//! with [`BehaviorNode::new_persistent_state`] instead and lives as long as
//! the instance.
//!
//!
//! ## The tree file format
//!
//! Trees can be written in a small text format and loaded with [`parse_file`]
//! and [`load`].
//!
//! ```raw
//! # A comment
//! tree main(update_fps = 20) = Sequence {
//!     Cooldown(min_duration = 2.0) {
//!         Delay(wait_time <- Blackboard/WaitTime)
//!     }
//!     Patrol
//! }
//!
//! tree Patrol = Selector {
//!     KnowledgeConditional(value_a <- Blackboard/Alert, comparison = Equal, value_b = 1) {
//!         ForceFinish(result = Fail)
//!     }
//!     Delay(wait_time = 1.5, deviation = 0.5)
//! }
//! ```
//!
//! `name = value` sets a literal parameter; `name <- path` reads the
//! parameter from the knowledge store every time it is needed.
//! A node type that is not registered but names another tree in the same
//! source becomes a sub-tree, run in its own nested frame.
//!
//! Attributes in parentheses after the tree name configure [`TreeSettings`].
//!
//! The same structure can be written in YAML and loaded with [`load_yaml`].

mod container;
mod context;
mod decorators;
pub mod error;
mod graph;
mod instance;
mod knowledge;
mod memory;
mod nodes;
mod params;
pub mod parser;
mod registry;
mod selector;
mod symbol;
#[cfg(test)]
mod testing;

use serde::Deserialize;
use std::any::Any;

pub use crate::container::BehaviorNodeContainer;
pub use crate::context::UpdateContext;
pub use crate::decorators::{
    CooldownNode, ForceFailedNode, ForceSuccessNode, HasTagNode, InvertNode,
    KnowledgeConditionalNode, KnowledgeValuesConditionalNode, LoopNode, TimeLimitNode,
};
pub use crate::graph::{NodeRecordDef, TreeGraph};
pub use crate::instance::BehaviorInstance;
pub use crate::knowledge::{ActorId, Knowledge, KnowledgeStore, TagLookup};
pub use crate::memory::{Frame, PersistentSlots, RelevantNodes};
pub use crate::nodes::{
    DelayNode, ForceFinishNode, RootNode, SelectorNode, SequenceNode, SubTreeNode,
};
pub use crate::params::{NodeParams, ParamValue};
pub use crate::selector::{
    KnowledgeSelector, KnowledgeSelectorAny, KnowledgeValue, ValueComparison,
};
pub use crate::symbol::Symbol;
pub use crate::{
    parser::{load, load_all, load_tree, load_yaml, parse_file},
    registry::{boxify, boxify_params, Constructor, Registry},
};
pub use ::once_cell::sync::*;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BehaviorResult {
    Success,
    Fail,
    /// The node should keep running in the next tick
    Running,
}

impl std::str::FromStr for BehaviorResult {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Success" => Self::Success,
            "Fail" | "Failed" | "Failure" => Self::Fail,
            "Running" => Self::Running,
            _ => return Err(()),
        })
    }
}

/// Stable position of a node within its [`TreeGraph`].
pub type NodeIndex = usize;

/// Type-erased block of per-instance node state.
pub type NodeState = Box<dyn Any + Send>;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum NumChildren {
    Finite(usize),
    Infinite,
}

impl PartialOrd for NumChildren {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(match (self, other) {
            (NumChildren::Finite(_), NumChildren::Infinite) => std::cmp::Ordering::Less,
            (NumChildren::Infinite, NumChildren::Finite(_)) => std::cmp::Ordering::Greater,
            (NumChildren::Finite(lhs), NumChildren::Finite(rhs)) => lhs.cmp(rhs),
            (NumChildren::Infinite, NumChildren::Infinite) => return None,
        })
    }
}

/// Settings a tree declares on its root node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TreeSettings {
    /// Identifier of the knowledge layout the tree expects. `None` accepts any
    /// store.
    pub knowledge_schema: Option<String>,
    /// Intended tick rate. Only [`BehaviorInstance::advance`] looks at it.
    pub update_fps: f32,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            knowledge_schema: None,
            update_fps: 10.,
        }
    }
}

/// The lifecycle contract of a node.
///
/// Every hook receives `&self` only: a node is shared by all instances of its
/// tree, so anything that changes per agent belongs in the state declared by
/// [`Self::new_state`] or [`Self::new_persistent_state`].
///
/// The walker in [`UpdateContext::tick_child_node`] drives the hooks in this
/// order: `init_state` when the node becomes relevant, `can_update`, then
/// `update` and `post_update`, and `become_irrelevant` once the result is
/// terminal.
pub trait BehaviorNode: Send + Sync {
    /// Parameter names the node understands. Loaders reject other names when
    /// asked to check parameters.
    fn provided_params(&self) -> &'static [&'static str] {
        &[]
    }

    fn max_children(&self) -> NumChildren {
        NumChildren::Finite(0)
    }

    /// A fresh block of relevancy-scoped state, or `None` for stateless nodes.
    /// Called once per instance; the block is reused for every relevancy
    /// episode.
    fn new_state(&self) -> Option<NodeState> {
        None
    }

    /// Like [`Self::new_state`], but the block survives the node becoming
    /// irrelevant and is only dropped with the instance.
    fn new_persistent_state(&self) -> Option<NodeState> {
        None
    }

    fn init_state(&self, _ctx: &mut UpdateContext) {}

    fn release_state(&self, _ctx: &mut UpdateContext) {}

    /// Gate evaluated before `update`. A closed gate makes the parent skip
    /// this whole subtree for the tick.
    fn can_update(&self, _ctx: &UpdateContext) -> bool {
        true
    }

    /// Ticks the only child if there is one, otherwise succeeds.
    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        ctx.tick_decorated_child()
    }

    fn post_update(&self, _ctx: &mut UpdateContext, _result: &mut BehaviorResult) {}

    /// Forwards irrelevance to relevant children first, then releases this
    /// node's own state.
    fn become_irrelevant(&self, ctx: &mut UpdateContext) {
        ctx.release_children();
        ctx.release_self();
    }

    /// Only the root of a tree returns settings.
    fn tree_settings(&self) -> Option<&TreeSettings> {
        None
    }
}

/// Builds [`NodeParams`] from `"name" => value` pairs. A `&str` value is a
/// literal; use [`ParamValue::path`] for knowledge paths.
#[macro_export]
macro_rules! params {
    () => {
        $crate::NodeParams::default()
    };
    ($($name: literal => $val: expr),+ $(,)?) => {{
        let mut ret = $crate::NodeParams::default();
        $(ret.insert($name, $val);)+
        ret
    }};
}
