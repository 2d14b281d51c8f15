//! Leaf nodes that record their lifecycle, for asserting relevancy.

use crate::{
    BehaviorInstance, BehaviorNode, BehaviorNodeContainer, BehaviorResult, Knowledge, NodeState,
    Symbol, TreeGraph, UpdateContext,
};
use std::sync::{Arc, Mutex};

pub(crate) fn instance(root: BehaviorNodeContainer) -> BehaviorInstance {
    BehaviorInstance::new(Arc::new(TreeGraph::new(root)), Knowledge::new()).with_seed(0)
}

pub(crate) fn compound(
    node: impl BehaviorNode + 'static,
    children: Vec<BehaviorNodeContainer>,
) -> BehaviorNodeContainer {
    let mut ret = BehaviorNodeContainer::new_node(node);
    for child in children {
        ret.add_child(child).unwrap();
    }
    ret
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    Init(&'static str),
    Update(&'static str),
    Release(&'static str),
}

#[derive(Clone, Default)]
pub(crate) struct Log(Arc<Mutex<Vec<Event>>>);

impl Log {
    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: Event) -> usize {
        self.0.lock().unwrap().iter().filter(|e| **e == event).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    /// A recorder returning `results` in turn over its lifetime; the last
    /// result repeats.
    pub fn node(&self, name: &'static str, results: &[BehaviorResult]) -> Recorder {
        Recorder {
            name,
            log: self.clone(),
            results: results.to_vec(),
            gate: None,
        }
    }

    pub fn leaf(&self, name: &'static str, results: &[BehaviorResult]) -> BehaviorNodeContainer {
        BehaviorNodeContainer::new_with_name(Box::new(self.node(name, results)), name)
    }
}

pub(crate) struct Recorder {
    name: &'static str,
    log: Log,
    results: Vec<BehaviorResult>,
    gate: Option<Symbol>,
}

impl Recorder {
    /// Only updates while the knowledge value at `path` is not `false`.
    pub fn gated(mut self, path: &str) -> Self {
        self.gate = Some(path.into());
        self
    }
}

impl BehaviorNode for Recorder {
    /// Updates so far in this relevancy episode.
    fn new_state(&self) -> Option<NodeState> {
        Some(Box::new(0usize))
    }

    /// Updates over the lifetime of the instance.
    fn new_persistent_state(&self) -> Option<NodeState> {
        Some(Box::new(0usize))
    }

    fn init_state(&self, ctx: &mut UpdateContext) {
        self.log.push(Event::Init(self.name));
        *ctx.state_mut::<usize>().unwrap() = 0;
    }

    fn release_state(&self, _ctx: &mut UpdateContext) {
        self.log.push(Event::Release(self.name));
    }

    fn can_update(&self, ctx: &UpdateContext) -> bool {
        self.gate.map_or(true, |gate| {
            ctx.knowledge().get::<bool>(gate).copied().unwrap_or(true)
        })
    }

    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        self.log.push(Event::Update(self.name));
        *ctx.state_mut::<usize>().unwrap() += 1;
        let lifetime = ctx.persistent_state_mut::<usize>().unwrap();
        let result = self.results[(*lifetime).min(self.results.len() - 1)];
        *lifetime += 1;
        result
    }
}
