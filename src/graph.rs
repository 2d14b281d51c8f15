//! The immutable, shareable definition of a behavior tree.

use crate::{
    error::GraphError, BehaviorNode, BehaviorNodeContainer, NodeIndex, NumChildren, TreeSettings,
};

struct NodeRecord {
    name: String,
    node: Box<dyn BehaviorNode>,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
    state_slot: Option<usize>,
    persistent_slot: Option<usize>,
    state_size: usize,
}

/// One node of a flat tree description, as produced by an asset loader.
pub struct NodeRecordDef {
    pub name: String,
    pub node: Box<dyn BehaviorNode>,
    pub children: Vec<NodeIndex>,
}

impl NodeRecordDef {
    pub fn new(name: impl Into<String>, node: impl BehaviorNode + 'static) -> Self {
        Self {
            name: name.into(),
            node: Box::new(node),
            children: vec![],
        }
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeIndex>) -> Self {
        self.children.extend(children);
        self
    }
}

/// A validated tree of nodes addressed by stable indices.
///
/// The graph is read-only once built. Every instance ticking it keeps its own
/// [`crate::Frame`], so one graph can be shared by any number of agents on any
/// number of threads.
pub struct TreeGraph {
    records: Vec<NodeRecord>,
    root: NodeIndex,
    state_slots: usize,
    persistent_slots: usize,
    state_size: usize,
    settings: TreeSettings,
}

impl TreeGraph {
    /// Flattens a container tree in depth-first pre-order; the root gets index 0.
    pub fn new(root: BehaviorNodeContainer) -> Self {
        let mut records = vec![];
        flatten(root, None, &mut records);
        Self::finish(records, 0)
    }

    /// Builds a graph from explicit child indices, rejecting anything that is
    /// not a single rooted tree.
    pub fn from_records(defs: Vec<NodeRecordDef>) -> Result<Self, GraphError> {
        if defs.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut parents = vec![None; defs.len()];
        for (index, def) in defs.iter().enumerate() {
            if NumChildren::Finite(def.children.len()) > def.node.max_children() {
                return Err(GraphError::TooManyChildren { node: index });
            }
            for &child in &def.children {
                let parent = parents
                    .get_mut(child)
                    .ok_or(GraphError::MissingChild {
                        parent: index,
                        child,
                    })?;
                if parent.is_some() {
                    return Err(GraphError::MultipleParents { node: child });
                }
                *parent = Some(index);
            }
        }

        let mut roots = parents
            .iter()
            .enumerate()
            .filter(|(_, parent)| parent.is_none())
            .map(|(index, _)| index);
        let root = roots.next().ok_or(GraphError::NoRoot)?;
        if let Some(second) = roots.next() {
            return Err(GraphError::MultipleRoots {
                first: root,
                second,
            });
        }

        // With single parents, whatever the root cannot reach sits on a cycle.
        let mut reached = vec![false; defs.len()];
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            reached[index] = true;
            stack.extend(defs[index].children.iter().copied());
        }
        if let Some(node) = reached.iter().position(|reached| !reached) {
            return Err(GraphError::Unreachable { node });
        }

        let records = defs
            .into_iter()
            .zip(parents)
            .map(|(def, parent)| NodeRecord {
                name: def.name,
                node: def.node,
                parent,
                children: def.children,
                state_slot: None,
                persistent_slot: None,
                state_size: 0,
            })
            .collect();
        Ok(Self::finish(records, root))
    }

    fn finish(mut records: Vec<NodeRecord>, root: NodeIndex) -> Self {
        let mut state_slots = 0;
        let mut persistent_slots = 0;
        let mut state_size = 0;
        for record in &mut records {
            if let Some(state) = record.node.new_state() {
                record.state_slot = Some(state_slots);
                record.state_size = std::mem::size_of_val(&*state);
                state_slots += 1;
                state_size += record.state_size;
            }
            if record.node.new_persistent_state().is_some() {
                record.persistent_slot = Some(persistent_slots);
                persistent_slots += 1;
            }
        }
        let settings = records[root]
            .node
            .tree_settings()
            .cloned()
            .unwrap_or_default();
        Self {
            records,
            root,
            state_slots,
            persistent_slots,
            state_size,
            settings,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn node(&self, index: NodeIndex) -> &dyn BehaviorNode {
        self.records[index].node.as_ref()
    }

    pub fn name(&self, index: NodeIndex) -> &str {
        &self.records[index].name
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.records[index].parent
    }

    pub fn children(&self, index: NodeIndex) -> &[NodeIndex] {
        &self.records[index].children
    }

    /// Bytes of relevancy-scoped state the node needs; 0 for stateless nodes.
    pub fn node_state_size(&self, index: NodeIndex) -> usize {
        self.records[index].state_size
    }

    /// Total relevancy-scoped state of one instance.
    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    /// Finds the first node with the given name.
    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.records.iter().position(|record| record.name == name)
    }

    pub(crate) fn state_slot(&self, index: NodeIndex) -> Option<usize> {
        self.records[index].state_slot
    }

    pub(crate) fn persistent_slot(&self, index: NodeIndex) -> Option<usize> {
        self.records[index].persistent_slot
    }

    pub(crate) fn state_slots(&self) -> usize {
        self.state_slots
    }

    pub(crate) fn persistent_slots(&self) -> usize {
        self.persistent_slots
    }
}

impl std::fmt::Debug for TreeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeGraph")
            .field(
                "nodes",
                &self
                    .records
                    .iter()
                    .map(|record| (&record.name, &record.children))
                    .collect::<Vec<_>>(),
            )
            .field("root", &self.root)
            .field("state_size", &self.state_size)
            .field("settings", &self.settings)
            .finish()
    }
}

fn flatten(
    container: BehaviorNodeContainer,
    parent: Option<NodeIndex>,
    records: &mut Vec<NodeRecord>,
) -> NodeIndex {
    let index = records.len();
    records.push(NodeRecord {
        name: container.name,
        node: container.node,
        parent,
        children: vec![],
        state_slot: None,
        persistent_slot: None,
        state_size: 0,
    });
    for child in container.child_nodes {
        let child = flatten(child, Some(index), records);
        records[index].children.push(child);
    }
    index
}
