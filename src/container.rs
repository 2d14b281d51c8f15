use crate::{
    error::{AddChildError, AddChildResult},
    BehaviorNode, NumChildren,
};

/// Nested, owned form of a tree under construction. Turn it into a shareable
/// definition with [`crate::TreeGraph::new`].
pub struct BehaviorNodeContainer {
    /// Name of the type of the node
    pub(crate) name: String,
    pub(crate) node: Box<dyn BehaviorNode>,
    pub(crate) child_nodes: Vec<BehaviorNodeContainer>,
}

impl BehaviorNodeContainer {
    pub fn new(node: Box<dyn BehaviorNode>) -> Self {
        Self {
            name: "".to_owned(),
            node,
            child_nodes: vec![],
        }
    }

    pub fn new_node(node: impl BehaviorNode + 'static) -> Self {
        Self::new(Box::new(node))
    }

    pub fn new_with_name(node: Box<dyn BehaviorNode>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node,
            child_nodes: vec![],
        }
    }

    pub fn add_child(&mut self, child: BehaviorNodeContainer) -> AddChildResult {
        if NumChildren::Finite(self.child_nodes.len()) < self.node.max_children() {
            self.child_nodes.push(child);
            Ok(())
        } else {
            Err(AddChildError::TooManyNodes)
        }
    }

    /// Chaining form of [`Self::add_child`].
    pub fn with_child(mut self, child: BehaviorNodeContainer) -> Result<Self, AddChildError> {
        self.add_child(child)?;
        Ok(self)
    }

    pub fn children(&self) -> &[BehaviorNodeContainer] {
        &self.child_nodes
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
