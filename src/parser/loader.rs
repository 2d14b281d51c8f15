use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use super::nom_parser::{ParamSource, TreeDef, TreeRootDef, TreeSource};
use crate::{
    error::LoadError, nodes::SubTreeNode, BehaviorNode, BehaviorNodeContainer, NodeParams,
    ParamValue, Registry, RootNode, TreeGraph,
};

/// Instantiate the tree named `main` from an AST.
///
/// `check_params` enables static checking of parameter names before actually ticking.
/// It is useful to catch errors in a behavior tree source file, but you need to
/// implement [`crate::BehaviorNode::provided_params`] to use it.
pub fn load(
    tree_source: &TreeSource,
    registry: &Registry,
    check_params: bool,
) -> Result<Arc<TreeGraph>, LoadError> {
    load_tree(tree_source, "main", registry, check_params)
}

/// Instantiate any named tree from an AST.
pub fn load_tree(
    tree_source: &TreeSource,
    name: &str,
    registry: &Registry,
    check_params: bool,
) -> Result<Arc<TreeGraph>, LoadError> {
    Loader::new(tree_source, registry, check_params).tree(name, None)
}

/// Instantiate every tree in the source. Sub-tree references share the graphs
/// returned here.
pub fn load_all(
    tree_source: &TreeSource,
    registry: &Registry,
    check_params: bool,
) -> Result<HashMap<String, Arc<TreeGraph>>, LoadError> {
    let mut loader = Loader::new(tree_source, registry, check_params);
    for tree in &tree_source.tree_defs {
        loader.tree(tree.name, None)?;
    }
    Ok(loader.loaded)
}

/// A mechanism to detect infinite recursion. It is a linked list in call stack.
/// You can traverse the link back to enumerate all the subtree names (which is effectively function names)
/// and check if a subtree name to be inserted is already there.
///
/// We could also use HashSet of subtree names, but it feels silly to use dynamically allocated collection
/// when you can do the same thing with just the call stack.
///
/// A sub-tree is compiled into its own graph before the tree referencing it
/// is finished, so a recursive reference could never be completed. Without
/// this check it would overflow the call stack instead.
struct TreeStack<'a> {
    name: &'a str,
    parent: Option<&'a TreeStack<'a>>,
}

impl<'a> TreeStack<'a> {
    fn find(&self, name: &str) -> bool {
        if self.name == name {
            true
        } else if let Some(parent) = self.parent {
            parent.find(name)
        } else {
            false
        }
    }
}

struct Loader<'a, 'src> {
    source: &'a TreeSource<'src>,
    registry: &'a Registry,
    check_params: bool,
    /// Compiled graphs by tree name, so every reference to a tree shares one graph.
    loaded: HashMap<String, Arc<TreeGraph>>,
}

impl<'a, 'src> Loader<'a, 'src> {
    fn new(source: &'a TreeSource<'src>, registry: &'a Registry, check_params: bool) -> Self {
        Self {
            source,
            registry,
            check_params,
            loaded: HashMap::new(),
        }
    }

    fn tree(&mut self, name: &str, stack: Option<&TreeStack>) -> Result<Arc<TreeGraph>, LoadError> {
        if let Some(graph) = self.loaded.get(name) {
            return Ok(graph.clone());
        }

        // Prevent infinite recursion
        if stack.map_or(false, |stack| stack.find(name)) {
            return Err(LoadError::InfiniteRecursion {
                node: name.to_owned(),
            });
        }

        let source = self.source;
        let def = source
            .find(name)
            .ok_or_else(|| LoadError::MissingTree(name.to_owned()))?;

        let tree_stack = TreeStack {
            name,
            parent: stack,
        };
        let root = self.root(def, &tree_stack)?;
        let graph = Arc::new(TreeGraph::new(root));
        debug!(
            tree = name,
            nodes = graph.len(),
            state_size = graph.state_size(),
            "Loaded behavior tree"
        );

        self.loaded.insert(name.to_owned(), graph.clone());
        Ok(graph)
    }

    /// A top level `Sequence` is the root itself. Anything else gets a root
    /// wrapped around it.
    fn root(
        &mut self,
        def: &TreeRootDef<'src>,
        stack: &TreeStack,
    ) -> Result<BehaviorNodeContainer, LoadError> {
        let mut root = BehaviorNodeContainer::new_with_name(
            Box::new(RootNode::new(def.settings.clone())),
            def.name,
        );

        let children = if def.root.ty == "Sequence" {
            if let Some(param) = def.root.params.first() {
                return Err(LoadError::UnknownParam {
                    node: def.root.ty.to_owned(),
                    param: param.name.to_owned(),
                });
            }
            def.root
                .children
                .iter()
                .map(|child| self.node(child, stack))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![self.node(&def.root, stack)?]
        };

        for child in children {
            root.add_child(child)
                .map_err(|e| LoadError::AddChildError(e, def.root.ty.to_owned()))?;
        }
        Ok(root)
    }

    fn node(
        &mut self,
        def: &TreeDef<'src>,
        stack: &TreeStack,
    ) -> Result<BehaviorNodeContainer, LoadError> {
        let params = node_params(def);

        let node: Box<dyn BehaviorNode> = match self.registry.build(def.ty, &params) {
            Some(node) => node.map_err(|source| LoadError::Param {
                node: def.ty.to_owned(),
                source,
            })?,
            None if self.source.find(def.ty).is_some() => {
                Box::new(SubTreeNode::new(self.tree(def.ty, Some(stack))?))
            }
            None => return Err(LoadError::MissingNode(def.ty.to_owned())),
        };

        if self.check_params {
            let provided = node.provided_params();
            if let Some(param) = params.keys().find(|key| !provided.contains(&key.as_str())) {
                return Err(LoadError::UnknownParam {
                    node: def.ty.to_owned(),
                    param: param.to_string(),
                });
            }
        }

        let mut ret = BehaviorNodeContainer::new_with_name(node, def.ty);
        for child in &def.children {
            let child = self.node(child, stack)?;
            ret.add_child(child)
                .map_err(|e| LoadError::AddChildError(e, def.ty.to_owned()))?;
        }
        Ok(ret)
    }
}

fn node_params(def: &TreeDef) -> NodeParams {
    def.params
        .iter()
        .map(|param| {
            let value = match param.value {
                ParamSource::Literal(ref value) => ParamValue::Literal(value.clone()),
                ParamSource::Path(path) => ParamValue::path(path),
            };
            (param.name.into(), value)
        })
        .collect()
}

#[cfg(test)]
mod test;
