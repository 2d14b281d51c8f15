use thiserror::Error;

use crate::NodeIndex;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum AddChildError {
    #[error("Attempted to add too many nodes")]
    TooManyNodes,
}

pub type AddChildResult = Result<(), AddChildError>;

/// A flat node list that cannot form a behavior tree.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    #[error("The tree has no nodes")]
    Empty,
    #[error("Node {parent} refers to missing child {child}")]
    MissingChild { parent: NodeIndex, child: NodeIndex },
    #[error("Node {node} has more than one parent")]
    MultipleParents { node: NodeIndex },
    #[error("The tree has no root node")]
    NoRoot,
    #[error("The tree has more than one root node: {first} and {second}")]
    MultipleRoots { first: NodeIndex, second: NodeIndex },
    #[error("Node {node} is not reachable from the root")]
    Unreachable { node: NodeIndex },
    #[error("Node {node} has too many children")]
    TooManyChildren { node: NodeIndex },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParamError {
    #[error("Could not parse parameter {key} from {value:?}")]
    Parse { key: String, value: String },
    #[error("Parameter {key} requires a literal value, not a knowledge path")]
    ExpectedLiteral { key: String },
    #[error("Missing required parameter {key}")]
    Missing { key: String },
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("The tree {0:?} does not exist")]
    MissingTree(String),
    #[error("Node type or subtree name not found {0:?}")]
    MissingNode(String),
    #[error("Infinite recursion of subtree {node:?}")]
    InfiniteRecursion { node: String },
    #[error("{0} to {1}")]
    AddChildError(AddChildError, String),
    #[error("Node {node} rejected its parameters: {source}")]
    Param {
        node: String,
        #[source]
        source: ParamError,
    },
    #[error("Node {node} does not provide parameter {param}")]
    UnknownParam { node: String, param: String },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Error)]
pub enum LoadYamlError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("Missing behavior_tree section")]
    Missing,
    #[error("Parameter {param} of node {node} is not a scalar")]
    InvalidParam { node: String, param: String },
    #[error(transparent)]
    Load(#[from] LoadError),
}
