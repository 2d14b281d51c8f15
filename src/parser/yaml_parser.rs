use super::{
    loader::load_all,
    nom_parser::{ParamDef, ParamSource, TreeDef, TreeRootDef, TreeSource},
};
use crate::{error::LoadYamlError, Registry, TreeGraph, TreeSettings};
use serde::Deserialize;
use serde_yaml::Value;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

#[derive(Deserialize)]
struct YamlFile {
    behavior_tree: Option<BTreeMap<String, YamlTree>>,
}

#[derive(Deserialize)]
struct YamlTree {
    #[serde(default)]
    settings: TreeSettings,
    root: YamlNode,
}

#[derive(Deserialize)]
struct YamlNode {
    #[serde(rename = "type")]
    ty: String,
    /// Literal parameters. Scalars of any kind are accepted.
    #[serde(default)]
    params: BTreeMap<String, Value>,
    /// Parameters bound to knowledge paths.
    #[serde(default)]
    knowledge: BTreeMap<String, String>,
    #[serde(default)]
    children: Vec<YamlNode>,
}

fn literal(node: &YamlNode, name: &str, value: &Value) -> Result<String, LoadYamlError> {
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => {
            return Err(LoadYamlError::InvalidParam {
                node: node.ty.clone(),
                param: name.to_owned(),
            })
        }
    })
}

fn tree_def(node: &YamlNode) -> Result<TreeDef, LoadYamlError> {
    let mut params = node
        .params
        .iter()
        .map(|(name, value)| {
            Ok(ParamDef {
                name,
                value: ParamSource::Literal(literal(node, name, value)?),
            })
        })
        .collect::<Result<Vec<_>, LoadYamlError>>()?;
    params.extend(node.knowledge.iter().map(|(name, path)| ParamDef {
        name,
        value: ParamSource::Path(path),
    }));

    Ok(TreeDef {
        ty: &node.ty,
        params,
        children: node
            .children
            .iter()
            .map(tree_def)
            .collect::<Result<_, _>>()?,
    })
}

/// Loads every tree in the `behavior_tree` section of a YAML document.
///
/// ```yaml
/// behavior_tree:
///   main:
///     settings:
///       update_fps: 20
///     root:
///       type: Sequence
///       children:
///         - type: Delay
///           params:
///             wait_time: 0.5
///         - type: Loop
///           knowledge:
///             loop_count: Blackboard/Loops
///           children:
///             - type: Patrol
/// ```
pub fn load_yaml(
    yaml: &str,
    reg: &Registry,
    check_params: bool,
) -> Result<HashMap<String, Arc<TreeGraph>>, LoadYamlError> {
    let file: YamlFile = serde_yaml::from_str(yaml)?;
    let trees = file.behavior_tree.ok_or(LoadYamlError::Missing)?;

    let tree_source = TreeSource {
        tree_defs: trees
            .iter()
            .map(|(name, tree)| {
                Ok(TreeRootDef {
                    name,
                    settings: tree.settings.clone(),
                    root: tree_def(&tree.root)?,
                })
            })
            .collect::<Result<_, LoadYamlError>>()?,
    };

    Ok(load_all(&tree_source, reg, check_params)?)
}
