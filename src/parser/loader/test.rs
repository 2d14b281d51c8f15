use super::*;
use crate::{
    boxify, error::ParamError, parse_file, BehaviorInstance, BehaviorResult, Knowledge,
    UpdateContext,
};

/// Counts its updates in the knowledge store.
struct CountNode;

impl BehaviorNode for CountNode {
    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        let count = ctx.knowledge().get::<i32>("Count").copied().unwrap_or(0);
        ctx.knowledge_mut().set("Count", count + 1);
        BehaviorResult::Success
    }
}

fn registry() -> Registry {
    let mut registry = Registry::default();
    registry.register("Count", boxify(|| CountNode));
    registry
}

fn load_str(source: &str, check_params: bool) -> Result<Arc<TreeGraph>, LoadError> {
    let (_, tree_source) = parse_file(source).unwrap();
    load(&tree_source, &registry(), check_params)
}

#[test]
fn test_subtree() {
    let tree = load_str(
        r#"
tree main = Sequence {
    sub
    Count
}

tree sub = Fallback {
    Count
}
    "#,
        true,
    )
    .unwrap();

    // Root, sub-tree and leaf
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.name(1), "sub");

    let mut instance = BehaviorInstance::new(tree, Knowledge::new());
    assert_eq!(instance.tick(0.1), BehaviorResult::Success);
    assert_eq!(instance.knowledge().get::<i32>("Count"), Some(&2));
}

#[test]
fn test_root_wrapping() {
    let tree = load_str(
        "tree main(knowledge_schema = \"Soldier\", update_fps = 20) = Sequence { Count }",
        true,
    )
    .unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.settings().update_fps, 20.);
    assert_eq!(tree.settings().knowledge_schema.as_deref(), Some("Soldier"));

    // Any other node gets a root above it
    let tree = load_str("tree main = Selector { Count }", true).unwrap();
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.name(1), "Selector");
    assert_eq!(tree.settings(), &crate::TreeSettings::default());
}

#[test]
fn test_load_all_shares_graphs() {
    let (_, tree_source) = parse_file(
        r#"
tree main = Sequence {
    sub
    sub
}

tree sub = Count
"#,
    )
    .unwrap();

    let trees = load_all(&tree_source, &registry(), true).unwrap();
    assert_eq!(trees.len(), 2);
    // Once in the map and once per reference from main
    assert_eq!(Arc::strong_count(&trees["sub"]), 3);

    let sub = load_tree(&tree_source, "sub", &registry(), true).unwrap();
    assert_eq!(sub.len(), 2);
}

#[test]
fn test_infinite_recursion() {
    let res = load_str(
        r#"
tree main = Sequence {
    sub
}

tree sub = Sequence {
    sub2
}

tree sub2 = Selector {
    main
}
"#,
        false,
    );
    assert!(matches!(
        res,
        Err(LoadError::InfiniteRecursion { node }) if node == "main"
    ));
}

#[test]
fn test_missing() {
    assert!(matches!(
        load_str("tree main = Sequence { Nope }", false),
        Err(LoadError::MissingNode(node)) if node == "Nope"
    ));
    assert!(matches!(
        load_str("tree other = Sequence { }", false),
        Err(LoadError::MissingTree(tree)) if tree == "main"
    ));
}

#[test]
fn test_params() {
    assert!(matches!(
        load_str("tree main = Delay(wait_time = soon)", false),
        Err(LoadError::Param {
            node,
            source: ParamError::Parse { .. },
        }) if node == "Delay"
    ));

    // Unknown names only matter when checking
    let source = "tree main = Delay(wait_time = 1, speed = 2)";
    assert!(matches!(
        load_str(source, true),
        Err(LoadError::UnknownParam { node, param }) if node == "Delay" && param == "speed"
    ));
    assert!(load_str(source, false).is_ok());

    assert!(matches!(
        load_str("tree main = HasTag(actor <- Target) { Count }", false),
        Err(LoadError::Param {
            node,
            source: ParamError::Missing { key },
        }) if node == "HasTag" && key == "tag"
    ));
}

#[test]
fn test_knowledge_param() {
    let tree = load_str("tree main = Delay(wait_time <- Blackboard/Wait)", true).unwrap();
    let mut instance = BehaviorInstance::new(tree, Knowledge::new());
    instance.knowledge_mut().set("Blackboard/Wait", 0.5f32);
    assert_eq!(instance.tick(0.25), BehaviorResult::Running);
    assert_eq!(instance.tick(0.25), BehaviorResult::Success);
}

#[test]
fn test_too_many_children() {
    assert!(matches!(
        load_str("tree main = Invert { Count Count }", false),
        Err(LoadError::AddChildError(_, node)) if node == "Invert"
    ));
}
