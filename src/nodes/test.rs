use super::*;
use crate::{
    testing::{compound, instance, Event::*, Log},
    BehaviorInstance, BehaviorNodeContainer,
    BehaviorResult::{Fail, Running, Success},
    Knowledge, TimeLimitNode,
};

#[test]
fn test_sequence() {
    let log = Log::default();
    let mut tree = instance(compound(
        SequenceNode,
        vec![
            log.leaf("a", &[Success]),
            log.leaf("b", &[Fail]),
            log.leaf("c", &[Success]),
        ],
    ));

    assert_eq!(tree.tick(0.1), Fail);
    assert_eq!(
        log.events(),
        vec![
            Init("a"),
            Update("a"),
            Release("a"),
            Init("b"),
            Update("b"),
            Release("b")
        ]
    );
    assert_eq!(tree.relevant_count(), 0);

    log.clear();
    let mut tree = instance(compound(
        SequenceNode,
        vec![log.leaf("a", &[Success]), log.leaf("b", &[Success])],
    ));
    assert_eq!(tree.tick(0.1), Success);
    assert_eq!(log.count(Update("b")), 1);
}

#[test]
fn test_selector() {
    let log = Log::default();
    let mut tree = instance(compound(
        SelectorNode,
        vec![
            log.leaf("a", &[Fail]),
            log.leaf("b", &[Success]),
            log.leaf("c", &[Success]),
        ],
    ));

    assert_eq!(tree.tick(0.1), Success);
    assert_eq!(log.count(Update("a")), 1);
    assert_eq!(log.count(Update("b")), 1);

    // c was never relevant, so it was never initialized nor released
    assert!(!log.events().iter().any(|event| matches!(
        event,
        Init("c") | Update("c") | Release("c")
    )));

    log.clear();
    let mut tree = instance(compound(
        SelectorNode,
        vec![log.leaf("a", &[Fail]), log.leaf("b", &[Fail])],
    ));
    assert_eq!(tree.tick(0.1), Fail);
    assert_eq!(log.count(Release("a")), 1);
    assert_eq!(log.count(Release("b")), 1);
}

#[test]
fn test_empty_compounds() {
    assert_eq!(instance(compound(SequenceNode, vec![])).tick(0.1), Success);
    assert_eq!(instance(compound(SelectorNode, vec![])).tick(0.1), Fail);
    assert_eq!(instance(compound(RootNode::default(), vec![])).tick(0.1), Success);
}

#[test]
fn test_sequence_resumes_running_child() {
    let log = Log::default();
    let mut tree = instance(compound(
        SequenceNode,
        vec![
            log.leaf("a", &[Success]),
            log.leaf("b", &[Running, Running, Success]),
            log.leaf("c", &[Success]),
        ],
    ));

    assert_eq!(tree.tick(0.1), Running);
    assert_eq!(tree.tick(0.1), Running);
    assert_eq!(log.count(Update("c")), 0);
    assert_eq!(tree.tick(0.1), Success);

    // a is not ticked again while b is running
    assert_eq!(log.count(Update("a")), 1);
    assert_eq!(log.count(Init("b")), 1);
    assert_eq!(log.count(Update("b")), 3);
    assert_eq!(log.count(Release("b")), 1);
    assert_eq!(log.count(Update("c")), 1);
    assert_eq!(tree.relevant_count(), 0);

    // A fresh episode starts at the first child again
    assert_eq!(tree.tick(0.1), Success);
    assert_eq!(log.count(Update("a")), 2);
}

#[test]
fn test_skipped_child() {
    let log = Log::default();
    let gated = BehaviorNodeContainer::new_node(log.node("a", &[Success]).gated("Gate"));
    let mut tree = instance(compound(
        SequenceNode,
        vec![gated, log.leaf("b", &[Running, Success])],
    ));
    tree.knowledge_mut().set("Gate", false);

    assert_eq!(tree.tick(0.1), Running);
    assert_eq!(log.events(), vec![Init("a"), Init("b"), Update("b")]);
    // The skipped child keeps its state until the sequence finishes
    assert!(tree.is_relevant(1));

    assert_eq!(tree.tick(0.1), Success);
    assert_eq!(
        log.events()[3..],
        [Update("b"), Release("b"), Release("a")]
    );
    assert_eq!(tree.relevant_count(), 0);
}

#[test]
fn test_delay() {
    let mut tree = instance(BehaviorNodeContainer::new_node(DelayNode::new(0.5)));
    assert_eq!(tree.tick(0.125), Running);
    assert_eq!(tree.tick(0.125), Running);
    assert_eq!(tree.tick(0.125), Running);
    assert_eq!(tree.tick(0.125), Success);

    // Restarts after finishing
    assert_eq!(tree.tick(0.25), Running);
    assert_eq!(tree.tick(0.5), Success);
}

#[test]
fn test_delay_from_knowledge() {
    let mut tree = instance(BehaviorNodeContainer::new_node(DelayNode::new(
        KnowledgeSelector::path("Blackboard/Wait"),
    )));
    // Unresolved
    assert_eq!(tree.tick(0.1), Fail);

    tree.knowledge_mut().set("Blackboard/Wait", 0.25f32);
    assert_eq!(tree.tick(0.125), Running);
    // Resolved only when the delay starts
    tree.knowledge_mut().set("Blackboard/Wait", 10f32);
    assert_eq!(tree.tick(0.125), Success);
}

#[test]
fn test_delay_deviation() {
    let mut tree = instance(BehaviorNodeContainer::new_node(
        DelayNode::new(1.).with_deviation(0.5),
    ));
    let ticks = (1..=8).find(|_| tree.tick(0.25) == Success).unwrap();
    assert!((2..=6).contains(&ticks), "ticks: {ticks}");
}

#[test]
fn test_force_finish() {
    assert_eq!(
        instance(BehaviorNodeContainer::new_node(ForceFinishNode::new(Fail))).tick(0.1),
        Fail
    );
    assert_eq!(
        instance(BehaviorNodeContainer::new_node(ForceFinishNode::new(Success))).tick(0.1),
        Success
    );
}

fn sub_tree(child: BehaviorNodeContainer, settings: TreeSettings) -> Arc<TreeGraph> {
    let mut root = BehaviorNodeContainer::new_node(RootNode::new(settings));
    root.add_child(child).unwrap();
    Arc::new(TreeGraph::new(root))
}

#[test]
fn test_sub_tree_result() {
    let log = Log::default();
    let nested = sub_tree(log.leaf("x", &[Running, Success]), TreeSettings::default());
    let mut tree = instance(compound(
        RootNode::default(),
        vec![BehaviorNodeContainer::new_node(SubTreeNode::new(nested))],
    ));

    assert_eq!(tree.tick(0.1), Running);
    assert!(tree.is_relevant(1));
    assert_eq!(tree.tick(0.1), Success);
    assert_eq!(
        log.events(),
        vec![Init("x"), Update("x"), Update("x"), Release("x")]
    );
    assert_eq!(tree.relevant_count(), 0);
}

#[test]
fn test_nested_sub_trees_are_released() {
    let log = Log::default();
    let innermost = sub_tree(log.leaf("deep", &[Running]), TreeSettings::default());
    let middle = sub_tree(
        BehaviorNodeContainer::new_node(SubTreeNode::new(innermost)),
        TreeSettings::default(),
    );
    let mut time_limit = BehaviorNodeContainer::new_node(TimeLimitNode::new(0.5));
    time_limit
        .add_child(BehaviorNodeContainer::new_node(SubTreeNode::new(middle)))
        .unwrap();
    let mut tree = instance(compound(RootNode::default(), vec![time_limit]));

    assert_eq!(tree.tick(0.25), Running);
    assert_eq!(log.events(), vec![Init("deep"), Update("deep")]);

    // The time limit preempts the whole nested chain
    assert_eq!(tree.tick(0.25), Fail);
    assert_eq!(log.count(Release("deep")), 1);
    assert_eq!(tree.relevant_count(), 0);

    // Dropping an instance in the middle of a sub-tree releases it too
    log.clear();
    assert_eq!(tree.tick(0.25), Running);
    drop(tree);
    assert_eq!(log.events(), vec![Init("deep"), Update("deep"), Release("deep")]);
}

#[test]
fn test_sub_tree_schema() {
    let log = Log::default();
    let nested = sub_tree(
        log.leaf("x", &[Success]),
        TreeSettings {
            knowledge_schema: Some("Soldier".to_owned()),
            ..TreeSettings::default()
        },
    );
    let graph = Arc::new(TreeGraph::new(compound(
        RootNode::default(),
        vec![BehaviorNodeContainer::new_node(SubTreeNode::new(nested))],
    )));

    let mut tree = BehaviorInstance::new(graph.clone(), Knowledge::new());
    assert_eq!(tree.tick(0.1), Fail);
    assert!(log.events().is_empty());

    let mut tree = BehaviorInstance::new(graph.clone(), Knowledge::with_schema("Medic"));
    assert_eq!(tree.tick(0.1), Fail);
    assert!(log.events().is_empty());

    let mut tree = BehaviorInstance::new(graph, Knowledge::with_schema("Soldier"));
    assert_eq!(tree.tick(0.1), Success);
    assert_eq!(log.count(Update("x")), 1);
}

#[test]
fn test_cooldown_inside_sub_tree() {
    let log = Log::default();
    let nested = sub_tree(
        compound(crate::CooldownNode::new(2.), vec![log.leaf("a", &[Success])]),
        TreeSettings::default(),
    );
    let mut tree = instance(compound(
        RootNode::default(),
        vec![BehaviorNodeContainer::new_node(SubTreeNode::new(nested))],
    ));

    assert_eq!(tree.tick(0.5), Success);
    assert_eq!(log.count(Update("a")), 1);
    // The sub-tree finished and released its nested frame
    assert_eq!(tree.relevant_count(), 0);

    // Every later run of the sub-tree still sees the cooldown
    for _ in 0..3 {
        assert_eq!(tree.tick(0.5), Success);
    }
    assert_eq!(log.count(Update("a")), 1);
    assert_eq!(log.count(Init("a")), 1);

    // Two seconds after the first run
    assert_eq!(tree.tick(0.5), Success);
    assert_eq!(log.count(Update("a")), 2);
    assert_eq!(log.count(Release("a")), 2);
}
