use ::behavior_tree_arena::{
    BehaviorInstance, BehaviorNode, BehaviorNodeContainer, BehaviorResult, CooldownNode,
    DelayNode, Knowledge, KnowledgeConditionalNode, KnowledgeSelectorAny, Lazy, RootNode,
    SelectorNode, SequenceNode, Symbol, TreeGraph, UpdateContext, ValueComparison,
};
use std::sync::Arc;

static AMMO_SYM: Lazy<Symbol> = Lazy::new(|| "ammo".into());
static NAME_SYM: Lazy<Symbol> = Lazy::new(|| "name".into());

struct ShootNode;

impl BehaviorNode for ShootNode {
    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        let Some(ammo) = ctx.knowledge().get::<i32>(*AMMO_SYM).copied() else {
            return BehaviorResult::Fail;
        };
        let name = ctx
            .knowledge()
            .get::<String>(*NAME_SYM)
            .cloned()
            .unwrap_or_default();
        println!("{name}: bang! {} rounds left", ammo - 1);
        ctx.knowledge_mut().set(*AMMO_SYM, ammo - 1);
        BehaviorResult::Success
    }
}

struct ReloadNode;

impl BehaviorNode for ReloadNode {
    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        let name = ctx
            .knowledge()
            .get::<String>(*NAME_SYM)
            .cloned()
            .unwrap_or_default();
        println!("{name}: reloaded");
        ctx.knowledge_mut().set(*AMMO_SYM, 3i32);
        BehaviorResult::Success
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Shoot while there is ammo, at most once per second; otherwise reload
    // after a short pause.
    let mut shoot = BehaviorNodeContainer::new_node(KnowledgeConditionalNode::new(
        KnowledgeSelectorAny::path(*AMMO_SYM),
        ValueComparison::Greater,
        0.,
    ));
    let mut cooldown = BehaviorNodeContainer::new_node(CooldownNode::new(1.));
    cooldown
        .add_child(BehaviorNodeContainer::new_node(ShootNode))
        .unwrap();
    shoot.add_child(cooldown).unwrap();

    let mut reload = BehaviorNodeContainer::new_node(SequenceNode);
    reload
        .add_child(BehaviorNodeContainer::new_node(
            DelayNode::new(0.5).with_deviation(0.2),
        ))
        .unwrap();
    reload
        .add_child(BehaviorNodeContainer::new_node(ReloadNode))
        .unwrap();

    let mut selector = BehaviorNodeContainer::new_node(SelectorNode);
    selector.add_child(shoot).unwrap();
    selector.add_child(reload).unwrap();

    let mut root = BehaviorNodeContainer::new_node(RootNode::default());
    root.add_child(selector).unwrap();

    let tree = Arc::new(TreeGraph::new(root));
    println!("{tree:?}");

    let mut soldiers: Vec<_> = ["alpha", "bravo"]
        .into_iter()
        .map(|name| {
            let mut knowledge = Knowledge::new();
            knowledge.set(*NAME_SYM, name.to_string());
            knowledge.set(*AMMO_SYM, 2i32);
            BehaviorInstance::new(tree.clone(), knowledge)
        })
        .collect();

    for step in 0..40 {
        for soldier in &mut soldiers {
            if let Some(result) = soldier.advance(0.1) {
                if result != BehaviorResult::Running {
                    println!("t = {:.1}: {result:?}", step as f32 * 0.1);
                }
            }
        }
    }

    println!("Total symbols: {}", Symbol::count());
}
