use ::behavior_tree_arena::{
    boxify, load, load_yaml, parse_file, BehaviorInstance, BehaviorNode, BehaviorResult,
    Knowledge, Registry, UpdateContext,
};
use std::{fs, sync::Arc};

struct PatrolNode;

impl BehaviorNode for PatrolNode {
    fn update(&self, ctx: &mut UpdateContext) -> BehaviorResult {
        let waypoint = ctx.knowledge().get::<i32>("Waypoint").copied().unwrap_or(0);
        println!("Patrolling to waypoint {waypoint}");
        ctx.knowledge_mut().set("Waypoint", (waypoint + 1) % 4);
        BehaviorResult::Success
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/patrol.bt".to_owned());

    let mut registry = Registry::default();
    registry.register("Patrol", boxify(|| PatrolNode));

    let file = fs::read_to_string(&path)?;
    let tree = if path.ends_with(".yaml") || path.ends_with(".yml") {
        let mut trees = load_yaml(&file, &registry, true)?;
        trees
            .remove("main")
            .ok_or_else(|| anyhow::anyhow!("no main tree in {path}"))?
    } else {
        let (rest, source) = parse_file(&file).map_err(|e| anyhow::anyhow!("{e:?}"))?;
        if !rest.is_empty() {
            anyhow::bail!("unparsed input in {path}: {rest:?}");
        }
        load(&source, &registry, true)?
    };
    eprintln!("loaded {path}: {tree:?}");

    let mut knowledge = Knowledge::new();
    knowledge.set("Blackboard/WaitTime", 0.3f32);
    let mut instance = BehaviorInstance::new(Arc::clone(&tree), knowledge);

    for _ in 0..50 {
        if let Some(result) = instance.advance(0.05) {
            println!("t = {:.2}: {result:?}", instance.time());
        }
    }

    Ok(())
}
