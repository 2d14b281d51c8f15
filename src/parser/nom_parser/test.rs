use super::*;

fn literal_param<'src>(name: &'src str, value: &str) -> ParamDef<'src> {
    ParamDef {
        name,
        value: ParamSource::Literal(value.to_owned()),
    }
}

fn path_param<'src>(name: &'src str, path: &'src str) -> ParamDef<'src> {
    ParamDef {
        name,
        value: ParamSource::Path(path),
    }
}

impl<'src> TreeRootDef<'src> {
    fn new(name: &'src str, root: TreeDef<'src>) -> Self {
        Self {
            name,
            settings: TreeSettings::default(),
            root,
        }
    }
}

#[test]
fn test_trees() {
    assert_eq!(
        parse_tree(
            "tree main = Sequence {
        }"
        ),
        Ok(("", TreeRootDef::new("main", TreeDef::new("Sequence"))))
    );

    assert_eq!(
        parse_tree(
            "tree main = Sequence {
                    Patrol
        }"
        ),
        Ok((
            "",
            TreeRootDef::new(
                "main",
                TreeDef::new("Sequence").with_children(vec![TreeDef::new("Patrol")])
            )
        ))
    );
}

#[test]
fn test_nested_children() {
    assert_eq!(
        parse_tree_node(
            "Selector {
                Invert {
                    Patrol
                }
                Idle
            }"
        ),
        Ok((
            "",
            TreeDef::new("Selector").with_children(vec![
                TreeDef::new("Invert").with_children(vec![TreeDef::new("Patrol")]),
                TreeDef::new("Idle"),
            ])
        ))
    );
}

#[test]
fn test_params() {
    assert_eq!(
        parse_tree_node(r#"Delay(wait_time = 0.5, deviation = -1e-2)"#),
        Ok((
            "",
            TreeDef::new("Delay").with_params(vec![
                literal_param("wait_time", "0.5"),
                literal_param("deviation", "-1e-2"),
            ])
        ))
    );

    assert_eq!(
        parse_tree_node(r#"Loop(loop_count <- Blackboard/Loops.Count)"#),
        Ok((
            "",
            TreeDef::new("Loop").with_params(vec![path_param(
                "loop_count",
                "Blackboard/Loops.Count"
            )])
        ))
    );

    assert_eq!(
        parse_tree_node(r#"HasTag(tag = "Enemy Unit", invert = true, actor <- Target)"#),
        Ok((
            "",
            TreeDef::new("HasTag").with_params(vec![
                literal_param("tag", "Enemy Unit"),
                literal_param("invert", "true"),
                path_param("actor", "Target"),
            ])
        ))
    );
}

#[test]
fn test_multiline_params() {
    assert_eq!(
        parse_tree_node(
            "KnowledgeConditional(
                value_a <- Ammo,
                comparison = GreaterEqual,
                value_b = 3
            ) {
                Shoot
            }"
        ),
        Ok((
            "",
            TreeDef::new("KnowledgeConditional")
                .with_params(vec![
                    path_param("value_a", "Ammo"),
                    literal_param("comparison", "GreaterEqual"),
                    literal_param("value_b", "3"),
                ])
                .with_children(vec![TreeDef::new("Shoot")])
        ))
    );
}

#[test]
fn test_tree_settings() {
    assert_eq!(
        parse_tree(r#"tree main(knowledge_schema = "Soldier", update_fps = 30) = Idle"#),
        Ok((
            "",
            TreeRootDef {
                name: "main",
                settings: TreeSettings {
                    knowledge_schema: Some("Soldier".to_owned()),
                    update_fps: 30.,
                },
                root: TreeDef::new("Idle"),
            }
        ))
    );

    assert!(matches!(
        parse_tree("tree main(colour = 1) = Idle"),
        Err(nom::Err::Failure(_))
    ));
    assert!(matches!(
        parse_tree("tree main(update_fps <- Fps) = Idle"),
        Err(nom::Err::Failure(_))
    ));
}

#[test]
fn test_line_comments() {
    let source = r#"
# This is a comment at the top level.

tree main = Sequence { # This is a comment after opening brace.
           # This is a comment in a whole line.
    Idle   # This is a comment after a node.
}          # This is a comment after a closing brace.
"#;
    assert_eq!(
        parse_file(source),
        Ok((
            "",
            TreeSource {
                tree_defs: vec![TreeRootDef::new(
                    "main",
                    TreeDef::new("Sequence").with_children(vec![TreeDef::new("Idle")])
                )]
            }
        ))
    );
}

#[test]
fn test_file() {
    let source = r#"
tree main = Sequence {
    Guard
}

tree Guard = Selector {
    Delay(wait_time = 1)
}
"#;
    let (rest, file) = parse_file(source).unwrap();
    assert_eq!(rest, "");
    assert_eq!(file.tree_defs.len(), 2);
    assert_eq!(file.find("Guard").unwrap().root.ty, "Selector");
    assert!(file.find("Patrol").is_none());
}
