use proptest::prelude::*;
use serde_json::json;
use tether_protocol::{Batch, Instruction, NodeDescription, Path, ProtocolError, Report};

/// A batch the way the authority's differ emits it for a small form update
const FORM_UPDATE: &str = r#"[
    ["replace", 0, 1, 2, ["label", {"for": "email"}, "Email"]],
    ["create", 0, 1, 3, ["input", {"id": "email", "type": "email", "required": true}]],
    ["set", 0, 1, 0, "aria-busy", false],
    ["unset", 0, 1, 0, "disabled"],
    ["move", 0, 1, 4, 0],
    ["delete", 0, 1, 5],
    ["replace_url", "/signup?step=2"]
]"#;

#[test]
fn test_decode_form_update() {
    let instructions: Vec<Instruction> = Batch::parse(FORM_UPDATE)
        .unwrap()
        .instructions()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        instructions.iter().map(Instruction::kind).collect::<Vec<_>>(),
        ["replace", "create", "set", "unset", "move", "delete", "replace_url"]
    );

    assert_eq!(
        instructions[1],
        Instruction::Create {
            parent: Path::new(vec![0, 1]),
            index: 3,
            node: NodeDescription::element("input")
                .with_attr("id", "email")
                .with_attr("type", "email")
                .with_attr("required", "true"),
        }
    );
    assert_eq!(
        instructions[2],
        Instruction::Set {
            target: Path::new(vec![0, 1, 0]),
            key: "aria-busy".to_string(),
            value: "false".to_string(),
        }
    );
    assert_eq!(
        instructions[4],
        Instruction::Move {
            parent: Path::new(vec![0, 1]),
            from: 4,
            to: 0,
        }
    );
}

#[test]
fn test_failure_position_is_observable() {
    let batch = Batch::parse(r#"[["delete",0],["delete",0,"x"],["delete",1]]"#).unwrap();
    let results: Vec<_> = batch.instructions().collect();

    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(ProtocolError::InvalidIndex { instruction: "delete", .. })
    ));
}

#[test]
fn test_report_matches_authority_parser() {
    // The authority splits a record into kind, path indices and details
    let mut details = serde_json::Map::new();
    details.insert("value".to_string(), json!("a@b.c"));
    let message = Report::Event {
        kind: "change".to_string(),
        path: Path::new(vec![0, 1, 3]),
        details,
    }
    .to_message()
    .unwrap();

    let record: Vec<serde_json::Value> = serde_json::from_str(&message).unwrap();
    let (kind, rest) = record.split_first().unwrap();
    let (details, path) = rest.split_last().unwrap();

    assert_eq!(kind, "change");
    assert_eq!(path, [json!(0), json!(1), json!(3)]);
    assert_eq!(details, &json!({"value": "a@b.c"}));
}

fn path_strategy() -> impl Strategy<Value = Path> {
    prop::collection::vec(0usize..64, 0..6).prop_map(Path::new)
}

fn node_strategy() -> impl Strategy<Value = NodeDescription> {
    let leaf = "[ -~]{0,8}".prop_map(NodeDescription::text);
    leaf.prop_recursive(3, 12, 3, |inner| {
        (
            "[a-z][a-z0-9]{0,5}",
            prop::collection::btree_map("[a-z][a-z-]{0,6}", "[ -~]{0,6}", 0..3),
            prop::collection::vec(inner, 0..3),
        )
            .prop_map(|(tag, attributes, children)| NodeDescription::Element {
                tag,
                attributes,
                children,
            })
    })
}

fn instruction_strategy() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        (path_strategy(), 0usize..64, node_strategy())
            .prop_map(|(parent, index, node)| Instruction::Create { parent, index, node }),
        (path_strategy(), 0usize..64).prop_map(|(parent, index)| Instruction::Delete { parent, index }),
        (path_strategy(), 0usize..64, 0usize..64)
            .prop_map(|(parent, from, to)| Instruction::Move { parent, from, to }),
        (path_strategy(), "[a-z-]{1,8}", "[ -~]{0,8}")
            .prop_map(|(target, key, value)| Instruction::Set { target, key, value }),
        "/[a-z/?=&]{0,12}".prop_map(|url| Instruction::PushUrl { url }),
    ]
}

proptest! {
    /// The payload is popped from the end, so any path length decodes back
    #[test]
    fn test_encoded_batches_decode_in_order(
        instructions in prop::collection::vec(instruction_strategy(), 0..8)
    ) {
        let message = Batch::encode(&instructions).unwrap();
        let decoded: Vec<Instruction> = Batch::parse(&message)
            .unwrap()
            .instructions()
            .collect::<Result<_, _>>()
            .unwrap();
        prop_assert_eq!(decoded, instructions);
    }
}
