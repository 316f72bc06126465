use percebe_core::document::{SpannedEntry, SpannedNode, SpannedValue};
use percebe_core::loader;
use percebe_core::schema::{MessageSchema, ScalarKind, SchemaNode};
use percebe_core::validate::{Severity, validate};
use serde_json::json;
use std::path::PathBuf;

fn testdata() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn send_request_schema() -> SchemaNode {
    let catalog = loader::load_services(&testdata(), "chat.proto").expect("failed to load");
    catalog.get("chat.ChatService", "Send").unwrap().request.clone()
}

fn message(name: &str, fields: Vec<(&str, Option<SchemaNode>)>) -> SchemaNode {
    SchemaNode::Message(MessageSchema {
        name: name.to_string(),
        fields: fields
            .into_iter()
            .map(|(key, node)| (key.to_string(), node))
            .collect(),
    })
}

fn messages(diagnostics: &[percebe_core::validate::Diagnostic]) -> Vec<&str> {
    diagnostics.iter().map(|d| d.message.as_str()).collect()
}

#[test]
fn test_conforming_document_yields_no_diagnostics() {
    let schema = send_request_schema();
    let doc = json!({
        "room": "lobby",
        "attachments": [{"url": "https://x/cat.png", "size": 1024}],
        "mood": 1,
        "request3": "hello"
    });

    assert_eq!(validate(&schema, &doc), vec![]);
}

#[test]
fn test_one_missing_required_field() {
    let schema = send_request_schema();
    let doc = json!({
        "attachments": [],
        "mood": 0,
        "request3": "hello"
    });

    let diagnostics = validate(&schema, &doc);

    assert_eq!(messages(&diagnostics), vec!["missing required field: room"]);
    assert_eq!(diagnostics[0].severity, Severity::Error);
}

#[test]
fn test_missing_required_fields_report_in_declaration_order() {
    let schema = send_request_schema();
    let doc = json!({
        "attachments": [],
        "request3": "hello"
    });

    let diagnostics = validate(&schema, &doc);

    assert_eq!(
        messages(&diagnostics),
        vec!["missing required fields: room, mood"]
    );
}

#[test]
fn test_unexpected_field() {
    let schema = send_request_schema();
    let doc = json!({
        "room": "lobby",
        "attachments": [],
        "mood": 0,
        "request3": "hello",
        "bogus": true
    });

    assert_eq!(messages(&validate(&schema, &doc)), vec!["unexpected field 'bogus'"]);
}

#[test]
fn test_every_extra_oneof_occurrence_is_flagged() {
    let schema = send_request_schema();
    let doc = json!({
        "room": "lobby",
        "attachments": [],
        "mood": 0,
        "request3": "hello",
        "reply4": {"text": "hi", "code": 0}
    });

    let diagnostics = validate(&schema, &doc);

    assert_eq!(
        messages(&diagnostics),
        vec![
            "multiple fields of oneof specified, set exactly one of request3 or reply4",
            "multiple fields of oneof specified, set exactly one of request3 or reply4",
        ]
    );
}

#[test]
fn test_missing_oneof() {
    let schema = send_request_schema();
    let doc = json!({
        "room": "lobby",
        "attachments": [],
        "mood": 0
    });

    assert_eq!(
        messages(&validate(&schema, &doc)),
        vec!["missing oneof, set one of request3 or reply4"]
    );
}

#[test]
fn test_setting_the_group_name_directly_is_rejected() {
    let schema = send_request_schema();
    let doc = json!({
        "room": "lobby",
        "attachments": [],
        "mood": 0,
        "payload": {"request3": "hello"}
    });

    assert_eq!(
        messages(&validate(&schema, &doc)),
        vec![
            "do not set oneof fields directly, choose one of request3 or reply4",
            "missing oneof, set one of request3 or reply4",
        ]
    );
}

#[test]
fn test_each_mismatched_array_element_is_flagged() {
    let schema = SchemaNode::Repeated(Box::new(SchemaNode::Literal(ScalarKind::String)));
    let doc = json!([1, "ok", true]);

    assert_eq!(
        messages(&validate(&schema, &doc)),
        vec![
            "expected string but got number",
            "expected string but got boolean",
        ]
    );
}

#[test]
fn test_enum_values_are_not_checked() {
    let schema = send_request_schema();
    // 99 is not a declared Mood value; enum looseness accepts it anyway.
    let doc = json!({
        "room": "lobby",
        "attachments": [],
        "mood": 99,
        "request3": "hello"
    });

    assert_eq!(validate(&schema, &doc), vec![]);
}

#[test]
fn test_placeholder_fields_are_accepted_unchecked() {
    let catalog = loader::load_services(&testdata(), "tree.proto").expect("failed to load");
    let schema = &catalog.get("tree.TreeService", "Put").unwrap().request;

    // `parent` and `tags` are absent placeholders; any shape passes.
    let doc = json!({
        "label": "root",
        "parent": 42,
        "tags": ["not", "a", "map"]
    });

    assert_eq!(validate(schema, &doc), vec![]);
}

#[test]
fn test_non_object_document_for_a_message_schema() {
    let schema = send_request_schema();
    let doc = json!(42);

    assert_eq!(
        messages(&validate(&schema, &doc)),
        vec!["expected object but got number"]
    );
}

#[test]
fn test_empty_document_against_a_single_required_field() {
    let schema = message("Probe", vec![("name", Some(SchemaNode::Literal(ScalarKind::String)))]);
    let doc = json!({});

    assert_eq!(
        messages(&validate(&schema, &doc)),
        vec!["missing required field: name"]
    );
}

#[test]
fn test_both_alternatives_of_a_two_field_oneof() {
    let mut alternatives = indexmap::IndexMap::new();
    alternatives.insert("a".to_string(), SchemaNode::Literal(ScalarKind::Bool));
    alternatives.insert("b".to_string(), SchemaNode::Literal(ScalarKind::Int32));
    let schema = message(
        "Probe",
        vec![(
            "choice",
            Some(SchemaNode::OneOf(percebe_core::schema::OneOfSchema { alternatives })),
        )],
    );
    let doc = json!({"a": true, "b": 2});

    assert_eq!(
        messages(&validate(&schema, &doc)),
        vec![
            "multiple fields of oneof specified, set exactly one of a or b",
            "multiple fields of oneof specified, set exactly one of a or b",
        ]
    );
}

#[test]
fn test_numeric_scalars_expect_json_numbers() {
    let schema = message(
        "Probe",
        vec![
            ("code", Some(SchemaNode::Literal(ScalarKind::Int32))),
            ("ratio", Some(SchemaNode::Literal(ScalarKind::Double))),
            ("flag", Some(SchemaNode::Literal(ScalarKind::Bool))),
        ],
    );
    let doc = json!({"code": "7", "ratio": 0.5, "flag": 1});

    assert_eq!(
        messages(&validate(&schema, &doc)),
        vec![
            "expected number but got string",
            "expected boolean but got number",
        ]
    );
}

#[test]
fn test_null_is_not_a_scalar() {
    let schema = message("Probe", vec![("name", Some(SchemaNode::Literal(ScalarKind::String)))]);
    let doc = json!({"name": null});

    assert_eq!(
        messages(&validate(&schema, &doc)),
        vec!["expected string but got null"]
    );
}

// Against the document `{"name": 7, "extra": true}`, diagnostics must anchor
// at the offending value and key ranges reported by the parser.
#[test]
fn test_diagnostics_borrow_ranges_from_the_document() {
    let schema = message("Probe", vec![("name", Some(SchemaNode::Literal(ScalarKind::String)))]);
    let doc = SpannedValue {
        range: 0..26,
        node: SpannedNode::Object(vec![
            SpannedEntry {
                key: "name".to_string(),
                key_range: 1..7,
                value: SpannedValue {
                    node: SpannedNode::Number(7.0),
                    range: 9..10,
                },
            },
            SpannedEntry {
                key: "extra".to_string(),
                key_range: 12..19,
                value: SpannedValue {
                    node: SpannedNode::Bool(true),
                    range: 21..25,
                },
            },
        ]),
    };

    let diagnostics = validate(&schema, &doc);

    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].message, "expected string but got number");
    assert_eq!(diagnostics[0].range, 9..10);
    assert_eq!(diagnostics[1].message, "unexpected field 'extra'");
    assert_eq!(diagnostics[1].range, 12..19);
}
