use percebe_core::loader::{self, ProtoLoadError};
use percebe_core::schema::{MessageSchema, ScalarKind, SchemaNode};
use std::path::PathBuf;

fn testdata() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn as_message(node: &SchemaNode) -> &MessageSchema {
    match node {
        SchemaNode::Message(message) => message,
        other => panic!("expected a message schema, got {other:?}"),
    }
}

#[test]
fn test_loads_every_method_of_the_declared_service() {
    let catalog = loader::load_services(&testdata(), "chat.proto").expect("failed to load");

    assert_eq!(catalog.services(), vec!["chat.ChatService"]);
    assert_eq!(catalog.len(), 4);

    let unary = catalog.get("chat.ChatService", "Send").unwrap();
    assert!(!unary.client_streaming && !unary.server_streaming);

    let server_streaming = catalog.get("chat.ChatService", "Subscribe").unwrap();
    assert!(!server_streaming.client_streaming && server_streaming.server_streaming);

    let client_streaming = catalog.get("chat.ChatService", "Upload").unwrap();
    assert!(client_streaming.client_streaming && !client_streaming.server_streaming);

    let bidirectional = catalog.get("chat.ChatService", "Relay").unwrap();
    assert!(bidirectional.client_streaming && bidirectional.server_streaming);
}

#[test]
fn test_request_schema_shape() {
    let catalog = loader::load_services(&testdata(), "chat.proto").expect("failed to load");
    let request = as_message(&catalog.get("chat.ChatService", "Send").unwrap().request);

    assert_eq!(request.name, "SendRequest");

    // Oneof groups merge into the field mapping last.
    let field_names: Vec<&str> = request.fields.keys().map(String::as_str).collect();
    assert_eq!(
        field_names,
        vec!["room", "nickname", "attachments", "mood", "payload"]
    );

    assert_eq!(
        request.fields["room"],
        Some(SchemaNode::Literal(ScalarKind::String))
    );

    match request.fields["attachments"].as_ref().unwrap() {
        SchemaNode::Repeated(element) => {
            let attachment = as_message(element);
            assert_eq!(attachment.name, "Attachment");
            assert_eq!(
                attachment.fields["size"],
                Some(SchemaNode::Literal(ScalarKind::Uint64))
            );
        }
        other => panic!("expected repeated attachments, got {other:?}"),
    }

    match request.fields["mood"].as_ref().unwrap() {
        SchemaNode::Enum(mood) => {
            assert_eq!(mood.name, "Mood");
            assert_eq!(
                mood.values,
                vec![
                    ("MOOD_UNSPECIFIED".to_string(), 0),
                    ("HAPPY".to_string(), 1),
                    ("GRUMPY".to_string(), 2),
                ]
            );
        }
        other => panic!("expected an enum, got {other:?}"),
    }
}

#[test]
fn test_proto3_optional_collapses_to_optional_not_oneof() {
    let catalog = loader::load_services(&testdata(), "chat.proto").expect("failed to load");
    let request = as_message(&catalog.get("chat.ChatService", "Send").unwrap().request);

    assert_eq!(
        request.fields["nickname"],
        Some(SchemaNode::Optional(Box::new(SchemaNode::Literal(
            ScalarKind::String
        ))))
    );
}

#[test]
fn test_two_field_oneof_group_is_preserved() {
    let catalog = loader::load_services(&testdata(), "chat.proto").expect("failed to load");
    let request = as_message(&catalog.get("chat.ChatService", "Send").unwrap().request);

    match request.fields["payload"].as_ref().unwrap() {
        SchemaNode::OneOf(group) => {
            let alternatives: Vec<&str> =
                group.alternatives.keys().map(String::as_str).collect();
            assert_eq!(alternatives, vec!["request3", "reply4"]);
            assert_eq!(
                group.alternatives["request3"],
                SchemaNode::Literal(ScalarKind::String)
            );
            // Imported cross-file message types resolve eagerly.
            let reply = as_message(&group.alternatives["reply4"]);
            assert_eq!(reply.name, "Reply");
            assert_eq!(
                reply.fields["code"],
                Some(SchemaNode::Literal(ScalarKind::Int32))
            );
        }
        other => panic!("expected a oneof, got {other:?}"),
    }
}

#[test]
fn test_recursive_and_map_fields_become_absent_placeholders() {
    let catalog = loader::load_services(&testdata(), "tree.proto").expect("failed to load");
    let request = as_message(&catalog.get("tree.TreeService", "Put").unwrap().request);

    assert_eq!(
        request.fields["label"],
        Some(SchemaNode::Literal(ScalarKind::String))
    );
    assert_eq!(request.fields["parent"], None);
    assert_eq!(request.fields["tags"], None);
}

#[test]
fn test_loading_is_idempotent() {
    let first = loader::load_services(&testdata(), "chat.proto").expect("failed to load");
    let second = loader::load_services(&testdata(), "chat.proto").expect("failed to load");

    assert_eq!(first, second);
}

#[test]
fn test_malformed_proto_yields_a_single_failure() {
    let result = loader::load_services(&testdata(), "broken.proto");

    assert!(matches!(result, Err(ProtoLoadError::Compile(_))));
}

#[test]
fn test_missing_proto_yields_a_single_failure() {
    let result = loader::load_services(&testdata(), "no_such_file.proto");

    assert!(matches!(result, Err(ProtoLoadError::Compile(_))));
}
