use percebe_core::descriptor::{self, MappingError, TypeIndex};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, MethodDescriptorProto,
    ServiceDescriptorProto, field_descriptor_proto,
};

fn file(name: &str, package: &str) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: Some(package.to_string()),
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn message(name: &str) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

#[test]
fn test_unresolved_method_type_is_a_hard_error() {
    let mut ghost = file("ghost.proto", "ghost");
    ghost.service = vec![ServiceDescriptorProto {
        name: Some("GhostService".to_string()),
        method: vec![MethodDescriptorProto {
            name: Some("Boo".to_string()),
            input_type: Some(".ghost.Missing".to_string()),
            output_type: Some(".ghost.Missing".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    }];

    let result = descriptor::build_catalog([&ghost]);

    match result {
        Err(MappingError::UnknownType(name)) => assert_eq!(name, ".ghost.Missing"),
        other => panic!("expected an unknown type error, got {other:?}"),
    }
}

#[test]
fn test_unresolved_field_type_is_a_hard_error() {
    let mut ghost = file("ghost.proto", "ghost");
    let mut request = message("Request");
    request.field = vec![FieldDescriptorProto {
        name: Some("payload".to_string()),
        number: Some(1),
        r#type: Some(field_descriptor_proto::Type::Message as i32),
        type_name: Some(".ghost.Missing".to_string()),
        ..Default::default()
    }];
    ghost.message_type = vec![request];
    ghost.service = vec![ServiceDescriptorProto {
        name: Some("GhostService".to_string()),
        method: vec![MethodDescriptorProto {
            name: Some("Boo".to_string()),
            input_type: Some(".ghost.Request".to_string()),
            output_type: Some(".ghost.Request".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    }];

    let result = descriptor::build_catalog([&ghost]);

    assert!(matches!(result, Err(MappingError::UnknownType(_))));
}

#[test]
fn test_fully_qualified_names_never_resolve_across_packages() {
    let mut file_a = file("a.proto", "a");
    file_a.message_type = vec![message("Status")];

    let mut index = TypeIndex::default();
    index.register_file(&file_a);

    assert!(index.contains_symbol(".a.Status"));
    assert!(index.contains_symbol("a.Status"));
    assert!(index.contains_symbol("Status"));
    // `.b.Status` is fully qualified; the same-named type in package `a`
    // must not answer for it.
    assert!(!index.contains_symbol(".b.Status"));

    match index.message_schema(".b.Status") {
        Err(MappingError::UnknownType(name)) => assert_eq!(name, ".b.Status"),
        other => panic!("expected an unknown type error, got {other:?}"),
    }
}
