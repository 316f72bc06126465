//! # Descriptor Mapping
//!
//! Turns raw `FileDescriptorProto`s into [`SchemaNode`] graphs. This is the
//! single mapping pass shared by the static loader and the reflection client,
//! which is what guarantees the two converge on identical shapes for
//! equivalent schemas.
//!
//! The [`TypeIndex`] keeps two append-only lookup tables (messages and enums),
//! keyed by both the local type name and the fully-qualified
//! `.package.Name` built by a depth-first walk of each file's namespace tree.
use crate::catalog::{MethodSchema, ServiceCatalog};
use crate::schema::{EnumSchema, MessageSchema, OneOfSchema, ScalarKind, SchemaNode};
use indexmap::IndexMap;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto};
use std::collections::{BTreeMap, HashMap};

/// Errors raised while mapping descriptors to schema nodes.
///
/// These indicate an inconsistent descriptor set (or a server handing one
/// out); they are fatal to the current load and never produce a partial
/// catalog.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("unknown type '{0}' referenced by the schema")]
    UnknownType(String),

    #[error("proto2 groups are not supported (field '{0}')")]
    UnsupportedGroup(String),
}

#[derive(Debug, Clone)]
struct MessageEntry {
    descriptor: DescriptorProto,
    /// Fully-qualified name with leading dot, e.g. `.chat.SendRequest`.
    fq_name: String,
    /// proto2 files wrap `optional`-labeled fields; proto3 files only wrap
    /// fields carrying the `proto3_optional` flag.
    proto2: bool,
}

/// Append-only lookup tables for message and enum descriptors.
#[derive(Debug, Default)]
pub struct TypeIndex {
    messages: HashMap<String, MessageEntry>,
    enums: HashMap<String, EnumDescriptorProto>,
}

impl TypeIndex {
    /// Registers every message and enum declared in `file`, walking nested
    /// namespaces depth-first and building fully-qualified names by joining
    /// parent namespaces with `.`.
    pub fn register_file(&mut self, file: &FileDescriptorProto) {
        let proto2 = file.syntax.as_deref() != Some("proto3");
        let prefix = if file.package().is_empty() {
            String::new()
        } else {
            format!(".{}", file.package())
        };

        for message in &file.message_type {
            self.register_message(&prefix, message, proto2);
        }
        for enumeration in &file.enum_type {
            self.register_enum(&prefix, enumeration);
        }
    }

    fn register_message(&mut self, prefix: &str, message: &DescriptorProto, proto2: bool) {
        let fq_name = format!("{prefix}.{}", message.name());
        let entry = MessageEntry {
            descriptor: message.clone(),
            fq_name: fq_name.clone(),
            proto2,
        };

        // First registration wins; the tables are append-only.
        for key in [message.name().to_string(), fq_name.clone()] {
            self.messages.entry(key).or_insert_with(|| entry.clone());
        }

        for nested in &message.nested_type {
            self.register_message(&fq_name, nested, proto2);
        }
        for enumeration in &message.enum_type {
            self.register_enum(&fq_name, enumeration);
        }
    }

    fn register_enum(&mut self, prefix: &str, enumeration: &EnumDescriptorProto) {
        let fq_name = format!("{prefix}.{}", enumeration.name());
        for key in [enumeration.name().to_string(), fq_name] {
            self.enums.entry(key).or_insert_with(|| enumeration.clone());
        }
    }

    /// Whether `name` resolves to a known message or enum.
    pub fn contains_symbol(&self, name: &str) -> bool {
        self.lookup_message(name).is_some() || self.lookup_enum(name).is_some()
    }

    fn lookup_message(&self, name: &str) -> Option<&MessageEntry> {
        lookup(&self.messages, name)
    }

    fn lookup_enum(&self, name: &str) -> Option<&EnumDescriptorProto> {
        lookup(&self.enums, name)
    }

    /// Resolves `type_name` to a fully-built [`SchemaNode::Message`].
    pub fn message_schema(&self, type_name: &str) -> Result<SchemaNode, MappingError> {
        let mut stack = Vec::new();
        self.resolve_message(type_name, &mut stack)
    }

    fn resolve_message(
        &self,
        type_name: &str,
        stack: &mut Vec<String>,
    ) -> Result<SchemaNode, MappingError> {
        let entry = self
            .lookup_message(type_name)
            .ok_or_else(|| MappingError::UnknownType(type_name.to_string()))?;
        stack.push(entry.fq_name.clone());
        let schema = self.build_message(entry, stack);
        stack.pop();
        schema
    }

    fn build_message(
        &self,
        entry: &MessageEntry,
        stack: &mut Vec<String>,
    ) -> Result<SchemaNode, MappingError> {
        let message = &entry.descriptor;
        let mut fields: IndexMap<String, Option<SchemaNode>> = IndexMap::new();
        let mut groups: BTreeMap<i32, IndexMap<String, Option<SchemaNode>>> = BTreeMap::new();

        for field in &message.field {
            let name = field.name().to_string();

            // Fields referencing a real oneof group are bucketed by group
            // index and merged after the plain fields. Synthetic one-field
            // oneofs from proto3 `optional` skip the bucketing entirely.
            if let Some(index) = field.oneof_index
                && !field.proto3_optional()
            {
                let node = self.field_node(field, stack)?;
                groups.entry(index).or_default().insert(name, node);
                continue;
            }

            let node = self
                .field_node(field, stack)?
                .map(|node| wrap_label(field, entry.proto2, node));
            fields.insert(name, node);
        }

        // Oneof groups are merged into the field mapping last. Singleton
        // groups degenerate into a plain Optional around their only member.
        for (index, members) in groups {
            let mut resolved: IndexMap<String, SchemaNode> = IndexMap::new();
            for (name, node) in members {
                match node {
                    Some(node) => {
                        resolved.insert(name, node);
                    }
                    // A placeholder inside a group cannot participate in
                    // exclusivity checks; surface it as a plain loose field.
                    None => {
                        fields.insert(name, None);
                    }
                }
            }

            if resolved.len() == 1 {
                if let Some((name, node)) = resolved.into_iter().next() {
                    fields.insert(name, Some(SchemaNode::Optional(Box::new(node))));
                }
            } else if resolved.len() >= 2 {
                let group_name = message
                    .oneof_decl
                    .get(index as usize)
                    .map(|decl| decl.name().to_string())
                    .unwrap_or_else(|| format!("oneof_{index}"));
                fields.insert(
                    group_name,
                    Some(SchemaNode::OneOf(OneOfSchema {
                        alternatives: resolved,
                    })),
                );
            }
        }

        Ok(SchemaNode::Message(MessageSchema {
            name: message.name().to_string(),
            fields,
        }))
    }

    /// Maps a single field to its unwrapped schema node. `Ok(None)` is the
    /// absent placeholder (map fields, recursive references).
    fn field_node(
        &self,
        field: &FieldDescriptorProto,
        stack: &mut Vec<String>,
    ) -> Result<Option<SchemaNode>, MappingError> {
        let kind = match field.r#type() {
            Type::Message => {
                let type_name = field.type_name();
                let entry = self
                    .lookup_message(type_name)
                    .ok_or_else(|| MappingError::UnknownType(type_name.to_string()))?;
                let is_map_entry = entry
                    .descriptor
                    .options
                    .as_ref()
                    .is_some_and(|options| options.map_entry());
                if is_map_entry || stack.contains(&entry.fq_name) {
                    return Ok(None);
                }
                return self.resolve_message(type_name, stack).map(Some);
            }
            Type::Enum => {
                let type_name = field.type_name();
                let enumeration = self
                    .lookup_enum(type_name)
                    .ok_or_else(|| MappingError::UnknownType(type_name.to_string()))?;
                return Ok(Some(SchemaNode::Enum(EnumSchema {
                    name: enumeration.name().to_string(),
                    values: enumeration
                        .value
                        .iter()
                        .map(|value| (value.name().to_string(), value.number()))
                        .collect(),
                })));
            }
            Type::Group => {
                return Err(MappingError::UnsupportedGroup(field.name().to_string()));
            }
            Type::String | Type::Bytes => ScalarKind::String,
            Type::Bool => ScalarKind::Bool,
            Type::Int32 => ScalarKind::Int32,
            Type::Int64 => ScalarKind::Int64,
            Type::Uint32 => ScalarKind::Uint32,
            Type::Uint64 => ScalarKind::Uint64,
            Type::Sint32 => ScalarKind::Sint32,
            Type::Sint64 => ScalarKind::Sint64,
            Type::Fixed32 => ScalarKind::Fixed32,
            Type::Fixed64 => ScalarKind::Fixed64,
            Type::Sfixed32 => ScalarKind::Sfixed32,
            Type::Sfixed64 => ScalarKind::Sfixed64,
            Type::Double => ScalarKind::Double,
            Type::Float => ScalarKind::Float,
        };
        Ok(Some(SchemaNode::Literal(kind)))
    }
}

/// Wraps a resolved field node according to its label:
/// `repeated` fields wrap in [`SchemaNode::Repeated`], explicitly-optional
/// fields (proto3 `optional`, or any `optional` label in a proto2 file) wrap
/// in [`SchemaNode::Optional`].
fn wrap_label(field: &FieldDescriptorProto, proto2: bool, node: SchemaNode) -> SchemaNode {
    if field.label() == Label::Repeated {
        return SchemaNode::Repeated(Box::new(node));
    }
    if field.proto3_optional() || (proto2 && field.label() == Label::Optional) {
        return SchemaNode::Optional(Box::new(node));
    }
    node
}

/// Builds a [`ServiceCatalog`] from a set of file descriptors: registers every
/// file into a fresh [`TypeIndex`], then enumerates services in declaration
/// order, resolving each method's request and response types.
pub fn build_catalog<'a>(
    files: impl IntoIterator<Item = &'a FileDescriptorProto> + Clone,
) -> Result<ServiceCatalog, MappingError> {
    let mut index = TypeIndex::default();
    for file in files.clone() {
        index.register_file(file);
    }

    let mut catalog = ServiceCatalog::default();
    for file in files {
        for service in &file.service {
            let service_name = if file.package().is_empty() {
                service.name().to_string()
            } else {
                format!("{}.{}", file.package(), service.name())
            };

            for method in &service.method {
                catalog.insert(MethodSchema {
                    service: service_name.clone(),
                    method: method.name().to_string(),
                    client_streaming: method.client_streaming(),
                    server_streaming: method.server_streaming(),
                    request: index.message_schema(method.input_type())?,
                    response: index.message_schema(method.output_type())?,
                });
            }
        }
    }

    Ok(catalog)
}

/// Exact key first. Relative names additionally try the `.`-prefixed
/// fully-qualified form, then the trailing local segment. A name carrying a
/// leading dot is already fully qualified: it either resolves exactly or is
/// unknown, so a same-named type from another package never answers for it.
fn lookup<'a, T>(table: &'a HashMap<String, T>, name: &str) -> Option<&'a T> {
    if let Some(found) = table.get(name) {
        return Some(found);
    }
    if name.starts_with('.') {
        return None;
    }
    let dotted = format!(".{name}");
    if let Some(found) = table.get(dotted.as_str()) {
        return Some(found);
    }
    name.rsplit('.').next().and_then(|local| table.get(local))
}
