//! # Structural Validator
//!
//! Walks a parsed document tree against a [`SchemaNode`] and reports
//! structural findings as data. Validation never fails: an empty diagnostic
//! list means the document conforms. Diagnostic positions are always borrowed
//! from the document tree, never invented.
//!
//! Enum values are accepted without checking them against the declared value
//! set. This looseness is deliberate: a peer may know enum values the local
//! schema does not yet have.
use crate::document::{DocKind, DocumentNode};
use crate::schema::{MessageSchema, OneOfSchema, ScalarKind, SchemaNode};
use indexmap::IndexMap;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single structural finding, anchored at a half-open source range.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub range: Range<usize>,
}

impl Diagnostic {
    fn error(range: Range<usize>, message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
            range,
        }
    }
}

/// Validates `doc` against `schema`, returning every structural finding.
///
/// Pure and re-entrant; safe to call concurrently from multiple validation
/// requests.
pub fn validate<N: DocumentNode>(schema: &SchemaNode, doc: &N) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_node(schema, doc, &mut diagnostics);
    diagnostics
}

fn check_node<N: DocumentNode>(schema: &SchemaNode, doc: &N, out: &mut Vec<Diagnostic>) {
    match schema {
        SchemaNode::Message(message) => check_message(message, doc, out),
        SchemaNode::Repeated(element) => {
            if doc.kind() != DocKind::Array {
                out.push(type_mismatch(DocKind::Array, doc));
                return;
            }
            for item in doc.elements() {
                check_node(element, item, out);
            }
        }
        SchemaNode::Optional(inner) => check_node(inner, doc, out),
        SchemaNode::OneOf(group) => out.push(Diagnostic::error(
            doc.range(),
            format!(
                "do not set oneof fields directly, choose one of {}",
                group.alternative_list()
            ),
        )),
        SchemaNode::Literal(kind) => check_literal(*kind, doc, out),
        // Accepted as-is; see module docs.
        SchemaNode::Enum(_) => {}
    }
}

/// How a document key resolves within a message's flattened field mapping.
enum Slot<'a> {
    /// A regular field with a schema to check.
    Field(&'a SchemaNode),
    /// An absent placeholder: accepted, never checked, never required.
    Placeholder,
    /// The oneof group name itself; setting it directly is an error.
    Group(&'a OneOfSchema),
    /// One alternative of a oneof group.
    Alternative {
        group: &'a str,
        node: &'a SchemaNode,
    },
}

fn check_message<N: DocumentNode>(message: &MessageSchema, doc: &N, out: &mut Vec<Diagnostic>) {
    if doc.kind() != DocKind::Object {
        out.push(type_mismatch(DocKind::Object, doc));
        return;
    }

    // Field mapping expanded with oneof alternatives flattened in.
    let mut slots: IndexMap<&str, Slot<'_>> = IndexMap::new();
    let mut pending_required: Vec<&str> = Vec::new();
    for (name, field) in &message.fields {
        match field {
            None => {
                slots.insert(name, Slot::Placeholder);
            }
            Some(SchemaNode::OneOf(group)) => {
                slots.insert(name, Slot::Group(group));
                for (alternative, node) in &group.alternatives {
                    slots.insert(alternative, Slot::Alternative { group: name, node });
                }
            }
            Some(node) => {
                slots.insert(name, Slot::Field(node));
                if node.is_required() {
                    pending_required.push(name);
                }
            }
        }
    }

    // Keys of each oneof group actually present in the document.
    let mut group_occurrences: IndexMap<&str, Vec<Range<usize>>> = IndexMap::new();

    for property in doc.properties() {
        match slots.get(property.key) {
            Some(Slot::Field(node)) => {
                pending_required.retain(|name| *name != property.key);
                check_node(node, property.value, out);
            }
            Some(Slot::Placeholder) => {}
            Some(Slot::Group(group)) => out.push(Diagnostic::error(
                property.key_range.clone(),
                format!(
                    "do not set oneof fields directly, choose one of {}",
                    group.alternative_list()
                ),
            )),
            Some(Slot::Alternative { group, node }) => {
                group_occurrences
                    .entry(group)
                    .or_default()
                    .push(property.key_range.clone());
                check_node(node, property.value, out);
            }
            None => out.push(Diagnostic::error(
                property.key_range.clone(),
                format!("unexpected field '{}'", property.key),
            )),
        }
    }

    if !pending_required.is_empty() {
        let label = if pending_required.len() == 1 {
            "missing required field"
        } else {
            "missing required fields"
        };
        out.push(Diagnostic::error(
            doc.range(),
            format!("{label}: {}", pending_required.join(", ")),
        ));
    }

    // Oneof exclusivity, in declared group order.
    for (name, field) in &message.fields {
        let Some(SchemaNode::OneOf(group)) = field else {
            continue;
        };
        let occurrences = group_occurrences
            .get(name.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();
        match occurrences.len() {
            0 => out.push(Diagnostic::error(
                doc.range(),
                format!("missing oneof, set one of {}", group.alternative_list()),
            )),
            1 => {}
            _ => {
                for range in occurrences {
                    out.push(Diagnostic::error(
                        range.clone(),
                        format!(
                            "multiple fields of oneof specified, set exactly one of {}",
                            group.alternative_list()
                        ),
                    ));
                }
            }
        }
    }
}

fn check_literal<N: DocumentNode>(kind: ScalarKind, doc: &N, out: &mut Vec<Diagnostic>) {
    let expected = if kind.is_numeric() {
        DocKind::Number
    } else if kind == ScalarKind::Bool {
        DocKind::Bool
    } else {
        DocKind::String
    };
    if doc.kind() != expected {
        out.push(type_mismatch(expected, doc));
    }
}

fn type_mismatch<N: DocumentNode>(expected: DocKind, doc: &N) -> Diagnostic {
    Diagnostic::error(
        doc.range(),
        format!(
            "expected {} but got {}",
            expected.name(),
            doc.kind().name()
        ),
    )
}
