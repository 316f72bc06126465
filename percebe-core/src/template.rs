//! # Default-Value Generator
//!
//! Synthesizes an example document for a schema node, used to pre-fill request
//! editors. [`example`] returns a serializable value plus annotations keyed by
//! `/`-joined path; [`render`] produces the same content as formatted JSON-ish
//! text with trailing `//` comments, ready to drop into an editor buffer.
//!
//! Generation is deterministic: zero-equivalents for scalars, empty arrays for
//! repeated fields, the first declared value for enums, and the first declared
//! alternative for oneof groups.
use crate::schema::{MessageSchema, ScalarKind, SchemaNode};
use serde_json::{Value, json};

/// A human-readable note attached to a generated value.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// `/`-joined field path; empty for the root node.
    pub path: String,
    /// e.g. `Mood::MOOD_UNSPECIFIED`, `optional`, `one of a or b`.
    pub note: String,
}

/// A generated example document with its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub value: Value,
    pub annotations: Vec<Annotation>,
}

/// Generates the canonical example value for `node`.
pub fn example(node: &SchemaNode) -> Example {
    let mut annotations = Vec::new();
    let mut path = Vec::new();
    let value = build_value(node, &mut path, &mut annotations);
    Example { value, annotations }
}

fn build_value(node: &SchemaNode, path: &mut Vec<String>, notes: &mut Vec<Annotation>) -> Value {
    match node {
        SchemaNode::Message(message) => {
            let mut object = serde_json::Map::new();
            for (name, field) in &message.fields {
                let Some(field) = field else { continue };

                // Oneof groups contribute only their first declared alternative.
                if let SchemaNode::OneOf(group) = field {
                    if let Some((alternative, alt_node)) = group.first() {
                        path.push(alternative.clone());
                        notes.push(Annotation {
                            path: path.join("/"),
                            note: format!("one of {}", group.alternative_list()),
                        });
                        let value = build_value(alt_node, path, notes);
                        path.pop();
                        object.insert(alternative.clone(), value);
                    }
                    continue;
                }

                path.push(name.clone());
                let value = build_value(field, path, notes);
                path.pop();
                object.insert(name.clone(), value);
            }
            Value::Object(object)
        }
        SchemaNode::Repeated(_) => json!([]),
        SchemaNode::Optional(inner) => {
            notes.push(Annotation {
                path: path.join("/"),
                note: "optional".to_string(),
            });
            build_value(inner, path, notes)
        }
        SchemaNode::Literal(kind) => literal_default(*kind),
        SchemaNode::Enum(enumeration) => match enumeration.default_value() {
            Some((name, number)) => {
                notes.push(Annotation {
                    path: path.join("/"),
                    note: format!("{}::{}", enumeration.name, name),
                });
                json!(*number)
            }
            None => json!(0),
        },
        SchemaNode::OneOf(group) => match group.first() {
            Some((_, alt_node)) => {
                notes.push(Annotation {
                    path: path.join("/"),
                    note: format!("one of {}", group.alternative_list()),
                });
                build_value(alt_node, path, notes)
            }
            None => Value::Null,
        },
    }
}

fn literal_default(kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::String => json!(""),
        ScalarKind::Bool => json!(false),
        kind if kind.is_floating() => json!(0.0),
        _ => json!(0),
    }
}

fn literal_text(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::String => "\"\"",
        ScalarKind::Bool => "false",
        ScalarKind::Double | ScalarKind::Float => "0.0",
        _ => "0",
    }
}

/// Renders the example document as formatted JSON-ish text with trailing
/// comments, e.g.:
///
/// ```text
/// {
///   "room": "",
///   "mood": 0, // Mood::MOOD_UNSPECIFIED
///   "nickname": "", // optional
///   "request3": "" // one of request3 or reply4
/// }
/// ```
pub fn render(node: &SchemaNode) -> String {
    let mut out = String::new();
    write_entry(None, node, 0, false, Vec::new(), &mut out);
    out
}

fn write_entry(
    key: Option<&str>,
    node: &SchemaNode,
    indent: usize,
    comma: bool,
    mut notes: Vec<String>,
    out: &mut String,
) {
    // Peel wrappers, collecting their notes along the way.
    let mut node = node;
    loop {
        match node {
            SchemaNode::Optional(inner) => {
                notes.push("optional".to_string());
                node = inner;
            }
            SchemaNode::OneOf(group) => {
                notes.push(format!("one of {}", group.alternative_list()));
                match group.first() {
                    Some((_, first)) => node = first,
                    None => break,
                }
            }
            _ => break,
        }
    }

    let pad = "  ".repeat(indent);
    let prefix = match key {
        Some(key) => format!("{pad}\"{key}\": "),
        None => pad.clone(),
    };

    match node {
        SchemaNode::Message(message) => {
            out.push_str(&prefix);
            out.push('{');
            push_comment(&notes, out);
            out.push('\n');
            write_fields(message, indent + 1, out);
            out.push_str(&pad);
            out.push('}');
            if comma {
                out.push(',');
            }
            out.push('\n');
        }
        SchemaNode::Enum(enumeration) => {
            let number = match enumeration.default_value() {
                Some((name, number)) => {
                    notes.push(format!("{}::{}", enumeration.name, name));
                    *number
                }
                None => 0,
            };
            write_inline(&prefix, &number.to_string(), comma, &notes, out);
        }
        SchemaNode::Repeated(_) => write_inline(&prefix, "[]", comma, &notes, out),
        SchemaNode::Literal(kind) => write_inline(&prefix, literal_text(*kind), comma, &notes, out),
        // Only reachable for a degenerate empty oneof.
        SchemaNode::Optional(_) | SchemaNode::OneOf(_) => {
            write_inline(&prefix, "null", comma, &notes, out)
        }
    }
}

fn write_fields(message: &MessageSchema, indent: usize, out: &mut String) {
    // Resolve which entries render: placeholders are skipped and oneof groups
    // contribute their first alternative under the alternative's own name.
    let mut entries: Vec<(&str, &SchemaNode, Vec<String>)> = Vec::new();
    for (name, field) in &message.fields {
        let Some(field) = field else { continue };
        if let SchemaNode::OneOf(group) = field {
            if let Some((alternative, alt_node)) = group.first() {
                entries.push((
                    alternative,
                    alt_node,
                    vec![format!("one of {}", group.alternative_list())],
                ));
            }
            continue;
        }
        entries.push((name, field, Vec::new()));
    }

    let last = entries.len().saturating_sub(1);
    for (position, (key, node, notes)) in entries.into_iter().enumerate() {
        write_entry(Some(key), node, indent, position < last, notes, out);
    }
}

fn write_inline(prefix: &str, text: &str, comma: bool, notes: &[String], out: &mut String) {
    out.push_str(prefix);
    out.push_str(text);
    if comma {
        out.push(',');
    }
    push_comment(notes, out);
    out.push('\n');
}

fn push_comment(notes: &[String], out: &mut String) {
    if !notes.is_empty() {
        out.push_str(" // ");
        out.push_str(&notes.join(", "));
    }
}
