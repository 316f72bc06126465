//! # Schema Model
//!
//! A language-agnostic representation of a protobuf message shape, shared by the
//! static loader and the reflection client. Both loaders must produce identical
//! [`SchemaNode`] graphs for equivalent schemas, so the validator and the
//! template generator never need to know where a schema came from.
use indexmap::IndexMap;

/// The scalar protobuf field kinds carried by [`SchemaNode::Literal`].
///
/// `bytes` fields are represented by [`ScalarKind::String`] since their JSON
/// representation is a base64 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Double,
    Float,
}

impl ScalarKind {
    /// Whether the JSON representation of this kind is a number.
    pub fn is_numeric(self) -> bool {
        !matches!(self, ScalarKind::String | ScalarKind::Bool)
    }

    /// Whether zero renders as `0.0` rather than `0`.
    pub fn is_floating(self) -> bool {
        matches!(self, ScalarKind::Double | ScalarKind::Float)
    }
}

/// A fully-resolved schema shape. Immutable once constructed.
///
/// Every node reachable from a [`SchemaNode::Message`]'s fields is itself fully
/// resolved; loaders never hand out graphs with dangling type references.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// A message with a closed, ordered field set.
    Message(MessageSchema),
    /// A repeated field, wrapping its element type.
    Repeated(Box<SchemaNode>),
    /// A group of mutually-exclusive alternatives. Always holds at least two;
    /// singleton groups collapse to [`SchemaNode::Optional`] at load time.
    OneOf(OneOfSchema),
    /// An explicitly-optional field, wrapping its inner type.
    Optional(Box<SchemaNode>),
    /// A scalar field.
    Literal(ScalarKind),
    /// An enum with its declared values.
    Enum(EnumSchema),
}

impl SchemaNode {
    /// Whether a field of this shape must be present in a conforming document.
    ///
    /// Optional fields and oneof groups are not required by themselves; every
    /// other shape is.
    pub fn is_required(&self) -> bool {
        !matches!(self, SchemaNode::Optional(_) | SchemaNode::OneOf(_))
    }

    /// Short name of the shape, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SchemaNode::Message(_) => "message",
            SchemaNode::Repeated(_) => "repeated",
            SchemaNode::OneOf(_) => "oneof",
            SchemaNode::Optional(_) => "optional",
            SchemaNode::Literal(_) => "scalar",
            SchemaNode::Enum(_) => "enum",
        }
    }
}

/// A message shape: an ordered mapping from field name to schema.
///
/// A `None` entry is an *absent placeholder*: the field name is known and
/// accepted by the validator, but its value is neither validated nor required.
/// Loaders emit placeholders for map fields and to cut recursive message
/// references.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageSchema {
    pub name: String,
    pub fields: IndexMap<String, Option<SchemaNode>>,
}

/// A oneof group: an ordered mapping from alternative name to schema.
#[derive(Debug, Clone, PartialEq)]
pub struct OneOfSchema {
    pub alternatives: IndexMap<String, SchemaNode>,
}

impl OneOfSchema {
    /// The alternative names rendered for diagnostics, e.g. `a, b or c`.
    pub fn alternative_list(&self) -> String {
        join_names(self.alternatives.keys().map(String::as_str))
    }

    /// The first declared alternative, used as the template default.
    pub fn first(&self) -> Option<(&String, &SchemaNode)> {
        self.alternatives.first()
    }
}

/// An enum with its values in declared order. Value 0 need not come first;
/// the first declared value is the template default.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub name: String,
    pub values: Vec<(String, i32)>,
}

impl EnumSchema {
    /// The first declared value, used as the template default.
    pub fn default_value(&self) -> Option<&(String, i32)> {
        self.values.first()
    }
}

/// Joins names as `a`, `a or b`, `a, b or c`.
pub(crate) fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    match names.as_slice() {
        [] => String::new(),
        [single] => (*single).to_string(),
        [head @ .., last] => format!("{} or {}", head.join(", "), last),
    }
}
