//! # Document Abstraction
//!
//! The validator does not parse JSON itself; it walks an already-parsed,
//! position-annotated tree supplied by the host. [`DocumentNode`] is the small
//! capability interface it needs: kind, source range, object properties and
//! array elements.
//!
//! Two implementations ship with the crate: [`SpannedValue`], for hosts whose
//! JSON parser reports byte offsets, and a degenerate one for plain
//! `serde_json::Value` trees where every range collapses to `0..0`.
use std::ops::Range;

/// The JSON kind of a document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl DocKind {
    /// Lowercase kind name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            DocKind::Object => "object",
            DocKind::Array => "array",
            DocKind::String => "string",
            DocKind::Number => "number",
            DocKind::Bool => "boolean",
            DocKind::Null => "null",
        }
    }
}

/// One object property: key, the key's own source range, and the value node.
#[derive(Debug)]
pub struct Property<'a, N> {
    pub key: &'a str,
    pub key_range: Range<usize>,
    pub value: &'a N,
}

/// A parsed document tree the validator can walk.
///
/// `properties` and `elements` only return entries for object and array nodes
/// respectively; they are empty for every other kind.
pub trait DocumentNode: Sized {
    fn kind(&self) -> DocKind;

    /// Half-open byte range of this node in the source text.
    fn range(&self) -> Range<usize>;

    /// Object properties, in document order.
    fn properties(&self) -> Vec<Property<'_, Self>>;

    /// Array elements, in document order.
    fn elements(&self) -> Vec<&Self>;
}

/// A position-annotated JSON value, built by the host from its own parser's
/// output. Ranges are half-open byte offsets into the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedValue {
    pub node: SpannedNode,
    pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpannedNode {
    Object(Vec<SpannedEntry>),
    Array(Vec<SpannedValue>),
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

/// One object entry of a [`SpannedValue`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedEntry {
    pub key: String,
    pub key_range: Range<usize>,
    pub value: SpannedValue,
}

impl DocumentNode for SpannedValue {
    fn kind(&self) -> DocKind {
        match self.node {
            SpannedNode::Object(_) => DocKind::Object,
            SpannedNode::Array(_) => DocKind::Array,
            SpannedNode::String(_) => DocKind::String,
            SpannedNode::Number(_) => DocKind::Number,
            SpannedNode::Bool(_) => DocKind::Bool,
            SpannedNode::Null => DocKind::Null,
        }
    }

    fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    fn properties(&self) -> Vec<Property<'_, Self>> {
        match &self.node {
            SpannedNode::Object(entries) => entries
                .iter()
                .map(|entry| Property {
                    key: entry.key.as_str(),
                    key_range: entry.key_range.clone(),
                    value: &entry.value,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn elements(&self) -> Vec<&Self> {
        match &self.node {
            SpannedNode::Array(elements) => elements.iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// Position-less fallback for plain `serde_json` trees: every range is `0..0`.
impl DocumentNode for serde_json::Value {
    fn kind(&self) -> DocKind {
        match self {
            serde_json::Value::Object(_) => DocKind::Object,
            serde_json::Value::Array(_) => DocKind::Array,
            serde_json::Value::String(_) => DocKind::String,
            serde_json::Value::Number(_) => DocKind::Number,
            serde_json::Value::Bool(_) => DocKind::Bool,
            serde_json::Value::Null => DocKind::Null,
        }
    }

    fn range(&self) -> Range<usize> {
        0..0
    }

    fn properties(&self) -> Vec<Property<'_, Self>> {
        match self {
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(key, value)| Property {
                    key,
                    key_range: 0..0,
                    value,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn elements(&self) -> Vec<&Self> {
        match self {
            serde_json::Value::Array(elements) => elements.iter().collect(),
            _ => Vec::new(),
        }
    }
}
