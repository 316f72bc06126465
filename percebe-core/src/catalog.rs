//! # Service Catalog & Schema Cache
//!
//! [`ServiceCatalog`] is the result of a schema-discovery run: every
//! `(service, method)` pair with its streaming flags and resolved
//! request/response [`SchemaNode`]s. Both the static loader and the reflection
//! client produce one.
//!
//! [`SchemaCache`] is the process-lifetime cache populated by completed
//! reflection sessions. It is an explicit object owned by the caller rather
//! than global state, so sessions stay independently testable. Sessions
//! sharing a cache are serialized through an internal session lock; a new
//! session invalidates the cache in full before repopulating it.
use crate::schema::SchemaNode;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Mutex;

/// Resolved metadata for a single gRPC method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSchema {
    /// Fully-qualified service name (e.g. `chat.ChatService`).
    pub service: String,
    /// Method name (e.g. `Send`).
    pub method: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
    /// Request message shape, rooted at a [`SchemaNode::Message`].
    pub request: SchemaNode,
    /// Response message shape, rooted at a [`SchemaNode::Message`].
    pub response: SchemaNode,
}

/// Cache/lookup key: service and method joined by `/`.
pub(crate) fn method_key(service: &str, method: &str) -> String {
    format!("{service}/{method}")
}

/// An ordered collection of resolved methods, keyed by `service/method`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceCatalog {
    methods: IndexMap<String, MethodSchema>,
}

impl ServiceCatalog {
    pub fn insert(&mut self, method: MethodSchema) {
        let key = method_key(&method.service, &method.method);
        self.methods.insert(key, method);
    }

    pub fn get(&self, service: &str, method: &str) -> Option<&MethodSchema> {
        self.methods.get(&method_key(service, method))
    }

    /// Methods in discovery order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodSchema> {
        self.methods.values()
    }

    /// Unique service names, preserving discovery order.
    pub fn services(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for method in self.methods.values() {
            if !seen.contains(&method.service.as_str()) {
                seen.push(method.service.as_str());
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// A process-lifetime cache of resolved method schemas.
///
/// Mutated only by reflection sessions: a starting session clears it in full
/// (conservative invalidation, no per-server partitioning) and a completed
/// session repopulates it. Lookups clone the stored entry.
#[derive(Debug, Default)]
pub struct SchemaCache {
    methods: Mutex<HashMap<String, MethodSchema>>,
    session: tokio::sync::Mutex<()>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, service: &str, method: &str) -> Option<MethodSchema> {
        self.methods
            .lock()
            .expect("schema cache lock poisoned")
            .get(&method_key(service, method))
            .cloned()
    }

    pub fn clear(&self) {
        self.methods
            .lock()
            .expect("schema cache lock poisoned")
            .clear();
    }

    pub fn len(&self) -> usize {
        self.methods
            .lock()
            .expect("schema cache lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn populate(&self, catalog: &ServiceCatalog) {
        let mut methods = self.methods.lock().expect("schema cache lock poisoned");
        methods.clear();
        for method in catalog.methods() {
            methods.insert(method_key(&method.service, &method.method), method.clone());
        }
    }

    /// Serializes reflection sessions sharing this cache: the guard is held
    /// for the whole session.
    pub(crate) async fn begin_session(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.session.lock().await
    }
}
