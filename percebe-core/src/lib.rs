//! # Percebe Core
//!
//! `percebe-core` is the schema engine behind the Percebe tools. It resolves
//! protobuf schemas two ways — statically from `.proto` files on disk, and
//! dynamically over a running server's reflection protocol — into one shared
//! [`schema::SchemaNode`] model, then uses that model to check hand-authored
//! JSON request bodies and to generate editor-ready request templates.
//!
//! ## Key Components
//!
//! * **[`schema::SchemaNode`]:** the language-agnostic schema model both
//!   loaders converge on.
//! * **[`loader`]:** compiles `.proto` sources (imports resolved against a
//!   root directory) into a [`catalog::ServiceCatalog`].
//! * **[`reflection::client::ReflectionClient`]:** discovers a remote
//!   server's schema over `grpc.reflection.v1`, falling back to `v1alpha`
//!   once when the server reports `Unimplemented`.
//! * **[`validate::validate`]:** walks a position-annotated document tree
//!   against a schema and returns diagnostics as data; it never fails.
//! * **[`template`]:** generates deterministic example request bodies with
//!   trailing-comment annotations.
//!
//! The validator consumes any tree implementing [`document::DocumentNode`];
//! parsing JSON text is the host's job.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost` and `tonic` to ensure that consumers use
//! compatible versions of these underlying dependencies.
pub mod catalog;
pub mod descriptor;
pub mod document;
pub mod loader;
pub mod reflection;
pub mod schema;
pub mod template;
pub mod validate;

// Re-exports
pub use prost;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
