//! # Static Loader
//!
//! Resolves a schema from `.proto` sources on disk, without talking to any
//! server. The proto grammar and import resolution are handled by `protox`
//! (a pure-Rust protoc): imports resolve against the given root directory,
//! never against the importing file's own directory, and the whole transitive
//! dependency graph is compiled eagerly. The compiled descriptors then go
//! through the same mapping pass as reflected ones (see [`crate::descriptor`]).
use crate::catalog::ServiceCatalog;
use crate::descriptor::{self, MappingError};
use prost_types::FileDescriptorSet;
use std::path::Path;

/// Errors raised while loading a schema from `.proto` files.
///
/// Any parse or resolution failure aborts the whole load; no partial catalog
/// is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum ProtoLoadError {
    #[error("failed to compile proto file: {0}")]
    Compile(#[from] protox::Error),

    #[error("failed to map descriptors: {0}")]
    Mapping(#[from] MappingError),
}

/// Compiles `proto_path` (relative to `root`) and its transitive imports into
/// a raw `FileDescriptorSet`.
pub fn load_file_descriptor_set(
    root: &Path,
    proto_path: impl AsRef<Path>,
) -> Result<FileDescriptorSet, ProtoLoadError> {
    let set = protox::compile([proto_path.as_ref()], [root])?;
    tracing::debug!(
        files = set.file.len(),
        root = %root.display(),
        "compiled proto file set"
    );
    Ok(set)
}

/// Loads every service method declared by `proto_path` (and its imports) into
/// a [`ServiceCatalog`].
pub fn load_services(
    root: &Path,
    proto_path: impl AsRef<Path>,
) -> Result<ServiceCatalog, ProtoLoadError> {
    let set = load_file_descriptor_set(root, proto_path)?;
    let catalog = descriptor::build_catalog(set.file.iter())?;
    tracing::debug!(methods = catalog.len(), "built catalog from proto files");
    Ok(catalog)
}
