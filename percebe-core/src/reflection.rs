//! # Server Reflection
//!
//! Discovery of a remote server's schema over the gRPC Server Reflection
//! Protocol, without access to its `.proto` sources.
//!
//! The protocol has two incompatible wire versions, `grpc.reflection.v1` and
//! `grpc.reflection.v1alpha`. Sessions always start on v1 and fall back to
//! v1alpha exactly once when the server reports `Unimplemented`.
pub mod client;
mod compat;
