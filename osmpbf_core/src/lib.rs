//! Byte-level building blocks for writing OpenStreetMap PBF containers.
//!
//! - [`Blob`] and [`GeoBBox`] are the plain value types.
//! - [`io`] has protobuf-aware value writers/readers and the output sinks.
//! - [`compression`] wraps zlib.

pub mod compression;

pub mod io;

pub mod types;
pub use types::*;
