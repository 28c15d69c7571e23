//! The `fileformat` container: every unit is a big-endian `u32` header length, a `BlobHeader` and a
//! `Blob`.

mod blob_header;
mod blob_type;
mod file_blob;
mod framer;

pub use blob_header::*;
pub use blob_type::*;
pub use file_blob::*;
pub use framer::*;
