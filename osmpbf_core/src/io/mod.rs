//! Readers, writers and output sinks.
//!
//! - [`ValueWriter`] / [`ValueReader`] encode and decode integers and protobuf fields.
//! - [`DataWriterTrait`] is the sequential output sink a PBF stream is written to, implemented
//!   in memory by [`DataWriterBlob`] and on disk by [`DataWriterFile`].

mod data_writer;
mod data_writer_blob;
mod data_writer_file;
mod value_reader;
mod value_reader_slice;
mod value_writer;
mod value_writer_blob;

pub use data_writer::*;
pub use data_writer_blob::*;
pub use data_writer_file::*;
pub use value_reader::*;
pub use value_reader_slice::*;
pub use value_writer::*;
pub use value_writer_blob::*;
