//! This module defines the `DataWriterTrait` trait, the sequential output sink of the encoder.
//!
//! # Examples
//!
//! ```rust
//! use osmpbf_core::{io::DataWriterTrait, Blob};
//! use anyhow::Result;
//!
//! struct MockDataWriter {
//!     data: Vec<u8>,
//! }
//!
//! impl DataWriterTrait for MockDataWriter {
//!     fn append(&mut self, blob: &Blob) -> Result<()> {
//!         self.data.extend_from_slice(blob.as_slice());
//!         Ok(())
//!     }
//!
//!     fn close(&mut self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let mut writer = MockDataWriter { data: vec![] };
//!     writer.append(&Blob::from(vec![1, 2, 3, 4]))?;
//!     assert_eq!(writer.data, vec![1, 2, 3, 4]);
//!     Ok(())
//! }
//! ```

use crate::Blob;
use anyhow::Result;

/// A sink that accepts bytes strictly sequentially and must be closed explicitly.
///
/// `Send` because the sink is handed from the caller's thread to the block writer stage.
pub trait DataWriterTrait: Send {
	/// Appends all bytes of `blob`. A short write is an error.
	fn append(&mut self, blob: &Blob) -> Result<()>;

	/// Flushes buffered data and releases the sink. Appending after `close` fails.
	fn close(&mut self) -> Result<()>;
}
