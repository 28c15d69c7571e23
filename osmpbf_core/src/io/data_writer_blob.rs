//! This module provides functionality for writing data to in-memory blobs.
//!
//! # Examples
//!
//! ```rust
//! use osmpbf_core::{io::{DataWriterBlob, DataWriterTrait}, Blob};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let mut writer = DataWriterBlob::new();
//!     writer.append(&Blob::from(vec![1, 2, 3, 4]))?;
//!     assert_eq!(writer.as_slice(), &[1, 2, 3, 4]);
//!
//!     writer.close()?;
//!     assert!(writer.is_closed());
//!     assert!(writer.append(&Blob::from(vec![5])).is_err());
//!     Ok(())
//! }
//! ```

use super::DataWriterTrait;
use crate::Blob;
use anyhow::{Result, ensure};

/// A struct that provides writing capabilities to an in-memory blob of data.
#[derive(Clone, Debug, Default)]
pub struct DataWriterBlob {
	data: Vec<u8>,
	closed: bool,
}

impl DataWriterBlob {
	/// Creates a new, empty `DataWriterBlob`.
	pub fn new() -> DataWriterBlob {
		DataWriterBlob::default()
	}

	/// Returns the data written so far.
	pub fn as_slice(&self) -> &[u8] {
		self.data.as_slice()
	}

	/// Converts the writer into a `Blob`.
	pub fn into_blob(self) -> Blob {
		Blob::from(self.data)
	}

	/// Returns the length of the data in bytes.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Checks if nothing has been written.
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Returns `true` once `close` has been called.
	pub fn is_closed(&self) -> bool {
		self.closed
	}
}

impl DataWriterTrait for DataWriterBlob {
	fn append(&mut self, blob: &Blob) -> Result<()> {
		ensure!(!self.closed, "cannot append to a closed blob writer");
		self.data.extend_from_slice(blob.as_slice());
		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		self.closed = true;
		Ok(())
	}
}
