//! This module provides functionality for writing data to files.
//!
//! # Examples
//!
//! ```rust
//! use osmpbf_core::{io::{DataWriterFile, DataWriterTrait}, Blob};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let path = std::env::temp_dir().join("osmpbf_core_doctest.bin");
//!     let mut writer = DataWriterFile::from_path(&path)?;
//!     writer.append(&Blob::from(vec![1, 2, 3, 4]))?;
//!     writer.close()?;
//!     assert_eq!(std::fs::read(&path)?, vec![1, 2, 3, 4]);
//!     Ok(())
//! }
//! ```

use super::DataWriterTrait;
use crate::Blob;
use anyhow::{Context, Result, ensure};
use std::{
	fs::File,
	io::{BufWriter, Write},
	path::Path,
};

/// A buffered, append-only file sink.
pub struct DataWriterFile {
	writer: Option<BufWriter<File>>,
	position: u64,
}

impl DataWriterFile {
	/// Creates (or truncates) the file at `path`. The path must be absolute.
	pub fn from_path(path: &Path) -> Result<DataWriterFile> {
		ensure!(path.is_absolute(), "path {path:?} must be absolute");

		let file = File::create(path).with_context(|| format!("Failed to create file {path:?}"))?;
		Ok(DataWriterFile {
			writer: Some(BufWriter::new(file)),
			position: 0,
		})
	}
}

impl DataWriterTrait for DataWriterFile {
	fn append(&mut self, blob: &Blob) -> Result<()> {
		let writer = self.writer.as_mut().context("cannot append to a closed file writer")?;
		writer.write_all(blob.as_slice())?;
		self.position += blob.len();
		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		if let Some(writer) = self.writer.take() {
			let file = writer.into_inner().map_err(|e| e.into_error())?;
			file.sync_all().context("Failed to sync file")?;
			log::trace!("closed file after {} bytes", self.position);
		}
		Ok(())
	}
}
