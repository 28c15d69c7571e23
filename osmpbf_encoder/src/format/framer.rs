//! Turns a payload into one framed container unit and writes it to a sink.
//!
//! ```text
//! u32 (big-endian)   length of the marshalled BlobHeader
//! BlobHeader         { type, datasize }
//! Blob               { raw | zlib_data, raw_size }
//! ```

use super::{BlobHeader, BlobType, FileBlob};
use anyhow::{Context, Result, ensure};
use osmpbf_core::{
	Blob,
	io::{DataWriterTrait, ValueWriter, ValueWriterBlob},
};

/// Upper bound (exclusive) for a marshalled `BlobHeader`.
pub const MAX_BLOB_HEADER_SIZE: u64 = 64 * 1024;
/// Upper bound (inclusive) for a marshalled `Blob`.
pub const MAX_BLOB_SIZE: u64 = 32 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlobFramer {
	compression: bool,
}

impl BlobFramer {
	pub fn new(compression: bool) -> BlobFramer {
		BlobFramer { compression }
	}

	pub fn compression(&self) -> bool {
		self.compression
	}

	/// Builds the three parts of a unit: length prefix, header and blob.
	pub fn frame(&self, payload: &Blob, blob_type: BlobType) -> Result<[Blob; 3]> {
		let blob = FileBlob::new(payload, self.compression)?
			.to_blob()
			.context("marshal blob")?;
		ensure!(
			blob.len() <= MAX_BLOB_SIZE,
			"blob of {} bytes exceeds the maximum of {MAX_BLOB_SIZE} bytes",
			blob.len()
		);

		let header = BlobHeader::new(blob_type, blob.len() as i32)
			.to_blob()
			.context("marshal blob header")?;
		ensure!(
			header.len() < MAX_BLOB_HEADER_SIZE,
			"blob header of {} bytes exceeds the maximum of {MAX_BLOB_HEADER_SIZE} bytes",
			header.len()
		);

		let mut prefix = ValueWriterBlob::new_be();
		prefix.write_u32(header.len() as u32)?;

		Ok([prefix.into_blob(), header, blob])
	}

	/// Frames `payload` and appends the unit to `sink`.
	///
	/// The three appends are not transactional: if a later one fails, the earlier bytes stay in the sink.
	pub fn encode_block(&self, sink: &mut dyn DataWriterTrait, payload: &Blob, blob_type: BlobType) -> Result<()> {
		let [prefix, header, blob] = self.frame(payload, blob_type)?;

		sink.append(&prefix).context("write header length")?;
		sink.append(&header).context("write blob header")?;
		sink.append(&blob).context("write blob")?;

		log::trace!(
			"wrote {blob_type} blob: {} bytes payload, {} bytes on disk",
			payload.len(),
			prefix.len() + header.len() + blob.len()
		);
		Ok(())
	}
}
