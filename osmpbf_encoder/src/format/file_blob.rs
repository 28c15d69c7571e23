//! `Blob` of `fileformat.proto`, named `FileBlob` here to keep it apart from the byte buffer [`Blob`].
//!
//! Field layout:
//!  * field 1: `raw` (bytes)
//!  * field 2: `raw_size` (int32, uncompressed length)
//!  * field 3: `zlib_data` (bytes)

use anyhow::{Context, Result};
use byteorder::LE;
use osmpbf_core::{
	Blob,
	compression::compress_zlib,
	io::{PBF_LENGTH_DELIMITED, PBF_VARINT, ValueWriter, ValueWriterBlob},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlobData {
	Raw(Blob),
	Zlib(Blob),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileBlob {
	pub raw_size: i32,
	pub data: BlobData,
}

impl FileBlob {
	/// Wraps `payload`, compressing it with zlib if `compress` is set.
	pub fn new(payload: &Blob, compress: bool) -> Result<FileBlob> {
		let raw_size = i32::try_from(payload.len())
			.with_context(|| format!("payload of {} bytes does not fit into raw_size", payload.len()))?;
		let data = if compress {
			BlobData::Zlib(compress_zlib(payload).context("compress block")?)
		} else {
			BlobData::Raw(payload.clone())
		};
		Ok(FileBlob { raw_size, data })
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::<LE>::new();

		if let BlobData::Raw(raw) = &self.data {
			writer.write_pbf_key(1, PBF_LENGTH_DELIMITED)?;
			writer.write_pbf_blob(raw).context("Failed to write raw data")?;
		}

		writer.write_pbf_key(2, PBF_VARINT)?;
		writer
			.write_ivarint(i64::from(self.raw_size))
			.context("Failed to write raw_size")?;

		if let BlobData::Zlib(zlib) = &self.data {
			writer.write_pbf_key(3, PBF_LENGTH_DELIMITED)?;
			writer.write_pbf_blob(zlib).context("Failed to write zlib data")?;
		}

		Ok(writer.into_blob())
	}
}
