//! `BlobHeader`: `type = 1` (string), `indexdata = 2` (unused), `datasize = 3` (int32).

use super::BlobType;
use anyhow::{Context, Result};
use byteorder::LE;
use osmpbf_core::{
	Blob,
	io::{PBF_LENGTH_DELIMITED, PBF_VARINT, ValueWriter, ValueWriterBlob},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobHeader {
	pub blob_type: BlobType,
	/// Byte length of the marshalled `Blob` that follows.
	pub datasize: i32,
}

impl BlobHeader {
	pub fn new(blob_type: BlobType, datasize: i32) -> BlobHeader {
		BlobHeader { blob_type, datasize }
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::<LE>::new();
		writer
			.write_pbf_key(1, PBF_LENGTH_DELIMITED)
			.context("Failed to write PBF key for blob type")?;
		writer
			.write_pbf_string(self.blob_type.as_str())
			.context("Failed to write blob type")?;
		writer
			.write_pbf_key(3, PBF_VARINT)
			.context("Failed to write PBF key for datasize")?;
		writer
			.write_ivarint(i64::from(self.datasize))
			.context("Failed to write datasize")?;
		Ok(writer.into_blob())
	}
}
