//! `Info` and `DenseInfo` messages.

use super::{Info, StringTable};
use anyhow::{Context, Result};
use byteorder::LE;
use osmpbf_core::{
	Blob,
	io::{PBF_LENGTH_DELIMITED, PBF_VARINT, ValueWriter, ValueWriterBlob},
};

/// The `Info` message of a way or relation, with the user name replaced by its string table index.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockInfo {
	pub version: i32,
	pub timestamp: i64,
	pub changeset: i64,
	pub uid: i32,
	pub user_sid: u32,
	pub visible: bool,
}

impl BlockInfo {
	pub fn new(info: &Info, string_table: &mut StringTable) -> BlockInfo {
		BlockInfo {
			version: info.version,
			timestamp: info.timestamp,
			changeset: info.changeset,
			uid: info.uid,
			user_sid: string_table.add(&info.user),
			visible: info.visible,
		}
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::<LE>::new();

		writer.write_pbf_key(1, PBF_VARINT)?;
		writer
			.write_ivarint(i64::from(self.version))
			.context("Failed to write version")?;
		writer.write_pbf_key(2, PBF_VARINT)?;
		writer.write_ivarint(self.timestamp).context("Failed to write timestamp")?;
		writer.write_pbf_key(3, PBF_VARINT)?;
		writer.write_ivarint(self.changeset).context("Failed to write changeset")?;
		writer.write_pbf_key(4, PBF_VARINT)?;
		writer.write_ivarint(i64::from(self.uid)).context("Failed to write uid")?;
		writer.write_pbf_key(5, PBF_VARINT)?;
		writer
			.write_varint(u64::from(self.user_sid))
			.context("Failed to write user_sid")?;

		// visible defaults to true and is only written for deleted versions
		if !self.visible {
			writer.write_pbf_key(6, PBF_VARINT)?;
			writer.write_varint(0).context("Failed to write visible")?;
		}

		Ok(writer.into_blob())
	}
}

/// Column-oriented `DenseInfo`. All columns have one entry per node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DenseInfo {
	pub versions: Vec<i32>,
	pub timestamps: Vec<i64>,
	pub changesets: Vec<i64>,
	pub uids: Vec<i64>,
	pub user_sids: Vec<i64>,
	pub visibles: Vec<bool>,
}

impl DenseInfo {
	/// Appends one row. Nodes without metadata get an all-default row.
	pub fn push(&mut self, info: Option<&Info>, string_table: &mut StringTable) {
		let default = Info::default();
		let info = info.unwrap_or(&default);
		self.versions.push(info.version);
		self.timestamps.push(info.timestamp);
		self.changesets.push(info.changeset);
		self.uids.push(i64::from(info.uid));
		self.user_sids.push(i64::from(string_table.add(&info.user)));
		self.visibles.push(info.visible);
	}

	pub fn len(&self) -> usize {
		self.versions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.versions.is_empty()
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::<LE>::new();

		writer.write_pbf_key(1, PBF_LENGTH_DELIMITED)?;
		writer
			.write_pbf_packed_int32(&self.versions)
			.context("Failed to write versions")?;
		writer.write_pbf_key(2, PBF_LENGTH_DELIMITED)?;
		writer
			.write_pbf_packed_sint64_delta(&self.timestamps)
			.context("Failed to write timestamps")?;
		writer.write_pbf_key(3, PBF_LENGTH_DELIMITED)?;
		writer
			.write_pbf_packed_sint64_delta(&self.changesets)
			.context("Failed to write changesets")?;
		writer.write_pbf_key(4, PBF_LENGTH_DELIMITED)?;
		writer
			.write_pbf_packed_sint64_delta(&self.uids)
			.context("Failed to write uids")?;
		writer.write_pbf_key(5, PBF_LENGTH_DELIMITED)?;
		writer
			.write_pbf_packed_sint64_delta(&self.user_sids)
			.context("Failed to write user_sids")?;

		if self.visibles.iter().any(|visible| !visible) {
			writer.write_pbf_key(6, PBF_LENGTH_DELIMITED)?;
			writer
				.write_pbf_packed_bool(&self.visibles)
				.context("Failed to write visibles")?;
		}

		Ok(writer.into_blob())
	}
}
