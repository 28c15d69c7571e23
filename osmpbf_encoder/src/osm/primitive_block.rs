//! The `PrimitiveBlock` message, the payload of every `OSMData` blob.
//!
//! Field layout:
//!  * field 1: `stringtable` (StringTable)
//!  * field 2: repeated `primitivegroup` (always exactly one here)
//!  * field 17: `granularity` (default 100)
//!  * field 18: `date_granularity` (default 1000)
//!  * field 19: `lat_offset` (default 0)
//!  * field 20: `lon_offset` (default 0)

use super::{BlockRelation, BlockWay, DenseNodes, Granularity, Node, PrimitiveGroup, Relation, StringTable, Way};
use anyhow::{Context, Result, ensure};
use byteorder::LE;
use osmpbf_core::{
	Blob,
	io::{PBF_LENGTH_DELIMITED, PBF_VARINT, ValueWriter, ValueWriterBlob},
};

/// One block of same-kind elements, ready to be marshalled.
///
/// Timestamps are stored in seconds, so `date_granularity` is always the default of 1000 ms.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveBlock {
	pub string_table: StringTable,
	pub group: PrimitiveGroup,
	pub granularity: Granularity,
}

impl PrimitiveBlock {
	pub fn from_nodes(nodes: &[Node]) -> Result<PrimitiveBlock> {
		Self::from_nodes_with_granularity(nodes, Granularity::default())
	}

	pub fn from_nodes_with_granularity(nodes: &[Node], granularity: Granularity) -> Result<PrimitiveBlock> {
		ensure!(!nodes.is_empty(), "cannot build a primitive block without nodes");
		ensure!(granularity.granularity > 0, "granularity must be positive");
		let mut string_table = StringTable::new();
		let dense = DenseNodes::new(nodes, &mut string_table, &granularity);
		Ok(PrimitiveBlock {
			string_table,
			group: PrimitiveGroup::Dense(dense),
			granularity,
		})
	}

	pub fn from_ways(ways: &[Way]) -> Result<PrimitiveBlock> {
		ensure!(!ways.is_empty(), "cannot build a primitive block without ways");
		let mut string_table = StringTable::new();
		let ways = ways.iter().map(|way| BlockWay::new(way, &mut string_table)).collect();
		Ok(PrimitiveBlock {
			string_table,
			group: PrimitiveGroup::Ways(ways),
			granularity: Granularity::default(),
		})
	}

	pub fn from_relations(relations: &[Relation]) -> Result<PrimitiveBlock> {
		ensure!(!relations.is_empty(), "cannot build a primitive block without relations");
		let mut string_table = StringTable::new();
		let relations = relations
			.iter()
			.map(|relation| BlockRelation::new(relation, &mut string_table))
			.collect();
		Ok(PrimitiveBlock {
			string_table,
			group: PrimitiveGroup::Relations(relations),
			granularity: Granularity::default(),
		})
	}

	/// Number of elements in the block.
	pub fn len(&self) -> usize {
		self.group.len()
	}

	pub fn is_empty(&self) -> bool {
		self.group.is_empty()
	}

	/// Serializes the block. Granularity fields are only written when they differ from their defaults.
	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::<LE>::new();

		writer
			.write_pbf_key(1, PBF_LENGTH_DELIMITED)
			.context("Failed to write PBF key for string table")?;
		writer
			.write_pbf_blob(&self.string_table.to_blob().context("Failed to build string table")?)
			.context("Failed to write string table")?;

		writer
			.write_pbf_key(2, PBF_LENGTH_DELIMITED)
			.context("Failed to write PBF key for primitive group")?;
		writer
			.write_pbf_blob(&self.group.to_blob().context("Failed to build primitive group")?)
			.context("Failed to write primitive group")?;

		let default = Granularity::default();
		if self.granularity.granularity != default.granularity {
			writer.write_pbf_key(17, PBF_VARINT)?;
			writer
				.write_ivarint(i64::from(self.granularity.granularity))
				.context("Failed to write granularity")?;
		}
		if self.granularity.lat_offset != default.lat_offset {
			writer.write_pbf_key(19, PBF_VARINT)?;
			writer
				.write_ivarint(self.granularity.lat_offset)
				.context("Failed to write lat_offset")?;
		}
		if self.granularity.lon_offset != default.lon_offset {
			writer.write_pbf_key(20, PBF_VARINT)?;
			writer
				.write_ivarint(self.granularity.lon_offset)
				.context("Failed to write lon_offset")?;
		}

		Ok(writer.into_blob())
	}
}
