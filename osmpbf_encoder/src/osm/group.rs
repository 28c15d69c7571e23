//! `PrimitiveGroup` and the element messages it contains.
//!
//! A group holds elements of exactly one kind:
//!  * field 2: `dense` (DenseNodes)
//!  * field 3: repeated `ways`
//!  * field 4: repeated `relations`
//!
//! Plain `Node` messages (field 1) are never written, nodes always go into `DenseNodes`.

use super::{BlockInfo, DenseInfo, MemberType, Node, Relation, StringTable, Tags, Way};
use anyhow::{Context, Result};
use byteorder::LE;
use osmpbf_core::{
	Blob,
	io::{PBF_LENGTH_DELIMITED, PBF_VARINT, ValueWriter, ValueWriterBlob},
};

const NANO: f64 = 1e9;

/// Coordinate resolution of a primitive block.
///
/// A stored coordinate `c` stands for `offset + granularity * c` nanodegrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Granularity {
	pub granularity: i32,
	pub lat_offset: i64,
	pub lon_offset: i64,
}

impl Granularity {
	pub fn lat_to_units(&self, lat: f64) -> i64 {
		Self::to_units(lat, self.lat_offset, self.granularity)
	}

	pub fn lon_to_units(&self, lon: f64) -> i64 {
		Self::to_units(lon, self.lon_offset, self.granularity)
	}

	fn to_units(degrees: f64, offset: i64, granularity: i32) -> i64 {
		((degrees * NANO - offset as f64) / f64::from(granularity)).round() as i64
	}
}

impl Default for Granularity {
	fn default() -> Self {
		Granularity {
			granularity: 100,
			lat_offset: 0,
			lon_offset: 0,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveGroup {
	Dense(DenseNodes),
	Ways(Vec<BlockWay>),
	Relations(Vec<BlockRelation>),
}

impl PrimitiveGroup {
	/// Number of elements in the group.
	pub fn len(&self) -> usize {
		match self {
			PrimitiveGroup::Dense(dense) => dense.len(),
			PrimitiveGroup::Ways(ways) => ways.len(),
			PrimitiveGroup::Relations(relations) => relations.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::<LE>::new();
		match self {
			PrimitiveGroup::Dense(dense) => {
				writer
					.write_pbf_key(2, PBF_LENGTH_DELIMITED)
					.context("Failed to write PBF key for dense nodes")?;
				writer
					.write_pbf_blob(&dense.to_blob().context("Failed to build dense nodes")?)
					.context("Failed to write dense nodes")?;
			}
			PrimitiveGroup::Ways(ways) => {
				for way in ways {
					writer
						.write_pbf_key(3, PBF_LENGTH_DELIMITED)
						.context("Failed to write PBF key for way")?;
					writer
						.write_pbf_blob(&way.to_blob().with_context(|| format!("Failed to build way {}", way.id))?)
						.context("Failed to write way")?;
				}
			}
			PrimitiveGroup::Relations(relations) => {
				for relation in relations {
					writer
						.write_pbf_key(4, PBF_LENGTH_DELIMITED)
						.context("Failed to write PBF key for relation")?;
					writer
						.write_pbf_blob(
							&relation
								.to_blob()
								.with_context(|| format!("Failed to build relation {}", relation.id))?,
						)
						.context("Failed to write relation")?;
				}
			}
		}
		Ok(writer.into_blob())
	}
}

/// Column-oriented nodes with delta-coded ids and coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DenseNodes {
	pub ids: Vec<i64>,
	pub lats: Vec<i64>,
	pub lons: Vec<i64>,
	/// Per node: key and value indices, terminated by 0. Empty if no node has tags.
	pub keys_vals: Vec<i32>,
	/// Present if any node carries metadata.
	pub info: Option<DenseInfo>,
}

impl DenseNodes {
	pub fn new(nodes: &[Node], string_table: &mut StringTable, granularity: &Granularity) -> DenseNodes {
		let with_tags = nodes.iter().any(|node| !node.tags.is_empty());
		let with_info = nodes.iter().any(|node| node.info.is_some());

		let mut dense = DenseNodes {
			info: with_info.then(DenseInfo::default),
			..Default::default()
		};

		for node in nodes {
			dense.ids.push(node.id);
			dense.lats.push(granularity.lat_to_units(node.lat));
			dense.lons.push(granularity.lon_to_units(node.lon));
			if with_tags {
				for (key, val) in &node.tags {
					dense.keys_vals.push(string_table.add(key) as i32);
					dense.keys_vals.push(string_table.add(val) as i32);
				}
				dense.keys_vals.push(0);
			}
			if let Some(info) = dense.info.as_mut() {
				info.push(node.info.as_ref(), string_table);
			}
		}
		dense
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::<LE>::new();

		writer.write_pbf_key(1, PBF_LENGTH_DELIMITED)?;
		writer
			.write_pbf_packed_sint64_delta(&self.ids)
			.context("Failed to write node ids")?;

		if let Some(info) = &self.info {
			writer.write_pbf_key(5, PBF_LENGTH_DELIMITED)?;
			writer
				.write_pbf_blob(&info.to_blob().context("Failed to build dense info")?)
				.context("Failed to write dense info")?;
		}

		writer.write_pbf_key(8, PBF_LENGTH_DELIMITED)?;
		writer
			.write_pbf_packed_sint64_delta(&self.lats)
			.context("Failed to write latitudes")?;
		writer.write_pbf_key(9, PBF_LENGTH_DELIMITED)?;
		writer
			.write_pbf_packed_sint64_delta(&self.lons)
			.context("Failed to write longitudes")?;

		if !self.keys_vals.is_empty() {
			writer.write_pbf_key(10, PBF_LENGTH_DELIMITED)?;
			writer
				.write_pbf_packed_int32(&self.keys_vals)
				.context("Failed to write keys_vals")?;
		}

		Ok(writer.into_blob())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockWay {
	pub id: i64,
	pub keys: Vec<u32>,
	pub vals: Vec<u32>,
	pub info: Option<BlockInfo>,
	pub refs: Vec<i64>,
}

impl BlockWay {
	pub fn new(way: &Way, string_table: &mut StringTable) -> BlockWay {
		let (keys, vals) = encode_tags(&way.tags, string_table);
		BlockWay {
			id: way.id,
			keys,
			vals,
			info: way.info.as_ref().map(|info| BlockInfo::new(info, string_table)),
			refs: way.refs.clone(),
		}
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::<LE>::new();
		write_element_head(&mut writer, self.id, &self.keys, &self.vals, self.info.as_ref())?;

		if !self.refs.is_empty() {
			writer.write_pbf_key(8, PBF_LENGTH_DELIMITED)?;
			writer
				.write_pbf_packed_sint64_delta(&self.refs)
				.context("Failed to write refs")?;
		}

		Ok(writer.into_blob())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockRelation {
	pub id: i64,
	pub keys: Vec<u32>,
	pub vals: Vec<u32>,
	pub info: Option<BlockInfo>,
	pub roles_sid: Vec<i32>,
	pub memids: Vec<i64>,
	pub types: Vec<MemberType>,
}

impl BlockRelation {
	pub fn new(relation: &Relation, string_table: &mut StringTable) -> BlockRelation {
		let (keys, vals) = encode_tags(&relation.tags, string_table);
		let info = relation.info.as_ref().map(|info| BlockInfo::new(info, string_table));

		let mut roles_sid = Vec::with_capacity(relation.members.len());
		let mut memids = Vec::with_capacity(relation.members.len());
		let mut types = Vec::with_capacity(relation.members.len());
		for member in &relation.members {
			roles_sid.push(string_table.add(&member.role) as i32);
			memids.push(member.id);
			types.push(member.member_type);
		}

		BlockRelation {
			id: relation.id,
			keys,
			vals,
			info,
			roles_sid,
			memids,
			types,
		}
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::<LE>::new();
		write_element_head(&mut writer, self.id, &self.keys, &self.vals, self.info.as_ref())?;

		if !self.memids.is_empty() {
			writer.write_pbf_key(8, PBF_LENGTH_DELIMITED)?;
			writer
				.write_pbf_packed_int32(&self.roles_sid)
				.context("Failed to write member roles")?;
			writer.write_pbf_key(9, PBF_LENGTH_DELIMITED)?;
			writer
				.write_pbf_packed_sint64_delta(&self.memids)
				.context("Failed to write member ids")?;
			let types: Vec<u32> = self.types.iter().map(|t| t.as_u64() as u32).collect();
			writer.write_pbf_key(10, PBF_LENGTH_DELIMITED)?;
			writer
				.write_pbf_packed_uint32(&types)
				.context("Failed to write member types")?;
		}

		Ok(writer.into_blob())
	}
}

fn encode_tags(tags: &Tags, string_table: &mut StringTable) -> (Vec<u32>, Vec<u32>) {
	tags
		.iter()
		.map(|(key, val)| (string_table.add(key), string_table.add(val)))
		.unzip()
}

/// Writes the fields ways and relations share: `id = 1`, `keys = 2`, `vals = 3`, `info = 4`.
fn write_element_head(
	writer: &mut ValueWriterBlob<LE>,
	id: i64,
	keys: &[u32],
	vals: &[u32],
	info: Option<&BlockInfo>,
) -> Result<()> {
	writer.write_pbf_key(1, PBF_VARINT)?;
	writer.write_ivarint(id).context("Failed to write id")?;

	if !keys.is_empty() {
		writer.write_pbf_key(2, PBF_LENGTH_DELIMITED)?;
		writer.write_pbf_packed_uint32(keys).context("Failed to write keys")?;
		writer.write_pbf_key(3, PBF_LENGTH_DELIMITED)?;
		writer.write_pbf_packed_uint32(vals).context("Failed to write vals")?;
	}

	if let Some(info) = info {
		writer.write_pbf_key(4, PBF_LENGTH_DELIMITED)?;
		writer
			.write_pbf_blob(&info.to_blob().context("Failed to build info")?)
			.context("Failed to write info")?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::osm::{Info, Member};
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case(0.0, 0)]
	#[case(52.5, 525_000_000)]
	#[case(-13.0000001, -130_000_001)]
	#[case(0.00000004, 0)]
	#[case(0.00000006, 1)]
	fn default_granularity_to_units(#[case] degrees: f64, #[case] units: i64) {
		let granularity = Granularity::default();
		assert_eq!(granularity.lat_to_units(degrees), units);
		assert_eq!(granularity.lon_to_units(degrees), units);
	}

	#[test]
	fn granularity_with_offset() {
		let granularity = Granularity {
			granularity: 1000,
			lat_offset: 500_000_000,
			lon_offset: 0,
		};
		assert_eq!(granularity.lat_to_units(1.0), 500_000);
		assert_eq!(granularity.lon_to_units(1.0), 1_000_000);
	}

	#[test]
	fn dense_nodes_to_blob() -> Result<()> {
		let mut table = StringTable::new();
		let nodes = vec![
			Node::new(10, 0.000001, 0.000002).with_tags(&[("a", "b")]),
			Node::new(11, 0.0, 0.0),
		];
		let dense = DenseNodes::new(&nodes, &mut table, &Granularity::default());
		assert_eq!(dense.keys_vals, vec![1, 2, 0, 0]);
		assert_eq!(dense.info, None);
		assert_eq!(
			dense.to_blob()?.into_vec(),
			vec![
				0x0A, 2, 20, 2, // ids 10, +1
				0x42, 2, 20, 19, // lats 10, -10
				0x4A, 2, 40, 39, // lons 20, -20
				0x52, 4, 1, 2, 0, 0, // keys_vals
			]
		);
		Ok(())
	}

	#[test]
	fn dense_nodes_without_tags_omit_keys_vals() -> Result<()> {
		let mut table = StringTable::new();
		let dense = DenseNodes::new(&[Node::new(1, 0.0, 0.0)], &mut table, &Granularity::default());
		assert!(dense.keys_vals.is_empty());
		assert_eq!(dense.to_blob()?.into_vec(), vec![0x0A, 1, 2, 0x42, 1, 0, 0x4A, 1, 0]);
		Ok(())
	}

	#[test]
	fn dense_nodes_with_partial_info() {
		let mut table = StringTable::new();
		let mut with_info = Node::new(1, 0.0, 0.0);
		with_info.info = Some(Info {
			user: "bob".to_string(),
			..Default::default()
		});
		let dense = DenseNodes::new(&[with_info, Node::new(2, 0.0, 0.0)], &mut table, &Granularity::default());
		let info = dense.info.as_ref().map(DenseInfo::len);
		assert_eq!(info, Some(2));
		assert_eq!(table.find("bob").ok(), Some(1));
	}

	#[test]
	fn way_to_blob() -> Result<()> {
		let mut table = StringTable::new();
		let way = BlockWay::new(&Way::new(5, vec![3, 4, 2]).with_tags(&[("highway", "path")]), &mut table);
		assert_eq!((way.keys.clone(), way.vals.clone()), (vec![1], vec![2]));
		assert_eq!(
			way.to_blob()?.into_vec(),
			vec![
				0x08, 5, // id
				0x12, 1, 1, // keys
				0x1A, 1, 2, // vals
				0x42, 3, 6, 2, 3, // refs 3, +1, -2
			]
		);
		Ok(())
	}

	#[test]
	fn relation_to_blob() -> Result<()> {
		let mut table = StringTable::new();
		let relation = Relation::new(
			9,
			vec![
				Member::new(MemberType::Way, 5, "outer"),
				Member::new(MemberType::Node, 3, ""),
			],
		);
		let relation = BlockRelation::new(&relation, &mut table);
		assert_eq!(relation.roles_sid, vec![1, 0]);
		assert_eq!(
			relation.to_blob()?.into_vec(),
			vec![
				0x08, 9, // id
				0x42, 2, 1, 0, // roles_sid
				0x4A, 2, 10, 3, // memids 5, -2
				0x52, 2, 1, 0, // types way, node
			]
		);
		Ok(())
	}

	#[test]
	fn group_len_and_field_numbers() -> Result<()> {
		let mut table = StringTable::new();
		let ways = PrimitiveGroup::Ways(vec![
			BlockWay::new(&Way::new(1, vec![]), &mut table),
			BlockWay::new(&Way::new(2, vec![]), &mut table),
		]);
		assert_eq!(ways.len(), 2);
		assert_eq!(ways.to_blob()?.into_vec(), vec![0x1A, 2, 0x08, 1, 0x1A, 2, 0x08, 2]);

		let relations = PrimitiveGroup::Relations(vec![BlockRelation::new(&Relation::new(-1, vec![]), &mut table)]);
		let blob = relations.to_blob()?.into_vec();
		// negative ids are sign extended to ten bytes
		assert_eq!(blob[..3], [0x22, 11, 0x08]);
		assert_eq!(blob.len(), 13);

		assert!(PrimitiveGroup::Dense(DenseNodes::default()).is_empty());
		Ok(())
	}
}
