//! Test helpers: sinks with observable or failing behaviour, and a minimal decoder for the
//! written container so tests can check what actually landed in the output.
//!
//! Only compiled for tests.

use crate::format::BlobType;
use anyhow::{Context, Result, bail, ensure};
use byteorder::LE;
use osmpbf_core::{
	Blob,
	compression::decompress_zlib,
	io::{DataWriterTrait, ValueReader, ValueReaderSlice},
};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct SharedState {
	data: Vec<u8>,
	closed: bool,
}

/// An in-memory sink whose content can be inspected while the encoder owns a clone of it.
#[derive(Clone, Debug, Default)]
pub struct SharedSink {
	state: Arc<Mutex<SharedState>>,
}

impl SharedSink {
	pub fn new() -> SharedSink {
		SharedSink::default()
	}

	pub fn snapshot(&self) -> Vec<u8> {
		self.state.lock().data.clone()
	}

	pub fn is_closed(&self) -> bool {
		self.state.lock().closed
	}
}

impl DataWriterTrait for SharedSink {
	fn append(&mut self, blob: &Blob) -> Result<()> {
		let mut state = self.state.lock();
		ensure!(!state.closed, "sink is closed");
		state.data.extend_from_slice(blob.as_slice());
		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		self.state.lock().closed = true;
		Ok(())
	}
}

/// A sink that accepts a fixed number of appends and fails on every one after that.
#[derive(Debug)]
pub struct FailingSink {
	remaining: usize,
	written: u64,
	pub fail_on_close: bool,
}

impl FailingSink {
	pub fn after(appends: usize) -> FailingSink {
		FailingSink {
			remaining: appends,
			written: 0,
			fail_on_close: false,
		}
	}

	pub fn written(&self) -> u64 {
		self.written
	}
}

impl DataWriterTrait for FailingSink {
	fn append(&mut self, blob: &Blob) -> Result<()> {
		ensure!(self.remaining > 0, "disk full");
		self.remaining -= 1;
		self.written += blob.len();
		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		ensure!(!self.fail_on_close, "close failed");
		Ok(())
	}
}

/// One decoded container unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
	pub blob_type: BlobType,
	pub datasize: i32,
	pub raw: Option<Blob>,
	pub raw_size: Option<i32>,
	pub zlib_data: Option<Blob>,
}

impl Frame {
	/// The uncompressed payload.
	pub fn payload(&self) -> Result<Blob> {
		match (&self.raw, &self.zlib_data) {
			(Some(raw), None) => Ok(raw.clone()),
			(None, Some(zlib)) => decompress_zlib(zlib),
			_ => bail!("blob must contain exactly one of raw and zlib_data"),
		}
	}
}

/// Splits a written stream into its units.
pub fn read_frames(data: &[u8]) -> Result<Vec<Frame>> {
	let mut reader = ValueReaderSlice::new_be(data);
	let mut frames = Vec::new();

	while reader.has_remaining() {
		let header_len = reader.read_u32().context("read header length")?;
		let header = reader.read_blob(u64::from(header_len)).context("read blob header")?;

		let mut blob_type = None;
		let mut datasize = None;
		let mut header_reader = ValueReaderSlice::new_le(header.as_slice());
		while header_reader.has_remaining() {
			match header_reader.read_pbf_key()? {
				(1, 2) => blob_type = Some(BlobType::try_from(header_reader.read_pbf_string()?.as_str())?),
				(3, 0) => datasize = Some(header_reader.read_varint()? as i32),
				(_, w) => header_reader.skip_pbf_field(w)?,
			}
		}
		let blob_type = blob_type.context("blob header without type")?;
		let datasize = datasize.context("blob header without datasize")?;

		let blob = reader.read_blob(datasize as u64).context("read blob")?;
		let mut frame = Frame {
			blob_type,
			datasize,
			raw: None,
			raw_size: None,
			zlib_data: None,
		};
		let mut blob_reader = ValueReaderSlice::new_le(blob.as_slice());
		while blob_reader.has_remaining() {
			match blob_reader.read_pbf_key()? {
				(1, 2) => frame.raw = Some(blob_reader.read_pbf_blob()?),
				(2, 0) => frame.raw_size = Some(blob_reader.read_varint()? as i32),
				(3, 2) => frame.zlib_data = Some(blob_reader.read_pbf_blob()?),
				(_, w) => blob_reader.skip_pbf_field(w)?,
			}
		}
		frames.push(frame);
	}
	Ok(frames)
}

/// What a decoded `PrimitiveBlock` contains.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockSummary {
	pub strings: Vec<String>,
	pub node_ids: Vec<i64>,
	pub lats: Vec<i64>,
	pub lons: Vec<i64>,
	pub way_ids: Vec<i64>,
	pub relation_ids: Vec<i64>,
}

impl BlockSummary {
	pub fn len(&self) -> usize {
		self.node_ids.len() + self.way_ids.len() + self.relation_ids.len()
	}
}

pub fn read_block(payload: &Blob) -> Result<BlockSummary> {
	let mut summary = BlockSummary::default();
	let mut reader = ValueReaderSlice::new_le(payload.as_slice());
	while reader.has_remaining() {
		match reader.read_pbf_key()? {
			(1, 2) => {
				let mut table = reader.get_pbf_sub_reader()?;
				while table.has_remaining() {
					match table.read_pbf_key()? {
						(1, 2) => summary.strings.push(table.read_pbf_string()?),
						(_, w) => table.skip_pbf_field(w)?,
					}
				}
			}
			(2, 2) => read_group(reader.get_pbf_sub_reader()?.as_mut(), &mut summary)?,
			(_, w) => reader.skip_pbf_field(w)?,
		}
	}
	Ok(summary)
}

fn read_group(reader: &mut dyn ValueReader<'_, LE>, summary: &mut BlockSummary) -> Result<()> {
	while reader.has_remaining() {
		match reader.read_pbf_key()? {
			(2, 2) => {
				let mut dense = reader.get_pbf_sub_reader()?;
				while dense.has_remaining() {
					match dense.read_pbf_key()? {
						(1, 2) => summary.node_ids.extend(undelta(dense.read_pbf_packed_sint64()?)),
						(8, 2) => summary.lats.extend(undelta(dense.read_pbf_packed_sint64()?)),
						(9, 2) => summary.lons.extend(undelta(dense.read_pbf_packed_sint64()?)),
						(_, w) => dense.skip_pbf_field(w)?,
					}
				}
			}
			(3, 2) => summary.way_ids.push(read_element_id(reader.get_pbf_sub_reader()?.as_mut())?),
			(4, 2) => summary
				.relation_ids
				.push(read_element_id(reader.get_pbf_sub_reader()?.as_mut())?),
			(f, w) => bail!("unexpected field {f} (wire type {w}) in primitive group"),
		}
	}
	Ok(())
}

fn read_element_id(reader: &mut dyn ValueReader<'_, LE>) -> Result<i64> {
	let mut id = None;
	while reader.has_remaining() {
		match reader.read_pbf_key()? {
			(1, 0) => id = Some(reader.read_varint()? as i64),
			(_, w) => reader.skip_pbf_field(w)?,
		}
	}
	id.context("element without id")
}

fn undelta(deltas: Vec<i64>) -> Vec<i64> {
	let mut value = 0i64;
	deltas
		.into_iter()
		.map(|delta| {
			value = value.wrapping_add(delta);
			value
		})
		.collect()
}

/// What a decoded `HeaderBlock` contains.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeaderSummary {
	pub bbox: Option<[i64; 4]>,
	pub required_features: Vec<String>,
	pub optional_features: Vec<String>,
	pub writing_program: Option<String>,
	pub source: Option<String>,
}

pub fn read_header(payload: &Blob) -> Result<HeaderSummary> {
	let mut summary = HeaderSummary::default();
	let mut reader = ValueReaderSlice::new_le(payload.as_slice());
	while reader.has_remaining() {
		match reader.read_pbf_key()? {
			(1, 2) => {
				let mut bbox = [0i64; 4];
				let mut sub = reader.get_pbf_sub_reader()?;
				while sub.has_remaining() {
					match sub.read_pbf_key()? {
						(f @ 1..=4, 0) => bbox[f as usize - 1] = sub.read_svarint()?,
						(_, w) => sub.skip_pbf_field(w)?,
					}
				}
				summary.bbox = Some(bbox);
			}
			(4, 2) => summary.required_features.push(reader.read_pbf_string()?),
			(5, 2) => summary.optional_features.push(reader.read_pbf_string()?),
			(16, 2) => summary.writing_program = Some(reader.read_pbf_string()?),
			(17, 2) => summary.source = Some(reader.read_pbf_string()?),
			(_, w) => reader.skip_pbf_field(w)?,
		}
	}
	Ok(summary)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::osm::{Node, PrimitiveBlock, Way};

	#[test]
	fn read_block_recovers_ids_and_coordinates() -> Result<()> {
		let block = PrimitiveBlock::from_nodes(&[Node::new(5, 1.0, -1.0), Node::new(3, 0.5, 0.0)])?;
		let summary = read_block(&block.to_blob()?)?;
		assert_eq!(summary.node_ids, vec![5, 3]);
		assert_eq!(summary.lats, vec![10_000_000, 5_000_000]);
		assert_eq!(summary.lons, vec![-10_000_000, 0]);
		assert_eq!(summary.strings, vec![String::new()]);
		assert_eq!(summary.len(), 2);

		let block = PrimitiveBlock::from_ways(&[Way::new(-7, vec![1])])?;
		assert_eq!(read_block(&block.to_blob()?)?.way_ids, vec![-7]);
		Ok(())
	}

	#[test]
	fn failing_sink_counts_successful_appends() -> Result<()> {
		let mut sink = FailingSink::after(2);
		sink.append(&Blob::from("ab"))?;
		sink.append(&Blob::from("c"))?;
		assert!(sink.append(&Blob::from("d")).is_err());
		assert_eq!(sink.written(), 3);
		Ok(())
	}

	#[test]
	fn shared_sink_clones_share_content() -> Result<()> {
		let sink = SharedSink::new();
		let mut clone = sink.clone();
		clone.append(&Blob::from("abc"))?;
		clone.close()?;
		assert_eq!(sink.snapshot(), b"abc".to_vec());
		assert!(sink.is_closed());
		assert!(clone.append(&Blob::from("d")).is_err());
		Ok(())
	}
}
