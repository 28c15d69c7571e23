//! This module defines the `ValueWriter` trait for writing integers, byte slices and Protocol Buffers
//! fields to a destination.
//!
//! # Overview
//!
//! Implementations only provide the underlying [`std::io::Write`] and the current position; all
//! encoding helpers are default methods. Fixed-width integers honour the byte order `E`, varints and
//! protobuf fields are byte order independent.
//!
//! # Examples
//!
//! ```rust
//! use osmpbf_core::io::{ValueWriter, ValueWriterBlob};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let mut writer = ValueWriterBlob::new_le();
//!     writer.write_varint(300)?;
//!     assert_eq!(writer.into_blob().into_vec(), vec![0b10101100, 0b00000010]);
//!     Ok(())
//! }
//! ```

use super::ValueWriterBlob;
use crate::Blob;
use anyhow::{Context, Result};
use byteorder::{ByteOrder, WriteBytesExt};
use std::io::Write;

/// Protobuf wire type for varint encoded scalars.
pub const PBF_VARINT: u8 = 0;
/// Protobuf wire type for length-delimited fields (strings, bytes, messages, packed arrays).
pub const PBF_LENGTH_DELIMITED: u8 = 2;

/// A trait for writing values to various destinations with support for different byte orders.
pub trait ValueWriter<E: ByteOrder> {
	/// Returns a mutable reference to the underlying writer.
	fn get_writer(&mut self) -> &mut dyn Write;

	/// Returns the current write position.
	fn position(&mut self) -> Result<u64>;

	/// Returns `true` if nothing has been written yet.
	fn is_empty(&mut self) -> Result<bool> {
		Ok(self.position()? == 0)
	}

	/// Writes an unsigned variable-length integer (varint).
	fn write_varint(&mut self, mut value: u64) -> Result<()> {
		while value >= 0x80 {
			self.get_writer().write_all(&[((value & 0x7F) as u8) | 0x80])?;
			value >>= 7;
		}
		self.get_writer().write_all(&[value as u8])?;
		Ok(())
	}

	/// Writes a signed variable-length integer (zigzag-encoded varint).
	fn write_svarint(&mut self, value: i64) -> Result<()> {
		self.write_varint(((value << 1) ^ (value >> 63)) as u64)
	}

	/// Writes a protobuf `int32`/`int64`: negative values are sign extended to ten bytes.
	fn write_ivarint(&mut self, value: i64) -> Result<()> {
		self.write_varint(value as u64)
	}

	/// Writes an 8-bit unsigned integer.
	fn write_u8(&mut self, value: u8) -> Result<()> {
		Ok(self.get_writer().write_u8(value)?)
	}

	/// Writes a 32-bit unsigned integer using the byte order `E`.
	fn write_u32(&mut self, value: u32) -> Result<()> {
		Ok(self.get_writer().write_u32::<E>(value)?)
	}

	/// Writes the contents of a [`Blob`].
	fn write_blob(&mut self, blob: &Blob) -> Result<()> {
		self.get_writer().write_all(blob.as_slice())?;
		Ok(())
	}

	/// Writes a slice of bytes.
	fn write_slice(&mut self, buf: &[u8]) -> Result<()> {
		self.get_writer().write_all(buf)?;
		Ok(())
	}

	/// Writes a UTF-8 string as bytes, without a length prefix.
	fn write_string(&mut self, text: &str) -> Result<()> {
		self.get_writer().write_all(text.as_bytes())?;
		Ok(())
	}

	/// Writes a protobuf field key (field number and wire type) as a varint.
	fn write_pbf_key(&mut self, field_number: u32, wire_type: u8) -> Result<()> {
		self
			.write_varint((u64::from(field_number) << 3) | u64::from(wire_type))
			.context("Failed to write PBF key")
	}

	/// Writes a protobuf length-delimited blob.
	fn write_pbf_blob(&mut self, blob: &Blob) -> Result<()> {
		self
			.write_varint(blob.len())
			.context("Failed to write varint for blob length")?;
		self.write_blob(blob).context("Failed to write PBF blob")
	}

	/// Writes a protobuf length-delimited UTF-8 string.
	fn write_pbf_string(&mut self, text: &str) -> Result<()> {
		self
			.write_varint(text.len() as u64)
			.context("Failed to write varint for string length")?;
		self.write_string(text).context("Failed to write PBF string")
	}

	/// Writes a packed repeated `uint32` field body.
	fn write_pbf_packed_uint32(&mut self, data: &[u32]) -> Result<()> {
		let mut writer = ValueWriterBlob::new_le();
		for &value in data {
			writer
				.write_varint(u64::from(value))
				.context("Failed to write varint for packed uint32")?;
		}
		self
			.write_pbf_blob(&writer.into_blob())
			.context("Failed to write packed uint32 blob")
	}

	/// Writes a packed repeated `int32` field body.
	fn write_pbf_packed_int32(&mut self, data: &[i32]) -> Result<()> {
		let mut writer = ValueWriterBlob::new_le();
		for &value in data {
			writer
				.write_ivarint(i64::from(value))
				.context("Failed to write varint for packed int32")?;
		}
		self
			.write_pbf_blob(&writer.into_blob())
			.context("Failed to write packed int32 blob")
	}

	/// Writes a packed repeated `sint64` field body.
	fn write_pbf_packed_sint64(&mut self, data: &[i64]) -> Result<()> {
		let mut writer = ValueWriterBlob::new_le();
		for &value in data {
			writer
				.write_svarint(value)
				.context("Failed to write svarint for packed sint64")?;
		}
		self
			.write_pbf_blob(&writer.into_blob())
			.context("Failed to write packed sint64 blob")
	}

	/// Writes a packed repeated `sint64` field body, storing each value as the difference to its predecessor.
	fn write_pbf_packed_sint64_delta(&mut self, data: &[i64]) -> Result<()> {
		let mut previous = 0i64;
		let deltas: Vec<i64> = data
			.iter()
			.map(|&value| {
				let delta = value.wrapping_sub(previous);
				previous = value;
				delta
			})
			.collect();
		self.write_pbf_packed_sint64(&deltas)
	}

	/// Writes a packed repeated `bool` field body.
	fn write_pbf_packed_bool(&mut self, data: &[bool]) -> Result<()> {
		let bytes: Vec<u8> = data.iter().map(|&value| u8::from(value)).collect();
		self
			.write_pbf_blob(&Blob::from(bytes))
			.context("Failed to write packed bool blob")
	}
}
