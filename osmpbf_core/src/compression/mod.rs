//! zlib compression, the only codec a PBF `Blob` is written with.

use crate::Blob;
use anyhow::{Context, Result};
use flate2::bufread::{ZlibDecoder, ZlibEncoder};
use std::io::Read;

/// Compresses data using zlib (DEFLATE with zlib framing).
///
/// # Errors
///
/// * If the zlib compression process fails.
pub fn compress_zlib(blob: &Blob) -> Result<Blob> {
	let mut encoder = ZlibEncoder::new(blob.as_slice(), flate2::Compression::default());
	let mut compressed_data = Vec::new();
	encoder
		.read_to_end(&mut compressed_data)
		.context("Failed to compress data using zlib")?;
	Ok(Blob::from(compressed_data))
}

/// Decompresses zlib data.
///
/// # Errors
///
/// * If the input is not a valid zlib stream.
pub fn decompress_zlib(blob: &Blob) -> Result<Blob> {
	let mut decoder = ZlibDecoder::new(blob.as_slice());
	let mut decompressed_data = Vec::new();
	decoder
		.read_to_end(&mut decompressed_data)
		.context("Failed to decompress data using zlib")?;
	Ok(Blob::from(decompressed_data))
}
