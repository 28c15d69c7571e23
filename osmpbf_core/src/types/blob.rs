//! This module provides the [`Blob`] struct, a wrapper around [`Vec<u8>`] that carries marshalled
//! protobuf messages, compressed payloads and whole frames through the encoder.
//!
//! # Examples
//!
//! ```rust
//! use osmpbf_core::Blob;
//!
//! let vec = vec![0, 1, 2, 3, 4, 5, 6, 7];
//! let blob = Blob::from(&vec);
//! assert_eq!(blob.len(), 8);
//! assert_eq!(&blob.as_slice()[2..5], &[2, 3, 4]);
//! assert_eq!(blob.clone().into_vec(), vec);
//! ```

use std::fmt::Debug;

/// A simple wrapper around [`Vec<u8>`] that provides additional methods for working with byte data.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Blob(Vec<u8>);

impl Blob {
	/// Creates an empty `Blob`.
	#[must_use]
	pub fn new_empty() -> Blob {
		Blob(Vec::new())
	}

	/// Creates a `Blob` with the specified size, filled with zeros.
	#[must_use]
	pub fn new_sized(length: usize) -> Blob {
		Blob(vec![0u8; length])
	}

	/// Returns the bytes as an immutable slice.
	pub fn as_slice(&self) -> &[u8] {
		self.0.as_slice()
	}

	/// Returns the bytes as a mutable slice.
	pub fn as_mut_slice(&mut self) -> &mut [u8] {
		self.0.as_mut_slice()
	}

	/// Consumes the `Blob` and returns the underlying `Vec<u8>`.
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	/// Formats the bytes as space separated lowercase hex pairs.
	pub fn as_hex(&self) -> String {
		self
			.0
			.iter()
			.map(|byte| format!("{byte:02x}"))
			.collect::<Vec<String>>()
			.join(" ")
	}

	/// Returns the number of bytes.
	pub fn len(&self) -> u64 {
		self.0.len() as u64
	}

	/// Returns `true` if the `Blob` contains no bytes.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Vec<u8>> for Blob {
	fn from(item: Vec<u8>) -> Self {
		Blob(item)
	}
}

impl From<&Vec<u8>> for Blob {
	fn from(item: &Vec<u8>) -> Self {
		Blob(item.clone())
	}
}

impl From<&[u8]> for Blob {
	fn from(item: &[u8]) -> Self {
		Blob(item.to_vec())
	}
}

impl<const N: usize> From<&[u8; N]> for Blob {
	fn from(item: &[u8; N]) -> Self {
		Blob(item.to_vec())
	}
}

impl From<&str> for Blob {
	fn from(item: &str) -> Self {
		Blob(item.as_bytes().to_vec())
	}
}

impl From<String> for Blob {
	fn from(item: String) -> Self {
		Blob(item.into_bytes())
	}
}

impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		const PREVIEW: usize = 32;
		let preview = Blob::from(&self.0[..self.0.len().min(PREVIEW)]);
		if self.0.len() > PREVIEW {
			write!(f, "Blob({}): {} ...", self.0.len(), preview.as_hex())
		} else {
			write!(f, "Blob({}): {}", self.0.len(), preview.as_hex())
		}
	}
}
