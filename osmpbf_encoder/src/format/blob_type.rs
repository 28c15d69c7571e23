use anyhow::{Result, bail};
use std::fmt::Display;

/// Type tag of a `BlobHeader`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlobType {
	/// The file-level `HeaderBlock`, always the first blob.
	OsmHeader,
	/// A `PrimitiveBlock`.
	OsmData,
}

impl BlobType {
	pub fn as_str(&self) -> &'static str {
		match self {
			BlobType::OsmHeader => "OSMHeader",
			BlobType::OsmData => "OSMData",
		}
	}
}

impl TryFrom<&str> for BlobType {
	type Error = anyhow::Error;

	fn try_from(value: &str) -> Result<Self> {
		Ok(match value {
			"OSMHeader" => BlobType::OsmHeader,
			"OSMData" => BlobType::OsmData,
			_ => bail!("unknown blob type '{value}'"),
		})
	}
}

impl Display for BlobType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
