//! The `HeaderBlock` message, the payload of the single `OSMHeader` blob at the start of a file.
//!
//! Field layout:
//!  * field 1: `bbox` (HeaderBBox: `left = 1`, `right = 2`, `top = 3`, `bottom = 4`, sint64 nanodegrees)
//!  * field 4: repeated `required_features`
//!  * field 5: repeated `optional_features`
//!  * field 16: `writingprogram`
//!  * field 17: `source`

use anyhow::{Context, Result};
use byteorder::LE;
use osmpbf_core::{
	Blob, GeoBBox,
	io::{PBF_LENGTH_DELIMITED, PBF_VARINT, ValueWriter, ValueWriterBlob},
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeaderBlock {
	pub bbox: Option<GeoBBox>,
	pub required_features: Vec<String>,
	pub optional_features: Vec<String>,
	pub writing_program: Option<String>,
	pub source: Option<String>,
}

impl HeaderBlock {
	pub fn new(required_features: &[&str]) -> HeaderBlock {
		HeaderBlock {
			required_features: required_features.iter().map(|s| (*s).to_string()).collect(),
			..Default::default()
		}
	}

	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::<LE>::new();

		if let Some(bbox) = &self.bbox {
			writer
				.write_pbf_key(1, PBF_LENGTH_DELIMITED)
				.context("Failed to write PBF key for bbox")?;
			writer
				.write_pbf_blob(&bbox_to_blob(bbox)?)
				.context("Failed to write bbox")?;
		}

		for feature in &self.required_features {
			writer.write_pbf_key(4, PBF_LENGTH_DELIMITED)?;
			writer
				.write_pbf_string(feature)
				.with_context(|| format!("Failed to write required feature '{feature}'"))?;
		}

		for feature in &self.optional_features {
			writer.write_pbf_key(5, PBF_LENGTH_DELIMITED)?;
			writer
				.write_pbf_string(feature)
				.with_context(|| format!("Failed to write optional feature '{feature}'"))?;
		}

		if let Some(program) = &self.writing_program {
			writer.write_pbf_key(16, PBF_LENGTH_DELIMITED)?;
			writer
				.write_pbf_string(program)
				.context("Failed to write writing program")?;
		}

		if let Some(source) = &self.source {
			writer.write_pbf_key(17, PBF_LENGTH_DELIMITED)?;
			writer.write_pbf_string(source).context("Failed to write source")?;
		}

		Ok(writer.into_blob())
	}
}

fn bbox_to_blob(bbox: &GeoBBox) -> Result<Blob> {
	let mut writer = ValueWriterBlob::<LE>::new();
	for (field, value) in (1..=4).zip(bbox.to_nanodegrees()) {
		writer.write_pbf_key(field, PBF_VARINT)?;
		writer
			.write_svarint(value)
			.with_context(|| format!("Failed to write bbox field {field}"))?;
	}
	Ok(writer.into_blob())
}
