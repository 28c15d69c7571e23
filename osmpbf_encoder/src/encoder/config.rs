use crate::osm::HeaderBlock;
use anyhow::{Context, Result, ensure};
use osmpbf_core::GeoBBox;
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

/// Default maximum number of elements per primitive block.
pub const DEFAULT_BLOCK_SIZE: usize = 8000;

/// Construction-time settings of a [`PbfEncoder`](super::PbfEncoder).
///
/// ```yaml
/// required_features: [OsmSchema-V0.6, DenseNodes]
/// optional_features: [Sort.Type_then_ID]
/// writing_program: my-tool
/// bbox: [13.0, 52.3, 13.8, 52.7]
/// compression: true
/// block_size: 8000
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EncoderConfig {
	/// Features a reader must understand to parse the file. Must not be empty.
	pub required_features: Vec<String>,

	#[serde(default)]
	pub optional_features: Vec<String>,

	/// Written into the header as `writingprogram`.
	#[serde(default)]
	pub writing_program: Option<String>,

	#[serde(default)]
	pub source: Option<String>,

	/// `[west, south, east, north]` in degrees.
	#[serde(default)]
	pub bbox: Option<[f64; 4]>,

	/// Compress every blob with zlib.
	#[serde(default = "default_compression")]
	pub compression: bool,

	/// Maximum number of elements per block.
	#[serde(default = "default_block_size")]
	pub block_size: usize,
}

fn default_compression() -> bool {
	true
}

fn default_block_size() -> usize {
	DEFAULT_BLOCK_SIZE
}

impl EncoderConfig {
	pub fn new(required_features: &[&str]) -> EncoderConfig {
		EncoderConfig {
			required_features: required_features.iter().map(|s| (*s).to_string()).collect(),
			optional_features: vec![],
			writing_program: None,
			source: None,
			bbox: None,
			compression: default_compression(),
			block_size: default_block_size(),
		}
	}

	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		let config: EncoderConfig = serde_yaml_ng::from_reader(reader)?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		let config: EncoderConfig = serde_yaml_ng::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("Failed to open config file {path:?}"))?;
		EncoderConfig::from_reader(BufReader::new(file)).with_context(|| format!("Failed to parse config file {path:?}"))
	}

	pub fn validate(&self) -> Result<()> {
		ensure!(!self.required_features.is_empty(), "required_features must not be empty");
		ensure!(self.block_size > 0, "block_size must be greater than 0");
		self.geo_bbox()?;
		Ok(())
	}

	pub fn geo_bbox(&self) -> Result<Option<GeoBBox>> {
		self
			.bbox
			.map(|bbox| GeoBBox::try_from(bbox).context("invalid bbox"))
			.transpose()
	}

	/// The file header this configuration describes.
	pub fn header_block(&self) -> Result<HeaderBlock> {
		Ok(HeaderBlock {
			bbox: self.geo_bbox()?,
			required_features: self.required_features.clone(),
			optional_features: self.optional_features.clone(),
			writing_program: self.writing_program.clone(),
			source: self.source.clone(),
		})
	}
}
