use anyhow::{Context, Result, ensure};
use osmpbf::opl::{OplElement, parse_line};
use osmpbf_core::io::DataWriterFile;
use osmpbf_encoder::{
	Category, EncoderConfig, ErrorReceiver, PbfEncoder,
	osm::{Batch, NodeBatch, RelationBatch, WayBatch},
};
use std::{
	fs::File,
	io::{BufRead, BufReader},
	path::{Path, PathBuf},
};

/// Number of elements handed to the encoder at once.
const CHUNK_SIZE: usize = 1000;

const DEFAULT_REQUIRED_FEATURES: [&str; 2] = ["OsmSchema-V0.6", "DenseNodes"];

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// OPL text file, one element per line
	#[arg()]
	input_file: PathBuf,

	/// output file, usually *.osm.pbf
	#[arg()]
	output_file: PathBuf,

	/// YAML file with the encoder settings
	#[arg(long, short, value_name = "FILE", display_order = 1)]
	config: Option<PathBuf>,

	/// store blobs uncompressed
	#[arg(long, display_order = 2)]
	no_compression: bool,

	/// maximum number of elements per block
	#[arg(long, value_name = "int", display_order = 2)]
	block_size: Option<usize>,

	/// name written into the file header
	#[arg(long, value_name = "NAME", display_order = 3)]
	writing_program: Option<String>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	eprintln!("convert from {:?} to {:?}", arguments.input_file, arguments.output_file);

	let config = get_config(arguments)?;
	let output = std::path::absolute(&arguments.output_file)?;
	let encoder = PbfEncoder::new(DataWriterFile::from_path(&output)?, config)?;
	let errors = tokio::spawn(log_errors(encoder.start()?));

	let result = encode_file(&encoder, &arguments.input_file).await;
	let closed = encoder.close().await;
	let error_count = errors.await?;

	result?;
	closed?;
	ensure!(error_count == 0, "{error_count} errors occurred while encoding");

	eprintln!("finished converting");
	Ok(())
}

fn get_config(arguments: &Subcommand) -> Result<EncoderConfig> {
	let mut config = match &arguments.config {
		Some(path) => EncoderConfig::from_path(path)?,
		None => {
			let mut config = EncoderConfig::new(&DEFAULT_REQUIRED_FEATURES);
			config.writing_program = Some(concat!("osmpbf ", env!("CARGO_PKG_VERSION")).to_string());
			config
		}
	};

	if arguments.no_compression {
		config.compression = false;
	}
	if let Some(block_size) = arguments.block_size {
		config.block_size = block_size;
	}
	if let Some(writing_program) = &arguments.writing_program {
		config.writing_program = Some(writing_program.clone());
	}
	Ok(config)
}

async fn log_errors(mut errors: ErrorReceiver) -> usize {
	let mut count = 0;
	while let Some(err) = errors.recv().await {
		log::error!("{err:#}");
		count += 1;
	}
	count
}

/// Elements of the same category read since the last hand-over.
enum Pending {
	Nodes(NodeBatch),
	Ways(WayBatch),
	Relations(RelationBatch),
}

impl Pending {
	fn new(element: OplElement) -> Pending {
		match element {
			OplElement::Node(node) => Pending::Nodes(NodeBatch::from(node)),
			OplElement::Way(way) => Pending::Ways(WayBatch::from(way)),
			OplElement::Relation(relation) => Pending::Relations(RelationBatch::from(relation)),
		}
	}

	fn category(&self) -> Category {
		match self {
			Pending::Nodes(_) => Category::Node,
			Pending::Ways(_) => Category::Way,
			Pending::Relations(_) => Category::Relation,
		}
	}

	fn len(&self) -> usize {
		match self {
			Pending::Nodes(batch) => batch.len(),
			Pending::Ways(batch) => batch.len(),
			Pending::Relations(batch) => batch.len(),
		}
	}

	/// Adds `element` if it has the same category and hands it back otherwise.
	fn push(&mut self, element: OplElement) -> Option<OplElement> {
		match (self, element) {
			(Pending::Nodes(batch), OplElement::Node(node)) => batch.push(node),
			(Pending::Ways(batch), OplElement::Way(way)) => batch.push(way),
			(Pending::Relations(batch), OplElement::Relation(relation)) => batch.push(relation),
			(_, element) => return Some(element),
		}
		None
	}

	async fn submit(self, encoder: &PbfEncoder<DataWriterFile>) -> Result<()> {
		match self {
			Pending::Nodes(batch) => encoder.append_nodes(batch).await,
			Pending::Ways(batch) => encoder.append_ways(batch).await,
			Pending::Relations(batch) => encoder.append_relations(batch).await,
		}
	}
}

/// Streams the elements of `path` into the encoder.
///
/// Whenever the category changes, the previous one is flushed, so a sorted input produces all node
/// blocks before the first way block.
async fn encode_file(encoder: &PbfEncoder<DataWriterFile>, path: &Path) -> Result<()> {
	let file = File::open(path).with_context(|| format!("Failed to open input file {path:?}"))?;
	let reader = BufReader::new(file);

	let mut pending: Option<Pending> = None;
	let mut element_count = 0u64;

	for (index, line) in reader.lines().enumerate() {
		let line = line.with_context(|| format!("Failed to read line {} of {path:?}", index + 1))?;
		let element = parse_line(&line).with_context(|| format!("Failed to parse line {} of {path:?}", index + 1))?;
		let Some(element) = element else {
			continue;
		};
		element_count += 1;

		let rejected = match pending.as_mut() {
			Some(batch) => batch.push(element),
			None => Some(element),
		};

		if let Some(element) = rejected {
			if let Some(batch) = pending.take() {
				let category = batch.category();
				batch.submit(encoder).await?;
				encoder.flush(category).await;
			}
			pending = Some(Pending::new(element));
		} else if pending.as_ref().is_some_and(|batch| batch.len() >= CHUNK_SIZE) {
			if let Some(batch) = pending.take() {
				batch.submit(encoder).await?;
			}
		}
	}

	if let Some(batch) = pending {
		batch.submit(encoder).await?;
	}

	log::debug!("read {element_count} elements from {path:?}");
	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::tests::run_command;
	use anyhow::Result;
	use std::fs;
	use tempfile::tempdir;

	const OPL: &str = "\
# a small extract
n1 v1 dV c1 t2020-01-01T00:00:00Z i1 ualice Tamenity=cafe x13.4 y52.5
n2 x13.5 y52.6
n3 x13.6 y52.4

w10 v1 Thighway=residential Nn1,n2,n3
r20 v1 Ttype=route Mw10@forward,n1@stop
";

	fn contains(haystack: &[u8], needle: &[u8]) -> bool {
		haystack.windows(needle.len()).any(|window| window == needle)
	}

	#[test]
	fn convert_uncompressed() -> Result<()> {
		let dir = tempdir()?;
		let input = dir.path().join("input.opl");
		let output = dir.path().join("output.osm.pbf");
		fs::write(&input, OPL)?;

		run_command(vec![
			"osmpbf",
			"convert",
			"--no-compression",
			"--writing-program=test-suite",
			input.to_str().unwrap(),
			output.to_str().unwrap(),
		])?;

		let data = fs::read(&output)?;
		let header_len = u32::from_be_bytes(data[0..4].try_into()?) as usize;
		assert!(header_len > 0 && header_len < 64 * 1024);
		assert!(contains(&data[4..4 + header_len], b"OSMHeader"));
		assert!(contains(&data, b"OSMData"));
		assert!(contains(&data, b"OsmSchema-V0.6"));
		assert!(contains(&data, b"DenseNodes"));
		assert!(contains(&data, b"test-suite"));
		for tag in ["amenity", "cafe", "highway", "residential", "forward", "stop", "alice"] {
			assert!(contains(&data, tag.as_bytes()), "missing {tag}");
		}

		// nodes are flushed before the way arrives: the node block precedes the way block
		let cafe = data.windows(4).position(|w| w == b"cafe").unwrap();
		let highway = data.windows(7).position(|w| w == b"highway").unwrap();
		assert!(cafe < highway);
		Ok(())
	}

	#[test]
	fn convert_decodes_escaped_strings() -> Result<()> {
		let dir = tempdir()?;
		let input = dir.path().join("input.opl");
		let output = dir.path().join("output.osm.pbf");
		fs::write(
			&input,
			"n1 v1 uJo%20%Doe Tname=Caf%e9% x13.4 y52.5\nw2 Tname=Main%20%Street Nn1\nr3 Mw2@sub%2c%area\n",
		)?;

		run_command(vec![
			"osmpbf",
			"convert",
			"--no-compression",
			input.to_str().unwrap(),
			output.to_str().unwrap(),
		])?;

		let data = fs::read(&output)?;
		for text in ["Jo Doe", "Café", "Main Street", "sub,area"] {
			assert!(contains(&data, text.as_bytes()), "missing {text}");
		}
		assert!(!contains(&data, b"%20%"));
		assert!(!contains(&data, b"%2c%"));
		Ok(())
	}

	#[test]
	fn convert_compressed_with_config() -> Result<()> {
		let dir = tempdir()?;
		let input = dir.path().join("input.opl");
		let config = dir.path().join("config.yaml");
		let output = dir.path().join("output.osm.pbf");
		fs::write(&input, OPL)?;
		fs::write(
			&config,
			"required_features: [OsmSchema-V0.6]\nsource: unit test\nbbox: [13.0, 52.0, 14.0, 53.0]\nblock_size: 2\n",
		)?;

		run_command(vec![
			"osmpbf",
			"convert",
			"--config",
			config.to_str().unwrap(),
			input.to_str().unwrap(),
			output.to_str().unwrap(),
		])?;

		let data = fs::read(&output)?;
		// the blob headers stay readable, the block contents are zlib streams
		assert!(contains(&data, b"OSMHeader"));
		assert!(contains(&data, b"OSMData"));
		assert!(contains(&data, &[0x78, 0x9c]));
		Ok(())
	}

	#[test]
	fn convert_reports_the_broken_line() -> Result<()> {
		let dir = tempdir()?;
		let input = dir.path().join("input.opl");
		let output = dir.path().join("output.osm.pbf");
		fs::write(&input, "n1 x1 y1\nn2 q7\n")?;

		let err = run_command(vec![
			"osmpbf",
			"convert",
			input.to_str().unwrap(),
			output.to_str().unwrap(),
		])
		.unwrap_err();
		assert!(format!("{err:#}").contains("Failed to parse line 2"));
		Ok(())
	}

	#[test]
	fn convert_rejects_an_invalid_block_size() -> Result<()> {
		let dir = tempdir()?;
		let input = dir.path().join("input.opl");
		let output = dir.path().join("output.osm.pbf");
		fs::write(&input, OPL)?;

		let err = run_command(vec![
			"osmpbf",
			"convert",
			"--block-size=0",
			input.to_str().unwrap(),
			output.to_str().unwrap(),
		])
		.unwrap_err();
		assert!(format!("{err:#}").contains("block_size must be greater than 0"));
		Ok(())
	}

	#[test]
	fn convert_missing_input() -> Result<()> {
		let dir = tempdir()?;
		let output = dir.path().join("output.osm.pbf");
		let err = run_command(vec![
			"osmpbf",
			"convert",
			dir.path().join("missing.opl").to_str().unwrap(),
			output.to_str().unwrap(),
		])
		.unwrap_err();
		assert!(format!("{err:#}").contains("Failed to open input file"));
		Ok(())
	}
}
