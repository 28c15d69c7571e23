use crate::{
	format::{BlobFramer, BlobType},
	osm::PrimitiveBlock,
};
use anyhow::{Context, Result};
use osmpbf_core::io::DataWriterTrait;
use tokio::sync::{mpsc, oneshot};

/// What the aggregators send to the block writer.
#[derive(Debug)]
pub enum WriterMessage {
	Block(PrimitiveBlock),
	/// Acknowledged once every message queued before it has been handled.
	Barrier(oneshot::Sender<()>),
}

/// The single stage that owns the sink while the pipeline runs.
pub struct BlockWriter<W: DataWriterTrait> {
	framer: BlobFramer,
	sink: W,
	errors: mpsc::UnboundedSender<anyhow::Error>,
}

impl<W: DataWriterTrait> BlockWriter<W> {
	pub fn new(framer: BlobFramer, sink: W, errors: mpsc::UnboundedSender<anyhow::Error>) -> BlockWriter<W> {
		BlockWriter { framer, sink, errors }
	}

	/// Drains `messages` in arrival order until every sender is gone, then returns the sink.
	///
	/// Blocks the current thread, so it must run on a blocking task. Failures are reported on the error
	/// channel and do not stop the loop.
	pub fn run(mut self, mut messages: mpsc::Receiver<WriterMessage>) -> W {
		let mut written = 0u64;
		while let Some(message) = messages.blocking_recv() {
			match message {
				WriterMessage::Block(block) => match self.write_block(&block) {
					Ok(()) => written += 1,
					Err(err) => {
						if let Err(err) = self.errors.send(err) {
							log::error!("{:#}", err.0);
						}
					}
				},
				WriterMessage::Barrier(done) => {
					let _ = done.send(());
				}
			}
		}
		log::debug!("block writer finished after {written} blocks");
		self.sink
	}

	pub fn write_block(&mut self, block: &PrimitiveBlock) -> Result<()> {
		let payload = block.to_blob().context("marshal blob data")?;
		self
			.framer
			.encode_block(&mut self.sink, &payload, BlobType::OsmData)
			.context("encode data block")
	}
}
