//! The lifecycle controller of the encoding pipeline.
//!
//! ```text
//! append_nodes     ─► node aggregator     ─┐
//! append_ways      ─► way aggregator      ─┼─► block writer ─► framer ─► sink
//! append_relations ─► relation aggregator ─┘
//! ```
//!
//! The file header is written on the caller's thread by [`PbfEncoder::start`] before any stage
//! exists, so it always comes first in the output. Errors of the running stages arrive on the
//! channel returned by `start`.

use super::{Aggregator, BlockWriter, Category, CategoryMessage, EncoderConfig, WriterMessage};
use crate::{
	format::{BlobFramer, BlobType},
	osm::{Batch, NodeBatch, RelationBatch, WayBatch},
};
use anyhow::{Context, Result, anyhow, bail, ensure};
use futures::future::join_all;
use osmpbf_core::io::DataWriterTrait;
use parking_lot::Mutex;
use tokio::{
	runtime::Handle,
	sync::{mpsc, oneshot},
	task::JoinHandle,
};

/// Receives the errors the background stages report.
pub type ErrorReceiver = mpsc::UnboundedReceiver<anyhow::Error>;

struct Inputs {
	nodes: mpsc::Sender<CategoryMessage<NodeBatch>>,
	ways: mpsc::Sender<CategoryMessage<WayBatch>>,
	relations: mpsc::Sender<CategoryMessage<RelationBatch>>,
}

enum EncoderState<W> {
	Created(W),
	Started {
		inputs: Inputs,
		aggregators: Vec<JoinHandle<()>>,
		writer: JoinHandle<W>,
		errors: mpsc::UnboundedSender<anyhow::Error>,
	},
	Draining,
	/// `None` if the block writer died and took the sink with it, or if closing was abandoned.
	Closed(Option<W>),
}

/// Marks the encoder as closed without a sink unless [`CloseGuard::finish`] is reached, so a
/// `close` future dropped half way does not leave the encoder draining forever.
struct CloseGuard<'a, W> {
	state: &'a Mutex<EncoderState<W>>,
	finished: bool,
}

impl<W> CloseGuard<'_, W> {
	fn finish(mut self, sink: Option<W>) {
		self.finished = true;
		*self.state.lock() = EncoderState::Closed(sink);
	}
}

impl<W> Drop for CloseGuard<'_, W> {
	fn drop(&mut self) {
		if !self.finished {
			log::warn!("close was cancelled, the output sink is left unclosed");
			*self.state.lock() = EncoderState::Closed(None);
		}
	}
}

impl<W> EncoderState<W> {
	fn name(&self) -> &'static str {
		match self {
			EncoderState::Created(_) => "created",
			EncoderState::Started { .. } => "started",
			EncoderState::Draining => "draining",
			EncoderState::Closed(_) => "closed",
		}
	}
}

/// Streaming OSM PBF encoder.
///
/// All methods take `&self`, so producers may share the encoder through an `Arc`.
pub struct PbfEncoder<W: DataWriterTrait + 'static> {
	config: EncoderConfig,
	framer: BlobFramer,
	state: Mutex<EncoderState<W>>,
}

impl<W: DataWriterTrait + 'static> PbfEncoder<W> {
	pub fn new(sink: W, config: EncoderConfig) -> Result<PbfEncoder<W>> {
		config.validate().context("invalid encoder config")?;
		Ok(PbfEncoder {
			framer: BlobFramer::new(config.compression),
			config,
			state: Mutex::new(EncoderState::Created(sink)),
		})
	}

	pub fn config(&self) -> &EncoderConfig {
		&self.config
	}

	/// Writes the file header and starts the aggregators and the block writer.
	///
	/// Must be called from within a tokio runtime. If the header cannot be written nothing is started
	/// and the encoder stays in its initial state.
	pub fn start(&self) -> Result<ErrorReceiver> {
		let runtime = Handle::try_current().context("the encoder must be started inside a tokio runtime")?;

		let mut state = self.state.lock();
		let mut sink = match std::mem::replace(&mut *state, EncoderState::Draining) {
			EncoderState::Created(sink) => sink,
			other => {
				let name = other.name();
				*state = other;
				bail!("cannot start an encoder that is already {name}");
			}
		};

		if let Err(err) = self.write_header(&mut sink) {
			*state = EncoderState::Created(sink);
			return Err(err);
		}

		let (error_tx, error_rx) = mpsc::unbounded_channel();
		let (block_tx, block_rx) = mpsc::channel::<WriterMessage>(1);

		let block_writer = BlockWriter::new(self.framer, sink, error_tx.clone());
		let writer = runtime.spawn_blocking(move || block_writer.run(block_rx));

		let threshold = self.config.block_size;
		let (nodes, node_rx) = mpsc::channel(1);
		let (ways, way_rx) = mpsc::channel(1);
		let (relations, relation_rx) = mpsc::channel(1);
		let aggregators = vec![
			runtime.spawn(
				Aggregator::<NodeBatch>::new(Category::Node, threshold, block_tx.clone(), error_tx.clone()).run(node_rx),
			),
			runtime.spawn(
				Aggregator::<WayBatch>::new(Category::Way, threshold, block_tx.clone(), error_tx.clone()).run(way_rx),
			),
			runtime.spawn(
				Aggregator::<RelationBatch>::new(Category::Relation, threshold, block_tx, error_tx.clone()).run(relation_rx),
			),
		];

		*state = EncoderState::Started {
			inputs: Inputs { nodes, ways, relations },
			aggregators,
			writer,
			errors: error_tx,
		};
		log::debug!("encoder started with block size {threshold}");
		Ok(error_rx)
	}

	fn write_header(&self, sink: &mut W) -> Result<()> {
		let header = self
			.config
			.header_block()?
			.to_blob()
			.context("marshal file header")?;
		self
			.framer
			.encode_block(sink, &header, BlobType::OsmHeader)
			.context("encode blob header")
	}

	/// Queues a batch of nodes. Waits while the node aggregator is still busy with the previous one.
	pub async fn append_nodes(&self, batch: NodeBatch) -> Result<()> {
		let input = self.input(|inputs| inputs.nodes.clone());
		Self::send(Category::Node, input, CategoryMessage::Append(batch)).await
	}

	pub async fn append_ways(&self, batch: WayBatch) -> Result<()> {
		let input = self.input(|inputs| inputs.ways.clone());
		Self::send(Category::Way, input, CategoryMessage::Append(batch)).await
	}

	pub async fn append_relations(&self, batch: RelationBatch) -> Result<()> {
		let input = self.input(|inputs| inputs.relations.clone());
		Self::send(Category::Relation, input, CategoryMessage::Append(batch)).await
	}

	/// Writes everything appended to `category` so far and returns once it is on the sink.
	///
	/// Outside of the started state this only logs a warning.
	pub async fn flush(&self, category: Category) {
		let (done, acknowledged) = oneshot::channel();
		let sent = match category {
			Category::Node => {
				let input = self.input(|inputs| inputs.nodes.clone());
				Self::send(category, input, CategoryMessage::Flush(done)).await
			}
			Category::Way => {
				let input = self.input(|inputs| inputs.ways.clone());
				Self::send(category, input, CategoryMessage::Flush(done)).await
			}
			Category::Relation => {
				let input = self.input(|inputs| inputs.relations.clone());
				Self::send(category, input, CategoryMessage::Flush(done)).await
			}
		};

		// a failed send has already been logged
		if sent.is_ok() && acknowledged.await.is_err() {
			log::warn!("flush of {category} was not acknowledged");
		}
	}

	fn input<B: Batch>(
		&self,
		pick: impl FnOnce(&Inputs) -> mpsc::Sender<CategoryMessage<B>>,
	) -> Option<mpsc::Sender<CategoryMessage<B>>> {
		match &*self.state.lock() {
			EncoderState::Started { inputs, .. } => Some(pick(inputs)),
			_ => None,
		}
	}

	async fn send<B: Batch>(
		category: Category,
		input: Option<mpsc::Sender<CategoryMessage<B>>>,
		message: CategoryMessage<B>,
	) -> Result<()> {
		let Some(input) = input else {
			log::warn!("{category}: the encoder is not running");
			bail!("cannot send to {category}: the encoder is not running");
		};
		input
			.send(message)
			.await
			.map_err(|_| anyhow!("cannot send to {category}: the aggregator has stopped"))
	}

	/// Drains every stage in order and closes the sink.
	///
	/// Closing the inputs lets each aggregator flush and finish; once all three are done the block
	/// writer sees its queue close, writes what is left and hands the sink back. Closing twice only
	/// logs a warning.
	///
	/// If the returned future is dropped before it completes, the stages keep draining in the
	/// background but the sink is never closed: the encoder ends up closed without a sink, a later
	/// `close` fails and [`PbfEncoder::into_sink`] returns `None`.
	pub async fn close(&self) -> Result<()> {
		let previous = std::mem::replace(&mut *self.state.lock(), EncoderState::Draining);

		match previous {
			EncoderState::Created(mut sink) => {
				log::debug!("closing an encoder that was never started");
				let result = sink.close().context("close output sink");
				*self.state.lock() = EncoderState::Closed(Some(sink));
				result
			}
			EncoderState::Started {
				inputs,
				aggregators,
				writer,
				errors,
			} => {
				let guard = CloseGuard {
					state: &self.state,
					finished: false,
				};
				drop(inputs);
				for result in join_all(aggregators).await {
					if let Err(err) = result {
						log::error!("aggregator task failed: {err}");
					}
				}

				let mut sink = match writer.await {
					Ok(sink) => Some(sink),
					Err(err) => {
						log::error!("block writer task failed: {err}");
						None
					}
				};
				drop(errors);

				let result = match sink.as_mut() {
					Some(sink) => sink.close().context("close output sink"),
					None => Err(anyhow!("the output sink was lost with the block writer")),
				};
				guard.finish(sink);
				log::debug!("encoder closed");
				result
			}
			EncoderState::Draining => {
				log::warn!("close called while the encoder is already closing");
				Ok(())
			}
			EncoderState::Closed(sink) => {
				log::warn!("close called on an encoder that is already closed");
				let lost = sink.is_none();
				*self.state.lock() = EncoderState::Closed(sink);
				ensure!(!lost, "the output sink was lost while closing");
				Ok(())
			}
		}
	}

	/// Hands back the sink of an encoder that was never started or has been closed.
	pub fn into_sink(self) -> Option<W> {
		match self.state.into_inner() {
			EncoderState::Created(sink) => Some(sink),
			EncoderState::Closed(sink) => sink,
			_ => None,
		}
	}
}
