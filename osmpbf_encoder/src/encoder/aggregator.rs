use super::{Category, WriterMessage};
use crate::osm::Batch;
use anyhow::anyhow;
use tokio::sync::{mpsc, oneshot};

/// Input of one category stage. Appends and flush requests share a channel, so they are handled
/// strictly in the order they were sent.
#[derive(Debug)]
pub enum CategoryMessage<B> {
	Append(B),
	/// Acknowledged after everything appended before it has been written to the sink.
	Flush(oneshot::Sender<()>),
}

/// Buffers batches of one category and emits a block whenever the next batch would push the buffer
/// past `threshold`, on a flush request and when the input closes.
pub struct Aggregator<B: Batch> {
	category: Category,
	threshold: usize,
	buffer: Option<B>,
	blocks: mpsc::Sender<WriterMessage>,
	errors: mpsc::UnboundedSender<anyhow::Error>,
}

impl<B: Batch> Aggregator<B> {
	pub fn new(
		category: Category,
		threshold: usize,
		blocks: mpsc::Sender<WriterMessage>,
		errors: mpsc::UnboundedSender<anyhow::Error>,
	) -> Aggregator<B> {
		Aggregator {
			category,
			threshold,
			buffer: None,
			blocks,
			errors,
		}
	}

	/// Event loop. Returns once `input` is closed and the remaining buffer has been flushed.
	pub async fn run(mut self, mut input: mpsc::Receiver<CategoryMessage<B>>) {
		log::debug!("{} aggregator started", self.category);

		while let Some(message) = input.recv().await {
			match message {
				CategoryMessage::Append(batch) => self.append(batch).await,
				CategoryMessage::Flush(done) => {
					self.flush().await;
					// the writer acknowledges once the flushed block is on the sink
					if self.blocks.send(WriterMessage::Barrier(done)).await.is_err() {
						log::warn!("{}: block writer has stopped, flush cannot be confirmed", self.category);
					}
				}
			}
		}

		self.flush().await;
		log::debug!("{} aggregator finished", self.category);
	}

	async fn append(&mut self, batch: B) {
		let Some(buffer) = self.buffer.as_ref() else {
			self.buffer = Some(batch);
			return;
		};

		if buffer.len() + batch.len() > self.threshold {
			self.flush().await;
		}

		if let Some(buffer) = self.buffer.as_mut() {
			buffer.merge(batch);
		}
	}

	/// Converts the buffer into a block and hands it to the writer.
	///
	/// On failure the buffer is kept as it is, so the same elements are tried again on the next
	/// flush trigger.
	async fn flush(&mut self) {
		let Some(buffer) = self.buffer.as_mut() else {
			return;
		};
		if buffer.is_empty() {
			return;
		}

		let count = buffer.len();
		let block = match buffer.to_block() {
			Ok(block) => block,
			Err(err) => {
				report(&self.errors, self.category, err);
				return;
			}
		};

		if self.blocks.send(WriterMessage::Block(block)).await.is_err() {
			report(&self.errors, self.category, anyhow!("block writer has stopped"));
			return;
		}

		buffer.clear();
		log::trace!("{}: flushed {count} elements", self.category);
	}
}

fn report(errors: &mpsc::UnboundedSender<anyhow::Error>, category: Category, err: anyhow::Error) {
	if let Err(err) = errors.send(err.context(format!("flush {category}"))) {
		log::error!("{:#}", err.0);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::osm::{Node, NodeBatch, PrimitiveBlock};
	use anyhow::{Result, bail};

	/// Collects what the aggregator sends to the writer, acknowledging barriers immediately.
	async fn collect(mut rx: mpsc::Receiver<WriterMessage>) -> Vec<usize> {
		let mut sizes = vec![];
		while let Some(message) = rx.recv().await {
			match message {
				WriterMessage::Block(block) => sizes.push(block.len()),
				WriterMessage::Barrier(done) => {
					let _ = done.send(());
				}
			}
		}
		sizes
	}

	fn start<B: Batch>(
		threshold: usize,
	) -> (
		mpsc::Sender<CategoryMessage<B>>,
		tokio::task::JoinHandle<Vec<usize>>,
		mpsc::UnboundedReceiver<anyhow::Error>,
	) {
		let (input_tx, input_rx) = mpsc::channel(1);
		let (block_tx, block_rx) = mpsc::channel(1);
		let (error_tx, error_rx) = mpsc::unbounded_channel();
		let aggregator = Aggregator::<B>::new(Category::Node, threshold, block_tx, error_tx);
		tokio::spawn(aggregator.run(input_rx));
		(input_tx, tokio::spawn(collect(block_rx)), error_rx)
	}

	fn nodes(ids: std::ops::Range<i64>) -> NodeBatch {
		NodeBatch::from(ids.map(|id| Node::new(id, 0.0, 0.0)).collect::<Vec<_>>())
	}

	#[tokio::test]
	async fn splits_at_the_threshold() -> Result<()> {
		let (input, blocks, _errors) = start::<NodeBatch>(8000);
		for id in 0..8001 {
			input.send(CategoryMessage::Append(nodes(id..id + 1))).await?;
		}
		drop(input);
		assert_eq!(blocks.await?, vec![8000, 1]);
		Ok(())
	}

	#[tokio::test]
	async fn flushes_before_merging_past_the_threshold() -> Result<()> {
		let (input, blocks, _errors) = start::<NodeBatch>(5);
		for batch in [nodes(0..3), nodes(3..6), nodes(6..8), nodes(8..13)] {
			input.send(CategoryMessage::Append(batch)).await?;
		}
		drop(input);
		assert_eq!(blocks.await?, vec![3, 5, 5]);
		Ok(())
	}

	#[tokio::test]
	async fn flush_request_emits_the_buffer() -> Result<()> {
		let (input, blocks, _errors) = start::<NodeBatch>(100);
		input.send(CategoryMessage::Append(nodes(0..3))).await?;
		let (done_tx, done_rx) = oneshot::channel();
		input.send(CategoryMessage::Flush(done_tx)).await?;
		done_rx.await?;

		// an empty buffer does not produce a block
		let (done_tx, done_rx) = oneshot::channel();
		input.send(CategoryMessage::Flush(done_tx)).await?;
		done_rx.await?;

		input.send(CategoryMessage::Append(nodes(3..5))).await?;
		drop(input);
		assert_eq!(blocks.await?, vec![3, 2]);
		Ok(())
	}

	#[tokio::test]
	async fn oversized_batch_becomes_one_block() -> Result<()> {
		let (input, blocks, _errors) = start::<NodeBatch>(5);
		input.send(CategoryMessage::Append(nodes(0..8))).await?;
		input.send(CategoryMessage::Append(nodes(8..9))).await?;
		drop(input);
		assert_eq!(blocks.await?, vec![8, 1]);
		Ok(())
	}

	#[tokio::test]
	async fn stopped_writer_is_reported() -> Result<()> {
		let (input_tx, input_rx) = mpsc::channel(1);
		let (block_tx, block_rx) = mpsc::channel(1);
		let (error_tx, mut errors) = mpsc::unbounded_channel();
		drop(block_rx);
		let aggregator = Aggregator::<NodeBatch>::new(Category::Node, 100, block_tx, error_tx);
		let task = tokio::spawn(aggregator.run(input_rx));

		input_tx.send(CategoryMessage::Append(nodes(0..3))).await?;
		let (done_tx, done_rx) = oneshot::channel();
		input_tx.send(CategoryMessage::Flush(done_tx)).await?;
		// the flush cannot be confirmed, so the acknowledgement is dropped
		assert!(done_rx.await.is_err());

		drop(input_tx);
		task.await?;

		let mut messages = vec![];
		while let Some(err) = errors.recv().await {
			messages.push(format!("{err:#}"));
		}
		// the buffer is kept and tried again when the input closes
		assert_eq!(
			messages,
			vec![
				"flush osm nodes: block writer has stopped",
				"flush osm nodes: block writer has stopped",
			]
		);
		Ok(())
	}

	#[derive(Debug, Default)]
	struct PoisonedBatch(usize);

	impl Batch for PoisonedBatch {
		fn len(&self) -> usize {
			self.0
		}

		fn merge(&mut self, other: Self) {
			self.0 += other.0;
		}

		fn to_block(&self) -> Result<PrimitiveBlock> {
			bail!("poisoned batch of {} elements", self.0)
		}

		fn clear(&mut self) {
			self.0 = 0;
		}
	}

	#[tokio::test]
	async fn failed_flush_keeps_the_buffer() -> Result<()> {
		let (input, blocks, mut errors) = start::<PoisonedBatch>(10);
		input.send(CategoryMessage::Append(PoisonedBatch(2))).await?;
		let (done_tx, done_rx) = oneshot::channel();
		input.send(CategoryMessage::Flush(done_tx)).await?;
		done_rx.await?;
		input.send(CategoryMessage::Append(PoisonedBatch(1))).await?;
		drop(input);

		assert_eq!(blocks.await?, Vec::<usize>::new());
		let mut messages = vec![];
		while let Some(err) = errors.recv().await {
			messages.push(format!("{err:#}"));
		}
		assert_eq!(
			messages,
			vec![
				"flush osm nodes: poisoned batch of 2 elements",
				"flush osm nodes: poisoned batch of 3 elements",
			]
		);
		Ok(())
	}
}
