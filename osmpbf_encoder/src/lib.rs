//! Streaming encoder for OpenStreetMap PBF files.
//!
//! Producers hand batches of nodes, ways and relations to a [`PbfEncoder`]. Each category is
//! buffered by its own task until a block is full (8000 elements by default) or a flush is
//! requested; a single writer stage then marshals the block, frames it and appends it to the sink.
//!
//! # Quick start
//! ```rust
//! use osmpbf_core::io::DataWriterBlob;
//! use osmpbf_encoder::{EncoderConfig, PbfEncoder, osm::{Node, NodeBatch}};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EncoderConfig::new(&["OsmSchema-V0.6", "DenseNodes"]);
//!     let encoder = PbfEncoder::new(DataWriterBlob::new(), config)?;
//!     let mut errors = encoder.start()?;
//!
//!     encoder.append_nodes(NodeBatch::from(Node::new(1, 52.52, 13.41))).await?;
//!     encoder.close().await?;
//!
//!     assert!(errors.recv().await.is_none());
//!     let sink = encoder.into_sink().unwrap();
//!     assert!(!sink.is_empty());
//!     Ok(())
//! }
//! ```

mod encoder;
pub use encoder::*;

pub mod format;
pub mod osm;

#[cfg(test)]
pub mod testing;
