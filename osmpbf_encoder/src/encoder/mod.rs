//! The concurrent part of the encoder: one aggregator per [`Category`], a block writer that owns the
//! sink, and [`PbfEncoder`] which starts and drains them.

mod aggregator;
mod block_writer;
mod category;
mod config;
mod pbf_encoder;

pub use aggregator::*;
pub use block_writer::*;
pub use category::*;
pub use config::*;
pub use pbf_encoder::*;
