//! Batches: accumulable groups of same-kind elements that the aggregators buffer and merge.

use super::{Node, PrimitiveBlock, Relation, Way};
use anyhow::{Result, ensure};

/// The capability the aggregation pipeline needs from a group of elements.
pub trait Batch: Send + 'static {
	/// Number of elements in the batch.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Moves all elements of `other` to the end of `self`.
	fn merge(&mut self, other: Self)
	where
		Self: Sized;

	/// Builds a primitive block. Fails on an empty batch.
	fn to_block(&self) -> Result<PrimitiveBlock>;

	/// Removes all elements. Calling it repeatedly is fine.
	fn clear(&mut self);
}

macro_rules! define_batch {
	($batch:ident, $element:ident, $to_block:path, $name:literal) => {
		#[doc = concat!("A batch of ", $name, ".")]
		#[derive(Clone, Debug, Default, PartialEq)]
		pub struct $batch(pub Vec<$element>);

		impl $batch {
			pub fn new() -> Self {
				Self::default()
			}

			pub fn push(&mut self, element: $element) {
				self.0.push(element);
			}

			pub fn iter(&self) -> impl Iterator<Item = &$element> + '_ {
				self.0.iter()
			}
		}

		impl From<Vec<$element>> for $batch {
			fn from(elements: Vec<$element>) -> Self {
				Self(elements)
			}
		}

		impl From<$element> for $batch {
			fn from(element: $element) -> Self {
				Self(vec![element])
			}
		}

		impl Batch for $batch {
			fn len(&self) -> usize {
				self.0.len()
			}

			fn merge(&mut self, mut other: Self) {
				self.0.append(&mut other.0);
			}

			fn to_block(&self) -> Result<PrimitiveBlock> {
				ensure!(!self.0.is_empty(), concat!("cannot convert an empty batch of ", $name));
				$to_block(&self.0)
			}

			fn clear(&mut self) {
				self.0.clear();
			}
		}
	};
}

define_batch!(NodeBatch, Node, PrimitiveBlock::from_nodes, "nodes");
define_batch!(WayBatch, Way, PrimitiveBlock::from_ways, "ways");
define_batch!(RelationBatch, Relation, PrimitiveBlock::from_relations, "relations");
