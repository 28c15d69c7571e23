//! OpenStreetMap elements, batches of them, and the `osmformat` messages they are encoded into.

mod batch;
mod element;
mod group;
mod header_block;
mod info;
mod primitive_block;
mod string_table;

pub use batch::*;
pub use element::*;
pub use group::*;
pub use header_block::*;
pub use info::*;
pub use primitive_block::*;
pub use string_table::*;
