mod blob;
mod geo_bbox;

pub use blob::*;
pub use geo_bbox::*;
