//! Command line front end of the streaming OSM PBF encoder.
//!
//! The binary converts OPL text files into `.osm.pbf`. The OPL reader is exposed here so it can be
//! used without the binary.

pub mod opl;
