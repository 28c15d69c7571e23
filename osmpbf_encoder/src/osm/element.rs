//! Plain OpenStreetMap elements as a producer hands them to the encoder.
//!
//! Coordinates are WGS84 degrees, timestamps are seconds since the Unix epoch. Tags keep the order
//! they were given in.

use anyhow::{Result, bail};
use std::fmt::Display;

/// Ordered `(key, value)` pairs.
pub type Tags = Vec<(String, String)>;

/// Editing metadata attached to an element.
#[derive(Clone, Debug, PartialEq)]
pub struct Info {
	pub version: i32,
	/// Seconds since the Unix epoch.
	pub timestamp: i64,
	pub changeset: i64,
	pub uid: i32,
	pub user: String,
	pub visible: bool,
}

impl Default for Info {
	fn default() -> Self {
		Info {
			version: 0,
			timestamp: 0,
			changeset: 0,
			uid: 0,
			user: String::new(),
			visible: true,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
	pub id: i64,
	pub lat: f64,
	pub lon: f64,
	pub tags: Tags,
	pub info: Option<Info>,
}

impl Node {
	pub fn new(id: i64, lat: f64, lon: f64) -> Node {
		Node {
			id,
			lat,
			lon,
			..Default::default()
		}
	}

	pub fn with_tags(mut self, tags: &[(&str, &str)]) -> Node {
		self.tags = to_tags(tags);
		self
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Way {
	pub id: i64,
	/// Ids of the referenced nodes, in order.
	pub refs: Vec<i64>,
	pub tags: Tags,
	pub info: Option<Info>,
}

impl Way {
	pub fn new(id: i64, refs: Vec<i64>) -> Way {
		Way {
			id,
			refs,
			..Default::default()
		}
	}

	pub fn with_tags(mut self, tags: &[(&str, &str)]) -> Way {
		self.tags = to_tags(tags);
		self
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Relation {
	pub id: i64,
	pub members: Vec<Member>,
	pub tags: Tags,
	pub info: Option<Info>,
}

impl Relation {
	pub fn new(id: i64, members: Vec<Member>) -> Relation {
		Relation {
			id,
			members,
			..Default::default()
		}
	}

	pub fn with_tags(mut self, tags: &[(&str, &str)]) -> Relation {
		self.tags = to_tags(tags);
		self
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Member {
	pub member_type: MemberType,
	pub id: i64,
	pub role: String,
}

impl Member {
	pub fn new(member_type: MemberType, id: i64, role: &str) -> Member {
		Member {
			member_type,
			id,
			role: role.to_string(),
		}
	}
}

/// Kind of element a relation member points to. The discriminants are the protobuf enum values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberType {
	Node = 0,
	Way = 1,
	Relation = 2,
}

impl MemberType {
	pub fn as_u64(self) -> u64 {
		self as u64
	}

	/// Parses the single-letter abbreviation `n`, `w` or `r`.
	pub fn from_char(c: char) -> Result<MemberType> {
		Ok(match c {
			'n' => MemberType::Node,
			'w' => MemberType::Way,
			'r' => MemberType::Relation,
			_ => bail!("unknown member type '{c}'"),
		})
	}
}

impl Display for MemberType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			MemberType::Node => "node",
			MemberType::Way => "way",
			MemberType::Relation => "relation",
		})
	}
}

fn to_tags(tags: &[(&str, &str)]) -> Tags {
	tags.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}
