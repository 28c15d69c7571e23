use std::fmt::Display;

/// The three element kinds, each aggregated by its own pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
	Node,
	Way,
	Relation,
}

impl Category {
	pub const ALL: [Category; 3] = [Category::Node, Category::Way, Category::Relation];

	/// Name used to tag errors and log lines.
	pub fn name(&self) -> &'static str {
		match self {
			Category::Node => "osm nodes",
			Category::Way => "osm ways",
			Category::Relation => "osm relations",
		}
	}
}

impl Display for Category {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}
