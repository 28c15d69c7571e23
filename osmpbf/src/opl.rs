//! Reader for OPL ("Object Per Line"), the plain text OSM format.
//!
//! One element per line: the type letter and id, followed by space separated fields whose first
//! character is the field name.
//!
//! ```text
//! n1 v2 dV c10 t2020-01-01T00:00:00Z i5 ualice Tamenity=cafe x13.4 y52.5
//! w7 v1 Thighway=path Nn1,n2
//! r9 v1 Ttype=multipolygon Mw7@outer,n1@
//! ```
//!
//! User names, tags and roles escape special characters as `%<hex code point>%`.

use anyhow::{Context, Result, bail, ensure};
use osmpbf_encoder::{
	Category,
	osm::{Info, Member, MemberType, Node, Relation, Tags, Way},
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

#[derive(Clone, Debug, PartialEq)]
pub enum OplElement {
	Node(Node),
	Way(Way),
	Relation(Relation),
}

impl OplElement {
	pub fn category(&self) -> Category {
		match self {
			OplElement::Node(_) => Category::Node,
			OplElement::Way(_) => Category::Way,
			OplElement::Relation(_) => Category::Relation,
		}
	}
}

/// Parses one line. Empty lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<OplElement>> {
	let line = line.trim();
	if line.is_empty() || line.starts_with('#') {
		return Ok(None);
	}

	let mut fields = line.split(' ').filter(|field| !field.is_empty());
	let (kind, id) = split_field(fields.next().context("empty line")?);
	let id: i64 = id.parse().with_context(|| format!("invalid id '{id}'"))?;

	let mut info = Info::default();
	let mut has_info = false;
	let mut tags = Tags::new();
	let mut lat = 0.0;
	let mut lon = 0.0;
	let mut refs = vec![];
	let mut members = vec![];

	for field in fields {
		let (name, value) = split_field(field);
		match name {
			'v' => info.version = parse_number(value, "version")?,
			'd' => {
				info.visible = match value {
					"V" => true,
					"D" => false,
					_ => bail!("invalid visibility '{value}'"),
				}
			}
			'c' => info.changeset = parse_number(value, "changeset")?,
			't' => info.timestamp = parse_timestamp(value)?,
			'i' => info.uid = parse_number(value, "uid")?,
			'u' => info.user = unescape(value)?,
			'T' => tags = parse_tags(value)?,
			'x' => lon = parse_coordinate(value)?,
			'y' => lat = parse_coordinate(value)?,
			'N' => refs = parse_refs(value)?,
			'M' => members = parse_members(value)?,
			_ => bail!("unknown field '{field}'"),
		}
		has_info |= matches!(name, 'v' | 'd' | 'c' | 't' | 'i' | 'u');
	}
	let info = has_info.then_some(info);

	let element = match kind {
		'n' => OplElement::Node(Node {
			id,
			lat,
			lon,
			tags,
			info,
		}),
		'w' => OplElement::Way(Way { id, refs, tags, info }),
		'r' => OplElement::Relation(Relation {
			id,
			members,
			tags,
			info,
		}),
		_ => bail!("unknown element type '{kind}'"),
	};
	Ok(Some(element))
}

fn split_field(field: &str) -> (char, &str) {
	let mut chars = field.chars();
	let name = chars.next().unwrap_or(' ');
	(name, chars.as_str())
}

fn parse_number<T: std::str::FromStr>(value: &str, name: &str) -> Result<T> {
	value.parse().ok().with_context(|| format!("invalid {name} '{value}'"))
}

fn parse_coordinate(value: &str) -> Result<f64> {
	// deleted nodes have empty coordinates
	if value.is_empty() {
		return Ok(0.0);
	}
	parse_number(value, "coordinate")
}

fn parse_timestamp(value: &str) -> Result<i64> {
	if value.is_empty() {
		return Ok(0);
	}
	let timestamp = OffsetDateTime::parse(value, &Rfc3339).with_context(|| format!("invalid timestamp '{value}'"))?;
	Ok(timestamp.unix_timestamp())
}

fn parse_tags(value: &str) -> Result<Tags> {
	value
		.split(',')
		.filter(|tag| !tag.is_empty())
		.map(|tag| {
			let (key, val) = tag.split_once('=').with_context(|| format!("invalid tag '{tag}'"))?;
			Ok((unescape(key)?, unescape(val)?))
		})
		.collect()
}

fn parse_refs(value: &str) -> Result<Vec<i64>> {
	value
		.split(',')
		.filter(|node_ref| !node_ref.is_empty())
		.map(|node_ref| {
			let id = node_ref
				.strip_prefix('n')
				.with_context(|| format!("invalid node reference '{node_ref}'"))?;
			parse_number(id, "node reference")
		})
		.collect()
}

fn parse_members(value: &str) -> Result<Vec<Member>> {
	value
		.split(',')
		.filter(|member| !member.is_empty())
		.map(|member| {
			let (kind, rest) = split_field(member);
			let (id, role) = rest
				.split_once('@')
				.with_context(|| format!("invalid member '{member}'"))?;
			Ok(Member {
				member_type: MemberType::from_char(kind)?,
				id: parse_number(id, "member id")?,
				role: unescape(role)?,
			})
		})
		.collect()
}

/// Replaces `%<hex>%` sequences by the character with that code point.
pub fn unescape(value: &str) -> Result<String> {
	if !value.contains('%') {
		return Ok(value.to_string());
	}

	let mut result = String::with_capacity(value.len());
	let mut parts = value.split('%');
	if let Some(first) = parts.next() {
		result.push_str(first);
	}
	// after the first part, parts alternate between an escape code and plain text, so a
	// well-formed value ends right after plain text, with the next part expected to be a code
	let mut in_escape = true;
	for part in parts {
		if in_escape {
			let code = u32::from_str_radix(part, 16).with_context(|| format!("invalid escape '%{part}%'"))?;
			result.push(char::from_u32(code).with_context(|| format!("invalid code point {code:#x}"))?);
		} else {
			result.push_str(part);
		}
		in_escape = !in_escape;
	}
	ensure!(in_escape, "unterminated escape in '{value}'");
	Ok(result)
}
