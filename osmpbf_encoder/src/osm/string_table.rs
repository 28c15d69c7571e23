use anyhow::{Context, Result, anyhow};
use byteorder::LE;
use osmpbf_core::{
	Blob,
	io::{ValueWriter, ValueWriterBlob},
};
use std::{collections::HashMap, fmt::Debug};

/// Deduplicating string table of a primitive block.
///
/// Index 0 is always the empty string: `keys_vals` of dense nodes uses 0 as a separator, so no real
/// key may ever get that index.
#[derive(Clone, PartialEq)]
pub struct StringTable {
	list: Vec<String>,
	map: HashMap<String, u32>,
}

impl StringTable {
	pub fn new() -> StringTable {
		let mut table = StringTable {
			list: vec![],
			map: HashMap::new(),
		};
		table.add("");
		table
	}

	/// Returns the index of `entry`, appending it if it is new.
	pub fn add(&mut self, entry: &str) -> u32 {
		if let Some(index) = self.map.get(entry) {
			return *index;
		}
		let index = self.list.len() as u32;
		self.map.insert(entry.to_string(), index);
		self.list.push(entry.to_string());
		index
	}

	pub fn find(&self, entry: &str) -> Result<u32> {
		self
			.map
			.get(entry)
			.copied()
			.ok_or_else(|| anyhow!("entry '{entry}' not found"))
	}

	pub fn get(&self, id: u32) -> Result<&str> {
		self
			.list
			.get(id as usize)
			.map(String::as_str)
			.ok_or_else(|| anyhow!("id '{id}' not found"))
	}

	pub fn iter(&self) -> impl Iterator<Item = &String> + '_ {
		self.list.iter()
	}

	/// Number of entries, including the leading empty string.
	pub fn len(&self) -> usize {
		self.list.len()
	}

	pub fn is_empty(&self) -> bool {
		self.list.len() <= 1
	}

	/// Serializes the table as a `StringTable` message (repeated bytes `s = 1`).
	pub fn to_blob(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::<LE>::new();
		for entry in &self.list {
			writer
				.write_pbf_key(1, 2)
				.context("Failed to write PBF key for string table entry")?;
			writer
				.write_pbf_string(entry)
				.with_context(|| format!("Failed to write string table entry '{entry}'"))?;
		}
		Ok(writer.into_blob())
	}
}

impl Default for StringTable {
	fn default() -> StringTable {
		StringTable::new()
	}
}

impl Debug for StringTable {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(&self.list).finish()
	}
}
