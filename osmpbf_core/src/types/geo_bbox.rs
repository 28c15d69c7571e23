use anyhow::{Context, Result, ensure};
use std::fmt::Debug;

/// Nanodegrees per degree, the unit of `HeaderBBox` coordinates.
const NANO: f64 = 1e9;

/// A geographical bounding box (`GeoBBox`) defined by its minimum and maximum longitude (x)
/// and latitude (y) in degrees.
///
/// # Examples
///
/// ```
/// use osmpbf_core::GeoBBox;
///
/// let bbox = GeoBBox::new(13.088, 52.338, 13.761, 52.675).unwrap();
/// assert_eq!(bbox.to_nanodegrees(), [13_088_000_000, 13_761_000_000, 52_675_000_000, 52_338_000_000]);
/// assert!(GeoBBox::new(10.0, 0.0, -10.0, 5.0).is_err());
/// ```
#[derive(Clone, Copy, PartialEq)]
#[allow(clippy::manual_non_exhaustive)]
pub struct GeoBBox {
	pub x_min: f64,
	pub y_min: f64,
	pub x_max: f64,
	pub y_max: f64,
	phantom: (),
}

impl GeoBBox {
	/// Creates a new `GeoBBox` from `west, south, east, north`.
	///
	/// Fails if a coordinate is outside WGS84 or if min > max.
	pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<GeoBBox> {
		GeoBBox {
			x_min,
			y_min,
			x_max,
			y_max,
			phantom: (),
		}
		.checked()
	}

	/// Converts the box to nanodegrees in `HeaderBBox` field order: `[left, right, top, bottom]`.
	pub fn to_nanodegrees(&self) -> [i64; 4] {
		[
			(self.x_min * NANO).round() as i64,
			(self.x_max * NANO).round() as i64,
			(self.y_max * NANO).round() as i64,
			(self.y_min * NANO).round() as i64,
		]
	}

	fn checked(self) -> Result<Self> {
		ensure!(self.x_min >= -180., "x_min ({}) must be >= -180", self.x_min);
		ensure!(self.y_min >= -90., "y_min ({}) must be >= -90", self.y_min);
		ensure!(self.x_max <= 180., "x_max ({}) must be <= 180", self.x_max);
		ensure!(self.y_max <= 90., "y_max ({}) must be <= 90", self.y_max);
		ensure!(
			self.x_min <= self.x_max,
			"x_min ({}) must be <= x_max ({})",
			self.x_min,
			self.x_max
		);
		ensure!(
			self.y_min <= self.y_max,
			"y_min ({}) must be <= y_max ({})",
			self.y_min,
			self.y_max
		);
		Ok(self)
	}
}

impl Debug for GeoBBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"GeoBBox({}, {}, {}, {})",
			self.x_min, self.y_min, self.x_max, self.y_max
		)
	}
}

impl TryFrom<Vec<f64>> for GeoBBox {
	type Error = anyhow::Error;

	fn try_from(input: Vec<f64>) -> Result<Self> {
		ensure!(
			input.len() == 4,
			"GeoBBox must have 4 elements (x_min, y_min, x_max, y_max)"
		);
		GeoBBox::new(input[0], input[1], input[2], input[3]).with_context(|| format!("Failed to convert {input:?} to GeoBBox"))
	}
}

impl TryFrom<[f64; 4]> for GeoBBox {
	type Error = anyhow::Error;

	fn try_from(input: [f64; 4]) -> Result<Self> {
		GeoBBox::new(input[0], input[1], input[2], input[3])
	}
}
