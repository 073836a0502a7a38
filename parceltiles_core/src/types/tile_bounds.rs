use anyhow::{Result, ensure};
use std::fmt::Debug;

/// The geographic rectangle covered by a single tile, in degrees.
///
/// Invariants (checked on construction): `min_lon < max_lon`,
/// `min_lat < max_lat`, both axes within Web Mercator limits.
///
/// # Examples
///
/// ```
/// use parceltiles_core::TileBounds;
///
/// let bounds = TileBounds::new(-10.0, -5.0, 10.0, 5.0).unwrap();
/// assert_eq!(bounds.center(), [0.0, 0.0]);
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct TileBounds {
	pub min_lon: f64,
	pub min_lat: f64,
	pub max_lon: f64,
	pub max_lat: f64,
}

impl TileBounds {
	pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<TileBounds> {
		ensure!(min_lon < max_lon, "min_lon ({min_lon}) must be < max_lon ({max_lon})");
		ensure!(min_lat < max_lat, "min_lat ({min_lat}) must be < max_lat ({max_lat})");
		ensure!(min_lon >= -180.0, "min_lon ({min_lon}) must be >= -180");
		ensure!(max_lon <= 180.0, "max_lon ({max_lon}) must be <= 180");
		ensure!(min_lat >= -90.0, "min_lat ({min_lat}) must be >= -90");
		ensure!(max_lat <= 90.0, "max_lat ({max_lat}) must be <= 90");
		Ok(TileBounds {
			min_lon,
			min_lat,
			max_lon,
			max_lat,
		})
	}

	/// The midpoint of the rectangle as `[lon, lat]`, always strictly inside.
	#[must_use]
	pub fn center(&self) -> [f64; 2] {
		[
			(self.min_lon + self.max_lon) / 2.0,
			(self.min_lat + self.max_lat) / 2.0,
		]
	}

	#[must_use]
	pub fn as_array(&self) -> [f64; 4] {
		[self.min_lon, self.min_lat, self.max_lon, self.max_lat]
	}

	/// Returns `true` if the point lies inside the rectangle (borders excluded).
	#[must_use]
	pub fn contains(&self, lon: f64, lat: f64) -> bool {
		lon > self.min_lon && lon < self.max_lon && lat > self.min_lat && lat < self.max_lat
	}
}

impl Debug for TileBounds {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_fmt(format_args!(
			"TileBounds[{}, {}, {}, {}]",
			self.min_lon, self.min_lat, self.max_lon, self.max_lat
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_checks_invariants() {
		assert!(TileBounds::new(-10.0, -5.0, 10.0, 5.0).is_ok());
		assert!(TileBounds::new(10.0, -5.0, -10.0, 5.0).is_err());
		assert!(TileBounds::new(-10.0, 5.0, 10.0, -5.0).is_err());
		assert!(TileBounds::new(-181.0, -5.0, 10.0, 5.0).is_err());
		assert!(TileBounds::new(-10.0, -5.0, 181.0, 5.0).is_err());
		assert!(TileBounds::new(-10.0, -91.0, 10.0, 5.0).is_err());
		assert!(TileBounds::new(-10.0, -5.0, 10.0, 91.0).is_err());
	}

	#[test]
	fn center_is_strictly_inside() -> Result<()> {
		let bounds = TileBounds::new(-146.25, 76.84, -135.0, 79.17)?;
		let [lon, lat] = bounds.center();
		assert!(bounds.contains(lon, lat));
		Ok(())
	}

	#[test]
	fn as_array() -> Result<()> {
		let bounds = TileBounds::new(-1.0, -2.0, 3.0, 4.0)?;
		assert_eq!(bounds.as_array(), [-1.0, -2.0, 3.0, 4.0]);
		Ok(())
	}
}
