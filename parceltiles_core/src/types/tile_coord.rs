//! This module defines [`TileCoord`], a validated slippy-map tile coordinate,
//! together with the pure coordinate math of the pipeline: geographic bounds,
//! neighbor enumeration and the prefetch priority heuristic.
//!
//! # Examples
//!
//! ```
//! use parceltiles_core::{TileCoord, is_valid_tile};
//!
//! let coord = TileCoord::new(10, 263, 416).unwrap();
//! assert_eq!(coord.zoom, 10);
//! assert!(is_valid_tile(10.0, 263.0, 416.0));
//! assert!(!is_valid_tile(10.0, 1024.0, 0.0));
//!
//! let bounds = coord.bounds().unwrap();
//! assert!(bounds.min_lon < bounds.max_lon);
//! ```

use crate::TileBounds;
use anyhow::{Result, ensure};
use std::{
	f64::consts::PI,
	fmt::{self, Debug},
};

/// Highest zoom level served; parcel geometry is not rendered beyond it.
pub const MAX_ZOOM: u8 = 22;

/// Lowest possible prefetch priority.
pub const PRIORITY_MIN: u32 = 1;
/// Highest possible prefetch priority.
pub const PRIORITY_MAX: u32 = 10;

/// Relative weight of the zoom term in [`TileCoord::priority`]. Low-zoom
/// tiles are cheap to generate and useful to many viewers, so they dominate.
pub const PRIORITY_ZOOM_WEIGHT: f64 = 3.0;
/// Relative weight of the distance-from-grid-center term in
/// [`TileCoord::priority`].
pub const PRIORITY_CENTER_WEIGHT: f64 = 1.0;

/// A tile coordinate in the standard slippy-map scheme.
///
/// Invariant: `zoom <= MAX_ZOOM` and `x, y < 2^zoom`, enforced by
/// [`TileCoord::new`].
#[derive(Eq, PartialEq, Clone, Hash, Copy)]
pub struct TileCoord {
	pub zoom: u8,
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	pub fn new(zoom: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(zoom <= MAX_ZOOM, "zoom ({zoom}) must be <= {MAX_ZOOM}");
		let max = 1u32 << zoom;
		ensure!(x < max, "x ({x}) must be < {max} at zoom {zoom}");
		ensure!(y < max, "y ({y}) must be < {max} at zoom {zoom}");
		Ok(TileCoord { zoom, x, y })
	}

	/// Number of tiles along one axis at this coordinate's zoom level.
	#[must_use]
	pub fn grid_size(&self) -> u32 {
		1u32 << self.zoom
	}

	/// The geographic rectangle this tile covers, via inverse Web Mercator.
	///
	/// Corners are evaluated at `(x, y)` and `(x + 1, y + 1)`; latitude
	/// decreases with growing `y`, so the southern edge comes from `y + 1`.
	/// Goes through [`TileBounds::new`] so its ordering and range invariants
	/// hold for every constructed rectangle.
	pub fn bounds(&self) -> Result<TileBounds> {
		let size = f64::from(self.grid_size());
		let lon = |x: f64| x / size * 360.0 - 180.0;
		let lat = |y: f64| (PI * (1.0 - 2.0 * y / size)).sinh().atan().to_degrees();

		TileBounds::new(
			lon(f64::from(self.x)),
			lat(f64::from(self.y + 1)),
			lon(f64::from(self.x + 1)),
			lat(f64::from(self.y)),
		)
	}

	/// The up-to-8 direct neighbors of this tile at the same zoom level.
	///
	/// Neighbors outside the grid are dropped, so edge and corner tiles yield
	/// fewer than 8 results. There is no wraparound at the antimeridian:
	/// `x = 0` and `x = 2^zoom - 1` are not treated as adjacent.
	#[must_use]
	pub fn neighbors(&self) -> Vec<TileCoord> {
		let max = i64::from(self.grid_size());
		let mut result = Vec::with_capacity(8);
		for dx in -1i64..=1 {
			for dy in -1i64..=1 {
				if dx == 0 && dy == 0 {
					continue;
				}
				let x = i64::from(self.x) + dx;
				let y = i64::from(self.y) + dy;
				if x >= 0 && x < max && y >= 0 && y < max {
					result.push(TileCoord {
						zoom: self.zoom,
						x: x as u32,
						y: y as u32,
					});
				}
			}
		}
		result
	}

	/// Prefetch/scheduling priority in `[PRIORITY_MIN, PRIORITY_MAX]`.
	///
	/// Lower zoom levels score higher, and tiles nearer the center of the
	/// zoom level's grid score higher than edge tiles. The weighting constants
	/// are tunables; only the range and the two monotonicity directions are
	/// contractual.
	#[must_use]
	pub fn priority(&self) -> u32 {
		let zoom_score = f64::from(MAX_ZOOM - self.zoom) / f64::from(MAX_ZOOM);

		let size = f64::from(self.grid_size());
		let center = (size - 1.0) / 2.0;
		let center_score = if self.zoom == 0 {
			1.0
		} else {
			let dist = (f64::from(self.x) - center)
				.abs()
				.max((f64::from(self.y) - center).abs());
			1.0 - dist / center
		};

		let score = (PRIORITY_ZOOM_WEIGHT * zoom_score + PRIORITY_CENTER_WEIGHT * center_score)
			/ (PRIORITY_ZOOM_WEIGHT + PRIORITY_CENTER_WEIGHT);

		PRIORITY_MIN + (score * f64::from(PRIORITY_MAX - PRIORITY_MIN)).round() as u32
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("TileCoord({}, [{}, {}])", &self.zoom, &self.x, &self.y))
	}
}

/// Checks whether `(zoom, x, y)` names a valid tile.
///
/// Accepts floats so that unvalidated client input can be checked directly:
/// NaN, infinities and fractional values are invalid, never a panic.
#[must_use]
pub fn is_valid_tile(zoom: f64, x: f64, y: f64) -> bool {
	if !zoom.is_finite() || !x.is_finite() || !y.is_finite() {
		return false;
	}
	if zoom.fract() != 0.0 || x.fract() != 0.0 || y.fract() != 0.0 {
		return false;
	}
	if zoom < 0.0 || zoom > f64::from(MAX_ZOOM) {
		return false;
	}
	let max = 2.0f64.powf(zoom);
	x >= 0.0 && x < max && y >= 0.0 && y < max
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_and_getters() -> Result<()> {
		let coord = TileCoord::new(5, 3, 4)?;
		assert_eq!(coord.zoom, 5);
		assert_eq!(coord.x, 3);
		assert_eq!(coord.y, 4);
		Ok(())
	}

	#[test]
	fn new_rejects_out_of_range() {
		assert!(TileCoord::new(23, 0, 0).is_err());
		assert!(TileCoord::new(18, 262144, 0).is_err());
		assert!(TileCoord::new(18, 0, 262144).is_err());
		assert!(TileCoord::new(0, 1, 0).is_err());
	}

	#[test]
	fn validity_scenarios() {
		let test = |zoom: f64, x: f64, y: f64, valid: bool| {
			assert_eq!(is_valid_tile(zoom, x, y), valid, "({zoom}, {x}, {y})");
		};

		test(10.0, 263.0, 416.0, true);
		test(0.0, 0.0, 0.0, true);
		test(22.0, 0.0, 0.0, true);
		test(18.0, 262143.0, 262143.0, true);

		test(18.0, 262144.0, 262144.0, false); // 262144 = 2^18
		test(-1.0, 0.0, 0.0, false);
		test(25.0, 0.0, 0.0, false);
		test(10.0, -1.0, 0.0, false);
		test(10.0, 0.5, 0.0, false);
		test(f64::NAN, 0.0, 0.0, false);
		test(10.0, f64::NAN, 0.0, false);
		test(10.0, 0.0, f64::NAN, false);
		test(f64::INFINITY, 0.0, 0.0, false);
		test(10.0, f64::NEG_INFINITY, 0.0, false);
	}

	#[test]
	fn bounds_of_root_tile() -> Result<()> {
		let bounds = TileCoord::new(0, 0, 0)?.bounds()?;
		assert!((bounds.min_lon - -180.0).abs() < 1e-9);
		assert!((bounds.max_lon - 180.0).abs() < 1e-9);
		assert!((bounds.min_lat - -85.05112877980659).abs() < 1e-9);
		assert!((bounds.max_lat - 85.05112877980659).abs() < 1e-9);
		Ok(())
	}

	#[test]
	fn bounds_are_ordered_with_center_inside() -> Result<()> {
		let coords = [
			TileCoord::new(1, 0, 1)?,
			TileCoord::new(5, 3, 4)?,
			TileCoord::new(10, 263, 416)?,
			TileCoord::new(22, 0, 0)?,
			TileCoord::new(22, 4194303, 4194303)?,
		];
		for coord in coords {
			let bounds = coord.bounds()?;
			assert!(bounds.min_lon < bounds.max_lon, "{coord:?}");
			assert!(bounds.min_lat < bounds.max_lat, "{coord:?}");
			let [lon, lat] = bounds.center();
			assert!(bounds.contains(lon, lat), "{coord:?}");
		}
		Ok(())
	}

	#[test]
	fn neighbors_inner_tile() -> Result<()> {
		let neighbors = TileCoord::new(5, 3, 4)?.neighbors();
		assert_eq!(neighbors.len(), 8);
		assert!(!neighbors.contains(&TileCoord::new(5, 3, 4)?));
		assert!(neighbors.contains(&TileCoord::new(5, 2, 3)?));
		assert!(neighbors.contains(&TileCoord::new(5, 4, 5)?));
		Ok(())
	}

	#[test]
	fn neighbors_are_clipped_at_edges() -> Result<()> {
		// corner tile: 3 neighbors
		assert_eq!(TileCoord::new(5, 0, 0)?.neighbors().len(), 3);
		// edge tile: 5 neighbors
		assert_eq!(TileCoord::new(5, 0, 4)?.neighbors().len(), 5);
		// single-tile grid: no neighbors
		assert_eq!(TileCoord::new(0, 0, 0)?.neighbors().len(), 0);
		Ok(())
	}

	#[test]
	fn no_antimeridian_wraparound() -> Result<()> {
		let west = TileCoord::new(5, 0, 16)?.neighbors();
		assert!(west.iter().all(|c| c.x <= 1));
		let east = TileCoord::new(5, 31, 16)?.neighbors();
		assert!(east.iter().all(|c| c.x >= 30));
		Ok(())
	}

	#[test]
	fn priority_is_bounded() -> Result<()> {
		let coords = [
			TileCoord::new(0, 0, 0)?,
			TileCoord::new(11, 1024, 1024)?,
			TileCoord::new(22, 0, 0)?,
			TileCoord::new(22, 4194303, 4194303)?,
		];
		for coord in coords {
			let priority = coord.priority();
			assert!((PRIORITY_MIN..=PRIORITY_MAX).contains(&priority), "{coord:?}");
		}
		Ok(())
	}

	#[test]
	fn priority_favors_low_zoom() -> Result<()> {
		// compare center tiles so the center term is equal
		let low = TileCoord::new(2, 1, 1)?.priority();
		let high = TileCoord::new(20, 524287, 524287)?.priority();
		assert!(low > high, "low zoom {low} must outrank high zoom {high}");
		Ok(())
	}

	#[test]
	fn priority_favors_grid_center() -> Result<()> {
		let center = TileCoord::new(10, 511, 511)?.priority();
		let edge = TileCoord::new(10, 0, 0)?.priority();
		assert!(center > edge, "center {center} must outrank edge {edge}");
		Ok(())
	}

	#[test]
	fn debug() -> Result<()> {
		assert_eq!(format!("{:?}", TileCoord::new(5, 3, 4)?), "TileCoord(5, [3, 4])");
		Ok(())
	}
}
