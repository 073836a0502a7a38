//! Cache identity for tiles: the layer signature and the request tuple it is
//! combined with.
//!
//! The cache key format `"<layer>:<zoom>:<x>:<y>"` is the sole invalidation
//! mechanism of the pipeline: bumping the layer signature's version makes
//! every previously cached key unreachable without an explicit purge.

use crate::TileCoord;
use std::fmt::{self, Display};

/// An opaque versioned tag identifying the data/style version a tile was
/// rendered against, e.g. `"parcels@v3"`.
///
/// # Examples
///
/// ```
/// use parceltiles_core::LayerSignature;
///
/// let sig = LayerSignature::new("parcels", 3);
/// assert_eq!(sig.as_str(), "parcels@v3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerSignature(String);

impl LayerSignature {
	#[must_use]
	pub fn new(layer: &str, version: u32) -> LayerSignature {
		LayerSignature(format!("{layer}@v{version}"))
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for LayerSignature {
	fn from(value: &str) -> Self {
		LayerSignature(value.to_owned())
	}
}

impl Display for LayerSignature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A single tile request: coordinate plus layer signature. Created per
/// incoming request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileRequest {
	pub coord: TileCoord,
	pub layer: LayerSignature,
}

impl TileRequest {
	#[must_use]
	pub fn new(coord: TileCoord, layer: LayerSignature) -> TileRequest {
		TileRequest { coord, layer }
	}

	/// The deterministic cache key, `"<layer>:<zoom>:<x>:<y>"`. Injective over
	/// the `(layer, zoom, x, y)` tuple.
	#[must_use]
	pub fn cache_key(&self) -> String {
		format!(
			"{}:{}:{}:{}",
			self.layer, self.coord.zoom, self.coord.x, self.coord.y
		)
	}

	/// Requests for the neighboring tiles under the same layer signature,
	/// clipped at grid edges (see [`TileCoord::neighbors`]).
	#[must_use]
	pub fn neighbors(&self) -> Vec<TileRequest> {
		self
			.coord
			.neighbors()
			.into_iter()
			.map(|coord| TileRequest::new(coord, self.layer.clone()))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::Result;

	#[test]
	fn cache_key_format() -> Result<()> {
		let request = TileRequest::new(TileCoord::new(10, 263, 416)?, LayerSignature::new("test", 1));
		assert_eq!(request.cache_key(), "test@v1:10:263:416");
		Ok(())
	}

	#[test]
	fn cache_key_is_deterministic() -> Result<()> {
		let a = TileRequest::new(TileCoord::new(12, 1000, 2000)?, LayerSignature::from("parcels@v2"));
		let b = a.clone();
		assert_eq!(a.cache_key(), b.cache_key());
		Ok(())
	}

	#[test]
	fn cache_key_differs_on_any_field() -> Result<()> {
		let key = |zoom: u8, x: u32, y: u32, sig: &str| -> Result<String> {
			Ok(TileRequest::new(TileCoord::new(zoom, x, y)?, LayerSignature::from(sig)).cache_key())
		};

		let base = key(10, 263, 416, "test@v1")?;
		assert_ne!(base, key(11, 263, 416, "test@v1")?);
		assert_ne!(base, key(10, 264, 416, "test@v1")?);
		assert_ne!(base, key(10, 263, 417, "test@v1")?);
		assert_ne!(base, key(10, 263, 416, "test@v2")?);
		Ok(())
	}

	#[test]
	fn neighbors_share_layer() -> Result<()> {
		let request = TileRequest::new(TileCoord::new(5, 3, 4)?, LayerSignature::new("parcels", 1));
		let neighbors = request.neighbors();
		assert_eq!(neighbors.len(), 8);
		assert!(neighbors.iter().all(|r| r.layer == request.layer));
		Ok(())
	}
}
