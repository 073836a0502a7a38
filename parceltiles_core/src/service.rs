//! The tile pipeline entry point: validate → key → cache → generate →
//! compress → hash.
//!
//! [`TileService`] is what the HTTP delivery layer talks to; everything
//! behind it (fetcher, cache, compression, hashing) is wired here.

use crate::{
	CacheEntry, CacheStats, LayerSignature, RetryPolicy, TileCache, TileCacheConfig, TileCoord,
	TileError, TileFetcher, TileGenerator, TileRequest, hash::generate_tile_etag, is_valid_tile,
};
use std::sync::Arc;

/// Serves compressed, cached parcel tiles for one layer signature.
///
/// Cloning is cheap and clones share the same cache.
#[derive(Clone)]
pub struct TileService {
	generator: TileGenerator,
	cache: TileCache,
	layer: LayerSignature,
}

impl TileService {
	#[must_use]
	pub fn new(
		fetcher: Arc<dyn TileFetcher>,
		layer: LayerSignature,
		cache_config: TileCacheConfig,
		retry: RetryPolicy,
	) -> TileService {
		TileService {
			generator: TileGenerator::new(fetcher, retry),
			cache: TileCache::new(cache_config),
			layer,
		}
	}

	#[must_use]
	pub fn layer(&self) -> &LayerSignature {
		&self.layer
	}

	#[must_use]
	pub fn cache_stats(&self) -> CacheStats {
		self.cache.stats()
	}

	/// Returns the compressed tile for `(zoom, x, y)`, generating and caching
	/// it if needed. Concurrent requests for the same tile coalesce onto a
	/// single generation (see [`TileCache::get_or_generate`]).
	pub async fn get_tile(&self, zoom: u32, x: u32, y: u32) -> Result<CacheEntry, TileError> {
		if !is_valid_tile(f64::from(zoom), f64::from(x), f64::from(y)) {
			return Err(TileError::validation(format!(
				"{zoom}/{x}/{y} is not a valid tile coordinate"
			)));
		}
		let coord = TileCoord::new(zoom as u8, x, y).map_err(|err| TileError::validation(err.to_string()))?;

		let request = TileRequest::new(coord, self.layer.clone());
		let key = request.cache_key();
		log::debug!("tile request {key}");

		let generator = self.generator.clone();
		self
			.cache
			.get_or_generate(&key, move || async move {
				let blob = generator.generate_compressed_tile(&request.coord).await?;
				let etag = generate_tile_etag(&request, &blob);
				Ok(CacheEntry::new(request.cache_key(), blob, etag))
			})
			.await
	}

	/// Advisory complexity estimate for scheduling; 0 for invalid
	/// coordinates or estimator failures.
	pub async fn estimate_complexity(&self, zoom: u32, x: u32, y: u32) -> u64 {
		if !is_valid_tile(f64::from(zoom), f64::from(x), f64::from(y)) {
			return 0;
		}
		match TileCoord::new(zoom as u8, x, y) {
			Ok(coord) => self.generator.estimate_complexity(&coord).await,
			Err(_) => 0,
		}
	}
}
