//! Tile generation against the external geometry source.
//!
//! The pipeline never runs spatial queries itself: [`TileFetcher`] is the
//! boundary to the backing data store, and [`TileGenerator`] wraps it with
//! empty-tile handling, advisory complexity estimation, gzip compression and
//! a transient-only retry policy.

#[cfg(any(test, feature = "test"))]
pub mod mock;

use crate::{Blob, TileCoord, TileError, compression::compress_gzip};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};

/// The external geometry data source.
///
/// `fetch_tile` returns `Ok(None)` when no features intersect the tile;
/// failures carry their transient/permanent classification in [`TileError`].
#[async_trait]
pub trait TileFetcher: Send + Sync {
	async fn fetch_tile(&self, coord: &TileCoord) -> Result<Option<Blob>, TileError>;

	/// Rough feature count for the tile, used to schedule generation.
	async fn estimate_feature_count(&self, coord: &TileCoord) -> Result<u64, TileError>;
}

/// Bounded retry with exponential backoff, applied to transient failures only.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		RetryPolicy {
			max_attempts: 3,
			initial_backoff: Duration::from_millis(100),
		}
	}
}

/// Produces compressed tile payloads from a [`TileFetcher`].
#[derive(Clone)]
pub struct TileGenerator {
	fetcher: Arc<dyn TileFetcher>,
	retry: RetryPolicy,
}

impl TileGenerator {
	pub fn new(fetcher: Arc<dyn TileFetcher>, retry: RetryPolicy) -> TileGenerator {
		TileGenerator { fetcher, retry }
	}

	/// Raw tile bytes for the coordinate. A tile without features is an empty
	/// buffer, not an error.
	pub async fn generate_tile(&self, coord: &TileCoord) -> Result<Blob, TileError> {
		Ok(self.fetcher.fetch_tile(coord).await?.unwrap_or_else(Blob::new_empty))
	}

	/// Advisory feature-count estimate; any failure degrades to 0 ("cheap or
	/// unknown") instead of propagating.
	pub async fn estimate_complexity(&self, coord: &TileCoord) -> u64 {
		match self.fetcher.estimate_feature_count(coord).await {
			Ok(count) => count,
			Err(err) => {
				log::debug!("complexity estimate for {coord:?} failed: {err}");
				0
			}
		}
	}

	/// Gzip-compressed tile bytes, retrying transient source failures per the
	/// retry policy. Even an empty tile yields a valid compressed frame.
	pub async fn generate_compressed_tile(&self, coord: &TileCoord) -> Result<Blob, TileError> {
		let raw = self.generate_with_retry(coord).await?;
		compress_gzip(&raw).map_err(|err| TileError::Internal(format!("gzip compression failed: {err}")))
	}

	async fn generate_with_retry(&self, coord: &TileCoord) -> Result<Blob, TileError> {
		let mut backoff = self.retry.initial_backoff;
		let mut attempt = 1u32;
		loop {
			match self.generate_tile(coord).await {
				Ok(blob) => return Ok(blob),
				Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
					log::warn!("generating {coord:?} failed on attempt {attempt}: {err}");
					tokio::time::sleep(backoff).await;
					backoff *= 2;
					attempt += 1;
				}
				Err(err) => return Err(err),
			}
		}
	}
}
