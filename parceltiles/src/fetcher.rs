//! A filesystem-backed [`TileFetcher`] serving pre-rendered tiles laid out as
//! `{root}/{zoom}/{x}/{y}.mvt`.
//!
//! A missing file means "no features intersect this tile", not an error; any
//! other io failure is reported as transient so the pipeline retries it.

use anyhow::{Result, ensure};
use async_trait::async_trait;
use parceltiles_core::{Blob, TileCoord, TileError, TileFetcher};
use std::{
	io::ErrorKind,
	path::{Path, PathBuf},
};

/// Rough payload bytes per encoded feature, for complexity estimates.
const ESTIMATED_BYTES_PER_FEATURE: u64 = 48;

pub struct DirectoryFetcher {
	root: PathBuf,
}

impl DirectoryFetcher {
	pub fn new(root: &Path) -> Result<DirectoryFetcher> {
		ensure!(root.is_dir(), "tile directory '{}' not found", root.display());
		Ok(DirectoryFetcher {
			root: root.to_path_buf(),
		})
	}

	fn tile_path(&self, coord: &TileCoord) -> PathBuf {
		self
			.root
			.join(coord.zoom.to_string())
			.join(coord.x.to_string())
			.join(format!("{}.mvt", coord.y))
	}
}

#[async_trait]
impl TileFetcher for DirectoryFetcher {
	async fn fetch_tile(&self, coord: &TileCoord) -> Result<Option<Blob>, TileError> {
		let path = self.tile_path(coord);
		match tokio::fs::read(&path).await {
			Ok(bytes) => Ok(Some(Blob::from(bytes))),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
			Err(err) => Err(TileError::transient(format!(
				"reading '{}' failed: {err}",
				path.display()
			))),
		}
	}

	async fn estimate_feature_count(&self, coord: &TileCoord) -> Result<u64, TileError> {
		let path = self.tile_path(coord);
		match tokio::fs::metadata(&path).await {
			Ok(meta) => Ok(meta.len() / ESTIMATED_BYTES_PER_FEATURE),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(0),
			Err(err) => Err(TileError::transient(format!(
				"reading '{}' failed: {err}",
				path.display()
			))),
		}
	}
}
