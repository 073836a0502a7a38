//! Content hashing for HTTP cache identity.
//!
//! ETags are double-quoted lowercase hex SHA-256 digests. The tile-scoped
//! variant mixes the cache key into the digest so two different tiles that
//! happen to produce identical compressed bytes still get distinct tags.

use crate::{Blob, TileRequest};
use sha2::{Digest, Sha256};

/// Deterministic content hash of the bytes, formatted as an HTTP ETag.
#[must_use]
pub fn generate_etag(blob: &Blob) -> String {
	format!("\"{:x}\"", Sha256::digest(blob.as_slice()))
}

/// Like [`generate_etag`], but scoped to the tile's identity.
#[must_use]
pub fn generate_tile_etag(request: &TileRequest, blob: &Blob) -> String {
	let mut hasher = Sha256::new();
	hasher.update(request.cache_key().as_bytes());
	hasher.update([0u8]);
	hasher.update(blob.as_slice());
	format!("\"{:x}\"", hasher.finalize())
}
