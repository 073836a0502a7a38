//! Gzip compression for tile payloads.
//!
//! Round-trip contract: `decompress_gzip(compress_gzip(b)) == b` for every
//! byte sequence, including the empty one. An empty tile still compresses to
//! a valid, non-empty gzip frame (the framing has fixed overhead), so empty
//! tiles are never an error case.

use crate::Blob;
use anyhow::Result;
use flate2::bufread::{GzDecoder, GzEncoder};
use std::io::Read;

/// The two magic bytes every gzip stream starts with.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compresses data using gzip.
pub fn compress_gzip(blob: &Blob) -> Result<Blob> {
	let mut result: Vec<u8> = Vec::new();
	GzEncoder::new(blob.as_slice(), flate2::Compression::best()).read_to_end(&mut result)?;
	Ok(Blob::from(result))
}

/// Decompresses data that was compressed using gzip.
pub fn decompress_gzip(blob: &Blob) -> Result<Blob> {
	let mut result: Vec<u8> = Vec::new();
	GzDecoder::new(blob.as_slice()).read_to_end(&mut result)?;
	Ok(Blob::from(result))
}

/// Returns `true` iff the buffer starts with the gzip magic header.
///
/// Inputs shorter than two bytes are simply not gzip, not an error.
#[must_use]
pub fn is_gzipped(data: &[u8]) -> bool {
	data.len() >= 2 && data[0..2] == GZIP_MAGIC
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn roundtrip_empty() -> Result<()> {
		let empty = Blob::new_empty();
		let compressed = compress_gzip(&empty)?;
		assert!(!compressed.is_empty(), "gzip framing has fixed overhead");
		assert_eq!(decompress_gzip(&compressed)?, empty);
		Ok(())
	}

	#[test]
	fn roundtrip_small() -> Result<()> {
		let blob = Blob::from("hello parcels");
		assert_eq!(decompress_gzip(&compress_gzip(&blob)?)?, blob);
		Ok(())
	}

	#[test]
	fn roundtrip_repetitive() -> Result<()> {
		let blob = Blob::from(vec![7u8; 100_000]);
		let compressed = compress_gzip(&blob)?;
		assert!(compressed.len() < blob.len());
		assert_eq!(decompress_gzip(&compressed)?, blob);
		Ok(())
	}

	#[test]
	fn roundtrip_incompressible() -> Result<()> {
		let blob = random_data(100_000);
		assert_eq!(decompress_gzip(&compress_gzip(&blob)?)?, blob);
		Ok(())
	}

	#[test]
	fn detects_gzip_magic() -> Result<()> {
		assert!(is_gzipped(compress_gzip(&Blob::new_empty())?.as_slice()));
		assert!(is_gzipped(compress_gzip(&random_data(1000))?.as_slice()));
		assert!(is_gzipped(&[0x1f, 0x8b]));

		assert!(!is_gzipped(&[]));
		assert!(!is_gzipped(&[0x1f]));
		assert!(!is_gzipped(&[0x8b, 0x1f]));
		assert!(!is_gzipped(b"not a gzip stream"));
		Ok(())
	}

	/// Generate random binary data of a specified size.
	fn random_data(size: usize) -> Blob {
		let mut vec: Vec<u8> = vec![0; size];
		(0..size).for_each(|i| {
			vec[i] = (((i as f64 + 1.78123).cos() * 6_513_814_013_423.454).fract() * 256f64) as u8;
		});

		Blob::from(vec)
	}
}
