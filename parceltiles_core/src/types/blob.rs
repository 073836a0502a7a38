//! This module provides the [`Blob`] struct, a wrapper around [`Vec<u8>`] used
//! as the unit of tile payload throughout the pipeline.
//!
//! # Examples
//!
//! ```rust
//! use parceltiles_core::Blob;
//!
//! let blob = Blob::from(vec![0, 1, 2, 3]);
//! assert_eq!(blob.len(), 4);
//! assert_eq!(blob.as_slice(), &[0, 1, 2, 3]);
//!
//! let empty = Blob::new_empty();
//! assert!(empty.is_empty());
//! ```

use std::fmt::Debug;

/// A simple wrapper around [`Vec<u8>`] holding raw or compressed tile bytes.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Blob(Vec<u8>);

impl Blob {
	/// Creates an empty `Blob`.
	#[must_use]
	pub fn new_empty() -> Blob {
		Blob(Vec::new())
	}

	/// Returns the underlying bytes as a slice.
	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		&self.0
	}

	/// Consumes the `Blob`, returning the underlying vector.
	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	/// Returns the length in bytes.
	#[must_use]
	pub fn len(&self) -> u64 {
		self.0.len() as u64
	}

	/// Returns `true` if the `Blob` contains no bytes.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Vec<u8>> for Blob {
	fn from(item: Vec<u8>) -> Self {
		Blob(item)
	}
}

impl From<&[u8]> for Blob {
	fn from(item: &[u8]) -> Self {
		Blob(item.to_vec())
	}
}

impl From<&str> for Blob {
	fn from(item: &str) -> Self {
		Blob(item.as_bytes().to_vec())
	}
}

impl From<String> for Blob {
	fn from(item: String) -> Self {
		Blob(item.into_bytes())
	}
}

impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Blob").field("len", &self.0.len()).finish()
	}
}
