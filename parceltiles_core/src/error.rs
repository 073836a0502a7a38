//! Error taxonomy of the tile pipeline.
//!
//! [`TileError`] is `Clone` on purpose: a single in-flight generation failure
//! is fanned out identically to every request coalesced on its cache key.

use thiserror::Error;

/// Whether a data source failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
	/// Timeout, connection reset and similar; retried with backoff.
	Transient,
	/// Missing function, schema mismatch and similar; never retried.
	Permanent,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TileError {
	/// Invalid zoom/x/y. Never retried, never forwarded to the data source.
	#[error("invalid tile coordinate: {0}")]
	Validation(String),

	/// The external geometry source failed.
	#[error("data source failure ({kind:?}): {message}")]
	DataSource { kind: FaultKind, message: String },

	/// Should be unreachable on well-formed buffers (compression, hashing).
	#[error("internal error: {0}")]
	Internal(String),
}

impl TileError {
	pub fn validation(message: impl Into<String>) -> TileError {
		TileError::Validation(message.into())
	}

	pub fn transient(message: impl Into<String>) -> TileError {
		TileError::DataSource {
			kind: FaultKind::Transient,
			message: message.into(),
		}
	}

	pub fn permanent(message: impl Into<String>) -> TileError {
		TileError::DataSource {
			kind: FaultKind::Permanent,
			message: message.into(),
		}
	}

	#[must_use]
	pub fn is_transient(&self) -> bool {
		matches!(
			self,
			TileError::DataSource {
				kind: FaultKind::Transient,
				..
			}
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn transient_classification() {
		assert!(TileError::transient("timeout").is_transient());
		assert!(!TileError::permanent("missing function").is_transient());
		assert!(!TileError::validation("bad zoom").is_transient());
		assert!(!TileError::Internal("oops".to_string()).is_transient());
	}

	#[test]
	fn display() {
		assert_eq!(
			TileError::validation("zoom 25 out of range").to_string(),
			"invalid tile coordinate: zoom 25 out of range"
		);
		assert_eq!(
			TileError::transient("connection reset").to_string(),
			"data source failure (Transient): connection reset"
		);
	}

	#[test]
	fn errors_are_cloneable_for_fanout() {
		let err = TileError::permanent("schema mismatch");
		assert_eq!(err.clone(), err);
	}
}
