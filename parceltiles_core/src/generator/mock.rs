//! A scriptable, call-counting [`TileFetcher`] for tests.

use super::TileFetcher;
use crate::{Blob, TileCoord, TileError};
use async_trait::async_trait;
use std::{
	sync::atomic::{AtomicU64, Ordering},
	time::Duration,
};

/// How many payload bytes the mock assumes per feature when estimating.
const MOCK_BYTES_PER_FEATURE: u64 = 48;

/// What the mock fetcher should do on every call.
#[derive(Debug, Clone)]
pub enum FetcherProfile {
	/// Always return these bytes.
	Bytes(Vec<u8>),
	/// Always return "no features intersect this tile".
	Empty,
	/// Fail transiently on the first `failures` calls, then return the bytes.
	FlakyThenBytes { failures: u64, bytes: Vec<u8> },
	/// Always fail with a transient error (timeout-like).
	TransientFailure,
	/// Always fail with a permanent error (schema-mismatch-like).
	PermanentFailure,
}

pub struct MockFetcher {
	profile: FetcherProfile,
	delay: Option<Duration>,
	fetch_calls: AtomicU64,
	estimate_calls: AtomicU64,
}

impl MockFetcher {
	#[must_use]
	pub fn new(profile: FetcherProfile) -> MockFetcher {
		MockFetcher {
			profile,
			delay: None,
			fetch_calls: AtomicU64::new(0),
			estimate_calls: AtomicU64::new(0),
		}
	}

	/// Makes every fetch take at least `delay`, to widen race windows in
	/// coalescing tests.
	#[must_use]
	pub fn with_delay(mut self, delay: Duration) -> MockFetcher {
		self.delay = Some(delay);
		self
	}

	#[must_use]
	pub fn fetch_count(&self) -> u64 {
		self.fetch_calls.load(Ordering::SeqCst)
	}

	#[must_use]
	pub fn estimate_count(&self) -> u64 {
		self.estimate_calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl TileFetcher for MockFetcher {
	async fn fetch_tile(&self, _coord: &TileCoord) -> Result<Option<Blob>, TileError> {
		let call = self.fetch_calls.fetch_add(1, Ordering::SeqCst);
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		match &self.profile {
			FetcherProfile::Bytes(bytes) => Ok(Some(Blob::from(bytes.clone()))),
			FetcherProfile::Empty => Ok(None),
			FetcherProfile::FlakyThenBytes { failures, bytes } => {
				if call < *failures {
					Err(TileError::transient("mock connection reset"))
				} else {
					Ok(Some(Blob::from(bytes.clone())))
				}
			}
			FetcherProfile::TransientFailure => Err(TileError::transient("mock timeout")),
			FetcherProfile::PermanentFailure => Err(TileError::permanent("mock schema mismatch")),
		}
	}

	async fn estimate_feature_count(&self, _coord: &TileCoord) -> Result<u64, TileError> {
		self.estimate_calls.fetch_add(1, Ordering::SeqCst);
		match &self.profile {
			FetcherProfile::Bytes(bytes) | FetcherProfile::FlakyThenBytes { bytes, .. } => {
				Ok(bytes.len() as u64 / MOCK_BYTES_PER_FEATURE)
			}
			FetcherProfile::Empty => Ok(0),
			FetcherProfile::TransientFailure => Err(TileError::transient("mock timeout")),
			FetcherProfile::PermanentFailure => Err(TileError::permanent("mock schema mismatch")),
		}
	}
}
