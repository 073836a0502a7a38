//! The in-memory tile cache: a bounded LRU store of compressed tiles with
//! hit/miss statistics and single-flight coalescing of concurrent generation.
//!
//! A key moves through `unrequested → generating → cached` and back via
//! eviction (or by becoming unreachable after a layer signature bump). A key
//! is `generating` at most once at a time: concurrent requests for the same
//! key subscribe to the in-flight result instead of starting a second
//! generation, which bounds the load on the external geometry source during
//! cache-miss storms.

use crate::{Blob, TileError, compression::is_gzipped};
use std::{
	collections::HashMap,
	future::Future,
	sync::{Arc, Mutex, MutexGuard, PoisonError},
	time::{Duration, SystemTime},
};
use tokio::sync::broadcast;

/// A cached, compressed tile.
#[derive(Debug, Clone)]
pub struct CacheEntry {
	pub key: String,
	pub blob: Blob,
	pub etag: String,
	pub inserted_at: SystemTime,
}

impl CacheEntry {
	#[must_use]
	pub fn new(key: String, blob: Blob, etag: String) -> CacheEntry {
		CacheEntry {
			key,
			blob,
			etag,
			inserted_at: SystemTime::now(),
		}
	}

	#[must_use]
	pub fn size_bytes(&self) -> u64 {
		self.blob.len()
	}
}

/// Configuration of a [`TileCache`] instance. Caches are constructed
/// explicitly so tests can run isolated instances; there is no process-wide
/// singleton.
#[derive(Debug, Clone, Copy)]
pub struct TileCacheConfig {
	pub max_entries: usize,
	pub max_bytes: u64,
	pub generation_timeout: Duration,
}

impl Default for TileCacheConfig {
	fn default() -> Self {
		TileCacheConfig {
			max_entries: 10_000,
			max_bytes: 256 * 1024 * 1024,
			generation_timeout: Duration::from_secs(30),
		}
	}
}

/// Process-lifetime counters; not persisted across restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
	pub entry_count: u64,
	pub total_bytes: u64,
	pub hit_count: u64,
	pub miss_count: u64,
}

type FlightResult = Result<CacheEntry, TileError>;

struct CacheState {
	entries: HashMap<String, (CacheEntry, u64)>,
	inflight: HashMap<String, broadcast::Sender<FlightResult>>,
	total_bytes: u64,
	last_index: u64,
	hit_count: u64,
	miss_count: u64,
}

/// Key → compressed-entry store with LRU eviction and single-flight
/// generation coalescing.
///
/// Cloning is cheap: clones share the same entries, flights and statistics.
#[derive(Clone)]
pub struct TileCache {
	config: TileCacheConfig,
	state: Arc<Mutex<CacheState>>,
}

impl TileCache {
	#[must_use]
	pub fn new(config: TileCacheConfig) -> TileCache {
		TileCache {
			config,
			state: Arc::new(Mutex::new(CacheState {
				entries: HashMap::new(),
				inflight: HashMap::new(),
				total_bytes: 0,
				last_index: 0,
				hit_count: 0,
				miss_count: 0,
			})),
		}
	}

	// The cache must never become unusable; a poisoned lock keeps serving.
	fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
		state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Looks up a cached tile, refreshing its recency and recording a hit or
	/// miss.
	pub fn get(&self, key: &str) -> Option<CacheEntry> {
		let mut state = Self::lock(&self.state);
		Self::lookup(&mut state, key)
	}

	/// Inserts (or overwrites) an entry and evicts past the configured entry
	/// and byte budgets, least recently used first.
	pub fn insert(&self, key: &str, entry: CacheEntry) {
		let mut state = Self::lock(&self.state);
		Self::insert_locked(&self.config, &mut state, key, entry);
	}

	#[must_use]
	pub fn stats(&self) -> CacheStats {
		let state = Self::lock(&self.state);
		CacheStats {
			entry_count: state.entries.len() as u64,
			total_bytes: state.total_bytes,
			hit_count: state.hit_count,
			miss_count: state.miss_count,
		}
	}

	/// Returns the cached entry for `key`, or coalesces onto the single
	/// in-flight generation for it, or becomes that generation itself.
	///
	/// Guarantees under concurrent load:
	/// - at most one `generate` future runs per key at a time;
	/// - all concurrent requesters of a key receive the same result,
	///   success or failure;
	/// - requests for different keys never wait on each other;
	/// - an aborted requester does not cancel the generation (it runs in a
	///   detached task), so the remaining waiters still get their tile;
	/// - a generation exceeding `generation_timeout` fails every waiter with
	///   a transient error instead of hanging them.
	pub async fn get_or_generate<F, Fut>(&self, key: &str, generate: F) -> FlightResult
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = FlightResult> + Send + 'static,
	{
		let mut receiver = {
			let mut state = Self::lock(&self.state);
			if let Some(entry) = Self::lookup(&mut state, key) {
				return Ok(entry);
			}

			if let Some(sender) = state.inflight.get(key) {
				sender.subscribe()
			} else {
				let (sender, receiver) = broadcast::channel(1);
				state.inflight.insert(key.to_owned(), sender.clone());

				let config = self.config;
				let shared = Arc::clone(&self.state);
				let key = key.to_owned();
				let future = generate();
				tokio::spawn(async move {
					let result = match tokio::time::timeout(config.generation_timeout, future).await {
						Ok(result) => result,
						Err(_) => Err(TileError::transient(format!(
							"generating tile '{key}' timed out after {}ms",
							config.generation_timeout.as_millis()
						))),
					};

					// Cache the tile, drop the flight and publish under one
					// lock, so a request arriving now either sees the fresh
					// entry or starts a new flight; existing subscribers get
					// the send either way.
					let mut state = Self::lock(&shared);
					let result = result.map(|entry| {
						Self::insert_locked(&config, &mut state, &key, entry.clone());
						entry
					});
					state.inflight.remove(&key);
					let _ = sender.send(result);
					drop(state);
				});
				receiver
			}
		};

		match receiver.recv().await {
			Ok(result) => result,
			Err(_) => Err(TileError::transient(format!(
				"tile generation for '{key}' was aborted"
			))),
		}
	}

	fn lookup(state: &mut CacheState, key: &str) -> Option<CacheEntry> {
		// A non-gzip entry is corrupted; degrade to a miss and regenerate
		// instead of raising.
		let corrupted = state
			.entries
			.get(key)
			.is_some_and(|(entry, _)| !is_gzipped(entry.blob.as_slice()));
		if corrupted {
			if let Some((entry, _)) = state.entries.remove(key) {
				state.total_bytes -= entry.size_bytes();
				log::warn!("discarding corrupted cache entry '{key}'");
			}
		}

		state.last_index += 1;
		let index = state.last_index;
		let found = if let Some((entry, slot)) = state.entries.get_mut(key) {
			*slot = index;
			Some(entry.clone())
		} else {
			None
		};

		if found.is_some() {
			state.hit_count += 1;
		} else {
			state.miss_count += 1;
		}
		found
	}

	fn insert_locked(config: &TileCacheConfig, state: &mut CacheState, key: &str, entry: CacheEntry) {
		if let Some((old, _)) = state.entries.remove(key) {
			state.total_bytes -= old.size_bytes();
		}
		state.last_index += 1;
		let index = state.last_index;
		state.total_bytes += entry.size_bytes();
		state.entries.insert(key.to_owned(), (entry, index));
		Self::evict_locked(config, state);
	}

	fn evict_locked(config: &TileCacheConfig, state: &mut CacheState) {
		// A single oversized entry is kept rather than thrashing on a cache
		// that could never hold anything.
		while state.entries.len() > 1
			&& (state.entries.len() > config.max_entries || state.total_bytes > config.max_bytes)
		{
			let victim = state
				.entries
				.iter()
				.min_by_key(|(_, (_, index))| *index)
				.map(|(key, _)| key.clone());
			let Some(victim) = victim else { break };
			if let Some((entry, _)) = state.entries.remove(&victim) {
				state.total_bytes -= entry.size_bytes();
				log::debug!("evicted tile '{victim}' ({} bytes)", entry.size_bytes());
			}
		}
	}
}
