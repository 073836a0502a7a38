//! Core of the parcel vector-tile pipeline.
//!
//! Contains the tile coordinate math, cache keys, gzip compression, content
//! hashing, the single-flight tile cache and the generation service that ties
//! them together. The HTTP delivery layer lives in the `parceltiles` crate.

pub mod cache;
pub mod compression;
pub mod error;
pub mod generator;
pub mod hash;
pub mod service;
pub mod types;

pub use cache::*;
pub use compression::*;
pub use error::*;
pub use generator::*;
pub use hash::*;
pub use service::*;
pub use types::*;
