//! Command line interface for the parcel tile server.

mod fetcher;
mod server;

use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use fetcher::DirectoryFetcher;
use parceltiles_core::{LayerSignature, RetryPolicy, TileCacheConfig, TileService};
use server::TileServer;
use std::{path::PathBuf, sync::Arc, time::Duration};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
	/// Directory containing pre-rendered tiles as {zoom}/{x}/{y}.mvt
	tile_directory: PathBuf,

	/// Serve via socket ip.
	#[arg(short = 'i', long, default_value = "0.0.0.0")]
	ip: String,

	/// Serve via port.
	#[arg(short, long, default_value_t = 8080)]
	port: u16,

	/// Name of the served parcel layer.
	#[arg(long, default_value = "parcels")]
	layer: String,

	/// Data version of the layer; bump it to invalidate every cached tile.
	#[arg(long, default_value_t = 1)]
	layer_version: u32,

	/// Maximum number of cached tiles.
	#[arg(long, default_value_t = 10_000)]
	cache_max_entries: usize,

	/// Maximum total bytes of cached tiles.
	#[arg(long, default_value_t = 256 * 1024 * 1024)]
	cache_max_bytes: u64,

	/// Per-tile generation timeout in seconds.
	#[arg(long, default_value_t = 30)]
	generation_timeout: u64,

	#[command(flatten)]
	verbose: Verbosity<InfoLevel>,
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(&cli)
}

#[tokio::main]
async fn run(cli: &Cli) -> Result<()> {
	let fetcher = Arc::new(DirectoryFetcher::new(&cli.tile_directory)?);
	let service = TileService::new(
		fetcher,
		LayerSignature::new(&cli.layer, cli.layer_version),
		TileCacheConfig {
			max_entries: cli.cache_max_entries,
			max_bytes: cli.cache_max_bytes,
			generation_timeout: Duration::from_secs(cli.generation_timeout),
		},
		RetryPolicy::default(),
	);

	let mut server = TileServer::new(&cli.ip, cli.port, service);
	server.start().await?;

	tokio::signal::ctrl_c().await?;
	server.stop().await;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verify_cli() {
		use clap::CommandFactory;
		Cli::command().debug_assert();
	}

	#[test]
	fn defaults_are_sane() {
		let cli = Cli::parse_from(["parceltiles", "/tmp/tiles"]);
		assert_eq!(cli.ip, "0.0.0.0");
		assert_eq!(cli.port, 8080);
		assert_eq!(cli.layer, "parcels");
		assert_eq!(cli.layer_version, 1);
		assert_eq!(cli.cache_max_entries, 10_000);
	}
}
