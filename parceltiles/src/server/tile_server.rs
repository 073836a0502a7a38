//! The HTTP delivery boundary around [`TileService`].
//!
//! Routes:
//! - `GET /tiles/mvt/{zoom}/{x}/{y}` serves a gzip-compressed vector tile,
//!   honouring `If-None-Match` with `304 Not Modified`.
//! - `OPTIONS /tiles/mvt/{zoom}/{x}/{y}` answers CORS preflights.
//! - `GET /tiles/stats` exposes cache counters as JSON.
//! - `GET /health` is a plain liveness probe.

use anyhow::Result;
use axum::{
	Router,
	body::Body,
	extract::{Path, State},
	http::{
		HeaderMap, StatusCode,
		header::{
			ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL,
			CONTENT_ENCODING, CONTENT_TYPE, ETAG, IF_NONE_MATCH,
		},
	},
	response::Response,
	routing::get,
};
use parceltiles_core::{CacheEntry, FaultKind, TileError, TileService};
use tokio::sync::oneshot::Sender;

const TILE_MIME: &str = "application/vnd.mapbox-vector-tile";
const TILE_CACHE_CONTROL: &str = "public, max-age=3600, no-transform";

pub struct TileServer {
	ip: String,
	port: u16,
	service: TileService,
	exit_signal: Option<Sender<()>>,
}

impl TileServer {
	#[must_use]
	pub fn new(ip: &str, port: u16, service: TileService) -> TileServer {
		TileServer {
			ip: ip.to_owned(),
			port,
			service,
			exit_signal: None,
		}
	}

	pub async fn start(&mut self) -> Result<()> {
		if self.exit_signal.is_some() {
			self.stop().await;
		}

		let router = build_router(self.service.clone());
		let address = format!("{}:{}", self.ip, self.port);
		let listener = tokio::net::TcpListener::bind(&address).await?;
		log::info!("tile server listens on http://{address}/ (layer {})", self.service.layer());

		let (tx, rx) = tokio::sync::oneshot::channel::<()>();
		tokio::spawn(async move {
			if let Err(err) = axum::serve(listener, router.into_make_service())
				.with_graceful_shutdown(async {
					rx.await.ok();
				})
				.await
			{
				log::error!("tile server failed: {err}");
			}
		});

		self.exit_signal = Some(tx);
		Ok(())
	}

	pub async fn stop(&mut self) {
		if let Some(tx) = self.exit_signal.take() {
			log::info!("stopping tile server");
			let _ = tx.send(());
		}
	}
}

fn build_router(service: TileService) -> Router {
	Router::new()
		.route("/health", get(|| async { "ok" }))
		.route("/tiles/stats", get(cache_stats))
		.route("/tiles/mvt/{zoom}/{x}/{y}", get(serve_tile).options(preflight))
		.with_state(service)
}

async fn serve_tile(
	Path((zoom, x, y)): Path<(u32, u32, u32)>,
	headers: HeaderMap,
	State(service): State<TileService>,
) -> Response<Body> {
	match service.get_tile(zoom, x, y).await {
		Ok(entry) => {
			let unchanged = headers
				.get(IF_NONE_MATCH)
				.and_then(|value| value.to_str().ok())
				.is_some_and(|value| value == entry.etag);
			if unchanged {
				not_modified(&entry)
			} else {
				ok_tile(entry)
			}
		}
		Err(err) => error_response(&err),
	}
}

async fn preflight() -> Response<Body> {
	Response::builder()
		.status(StatusCode::OK)
		.header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
		.header(ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS")
		.body(Body::empty())
		.unwrap()
}

async fn cache_stats(State(service): State<TileService>) -> Response<Body> {
	let stats = service.cache_stats();
	let json = format!(
		"{{\"entry_count\":{},\"total_bytes\":{},\"hit_count\":{},\"miss_count\":{}}}",
		stats.entry_count, stats.total_bytes, stats.hit_count, stats.miss_count
	);
	Response::builder()
		.status(StatusCode::OK)
		.header(CONTENT_TYPE, "application/json")
		.header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
		.body(Body::from(json))
		.unwrap()
}

fn ok_tile(entry: CacheEntry) -> Response<Body> {
	Response::builder()
		.status(StatusCode::OK)
		.header(CONTENT_TYPE, TILE_MIME)
		.header(CONTENT_ENCODING, "gzip")
		.header(CACHE_CONTROL, TILE_CACHE_CONTROL)
		.header(ETAG, entry.etag)
		.header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
		.body(Body::from(entry.blob.into_vec()))
		.unwrap()
}

fn not_modified(entry: &CacheEntry) -> Response<Body> {
	Response::builder()
		.status(StatusCode::NOT_MODIFIED)
		.header(ETAG, entry.etag.clone())
		.header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
		.body(Body::empty())
		.unwrap()
}

fn error_response(err: &TileError) -> Response<Body> {
	let status = match err {
		TileError::Validation(_) => StatusCode::BAD_REQUEST,
		TileError::DataSource {
			kind: FaultKind::Permanent,
			..
		} => StatusCode::BAD_GATEWAY,
		TileError::DataSource {
			kind: FaultKind::Transient,
			..
		} => StatusCode::SERVICE_UNAVAILABLE,
		TileError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
	};
	log::warn!("tile request failed with {status}: {err}");
	Response::builder()
		.status(status)
		.body(Body::from(err.to_string()))
		.unwrap()
}
