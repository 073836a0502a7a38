mod tile_server;

pub use tile_server::TileServer;
