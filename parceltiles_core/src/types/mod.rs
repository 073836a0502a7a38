mod blob;
mod tile_bounds;
mod tile_coord;
mod tile_request;

pub use blob::*;
pub use tile_bounds::*;
pub use tile_coord::*;
pub use tile_request::*;
