pub mod config;
pub mod constants;
pub mod geo;
pub mod map;
pub mod projection;
pub mod viewport;

// Re-export the essential types
pub use config::{Color, MapOptions};
pub use geo::{LatLng, LatLngBounds, Point, TileCoord};
pub use map::Map;
pub use viewport::{Viewport, ViewportChange};
