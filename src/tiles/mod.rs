pub mod cache;
pub mod layer;
pub mod loader;
pub mod source;

// Re-exports for convenience
pub use cache::{TileCache, TileState};
pub use layer::TileLayer;
pub use loader::{HttpTransport, TileFetch, TileLoader, TileTransport};
pub use source::{
    OpenStreetMapSource, SatelliteSource, StamenTerrainSource, StamenWatercolorSource, TileSource,
};
