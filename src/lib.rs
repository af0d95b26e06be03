//! # slippy
//!
//! An embeddable slippy-map engine.
//!
//! `slippy` keeps a Web-Mercator viewport over a set of raster tile layers,
//! recognizes pointer and touch gestures, and draws tiles plus vector and
//! marker overlays into a backend-neutral draw-command queue. The host owns
//! the actual surface: it feeds input events in, pumps the map once per
//! frame, and replays the queued commands with whatever canvas it has.

pub mod core;
pub mod geocode;
pub mod input;
pub mod overlay;
pub mod prelude;
pub mod render;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{Color, MapOptions},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::Map,
    viewport::{Viewport, ViewportChange},
};

pub use crate::tiles::{
    cache::{TileCache, TileState},
    layer::TileLayer,
    loader::{TileLoader, TileTransport},
    source::TileSource,
};

pub use crate::input::{events::InputEvent, events::MapEvent, gestures::GestureRecognizer};

pub use crate::overlay::{
    info_window::InfoWindow, line::Line, marker::Marker, polygon::Polygon, Overlay, OverlayId,
};

pub use crate::render::{context::RenderContext, scheduler::RenderScheduler};

pub use crate::geocode::{geocode_async, GeocodeQuery, GeocodeResult, Geocoder, NominatimGeocoder};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tile decode error: {0}")]
    Decode(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Overlay error: {0}")]
    Overlay(String),

    #[error("Geocoder error: {0}")]
    Geocode(String),
}

/// Error type alias for convenience
pub type Error = MapError;
