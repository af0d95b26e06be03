//! Prelude module for common slippy types and traits
//!
//! Re-exports the most commonly used types, traits, and functions for easy
//! importing with `use slippy::prelude::*;`

pub use crate::core::{
    config::{Color, MapOptions},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::Map,
    projection,
    viewport::{Viewport, ViewportChange},
};

pub use crate::tiles::{
    cache::{TileCache, TileState},
    layer::TileLayer,
    loader::{HttpTransport, TileLoader, TileTransport},
    source::{
        OpenStreetMapSource, SatelliteSource, StamenTerrainSource, StamenWatercolorSource,
        TileSource,
    },
};

pub use crate::input::{
    events::{InputEvent, MapEvent, MouseButton, TouchPoint},
    gestures::{Action, GestureRecognizer},
    EventManager,
};

pub use crate::overlay::{
    info_window::{InfoWindow, PositionSource},
    line::{Line, LineStyle},
    marker::{Marker, MarkerStyle},
    polygon::{Polygon, PolygonStyle},
    Frame, HitTest, Overlay, OverlayId, OverlayKind,
};

pub use crate::render::{
    context::{CompositeMode, DrawCommand, RenderContext},
    scheduler::RenderScheduler,
};

pub use crate::geocode::{geocode_async, GeocodeQuery, GeocodeResult, Geocoder, NominatimGeocoder};

pub use crate::{Error as MapError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
