//! Engine-wide constants derived from common web-map conventions.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

use std::time::Duration;

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Default zoom range when a tile source does not narrow it.
pub const DEFAULT_MIN_ZOOM: u8 = 0;
pub const DEFAULT_MAX_ZOOM: u8 = 19;

/// Spherical earth radius in meters used for all geodesic math.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// A press released within this window, without any movement, is a click.
pub const CLICK_MAX_DURATION: Duration = Duration::from_millis(100);

/// Wheel input arms a single zoom step that fires after this delay; further
/// wheel events inside the window re-arm it instead of stacking.
pub const WHEEL_ZOOM_DELAY: Duration = Duration::from_millis(500);

/// A two-finger gesture must complete within this window to count as a pinch.
pub const PINCH_MAX_DURATION: Duration = Duration::from_millis(500);

/// Minimum change in finger separation (in pixels) for a pinch zoom step.
pub const PINCH_MIN_DISTANCE: f64 = 150.0;

/// First retry delay after a failed tile fetch; doubles on each attempt.
pub const TILE_RETRY_BASE: Duration = Duration::from_millis(500);

/// A tile that fails this many fetches is marked broken and never retried.
pub const TILE_MAX_ATTEMPTS: u32 = 3;

/// Default capacity of the per-layer tile cache, in tiles.
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 1024;

/// Approximate advance width per glyph for the default marker label font.
/// The engine has no font metrics of its own, so flag sizing uses this.
pub const GLYPH_ADVANCE: f64 = 7.0;

/// Timeout for a geocoding request.
pub const GEOCODE_TIMEOUT: Duration = Duration::from_millis(2_500);
