use crate::core::constants::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, TILE_SIZE};
use crate::core::geo::TileCoord;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait representing anything that can produce tile URLs for a given coordinate.
///
/// A source also declares its zoom range; the map clamps viewport zoom to it.
pub trait TileSource: Send + Sync {
    /// Short identifier, used in logs and the `map_type_changed` event.
    fn name(&self) -> &str;

    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;

    /// Attribution text the host should display.
    fn attribution(&self) -> &str;

    fn min_zoom(&self) -> u8 {
        DEFAULT_MIN_ZOOM
    }

    fn max_zoom(&self) -> u8 {
        DEFAULT_MAX_ZOOM
    }

    fn tile_size(&self) -> u32 {
        TILE_SIZE
    }
}

const STAMEN_ATTRIBUTION: &str =
    "Map tiles by Stamen Design, under CC BY 3.0. Data by OpenStreetMap, under CC BY SA.";

/// Default OpenStreetMap tile server, spreading requests over the `a` and
/// `b` subdomains. The rotation is a simple round-robin: requests have no
/// session affinity, which is all the upstream asks for.
pub struct OpenStreetMapSource {
    subdomains: &'static [&'static str],
    next: AtomicUsize,
}

impl OpenStreetMapSource {
    pub fn new() -> Self {
        Self {
            subdomains: &["a", "b"],
            next: AtomicUsize::new(0),
        }
    }
}

impl Default for OpenStreetMapSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TileSource for OpenStreetMapSource {
    fn name(&self) -> &str {
        "osm"
    }

    fn url(&self, coord: TileCoord) -> String {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.subdomains.len();
        format!(
            "https://{}.tile.openstreetmap.org/{}/{}/{}.png",
            self.subdomains[idx], coord.z, coord.x, coord.y
        )
    }

    fn attribution(&self) -> &str {
        "\u{a9} OpenStreetMap contributors"
    }
}

/// Stamen terrain tiles; only rendered for zooms 4 through 18.
pub struct StamenTerrainSource;

impl TileSource for StamenTerrainSource {
    fn name(&self) -> &str {
        "terrain"
    }

    fn url(&self, coord: TileCoord) -> String {
        format!(
            "https://c.tile.stamen.com/terrain/{}/{}/{}.jpg",
            coord.z, coord.x, coord.y
        )
    }

    fn attribution(&self) -> &str {
        STAMEN_ATTRIBUTION
    }

    fn min_zoom(&self) -> u8 {
        4
    }

    fn max_zoom(&self) -> u8 {
        18
    }
}

/// Stamen watercolor tiles.
pub struct StamenWatercolorSource;

impl TileSource for StamenWatercolorSource {
    fn name(&self) -> &str {
        "watercolor"
    }

    fn url(&self, coord: TileCoord) -> String {
        format!(
            "https://c.tile.stamen.com/watercolor/{}/{}/{}.jpg",
            coord.z, coord.x, coord.y
        )
    }

    fn attribution(&self) -> &str {
        STAMEN_ATTRIBUTION
    }

    fn min_zoom(&self) -> u8 {
        4
    }
}

/// MapQuest open aerial tiles, rotating over the four `otile` hosts.
pub struct SatelliteSource {
    next: AtomicUsize,
}

impl SatelliteSource {
    pub fn new() -> Self {
        Self {
            next: AtomicUsize::new(0),
        }
    }
}

impl Default for SatelliteSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TileSource for SatelliteSource {
    fn name(&self) -> &str {
        "satellite"
    }

    fn url(&self, coord: TileCoord) -> String {
        let server = self.next.fetch_add(1, Ordering::Relaxed) % 4 + 1;
        format!(
            "https://otile{}.mqcdn.com/tiles/1.0.0/sat/{}/{}/{}.jpg",
            server, coord.z, coord.x, coord.y
        )
    }

    fn attribution(&self) -> &str {
        "Tiles courtesy of MapQuest"
    }

    fn max_zoom(&self) -> u8 {
        18
    }
}
