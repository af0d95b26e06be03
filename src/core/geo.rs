use crate::core::constants::EARTH_RADIUS;
use serde::{Deserialize, Serialize};

/// Latitudes past this cannot be represented cleanly in Web Mercator.
const MAX_LATITUDE: f64 = 85.0511287798;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }

    pub fn lat_radians(&self) -> f64 {
        self.lat.to_radians()
    }

    pub fn lng_radians(&self) -> f64 {
        self.lng.to_radians()
    }

    /// Great-circle distance to another coordinate in meters, by the
    /// spherical law of cosines. `radius` overrides the spherical earth
    /// radius, e.g. for non-terrestrial tile sets.
    pub fn distance_from(&self, other: &LatLng, radius: Option<f64>) -> f64 {
        let r = radius.unwrap_or(EARTH_RADIUS);
        let lat1 = self.lat_radians();
        let lat2 = other.lat_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let cos_d = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * dlng.cos();
        // Rounding can push the dot product a hair past 1 for near-identical points.
        cos_d.clamp(-1.0, 1.0).acos() * r
    }

    /// Initial bearing from this coordinate toward another, in radians
    /// clockwise from north.
    pub fn bearing_to(&self, other: &LatLng) -> f64 {
        let dlng = other.lng_radians() - self.lng_radians();
        let y = dlng.sin() * other.lat_radians().cos();
        let x = self.lat_radians().cos() * other.lat_radians().sin()
            - self.lat_radians().sin() * other.lat_radians().cos() * dlng.cos();
        y.atan2(x)
    }

    /// Angle at `self` between the directions toward `a` and `b`, in
    /// radians within [0, pi].
    pub fn angle_between(&self, a: &LatLng, b: &LatLng) -> f64 {
        let diff = self.bearing_to(a) - self.bearing_to(b);
        let wrapped = diff.rem_euclid(std::f64::consts::TAU);
        if wrapped > std::f64::consts::PI {
            std::f64::consts::TAU - wrapped
        } else {
            wrapped
        }
    }

    /// Wraps longitude to [-180, 180] range
    pub fn wrap_lng(lng: f64) -> f64 {
        let mut lng = lng;
        while lng > 180.0 {
            lng -= 360.0;
        }
        while lng < -180.0 {
            lng += 360.0;
        }
        lng
    }

    /// Clamps latitude to the Mercator-representable range
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a point in screen or world pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }

    pub fn round(&self) -> Point {
        Point::new(self.x.round(), self.y.round())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a bounding box of geographical coordinates.
///
/// Bounds are never wrap-aware: `south_west.lng <= north_east.lng` holds by
/// construction, so a box spanning the antimeridian is simply wide. The
/// periodic nature of the world only exists in pixel space (tile x wrapping
/// and overlay draw tiling), never here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// Creates degenerate bounds containing a single point; grow with `extend`.
    pub fn from_point(point: LatLng) -> Self {
        Self::new(point, point)
    }

    /// Smallest bounds containing all of `points`, or `None` when empty.
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::from_point(*first);
        for point in rest {
            bounds.extend(point);
        }
        Some(bounds)
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }

    /// Checks if the bounds overlap another bounds
    pub fn overlaps(&self, other: &LatLngBounds) -> bool {
        !(other.north_east.lat < self.south_west.lat
            || other.south_west.lat > self.north_east.lat
            || other.north_east.lng < self.south_west.lng
            || other.south_west.lng > self.north_east.lng)
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &LatLng) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    /// Gets the span of the bounds
    pub fn span(&self) -> LatLng {
        LatLng::new(
            self.north_east.lat - self.south_west.lat,
            self.north_east.lng - self.south_west.lng,
        )
    }

    /// Returns the union of this bounds with another bounds
    pub fn union(&self, other: &LatLngBounds) -> LatLngBounds {
        let south = self.south_west.lat.min(other.south_west.lat);
        let west = self.south_west.lng.min(other.south_west.lng);
        let north = self.north_east.lat.max(other.north_east.lat);
        let east = self.north_east.lng.max(other.north_east.lng);

        LatLngBounds::new(LatLng::new(south, west), LatLng::new(north, east))
    }
}

/// Represents a tile coordinate in the slippy map tile system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Checks if the tile is valid for its zoom level
    pub fn is_valid(&self) -> bool {
        let max_coord = 2_u32.pow(self.z as u32);
        self.x < max_coord && self.y < max_coord
    }
}
