//! Web-Mercator projection between geographic coordinates and world pixels.
//!
//! World pixel space at zoom `z` is a square of `256 * 2^z` pixels with the
//! origin at the top-left (lat 85.05..., lng -180). The forward transform
//! rounds to whole pixels so that a coordinate always lands on the same
//! canvas pixel regardless of the arithmetic path that produced it.

use crate::core::constants::TILE_SIZE;
use crate::core::geo::{LatLng, Point};
use std::f64::consts::PI;

/// Sine of the latitude is clamped here before the Mercator stretch, which
/// caps the projectable latitude just short of the poles.
const MAX_SIN_LAT: f64 = 0.9999;

/// Number of tiles along one axis at the given zoom level.
pub fn tile_count(zoom: u8) -> u32 {
    1_u32 << zoom
}

/// Width (and height) of the world in pixels at the given zoom level.
pub fn world_size(zoom: u8) -> f64 {
    (TILE_SIZE as f64) * (tile_count(zoom) as f64)
}

/// Projects a geographic coordinate to world pixels, rounded to integers.
pub fn project(lat_lng: &LatLng, zoom: u8) -> Point {
    let world = world_size(zoom);
    let x = ((lat_lng.lng + 180.0) / 360.0 * world).round();

    let e = lat_lng.lat_radians().sin().clamp(-MAX_SIN_LAT, MAX_SIN_LAT);
    // atanh(sin lat), scaled so the top edge of the world is y = 0
    let y = (world / 2.0 + 0.5 * ((1.0 + e) / (1.0 - e)).ln() * (-world / (2.0 * PI))).round();

    Point::new(x, y)
}

/// Unprojects world pixels back to a geographic coordinate. Longitude is
/// wrapped into [-180, 180], so a point one world-width to the east maps to
/// the same coordinate.
pub fn unproject(point: &Point, zoom: u8) -> LatLng {
    let lat_lng = unproject_unwrapped(point, zoom);
    LatLng::new(lat_lng.lat, LatLng::wrap_lng(lat_lng.lng))
}

/// Like [`unproject`], with the longitude left unwrapped. Viewport bounds
/// use this so that east stays numerically greater than west across the
/// antimeridian.
pub fn unproject_unwrapped(point: &Point, zoom: u8) -> LatLng {
    let world = world_size(zoom);
    let lng = point.x / world * 360.0 - 180.0;

    let g = (world / 2.0 - point.y) * (2.0 * PI) / world;
    let lat = (2.0 * g.exp().atan() - PI / 2.0).to_degrees();

    LatLng::new(lat.clamp(-90.0, 90.0), lng)
}
