use crate::core::geo::{LatLng, LatLngBounds, Point};
use crate::core::projection;
use serde::{Deserialize, Serialize};

/// The current view of the map: center, integer zoom, and canvas size.
///
/// Geographic bounds are derived, not stored, so they can never go stale:
/// every read of [`Viewport::bounds`] reflects the latest center and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: u8,
    /// The size of the viewport in pixels
    pub size: Point,
}

/// Partial viewport update; unset fields keep their current values. When
/// `bounds` is set it wins over `center` and `zoom`: the map fits the
/// bounds instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportChange {
    pub center: Option<LatLng>,
    pub zoom: Option<u8>,
    pub bounds: Option<LatLngBounds>,
}

impl ViewportChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(center: LatLng) -> Self {
        Self::new().with_center(center)
    }

    pub fn zoom(zoom: u8) -> Self {
        Self::new().with_zoom(zoom)
    }

    pub fn bounds(bounds: LatLngBounds) -> Self {
        Self::new().with_bounds(bounds)
    }

    pub fn with_center(mut self, center: LatLng) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn with_bounds(mut self, bounds: LatLngBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: u8, size: Point) -> Self {
        Self { center, zoom, size }
    }

    /// World pixel coordinates of the canvas's top-left corner.
    pub fn top_left(&self) -> Point {
        let center_px = projection::project(&self.center, self.zoom);
        Point::new(
            center_px.x - self.size.x / 2.0,
            center_px.y - self.size.y / 2.0,
        )
    }

    /// Converts world pixels to canvas pixels.
    pub fn world_to_screen(&self, world: &Point) -> Point {
        world.subtract(&self.top_left())
    }

    /// Converts canvas pixels to world pixels.
    pub fn screen_to_world(&self, screen: &Point) -> Point {
        screen.add(&self.top_left())
    }

    /// Projects a geographical coordinate to canvas pixels.
    pub fn lat_lng_to_screen(&self, lat_lng: &LatLng) -> Point {
        self.world_to_screen(&projection::project(lat_lng, self.zoom))
    }

    /// Unprojects canvas pixels to a geographical coordinate.
    pub fn screen_to_lat_lng(&self, screen: &Point) -> LatLng {
        projection::unproject(&self.screen_to_world(screen), self.zoom)
    }

    /// Geographic bounds currently visible on the canvas.
    ///
    /// Longitudes are left unwrapped so that `south_west.lng` is always less
    /// than or equal to `north_east.lng`, even across the antimeridian.
    pub fn bounds(&self) -> LatLngBounds {
        let top_left = self.top_left();
        let bottom_right = top_left.add(&self.size);

        let nw = projection::unproject_unwrapped(&top_left, self.zoom);
        let se = projection::unproject_unwrapped(&bottom_right, self.zoom);

        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }

    /// Highest zoom in `[min_zoom, max_zoom]` at which `bounds` fits inside
    /// a canvas of `size` pixels, walking down from `max_zoom`. Falls back
    /// to `min_zoom` when the bounds never fit.
    pub fn fit_zoom(bounds: &LatLngBounds, size: Point, min_zoom: u8, max_zoom: u8) -> u8 {
        for zoom in (min_zoom..=max_zoom).rev() {
            let sw = projection::project(&bounds.south_west, zoom);
            let ne = projection::project(&bounds.north_east, zoom);
            let width = ne.x - sw.x;
            let height = sw.y - ne.y;
            if width <= size.x && height <= size.y {
                return zoom;
            }
        }
        min_zoom
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0, Point::new(800.0, 600.0))
    }
}
