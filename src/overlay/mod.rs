pub mod info_window;
pub mod line;
pub mod marker;
pub mod polygon;

// Re-export the essential types
pub use info_window::{InfoWindow, PositionSource};
pub use line::{Line, LineStyle};
pub use marker::{Marker, MarkerStyle};
pub use polygon::{Polygon, PolygonStyle};

use crate::core::{
    geo::{LatLng, LatLngBounds, Point},
    projection,
    viewport::Viewport,
};
use crate::render::context::RenderContext;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique overlay handle, used for event payloads and for windows
/// that follow another overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

static NEXT_OVERLAY_ID: AtomicU64 = AtomicU64::new(1);

impl OverlayId {
    pub fn next() -> Self {
        OverlayId(NEXT_OVERLAY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Which drawing bucket an overlay belongs to. Vectors render below
/// markers, markers below windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Vector,
    Marker,
    Window,
}

/// Per-pass drawing context. `offset_x` shifts the whole pass by a whole
/// number of world widths so overlays repeat across the antimeridian.
pub struct Frame<'a> {
    pub viewport: &'a Viewport,
    pub offset_x: f64,
}

/// Inputs for a pointer hit test against one overlay, in screen pixels.
pub struct HitTest<'a> {
    pub point: Point,
    pub anchor: Point,
    pub viewport: &'a Viewport,
    pub offset_x: f64,
}

/// Anything the map can draw above the tiles and route pointer events to.
///
/// `anchor` is the single coordinate the map resolves to screen pixels
/// before calling `draw` and `hit_test`; shapes with many vertices return
/// `None` and project their own points through the frame's viewport.
pub trait Overlay: Send {
    fn id(&self) -> OverlayId;
    fn kind(&self) -> OverlayKind;
    fn anchor(&self) -> Option<LatLng>;
    fn bounds(&self) -> Option<LatLngBounds>;
    fn draw(&self, ctx: &mut RenderContext, frame: &Frame, anchor: Point);
    fn hit_test(&self, ht: &HitTest) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// World-width multiples whose copy of the world intersects the canvas
/// horizontally. Drawing every overlay once per offset makes shapes near
/// the antimeridian appear on both sides.
pub fn wrap_offsets(viewport: &Viewport) -> Vec<f64> {
    let world = projection::world_size(viewport.zoom);
    let top_left = viewport.top_left();
    let first = (top_left.x / world).floor() as i64;
    // A copy starting exactly at the right canvas edge is off-screen
    let last = ((top_left.x + viewport.size.x) / world).ceil() as i64 - 1;
    (first..=last).map(|i| i as f64 * world).collect()
}

/// Even-odd ray cast: count edge crossings of a horizontal ray going right
/// from `point`.
pub(crate) fn point_in_ring(point: Point, ring: &[Point]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if (a.y > point.y) != (b.y > point.y) {
            let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Distance from `point` to the closed segment `a`..`b`.
pub(crate) fn point_to_segment_distance(point: Point, a: Point, b: Point) -> f64 {
    let ab = b.subtract(&a);
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return point.distance_to(&a);
    }
    let ap = point.subtract(&a);
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    let closest = Point::new(a.x + ab.x * t, a.y + ab.y * t);
    point.distance_to(&closest)
}
