use crate::constants::EARTH_RADIUS;
use crate::core::{
    config::Color,
    geo::{LatLng, LatLngBounds, Point},
    viewport::Viewport,
};
use crate::overlay::{point_in_ring, Frame, HitTest, Overlay, OverlayId, OverlayKind};
use crate::render::context::{CompositeMode, PathStyle, RenderContext};
use std::any::Any;

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonStyle {
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            fill: Color::rgb(150, 200, 150),
            stroke: Color::rgb(0, 200, 0),
            stroke_width: 4.0,
        }
    }
}

/// A filled region. The first ring is the outer boundary; any further
/// rings are holes, punched out of the fill when drawn and excluded from
/// containment and area.
pub struct Polygon {
    id: OverlayId,
    rings: Vec<Vec<LatLng>>,
    style: PolygonStyle,
}

impl Polygon {
    pub fn new(outer: Vec<LatLng>) -> Self {
        Self::from_rings(vec![outer])
    }

    pub fn from_rings(rings: Vec<Vec<LatLng>>) -> Self {
        Self {
            id: OverlayId::next(),
            rings,
            style: PolygonStyle::default(),
        }
    }

    pub fn with_style(mut self, style: PolygonStyle) -> Self {
        self.style = style;
        self
    }

    pub fn rings(&self) -> &[Vec<LatLng>] {
        &self.rings
    }

    /// Whether a coordinate lies inside the polygon, holes excluded.
    /// Even-odd over all rings: a point inside an odd number of rings is
    /// inside the polygon.
    pub fn contains(&self, location: &LatLng) -> bool {
        let mut inside = false;
        for ring in &self.rings {
            let flat: Vec<Point> = ring.iter().map(|p| Point::new(p.lng, p.lat)).collect();
            if point_in_ring(Point::new(location.lng, location.lat), &flat) {
                inside = !inside;
            }
        }
        inside
    }

    /// Surface area in square meters on the sphere, holes subtracted.
    ///
    /// Each ring is fanned into triangles from its first vertex and each
    /// triangle's spherical excess comes from l'Huilier's theorem, signed
    /// by the orientation of the triangle's unit vectors.
    pub fn area(&self) -> f64 {
        let mut total = 0.0;
        for (index, ring) in self.rings.iter().enumerate() {
            let excess = ring_excess(ring).abs();
            if index == 0 {
                total += excess;
            } else {
                total -= excess;
            }
        }
        total.max(0.0) * EARTH_RADIUS * EARTH_RADIUS
    }

    fn project_ring(&self, ring: &[LatLng], viewport: &Viewport, offset_x: f64) -> Vec<Point> {
        ring.iter()
            .map(|p| {
                let screen = viewport.lat_lng_to_screen(p);
                Point::new(screen.x + offset_x, screen.y)
            })
            .collect()
    }
}

/// Signed spherical excess of one ring, in steradians.
fn ring_excess(ring: &[LatLng]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let origin = unit_vector(&ring[0]);
    let mut excess = 0.0;
    for pair in ring[1..].windows(2) {
        let b = unit_vector(&pair[0]);
        let c = unit_vector(&pair[1]);
        excess += triangle_excess(origin, b, c);
    }
    excess
}

fn unit_vector(p: &LatLng) -> [f64; 3] {
    let lat = p.lat_radians();
    let lng = p.lng_radians();
    [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
}

fn central_angle(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
    dot.clamp(-1.0, 1.0).acos()
}

/// L'Huilier's theorem, with the sign taken from the scalar triple
/// product so clockwise and counterclockwise fans cancel correctly in
/// concave rings.
fn triangle_excess(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    let ab = central_angle(a, b);
    let bc = central_angle(b, c);
    let ca = central_angle(c, a);
    let s = (ab + bc + ca) / 2.0;
    let product = (s / 2.0).tan()
        * ((s - ab) / 2.0).tan()
        * ((s - bc) / 2.0).tan()
        * ((s - ca) / 2.0).tan();
    let excess = 4.0 * product.max(0.0).sqrt().atan();

    let triple = a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
        + a[2] * (b[0] * c[1] - b[1] * c[0]);
    if triple < 0.0 {
        -excess
    } else {
        excess
    }
}

impl Overlay for Polygon {
    fn id(&self) -> OverlayId {
        self.id
    }

    fn kind(&self) -> OverlayKind {
        OverlayKind::Vector
    }

    fn anchor(&self) -> Option<LatLng> {
        None
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        let all: Vec<LatLng> = self.rings.iter().flatten().copied().collect();
        LatLngBounds::from_points(&all)
    }

    fn draw(&self, ctx: &mut RenderContext, frame: &Frame, _anchor: Point) {
        let mut rings = self.rings.iter();
        let Some(outer) = rings.next() else {
            return;
        };
        let outer_points = self.project_ring(outer, frame.viewport, frame.offset_x);
        ctx.draw_path(
            &outer_points,
            true,
            PathStyle {
                stroke_color: Some(self.style.stroke),
                stroke_width: self.style.stroke_width,
                fill_color: Some(self.style.fill),
            },
            CompositeMode::SourceOver,
        );

        for hole in rings {
            let hole_points = self.project_ring(hole, frame.viewport, frame.offset_x);
            // Punch the hole out of the fill, then outline it
            ctx.draw_path(
                &hole_points,
                true,
                PathStyle {
                    stroke_color: None,
                    stroke_width: 0.0,
                    fill_color: Some(self.style.fill),
                },
                CompositeMode::DestinationOut,
            );
            ctx.draw_path(
                &hole_points,
                true,
                PathStyle {
                    stroke_color: Some(self.style.stroke),
                    stroke_width: self.style.stroke_width,
                    fill_color: None,
                },
                CompositeMode::SourceOver,
            );
        }
    }

    fn hit_test(&self, ht: &HitTest) -> bool {
        let mut inside = false;
        for ring in &self.rings {
            let points = self.project_ring(ring, ht.viewport, ht.offset_x);
            if point_in_ring(ht.point, &points) {
                inside = !inside;
            }
        }
        inside
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(center: LatLng, half: f64) -> Vec<LatLng> {
        vec![
            LatLng::new(center.lat - half, center.lng - half),
            LatLng::new(center.lat - half, center.lng + half),
            LatLng::new(center.lat + half, center.lng + half),
            LatLng::new(center.lat + half, center.lng - half),
        ]
    }

    #[test]
    fn test_contains_respects_holes() {
        let polygon = Polygon::from_rings(vec![
            square(LatLng::new(0.0, 0.0), 10.0),
            square(LatLng::new(0.0, 0.0), 2.0),
        ]);
        assert!(polygon.contains(&LatLng::new(5.0, 5.0)));
        assert!(!polygon.contains(&LatLng::new(0.5, 0.5)));
        assert!(!polygon.contains(&LatLng::new(20.0, 0.0)));
    }

    #[test]
    fn test_area_of_equatorial_square() {
        // A 1-degree square at the equator covers close to
        // 111.2 km x 111.2 km
        let polygon = Polygon::new(square(LatLng::new(0.0, 0.0), 0.5));
        let area = polygon.area();
        let expected = 111_195.0_f64 * 111_195.0;
        assert!(
            (area - expected).abs() / expected < 0.01,
            "area {area}, expected about {expected}"
        );
    }

    #[test]
    fn test_hole_reduces_area() {
        let solid = Polygon::new(square(LatLng::new(0.0, 0.0), 1.0));
        let holed = Polygon::from_rings(vec![
            square(LatLng::new(0.0, 0.0), 1.0),
            square(LatLng::new(0.0, 0.0), 0.5),
        ]);
        let solid_area = solid.area();
        let holed_area = holed.area();
        assert!(holed_area < solid_area);
        assert!((holed_area / solid_area - 0.75).abs() < 0.01);
    }

    #[test]
    fn test_two_rings_measure_independently() {
        let near = Polygon::new(square(LatLng::new(0.0, 0.0), 0.5));
        let far = Polygon::new(square(LatLng::new(0.0, 120.0), 0.5));
        let a = near.area();
        let b = far.area();
        assert!((a / b - 1.0).abs() < 0.01, "a {a}, b {b}");
    }

    #[test]
    fn test_draw_punches_holes() {
        let polygon = Polygon::from_rings(vec![
            square(LatLng::new(0.0, 0.0), 10.0),
            square(LatLng::new(0.0, 0.0), 2.0),
        ]);
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 4, Point::new(600.0, 600.0));
        let mut ctx = RenderContext::new(600, 600);
        polygon.draw(
            &mut ctx,
            &Frame {
                viewport: &viewport,
                offset_x: 0.0,
            },
            Point::new(0.0, 0.0),
        );

        let punches = ctx
            .drawing_queue()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    crate::render::context::DrawCommand::Path {
                        composite: CompositeMode::DestinationOut,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(punches, 1);
        assert_eq!(ctx.drawing_queue().len(), 3);
    }

    #[test]
    fn test_screen_hit_test_with_hole() {
        let polygon = Polygon::from_rings(vec![
            square(LatLng::new(0.0, 0.0), 20.0),
            square(LatLng::new(0.0, 0.0), 5.0),
        ]);
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 3, Point::new(600.0, 600.0));
        let probe = |point| {
            polygon.hit_test(&HitTest {
                point,
                anchor: Point::new(0.0, 0.0),
                viewport: &viewport,
                offset_x: 0.0,
            })
        };

        let center = Point::new(300.0, 300.0);
        // Center falls in the hole
        assert!(!probe(center));
        // Inside the outer ring, outside the hole
        let ring_point = viewport.lat_lng_to_screen(&LatLng::new(10.0, 10.0));
        assert!(probe(ring_point));
        // Outside everything
        assert!(!probe(Point::new(5.0, 5.0)));
    }
}
