use crate::core::{
    config::Color,
    geo::{LatLng, LatLngBounds, Point},
};
use crate::overlay::{point_to_segment_distance, Frame, HitTest, Overlay, OverlayId, OverlayKind};
use crate::render::context::{CompositeMode, PathStyle, RenderContext};
use std::any::Any;

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    pub width: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Color::rgb(0, 100, 200),
            width: 4.0,
        }
    }
}

/// One or more open polylines drawn with a single style. A pointer hits
/// the line when it lands within half the stroke width of any segment.
pub struct Line {
    id: OverlayId,
    paths: Vec<Vec<LatLng>>,
    style: LineStyle,
}

impl Line {
    pub fn new(points: Vec<LatLng>) -> Self {
        Self::from_paths(vec![points])
    }

    pub fn from_paths(paths: Vec<Vec<LatLng>>) -> Self {
        Self {
            id: OverlayId::next(),
            paths,
            style: LineStyle::default(),
        }
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    pub fn paths(&self) -> &[Vec<LatLng>] {
        &self.paths
    }

    pub fn style(&self) -> &LineStyle {
        &self.style
    }

    /// Append points to the first path, growing the line in place.
    pub fn extend(&mut self, points: Vec<LatLng>) {
        match self.paths.first_mut() {
            Some(path) => path.extend(points),
            None => self.paths.push(points),
        }
    }

    /// Whether the first path loops back to its starting point.
    pub fn is_closed(&self) -> bool {
        self.paths
            .first()
            .map_or(false, |path| path.len() > 2 && path.first() == path.last())
    }

    /// Total ground length in meters, or in the unit of `radius` when one
    /// is given.
    pub fn length(&self, radius: Option<f64>) -> f64 {
        let mut total = 0.0;
        for path in &self.paths {
            for pair in path.windows(2) {
                total += pair[0].distance_from(&pair[1], radius);
            }
        }
        total
    }

    fn project_path(
        &self,
        path: &[LatLng],
        viewport: &crate::core::viewport::Viewport,
        offset_x: f64,
    ) -> Vec<Point> {
        path.iter()
            .map(|p| {
                let screen = viewport.lat_lng_to_screen(p);
                Point::new(screen.x + offset_x, screen.y)
            })
            .collect()
    }
}

impl Overlay for Line {
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
        let all: Vec<LatLng> = self.paths.iter().flatten().copied().collect();
        LatLngBounds::from_points(&all)
    }

    fn draw(&self, ctx: &mut RenderContext, frame: &Frame, _anchor: Point) {
        for path in &self.paths {
            let points = self.project_path(path, frame.viewport, frame.offset_x);
            ctx.draw_path(
                &points,
                false,
                PathStyle {
                    stroke_color: Some(self.style.color),
                    stroke_width: self.style.width,
                    fill_color: None,
                },
                CompositeMode::SourceOver,
            );
        }
    }

    fn hit_test(&self, ht: &HitTest) -> bool {
        let threshold = self.style.width / 2.0;
        for path in &self.paths {
            let points = self.project_path(path, ht.viewport, ht.offset_x);
            for pair in points.windows(2) {
                if point_to_segment_distance(ht.point, pair[0], pair[1]) <= threshold {
                    return true;
                }
            }
        }
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
