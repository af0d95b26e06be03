use crate::constants::GLYPH_ADVANCE;
use crate::core::{
    config::Color,
    geo::{LatLng, LatLngBounds, Point},
};
use crate::overlay::{point_in_ring, Frame, HitTest, Overlay, OverlayId, OverlayKind};
use crate::render::context::{CompositeMode, PathStyle, RenderContext, TextStyle};
use std::any::Any;

const POLE_HALF: f64 = 3.0;
const POLE_HEIGHT: f64 = 30.0;
const FLAG_HEIGHT: f64 = 22.5;
const MIN_FLAG_WIDTH: f64 = 32.0;
const PERSPECTIVE: f64 = 2.0;
// Bottom edge of the flag, measured up from the anchor
const FLAG_BOTTOM: f64 = FLAG_HEIGHT - POLE_HEIGHT;

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub fill: Color,
    pub stroke: Color,
    pub pole: Color,
    pub label: Color,
    pub label_size: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            fill: Color::new(255, 75, 75, 255),
            stroke: Color::new(100, 25, 25, 255),
            pole: Color::rgb(175, 175, 175),
            label: Color::rgb(0, 0, 0),
            label_size: 14.0,
        }
    }
}

/// A labelled flag planted at one coordinate. The anchor is the foot of
/// the pole; the flag flies up and to the right, wide enough for its
/// label.
pub struct Marker {
    id: OverlayId,
    position: LatLng,
    label: String,
    style: MarkerStyle,
    hit_shape: Option<Vec<Point>>,
}

impl Marker {
    pub fn new(position: LatLng, label: impl Into<String>) -> Self {
        Self {
            id: OverlayId::next(),
            position,
            label: label.into(),
            style: MarkerStyle::default(),
            hit_shape: None,
        }
    }

    pub fn with_style(mut self, style: MarkerStyle) -> Self {
        self.style = style;
        self
    }

    /// Replace the default flag outline used for hit testing, in pixels
    /// relative to the anchor.
    pub fn with_hit_shape(mut self, shape: Vec<Point>) -> Self {
        self.hit_shape = Some(shape);
        self
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn set_position(&mut self, position: LatLng) {
        self.position = position;
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn flag_width(&self) -> f64 {
        let text_width = self.label.chars().count() as f64 * GLYPH_ADVANCE;
        (text_width + 10.0).max(MIN_FLAG_WIDTH)
    }

    /// Outline of pole plus flag, anchored at the pole foot.
    fn flag_ring(&self) -> Vec<Point> {
        let fw = self.flag_width();
        vec![
            Point::new(0.0, 0.0),
            Point::new(-POLE_HALF, -POLE_HEIGHT),
            Point::new(POLE_HALF + fw, -POLE_HEIGHT),
            Point::new(POLE_HALF + fw - PERSPECTIVE, FLAG_BOTTOM),
            Point::new(POLE_HALF - PERSPECTIVE, FLAG_BOTTOM),
        ]
    }
}

impl Overlay for Marker {
    fn id(&self) -> OverlayId {
        self.id
    }

    fn kind(&self) -> OverlayKind {
        OverlayKind::Marker
    }

    fn anchor(&self) -> Option<LatLng> {
        Some(self.position)
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        Some(LatLngBounds::from_point(self.position))
    }

    fn draw(&self, ctx: &mut RenderContext, frame: &Frame, anchor: Point) {
        let base = Point::new(anchor.x + frame.offset_x, anchor.y);
        let fw = self.flag_width();

        let pole = [
            Point::new(base.x - POLE_HALF, base.y),
            Point::new(base.x - POLE_HALF, base.y - POLE_HEIGHT),
            Point::new(base.x + POLE_HALF, base.y - POLE_HEIGHT),
            Point::new(base.x + POLE_HALF, base.y),
        ];
        ctx.draw_path(
            &pole,
            true,
            PathStyle {
                stroke_color: None,
                stroke_width: 0.0,
                fill_color: Some(self.style.pole),
            },
            CompositeMode::SourceOver,
        );

        let flag = [
            Point::new(base.x + POLE_HALF, base.y - POLE_HEIGHT),
            Point::new(base.x + POLE_HALF + fw, base.y - POLE_HEIGHT),
            Point::new(base.x + POLE_HALF + fw - PERSPECTIVE, base.y + FLAG_BOTTOM),
            Point::new(base.x + POLE_HALF - PERSPECTIVE, base.y + FLAG_BOTTOM),
        ];
        ctx.draw_path(
            &flag,
            true,
            PathStyle {
                stroke_color: Some(self.style.stroke),
                stroke_width: 1.0,
                fill_color: Some(self.style.fill),
            },
            CompositeMode::SourceOver,
        );

        ctx.draw_text(
            Point::new(base.x + POLE_HALF + 5.0, base.y - POLE_HEIGHT + 16.0),
            &self.label,
            TextStyle {
                color: self.style.label,
                size: self.style.label_size,
            },
        );
    }

    fn hit_test(&self, ht: &HitTest) -> bool {
        let base = Point::new(ht.anchor.x + ht.offset_x, ht.anchor.y);
        let shape = match &self.hit_shape {
            Some(shape) => shape.clone(),
            None => self.flag_ring(),
        };
        let ring: Vec<Point> = shape.iter().map(|p| p.add(&base)).collect();
        point_in_ring(ht.point, &ring)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
