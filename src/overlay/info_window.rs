use crate::constants::GLYPH_ADVANCE;
use crate::core::{
    config::Color,
    geo::{LatLng, LatLngBounds, Point},
};
use crate::overlay::{Frame, HitTest, Overlay, OverlayId, OverlayKind};
use crate::render::context::{CompositeMode, PathStyle, RenderContext, TextStyle};
use std::any::Any;

const MIN_BOX_WIDTH: f64 = 80.0;
const BOX_HEIGHT: f64 = 36.0;
// Gap between the anchor and the bottom of the box, bridged by the stem
const STEM_HEIGHT: f64 = 14.0;

/// Where an info window gets its anchor from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionSource {
    /// Pinned to a coordinate.
    Fixed(LatLng),
    /// Tracks another overlay's anchor; the window moves when the overlay
    /// does and hides while the overlay is missing.
    FollowsOverlay(OverlayId),
}

/// A text balloon floating above its anchor. Windows render above every
/// other overlay and only participate in drawing and hit testing while
/// open.
pub struct InfoWindow {
    id: OverlayId,
    source: PositionSource,
    content: String,
    open: bool,
}

impl InfoWindow {
    pub fn new(source: PositionSource, content: impl Into<String>) -> Self {
        Self {
            id: OverlayId::next(),
            source,
            content: content.into(),
            open: true,
        }
    }

    pub fn source(&self) -> PositionSource {
        self.source
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    fn box_width(&self) -> f64 {
        let text_width = self.content.chars().count() as f64 * GLYPH_ADVANCE;
        (text_width + 20.0).max(MIN_BOX_WIDTH)
    }

    /// Box corners relative to the anchor: (min, max).
    fn box_rect(&self, base: Point) -> (Point, Point) {
        let w = self.box_width();
        let min = Point::new(base.x - w / 2.0, base.y - STEM_HEIGHT - BOX_HEIGHT);
        let max = Point::new(base.x + w / 2.0, base.y - STEM_HEIGHT);
        (min, max)
    }
}

impl Overlay for InfoWindow {
    fn id(&self) -> OverlayId {
        self.id
    }

    fn kind(&self) -> OverlayKind {
        OverlayKind::Window
    }

    fn anchor(&self) -> Option<LatLng> {
        match self.source {
            PositionSource::Fixed(position) => Some(position),
            PositionSource::FollowsOverlay(_) => None,
        }
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        self.anchor().map(LatLngBounds::from_point)
    }

    fn draw(&self, ctx: &mut RenderContext, frame: &Frame, anchor: Point) {
        if !self.open {
            return;
        }
        let base = Point::new(anchor.x + frame.offset_x, anchor.y);
        let (min, max) = self.box_rect(base);

        let stem = [
            Point::new(base.x, base.y),
            Point::new(base.x - 6.0, base.y - STEM_HEIGHT),
            Point::new(base.x + 6.0, base.y - STEM_HEIGHT),
        ];
        ctx.draw_path(
            &stem,
            true,
            PathStyle {
                stroke_color: None,
                stroke_width: 0.0,
                fill_color: Some(Color::rgb(255, 255, 255)),
            },
            CompositeMode::SourceOver,
        );

        let outline = [
            min,
            Point::new(max.x, min.y),
            max,
            Point::new(min.x, max.y),
        ];
        ctx.draw_path(
            &outline,
            true,
            PathStyle {
                stroke_color: Some(Color::rgb(120, 120, 120)),
                stroke_width: 1.0,
                fill_color: Some(Color::rgb(255, 255, 255)),
            },
            CompositeMode::SourceOver,
        );

        ctx.draw_text(
            Point::new(min.x + 10.0, min.y + 22.0),
            &self.content,
            TextStyle {
                color: Color::rgb(0, 0, 0),
                size: 14.0,
            },
        );
    }

    fn hit_test(&self, ht: &HitTest) -> bool {
        if !self.open {
            return false;
        }
        let base = Point::new(ht.anchor.x + ht.offset_x, ht.anchor.y);
        let (min, max) = self.box_rect(base);
        ht.point.x >= min.x && ht.point.x <= max.x && ht.point.y >= min.y && ht.point.y <= max.y
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
