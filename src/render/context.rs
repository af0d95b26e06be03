use crate::{
    core::{config::Color, geo::Point},
    Result,
};
use std::sync::Arc;

/// Compositing rule for a draw command, mirroring the subset of canvas
/// composite operations the engine relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Paint over whatever is already on the canvas
    #[default]
    SourceOver,
    /// Paint only where the canvas is still transparent. Tiles use this so
    /// they slide underneath overlays that were drawn before them.
    DestinationOver,
    /// Erase existing pixels where the new shape lands. Polygon holes use
    /// this to punch through their fill.
    DestinationOut,
}

/// Stroke and fill for a path command
#[derive(Debug, Clone, PartialEq)]
pub struct PathStyle {
    pub stroke_color: Option<Color>,
    pub stroke_width: f64,
    pub fill_color: Option<Color>,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            stroke_color: Some(Color::rgb(0, 0, 0)),
            stroke_width: 1.0,
            fill_color: None,
        }
    }
}

/// Font settings for a text command
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    pub size: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::rgb(0, 0, 0),
            size: 14.0,
        }
    }
}

/// Commands that can be issued to the render context
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Decoded raster tile blitted with its top-left corner at `origin`
    Tile {
        pixels: Arc<image::RgbaImage>,
        origin: Point,
        composite: CompositeMode,
    },
    /// Axis-aligned filled rectangle
    Rect {
        min: Point,
        max: Point,
        color: Color,
        composite: CompositeMode,
    },
    /// Open or closed polyline in screen coordinates
    Path {
        points: Vec<Point>,
        closed: bool,
        style: PathStyle,
        composite: CompositeMode,
    },
    /// Single line of text anchored at its left baseline
    Text {
        position: Point,
        content: String,
        style: TextStyle,
    },
}

/// Backend-neutral rendering target.
///
/// The map pushes draw commands here each frame; the host replays them on
/// its real surface in queue order. Keeping the queue inspectable makes the
/// whole render path testable without a canvas.
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    /// Drawing primitives queued this frame, in paint order
    pub drawing_queue: Vec<DrawCommand>,
}

impl RenderContext {
    /// Create a new render context
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            drawing_queue: Vec::new(),
        }
    }

    /// Begin a frame
    pub fn begin_frame(&mut self) {
        self.drawing_queue.clear();
    }

    /// Queue a filled rectangle
    pub fn fill_rect(&mut self, min: Point, max: Point, color: Color, composite: CompositeMode) {
        self.drawing_queue.push(DrawCommand::Rect {
            min,
            max,
            color,
            composite,
        });
    }

    /// Queue a path in screen coordinates
    pub fn draw_path(
        &mut self,
        points: &[Point],
        closed: bool,
        style: PathStyle,
        composite: CompositeMode,
    ) {
        if points.len() < 2 {
            return;
        }
        self.drawing_queue.push(DrawCommand::Path {
            points: points.to_vec(),
            closed,
            style,
            composite,
        });
    }

    /// Queue a decoded tile with validation of its placement
    pub fn draw_tile(
        &mut self,
        pixels: Arc<image::RgbaImage>,
        origin: Point,
        composite: CompositeMode,
    ) -> Result<()> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(crate::MapError::Render("empty tile image".into()).into());
        }
        self.drawing_queue.push(DrawCommand::Tile {
            pixels,
            origin,
            composite,
        });
        Ok(())
    }

    /// Queue a line of text
    pub fn draw_text(&mut self, position: Point, content: &str, style: TextStyle) {
        if content.is_empty() {
            return;
        }
        self.drawing_queue.push(DrawCommand::Text {
            position,
            content: content.to_string(),
            style,
        });
    }

    /// Get the current drawing queue
    pub fn drawing_queue(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }
}
