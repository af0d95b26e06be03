use crate::core::constants::DEFAULT_TILE_CACHE_CAPACITY;
use crate::core::geo::{LatLng, Point};
use serde::{Deserialize, Serialize};

/// RGBA color used by draw commands and overlay styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Neutral grey drawn wherever no tile pixel landed
    pub const BACKGROUND: Color = Color {
        r: 100,
        g: 100,
        b: 100,
        a: 255,
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapOptions {
    /// Initial center of the viewport
    pub center: LatLng,
    /// Initial zoom level; clamped to the active tile source's range
    pub zoom: u8,
    /// Canvas size in pixels
    pub size: Point,
    /// Tightens the base tile source's zoom range; never widens it
    pub min_zoom: Option<u8>,
    pub max_zoom: Option<u8>,
    pub dragging: bool,
    pub scroll_wheel_zoom: bool,
    pub double_click_zoom: bool,
    pub touch_zoom: bool,
    /// Fill color behind tiles and for unloaded tiles
    pub background_color: Color,
    /// Capacity of each tile layer's LRU cache, in tiles
    pub tile_cache_capacity: usize,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: LatLng::new(0.0, 0.0),
            zoom: 0,
            size: Point::new(800.0, 600.0),
            min_zoom: None,
            max_zoom: None,
            dragging: true,
            scroll_wheel_zoom: true,
            double_click_zoom: true,
            touch_zoom: true,
            background_color: Color::BACKGROUND,
            tile_cache_capacity: DEFAULT_TILE_CACHE_CAPACITY,
        }
    }
}
