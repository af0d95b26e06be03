use crate::{
    core::{
        config::Color,
        geo::{Point, TileCoord},
        projection,
        viewport::Viewport,
    },
    render::context::{CompositeMode, RenderContext},
    tiles::{
        cache::{TileCache, TileState},
        loader::TileLoader,
        source::TileSource,
    },
    Result,
};
use std::time::Instant;

/// Shade used for tiles that exhausted their fetch attempts.
const BROKEN_TILE_COLOR: Color = Color {
    r: 80,
    g: 80,
    b: 80,
    a: 255,
};

/// One raster tile pyramid: a source for URLs, a cache of decoded tiles,
/// and a loader that fetches in the background.
///
/// Tile columns wrap around the world: the column index is reduced modulo
/// the tile count before it becomes a cache key or a URL, while the screen
/// placement keeps the unwrapped index, so panning east forever keeps
/// producing tiles. Rows do not wrap; above and below the world the map
/// background shows through and nothing is ever requested.
pub struct TileLayer {
    source: Box<dyn TileSource>,
    cache: TileCache,
    loader: TileLoader,
}

impl TileLayer {
    pub fn new(source: Box<dyn TileSource>, cache_capacity: usize) -> Self {
        Self {
            source,
            cache: TileCache::new(cache_capacity),
            loader: TileLoader::new(),
        }
    }

    /// Like `new`, with an explicit loader; tests use this to inject a
    /// canned transport.
    pub fn with_loader(source: Box<dyn TileSource>, cache_capacity: usize, loader: TileLoader) -> Self {
        Self {
            source,
            cache: TileCache::new(cache_capacity),
            loader,
        }
    }

    pub fn source(&self) -> &dyn TileSource {
        self.source.as_ref()
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Drain finished downloads into the cache. Returns true when any slot
    /// changed, meaning the canvas is stale and a render should be scheduled.
    pub fn pump(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for fetch in self.loader.try_recv() {
            match fetch.result {
                Ok(pixels) => {
                    self.cache.mark_ready(fetch.coord, std::sync::Arc::new(pixels));
                    changed = true;
                }
                Err(_) => {
                    self.cache.record_failure(fetch.coord, now);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Draw every tile the viewport can see, requesting the ones not yet
    /// cached. Tiles composite under previously drawn content.
    pub fn render(&mut self, viewport: &Viewport, ctx: &mut RenderContext, now: Instant) -> Result<()> {
        let tile_size = self.source.tile_size() as f64;
        let top_left = viewport.top_left();

        // Exclusive right/bottom edge: a tile starting exactly at the
        // canvas edge is fully off-screen and is not walked.
        let first_col = (top_left.x / tile_size).floor() as i64;
        let last_col = ((top_left.x + viewport.size.x) / tile_size).ceil() as i64 - 1;
        let first_row = (top_left.y / tile_size).floor() as i64;
        let last_row = ((top_left.y + viewport.size.y) / tile_size).ceil() as i64 - 1;

        for row in first_row..=last_row {
            for col in first_col..=last_col {
                self.place_tile(col, row, viewport, ctx, now)?;
            }
        }
        Ok(())
    }

    /// Handle one grid cell: blit it if cached, request it if missing,
    /// retry it if its backoff expired, or draw a placeholder if broken.
    ///
    /// `col` is the unwrapped column index; it fixes the screen position,
    /// while the wrapped index addresses the cache and the tile server.
    pub fn place_tile(
        &mut self,
        col: i64,
        row: i64,
        viewport: &Viewport,
        ctx: &mut RenderContext,
        now: Instant,
    ) -> Result<()> {
        let zoom = viewport.zoom;
        let tiles = projection::tile_count(zoom) as i64;
        let tile_size = self.source.tile_size() as f64;
        let top_left = viewport.top_left();
        let origin = Point::new(
            col as f64 * tile_size - top_left.x,
            row as f64 * tile_size - top_left.y,
        );

        // Rows outside the world: background only, never a request
        if row < 0 || row >= tiles {
            return Ok(());
        }

        let coord = TileCoord::new(col.rem_euclid(tiles) as u32, row as u32, zoom);

        match self.cache.get(&coord) {
            Some(TileState::Ready(pixels)) => {
                ctx.draw_tile(pixels, origin, CompositeMode::DestinationOver)?;
            }
            Some(TileState::Broken) => {
                ctx.fill_rect(
                    origin,
                    origin.add(&Point::new(tile_size, tile_size)),
                    BROKEN_TILE_COLOR,
                    CompositeMode::DestinationOver,
                );
            }
            Some(TileState::Failed { retry_after, .. }) if now >= retry_after => {
                log::debug!("retrying tile {:?}", coord);
                self.cache.mark_retrying(coord);
                self.loader.request(coord, self.source.url(coord));
            }
            Some(TileState::Failed { .. }) | Some(TileState::Loading { .. }) => {
                // Backoff still running or fetch in flight; background shows
            }
            None => {
                self.cache.mark_loading(coord);
                self.loader.request(coord, self.source.url(coord));
            }
        }
        Ok(())
    }
}
