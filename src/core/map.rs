use crate::core::{
    config::MapOptions,
    geo::{LatLngBounds, Point},
    projection,
    viewport::{Viewport, ViewportChange},
};
use crate::input::{
    events::{EventManager, InputEvent, MapEvent},
    gestures::{Action, GestureRecognizer},
};
use crate::overlay::{
    wrap_offsets, Frame, HitTest, InfoWindow, Overlay, OverlayId, OverlayKind, PositionSource,
};
use crate::render::{
    context::{CompositeMode, RenderContext},
    scheduler::RenderScheduler,
};
use crate::tiles::{layer::TileLayer, source::OpenStreetMapSource};
use crate::Result;
use std::time::Instant;

struct DragState {
    /// World pixels of the viewport center when the pointer went down.
    anchor: Point,
    /// Screen position of the press.
    press: Point,
    /// Screen position of the most recent move.
    last: Point,
    /// Whether the pointer has actually moved since the press.
    moved: bool,
}

/// The interactive map: a viewport over tile layers and overlays, driven
/// by input events and rendered on demand.
///
/// Nothing here draws eagerly. State changes set a pending flag on the
/// scheduler and the host calls [`Map::update_and_render`] each frame;
/// a frame with nothing pending costs a few branch checks.
pub struct Map {
    viewport: Viewport,
    options: MapOptions,
    tile_layers: Vec<TileLayer>,
    vectors: Vec<Box<dyn Overlay>>,
    markers: Vec<Box<dyn Overlay>>,
    windows: Vec<Box<dyn Overlay>>,
    events: EventManager,
    gestures: GestureRecognizer,
    scheduler: RenderScheduler,
    drag: Option<DragState>,
}

impl Map {
    /// Build a map with a single OpenStreetMap base layer and queue the
    /// first render.
    pub fn new(options: MapOptions) -> Self {
        let base = TileLayer::new(
            Box::new(OpenStreetMapSource::new()),
            options.tile_cache_capacity,
        );
        Self::with_base_layer(options, base)
    }

    /// Build a map over a caller-supplied base layer, for hosts that bring
    /// their own tile source or transport.
    pub fn with_base_layer(options: MapOptions, base: TileLayer) -> Self {
        let viewport = Viewport::new(options.center, options.zoom, options.size);
        let mut map = Self {
            viewport,
            options,
            tile_layers: vec![base],
            vectors: Vec::new(),
            markers: Vec::new(),
            windows: Vec::new(),
            events: EventManager::new(),
            gestures: GestureRecognizer::new(),
            scheduler: RenderScheduler::new(),
            drag: None,
        };
        map.clamp_zoom_to_base_layer();
        map.events.emit(MapEvent::MapLoaded);
        map.scheduler.schedule();
        map
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    /// Zoom range of the base tile layer, tightened by any
    /// [`MapOptions::min_zoom`] / [`MapOptions::max_zoom`] overrides.
    pub fn zoom_range(&self) -> (u8, u8) {
        let (mut lo, mut hi) = match self.tile_layers.first() {
            Some(layer) => (layer.source().min_zoom(), layer.source().max_zoom()),
            None => (
                crate::constants::DEFAULT_MIN_ZOOM,
                crate::constants::DEFAULT_MAX_ZOOM,
            ),
        };
        if let Some(min) = self.options.min_zoom {
            lo = lo.max(min);
        }
        if let Some(max) = self.options.max_zoom {
            hi = hi.min(max);
        }
        let hi = hi.max(lo);
        (lo, hi)
    }

    /// Apply a partial viewport update. A `bounds` request wins over
    /// `center` and `zoom` and resolves through [`Map::fit_bounds`].
    /// The zoom is clamped to the base layer's range. Fires
    /// `viewport_changed` on every call and `zoom_changed` only when the
    /// zoom actually moved.
    pub fn set_viewport(&mut self, change: ViewportChange) {
        if let Some(bounds) = change.bounds {
            self.fit_bounds(&bounds);
            return;
        }
        let (min_zoom, max_zoom) = self.zoom_range();
        let old_zoom = self.viewport.zoom;

        if let Some(center) = change.center {
            self.viewport.center = center;
        }
        if let Some(zoom) = change.zoom {
            self.viewport.zoom = zoom.clamp(min_zoom, max_zoom);
        }

        self.events.emit(MapEvent::ViewportChanged {
            center: self.viewport.center,
            zoom: self.viewport.zoom,
        });
        if self.viewport.zoom != old_zoom {
            self.events.emit(MapEvent::ZoomChanged {
                zoom: self.viewport.zoom,
            });
        }
        self.scheduler.schedule();
    }

    pub fn zoom_in(&mut self) {
        self.step_zoom(1, None);
    }

    pub fn zoom_out(&mut self) {
        self.step_zoom(-1, None);
    }

    /// Center on `bounds` at the highest zoom where they fit on the
    /// canvas.
    pub fn fit_bounds(&mut self, bounds: &LatLngBounds) {
        let (min_zoom, max_zoom) = self.zoom_range();
        let zoom = Viewport::fit_zoom(bounds, self.viewport.size, min_zoom, max_zoom);
        self.set_viewport(ViewportChange::center(bounds.center()).with_zoom(zoom));
    }

    /// Adopt a new canvas size, keeping the center fixed. A no-op when
    /// the size is unchanged.
    pub fn resize(&mut self, size: Point) {
        if size == self.viewport.size {
            return;
        }
        self.viewport.size = size;
        self.events.emit(MapEvent::Resize { size });
        self.scheduler.schedule();
    }

    pub fn add_tile_layer(&mut self, layer: TileLayer) {
        self.tile_layers.push(layer);
        self.scheduler.schedule();
    }

    /// Make the named source the base layer. The zoom is re-clamped to
    /// the new source's range.
    pub fn set_map_type(&mut self, name: &str) -> Result<()> {
        let index = self
            .tile_layers
            .iter()
            .position(|layer| layer.source().name() == name)
            .ok_or_else(|| format!("unknown map type {name:?}"))?;
        let layer = self.tile_layers.remove(index);
        self.tile_layers.insert(0, layer);
        self.clamp_zoom_to_base_layer();
        self.events.emit(MapEvent::MapTypeChanged {
            layer_name: name.to_string(),
        });
        self.scheduler.schedule();
        Ok(())
    }

    fn clamp_zoom_to_base_layer(&mut self) {
        let (min_zoom, max_zoom) = self.zoom_range();
        let clamped = self.viewport.zoom.clamp(min_zoom, max_zoom);
        if clamped != self.viewport.zoom {
            self.viewport.zoom = clamped;
            self.events.emit(MapEvent::ZoomChanged { zoom: clamped });
        }
    }

    /// Add an overlay to its drawing bucket. Re-adding an overlay that is
    /// already present moves it to the top of its bucket instead of
    /// duplicating it.
    pub fn add_overlay(&mut self, overlay: Box<dyn Overlay>) -> OverlayId {
        let id = overlay.id();
        self.remove_from_buckets(id);
        let bucket = match overlay.kind() {
            OverlayKind::Vector => &mut self.vectors,
            OverlayKind::Marker => &mut self.markers,
            OverlayKind::Window => &mut self.windows,
        };
        bucket.push(overlay);
        self.events.emit(MapEvent::OverlayAdded { overlay_id: id.0 });
        self.scheduler.schedule();
        id
    }

    pub fn remove_overlay(&mut self, id: OverlayId) -> bool {
        if self.remove_from_buckets(id).is_some() {
            self.events
                .emit(MapEvent::OverlayRemoved { overlay_id: id.0 });
            self.scheduler.schedule();
            true
        } else {
            false
        }
    }

    fn remove_from_buckets(&mut self, id: OverlayId) -> Option<Box<dyn Overlay>> {
        for bucket in [&mut self.vectors, &mut self.markers, &mut self.windows] {
            if let Some(index) = bucket.iter().position(|o| o.id() == id) {
                return Some(bucket.remove(index));
            }
        }
        None
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&dyn Overlay> {
        [&self.vectors, &self.markers, &self.windows]
            .into_iter()
            .flat_map(|bucket| bucket.iter())
            .find(|o| o.id() == id)
            .map(|o| o.as_ref())
    }

    /// Subscribe a handler to a named event, for example `"click"` or
    /// `"zoom_changed"`.
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: FnMut(&MapEvent) + Send + 'static,
    {
        self.events.on(event_type, callback);
    }

    /// Deliver queued events to their handlers.
    pub fn process_events(&mut self) -> usize {
        self.events.process_events()
    }

    /// Feed one raw input event through the gesture recognizer and apply
    /// whatever it resolved to.
    pub fn handle_input(&mut self, event: &InputEvent, now: Instant) {
        match event {
            InputEvent::Resize { size } => {
                self.resize(*size);
                return;
            }
            InputEvent::Wheel { delta, .. } => {
                if !self.options.scroll_wheel_zoom {
                    return;
                }
                self.events.emit(MapEvent::MouseWheel { delta: *delta });
            }
            InputEvent::DoubleClick { position, .. } => {
                if !self.options.double_click_zoom {
                    return;
                }
                let location = self.viewport.screen_to_lat_lng(position);
                self.events.emit(MapEvent::DoubleClick {
                    position: *position,
                    location,
                });
            }
            InputEvent::TouchStart { touches } => {
                if !self.options.touch_zoom {
                    return;
                }
                self.events.emit(MapEvent::TouchStart {
                    touches: touches.clone(),
                });
            }
            InputEvent::TouchEnd { touches } => {
                if !self.options.touch_zoom {
                    return;
                }
                self.events.emit(MapEvent::TouchEnd {
                    touches: touches.clone(),
                });
            }
            _ => {}
        }

        for action in self.gestures.handle_event(event, now) {
            self.apply_action(action);
        }
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            // Map-level listeners always hear the pointer; overlay events
            // follow when something was hit.
            Action::Click { position } => {
                let location = self.viewport.screen_to_lat_lng(&position);
                self.events.emit(MapEvent::Click { position, location });
                if let Some(id) = self.hit_test(position) {
                    self.open_following_windows(id);
                    self.events.emit(MapEvent::OverlayClick {
                        overlay_id: id.0,
                        position,
                    });
                }
            }
            Action::Hover { position } => {
                let location = self.viewport.screen_to_lat_lng(&position);
                self.events
                    .emit(MapEvent::MouseMove { position, location });
                if let Some(id) = self.hit_test(position) {
                    self.events.emit(MapEvent::OverlayMouseMove {
                        overlay_id: id.0,
                        position,
                    });
                }
            }
            Action::DragStart { position } => {
                if !self.options.dragging {
                    return;
                }
                self.drag = Some(DragState {
                    anchor: projection::project(&self.viewport.center, self.viewport.zoom),
                    press: position,
                    last: position,
                    moved: false,
                });
            }
            Action::DragTo { delta } => {
                let Some(drag) = self.drag.as_mut() else {
                    return;
                };
                if !drag.moved {
                    drag.moved = true;
                    let position = drag.press;
                    self.events.emit(MapEvent::DragStart { position });
                }
                drag.last = drag.press.subtract(&delta);
                let position = drag.last;
                let target = drag.anchor.add(&delta);
                let center = projection::unproject(&target, self.viewport.zoom);
                self.set_viewport(ViewportChange::center(center));
                self.events.emit(MapEvent::Drag { position });
            }
            Action::EndDrag => {
                if let Some(drag) = self.drag.take() {
                    if drag.moved {
                        self.events.emit(MapEvent::DragEnd {
                            position: drag.last,
                        });
                    }
                }
            }
            Action::ZoomStep { delta, focus } => {
                self.step_zoom(delta, focus);
            }
        }
    }

    /// Zoom by one step, recentering toward or away from `focus`.
    ///
    /// Zooming in moves the center halfway toward the focus, which keeps
    /// the focused feature on screen after the scale doubles. Zooming out
    /// mirrors the focus through the center. At a zoom range limit the
    /// step saturates but the recentering still applies.
    fn step_zoom(&mut self, delta: i8, focus: Option<Point>) {
        let zoom = self.viewport.zoom;
        let stepped = if delta > 0 {
            zoom.saturating_add(1)
        } else {
            zoom.saturating_sub(1)
        };

        let mut change = ViewportChange::zoom(stepped);
        if let Some(focus) = focus {
            let center = self.viewport.size.multiply(0.5);
            let target = if delta > 0 {
                center.add(&focus.subtract(&center).multiply(0.5))
            } else {
                center.add(&center.subtract(&focus))
            };
            change = change.with_center(self.viewport.screen_to_lat_lng(&target));
        }
        self.set_viewport(change);
    }

    /// Clicking an overlay opens any closed windows anchored to it.
    fn open_following_windows(&mut self, target: OverlayId) {
        let mut opened = false;
        for window in &mut self.windows {
            let Some(window) = window.as_any_mut().downcast_mut::<InfoWindow>() else {
                continue;
            };
            if window.source() == PositionSource::FollowsOverlay(target) && !window.is_open() {
                window.open();
                opened = true;
            }
        }
        if opened {
            self.scheduler.schedule();
        }
    }

    /// Screen anchor for an overlay, following a window's source overlay
    /// when it has one. `None` hides the overlay for this frame.
    fn resolve_anchor(&self, overlay: &dyn Overlay) -> Option<Point> {
        if let Some(position) = overlay.anchor() {
            return Some(self.viewport.lat_lng_to_screen(&position));
        }
        if let Some(window) = overlay.as_any().downcast_ref::<InfoWindow>() {
            if let PositionSource::FollowsOverlay(target) = window.source() {
                let position = self.overlay(target)?.anchor()?;
                return Some(self.viewport.lat_lng_to_screen(&position));
            }
        }
        None
    }

    /// Topmost overlay under `point`: windows above markers above
    /// vectors, and within a bucket the most recently added wins.
    pub fn hit_test(&self, point: Point) -> Option<OverlayId> {
        let offsets = wrap_offsets(&self.viewport);
        for bucket in [&self.windows, &self.markers, &self.vectors] {
            for overlay in bucket.iter().rev() {
                let anchor = match overlay.kind() {
                    OverlayKind::Vector => Point::new(0.0, 0.0),
                    _ => match self.resolve_anchor(overlay.as_ref()) {
                        Some(anchor) => anchor,
                        None => continue,
                    },
                };
                for &offset_x in &offsets {
                    let ht = HitTest {
                        point,
                        anchor,
                        viewport: &self.viewport,
                        offset_x,
                    };
                    if overlay.hit_test(&ht) {
                        return Some(overlay.id());
                    }
                }
            }
        }
        None
    }

    /// Advance the world and render one frame if anything asked for one.
    /// Returns whether the context was repainted.
    ///
    /// Draw order within a frame: overlays first, then each tile layer
    /// from last to first composited underneath, then the background.
    /// Compositing under what is already present puts the first layer
    /// on top without repainting anything.
    pub fn update_and_render(&mut self, ctx: &mut RenderContext, now: Instant) -> Result<bool> {
        for layer in &mut self.tile_layers {
            if layer.pump(now) {
                self.scheduler.schedule();
            }
        }
        for action in self.gestures.poll(now) {
            self.apply_action(action);
        }

        let Some(generation) = self.scheduler.take() else {
            return Ok(false);
        };

        ctx.begin_frame();

        let offsets = wrap_offsets(&self.viewport);
        for bucket in [&self.vectors, &self.markers, &self.windows] {
            for overlay in bucket.iter() {
                let anchor = match overlay.kind() {
                    OverlayKind::Vector => Point::new(0.0, 0.0),
                    _ => match self.resolve_anchor(overlay.as_ref()) {
                        Some(anchor) => anchor,
                        None => continue,
                    },
                };
                for &offset_x in &offsets {
                    let frame = Frame {
                        viewport: &self.viewport,
                        offset_x,
                    };
                    overlay.draw(ctx, &frame, anchor);
                }
            }
            if self.scheduler.superseded(generation) {
                return Ok(false);
            }
        }

        let viewport = self.viewport;
        for layer in self.tile_layers.iter_mut().rev() {
            layer.render(&viewport, ctx, now)?;
        }
        if self.scheduler.superseded(generation) {
            return Ok(false);
        }

        ctx.fill_rect(
            Point::new(0.0, 0.0),
            self.viewport.size,
            self.options.background_color,
            CompositeMode::DestinationOver,
        );

        self.events.emit(MapEvent::MapRender);
        Ok(true)
    }
}
