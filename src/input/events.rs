use crate::core::geo::{LatLng, Point};
use crate::prelude::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Raw platform input, fed to the map by the host shell.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { position: Point, button: MouseButton },
    PointerMove { position: Point },
    PointerUp { position: Point, button: MouseButton },
    DoubleClick { position: Point, button: MouseButton },
    Wheel { delta: f64, position: Point },
    TouchStart { touches: Vec<TouchPoint> },
    TouchEnd { touches: Vec<TouchPoint> },
    Resize { size: Point },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Point,
}

/// Everything the map announces to its subscribers. Each variant maps to a
/// string event type so handlers register by name.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    MapLoaded,
    MapTypeChanged { layer_name: String },
    ViewportChanged { center: LatLng, zoom: u8 },
    ZoomChanged { zoom: u8 },
    MapRender,
    OverlayAdded { overlay_id: u64 },
    OverlayRemoved { overlay_id: u64 },
    Click { position: Point, location: LatLng },
    DoubleClick { position: Point, location: LatLng },
    MouseMove { position: Point, location: LatLng },
    MouseWheel { delta: f64 },
    DragStart { position: Point },
    Drag { position: Point },
    DragEnd { position: Point },
    TouchStart { touches: Vec<TouchPoint> },
    TouchEnd { touches: Vec<TouchPoint> },
    Resize { size: Point },
    OverlayClick { overlay_id: u64, position: Point },
    OverlayMouseMove { overlay_id: u64, position: Point },
}

impl MapEvent {
    /// The registration key handlers subscribe under.
    pub fn event_type(&self) -> &'static str {
        match self {
            MapEvent::MapLoaded => "map_loaded",
            MapEvent::MapTypeChanged { .. } => "map_type_changed",
            MapEvent::ViewportChanged { .. } => "viewport_changed",
            MapEvent::ZoomChanged { .. } => "zoom_changed",
            MapEvent::MapRender => "map_render",
            MapEvent::OverlayAdded { .. } => "overlay_added",
            MapEvent::OverlayRemoved { .. } => "overlay_removed",
            MapEvent::Click { .. } => "click",
            MapEvent::DoubleClick { .. } => "dblclick",
            MapEvent::MouseMove { .. } => "mousemove",
            MapEvent::MouseWheel { .. } => "mousewheel",
            MapEvent::DragStart { .. } => "drag_start",
            MapEvent::Drag { .. } => "drag",
            MapEvent::DragEnd { .. } => "drag_end",
            MapEvent::TouchStart { .. } => "touch_start",
            MapEvent::TouchEnd { .. } => "touch_end",
            MapEvent::Resize { .. } => "resize",
            MapEvent::OverlayClick { .. } => "overlay_click",
            MapEvent::OverlayMouseMove { .. } => "overlay_mousemove",
        }
    }
}

pub type EventCallback = Box<dyn FnMut(&MapEvent) + Send>;

/// String-keyed publish/subscribe hub. Events queue up until
/// `process_events` drains them through the registered handlers.
#[derive(Default)]
pub struct EventManager {
    handlers: HashMap<String, Vec<EventCallback>>,
    queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event type. Multiple handlers per type run
    /// in registration order.
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: FnMut(&MapEvent) + Send + 'static,
    {
        self.handlers
            .entry(event_type.to_string())
            .or_default()
            .push(Box::new(callback));
    }

    /// Queue an event for the next `process_events` pass.
    pub fn emit(&mut self, event: MapEvent) {
        self.queue.push_back(event);
    }

    /// Drain the queue, invoking every handler registered for each event's
    /// type. Returns how many events were delivered.
    pub fn process_events(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.queue.pop_front() {
            if let Some(handlers) = self.handlers.get_mut(event.event_type()) {
                for handler in handlers.iter_mut() {
                    handler(&event);
                }
            }
            delivered += 1;
        }
        delivered
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn clear_events(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn test_event_types_are_stable() {
        assert_eq!(MapEvent::MapLoaded.event_type(), "map_loaded");
        assert_eq!(
            MapEvent::ZoomChanged { zoom: 3 }.event_type(),
            "zoom_changed"
        );
        assert_eq!(
            MapEvent::OverlayClick {
                overlay_id: 1,
                position: Point::new(0.0, 0.0)
            }
            .event_type(),
            "overlay_click"
        );
    }

    #[test]
    fn test_handlers_only_see_their_type() {
        let mut manager = EventManager::new();
        let zooms = Arc::new(AtomicUsize::new(0));
        let clicks = Arc::new(AtomicUsize::new(0));

        let z = Arc::clone(&zooms);
        manager.on("zoom_changed", move |_| {
            z.fetch_add(1, Ordering::SeqCst);
        });
        let c = Arc::clone(&clicks);
        manager.on("click", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        manager.emit(MapEvent::ZoomChanged { zoom: 5 });
        manager.emit(MapEvent::ZoomChanged { zoom: 6 });
        assert_eq!(manager.pending_events(), 2);
        assert_eq!(manager.process_events(), 2);

        assert_eq!(zooms.load(Ordering::SeqCst), 2);
        assert_eq!(clicks.load(Ordering::SeqCst), 0);
        assert_eq!(manager.pending_events(), 0);
    }

    #[test]
    fn test_multiple_handlers_run_in_order() {
        let mut manager = EventManager::new();
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let log = Arc::clone(&log);
            manager.on("map_render", move |_| {
                log.lock().unwrap().push(tag);
            });
        }
        manager.emit(MapEvent::MapRender);
        manager.process_events();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_clear_discards_pending() {
        let mut manager = EventManager::new();
        manager.emit(MapEvent::MapLoaded);
        manager.clear_events();
        assert_eq!(manager.process_events(), 0);
    }
}
