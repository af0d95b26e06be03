//! End-to-end tests driving the map the way a host shell would: feed
//! input, pump the frame loop, replay nothing, and watch the events and
//! the draw-command queue.

use slippy::prelude::*;
use slippy::render::context::DrawCommand;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Transport whose fetches never resolve, keeping frames deterministic.
struct StalledTransport;

impl TileTransport for StalledTransport {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        std::thread::sleep(Duration::from_secs(3600));
        Err("stalled".into())
    }
}

fn test_map(options: MapOptions) -> Map {
    let _ = env_logger::builder().is_test(true).try_init();
    let capacity = options.tile_cache_capacity;
    let layer = TileLayer::with_loader(
        Box::new(OpenStreetMapSource::new()),
        capacity,
        TileLoader::with_transport(Arc::new(StalledTransport)),
    );
    Map::with_base_layer(options, layer)
}

fn count_events(map: &mut Map, event_type: &str) -> Arc<AtomicUsize> {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&counter);
    map.on(event_type, move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    counter
}

#[test]
fn test_zoom_clamps_to_source_range() {
    let mut map = test_map(MapOptions::default());
    let zoom_changes = count_events(&mut map, "zoom_changed");

    map.set_viewport(ViewportChange::zoom(25));
    map.process_events();

    assert_eq!(map.viewport().zoom, 19);
    assert_eq!(zoom_changes.load(Ordering::SeqCst), 1);

    // Same clamped value again: viewport_changed still fires, zoom_changed
    // does not
    map.set_viewport(ViewportChange::zoom(30));
    map.process_events();
    assert_eq!(map.viewport().zoom, 19);
    assert_eq!(zoom_changes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_options_tighten_zoom_range() {
    let mut map = test_map(MapOptions {
        min_zoom: Some(3),
        max_zoom: Some(10),
        zoom: 5,
        ..MapOptions::default()
    });

    assert_eq!(map.zoom_range(), (3, 10));
    map.set_viewport(ViewportChange::zoom(25));
    assert_eq!(map.viewport().zoom, 10);
    map.set_viewport(ViewportChange::zoom(0));
    assert_eq!(map.viewport().zoom, 3);
}

#[test]
fn test_viewport_change_with_bounds_fits_them() {
    let mut map = test_map(MapOptions {
        size: Point::new(640.0, 480.0),
        ..MapOptions::default()
    });

    let bounds = LatLngBounds::new(LatLng::new(0.0, 0.0), LatLng::new(10.0, 10.0));
    map.set_viewport(ViewportChange::bounds(bounds));

    let center = map.viewport().center;
    assert!((center.lat - 5.0).abs() < 1e-9);
    assert!((center.lng - 5.0).abs() < 1e-9);
}

#[test]
fn test_fit_bounds_centers_and_picks_zoom() {
    let mut map = test_map(MapOptions {
        size: Point::new(640.0, 480.0),
        ..MapOptions::default()
    });

    let bounds = LatLngBounds::new(LatLng::new(0.0, 0.0), LatLng::new(10.0, 10.0));
    map.fit_bounds(&bounds);

    let center = map.viewport().center;
    assert!((center.lat - 5.0).abs() < 1e-9);
    assert!((center.lng - 5.0).abs() < 1e-9);

    let tiny = LatLngBounds::new(LatLng::new(0.0, 0.0), LatLng::new(0.01, 0.01));
    map.fit_bounds(&tiny);
    assert_eq!(map.viewport().zoom, 16);
}

#[test]
fn test_render_coalesces_and_orders_commands() {
    let mut map = test_map(MapOptions {
        zoom: 4,
        ..MapOptions::default()
    });
    map.add_overlay(Box::new(Marker::new(LatLng::new(0.0, 0.0), "here")));

    let mut ctx = RenderContext::new(800, 600);
    let now = Instant::now();

    assert!(map.update_and_render(&mut ctx, now).unwrap());
    let queue = ctx.drawing_queue();
    assert!(!queue.is_empty());

    // Overlays are queued first with normal compositing
    assert!(matches!(
        queue.first(),
        Some(DrawCommand::Path {
            composite: CompositeMode::SourceOver,
            ..
        })
    ));
    // The background rect is queued last, slotting underneath everything
    assert!(matches!(
        queue.last(),
        Some(DrawCommand::Rect {
            composite: CompositeMode::DestinationOver,
            ..
        })
    ));

    // Nothing changed, so the next pump renders nothing
    assert!(!map.update_and_render(&mut ctx, now).unwrap());

    // Any viewport change makes the following pump render again
    map.set_viewport(ViewportChange::zoom(5));
    assert!(map.update_and_render(&mut ctx, now).unwrap());
}

#[test]
fn test_drag_pans_the_center() {
    let mut map = test_map(MapOptions {
        zoom: 10,
        ..MapOptions::default()
    });
    let drag_starts = count_events(&mut map, "drag_start");
    let drag_ends = count_events(&mut map, "drag_end");

    let before = map.viewport().center;
    let t0 = Instant::now();
    map.handle_input(
        &InputEvent::PointerDown {
            position: Point::new(400.0, 300.0),
            button: MouseButton::Left,
        },
        t0,
    );
    map.handle_input(
        &InputEvent::PointerMove {
            position: Point::new(300.0, 300.0),
        },
        t0 + Duration::from_millis(50),
    );
    map.handle_input(
        &InputEvent::PointerUp {
            position: Point::new(300.0, 300.0),
            button: MouseButton::Left,
        },
        t0 + Duration::from_millis(200),
    );
    map.process_events();

    // Dragging the canvas 100px west pans the view east
    let after = map.viewport().center;
    assert!(after.lng > before.lng);
    assert!((after.lat - before.lat).abs() < 1e-6);
    assert_eq!(drag_starts.load(Ordering::SeqCst), 1);
    assert_eq!(drag_ends.load(Ordering::SeqCst), 1);
}

#[test]
fn test_press_without_movement_emits_no_drag_events() {
    let mut map = test_map(MapOptions {
        zoom: 10,
        ..MapOptions::default()
    });
    let drag_starts = count_events(&mut map, "drag_start");
    let drag_ends = count_events(&mut map, "drag_end");

    // A long hold with no motion is neither a click nor a drag
    let t0 = Instant::now();
    map.handle_input(
        &InputEvent::PointerDown {
            position: Point::new(400.0, 300.0),
            button: MouseButton::Left,
        },
        t0,
    );
    map.handle_input(
        &InputEvent::PointerUp {
            position: Point::new(400.0, 300.0),
            button: MouseButton::Left,
        },
        t0 + Duration::from_millis(500),
    );
    map.process_events();

    assert_eq!(drag_starts.load(Ordering::SeqCst), 0);
    assert_eq!(drag_ends.load(Ordering::SeqCst), 0);
}

#[test]
fn test_disabled_dragging_keeps_center_put() {
    let mut map = test_map(MapOptions {
        dragging: false,
        zoom: 10,
        ..MapOptions::default()
    });

    let before = map.viewport().center;
    let t0 = Instant::now();
    map.handle_input(
        &InputEvent::PointerDown {
            position: Point::new(400.0, 300.0),
            button: MouseButton::Left,
        },
        t0,
    );
    map.handle_input(
        &InputEvent::PointerMove {
            position: Point::new(200.0, 100.0),
        },
        t0,
    );
    assert_eq!(map.viewport().center, before);
}

#[test]
fn test_wheel_zoom_fires_after_delay() {
    let mut map = test_map(MapOptions {
        zoom: 5,
        ..MapOptions::default()
    });
    let mut ctx = RenderContext::new(800, 600);
    let t0 = Instant::now();

    // Drain the initial render
    map.update_and_render(&mut ctx, t0).unwrap();

    map.handle_input(
        &InputEvent::Wheel {
            delta: -1.0,
            position: Point::new(600.0, 300.0),
        },
        t0,
    );
    map.update_and_render(&mut ctx, t0 + Duration::from_millis(100))
        .unwrap();
    assert_eq!(map.viewport().zoom, 5);

    map.update_and_render(&mut ctx, t0 + Duration::from_millis(600))
        .unwrap();
    assert_eq!(map.viewport().zoom, 6);
}

#[test]
fn test_double_click_zooms_toward_cursor() {
    let mut map = test_map(MapOptions {
        zoom: 8,
        ..MapOptions::default()
    });

    let before = map.viewport().center;
    map.handle_input(
        &InputEvent::DoubleClick {
            position: Point::new(600.0, 300.0),
            button: MouseButton::Left,
        },
        Instant::now(),
    );

    assert_eq!(map.viewport().zoom, 9);
    // The cursor sat east of center, so the view moved east
    assert!(map.viewport().center.lng > before.lng);
}

#[test]
fn test_double_click_at_max_zoom_still_recenters() {
    let mut map = test_map(MapOptions {
        zoom: 19,
        ..MapOptions::default()
    });
    let viewport_changes = count_events(&mut map, "viewport_changed");
    let zoom_changes = count_events(&mut map, "zoom_changed");

    let before = map.viewport().center;
    map.handle_input(
        &InputEvent::DoubleClick {
            position: Point::new(600.0, 300.0),
            button: MouseButton::Left,
        },
        Instant::now(),
    );
    map.process_events();

    // The zoom step saturates, the recentering does not
    assert_eq!(map.viewport().zoom, 19);
    assert!(map.viewport().center.lng > before.lng);
    assert_eq!(viewport_changes.load(Ordering::SeqCst), 1);
    assert_eq!(zoom_changes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_click_routes_to_overlay_or_map() {
    let mut map = test_map(MapOptions {
        zoom: 6,
        ..MapOptions::default()
    });
    let marker_id = map.add_overlay(Box::new(Marker::new(LatLng::new(0.0, 0.0), "target")));

    let overlay_clicks = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&overlay_clicks);
    map.on("overlay_click", move |event| {
        if let MapEvent::OverlayClick { overlay_id, .. } = event {
            sink.lock().unwrap().push(*overlay_id);
        }
    });
    let map_clicks = count_events(&mut map, "click");

    let anchor = map.viewport().lat_lng_to_screen(&LatLng::new(0.0, 0.0));
    let on_flag = Point::new(anchor.x + 15.0, anchor.y - 20.0);
    let t0 = Instant::now();

    let click = |map: &mut Map, position: Point, at: Instant| {
        map.handle_input(
            &InputEvent::PointerDown {
                position,
                button: MouseButton::Left,
            },
            at,
        );
        map.handle_input(
            &InputEvent::PointerUp {
                position,
                button: MouseButton::Left,
            },
            at + Duration::from_millis(30),
        );
    };

    // A hit on the flag reaches the map-level listener and the overlay
    click(&mut map, on_flag, t0);
    map.process_events();
    assert_eq!(*overlay_clicks.lock().unwrap(), vec![marker_id.0]);
    assert_eq!(map_clicks.load(Ordering::SeqCst), 1);

    // A miss reaches only the map-level listener
    click(&mut map, Point::new(100.0, 500.0), t0 + Duration::from_secs(1));
    map.process_events();
    assert_eq!(*overlay_clicks.lock().unwrap(), vec![marker_id.0]);
    assert_eq!(map_clicks.load(Ordering::SeqCst), 2);
}

#[test]
fn test_window_follows_marker_and_sits_on_top() {
    let mut map = test_map(MapOptions {
        zoom: 6,
        ..MapOptions::default()
    });
    let marker_id = map.add_overlay(Box::new(Marker::new(LatLng::new(10.0, 10.0), "base")));
    let window_id = map.add_overlay(Box::new(InfoWindow::new(
        PositionSource::FollowsOverlay(marker_id),
        "details",
    )));

    let anchor = map.viewport().lat_lng_to_screen(&LatLng::new(10.0, 10.0));
    // The balloon floats above the anchor
    let in_window = Point::new(anchor.x, anchor.y - 30.0);
    assert_eq!(map.hit_test(in_window), Some(window_id));

    // Removing the marker hides the following window
    assert!(map.remove_overlay(marker_id));
    assert_eq!(map.hit_test(in_window), None);
}

#[test]
fn test_clicking_a_marker_opens_its_following_window() {
    let mut map = test_map(MapOptions {
        zoom: 6,
        ..MapOptions::default()
    });
    let marker_id = map.add_overlay(Box::new(Marker::new(LatLng::new(0.0, 0.0), "pin")));
    let mut window = InfoWindow::new(PositionSource::FollowsOverlay(marker_id), "details");
    window.close();
    let window_id = map.add_overlay(Box::new(window));

    let is_open = |map: &Map| {
        map.overlay(window_id)
            .and_then(|o| o.as_any().downcast_ref::<InfoWindow>())
            .map(InfoWindow::is_open)
    };
    assert_eq!(is_open(&map), Some(false));

    let anchor = map.viewport().lat_lng_to_screen(&LatLng::new(0.0, 0.0));
    let on_flag = Point::new(anchor.x + 15.0, anchor.y - 20.0);
    let t0 = Instant::now();
    map.handle_input(
        &InputEvent::PointerDown {
            position: on_flag,
            button: MouseButton::Left,
        },
        t0,
    );
    map.handle_input(
        &InputEvent::PointerUp {
            position: on_flag,
            button: MouseButton::Left,
        },
        t0 + Duration::from_millis(30),
    );

    assert_eq!(is_open(&map), Some(true));
}

#[test]
fn test_map_type_switch_reclamps_zoom() {
    let mut map = test_map(MapOptions::default());
    map.add_tile_layer(TileLayer::with_loader(
        Box::new(StamenTerrainSource),
        64,
        TileLoader::with_transport(Arc::new(StalledTransport)),
    ));
    let type_changes = count_events(&mut map, "map_type_changed");

    assert_eq!(map.viewport().zoom, 0);
    map.set_map_type("terrain").unwrap();
    map.process_events();

    // Terrain starts at zoom 4, so the viewport is pulled up to it
    assert_eq!(map.viewport().zoom, 4);
    assert_eq!(map.zoom_range(), (4, 18));
    assert_eq!(type_changes.load(Ordering::SeqCst), 1);

    assert!(map.set_map_type("nonexistent").is_err());
}

#[test]
fn test_resize_is_a_noop_for_equal_size() {
    let mut map = test_map(MapOptions::default());
    let resizes = count_events(&mut map, "resize");

    map.handle_input(
        &InputEvent::Resize {
            size: Point::new(800.0, 600.0),
        },
        Instant::now(),
    );
    map.handle_input(
        &InputEvent::Resize {
            size: Point::new(1024.0, 768.0),
        },
        Instant::now(),
    );
    map.process_events();

    assert_eq!(map.viewport().size, Point::new(1024.0, 768.0));
    assert_eq!(resizes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_overlay_stacking_within_bucket() {
    let mut map = test_map(MapOptions {
        zoom: 6,
        ..MapOptions::default()
    });
    let first = map.add_overlay(Box::new(Marker::new(LatLng::new(0.0, 0.0), "a")));
    let second = map.add_overlay(Box::new(Marker::new(LatLng::new(0.0, 0.0), "b")));

    // Both flags overlap; the most recently added wins the hit test
    let anchor = map.viewport().lat_lng_to_screen(&LatLng::new(0.0, 0.0));
    let probe = Point::new(anchor.x + 15.0, anchor.y - 20.0);
    assert_eq!(map.hit_test(probe), Some(second));

    // A marker added later takes the top of the bucket
    let mut ctx = RenderContext::new(800, 600);
    map.update_and_render(&mut ctx, Instant::now()).unwrap();
    assert!(map.remove_overlay(first));
    map.add_overlay(Box::new(Marker::new(LatLng::new(0.0, 0.0), "a")));
    let replacement = map.hit_test(probe);
    assert!(replacement.is_some());
    assert_ne!(replacement, Some(second));
}

#[test]
fn test_projection_round_trip_through_viewport() {
    let map = test_map(MapOptions {
        center: LatLng::new(48.8566, 2.3522),
        zoom: 12,
        ..MapOptions::default()
    });
    let viewport = map.viewport();

    for point in [
        LatLng::new(48.85, 2.35),
        LatLng::new(48.9, 2.2),
        LatLng::new(48.8, 2.5),
    ] {
        let screen = viewport.lat_lng_to_screen(&point);
        let back = viewport.screen_to_lat_lng(&screen);
        let error = point.distance_from(&back, None);
        assert!(error < 50.0, "round trip drifted {error} m");
    }
}
