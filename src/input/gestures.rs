use crate::constants::{
    CLICK_MAX_DURATION, PINCH_MAX_DURATION, PINCH_MIN_DISTANCE, WHEEL_ZOOM_DELAY,
};
use crate::core::geo::Point;
use crate::input::events::{InputEvent, MouseButton, TouchPoint};
use std::time::Instant;

/// What the map should do in response to recognized input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Pointer released quickly without moving; hit test and notify.
    Click { position: Point },
    /// Pointer moved with no button held.
    Hover { position: Point },
    /// Pointer pressed; capture the drag anchor.
    DragStart { position: Point },
    /// Pointer moved while pressed. `delta` is press position minus the
    /// current position, in screen pixels.
    DragTo { delta: Point },
    EndDrag,
    /// Change zoom by `delta` steps, keeping `focus` fixed on screen when
    /// present.
    ZoomStep { delta: i8, focus: Option<Point> },
}

#[derive(Debug, Clone, Copy)]
struct Press {
    position: Point,
    at: Instant,
    moved: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingWheel {
    direction: i8,
    armed_at: Instant,
    position: Point,
}

#[derive(Debug, Clone, Copy)]
struct Pinch {
    start_distance: f64,
    started: Instant,
    midpoint: Point,
}

/// Turns raw pointer, wheel and touch events into map actions.
///
/// Wheel input is deliberate: a tick arms a single zoom step that fires
/// only after the wheel has been quiet for a spell, and further ticks
/// re-arm rather than stack. Callers must `poll` each frame so the armed
/// step can fire.
#[derive(Default)]
pub struct GestureRecognizer {
    press: Option<Press>,
    wheel: Option<PendingWheel>,
    pinch: Option<Pinch>,
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_event(&mut self, event: &InputEvent, now: Instant) -> Vec<Action> {
        match event {
            InputEvent::PointerDown { position, button } => {
                if *button != MouseButton::Left {
                    return Vec::new();
                }
                self.press = Some(Press {
                    position: *position,
                    at: now,
                    moved: false,
                });
                vec![Action::DragStart {
                    position: *position,
                }]
            }
            InputEvent::PointerMove { position } => match self.press.as_mut() {
                Some(press) => {
                    press.moved = true;
                    let delta = press.position.subtract(position);
                    vec![Action::DragTo { delta }]
                }
                None => vec![Action::Hover {
                    position: *position,
                }],
            },
            InputEvent::PointerUp { position, button } => {
                if *button != MouseButton::Left {
                    return Vec::new();
                }
                let Some(press) = self.press.take() else {
                    return Vec::new();
                };
                let mut actions = Vec::new();
                if !press.moved && now.duration_since(press.at) < CLICK_MAX_DURATION {
                    actions.push(Action::Click {
                        position: *position,
                    });
                }
                actions.push(Action::EndDrag);
                actions
            }
            InputEvent::DoubleClick { position, button } => {
                let delta = match button {
                    MouseButton::Left => 1,
                    MouseButton::Right => -1,
                    MouseButton::Middle => return Vec::new(),
                };
                vec![Action::ZoomStep {
                    delta,
                    focus: Some(*position),
                }]
            }
            InputEvent::Wheel { delta, position } => {
                if *delta == 0.0 {
                    return Vec::new();
                }
                // Re-arming replaces any earlier pending step outright
                self.wheel = Some(PendingWheel {
                    direction: if *delta < 0.0 { 1 } else { -1 },
                    armed_at: now,
                    position: *position,
                });
                Vec::new()
            }
            InputEvent::TouchStart { touches } => {
                if let [a, b] = touches.as_slice() {
                    self.pinch = Some(Pinch {
                        start_distance: a.position.distance_to(&b.position),
                        started: now,
                        midpoint: midpoint(a, b),
                    });
                }
                Vec::new()
            }
            InputEvent::TouchEnd { touches } => {
                let Some(pinch) = self.pinch.take() else {
                    return Vec::new();
                };
                let [a, b] = touches.as_slice() else {
                    return Vec::new();
                };
                if now.duration_since(pinch.started) > PINCH_MAX_DURATION {
                    return Vec::new();
                }
                let change = a.position.distance_to(&b.position) - pinch.start_distance;
                if change.abs() < PINCH_MIN_DISTANCE {
                    return Vec::new();
                }
                vec![Action::ZoomStep {
                    delta: if change > 0.0 { 1 } else { -1 },
                    focus: Some(pinch.midpoint),
                }]
            }
            InputEvent::Resize { .. } => Vec::new(),
        }
    }

    /// Fire any armed wheel step whose quiet period elapsed.
    pub fn poll(&mut self, now: Instant) -> Vec<Action> {
        match self.wheel {
            Some(wheel) if now.duration_since(wheel.armed_at) >= WHEEL_ZOOM_DELAY => {
                self.wheel = None;
                vec![Action::ZoomStep {
                    delta: wheel.direction,
                    focus: Some(wheel.position),
                }]
            }
            _ => Vec::new(),
        }
    }
}

fn midpoint(a: &TouchPoint, b: &TouchPoint) -> Point {
    Point::new(
        (a.position.x + b.position.x) / 2.0,
        (a.position.y + b.position.y) / 2.0,
    )
}
