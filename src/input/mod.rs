pub mod events;
pub mod gestures;

// Re-export the essential types
pub use events::{EventCallback, EventManager, InputEvent, MapEvent, MouseButton, TouchPoint};
pub use gestures::{Action, GestureRecognizer};
