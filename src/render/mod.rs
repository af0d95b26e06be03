pub mod context;
pub mod scheduler;

// Re-export the essential types
pub use context::{CompositeMode, DrawCommand, PathStyle, RenderContext, TextStyle};
pub use scheduler::RenderScheduler;
