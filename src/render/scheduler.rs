//! Render coalescing.
//!
//! Every state change asks for a render by setting a pending flag; the host
//! pump performs at most one render per frame no matter how many requests
//! piled up. Each performed render gets a generation number, and a render
//! in progress can detect that a newer request arrived (`superseded`) and
//! bail out early, leaving the fresh frame to the next pump.

/// Pending-render flag plus a generation counter.
#[derive(Debug, Clone, Default)]
pub struct RenderScheduler {
    pending: bool,
    generation: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a render. Requests between pumps collapse into one.
    pub fn schedule(&mut self) {
        self.pending = true;
    }

    /// Whether a render request is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Claim the pending request, if any, and start a new generation.
    /// Returns the generation token the render pass should carry.
    pub fn take(&mut self) -> Option<u64> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        self.generation += 1;
        Some(self.generation)
    }

    /// True when a newer request arrived after the render carrying
    /// `generation` started, meaning its output is already stale.
    pub fn superseded(&self, generation: u64) -> bool {
        self.pending || generation != self.generation
    }
}
