//! First-paint readiness for swap-in layers.
//!
//! Skeleton placeholders are swapped for real content once the layer first
//! paints. Some layers hold the swap briefly so the shimmer does not flash
//! for a single frame.

use std::time::{Duration, Instant};

/// Hold applied to the text layer's skeleton swap.
pub const TEXT_LAYER_HOLD: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy)]
pub struct LayerReadiness {
    hold: Duration,
    content_at: Option<Instant>,
}

impl LayerReadiness {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            content_at: None,
        }
    }

    /// Readiness that flips as soon as content appears.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Record the first moment content appeared. Later calls are ignored.
    pub fn mark_content(&mut self, now: Instant) {
        if self.content_at.is_none() {
            self.content_at = Some(now);
        }
    }

    pub fn has_content(&self) -> bool {
        self.content_at.is_some()
    }

    /// True once content appeared and the hold elapsed.
    pub fn is_ready(&self, now: Instant) -> bool {
        match self.content_at {
            Some(at) => now >= at + self.hold,
            None => false,
        }
    }
}
