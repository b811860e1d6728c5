//! Host-environment seams.
//!
//! The viewport core never touches a widget tree directly; the embedding
//! layer hands it trait objects for the few operations it needs. Handles are
//! late-bound: a page or scroll region may not exist yet when an operation
//! fires, and every consumer treats absence as an expected transient.

use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Layout container of one mounted page (or any element whose visibility is
/// tracked).
pub trait PageRegion {
    fn bounding_rect(&self) -> Rect;
}

/// The scrollable region that presents the document.
pub trait ScrollRegion {
    fn bounding_rect(&self) -> Rect;
    fn scroll_offset(&self) -> Point;

    /// Direct offset write, used by gesture-driven transforms every frame.
    fn set_scroll_offset(&self, offset: Point);

    /// Programmatic navigation; `behavior` is a hint to the host's scroll
    /// primitive, not a correctness concern.
    fn scroll_to(&self, offset: Point, behavior: ScrollBehavior);
}

/// The scaled content element inside the scroll region.
pub trait ContentRegion {
    fn bounding_rect(&self) -> Rect;

    /// Apply a uniform 2D scale to the content.
    fn set_scale(&self, scale: f32);
}

/// The unscaled wrapper that reserves layout space for the scaled content.
pub trait SizedRegion {
    fn set_size(&self, width: f32, height: f32);
}

/// Display density source.
pub trait DisplayMetrics {
    fn device_pixel_ratio(&self) -> f32;
}

/// Native gesture control at the host-document level. While a viewport is
/// mounted, the host's own pinch/zoom handling must not compete with ours.
pub trait GestureHost {
    fn set_native_gestures_enabled(&self, enabled: bool);
}
