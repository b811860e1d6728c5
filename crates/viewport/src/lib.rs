//! Viewport and page-visibility core for the PDF reader.
//!
//! Owns zoom, pan, per-page registration, and per-page visibility fractions,
//! and reconciles them into scroll commands, a derived current page, and the
//! inputs the render schedulers consume. Everything here runs on a single
//! logical thread of control; bursts of rapid input are serialized through
//! explicit debouncing rather than locks.

mod debounce;
mod dpr;
mod engine;
mod fit;
mod geometry;
mod host;
mod transform;
mod visibility;

pub use debounce::Debounced;
pub use dpr::{DprTracker, MAX_INITIAL_DPR};
pub use engine::{ViewportEngine, ViewportOptions};
pub use fit::{fit_page_zoom, fit_width_zoom, prefetch_page_numbers};
pub use geometry::{Point, Rect};
pub use host::{
    ContentRegion, DisplayMetrics, GestureHost, PageRegion, ScrollBehavior, ScrollRegion,
    SizedRegion,
};
pub use transform::{GestureSession, Transform, TransformController};
pub use visibility::VisibilityTracker;
