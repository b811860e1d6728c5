//! Render scheduling for page canvases and thumbnails.
//!
//! Decides raster resolution from visibility, zoom, and display density,
//! drives cancellable engine renders inside a per-frame time budget, and
//! reuses completed surfaces through a bounded LRU cache.

mod budget;
mod cache;
mod canvas;
mod decision;
mod readiness;
mod thumbnail;

pub use budget::{FrameBudget, FRAME_BUDGET_120FPS, FRAME_BUDGET_60FPS};
pub use cache::{SurfaceCache, SurfaceKey};
pub use canvas::{CanvasScheduler, RenderConfig, RenderedCallback, RenderedFrame};
pub use decision::{target_raster_scale, HIDDEN_RASTER_SCALE, THUMBNAIL_RASTER_SCALE};
pub use readiness::{LayerReadiness, TEXT_LAYER_HOLD};
pub use thumbnail::ThumbnailObserver;
