//! Embeddable PDF reader core.
//!
//! Composes the document-loading layer, the pannable/zoomable viewport, the
//! per-page render schedulers, and page navigation into one unit. The host
//! supplies layout regions and an event loop; current-page derivation,
//! anchor-preserving zoom, render-resolution decisions, and cancellation
//! live here and in the member crates.

mod document;
mod page;
mod reader;
mod thumbnails;

pub use document::DocumentSession;
pub use page::{
    PageContext, PageMount, FALLBACK_PAGE_HEIGHT, FALLBACK_PAGE_WIDTH,
    FALLBACK_THUMBNAIL_HEIGHT, FALLBACK_THUMBNAIL_WIDTH,
};
pub use reader::{PumpReport, Reader, ReaderOptions};
pub use thumbnails::ThumbnailRail;

pub use pdf_reader_engine as engine;
pub use pdf_reader_render as render;
pub use pdf_reader_viewport as viewport;
