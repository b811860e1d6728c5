//! Per-page context and mount-time glue.

use std::rc::Rc;

use pdf_reader_engine::{DocumentHandle, PageInfo, PdfEngine, ViewBox};
use pdf_reader_viewport::{PageRegion, ViewportEngine};

/// A-series fallback size for undecoded pages, so skeletons hold roughly
/// the right shape.
pub const FALLBACK_PAGE_WIDTH: f32 = 240.0;
pub const FALLBACK_PAGE_HEIGHT: f32 = 339.0;

/// Skeleton size for thumbnails that have not painted yet.
pub const FALLBACK_THUMBNAIL_WIDTH: f32 = 96.0;
pub const FALLBACK_THUMBNAIL_HEIGHT: f32 = 136.0;

/// What the page-level widgets (canvas, text, annotation layers) consume:
/// the page's decoded facts plus a ready flag.
#[derive(Debug, Clone, Copy)]
pub struct PageContext {
    page_number: u32,
    info: Option<PageInfo>,
}

impl PageContext {
    /// Resolve a page against the engine. A decode failure yields a
    /// not-ready context; the page stays skeletal and the viewer keeps going.
    pub fn resolve(engine: &dyn PdfEngine, doc: DocumentHandle, page_number: u32) -> Self {
        let info = match engine.page(doc, page_number) {
            Ok(info) => Some(info),
            Err(err) => {
                tracing::warn!(page_number, error = %err, "page decode failed");
                None
            }
        };

        Self { page_number, info }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn is_ready(&self) -> bool {
        self.info.is_some()
    }

    /// Decoded view box, or the A-series fallback while not ready.
    pub fn view_box(&self) -> ViewBox {
        match self.info {
            Some(info) => info.view_box,
            None => ViewBox {
                x0: 0.0,
                y0: 0.0,
                x1: FALLBACK_PAGE_WIDTH,
                y1: FALLBACK_PAGE_HEIGHT,
            },
        }
    }
}

/// Mount-time behavior of one page:
/// registration happens as soon as a container exists, independent of
/// decode state; visibility reports are forwarded only once the page is
/// ready, so the visibility map never carries entries for undecoded pages.
pub struct PageMount {
    viewport: Rc<ViewportEngine>,
    context: PageContext,
}

impl PageMount {
    pub fn new(viewport: Rc<ViewportEngine>, context: PageContext) -> Self {
        Self { viewport, context }
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }

    pub fn mounted(&self, region: Rc<dyn PageRegion>) {
        self.viewport
            .set_page_ref(self.context.page_number(), region);
    }

    pub fn unmounted(&self) {
        self.viewport.remove_page_ref(self.context.page_number());
    }

    pub fn visibility_report(&self, fraction: f32) {
        if !self.context.is_ready() {
            return;
        }
        self.viewport
            .set_page_visible(self.context.page_number(), fraction);
    }
}
