//! Opaque PDF engine contract for the reader.
//!
//! The reader core never parses PDF bytes itself; it talks to a backend
//! through the [`PdfEngine`] trait: open a document, ask for page count and
//! view boxes, and start cancellable page renders. The default backend uses
//! `lopdf` for structure parsing and draws placeholder rasters; a real
//! rasterizer can be plugged in behind the `pdfium` feature.

mod task;

pub use task::{
    CancellationToken, PageRaster, RenderOutcome, RenderTask, Surface, TaskStatus,
};

use image::{ImageBuffer, Rgba};
use lopdf::Document;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Opaque handle to an open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    /// Mint a handle from a raw id; test doubles standing in for a backend
    /// need this, real callers only ever receive handles from [`PdfEngine::load`].
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Page bounds in PDF user-space points, `(x0, y0)` to `(x1, y1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl ViewBox {
    pub const US_LETTER: Self = Self {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    };

    pub fn width(self) -> f32 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(self) -> f32 {
        (self.y1 - self.y0).abs()
    }
}

/// Decoded per-page facts the reader needs before any rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    /// 1-based page number.
    pub page_number: u32,
    pub view_box: ViewBox,
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("invalid document handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

/// The contract every PDF backend fulfills.
///
/// Pages are addressed by 1-based page number throughout, matching the
/// reader's page registry.
pub trait PdfEngine {
    fn load(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError>;
    fn page_count(&self, doc: DocumentHandle) -> Result<u32, EngineError>;
    fn page(&self, doc: DocumentHandle, page_number: u32) -> Result<PageInfo, EngineError>;

    /// Begin rendering a page at `scale` raster pixels per PDF point.
    ///
    /// The surface is allocated from the page's view box and the scale; the
    /// returned task is advanced by the caller and may be cancelled at any
    /// point between row bands.
    fn begin_render(
        &self,
        doc: DocumentHandle,
        page_number: u32,
        scale: f32,
    ) -> Result<RenderTask, EngineError>;

    fn close(&mut self, doc: DocumentHandle) -> Result<(), EngineError>;
}

#[derive(Debug, Clone)]
struct DocumentRecord {
    view_boxes: Vec<ViewBox>,
}

/// Default backend: `lopdf` structure parsing plus placeholder rasters.
#[derive(Debug, Default)]
pub struct LopdfEngine {
    next_handle: u64,
    docs: HashMap<DocumentHandle, DocumentRecord>,
}

fn number(obj: &lopdf::Object) -> Option<f32> {
    match obj {
        lopdf::Object::Integer(i) => Some(*i as f32),
        lopdf::Object::Real(f) => Some(*f),
        _ => None,
    }
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_view_boxes(bytes: &[u8]) -> Result<Vec<ViewBox>, EngineError> {
        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(EngineError::EncryptedUnsupported);
        }

        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let mut view_boxes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let view_box = doc
                .get_dictionary(object_id)
                .ok()
                .and_then(|dict| dict.get(b"MediaBox").ok())
                .and_then(|obj| obj.as_array().ok())
                .and_then(|array| {
                    if array.len() != 4 {
                        return None;
                    }
                    Some(ViewBox {
                        x0: number(&array[0])?,
                        y0: number(&array[1])?,
                        x1: number(&array[2])?,
                        y1: number(&array[3])?,
                    })
                })
                .unwrap_or(ViewBox::US_LETTER);

            view_boxes.push(view_box);
        }

        if view_boxes.is_empty() {
            return Err(EngineError::Backend("document has no pages".to_owned()));
        }

        Ok(view_boxes)
    }

    fn record(&self, doc: DocumentHandle) -> Result<&DocumentRecord, EngineError> {
        self.docs
            .get(&doc)
            .ok_or(EngineError::InvalidHandle(doc.raw()))
    }
}

impl PdfEngine for LopdfEngine {
    fn load(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let view_boxes = Self::parse_view_boxes(&bytes)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        tracing::debug!(handle = handle.raw(), pages = view_boxes.len(), "document loaded");
        self.docs.insert(handle, DocumentRecord { view_boxes });

        Ok(handle)
    }

    fn page_count(&self, doc: DocumentHandle) -> Result<u32, EngineError> {
        Ok(self.record(doc)?.view_boxes.len() as u32)
    }

    fn page(&self, doc: DocumentHandle, page_number: u32) -> Result<PageInfo, EngineError> {
        let record = self.record(doc)?;
        let page_count = record.view_boxes.len() as u32;

        let index = page_number
            .checked_sub(1)
            .filter(|index| *index < page_count)
            .ok_or(EngineError::PageOutOfRange {
                page: page_number,
                page_count,
            })?;

        Ok(PageInfo {
            page_number,
            view_box: record.view_boxes[index as usize],
        })
    }

    fn begin_render(
        &self,
        doc: DocumentHandle,
        page_number: u32,
        scale: f32,
    ) -> Result<RenderTask, EngineError> {
        let info = self.page(doc, page_number)?;
        let scale = if scale <= 0.0 { 1.0 } else { scale };

        let width = (info.view_box.width() * scale).round().max(1.0) as u32;
        let height = (info.view_box.height() * scale).round().max(1.0) as u32;

        Ok(RenderTask::new(
            Box::new(PlaceholderRaster { width, height }),
            Surface::new(width, height),
        ))
    }

    fn close(&mut self, doc: DocumentHandle) -> Result<(), EngineError> {
        self.docs
            .remove(&doc)
            .map(|_| ())
            .ok_or(EngineError::InvalidHandle(doc.raw()))
    }
}

/// White page with a light border, drawn row by row so renders stay
/// cancellable mid-flight.
struct PlaceholderRaster {
    width: u32,
    height: u32,
}

const PAGE_FILL: [u8; 4] = [255, 255, 255, 255];
const BORDER_FILL: [u8; 4] = [220, 220, 220, 255];

impl PageRaster for PlaceholderRaster {
    fn raster_rows(
        &mut self,
        surface: &mut Surface,
        first_row: u32,
        row_count: u32,
    ) -> Result<(), EngineError> {
        let draw_border = self.width >= 4 && self.height >= 4;

        for row in first_row..(first_row + row_count).min(self.height) {
            let edge_row = row == 0 || row == self.height - 1;
            let pixels = surface.row_mut(row);

            for x in 0..self.width as usize {
                let edge_col = x == 0 || x == (self.width as usize) - 1;
                let color = if draw_border && (edge_row || edge_col) {
                    BORDER_FILL
                } else {
                    PAGE_FILL
                };
                pixels[x * 4..x * 4 + 4].copy_from_slice(&color);
            }
        }

        Ok(())
    }
}

/// Convert a finished surface into an `image` buffer for host interchange.
pub fn surface_to_image(surface: &Surface) -> RgbaImage {
    ImageBuffer::from_fn(surface.width(), surface.height(), |x, y| {
        let index = ((y * surface.width() + x) * 4) as usize;
        let pixels = surface.pixels();
        Rgba([
            pixels[index],
            pixels[index + 1],
            pixels[index + 2],
            pixels[index + 3],
        ])
    })
}

#[cfg(feature = "pdfium")]
pub mod pdfium_backend {
    use super::*;
    use pdfium_render::prelude::*;

    /// Backend that verifies a pdfium binding is available and otherwise
    /// shares the default engine's bookkeeping.
    pub struct PdfiumEngine {
        inner: LopdfEngine,
    }

    impl PdfiumEngine {
        pub fn from_system_library() -> Result<Self, EngineError> {
            let _ = Pdfium::bind_to_system_library().map_err(|err| {
                EngineError::Backend(format!("failed to bind pdfium system library: {err}"))
            })?;

            Ok(Self {
                inner: LopdfEngine::default(),
            })
        }
    }

    impl PdfEngine for PdfiumEngine {
        fn load(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError> {
            self.inner.load(source)
        }

        fn page_count(&self, doc: DocumentHandle) -> Result<u32, EngineError> {
            self.inner.page_count(doc)
        }

        fn page(&self, doc: DocumentHandle, page_number: u32) -> Result<PageInfo, EngineError> {
            self.inner.page(doc, page_number)
        }

        fn begin_render(
            &self,
            doc: DocumentHandle,
            page_number: u32,
            scale: f32,
        ) -> Result<RenderTask, EngineError> {
            self.inner.begin_render(doc, page_number, scale)
        }

        fn close(&mut self, doc: DocumentHandle) -> Result<(), EngineError> {
            self.inner.close(doc)
        }
    }
}

pub fn default_engine() -> LopdfEngine {
    LopdfEngine::new()
}
