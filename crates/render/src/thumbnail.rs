//! Thumbnail render observation.
//!
//! Thumbnails render once at a fixed low resolution. The observer tracks
//! first paint so the host can swap a skeleton for the bitmap; it never
//! re-renders on zoom or visibility.

use std::time::Instant;

use pdf_reader_engine::{
    DocumentHandle, EngineError, PdfEngine, RenderOutcome, RenderTask, Surface, TaskStatus,
};

use crate::budget::FrameBudget;
use crate::canvas::{RenderConfig, RenderedFrame};
use crate::decision::THUMBNAIL_RASTER_SCALE;
use crate::readiness::LayerReadiness;

pub struct ThumbnailObserver {
    doc: DocumentHandle,
    page_number: u32,
    config: RenderConfig,
    in_flight: Option<RenderTask>,
    bitmap: Option<Surface>,
    readiness: LayerReadiness,
    started: bool,
}

impl ThumbnailObserver {
    pub fn new(doc: DocumentHandle, page_number: u32, config: RenderConfig) -> Self {
        Self {
            doc,
            page_number,
            config,
            in_flight: None,
            bitmap: None,
            readiness: LayerReadiness::immediate(),
            started: false,
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// True once the first render painted; the skeleton can be swapped.
    pub fn is_ready(&self, now: Instant) -> bool {
        self.readiness.is_ready(now)
    }

    pub fn bitmap(&self) -> Option<&Surface> {
        self.bitmap.as_ref()
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.in_flight.as_ref() {
            task.cancel();
        }
    }

    /// Start (once) and advance the thumbnail render.
    pub fn pump(
        &mut self,
        engine: &dyn PdfEngine,
        now: Instant,
    ) -> Result<Option<RenderedFrame>, EngineError> {
        if !self.started {
            self.started = true;
            self.in_flight =
                Some(engine.begin_render(self.doc, self.page_number, THUMBNAIL_RASTER_SCALE)?);
        }

        let Some(task) = self.in_flight.as_mut() else {
            return Ok(None);
        };

        let budget = FrameBudget::new(self.config.frame_budget);
        loop {
            if task.step(self.config.rows_per_band) == TaskStatus::Finished {
                break;
            }
            if budget.is_exceeded() {
                return Ok(None);
            }
        }

        let Some(task) = self.in_flight.take() else {
            return Ok(None);
        };

        match task.finish() {
            (RenderOutcome::Completed, surface) => {
                let frame = RenderedFrame {
                    page_number: self.page_number,
                    width: surface.width(),
                    height: surface.height(),
                    scale: THUMBNAIL_RASTER_SCALE,
                };
                self.bitmap = Some(surface);
                self.readiness.mark_content(now);
                Ok(Some(frame))
            }
            (RenderOutcome::Cancelled, _) => Ok(None),
            (RenderOutcome::Failed(err), _) => {
                tracing::error!(page_number = self.page_number, error = %err, "thumbnail render failed");
                Err(err)
            }
        }
    }
}

impl Drop for ThumbnailObserver {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.cancel();
        }
    }
}
