//! Canvas render scheduling.
//!
//! One scheduler per page canvas. Zoom and visibility arrive debounced so a
//! continuous pinch or scroll does not trigger a raster per frame; only the
//! settled values change the target scale. Whenever the target changes the
//! in-flight render is cancelled and a replacement starts. The cancelled
//! task's outcome is expected and swallowed; any other render failure
//! propagates to the pump caller. At most one render is active per canvas.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use pdf_reader_engine::{
    DocumentHandle, EngineError, PdfEngine, RenderOutcome, RenderTask, Surface, TaskStatus,
};
use pdf_reader_viewport::Debounced;
use serde::{Deserialize, Serialize};

use crate::budget::{FrameBudget, FRAME_BUDGET_60FPS};
use crate::cache::{SurfaceCache, SurfaceKey};
use crate::decision::target_raster_scale;

/// Scheduler tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Quiet period applied to zoom and visibility before they affect the
    /// raster scale.
    pub debounce: Duration,
    /// Rows rasterized per task step.
    pub rows_per_band: u32,
    /// Time slice one pump may spend rasterizing.
    pub frame_budget: Duration,
    /// Completed surfaces kept for reuse, per viewer.
    pub cache_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            rows_per_band: 64,
            frame_budget: FRAME_BUDGET_60FPS,
            cache_capacity: 16,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_rows_per_band(mut self, rows_per_band: u32) -> Self {
        self.rows_per_band = rows_per_band;
        self
    }

    pub fn with_frame_budget(mut self, frame_budget: Duration) -> Self {
        self.frame_budget = frame_budget;
        self
    }

    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }
}

/// Final raster facts handed to the rendered notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedFrame {
    pub page_number: u32,
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

pub type RenderedCallback = Box<dyn FnMut(&RenderedFrame)>;

pub struct CanvasScheduler {
    doc: DocumentHandle,
    page_number: u32,
    config: RenderConfig,
    zoom: Debounced<f32>,
    visible: Debounced<bool>,
    dpr: f32,
    active_scale: Option<f32>,
    in_flight: Option<RenderTask>,
    bitmap: Option<(f32, Surface)>,
    cache: Rc<RefCell<SurfaceCache>>,
    on_rendered: Option<RenderedCallback>,
    renders_started: u64,
}

impl CanvasScheduler {
    /// Visibility starts `false`: a page that has never been observed renders
    /// at the hidden fallback scale until a report says otherwise.
    pub fn new(
        doc: DocumentHandle,
        page_number: u32,
        initial_zoom: f32,
        dpr: f32,
        config: RenderConfig,
        cache: Rc<RefCell<SurfaceCache>>,
    ) -> Self {
        Self {
            doc,
            page_number,
            zoom: Debounced::new(initial_zoom, config.debounce),
            visible: Debounced::new(false, config.debounce),
            dpr,
            config,
            active_scale: None,
            in_flight: None,
            bitmap: None,
            cache,
            on_rendered: None,
            renders_started: 0,
        }
    }

    /// Fires after the first successful render and after every completed
    /// rescale, with the final pixel dimensions.
    pub fn set_rendered_callback(&mut self, callback: RenderedCallback) {
        self.on_rendered = Some(callback);
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn set_zoom(&mut self, zoom: f32, now: Instant) {
        self.zoom.submit(zoom, now);
    }

    pub fn set_visible(&mut self, visible: bool, now: Instant) {
        self.visible.submit(visible, now);
    }

    /// Density changes are not debounced; they are rare and discrete.
    pub fn set_dpr(&mut self, dpr: f32) {
        self.dpr = dpr;
    }

    /// Last completed surface and the scale it was rendered at.
    pub fn bitmap(&self) -> Option<(f32, &Surface)> {
        self.bitmap.as_ref().map(|(scale, surface)| (*scale, surface))
    }

    pub fn is_rendering(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Renders issued against the engine so far (cache hits excluded).
    pub fn renders_started(&self) -> u64 {
        self.renders_started
    }

    /// Cancel the in-flight render, e.g. on unmount. The cancelled outcome
    /// is swallowed by the next pump; nothing is written to the canvas
    /// afterwards.
    pub fn cancel(&mut self) {
        if let Some(task) = self.in_flight.as_ref() {
            task.cancel();
        }
    }

    /// Advance the scheduler: settle debounced inputs, supersede the render
    /// if the target scale changed, and rasterize within the frame budget.
    ///
    /// Returns the completed frame when a render finished this pump.
    pub fn pump(
        &mut self,
        engine: &dyn PdfEngine,
        now: Instant,
    ) -> Result<Option<RenderedFrame>, EngineError> {
        self.zoom.poll(now);
        self.visible.poll(now);

        let desired = target_raster_scale(*self.visible.value(), *self.zoom.value(), self.dpr);

        if self.active_scale != Some(desired) {
            // Supersede: the old task's cancellation is expected and must
            // not surface as a failure.
            if let Some(stale) = self.in_flight.take() {
                stale.cancel();
            }
            self.active_scale = Some(desired);

            let key = SurfaceKey::new(self.page_number, desired);
            let cached = self.cache.borrow_mut().get(&key).cloned();
            if let Some(surface) = cached {
                return Ok(Some(self.complete(desired, surface)));
            }

            self.in_flight = Some(engine.begin_render(self.doc, self.page_number, desired)?);
            self.renders_started += 1;
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
        let scale = self.active_scale.unwrap_or(desired);

        match task.finish() {
            (RenderOutcome::Completed, surface) => {
                self.cache
                    .borrow_mut()
                    .insert(SurfaceKey::new(self.page_number, scale), surface.clone());
                Ok(Some(self.complete(scale, surface)))
            }
            (RenderOutcome::Cancelled, _) => Ok(None),
            (RenderOutcome::Failed(err), _) => {
                tracing::error!(page_number = self.page_number, error = %err, "page render failed");
                Err(err)
            }
        }
    }

    fn complete(&mut self, scale: f32, surface: Surface) -> RenderedFrame {
        let frame = RenderedFrame {
            page_number: self.page_number,
            width: surface.width(),
            height: surface.height(),
            scale,
        };
        self.bitmap = Some((scale, surface));

        if let Some(callback) = self.on_rendered.as_mut() {
            callback(&frame);
        }

        frame
    }
}

impl Drop for CanvasScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.cancel();
        }
    }
}
