//! Cancellable, incrementally-stepped render tasks.
//!
//! Rasterization is the only long-running operation in the reader, so it is
//! modeled as a task the host event loop advances in row bands. The task
//! checks its cancellation token between bands; cancellation is cooperative
//! and best-effort, never preemptive.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::EngineError;

/// Cancellation token for cooperative render cancellation.
///
/// Clones share the same underlying flag, so a scheduler can keep one clone
/// while handing another to whatever drives the task. Cancelling is
/// idempotent.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// An owned RGBA8 pixel buffer a render task draws into.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    /// Allocate a surface of at least 1x1 pixels, initially transparent.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable access to one row of RGBA8 pixels.
    pub fn row_mut(&mut self, row: u32) -> &mut [u8] {
        let stride = (self.width as usize) * 4;
        let start = (row as usize) * stride;
        &mut self.pixels[start..start + stride]
    }

    /// True once any pixel differs from the cleared state.
    pub fn is_painted(&self) -> bool {
        self.pixels.iter().any(|byte| *byte != 0)
    }
}

/// Incremental rasterizer for one page at one scale.
///
/// Implementations fill the requested row range of the surface and must be
/// resumable: the task calls this repeatedly with advancing `first_row`.
pub trait PageRaster {
    fn raster_rows(
        &mut self,
        surface: &mut Surface,
        first_row: u32,
        row_count: u32,
    ) -> Result<(), EngineError>;
}

/// Terminal state of a render task.
#[derive(Debug)]
pub enum RenderOutcome {
    Completed,
    Cancelled,
    Failed(EngineError),
}

impl RenderOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result of advancing a task by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    InFlight,
    Finished,
}

/// A cancellable page render in flight.
///
/// At most one task exists per canvas at a time; the scheduler cancels the
/// old task before starting a successor. Dropping a task without finishing
/// it abandons the render, which counts as cancellation.
pub struct RenderTask {
    raster: Box<dyn PageRaster>,
    surface: Surface,
    next_row: u32,
    token: CancellationToken,
    outcome: Option<RenderOutcome>,
}

impl RenderTask {
    pub fn new(raster: Box<dyn PageRaster>, surface: Surface) -> Self {
        Self {
            raster,
            surface,
            next_row: 0,
            token: CancellationToken::new(),
            outcome: None,
        }
    }

    /// A clone of this task's cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&RenderOutcome> {
        self.outcome.as_ref()
    }

    /// Pixel dimensions of the surface being rendered.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    /// Advance the render by up to `max_rows` rows.
    ///
    /// The cancellation token is checked before any pixels are written, so a
    /// cancel between steps guarantees no further writes to the surface.
    pub fn step(&mut self, max_rows: u32) -> TaskStatus {
        if self.outcome.is_some() {
            return TaskStatus::Finished;
        }

        if self.token.is_cancelled() {
            self.outcome = Some(RenderOutcome::Cancelled);
            return TaskStatus::Finished;
        }

        let total_rows = self.surface.height();
        if self.next_row >= total_rows {
            self.outcome = Some(RenderOutcome::Completed);
            return TaskStatus::Finished;
        }

        let row_count = max_rows.max(1).min(total_rows - self.next_row);
        match self
            .raster
            .raster_rows(&mut self.surface, self.next_row, row_count)
        {
            Ok(()) => {
                self.next_row += row_count;
                if self.next_row >= total_rows {
                    self.outcome = Some(RenderOutcome::Completed);
                    TaskStatus::Finished
                } else {
                    TaskStatus::InFlight
                }
            }
            Err(err) => {
                self.outcome = Some(RenderOutcome::Failed(err));
                TaskStatus::Finished
            }
        }
    }

    /// Drive the task until it finishes. Cancellation still interrupts
    /// between bands.
    pub fn run_to_completion(&mut self) -> &RenderOutcome {
        while self.step(u32::MAX) == TaskStatus::InFlight {}
        // step() always records an outcome before returning Finished
        self.outcome.get_or_insert(RenderOutcome::Cancelled)
    }

    /// Consume the task, yielding its outcome and the surface.
    ///
    /// An unfinished task resolves to `Cancelled`; the surface is returned
    /// as-is so callers can discard or reuse it.
    pub fn finish(self) -> (RenderOutcome, Surface) {
        let outcome = self.outcome.unwrap_or(RenderOutcome::Cancelled);
        (outcome, self.surface)
    }
}
