//! Thumbnail rail: one observer per page, activation navigates.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

use pdf_reader_engine::{DocumentHandle, PdfEngine, Surface};
use pdf_reader_render::{RenderConfig, RenderedFrame, ThumbnailObserver};
use pdf_reader_viewport::{ScrollBehavior, ViewportEngine};

pub struct ThumbnailRail {
    observers: BTreeMap<u32, ThumbnailObserver>,
    viewport: Rc<ViewportEngine>,
}

impl ThumbnailRail {
    pub fn new(
        doc: DocumentHandle,
        page_count: u32,
        viewport: Rc<ViewportEngine>,
        config: RenderConfig,
    ) -> Self {
        let observers = (1..=page_count)
            .map(|page_number| {
                (
                    page_number,
                    ThumbnailObserver::new(doc, page_number, config.clone()),
                )
            })
            .collect();

        Self { observers, viewport }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Click or keyboard activation of a thumbnail: jump without animation.
    pub fn activate(&self, page_number: u32) -> bool {
        self.viewport.go_to_page(page_number, ScrollBehavior::Instant)
    }

    /// True once the thumbnail painted and its skeleton can be swapped.
    pub fn is_ready(&self, page_number: u32, now: Instant) -> bool {
        self.observers
            .get(&page_number)
            .map(|observer| observer.is_ready(now))
            .unwrap_or(false)
    }

    pub fn bitmap(&self, page_number: u32) -> Option<&Surface> {
        self.observers
            .get(&page_number)
            .and_then(|observer| observer.bitmap())
    }

    /// Advance thumbnail renders. Failures are logged by the observer and
    /// skipped here; a broken thumbnail never takes the rail down.
    pub fn pump(&mut self, engine: &dyn PdfEngine, now: Instant) -> Vec<RenderedFrame> {
        let mut frames = Vec::new();

        for observer in self.observers.values_mut() {
            match observer.pump(engine, now) {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => {}
                Err(_) => {}
            }
        }

        frames
    }
}
