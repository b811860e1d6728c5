//! Reader composition root.
//!
//! Wires the engine, the viewport state engine, the transform controller,
//! the visibility tracker, and one canvas scheduler per page into a single
//! embeddable unit, with every dependency passed explicitly. The host owns
//! the event loop: it forwards gestures and mounts, then calls [`Reader::pump`]
//! on each tick.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

use pdf_reader_engine::{DocumentHandle, EngineError, OpenSource, PdfEngine};
use pdf_reader_render::{CanvasScheduler, RenderConfig, RenderedFrame, SurfaceCache};
use pdf_reader_viewport::{
    fit_page_zoom, fit_width_zoom, prefetch_page_numbers, ContentRegion, DisplayMetrics,
    DprTracker, GestureHost, PageRegion, ScrollBehavior, ScrollRegion, SizedRegion,
    TransformController, ViewportEngine, ViewportOptions, VisibilityTracker,
};
use serde::{Deserialize, Serialize};

use crate::document::DocumentSession;
use crate::page::{PageContext, PageMount};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderOptions {
    pub viewport: ViewportOptions,
    pub render: RenderConfig,
    /// Page to land on once the document is ready, clamped to the valid
    /// range. 1-based.
    pub initial_page: u32,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            viewport: ViewportOptions::default(),
            render: RenderConfig::default(),
            initial_page: 1,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(mut self, viewport: ViewportOptions) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    pub fn with_initial_page(mut self, initial_page: u32) -> Self {
        self.initial_page = initial_page;
        self
    }
}

/// What one pump produced: completed frames, plus per-page render failures
/// that are fatal to that attempt but never to the viewer.
#[derive(Default)]
pub struct PumpReport {
    pub frames: Vec<RenderedFrame>,
    pub failures: Vec<(u32, EngineError)>,
}

struct PageSlot {
    mount: PageMount,
    canvas: CanvasScheduler,
}

pub struct Reader<E: PdfEngine> {
    engine: E,
    session: DocumentSession,
    viewport: Rc<ViewportEngine>,
    transform: TransformController,
    visibility: VisibilityTracker,
    cache: Rc<RefCell<SurfaceCache>>,
    pages: BTreeMap<u32, PageSlot>,
    dpr: Option<DprTracker>,
    options: ReaderOptions,
    initial_nav_done: bool,
    on_ready: Option<Box<dyn FnOnce()>>,
}

impl<E: PdfEngine> Reader<E> {
    /// Load a document and build the page contexts. A load failure still
    /// yields a reader; it just never becomes ready.
    pub fn open(mut engine: E, source: OpenSource, options: ReaderOptions) -> Self {
        let session = DocumentSession::open(&mut engine, source);
        let viewport = ViewportEngine::new(options.viewport);
        let transform = TransformController::new(Rc::clone(&viewport));
        let cache = Rc::new(RefCell::new(SurfaceCache::new(options.render.cache_capacity)));

        let mut pages = BTreeMap::new();
        if let Some(doc) = session.handle() {
            for page_number in 1..=session.page_count() {
                let context = PageContext::resolve(&engine, doc, page_number);
                let canvas = CanvasScheduler::new(
                    doc,
                    page_number,
                    viewport.zoom(),
                    1.0,
                    options.render.clone(),
                    Rc::clone(&cache),
                );
                pages.insert(
                    page_number,
                    PageSlot {
                        mount: PageMount::new(Rc::clone(&viewport), context),
                        canvas,
                    },
                );
            }
        }

        Self {
            engine,
            session,
            viewport,
            transform,
            visibility: VisibilityTracker::new(),
            cache,
            pages,
            dpr: None,
            options,
            initial_nav_done: false,
            on_ready: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    pub fn page_count(&self) -> u32 {
        self.session.page_count()
    }

    pub fn document(&self) -> Option<DocumentHandle> {
        self.session.handle()
    }

    /// The viewport context consumed by navigation and zoom widgets.
    pub fn viewport(&self) -> &Rc<ViewportEngine> {
        &self.viewport
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.options.render
    }

    pub fn surface_cache(&self) -> &Rc<RefCell<SurfaceCache>> {
        &self.cache
    }

    pub fn page(&self, page_number: u32) -> Option<&PageContext> {
        self.pages.get(&page_number).map(|slot| slot.mount.context())
    }

    /// Last completed bitmap for a page, with the scale it was rendered at.
    pub fn page_bitmap(&self, page_number: u32) -> Option<(f32, &pdf_reader_engine::Surface)> {
        self.pages
            .get(&page_number)
            .and_then(|slot| slot.canvas.bitmap())
    }

    /// Invoked once, after the document is ready and the initial navigation
    /// has been issued.
    pub fn set_ready_callback(&mut self, callback: Box<dyn FnOnce()>) {
        self.on_ready = Some(callback);
    }

    /// Fires with final pixel dimensions after each completed render of the
    /// page's canvas.
    pub fn set_rendered_callback(
        &mut self,
        page_number: u32,
        callback: pdf_reader_render::RenderedCallback,
    ) {
        if let Some(slot) = self.pages.get_mut(&page_number) {
            slot.canvas.set_rendered_callback(callback);
        }
    }

    /// Bind the host's scroll container, sizing wrapper, and scaled content.
    pub fn attach_viewport(
        &self,
        container: Rc<dyn ScrollRegion>,
        wrapper: Rc<dyn SizedRegion>,
        content: Rc<dyn ContentRegion>,
    ) {
        self.visibility.set_container(Rc::clone(&container));
        self.transform.attach(container, wrapper, content);
    }

    pub fn set_gesture_host(&self, host: Rc<dyn GestureHost>) {
        self.transform.set_gesture_host(host);
    }

    pub fn set_display_metrics(&mut self, metrics: Rc<dyn DisplayMetrics>) {
        let tracker = DprTracker::new(metrics);
        let dpr = tracker.current();
        for slot in self.pages.values_mut() {
            slot.canvas.set_dpr(dpr);
        }
        self.dpr = Some(tracker);
    }

    /// A page's layout container exists: register it and start observing
    /// its visibility. Re-mounting replaces the previous observation.
    pub fn mount_page(&mut self, page_number: u32, region: Rc<dyn PageRegion>) {
        let Some(slot) = self.pages.get(&page_number) else {
            return;
        };
        slot.mount.mounted(Rc::clone(&region));
        self.visibility.observe(page_number, region);
    }

    pub fn unmount_page(&mut self, page_number: u32) {
        self.visibility.unobserve(page_number);
        if let Some(slot) = self.pages.get_mut(&page_number) {
            slot.mount.unmounted();
            slot.canvas.cancel();
        }
    }

    /// Gesture entry points, forwarded to the transform controller.
    pub fn transform(&self) -> &TransformController {
        &self.transform
    }

    pub fn set_zoom(&self, zoom: f32) -> f32 {
        self.viewport.set_zoom(zoom)
    }

    pub fn update_zoom(&self, update: impl FnOnce(f32) -> f32) -> f32 {
        self.viewport.update_zoom(update)
    }

    pub fn go_to_page(&self, page_number: u32, behavior: ScrollBehavior) -> bool {
        self.viewport.go_to_page(page_number, behavior)
    }

    pub fn current_page(&self) -> u32 {
        self.viewport.current_page()
    }

    fn display_density(&self) -> f32 {
        self.dpr.as_ref().map(|tracker| tracker.current()).unwrap_or(1.0)
    }

    /// Zoom so the current page fills the viewport width. `None` until the
    /// viewport is attached and the page decoded.
    pub fn zoom_to_fit_width(&self) -> Option<f32> {
        let container = self.transform.container_rect()?;
        let page = self.page(self.current_page())?;
        let view_box = page.view_box();

        Some(self.set_zoom(fit_width_zoom(
            container.width,
            view_box.width(),
            self.display_density(),
        )))
    }

    /// Zoom so the current page fits inside the viewport whole.
    pub fn zoom_to_fit_page(&self) -> Option<f32> {
        let container = self.transform.container_rect()?;
        let page = self.page(self.current_page())?;
        let view_box = page.view_box();

        Some(self.set_zoom(fit_page_zoom(
            container.width,
            container.height,
            view_box.width(),
            view_box.height(),
            self.display_density(),
        )))
    }

    /// One event-loop tick: reconcile pending navigation and zoom, sweep
    /// visibility, and advance page renders within their frame budgets.
    pub fn pump(&mut self, now: Instant) -> PumpReport {
        if self.session.is_ready() && !self.initial_nav_done {
            let last = self.session.page_count().max(1);
            let target = self.options.initial_page.clamp(1, last);
            if self.viewport.go_to_page(target, ScrollBehavior::Instant) {
                self.initial_nav_done = true;
                if let Some(callback) = self.on_ready.take() {
                    callback();
                }
            }
        }

        self.transform.sync_engine_zoom();

        let dpr_changed = self.dpr.as_ref().and_then(|tracker| tracker.sample());

        for (page_number, fraction) in self.visibility.sweep() {
            if let Some(slot) = self.pages.get_mut(&page_number) {
                slot.mount.visibility_report(fraction);
                slot.canvas.set_visible(fraction > 0.0, now);
            }
        }

        let zoom = self.viewport.zoom();
        let mut report = PumpReport::default();

        // Pump the current page first, then neighbors nearest-first, so
        // tight frame budgets finish the pages the user will see next.
        for page_number in self.pump_order() {
            let Some(slot) = self.pages.get_mut(&page_number) else {
                continue;
            };

            slot.canvas.set_zoom(zoom, now);
            if let Some(dpr) = dpr_changed {
                slot.canvas.set_dpr(dpr);
            }

            match slot.canvas.pump(&self.engine, now) {
                Ok(Some(frame)) => report.frames.push(frame),
                Ok(None) => {}
                Err(err) => report.failures.push((page_number, err)),
            }
        }

        report
    }

    fn pump_order(&self) -> Vec<u32> {
        let current = self.viewport.current_page();
        let page_count = self.session.page_count();

        let mut order = Vec::with_capacity(self.pages.len());
        if self.pages.contains_key(&current) {
            order.push(current);
        }

        for page_number in prefetch_page_numbers(current, page_count, page_count) {
            if self.pages.contains_key(&page_number) {
                order.push(page_number);
            }
        }

        order
    }
}

impl<E: PdfEngine> Drop for Reader<E> {
    fn drop(&mut self) {
        if let Some(doc) = self.session.handle() {
            let _ = self.engine.close(doc);
        }
    }
}
