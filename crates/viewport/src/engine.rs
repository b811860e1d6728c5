//! Viewport state engine.
//!
//! One engine instance owns zoom, pan, the page registry, and the per-page
//! visibility map for a mounted viewer, and derives the current page from
//! them. It is a continuously-consistent store: every mutator filters
//! no-op writes so downstream consumers can memoize against [`revision`].
//!
//! [`revision`]: ViewportEngine::revision

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::host::{PageRegion, ScrollBehavior, ScrollRegion};

/// Zoom limits and the starting zoom for a viewer instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportOptions {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub default_zoom: f32,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 5.0,
            default_zoom: 1.0,
        }
    }
}

impl ViewportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_zoom(mut self, min_zoom: f32) -> Self {
        self.min_zoom = min_zoom;
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: f32) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_default_zoom(mut self, default_zoom: f32) -> Self {
        self.default_zoom = default_zoom;
        self
    }
}

/// Sentinel current page before any visibility report arrives.
const INITIAL_PAGE: u32 = 1;

pub struct ViewportEngine {
    min_zoom: f32,
    max_zoom: f32,
    zoom: Cell<f32>,
    pan: Cell<Point>,
    pages: RefCell<BTreeMap<u32, Rc<dyn PageRegion>>>,
    visibility: RefCell<BTreeMap<u32, f32>>,
    current_page: Cell<u32>,
    scroll_region: RefCell<Option<Rc<dyn ScrollRegion>>>,
    revision: Cell<u64>,
}

impl ViewportEngine {
    /// Create the engine behind the shared handle consumers memoize against.
    pub fn new(options: ViewportOptions) -> Rc<Self> {
        let zoom = options
            .default_zoom
            .clamp(options.min_zoom, options.max_zoom);

        Rc::new(Self {
            min_zoom: options.min_zoom,
            max_zoom: options.max_zoom,
            zoom: Cell::new(zoom),
            pan: Cell::new(Point::ZERO),
            pages: RefCell::new(BTreeMap::new()),
            visibility: RefCell::new(BTreeMap::new()),
            current_page: Cell::new(INITIAL_PAGE),
            scroll_region: RefCell::new(None),
            revision: Cell::new(0),
        })
    }

    pub fn min_zoom(&self) -> f32 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    pub fn zoom(&self) -> f32 {
        self.zoom.get()
    }

    pub fn pan(&self) -> Point {
        self.pan.get()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page.get()
    }

    /// Monotone counter advanced only by real state transitions.
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    fn bump(&self) {
        self.revision.set(self.revision.get() + 1);
    }

    /// Publish a zoom value, clamped to the engine's limits.
    ///
    /// Returns the zoom now in effect. A write that clamps to the current
    /// value is a no-op and does not advance the revision.
    pub fn set_zoom(&self, zoom: f32) -> f32 {
        let next = zoom.clamp(self.min_zoom, self.max_zoom);
        let prev = self.zoom.get();
        if next == prev {
            return prev;
        }

        self.zoom.set(next);
        self.bump();
        next
    }

    /// Zoom mutation in terms of the previous value.
    pub fn update_zoom(&self, update: impl FnOnce(f32) -> f32) -> f32 {
        self.set_zoom(update(self.zoom.get()))
    }

    pub fn set_pan(&self, pan: Point) {
        if self.pan.get() == pan {
            return;
        }
        self.pan.set(pan);
        self.bump();
    }

    /// Register a page's layout container. Idempotent; last write wins.
    pub fn set_page_ref(&self, page_number: u32, region: Rc<dyn PageRegion>) {
        self.pages.borrow_mut().insert(page_number, region);
    }

    /// Unmount path; visibility for the page is dropped with the handle.
    pub fn remove_page_ref(&self, page_number: u32) {
        self.pages.borrow_mut().remove(&page_number);
        self.visibility.borrow_mut().remove(&page_number);
    }

    pub fn page_ref(&self, page_number: u32) -> Option<Rc<dyn PageRegion>> {
        self.pages.borrow().get(&page_number).cloned()
    }

    pub fn set_viewport_ref(&self, region: Rc<dyn ScrollRegion>) {
        *self.scroll_region.borrow_mut() = Some(region);
    }

    pub fn visible_fraction(&self, page_number: u32) -> Option<f32> {
        self.visibility.borrow().get(&page_number).copied()
    }

    /// Record a visibility report for a page.
    ///
    /// An unchanged fraction short-circuits before any recomputation.
    /// Otherwise the current page becomes the smallest page number with a
    /// fraction above zero; when nothing is visible the previous current
    /// page is retained, so a fast scroll through blank space never yields
    /// an arbitrary value.
    pub fn set_page_visible(&self, page_number: u32, fraction: f32) {
        let first_visible = {
            let mut visibility = self.visibility.borrow_mut();
            if visibility.get(&page_number) == Some(&fraction) {
                return;
            }

            visibility.insert(page_number, fraction);
            visibility
                .iter()
                .find(|(_, fraction)| **fraction > 0.0)
                .map(|(page, _)| *page)
        };

        self.bump();

        if let Some(page) = first_visible {
            self.current_page.set(page);
        }
    }

    /// Scroll so `page_number`'s container aligns with the viewport origin.
    ///
    /// Fails (returns `false`) when the page is not yet registered or the
    /// viewport is not yet mounted; the caller retries on a later event.
    pub fn go_to_page(&self, page_number: u32, behavior: ScrollBehavior) -> bool {
        let page = self.page_ref(page_number);
        let viewport = self.scroll_region.borrow().clone();

        let (Some(page), Some(viewport)) = (page, viewport) else {
            tracing::debug!(page_number, "go_to_page before page or viewport mounted");
            return false;
        };

        let viewport_rect = viewport.bounding_rect();
        let page_rect = page.bounding_rect();
        let scroll = viewport.scroll_offset();

        viewport.scroll_to(
            Point::new(
                (scroll.x + page_rect.x - viewport_rect.x).ceil(),
                (scroll.y + page_rect.y - viewport_rect.y).ceil(),
            ),
            behavior,
        );

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use std::cell::RefCell as StdRefCell;

    struct FixedRegion {
        rect: Rect,
    }

    impl PageRegion for FixedRegion {
        fn bounding_rect(&self) -> Rect {
            self.rect
        }
    }

    #[derive(Default)]
    struct RecordingViewport {
        rect: Cell<Rect>,
        offset: Cell<Point>,
        commands: StdRefCell<Vec<(Point, ScrollBehavior)>>,
    }

    impl ScrollRegion for RecordingViewport {
        fn bounding_rect(&self) -> Rect {
            self.rect.get()
        }

        fn scroll_offset(&self) -> Point {
            self.offset.get()
        }

        fn set_scroll_offset(&self, offset: Point) {
            self.offset.set(offset);
        }

        fn scroll_to(&self, offset: Point, behavior: ScrollBehavior) {
            self.offset.set(offset);
            self.commands.borrow_mut().push((offset, behavior));
        }
    }

    fn page_at(y: f32) -> Rc<dyn PageRegion> {
        Rc::new(FixedRegion {
            rect: Rect::new(0.0, y, 612.0, 792.0),
        })
    }

    #[test]
    fn zoom_is_clamped_for_any_input() {
        let engine = ViewportEngine::new(ViewportOptions::default());

        assert_eq!(engine.set_zoom(100.0), 5.0);
        assert_eq!(engine.set_zoom(-3.0), 0.5);
        assert_eq!(engine.update_zoom(|z| z * 4.0), 2.0);
        assert_eq!(engine.update_zoom(|z| z / 100.0), 0.5);
    }

    #[test]
    fn clamped_noop_zoom_keeps_revision() {
        let engine = ViewportEngine::new(ViewportOptions::default());
        engine.set_zoom(5.0);

        let revision = engine.revision();
        engine.set_zoom(7.0); // clamps back to 5.0
        engine.set_zoom(5.0);
        assert_eq!(engine.revision(), revision);
    }

    #[test]
    fn repeated_visibility_report_is_a_noop() {
        let engine = ViewportEngine::new(ViewportOptions::default());

        engine.set_page_visible(2, 0.6);
        let revision = engine.revision();

        engine.set_page_visible(2, 0.6);
        assert_eq!(engine.revision(), revision);

        engine.set_page_visible(2, 0.7);
        assert_eq!(engine.revision(), revision + 1);
    }

    #[test]
    fn current_page_is_smallest_visible() {
        let engine = ViewportEngine::new(ViewportOptions::default());

        engine.set_page_visible(3, 0.1);
        engine.set_page_visible(1, 0.0);
        engine.set_page_visible(2, 0.6);

        assert_eq!(engine.current_page(), 2);
    }

    #[test]
    fn current_page_is_sticky_when_nothing_visible() {
        let engine = ViewportEngine::new(ViewportOptions::default());

        engine.set_page_visible(1, 0.0);
        engine.set_page_visible(2, 0.8);
        engine.set_page_visible(3, 0.0);
        assert_eq!(engine.current_page(), 2);

        engine.set_page_visible(2, 0.0);
        assert_eq!(engine.current_page(), 2);
    }

    #[test]
    fn visibility_arrival_order_does_not_matter() {
        let engine = ViewportEngine::new(ViewportOptions::default());

        engine.set_page_visible(9, 0.2);
        assert_eq!(engine.current_page(), 9);

        engine.set_page_visible(4, 0.9);
        assert_eq!(engine.current_page(), 4);

        engine.set_page_visible(1, 0.05);
        assert_eq!(engine.current_page(), 1);
    }

    #[test]
    fn go_to_page_fails_without_registration() {
        let engine = ViewportEngine::new(ViewportOptions::default());
        let viewport = Rc::new(RecordingViewport::default());
        engine.set_viewport_ref(viewport.clone());

        assert!(!engine.go_to_page(3, ScrollBehavior::Smooth));
        assert!(viewport.commands.borrow().is_empty());
    }

    #[test]
    fn go_to_page_fails_without_viewport() {
        let engine = ViewportEngine::new(ViewportOptions::default());
        engine.set_page_ref(1, page_at(0.0));

        assert!(!engine.go_to_page(1, ScrollBehavior::Smooth));
    }

    #[test]
    fn go_to_page_issues_ceiled_relative_scroll() {
        let engine = ViewportEngine::new(ViewportOptions::default());

        let viewport = Rc::new(RecordingViewport::default());
        viewport.rect.set(Rect::new(0.0, 50.0, 800.0, 600.0));
        viewport.offset.set(Point::new(0.0, 100.0));
        engine.set_viewport_ref(viewport.clone());

        // Page sits 820.5 layout px below the viewport origin.
        engine.set_page_ref(2, page_at(870.5));

        assert!(engine.go_to_page(2, ScrollBehavior::Instant));

        let commands = viewport.commands.borrow();
        assert_eq!(commands.len(), 1);
        let (offset, behavior) = commands[0];
        assert_eq!(offset.y, (100.0f32 + 870.5 - 50.0).ceil());
        assert_eq!(offset.x, 0.0);
        assert_eq!(behavior, ScrollBehavior::Instant);
    }

    #[test]
    fn page_registration_is_idempotent() {
        let engine = ViewportEngine::new(ViewportOptions::default());

        engine.set_page_ref(1, page_at(0.0));
        engine.set_page_ref(1, page_at(10.0));

        let region = engine.page_ref(1).expect("page registered");
        assert_eq!(region.bounding_rect().y, 10.0);
    }

    #[test]
    fn remove_page_ref_drops_visibility_entry() {
        let engine = ViewportEngine::new(ViewportOptions::default());

        engine.set_page_ref(1, page_at(0.0));
        engine.set_page_visible(1, 0.4);
        engine.remove_page_ref(1);

        assert!(engine.page_ref(1).is_none());
        assert_eq!(engine.visible_fraction(1), None);
    }
}
