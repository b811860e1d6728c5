//! Viewport transform controller.
//!
//! Translates zoom intent (pinch gestures, zoom controls) into concrete
//! scroll-container mutations. User scrolling is deliberately *not* mirrored
//! back into the engine; scroll offsets are read from the host on demand,
//! which keeps gesture handling free of feedback loops. The controller
//! decides whether work is needed against its own mutable transform cache,
//! never against the published engine state, and publishes to the engine
//! last on every application.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::engine::ViewportEngine;
use crate::geometry::Point;
use crate::host::{ContentRegion, GestureHost, ScrollRegion, SizedRegion};

/// The transform currently written to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub zoom: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

/// Snapshot taken once at pinch start and threaded through every update of
/// that gesture. Updates without a session cannot be expressed, so the
/// mis-sequencing the original guarded against at runtime is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    /// Pinch origin relative to the scaled content.
    pub content_anchor: Point,
    /// Pinch origin relative to the scroll container.
    pub container_anchor: Point,
    /// Zoom in effect when the gesture started.
    pub origin_zoom: f32,
    /// Pan in effect when the gesture started.
    pub origin_pan: Point,
}

struct Handles {
    container: Rc<dyn ScrollRegion>,
    wrapper: Rc<dyn SizedRegion>,
    content: Rc<dyn ContentRegion>,
}

pub struct TransformController {
    engine: Rc<ViewportEngine>,
    handles: RefCell<Option<Handles>>,
    gesture_host: RefCell<Option<Rc<dyn GestureHost>>>,
    cache: Cell<Transform>,
}

impl TransformController {
    pub fn new(engine: Rc<ViewportEngine>) -> Self {
        Self {
            engine,
            handles: RefCell::new(None),
            gesture_host: RefCell::new(None),
            cache: Cell::new(Transform::default()),
        }
    }

    /// Suppress the host's native pinch/zoom for the controller's lifetime.
    pub fn set_gesture_host(&self, host: Rc<dyn GestureHost>) {
        host.set_native_gestures_enabled(false);
        *self.gesture_host.borrow_mut() = Some(host);
    }

    /// Bind the scroll container, sizing wrapper, and scaled content.
    ///
    /// Registers the container as the engine's scroll region and forces one
    /// transform application so `zoom=1 / pan=0` is physically reflected in
    /// the host before any interaction.
    pub fn attach(
        &self,
        container: Rc<dyn ScrollRegion>,
        wrapper: Rc<dyn SizedRegion>,
        content: Rc<dyn ContentRegion>,
    ) {
        self.engine.set_viewport_ref(container.clone());
        *self.handles.borrow_mut() = Some(Handles {
            container,
            wrapper,
            content,
        });
        self.apply();
    }

    pub fn detach(&self) {
        *self.handles.borrow_mut() = None;
    }

    pub fn transform(&self) -> Transform {
        self.cache.get()
    }

    /// Write the cached transform to the host, then publish to the engine.
    ///
    /// Publishing happens last so the engine's change notification cannot
    /// retrigger a redundant transform pass. A missing handle makes this a
    /// silent no-op; the next dependency change retries.
    pub fn apply(&self) {
        let handles = self.handles.borrow();
        let Some(handles) = handles.as_ref() else {
            return;
        };

        let transform = self.cache.get();

        handles.content.set_scale(transform.zoom);

        let content_rect = handles.content.bounding_rect();
        handles
            .wrapper
            .set_size(content_rect.width, content_rect.height);

        handles
            .container
            .set_scroll_offset(Point::new(transform.translate_x, transform.translate_y));

        self.engine
            .set_pan(Point::new(transform.translate_x, transform.translate_y));
        self.engine.set_zoom(transform.zoom);
    }

    /// Capture a gesture session at pinch start. `None` when the controller
    /// is not attached yet.
    pub fn begin_pinch(&self, origin: Point) -> Option<GestureSession> {
        let handles = self.handles.borrow();
        let handles = handles.as_ref()?;

        let content_rect = handles.content.bounding_rect();
        let container_rect = handles.container.bounding_rect();
        let transform = self.cache.get();

        Some(GestureSession {
            content_anchor: origin - content_rect.origin(),
            container_anchor: origin - container_rect.origin(),
            origin_zoom: transform.zoom,
            origin_pan: Point::new(transform.translate_x, transform.translate_y),
        })
    }

    /// One pinch frame: `gesture_scale` is the accumulated scale movement
    /// since the session began. Keeps the content point under the session's
    /// anchor visually fixed.
    pub fn pinch_update(&self, session: &GestureSession, gesture_scale: f32) {
        let new_zoom = (gesture_scale * session.origin_zoom)
            .clamp(self.engine.min_zoom(), self.engine.max_zoom());
        let effective = new_zoom / session.origin_zoom;

        self.cache.set(Transform {
            zoom: new_zoom,
            translate_x: session.content_anchor.x * effective - session.container_anchor.x,
            translate_y: session.content_anchor.y * effective - session.container_anchor.y,
        });

        self.apply();
    }

    /// Reconcile a zoom change that originated outside a gesture (zoom
    /// controls, fit commands): rescale the current scroll offsets so the
    /// top-left content point stays put, then reapply.
    pub fn sync_engine_zoom(&self) {
        let zoom = self.engine.zoom();
        let cached = self.cache.get();
        if cached.zoom == zoom {
            return;
        }

        let scroll = {
            let handles = self.handles.borrow();
            let Some(handles) = handles.as_ref() else {
                return;
            };
            handles.container.scroll_offset()
        };

        let delta = zoom / cached.zoom;
        self.cache.set(Transform {
            zoom,
            translate_x: scroll.x * delta,
            translate_y: scroll.y * delta,
        });

        self.apply();
    }

    /// Scroll container bounds, when attached. Fit-zoom computations need
    /// them.
    pub fn container_rect(&self) -> Option<crate::geometry::Rect> {
        self.handles
            .borrow()
            .as_ref()
            .map(|handles| handles.container.bounding_rect())
    }

    /// Content grew or shrank (a page's intrinsic size became known):
    /// resize the wrapper to match, independent of any gesture.
    pub fn content_resized(&self) {
        let handles = self.handles.borrow();
        let Some(handles) = handles.as_ref() else {
            return;
        };

        let content_rect = handles.content.bounding_rect();
        handles
            .wrapper
            .set_size(content_rect.width, content_rect.height);
    }
}

impl Drop for TransformController {
    fn drop(&mut self) {
        if let Some(host) = self.gesture_host.borrow().as_ref() {
            host.set_native_gestures_enabled(true);
        }
    }
}
