//! Per-element visibility tracking against the scroll region.
//!
//! A thin wrapper over rect intersection whose one design-worthy property is
//! subscription hygiene: exactly one live observation per element, torn down
//! before a replacement is registered and on removal, so remounts never leak
//! observers.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::host::{PageRegion, ScrollRegion};

struct Watched {
    region: Rc<dyn PageRegion>,
    last_fraction: Option<f32>,
}

#[derive(Default)]
pub struct VisibilityTracker {
    container: RefCell<Option<Rc<dyn ScrollRegion>>>,
    watched: RefCell<BTreeMap<u32, Watched>>,
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The scroll region visibility is measured against. May arrive after
    /// elements are already observed; sweeps before that report nothing.
    pub fn set_container(&self, container: Rc<dyn ScrollRegion>) {
        *self.container.borrow_mut() = Some(container);
    }

    /// Observe an element under `key`, replacing any previous observation
    /// for that key.
    pub fn observe(&self, key: u32, region: Rc<dyn PageRegion>) {
        self.watched.borrow_mut().insert(
            key,
            Watched {
                region,
                last_fraction: None,
            },
        );
    }

    /// Tear down the observation for `key` entirely.
    pub fn unobserve(&self, key: u32) {
        self.watched.borrow_mut().remove(&key);
    }

    pub fn is_observing(&self, key: u32) -> bool {
        self.watched.borrow().contains_key(&key)
    }

    /// Recompute all fractions and return the entries that changed since the
    /// previous sweep. Called from scroll/resize/zoom event handlers.
    pub fn sweep(&self) -> Vec<(u32, f32)> {
        let container = self.container.borrow();
        let Some(container) = container.as_ref() else {
            return Vec::new();
        };
        let container_rect = container.bounding_rect();

        let mut changed = Vec::new();
        for (key, watched) in self.watched.borrow_mut().iter_mut() {
            let fraction = watched
                .region
                .bounding_rect()
                .fraction_inside(&container_rect);

            if watched.last_fraction != Some(fraction) {
                watched.last_fraction = Some(fraction);
                changed.push((*key, fraction));
            }
        }

        changed
    }
}
