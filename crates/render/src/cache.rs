//! LRU cache of completed page surfaces.
//!
//! Scrolling back to a page at a scale rendered recently reuses the bitmap
//! instead of re-rasterizing. Keys quantize scale to centi-units so float
//! jitter from gesture math cannot fragment the cache.

use pdf_reader_engine::Surface;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceKey {
    pub page_number: u32,
    pub scale_centi: u32,
}

impl SurfaceKey {
    pub fn new(page_number: u32, scale: f32) -> Self {
        Self {
            page_number,
            scale_centi: (scale * 100.0).round().max(0.0) as u32,
        }
    }
}

#[derive(Debug)]
pub struct SurfaceCache {
    capacity: usize,
    map: HashMap<SurfaceKey, Surface>,
    order: VecDeque<SurfaceKey>,
}

impl SurfaceCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, key: &SurfaceKey) -> bool {
        self.map.contains_key(key)
    }

    /// Look up a surface, refreshing its recency.
    pub fn get(&mut self, key: &SurfaceKey) -> Option<&Surface> {
        if self.map.contains_key(key) {
            self.touch(key);
        }
        self.map.get(key)
    }

    pub fn insert(&mut self, key: SurfaceKey, surface: Surface) {
        let existed = self.map.insert(key, surface).is_some();

        if existed {
            self.touch(&key);
            return;
        }

        self.order.push_back(key);

        while self.map.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
    }

    /// Drop every surface for one page (page content replaced).
    pub fn evict_page(&mut self, page_number: u32) {
        self.map.retain(|key, _| key.page_number != page_number);
        self.order.retain(|key| key.page_number != page_number);
    }

    fn touch(&mut self, key: &SurfaceKey) {
        if let Some(index) = self.order.iter().position(|existing| existing == key) {
            if let Some(found) = self.order.remove(index) {
                self.order.push_back(found);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> Surface {
        Surface::new(2, 2)
    }

    #[test]
    fn evicts_oldest_entry_at_capacity() {
        let mut cache = SurfaceCache::new(2);

        cache.insert(SurfaceKey::new(1, 0.5), surface());
        cache.insert(SurfaceKey::new(2, 0.5), surface());
        cache.insert(SurfaceKey::new(3, 0.5), surface());

        assert!(!cache.contains(&SurfaceKey::new(1, 0.5)));
        assert!(cache.contains(&SurfaceKey::new(2, 0.5)));
        assert!(cache.contains(&SurfaceKey::new(3, 0.5)));
    }

    #[test]
    fn get_refreshes_recency() {
        let mut cache = SurfaceCache::new(2);

        cache.insert(SurfaceKey::new(1, 1.0), surface());
        cache.insert(SurfaceKey::new(2, 1.0), surface());

        let _ = cache.get(&SurfaceKey::new(1, 1.0));
        cache.insert(SurfaceKey::new(3, 1.0), surface());

        assert!(cache.contains(&SurfaceKey::new(1, 1.0)));
        assert!(!cache.contains(&SurfaceKey::new(2, 1.0)));
    }

    #[test]
    fn scale_is_quantized_to_centi_units() {
        assert_eq!(SurfaceKey::new(1, 1.0), SurfaceKey::new(1, 1.0049));
        assert_ne!(SurfaceKey::new(1, 1.0), SurfaceKey::new(1, 1.01));
    }

    #[test]
    fn evict_page_clears_all_scales() {
        let mut cache = SurfaceCache::new(8);

        cache.insert(SurfaceKey::new(1, 0.5), surface());
        cache.insert(SurfaceKey::new(1, 2.0), surface());
        cache.insert(SurfaceKey::new(2, 0.5), surface());

        cache.evict_page(1);

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&SurfaceKey::new(2, 0.5)));
    }
}
