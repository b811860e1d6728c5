//! Zoom-fit helpers and prefetch ordering.

/// Bounds applied to computed fit zooms.
const MIN_FIT_ZOOM: f32 = 0.1;
const MAX_FIT_ZOOM: f32 = 16.0;

/// Zoom at which a page exactly fills the viewport width.
pub fn fit_width_zoom(viewport_width: f32, page_width: f32, dpr: f32) -> f32 {
    if viewport_width <= 0.0 || page_width <= 0.0 || dpr <= 0.0 {
        return 1.0;
    }

    (viewport_width / (page_width * dpr)).clamp(MIN_FIT_ZOOM, MAX_FIT_ZOOM)
}

/// Zoom at which a whole page fits inside the viewport.
pub fn fit_page_zoom(
    viewport_width: f32,
    viewport_height: f32,
    page_width: f32,
    page_height: f32,
    dpr: f32,
) -> f32 {
    if viewport_width <= 0.0
        || viewport_height <= 0.0
        || page_width <= 0.0
        || page_height <= 0.0
        || dpr <= 0.0
    {
        return 1.0;
    }

    let width = viewport_width / (page_width * dpr);
    let height = viewport_height / (page_height * dpr);

    width.min(height).clamp(MIN_FIT_ZOOM, MAX_FIT_ZOOM)
}

/// Pages worth warming up around the current one, nearest first, 1-based,
/// alternating below/above.
pub fn prefetch_page_numbers(current_page: u32, page_count: u32, radius: u32) -> Vec<u32> {
    if page_count == 0 || current_page == 0 {
        return Vec::new();
    }

    let mut pages = Vec::new();

    for offset in 1..=radius {
        if current_page > offset {
            pages.push(current_page - offset);
        }

        let upper = current_page.saturating_add(offset);
        if upper <= page_count {
            pages.push(upper);
        }
    }

    pages
}
