//! Raster-scale decisions.

/// Raster scale used for pages that are scrolled out of view.
///
/// Fixed low resolution regardless of zoom: cheap enough to avoid churn
/// while keeping a placeholder bitmap ready for fast re-entry. Tunable.
pub const HIDDEN_RASTER_SCALE: f32 = 0.5;

/// Raster scale thumbnails render at, once.
pub const THUMBNAIL_RASTER_SCALE: f32 = 0.25;

/// Target raster scale for a page canvas.
///
/// Derived on every dependency change, never stored: full resolution while
/// the page is visible, [`HIDDEN_RASTER_SCALE`] otherwise.
pub fn target_raster_scale(visible: bool, zoom: f32, device_pixel_ratio: f32) -> f32 {
    if visible {
        device_pixel_ratio * zoom
    } else {
        HIDDEN_RASTER_SCALE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_pages_render_at_density_times_zoom() {
        assert_eq!(target_raster_scale(true, 1.5, 2.0), 3.0);
        assert_eq!(target_raster_scale(true, 1.0, 1.0), 1.0);
    }

    #[test]
    fn hidden_pages_render_at_the_fixed_fallback() {
        assert_eq!(target_raster_scale(false, 4.0, 2.0), HIDDEN_RASTER_SCALE);
        assert_eq!(target_raster_scale(false, 0.5, 1.0), HIDDEN_RASTER_SCALE);
    }
}
