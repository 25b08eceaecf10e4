//! Normalized detection to display-space conversion.
//!
//! The camera hands frames over rotated by 90 degrees, so the analyzed
//! image's logical width and height are swapped against its pixel extent.
//! Once scaled to the viewport height it is wider than the viewport and is
//! shown center-cropped, which the horizontal offset compensates for.

use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::detection::{DetectorOrigin, NormalizedDetection};
use crate::overlay::TrackingRect;

/// Height over width of the overlay box.
pub const OVERLAY_ASPECT: f32 = 9.0 / 16.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn bounds(&self) -> BBox<Ltrb> {
        BBox::ltrb(0.0, 0.0, self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct DetectionMapper {
    viewport: Viewport,
    origin: DetectorOrigin,
    // width over height of the image plane, from the last analyzed frame
    aspect: f32,
}

impl DetectionMapper {
    pub fn new(viewport: Viewport, origin: DetectorOrigin) -> Self {
        Self {
            viewport,
            origin,
            aspect: 0.0,
        }
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Records the analyzed frame's pixel extent `(width, height)`.
    pub fn measure(&mut self, extent: (u32, u32)) -> f32 {
        let (w, h) = extent;
        self.aspect = h as f32 / w as f32;

        if self.is_degenerate() {
            log::debug!("degenerate frame extent {}x{}", w, h);
        }

        self.aspect
    }

    /// An empty side in the last measured extent leaves nothing to map onto.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.aspect.is_finite() && self.aspect > 0.0)
    }

    #[inline]
    pub fn scaled_image_width(&self) -> f32 {
        self.aspect * self.viewport.height
    }

    #[inline]
    pub fn horizontal_offset(&self) -> f32 {
        (self.scaled_image_width() - self.viewport.width) / 2.0
    }

    pub fn map(&self, det: &NormalizedDetection) -> TrackingRect {
        let scaled_width = self.scaled_image_width();
        let offset = self.horizontal_offset();

        let width = det.w * scaled_width;
        let height = width * OVERLAY_ASPECT;
        let x = det.x * scaled_width - offset;

        let y = match self.origin {
            DetectorOrigin::BottomLeft => (1.0 - det.y) * self.viewport.height - height,
            DetectorOrigin::TopLeft => det.y * self.viewport.height,
        };

        BBox::ltwh(x, y, width, height)
    }

    #[inline]
    pub fn map_frame(&mut self, extent: (u32, u32), det: &NormalizedDetection) -> TrackingRect {
        self.measure(extent);
        self.map(det)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-2;

    fn phone() -> DetectionMapper {
        DetectionMapper::new(Viewport::new(390.0, 844.0), DetectorOrigin::BottomLeft)
    }

    #[test]
    fn portrait_phone_scenario() {
        let mut mapper = phone();
        let rect = mapper.map_frame((1920, 1080), &NormalizedDetection::new(0.4, 0.3, 0.2, 0.05));

        assert!((mapper.aspect() - 0.5625).abs() < 1e-6);
        assert!((mapper.scaled_image_width() - 474.75).abs() < EPS);
        assert!((mapper.horizontal_offset() - 42.375).abs() < EPS);
        assert!((rect.width() - 94.95).abs() < EPS, "{:?}", rect);
        assert!((rect.height() - 53.409).abs() < EPS, "{:?}", rect);
        assert!((rect.left() - 147.525).abs() < EPS, "{:?}", rect);
        assert!((rect.top() - 537.39).abs() < EPS, "{:?}", rect);
    }

    #[test]
    fn mapping_is_bit_identical() {
        let mut mapper = phone();
        mapper.measure((1920, 1080));

        for i in 0..=10 {
            let v = i as f32 / 10.0;
            let det = NormalizedDetection::new(v, 1.0 - v, v * 0.5, 0.0);
            let a: [f32; 4] = mapper.map(&det).into();
            let b: [f32; 4] = mapper.clone().map(&det).into();

            assert_eq!(a.map(f32::to_bits), b.map(f32::to_bits));
        }
    }

    #[test]
    fn height_follows_width() {
        let mut mapper = phone();

        for (extent, w) in [((1920, 1080), 0.2), ((640, 480), 0.9), ((1080, 1920), 0.01)] {
            let rect = mapper.map_frame(extent, &NormalizedDetection::new(0.1, 0.6, w, 0.7));
            assert_eq!(rect.height(), rect.width() * OVERLAY_ASPECT);
        }
    }

    #[test]
    fn detection_height_is_ignored() {
        let mut mapper = phone();
        mapper.measure((1920, 1080));

        let a = mapper.map(&NormalizedDetection::new(0.4, 0.3, 0.2, 0.0));
        let b = mapper.map(&NormalizedDetection::new(0.4, 0.3, 0.2, 0.9));
        assert_eq!(a, b);
    }

    #[test]
    fn top_left_origin_skips_flip() {
        let mut mapper = DetectionMapper::new(Viewport::new(390.0, 844.0), DetectorOrigin::TopLeft);
        let rect = mapper.map_frame((1920, 1080), &NormalizedDetection::new(0.4, 0.25, 0.2, 0.0));

        assert!((rect.top() - 211.0).abs() < EPS, "{:?}", rect);
        assert!((rect.left() - 147.525).abs() < EPS, "{:?}", rect);
    }

    #[test]
    fn out_of_range_is_off_screen_not_error() {
        let mut mapper = phone();
        let rect = mapper.map_frame((1920, 1080), &NormalizedDetection::new(1.5, -0.5, 0.1, 0.0));

        assert!(rect.is_finite());
        assert!(!rect.as_ltrb().intersects(&mapper.viewport().bounds()));
    }

    #[test]
    fn empty_extent_is_degenerate() {
        let mut mapper = phone();
        assert!(mapper.is_degenerate());

        for extent in [(0, 0), (1920, 0), (0, 1080)] {
            mapper.measure(extent);
            assert!(mapper.is_degenerate(), "{:?}", extent);
        }

        mapper.measure((1920, 1080));
        assert!(!mapper.is_degenerate());
    }
}
