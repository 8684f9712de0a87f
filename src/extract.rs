use crate::error::Result;
use crate::frame::{Frame, Rect, Size};
use crate::resize::resize_area;

/// Crops the raw capture to the active display area and scales it to the
/// working resolution.
#[derive(Debug, Clone)]
pub struct RegionExtractor {
    crop: Rect,
    target: Size,
}

impl RegionExtractor {
    pub fn new(crop: Rect, target: Size) -> Self {
        Self { crop, target }
    }

    /// Fails with `FrameTooSmall` if the crop rectangle does not fit in `raw`.
    pub fn extract(&self, raw: &Frame) -> Result<Frame> {
        let cropped = raw.crop(&self.crop)?;
        resize_area(&cropped, self.target)
    }
}
