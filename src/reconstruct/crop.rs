//! Cropping of padded regions out of page images.

use image::{DynamicImage, GenericImageView};

use crate::error::{Error, Result};
use crate::model::AggregatedBlock;

/// Crops block regions from a page image.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionCropper;

impl RegionCropper {
    /// Create a cropper.
    pub fn new() -> Self {
        Self
    }

    /// Crop the padded region of `block` from `page`.
    ///
    /// The region is first intersected with the page rectangle. A region
    /// with no area left returns [`Error::DegenerateRegion`].
    pub fn crop(&self, page: &DynamicImage, block: &AggregatedBlock) -> Result<DynamicImage> {
        let (width, height) = page.dimensions();
        let clamped = block.region.clamp_to(width, height);

        if clamped.is_degenerate() {
            return Err(Error::DegenerateRegion {
                block: block.block,
                width: clamped.width(),
                height: clamped.height(),
            });
        }

        Ok(page.crop_imm(
            clamped.left,
            clamped.top,
            clamped.width(),
            clamped.height(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;

    fn block_with_region(region: BBox) -> AggregatedBlock {
        AggregatedBlock {
            block: 7,
            text: "x".to_string(),
            mean_confidence: 10.0,
            bbox: region,
            region,
        }
    }

    #[test]
    fn test_crop_inside_page() {
        let page = DynamicImage::new_rgb8(100, 50);
        let crop = RegionCropper::new()
            .crop(&page, &block_with_region(BBox::new(10, 5, 30, 25)))
            .unwrap();
        assert_eq!(crop.dimensions(), (20, 20));
    }

    #[test]
    fn test_crop_clamped_to_page() {
        let page = DynamicImage::new_rgb8(100, 50);
        let crop = RegionCropper::new()
            .crop(&page, &block_with_region(BBox::new(90, 40, 130, 80)))
            .unwrap();
        assert_eq!(crop.dimensions(), (10, 10));
    }

    #[test]
    fn test_crop_outside_page_is_degenerate() {
        let page = DynamicImage::new_rgb8(100, 50);
        let err = RegionCropper::new()
            .crop(&page, &block_with_region(BBox::new(120, 10, 140, 20)))
            .unwrap_err();
        assert!(matches!(err, Error::DegenerateRegion { block: 7, width: 0, .. }));
    }
}
