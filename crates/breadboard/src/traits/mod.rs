use image::{GrayImage, RgbImage};
use crate::{algorithms::extraction::TracedContour, error::Result};

/// Trait for turning a color photograph into a smoothed intensity image
pub trait ImagePreprocessor: Send + Sync {
    fn preprocess(&self, image: &RgbImage) -> Result<GrayImage>;
}

/// Trait for thresholding algorithms producing a foreground mask
pub trait Binarizer: Send + Sync {
    fn binarize(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Trait for morphological mask cleanup
pub trait MaskCleaner: Send + Sync {
    /// Remove isolated foreground specks
    fn open(&self, mask: &GrayImage) -> GrayImage;

    /// Fill small gaps inside retained shapes
    fn close(&self, mask: &GrayImage) -> GrayImage;

    fn clean(&self, mask: &GrayImage) -> GrayImage {
        self.close(&self.open(mask))
    }
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract contours from a binary image in traversal order
    fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<TracedContour>>;
}
