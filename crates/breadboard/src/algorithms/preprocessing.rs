use image::{GrayImage, Luma, RgbImage};
use imageproc::{
    distance_transform::Norm,
    filter::{box_filter, separable_filter_equal},
    morphology::{dilate, erode},
};
use crate::{
    config::{MorphologyParams, PreprocessParams, ThresholdParams},
    error::{BreadboardError, Result},
    traits::{Binarizer, ImagePreprocessor, MaskCleaner},
};

/// Grayscale conversion followed by a fixed-kernel Gaussian blur
#[derive(Debug, Clone)]
pub struct GaussianPreprocessor {
    kernel: Vec<f32>,
}

impl GaussianPreprocessor {
    pub fn new(params: &PreprocessParams) -> Self {
        Self {
            kernel: gaussian_kernel(params.blur_kernel_size, params.blur_sigma),
        }
    }

    /// Luma conversion only, without smoothing.
    pub fn grayscale(image: &RgbImage) -> Result<GrayImage> {
        ensure_not_empty(image)?;
        Ok(image::imageops::grayscale(image))
    }

    pub fn blur(&self, gray: &GrayImage) -> GrayImage {
        separable_filter_equal(gray, &self.kernel)
    }
}

impl Default for GaussianPreprocessor {
    fn default() -> Self {
        Self::new(&PreprocessParams::default())
    }
}

impl ImagePreprocessor for GaussianPreprocessor {
    fn preprocess(&self, image: &RgbImage) -> Result<GrayImage> {
        let gray = Self::grayscale(image)?;
        Ok(self.blur(&gray))
    }
}

pub(crate) fn ensure_not_empty(image: &RgbImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(BreadboardError::InvalidImage(format!(
            "image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

/// Normalized 1-D Gaussian of odd length `size`.
fn gaussian_kernel(size: u32, sigma: f64) -> Vec<f32> {
    let center = (size / 2) as f64;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| (w / total) as f32).collect()
}

/// Inverted adaptive mean threshold: a pixel is foreground when it is at
/// least `offset` darker than the mean of its square neighborhood.
#[derive(Debug, Clone)]
pub struct AdaptiveThresholdBinarizer {
    pub window_size: u32,
    pub offset: i32,
}

impl AdaptiveThresholdBinarizer {
    pub fn new(params: &ThresholdParams) -> Self {
        Self {
            window_size: params.window_size,
            offset: params.offset,
        }
    }
}

impl Default for AdaptiveThresholdBinarizer {
    fn default() -> Self {
        Self::new(&ThresholdParams::default())
    }
}

impl Binarizer for AdaptiveThresholdBinarizer {
    fn binarize(&self, image: &GrayImage) -> Result<GrayImage> {
        let radius = self.window_size / 2;
        let means = box_filter(image, radius, radius);

        Ok(GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let intensity = image.get_pixel(x, y)[0] as i32;
            let threshold = means.get_pixel(x, y)[0] as i32 - self.offset;
            if intensity <= threshold { Luma([255]) } else { Luma([0]) }
        }))
    }
}

/// Opening then closing with a square structuring element
#[derive(Debug, Clone)]
pub struct MorphologyCleaner {
    pub kernel_size: u32,
    pub open_iterations: u32,
    pub close_iterations: u32,
}

impl MorphologyCleaner {
    pub fn new(params: &MorphologyParams) -> Self {
        Self {
            kernel_size: params.kernel_size,
            open_iterations: params.open_iterations,
            close_iterations: params.close_iterations,
        }
    }

    /// Chebyshev radius of `iterations` successive passes; repeated square
    /// erosions compose into one larger square.
    fn radius(&self, iterations: u32) -> u8 {
        let radius = (self.kernel_size / 2).saturating_mul(iterations);
        radius.min(u8::MAX as u32) as u8
    }
}

impl Default for MorphologyCleaner {
    fn default() -> Self {
        Self::new(&MorphologyParams::default())
    }
}

impl MaskCleaner for MorphologyCleaner {
    fn open(&self, mask: &GrayImage) -> GrayImage {
        let radius = self.radius(self.open_iterations);
        if radius == 0 {
            return mask.clone();
        }
        dilate(&erode(mask, Norm::LInf, radius), Norm::LInf, radius)
    }

    fn close(&self, mask: &GrayImage) -> GrayImage {
        let radius = self.radius(self.close_iterations);
        if radius == 0 {
            return mask.clone();
        }
        erode(&dilate(mask, Norm::LInf, radius), Norm::LInf, radius)
    }
}
