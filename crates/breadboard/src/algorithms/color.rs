use image::{GrayImage, Luma, Rgb, RgbImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 8-bit HSV pixel: hue in `[0, 180]`, saturation and value in `[0, 255]`.
pub type Hsv = [u8; 3];

/// Inclusive HSV bounds, serialized as `[[h, s, v], [h, s, v]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HsvRange(pub Hsv, pub Hsv);

impl HsvRange {
    pub const fn new(lower: Hsv, upper: Hsv) -> Self {
        Self(lower, upper)
    }

    pub fn lower(&self) -> Hsv {
        self.0
    }

    pub fn upper(&self) -> Hsv {
        self.1
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        (0..3).all(|c| self.0[c] <= hsv[c] && hsv[c] <= self.1[c])
    }

    /// Bounds must be ordered per channel and hue must not exceed 180.
    pub fn validate(&self) -> Result<(), String> {
        if (0..3).any(|c| self.0[c] > self.1[c]) {
            return Err(format!("lower bound {:?} exceeds upper bound {:?}", self.0, self.1));
        }
        if self.1[0] > 180 {
            return Err(format!("hue {} is outside [0, 180]", self.1[0]));
        }
        Ok(())
    }
}

/// Convert one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv(Rgb([r, g, b]): Rgb<u8>) -> Hsv {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let chroma = max - min;

    let saturation = if max > 0.0 { (chroma * 255.0 / max).round() } else { 0.0 };

    let hue = if chroma == 0.0 {
        0.0
    } else {
        let degrees = if max == rf {
            60.0 * (gf - bf) / chroma
        } else if max == gf {
            120.0 + 60.0 * (bf - rf) / chroma
        } else {
            240.0 + 60.0 * (rf - gf) / chroma
        };
        let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };
        (degrees / 2.0).round()
    };

    [hue as u8, saturation as u8, max as u8]
}

/// Per-pixel HSV conversion of a whole image.
pub fn to_hsv(image: &RgbImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        Rgb(rgb_to_hsv(*image.get_pixel(x, y)))
    })
}

/// 255 where the HSV pixel lies inside `range`, 0 elsewhere.
pub fn in_range(hsv: &RgbImage, range: &HsvRange) -> GrayImage {
    GrayImage::from_fn(hsv.width(), hsv.height(), |x, y| {
        if range.contains(hsv.get_pixel(x, y).0) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Pixelwise maximum of two equally sized masks.
pub fn union(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        Luma([a.get_pixel(x, y)[0].max(b.get_pixel(x, y)[0])])
    })
}

/// Number of foreground pixels of `mask` inside the given rectangle.
pub fn count_nonzero(mask: &GrayImage, x: u32, y: u32, width: u32, height: u32) -> usize {
    let x_end = (x + width).min(mask.width());
    let y_end = (y + height).min(mask.height());
    (y..y_end)
        .flat_map(|row| (x..x_end).map(move |col| (col, row)))
        .filter(|&(col, row)| mask.get_pixel(col, row)[0] > 0)
        .count()
}
