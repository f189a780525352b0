//! Power rail localization.
//!
//! Rails run vertically along the long edges of the board: a blue stripe on
//! the left, a red one on the right. Left and right bounds come from the rail
//! stripes; top and bottom are fixed fractions of the image height.

use image::{GrayImage, RgbImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, info, warn};
use crate::{
    algorithms::{
        color::{count_nonzero, in_range, to_hsv, union},
        extraction::ImageprocContourExtractor,
        preprocessing::{MorphologyCleaner, ensure_not_empty},
    },
    config::RailParams,
    error::Result,
    traits::{ContourExtractor, MaskCleaner},
    types::{Boundary, BoundingBox},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RailKind {
    Blue,
    Red,
}

/// A tall rail-colored region and the color that dominates it.
#[derive(Debug, Clone, PartialEq)]
pub struct RailCandidate {
    pub bbox: BoundingBox,
    pub blue_pixels: usize,
    pub red_pixels: usize,
}

impl RailCandidate {
    /// `None` when blue and red counts tie.
    pub fn kind(&self) -> Option<RailKind> {
        use std::cmp::Ordering;
        match self.blue_pixels.cmp(&self.red_pixels) {
            Ordering::Greater => Some(RailKind::Blue),
            Ordering::Less => Some(RailKind::Red),
            Ordering::Equal => None,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.bbox.x as f64 + self.bbox.width as f64 / 2.0
    }
}

/// Blue, red and combined rail masks of one image.
struct RailMasks {
    blue: GrayImage,
    red: GrayImage,
    combined: GrayImage,
}

/// Derives the working rectangle from the rail stripes
pub struct BoundaryLocator {
    pub params: RailParams,
    cleaner: MorphologyCleaner,
    contour_extractor: ImageprocContourExtractor,
}

impl BoundaryLocator {
    pub fn new(params: RailParams) -> Self {
        Self {
            cleaner: MorphologyCleaner::new(&params.morphology()),
            contour_extractor: ImageprocContourExtractor::external(),
            params,
        }
    }

    fn masks(&self, image: &RgbImage) -> RailMasks {
        let hsv = to_hsv(image);
        let blue = in_range(&hsv, &self.params.blue);
        let red = union(
            &in_range(&hsv, &self.params.red_low),
            &in_range(&hsv, &self.params.red_high),
        );
        let combined = union(&blue, &red);
        RailMasks { blue, red, combined }
    }

    /// Tall regions of the cleaned rail mask with their blue/red pixel counts.
    pub fn rail_candidates(&self, image: &RgbImage) -> Result<Vec<RailCandidate>> {
        ensure_not_empty(image)?;
        let masks = self.masks(image);
        let cleaned = self.cleaner.clean(&masks.combined);
        let min_height = image.height() as f64 * self.params.min_rail_height_fraction;

        let candidates = self
            .contour_extractor
            .extract_contours(&cleaned)?
            .iter()
            .filter_map(|contour| contour.bounding_box())
            .filter(|bbox| bbox.height as f64 > min_height)
            .map(|bbox| RailCandidate {
                blue_pixels: count_nonzero(&masks.blue, bbox.x, bbox.y, bbox.width, bbox.height),
                red_pixels: count_nonzero(&masks.red, bbox.x, bbox.y, bbox.width, bbox.height),
                bbox,
            })
            .collect();

        Ok(candidates)
    }

    pub fn locate(&self, image: &RgbImage) -> Result<Boundary> {
        let candidates = self.rail_candidates(image)?;
        let boundary = self.boundary_from_candidates(image.width(), image.height(), &candidates);
        info!(
            "Working area: X=[{:.0}, {:.0}], Y=[{:.0}, {:.0}]",
            boundary.left, boundary.right, boundary.top, boundary.bottom
        );
        Ok(boundary)
    }

    /// Combine rail candidates into a boundary, falling back to the default
    /// fractions for any side without a candidate.
    pub fn boundary_from_candidates(&self, width: u32, height: u32, candidates: &[RailCandidate]) -> Boundary {
        let params = &self.params;
        let (w, h) = (width as f64, height as f64);
        let default_left = w * params.default_left_fraction;
        let default_right = w * params.default_right_fraction;

        let mut left_edges = Vec::new();
        let mut right_edges = Vec::new();
        for candidate in candidates {
            let center_x = candidate.center_x();
            match candidate.kind() {
                Some(RailKind::Blue) if center_x < w * params.left_zone_fraction => {
                    left_edges.push(candidate.bbox.right() as f64);
                }
                Some(RailKind::Red) if center_x > w * params.right_zone_fraction => {
                    right_edges.push(candidate.bbox.x as f64);
                }
                kind => debug!(?kind, center_x, "rail candidate ignored"),
            }
        }

        let mut left = match left_edges.iter().copied().reduce(f64::max) {
            Some(edge) => edge + params.margin,
            None => {
                warn!("No blue rail found, using default left boundary");
                default_left
            }
        };
        let mut right = match right_edges.iter().copied().reduce(f64::min) {
            Some(edge) => edge - params.margin,
            None => {
                warn!("No red rail found, using default right boundary");
                default_right
            }
        };

        if left >= right {
            warn!(left, right, "Rail bounds cross, using default left and right boundaries");
            left = default_left;
            right = default_right;
        }

        Boundary {
            left,
            right,
            top: h * params.top_fraction,
            bottom: h * params.bottom_fraction,
        }
    }
}

impl Default for BoundaryLocator {
    fn default() -> Self {
        Self::new(RailParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const BOARD: Rgb<u8> = Rgb([220, 220, 210]);

    fn paint(image: &mut RgbImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>, color: Rgb<u8>) {
        for y in ys {
            for x in xs.clone() {
                image.put_pixel(x, y, color);
            }
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() <= 1.0, "expected {expected}, got {actual}");
    }

    #[test]
    fn no_rails_uses_defaults() {
        let image = RgbImage::from_pixel(200, 100, BOARD);
        let boundary = BoundaryLocator::default().locate(&image).unwrap();
        assert_close(boundary.left, 20.0);
        assert_close(boundary.right, 180.0);
        assert_close(boundary.top, 3.5);
        assert_close(boundary.bottom, 95.0);
    }

    #[test]
    fn rails_define_left_and_right() {
        let mut image = RgbImage::from_pixel(200, 100, BOARD);
        paint(&mut image, 10..20, 0..100, BLUE);
        paint(&mut image, 180..190, 0..100, RED);

        let boundary = BoundaryLocator::default().locate(&image).unwrap();
        assert_close(boundary.left, 25.0);
        assert_close(boundary.right, 175.0);
        assert!(boundary.left < boundary.right);
        assert!(boundary.top < boundary.bottom);
    }

    #[test]
    fn short_stripes_are_ignored() {
        let mut image = RgbImage::from_pixel(200, 100, BOARD);
        paint(&mut image, 10..20, 30..70, BLUE);
        paint(&mut image, 180..190, 30..70, RED);

        let boundary = BoundaryLocator::default().locate(&image).unwrap();
        assert_close(boundary.left, 20.0);
        assert_close(boundary.right, 180.0);
    }

    #[test]
    fn rails_on_the_wrong_side_are_ignored() {
        let mut image = RgbImage::from_pixel(200, 100, BOARD);
        paint(&mut image, 180..190, 0..100, BLUE);
        paint(&mut image, 10..20, 0..100, RED);

        let boundary = BoundaryLocator::default().locate(&image).unwrap();
        assert_close(boundary.left, 20.0);
        assert_close(boundary.right, 180.0);
    }

    #[test]
    fn tied_colors_update_nothing() {
        let mut image = RgbImage::from_pixel(200, 100, BOARD);
        for y in 0..100 {
            let color = if y % 2 == 0 { BLUE } else { RED };
            paint(&mut image, 10..20, y..y + 1, color);
        }

        let locator = BoundaryLocator::default();
        let candidates = locator.rail_candidates(&image).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind(), None);

        let boundary = locator.locate(&image).unwrap();
        assert_close(boundary.left, 20.0);
    }

    #[test]
    fn crossing_bounds_fall_back_to_defaults() {
        let locator = BoundaryLocator::default();
        let candidates = [
            RailCandidate { bbox: BoundingBox { x: 0, y: 0, width: 150, height: 100 }, blue_pixels: 10, red_pixels: 0 },
            RailCandidate { bbox: BoundingBox { x: 60, y: 0, width: 130, height: 100 }, blue_pixels: 0, red_pixels: 10 },
        ];
        let boundary = locator.boundary_from_candidates(200, 100, &candidates);
        assert_close(boundary.left, 20.0);
        assert_close(boundary.right, 180.0);
    }

    #[test]
    fn tiny_image_keeps_ordering() {
        let image = RgbImage::from_pixel(1, 1, BOARD);
        let boundary = BoundaryLocator::default().locate(&image).unwrap();
        assert!(boundary.left < boundary.right);
        assert!(boundary.top < boundary.bottom);
    }

    #[test]
    fn empty_image_is_rejected() {
        assert!(BoundaryLocator::default().locate(&RgbImage::new(0, 0)).is_err());
    }
}
