use geo::{Area, Centroid, ConvexHull};
use geo_types::{Coord, LineString, Polygon};
use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use crate::{
    error::Result,
    traits::ContourExtractor,
    types::{BoundingBox, ShapeDescriptors},
};

/// One border of a connected foreground region, in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedContour {
    pub points: Vec<[i32; 2]>,
    pub border: Border,
    /// Index of the enclosing contour within the same extraction.
    pub parent: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Border {
    Outer,
    Hole,
}

impl TracedContour {
    /// Outermost borders only: not nested in any other region.
    pub fn is_external(&self) -> bool {
        self.border == Border::Outer && self.parent.is_none()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.points)
    }

    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|&[x, y]| Coord { x: x as f64, y: y as f64 })
            .collect();
        Polygon::new(LineString::new(coords), vec![])
    }

    /// Polygon area through the contour's pixel centers.
    pub fn area(&self) -> f64 {
        self.to_geo_polygon().unsigned_area()
    }
}

/// Why a contour could not be measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    EmptyBoundingBox,
    ZeroMoment,
}

/// A contour together with everything the hole predicates look at.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredContour {
    pub bbox: BoundingBox,
    pub centroid: [f64; 2],
    pub descriptors: ShapeDescriptors,
}

impl MeasuredContour {
    /// Bounding box, area, aspect ratio, moment centroid and solidity.
    ///
    /// Contours with an empty box or a zero zeroth moment are degenerate and
    /// reported as a [`SkipReason`].
    pub fn measure(contour: &TracedContour) -> std::result::Result<Self, SkipReason> {
        let bbox = match contour.bounding_box() {
            Some(bbox) if bbox.width > 0 && bbox.height > 0 => bbox,
            _ => return Err(SkipReason::EmptyBoundingBox),
        };

        let polygon = contour.to_geo_polygon();
        let moment = polygon.signed_area();
        if moment == 0.0 {
            return Err(SkipReason::ZeroMoment);
        }
        let area = moment.abs();

        let centroid = polygon
            .centroid()
            .map(|point| [point.x(), point.y()])
            .ok_or(SkipReason::ZeroMoment)?;

        let hull_area = polygon.convex_hull().unsigned_area();

        Ok(Self {
            bbox,
            centroid,
            descriptors: ShapeDescriptors {
                area,
                aspect_ratio: bbox.aspect_ratio(),
                solidity: solidity(area, hull_area),
            },
        })
    }
}

/// `area / hull_area`, or 0 when the hull has no area.
pub fn solidity(area: f64, hull_area: f64) -> f64 {
    if hull_area == 0.0 { 0.0 } else { area / hull_area }
}

/// Imageproc-based contour extractor
#[derive(Debug, Clone, Default)]
pub struct ImageprocContourExtractor {
    /// Keep only outermost borders.
    pub external_only: bool,
}

impl ImageprocContourExtractor {
    /// Full hierarchy: outer borders and hole borders.
    pub fn tree() -> Self {
        Self { external_only: false }
    }

    pub fn external() -> Self {
        Self { external_only: true }
    }
}

impl ContourExtractor for ImageprocContourExtractor {
    fn extract_contours(&self, mask: &GrayImage) -> Result<Vec<TracedContour>> {
        let contours = find_contours::<i32>(mask);

        let result = contours
            .into_iter()
            .map(|contour| TracedContour {
                points: contour.points.iter().map(|p| [p.x, p.y]).collect(),
                border: match contour.border_type {
                    BorderType::Outer => Border::Outer,
                    BorderType::Hole => Border::Hole,
                },
                parent: contour.parent,
            })
            .filter(|contour| !self.external_only || contour.is_external())
            .collect();

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn filled(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for &(x0, y0, w, h) in rects {
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    mask.put_pixel(x, y, Luma([255]));
                }
            }
        }
        mask
    }

    #[test]
    fn square_is_measured() {
        let mask = filled(40, 40, &[(10, 10, 16, 16)]);
        let contours = ImageprocContourExtractor::tree().extract_contours(&mask).unwrap();
        assert_eq!(contours.len(), 1);

        let measured = MeasuredContour::measure(&contours[0]).unwrap();
        assert_eq!(measured.bbox, BoundingBox { x: 10, y: 10, width: 16, height: 16 });
        assert_eq!(measured.descriptors.area, 225.0);
        assert_eq!(measured.descriptors.aspect_ratio, 1.0);
        assert!((measured.descriptors.solidity - 1.0).abs() < 1e-9);
        assert!((measured.centroid[0] - 17.5).abs() < 1e-9);
        assert!((measured.centroid[1] - 17.5).abs() < 1e-9);
    }

    #[test]
    fn ring_has_outer_and_hole_borders() {
        let mut mask = filled(40, 40, &[(5, 5, 30, 30)]);
        for y in 15..25 {
            for x in 15..25 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }

        let tree = ImageprocContourExtractor::tree().extract_contours(&mask).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.iter().any(|c| c.border == Border::Hole));

        let external = ImageprocContourExtractor::external().extract_contours(&mask).unwrap();
        assert_eq!(external.len(), 1);
        assert!(external[0].is_external());
    }

    #[test]
    fn single_pixel_is_degenerate() {
        let mask = filled(10, 10, &[(4, 4, 1, 1)]);
        let contours = ImageprocContourExtractor::tree().extract_contours(&mask).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(MeasuredContour::measure(&contours[0]), Err(SkipReason::ZeroMoment));
    }

    #[test]
    fn straight_line_is_degenerate() {
        let mask = filled(30, 10, &[(2, 4, 20, 1)]);
        let contours = ImageprocContourExtractor::tree().extract_contours(&mask).unwrap();
        assert_eq!(MeasuredContour::measure(&contours[0]), Err(SkipReason::ZeroMoment));
    }

    #[test]
    fn empty_contour_is_degenerate() {
        let contour = TracedContour { points: vec![], border: Border::Outer, parent: None };
        assert_eq!(MeasuredContour::measure(&contour), Err(SkipReason::EmptyBoundingBox));
    }

    #[test]
    fn zero_hull_area_gives_zero_solidity() {
        assert_eq!(solidity(0.0, 0.0), 0.0);
        assert_eq!(solidity(5.0, 0.0), 0.0);
        assert_eq!(solidity(5.0, 10.0), 0.5);
    }
}
