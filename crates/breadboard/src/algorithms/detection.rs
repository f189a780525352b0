use std::collections::BTreeMap;

use image::{GrayImage, RgbImage};
use imageproc::edges::canny;
use tracing::debug;
use crate::{
    algorithms::{
        color::{HsvRange, in_range, to_hsv},
        extraction::ImageprocContourExtractor,
    },
    config::DetectionParams,
    error::Result,
    traits::ContourExtractor,
    types::{BoundingBox, ComponentDetection, WireDetection},
};

/// Edge-based component detection and per-color wire detection
pub struct WireDetector {
    pub params: DetectionParams,
    pub wire_colors: BTreeMap<String, HsvRange>,
    contour_extractor: ImageprocContourExtractor,
}

impl WireDetector {
    pub fn new(params: DetectionParams, wire_colors: BTreeMap<String, HsvRange>) -> Self {
        Self {
            params,
            wire_colors,
            contour_extractor: ImageprocContourExtractor::external(),
        }
    }

    /// Bounding boxes of external contours whose area exceeds `min_area`.
    fn regions(&self, mask: &GrayImage, min_area: f64) -> Result<Vec<BoundingBox>> {
        let boxes = self
            .contour_extractor
            .extract_contours(mask)?
            .iter()
            .filter(|contour| contour.area() > min_area)
            .filter_map(|contour| contour.bounding_box())
            .collect();
        Ok(boxes)
    }

    /// Unclassified regions of the blurred grayscale image's edge map.
    pub fn detect_components(&self, blurred: &GrayImage) -> Result<Vec<ComponentDetection>> {
        let edges = canny(blurred, self.params.canny_low, self.params.canny_high);
        let components = self
            .regions(&edges, self.params.component_min_area)?
            .into_iter()
            .map(|bbox| ComponentDetection { centroid: bbox.center(), bbox })
            .collect();
        Ok(components)
    }

    /// One detection per sufficiently large region of each configured color.
    /// Overlapping color ranges produce overlapping detections.
    pub fn detect_wires(&self, image: &RgbImage) -> Result<Vec<WireDetection>> {
        let hsv = to_hsv(image);
        let mut wires = Vec::new();

        for (color, range) in &self.wire_colors {
            let mask = in_range(&hsv, range);
            let regions = self.regions(&mask, self.params.wire_min_area)?;
            debug!(%color, count = regions.len(), "wire regions");

            wires.extend(regions.into_iter().map(|bbox| WireDetection {
                centroid: bbox.center(),
                bbox,
                color: color.clone(),
            }));
        }

        Ok(wires)
    }

    pub fn detect(&self, image: &RgbImage, blurred: &GrayImage) -> Result<(Vec<ComponentDetection>, Vec<WireDetection>)> {
        Ok((self.detect_components(blurred)?, self.detect_wires(image)?))
    }
}
