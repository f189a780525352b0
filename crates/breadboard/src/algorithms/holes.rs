//! Breadboard hole classification.
//!
//! Every contour of the cleaned mask is measured and then run through an
//! ordered list of named predicates. The first failing predicate rejects the
//! contour; survivors keep their traversal order. Adjacent near-duplicate
//! holes are not merged.

use image::GrayImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};
use tracing::{debug, trace};
use crate::{
    algorithms::extraction::{ImageprocContourExtractor, MeasuredContour, TracedContour},
    config::HoleParams,
    error::Result,
    traits::ContourExtractor,
    types::{Boundary, Hole},
};

/// Hole acceptance tests, declared in evaluation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HolePredicate {
    Area,
    AspectRatio,
    InsideBoundary,
    Solidity,
}

impl HolePredicate {
    pub fn accepts(&self, candidate: &MeasuredContour, params: &HoleParams, boundary: &Boundary) -> bool {
        let descriptors = &candidate.descriptors;
        match self {
            Self::Area => (params.min_area..=params.max_area).contains(&descriptors.area),
            Self::AspectRatio => {
                (params.min_aspect_ratio..=params.max_aspect_ratio).contains(&descriptors.aspect_ratio)
            }
            Self::InsideBoundary => boundary.contains(candidate.centroid[0], candidate.centroid[1]),
            Self::Solidity => descriptors.solidity >= params.min_solidity,
        }
    }
}

/// Ordered predicate chain over measured contours.
#[derive(Debug, Clone)]
pub struct HoleFilter {
    pub params: HoleParams,
    pub boundary: Boundary,
}

impl HoleFilter {
    pub fn new(params: HoleParams, boundary: Boundary) -> Self {
        Self { params, boundary }
    }

    /// First predicate the candidate fails, or `None` if it is a hole.
    pub fn first_failure(&self, candidate: &MeasuredContour) -> Option<HolePredicate> {
        HolePredicate::iter().find(|predicate| !predicate.accepts(candidate, &self.params, &self.boundary))
    }

    pub fn accepts(&self, candidate: &MeasuredContour) -> bool {
        self.first_failure(candidate).is_none()
    }
}

/// Extracts holes from a cleaned foreground mask
pub struct HoleExtractor {
    pub params: HoleParams,
    contour_extractor: Box<dyn ContourExtractor>,
}

impl HoleExtractor {
    pub fn new(params: HoleParams) -> Self {
        Self::with_contour_extractor(params, ImageprocContourExtractor::tree())
    }

    pub fn with_contour_extractor<C>(params: HoleParams, contour_extractor: C) -> Self
    where
        C: ContourExtractor + 'static,
    {
        Self::from_boxed(params, Box::new(contour_extractor))
    }

    pub fn from_boxed(params: HoleParams, contour_extractor: Box<dyn ContourExtractor>) -> Self {
        Self { params, contour_extractor }
    }

    pub fn extract(&self, mask: &GrayImage, boundary: &Boundary) -> Result<Vec<Hole>> {
        let contours = self.contours(mask)?;
        Ok(self.classify(&contours, boundary))
    }

    /// Every contour of the mask, outer and inner borders alike.
    pub fn contours(&self, mask: &GrayImage) -> Result<Vec<TracedContour>> {
        self.contour_extractor.extract_contours(mask)
    }

    /// Holes among already traced contours, in traversal order.
    pub fn classify(&self, contours: &[TracedContour], boundary: &Boundary) -> Vec<Hole> {
        let filter = HoleFilter::new(self.params, *boundary);
        debug!(contours = contours.len(), "filtering hole candidates");

        let mut holes = Vec::new();
        for (index, contour) in contours.iter().enumerate() {
            let candidate = match MeasuredContour::measure(contour) {
                Ok(candidate) => candidate,
                Err(reason) => {
                    trace!(index, %reason, "skipping degenerate contour");
                    continue;
                }
            };

            if let Some(predicate) = filter.first_failure(&candidate) {
                trace!(index, %predicate, "contour rejected");
                continue;
            }

            holes.push(Hole {
                bbox: candidate.bbox,
                centroid: candidate.centroid,
                descriptors: candidate.descriptors,
            });
        }

        holes
    }
}

impl Default for HoleExtractor {
    fn default() -> Self {
        Self::new(HoleParams::default())
    }
}
