pub mod preprocessing;
pub mod color;
pub mod extraction;
pub mod boundary;
pub mod holes;
pub mod grid;
pub mod detection;

pub use preprocessing::{AdaptiveThresholdBinarizer, GaussianPreprocessor, MorphologyCleaner};
pub use color::HsvRange;
pub use extraction::{ImageprocContourExtractor, MeasuredContour, SkipReason, TracedContour};
pub use boundary::{BoundaryLocator, RailCandidate, RailKind};
pub use holes::{HoleExtractor, HoleFilter, HolePredicate};
pub use grid::GridMapper;
pub use detection::WireDetector;
