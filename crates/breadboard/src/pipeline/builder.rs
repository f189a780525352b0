use std::path::PathBuf;

use crate::{
    algorithms::{
        AdaptiveThresholdBinarizer, BoundaryLocator, GaussianPreprocessor, GridMapper,
        HoleExtractor, ImageprocContourExtractor, MorphologyCleaner, WireDetector,
    },
    config::AnalyzerConfig,
    debug::DebugSink,
    pipeline::Pipeline,
    traits::{Binarizer, ContourExtractor, ImagePreprocessor, MaskCleaner},
};

/// Builder for creating processing pipelines with a fluent API
///
/// Stages left unset are derived from the configuration at `build` time.
pub struct PipelineBuilder {
    config: AnalyzerConfig,
    preprocessor: Option<Box<dyn ImagePreprocessor>>,
    binarizer: Option<Box<dyn Binarizer>>,
    cleaner: Option<Box<dyn MaskCleaner>>,
    hole_contour_extractor: Option<Box<dyn ContourExtractor>>,
    debug_dir: Option<PathBuf>,
}

impl PipelineBuilder {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            preprocessor: None,
            binarizer: None,
            cleaner: None,
            hole_contour_extractor: None,
            debug_dir: None,
        }
    }

    /// Set the preprocessor (replaces the Gaussian default)
    pub fn set_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessor = Some(Box::new(preprocessor));
        self
    }

    /// Set the binarizer (replaces the adaptive threshold default)
    pub fn set_binarizer<B>(mut self, binarizer: B) -> Self
    where
        B: Binarizer + 'static,
    {
        self.binarizer = Some(Box::new(binarizer));
        self
    }

    /// Set the mask cleaner (replaces the morphology default)
    pub fn set_cleaner<C>(mut self, cleaner: C) -> Self
    where
        C: MaskCleaner + 'static,
    {
        self.cleaner = Some(Box::new(cleaner));
        self
    }

    /// Set the contour extractor used for hole candidates
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.hole_contour_extractor = Some(Box::new(extractor));
        self
    }

    /// Write intermediate masks and a contour overlay into `dir`
    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Pipeline {
        let config = self.config;

        let preprocessor = self
            .preprocessor
            .unwrap_or_else(|| Box::new(GaussianPreprocessor::new(&config.preprocess)));
        let binarizer = self
            .binarizer
            .unwrap_or_else(|| Box::new(AdaptiveThresholdBinarizer::new(&config.threshold)));
        let cleaner = self
            .cleaner
            .unwrap_or_else(|| Box::new(MorphologyCleaner::new(&config.morphology)));
        let hole_contour_extractor = self
            .hole_contour_extractor
            .unwrap_or_else(|| Box::new(ImageprocContourExtractor::tree()));

        let debug = match self.debug_dir {
            Some(dir) => DebugSink::to_dir(dir),
            None => DebugSink::disabled(),
        };

        Pipeline {
            preprocessor,
            binarizer,
            cleaner,
            boundary_locator: BoundaryLocator::new(config.rails),
            hole_extractor: HoleExtractor::from_boxed(config.holes, hole_contour_extractor),
            grid_mapper: GridMapper::new(config.grid),
            wire_detector: WireDetector::new(config.detection, config.wire_colors.clone()),
            debug,
            config,
        }
    }
}
