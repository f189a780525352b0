pub mod builder;

use std::path::Path;

use image::RgbImage;
use tracing::{debug, info, info_span};
use crate::{
    algorithms::{BoundaryLocator, GridMapper, HoleExtractor, WireDetector, preprocessing::ensure_not_empty},
    config::AnalyzerConfig,
    debug::{DebugSink, DebugStage},
    error::Result,
    io::load_image,
    traits::{Binarizer, ImagePreprocessor, MaskCleaner},
    types::StructuralRecord,
};

/// Runs every analysis stage over one photograph and merges the results
pub struct Pipeline {
    config: AnalyzerConfig,
    preprocessor: Box<dyn ImagePreprocessor>,
    binarizer: Box<dyn Binarizer>,
    cleaner: Box<dyn MaskCleaner>,
    boundary_locator: BoundaryLocator,
    hole_extractor: HoleExtractor,
    grid_mapper: GridMapper,
    wire_detector: WireDetector,
    debug: DebugSink,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder(config: AnalyzerConfig) -> builder::PipelineBuilder {
        builder::PipelineBuilder::new(config)
    }

    /// Pipeline with the default stage implementations for `config`.
    pub fn new(config: AnalyzerConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze an image through the entire pipeline
    pub fn process(&self, image: &RgbImage) -> Result<StructuralRecord> {
        ensure_not_empty(image)?;
        let _span = info_span!("process", width = image.width(), height = image.height()).entered();

        // Foreground mask of dark, hole-like structures
        let blurred = self.preprocessor.preprocess(image)?;
        let thresholded = self.binarizer.binarize(&blurred)?;
        self.debug.save_mask(DebugStage::Thresholded, &thresholded);

        let opened = self.cleaner.open(&thresholded);
        self.debug.save_mask(DebugStage::Opening, &opened);
        let cleaned = self.cleaner.close(&opened);
        self.debug.save_mask(DebugStage::Closing, &cleaned);

        let boundary = self.boundary_locator.locate(image)?;

        let contours = self.hole_extractor.contours(&cleaned)?;
        self.debug.save_contours(image, &contours);
        let holes = self.hole_extractor.classify(&contours, &boundary);
        info!(contours = contours.len(), holes = holes.len(), "holes classified");

        let grid_lines = self.grid_mapper.detect(image)?;
        let (components, wires) = self.wire_detector.detect(image, &blurred)?;
        info!(components = components.len(), wires = wires.len(), "wires and components detected");

        Ok(StructuralRecord {
            image_width: image.width(),
            image_height: image.height(),
            holes,
            boundary,
            grid_lines,
            wires,
            components,
        })
    }

    /// Load an image from disk and analyze it.
    pub fn process_path<P: AsRef<Path>>(&self, path: P) -> Result<StructuralRecord> {
        let path = path.as_ref();
        debug!("Loading image {}", path.display());
        let image = load_image(path)?;
        self.process(&image)
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: {} wire colors, grid {}x{}, debug snapshots {}",
            self.config.wire_colors.len(),
            self.config.grid_params.rows,
            self.config.grid_params.cols,
            if self.debug.is_enabled() { "on" } else { "off" },
        )
    }
}
