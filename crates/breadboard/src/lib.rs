//! # Breadboard Structural Analysis Library
//!
//! Turns a photograph of a solderless breadboard into a structural record:
//! the working area between the power rails, the insertion holes, the grid
//! lines used to assign holes to rows and columns, and the colored wires and
//! components sitting on the board.
//!
//! ## Core Features
//!
//! - **Trait-based Stages**: preprocessing, binarization, mask cleanup and
//!   contour extraction sit behind traits and can be swapped in the builder
//! - **Validated Configuration**: TOML or JSON, checked once at load time
//! - **Named Hole Predicates**: area, aspect ratio, boundary and solidity
//!   tests applied in a fixed order
//! - **JSON and GeoJSON Export** in image pixel coordinates
//! - **Debug Snapshots** of intermediate masks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use breadboard::{AnalyzerConfig, Pipeline, io::load_image};
//!
//! let config = AnalyzerConfig::from_file("breadboard.toml")?;
//! let pipeline = Pipeline::new(config);
//!
//! let image = load_image("board.jpg")?;
//! let record = pipeline.process(&image)?;
//!
//! println!("{} holes, {} wires", record.holes.len(), record.wires.len());
//! record.save_geojson("board.geojson")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use breadboard::{AnalyzerConfig, Pipeline, algorithms::*};
//!
//! let config = AnalyzerConfig::with_wire_colors([
//!     ("red", HsvRange::new([0, 100, 100], [10, 255, 255])),
//! ])?;
//! let pipeline = Pipeline::builder(config)
//!     .set_binarizer(AdaptiveThresholdBinarizer { window_size: 31, offset: 7 })
//!     .with_debug_dir("debug")
//!     .build();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod config;
pub mod algorithms;
pub mod pipeline;
pub mod io;
pub mod debug;

pub use error::{BreadboardError, Result};
pub use types::{
    Boundary, BoundingBox, ComponentDetection, GridLines, Hole, LineSegment, Orientation,
    ShapeDescriptors, StructuralRecord, WireDetection,
};
pub use config::AnalyzerConfig;
pub use traits::*;
pub use pipeline::{Pipeline, builder::PipelineBuilder};
pub use debug::{DebugSink, DebugStage};
