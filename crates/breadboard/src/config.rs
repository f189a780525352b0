//! Analyzer configuration.
//!
//! The document carries `grid_params` and `wire_colors` plus optional
//! per-stage parameter tables. It is validated once, when loaded, and then
//! handed to each stage explicitly.
//!
//! ```toml
//! [grid_params]
//! rows = 30
//! cols = 10
//!
//! [wire_colors]
//! red = [[0, 100, 100], [10, 255, 255]]
//! blue = [[100, 100, 100], [130, 255, 255]]
//!
//! [threshold]
//! window_size = 25
//! offset = 5
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    algorithms::color::HsvRange,
    error::{BreadboardError, Result},
};

/// Validated analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct AnalyzerConfig {
    pub grid_params: GridParams,
    /// Wire color name to inclusive HSV bounds. Iterated in name order.
    pub wire_colors: BTreeMap<String, HsvRange>,
    pub preprocess: PreprocessParams,
    pub threshold: ThresholdParams,
    pub morphology: MorphologyParams,
    pub holes: HoleParams,
    pub rails: RailParams,
    pub grid: LineDetectionParams,
    pub detection: DetectionParams,
}

/// Raw document shape before validation.
#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    grid_params: GridParams,
    wire_colors: Option<BTreeMap<String, HsvRange>>,
    #[serde(default)]
    preprocess: PreprocessParams,
    #[serde(default)]
    threshold: ThresholdParams,
    #[serde(default)]
    morphology: MorphologyParams,
    #[serde(default)]
    holes: HoleParams,
    #[serde(default)]
    rails: RailParams,
    #[serde(default)]
    grid: LineDetectionParams,
    #[serde(default)]
    detection: DetectionParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GridParams {
    pub rows: u32,
    pub cols: u32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self { rows: 30, cols: 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PreprocessParams {
    pub blur_kernel_size: u32,
    pub blur_sigma: f64,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        // conventional sigma for a 5x5 kernel: 0.3 * ((5 - 1) * 0.5 - 1) + 0.8
        Self { blur_kernel_size: 5, blur_sigma: 1.1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ThresholdParams {
    pub window_size: u32,
    pub offset: i32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self { window_size: 25, offset: 5 }
    }
}

/// Square structuring element and iteration counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MorphologyParams {
    pub kernel_size: u32,
    pub open_iterations: u32,
    pub close_iterations: u32,
}

impl Default for MorphologyParams {
    fn default() -> Self {
        Self { kernel_size: 3, open_iterations: 1, close_iterations: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HoleParams {
    pub min_area: f64,
    pub max_area: f64,
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    pub min_solidity: f64,
}

impl Default for HoleParams {
    fn default() -> Self {
        Self {
            min_area: 100.0,
            max_area: 420.0,
            min_aspect_ratio: 0.6,
            max_aspect_ratio: 1.6,
            min_solidity: 0.65,
        }
    }
}

/// Power rail localization. Fractions are of image width or height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RailParams {
    pub kernel_size: u32,
    pub open_iterations: u32,
    pub close_iterations: u32,
    pub min_rail_height_fraction: f64,
    pub left_zone_fraction: f64,
    pub right_zone_fraction: f64,
    pub margin: f64,
    pub default_left_fraction: f64,
    pub default_right_fraction: f64,
    pub top_fraction: f64,
    pub bottom_fraction: f64,
    pub blue: HsvRange,
    pub red_low: HsvRange,
    pub red_high: HsvRange,
}

impl RailParams {
    pub fn morphology(&self) -> MorphologyParams {
        MorphologyParams {
            kernel_size: self.kernel_size,
            open_iterations: self.open_iterations,
            close_iterations: self.close_iterations,
        }
    }
}

impl Default for RailParams {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            open_iterations: 2,
            close_iterations: 3,
            min_rail_height_fraction: 0.5,
            left_zone_fraction: 0.4,
            right_zone_fraction: 0.6,
            margin: 5.0,
            default_left_fraction: 0.1,
            default_right_fraction: 0.9,
            top_fraction: 0.035,
            bottom_fraction: 0.95,
            blue: HsvRange::new([90, 60, 40], [130, 255, 255]),
            red_low: HsvRange::new([0, 60, 40], [10, 255, 255]),
            red_high: HsvRange::new([170, 60, 40], [180, 255, 255]),
        }
    }
}

/// Edge and straight line detection for the grid mapper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LineDetectionParams {
    pub canny_low: f32,
    pub canny_high: f32,
    pub vote_threshold: u32,
    pub suppression_radius: u32,
    pub min_line_length: f64,
    pub max_line_gap: f64,
}

impl Default for LineDetectionParams {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            vote_threshold: 100,
            suppression_radius: 8,
            min_line_length: 100.0,
            max_line_gap: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DetectionParams {
    pub canny_low: f32,
    pub canny_high: f32,
    pub component_min_area: f64,
    pub wire_min_area: f64,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            component_min_area: 100.0,
            wire_min_area: 50.0,
        }
    }
}

fn odd_size(name: &str, value: u32) -> Result<()> {
    if value == 0 || value % 2 == 0 {
        return Err(BreadboardError::config(format!("{name} must be a positive odd number, got {value}")));
    }
    Ok(())
}

fn fraction(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(BreadboardError::config(format!("{name} must lie in [0, 1], got {value}")));
    }
    Ok(())
}

fn ordered(name: &str, low: f64, high: f64) -> Result<()> {
    if low > high {
        return Err(BreadboardError::config(format!("{name}: lower bound {low} exceeds upper bound {high}")));
    }
    Ok(())
}

fn hsv_range(name: &str, range: &HsvRange) -> Result<()> {
    range.validate().map_err(|reason| BreadboardError::config(format!("{name}: {reason}")))
}

impl TryFrom<ConfigDocument> for AnalyzerConfig {
    type Error = BreadboardError;

    fn try_from(document: ConfigDocument) -> Result<Self> {
        let wire_colors = document
            .wire_colors
            .ok_or_else(|| BreadboardError::config("missing required key 'wire_colors'"))?;

        let config = Self {
            grid_params: document.grid_params,
            wire_colors,
            preprocess: document.preprocess,
            threshold: document.threshold,
            morphology: document.morphology,
            holes: document.holes,
            rails: document.rails,
            grid: document.grid,
            detection: document.detection,
        };
        config.validate()?;
        Ok(config)
    }
}

impl AnalyzerConfig {
    /// Configuration with default stage parameters and the given wire colors.
    pub fn with_wire_colors<I, S>(wire_colors: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, HsvRange)>,
        S: Into<String>,
    {
        let config = Self {
            grid_params: GridParams::default(),
            wire_colors: wire_colors.into_iter().map(|(name, range)| (name.into(), range)).collect(),
            preprocess: PreprocessParams::default(),
            threshold: ThresholdParams::default(),
            morphology: MorphologyParams::default(),
            holes: HoleParams::default(),
            rails: RailParams::default(),
            grid: LineDetectionParams::default(),
            detection: DetectionParams::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_params.rows == 0 || self.grid_params.cols == 0 {
            return Err(BreadboardError::config("grid_params rows and cols must be positive"));
        }

        for (name, range) in &self.wire_colors {
            if name.trim().is_empty() {
                return Err(BreadboardError::config("wire color names must not be empty"));
            }
            hsv_range(&format!("wire_colors.{name}"), range)?;
        }

        odd_size("preprocess.blur_kernel_size", self.preprocess.blur_kernel_size)?;
        if !(self.preprocess.blur_sigma > 0.0) {
            return Err(BreadboardError::config("preprocess.blur_sigma must be positive"));
        }

        odd_size("threshold.window_size", self.threshold.window_size)?;
        odd_size("morphology.kernel_size", self.morphology.kernel_size)?;

        let holes = &self.holes;
        ordered("holes area", holes.min_area, holes.max_area)?;
        ordered("holes aspect ratio", holes.min_aspect_ratio, holes.max_aspect_ratio)?;
        if holes.min_aspect_ratio <= 0.0 {
            return Err(BreadboardError::config("holes.min_aspect_ratio must be positive"));
        }

        let rails = &self.rails;
        odd_size("rails.kernel_size", rails.kernel_size)?;
        for (name, value) in [
            ("rails.min_rail_height_fraction", rails.min_rail_height_fraction),
            ("rails.left_zone_fraction", rails.left_zone_fraction),
            ("rails.right_zone_fraction", rails.right_zone_fraction),
            ("rails.default_left_fraction", rails.default_left_fraction),
            ("rails.default_right_fraction", rails.default_right_fraction),
            ("rails.top_fraction", rails.top_fraction),
            ("rails.bottom_fraction", rails.bottom_fraction),
        ] {
            fraction(name, value)?;
        }
        if rails.default_left_fraction >= rails.default_right_fraction {
            return Err(BreadboardError::config("rails default left fraction must be below the right one"));
        }
        if rails.top_fraction >= rails.bottom_fraction {
            return Err(BreadboardError::config("rails top fraction must be below the bottom one"));
        }
        hsv_range("rails.blue", &rails.blue)?;
        hsv_range("rails.red_low", &rails.red_low)?;
        hsv_range("rails.red_high", &rails.red_high)?;

        ordered("grid canny thresholds", self.grid.canny_low as f64, self.grid.canny_high as f64)?;
        ordered("detection canny thresholds", self.detection.canny_low as f64, self.detection.canny_high as f64)?;

        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let document: ConfigDocument = toml::from_str(content)?;
        Self::try_from(document)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let document: ConfigDocument = serde_json::from_str(content)?;
        Self::try_from(document)
    }

    /// Pick the format from the file extension and load.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path_ref),
            Some("json") => Self::from_json_file(path_ref),
            _ => Err(BreadboardError::UnsupportedConfigFormat),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalyzerConfig)
    }
}
