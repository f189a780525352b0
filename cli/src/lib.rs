use breadboard::{AnalyzerConfig, BreadboardError, StructuralRecord};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Breadboard(#[from] BreadboardError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Image not found: {0}")]
    MissingImage(PathBuf),
}

/// Which document `schema` prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaTarget {
    #[default]
    Record,
    Config,
}

pub fn schema_json(target: SchemaTarget) -> Result<String, CliError> {
    let schema = match target {
        SchemaTarget::Record => StructuralRecord::json_schema(),
        SchemaTarget::Config => AnalyzerConfig::json_schema(),
    };
    Ok(serde_json::to_string_pretty(&schema)?)
}

/// Counts reported after an `analyze` run
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AnalysisSummary {
    pub image: String,
    pub holes: usize,
    pub horizontal_lines: usize,
    pub vertical_lines: usize,
    pub wires: usize,
    pub components: usize,
    /// `[left, right, top, bottom]` in pixels
    pub boundary: [f64; 4],
}

impl AnalysisSummary {
    pub fn new(image: &Path, record: &StructuralRecord) -> Self {
        let boundary = &record.boundary;
        Self {
            image: image.display().to_string(),
            holes: record.holes.len(),
            horizontal_lines: record.grid_lines.horizontal.len(),
            vertical_lines: record.grid_lines.vertical.len(),
            wires: record.wires.len(),
            components: record.components.len(),
            boundary: [boundary.left, boundary.right, boundary.top, boundary.bottom],
        }
    }
}

/// Where `analyze` writes its results; stdout gets the JSON record when no
/// output path is set.
#[derive(Debug, Clone, Default)]
pub struct OutputTargets {
    pub json: Option<PathBuf>,
    pub geojson: Option<PathBuf>,
}

impl OutputTargets {
    /// Write the record to every configured target. Returns the JSON text when
    /// it should go to stdout instead.
    pub fn write(&self, record: &StructuralRecord) -> Result<Option<String>, CliError> {
        for path in [&self.json, &self.geojson].into_iter().flatten() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        if let Some(path) = &self.geojson {
            record.save_geojson(path)?;
        }
        match &self.json {
            Some(path) => {
                record.save_json(path)?;
                Ok(None)
            }
            None => Ok(Some(record.to_json()?)),
        }
    }
}
