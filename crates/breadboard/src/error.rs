use thiserror::Error;

#[derive(Error, Debug)]
pub enum BreadboardError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported configuration format. Please use .toml or .json files")]
    UnsupportedConfigFormat,

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

impl BreadboardError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, BreadboardError>;
