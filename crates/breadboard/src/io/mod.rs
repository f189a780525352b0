pub mod geojson;

use std::path::Path;

use image::RgbImage;
use crate::{error::Result, types::StructuralRecord};

/// Decode an image file into 8-bit RGB.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    Ok(image::open(path)?.to_rgb8())
}

/// Decode an in-memory encoded image, guessing the format from its header.
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<RgbImage> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

impl StructuralRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BreadboardError;
    use image::Rgb;

    #[test]
    fn png_round_trips_through_disk_and_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.png");
        let image = RgbImage::from_pixel(12, 8, Rgb([10, 120, 200]));
        image.save(&path).unwrap();

        assert_eq!(load_image(&path).unwrap(), image);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(load_image_from_bytes(&bytes).unwrap(), image);
    }

    #[test]
    fn undecodable_input_is_an_image_load_error() {
        let err = load_image_from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, BreadboardError::ImageLoad(_)));
    }

    #[test]
    fn record_json_is_readable_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let record = crate::io::geojson::tests::sample_record();
        record.save_json(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(StructuralRecord::from_json(&content).unwrap(), record);

        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["holes"][0]["descriptors"]["solidity"], 0.875);
        assert_eq!(value["wires"][0]["color"], "red");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_image(dir.path().join("missing.png")).is_err());
    }
}
