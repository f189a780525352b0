//! Diagnostic snapshots of intermediate pipeline buffers.

use std::path::{Path, PathBuf};

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, warn};
use crate::algorithms::extraction::TracedContour;

/// Fixed points of the pipeline at which a snapshot is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DebugStage {
    Thresholded,
    Opening,
    Closing,
    ContoursPostClosing,
}

impl DebugStage {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Thresholded => "1_thresholded.png",
            Self::Opening => "2a_morph_opening.png",
            Self::Closing => "2b_morph_closing.png",
            Self::ContoursPostClosing => "3_all_contours_post_closing.png",
        }
    }
}

/// Writes snapshots into a directory, or does nothing when disabled.
///
/// Failures are logged and swallowed: snapshots never abort a run.
#[derive(Debug, Clone, Default)]
pub struct DebugSink {
    dir: Option<PathBuf>,
}

impl DebugSink {
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn to_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: Some(dir.into()) }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    pub fn path_for(&self, stage: DebugStage) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(stage.file_name()))
    }

    pub fn save_mask(&self, stage: DebugStage, mask: &GrayImage) {
        if let Some(path) = self.path_for(stage) {
            write(&path, |path| mask.save(path));
        }
    }

    /// Draw every contour in red over a copy of the source image.
    pub fn save_contours(&self, image: &RgbImage, contours: &[TracedContour]) {
        let Some(path) = self.path_for(DebugStage::ContoursPostClosing) else {
            return;
        };

        let mut canvas = image.clone();
        let red = Rgb([255, 0, 0]);
        for contour in contours {
            let points = &contour.points;
            for i in 0..points.len() {
                let p1 = points[i];
                let p2 = points[(i + 1) % points.len()];
                draw_line_segment_mut(
                    &mut canvas,
                    (p1[0] as f32, p1[1] as f32),
                    (p2[0] as f32, p2[1] as f32),
                    red,
                );
            }
        }
        write(&path, |path| canvas.save(path));
    }
}

fn write(path: &Path, save: impl FnOnce(&Path) -> image::ImageResult<()>) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Failed to create debug directory {}: {}", parent.display(), e);
            return;
        }
    }
    match save(path) {
        Ok(()) => debug!("Saved debug snapshot {}", path.display()),
        Err(e) => warn!("Failed to save debug snapshot {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use strum::IntoEnumIterator;
    use crate::algorithms::extraction::Border;

    #[test]
    fn disabled_sink_has_no_paths() {
        let sink = DebugSink::disabled();
        assert!(!sink.is_enabled());
        assert!(DebugStage::iter().all(|stage| sink.path_for(stage).is_none()));
        // No-op, must not panic.
        sink.save_mask(DebugStage::Thresholded, &GrayImage::new(4, 4));
    }

    #[test]
    fn snapshots_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DebugSink::to_dir(dir.path().join("debug"));

        let mut mask = GrayImage::new(8, 8);
        mask.put_pixel(3, 3, Luma([255]));
        sink.save_mask(DebugStage::Thresholded, &mask);

        let contour = TracedContour {
            points: vec![[1, 1], [6, 1], [6, 6], [1, 6]],
            border: Border::Outer,
            parent: None,
        };
        sink.save_contours(&RgbImage::new(8, 8), &[contour]);

        let thresholded = image::open(dir.path().join("debug/1_thresholded.png")).unwrap().to_luma8();
        assert_eq!(thresholded, mask);

        let overlay = image::open(dir.path().join("debug/3_all_contours_post_closing.png")).unwrap().to_rgb8();
        assert_eq!(*overlay.get_pixel(3, 1), Rgb([255, 0, 0]));
        assert_eq!(*overlay.get_pixel(3, 3), Rgb([0, 0, 0]));
    }
}
