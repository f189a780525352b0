//! Straight line detection for row/column assignment.
//!
//! Hough voting over the edge map proposes infinite lines; each proposal is
//! walked across the edge map and cut into segments wherever the edge
//! coverage has a gap longer than `max_line_gap`.

use image::{GrayImage, RgbImage};
use imageproc::{
    edges::canny,
    hough::{LineDetectionOptions, PolarLine, detect_lines},
};
use tracing::{debug, info};
use crate::{
    algorithms::preprocessing::GaussianPreprocessor,
    config::LineDetectionParams,
    error::Result,
    types::{GridLines, LineSegment},
};

/// Detects and orders the grid lines of a breadboard photograph
#[derive(Debug, Clone, Default)]
pub struct GridMapper {
    pub params: LineDetectionParams,
}

impl GridMapper {
    pub fn new(params: LineDetectionParams) -> Self {
        Self { params }
    }

    pub fn detect(&self, image: &RgbImage) -> Result<GridLines> {
        let gray = GaussianPreprocessor::grayscale(image)?;
        let edges = canny(&gray, self.params.canny_low, self.params.canny_high);
        let grid = GridLines::from_segments(self.segments(&edges));

        info!(
            horizontal = grid.horizontal.len(),
            vertical = grid.vertical.len(),
            "grid lines detected"
        );
        Ok(grid)
    }

    /// Line segments of a binary edge map, unordered.
    pub fn segments(&self, edges: &GrayImage) -> Vec<LineSegment> {
        let options = LineDetectionOptions {
            vote_threshold: self.params.vote_threshold,
            suppression_radius: self.params.suppression_radius,
        };
        let lines = detect_lines(edges, options);
        debug!(candidates = lines.len(), "hough lines");

        lines
            .iter()
            .flat_map(|line| self.trace_line(edges, line))
            .collect()
    }

    /// Walk one polar line over the edge map and split it at gaps.
    fn trace_line(&self, edges: &GrayImage, line: &PolarLine) -> Vec<LineSegment> {
        let (width, height) = (edges.width() as i64, edges.height() as i64);
        let theta = (line.angle_in_degrees as f64).to_radians();
        let (cos, sin) = (theta.cos(), theta.sin());
        let r = line.r as f64;

        // Step along whichever axis the line runs closer to.
        let steps_along_x = sin.abs() >= cos.abs();
        let steps = if steps_along_x { width } else { height };

        let is_edge = |x: i64, y: i64| {
            x >= 0 && y >= 0 && x < width && y < height && edges.get_pixel(x as u32, y as u32)[0] > 0
        };

        let max_gap = self.params.max_line_gap.max(0.0) as i64;
        let mut segments = Vec::new();
        // (start point, last hit point, step index of last hit)
        let mut run: Option<([i32; 2], [i32; 2], i64)> = None;

        for step in 0..steps {
            let point = if steps_along_x {
                let y = ((r - step as f64 * cos) / sin).round() as i64;
                [step, y]
            } else {
                let x = ((r - step as f64 * sin) / cos).round() as i64;
                [x, step]
            };

            let hit = (-1..=1).any(|offset| {
                if steps_along_x {
                    is_edge(point[0], point[1] + offset)
                } else {
                    is_edge(point[0] + offset, point[1])
                }
            });
            if !hit {
                continue;
            }

            let point = [point[0] as i32, point[1] as i32];
            run = match run {
                Some((start, _, last_step)) if step - last_step - 1 <= max_gap => Some((start, point, step)),
                Some((start, end, _)) => {
                    self.push_segment(&mut segments, start, end);
                    Some((point, point, step))
                }
                None => Some((point, point, step)),
            };
        }

        if let Some((start, end, _)) = run {
            self.push_segment(&mut segments, start, end);
        }
        segments
    }

    fn push_segment(&self, segments: &mut Vec<LineSegment>, start: [i32; 2], end: [i32; 2]) {
        let segment = LineSegment::new(start, end);
        if segment.length() >= self.params.min_line_length {
            segments.push(segment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};
    use crate::types::Orientation;

    const INK: Rgb<u8> = Rgb([0, 0, 0]);
    const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

    fn paint(image: &mut RgbImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) {
        for y in ys {
            for x in xs.clone() {
                image.put_pixel(x, y, INK);
            }
        }
    }

    fn near(values: impl Iterator<Item = f64>, target: f64) -> bool {
        values.into_iter().any(|v| (v - target).abs() <= 4.0)
    }

    #[test]
    fn horizontal_lines_are_found_in_order() {
        let mut image = RgbImage::from_pixel(300, 200, PAPER);
        for y in [150, 50, 100] {
            paint(&mut image, 20..280, y..y + 3);
        }

        let grid = GridMapper::default().detect(&image).unwrap();
        assert!(!grid.horizontal.is_empty());
        assert!(grid.vertical.is_empty());
        for target in [51.0, 101.0, 151.0] {
            assert!(near(grid.horizontal.iter().map(LineSegment::mean_y), target), "no line near y={target}");
        }
        assert!(grid.horizontal.windows(2).all(|w| w[0].mean_y() <= w[1].mean_y()));
        assert!(grid.horizontal.iter().all(|s| s.orientation() == Orientation::Horizontal));
    }

    #[test]
    fn vertical_lines_are_found_in_order() {
        let mut image = RgbImage::from_pixel(300, 200, PAPER);
        for x in [180, 60, 120] {
            paint(&mut image, x..x + 3, 20..180);
        }

        let grid = GridMapper::default().detect(&image).unwrap();
        assert!(!grid.vertical.is_empty());
        assert!(grid.horizontal.is_empty());
        for target in [61.0, 121.0, 181.0] {
            assert!(near(grid.vertical.iter().map(LineSegment::mean_x), target), "no line near x={target}");
        }
        assert!(grid.vertical.windows(2).all(|w| w[0].mean_x() <= w[1].mean_x()));
    }

    #[test]
    fn detection_is_repeatable() {
        let mut image = RgbImage::from_pixel(300, 200, PAPER);
        paint(&mut image, 20..280, 60..63);
        paint(&mut image, 100..103, 20..180);

        let mapper = GridMapper::default();
        assert_eq!(mapper.detect(&image).unwrap(), mapper.detect(&image).unwrap());
    }

    #[test]
    fn blank_images_have_no_lines() {
        for color in [INK, PAPER] {
            let grid = GridMapper::default().detect(&RgbImage::from_pixel(200, 150, color)).unwrap();
            assert!(grid.is_empty());
        }
    }

    #[test]
    fn gaps_split_segments() {
        let mut edges = GrayImage::new(400, 50);
        for x in (0..150).chain(180..400) {
            edges.put_pixel(x, 20, Luma([255]));
        }
        let line = PolarLine { r: 20.0, angle_in_degrees: 90 };

        let mapper = GridMapper::default();
        let segments = mapper.trace_line(&edges, &line);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], LineSegment::new([0, 20], [149, 20]));
        assert_eq!(segments[1], LineSegment::new([180, 20], [399, 20]));

        let bridging = GridMapper::new(LineDetectionParams { max_line_gap: 40.0, ..Default::default() });
        assert_eq!(bridging.trace_line(&edges, &line), vec![LineSegment::new([0, 20], [399, 20])]);
    }

    #[test]
    fn short_runs_are_dropped() {
        let mut edges = GrayImage::new(200, 50);
        for x in 10..60 {
            edges.put_pixel(x, 20, Luma([255]));
        }
        let line = PolarLine { r: 20.0, angle_in_degrees: 90 };
        assert!(GridMapper::default().trace_line(&edges, &line).is_empty());
    }
}
