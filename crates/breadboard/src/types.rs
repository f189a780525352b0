use geo_types::{Coord, LineString, Polygon};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// Axis-aligned pixel extent of a contour, inclusive of its edge pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Bounding box of a point set; `None` when the set is empty.
    pub fn from_points(points: &[[i32; 2]]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first[0], first[1], first[0], first[1]);

        for &[x, y] in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        Some(Self {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    /// Integer center, `(x + w/2, y + h/2)`.
    pub fn center(&self) -> [u32; 2] {
        [self.x + self.width / 2, self.y + self.height / 2]
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let (x0, y0) = (self.x as f64, self.y as f64);
        let (x1, y1) = (self.right() as f64, self.bottom() as f64);
        Polygon::new(
            LineString::new(vec![
                Coord { x: x0, y: y0 },
                Coord { x: x1, y: y0 },
                Coord { x: x1, y: y1 },
                Coord { x: x0, y: y1 },
                Coord { x: x0, y: y0 },
            ]),
            vec![],
        )
    }
}

/// Geometric measurements of a single contour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShapeDescriptors {
    pub area: f64,
    pub aspect_ratio: f64,
    pub solidity: f64,
}

/// Working rectangle between the power rails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Boundary {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Boundary {
    /// Strict containment; points on an edge are outside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.left < x && x < self.right && self.top < y && y < self.bottom
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// A contour that passed every hole predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Hole {
    pub bbox: BoundingBox,
    pub centroid: [f64; 2],
    pub descriptors: ShapeDescriptors,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LineSegment {
    pub start: [i32; 2],
    pub end: [i32; 2],
}

impl LineSegment {
    pub fn new(start: [i32; 2], end: [i32; 2]) -> Self {
        Self { start, end }
    }

    /// Angle from horizontal in degrees, normalized to `[0, 180)`.
    pub fn angle_degrees(&self) -> f64 {
        let dx = (self.end[0] - self.start[0]) as f64;
        let dy = (self.end[1] - self.start[1]) as f64;
        let angle = dy.atan2(dx).to_degrees();
        let normalized = if angle < 0.0 { angle + 180.0 } else { angle };
        if normalized >= 180.0 { normalized - 180.0 } else { normalized }
    }

    pub fn orientation(&self) -> Orientation {
        let angle = self.angle_degrees();
        if angle < 45.0 || angle > 135.0 {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    pub fn mean_x(&self) -> f64 {
        (self.start[0] + self.end[0]) as f64 / 2.0
    }

    pub fn mean_y(&self) -> f64 {
        (self.start[1] + self.end[1]) as f64 / 2.0
    }

    pub fn length(&self) -> f64 {
        let dx = (self.end[0] - self.start[0]) as f64;
        let dy = (self.end[1] - self.start[1]) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Line segments split by orientation. `horizontal` is ascending by mean y,
/// `vertical` ascending by mean x.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GridLines {
    pub horizontal: Vec<LineSegment>,
    pub vertical: Vec<LineSegment>,
}

impl GridLines {
    /// Classify and order an unordered set of segments.
    pub fn from_segments(segments: impl IntoIterator<Item = LineSegment>) -> Self {
        let (mut horizontal, mut vertical): (Vec<_>, Vec<_>) = segments
            .into_iter()
            .partition(|segment| segment.orientation() == Orientation::Horizontal);

        horizontal.sort_by(|a, b| a.mean_y().total_cmp(&b.mean_y()));
        vertical.sort_by(|a, b| a.mean_x().total_cmp(&b.mean_x()));

        Self { horizontal, vertical }
    }

    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty()
    }

    /// Index of the horizontal line whose mean y is nearest to `y`.
    pub fn assign_row(&self, y: f64) -> Option<usize> {
        nearest(&self.horizontal, |segment| segment.mean_y(), y)
    }

    /// Index of the vertical line whose mean x is nearest to `x`.
    pub fn assign_column(&self, x: f64) -> Option<usize> {
        nearest(&self.vertical, |segment| segment.mean_x(), x)
    }
}

fn nearest(lines: &[LineSegment], key: impl Fn(&LineSegment) -> f64, value: f64) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (key(a) - value).abs().total_cmp(&(key(b) - value).abs()))
        .map(|(index, _)| index)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WireDetection {
    pub bbox: BoundingBox,
    pub centroid: [u32; 2],
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComponentDetection {
    pub bbox: BoundingBox,
    pub centroid: [u32; 2],
}

/// Everything one pipeline run derives from a photograph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructuralRecord {
    pub image_width: u32,
    pub image_height: u32,
    pub holes: Vec<Hole>,
    pub boundary: Boundary,
    pub grid_lines: GridLines,
    pub wires: Vec<WireDetection>,
    pub components: Vec<ComponentDetection>,
}

impl StructuralRecord {
    /// JSON schema of the record, for collaborators consuming it.
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(StructuralRecord)
    }
}
