//! GeoJSON export of a structural record, in image pixel coordinates.

use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::{
    error::Result,
    types::{BoundingBox, Boundary, Orientation, StructuralRecord},
};

/// Properties attached to every exported feature, tagged by `kind`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureProperties {
    Boundary,
    Hole {
        id: usize,
        area: f64,
        aspect_ratio: f64,
        solidity: f64,
        /// Nearest horizontal grid line, if any were detected
        row: Option<usize>,
        /// Nearest vertical grid line, if any were detected
        column: Option<usize>,
    },
    GridLine {
        orientation: Orientation,
        index: usize,
        length: f64,
    },
    Wire {
        id: usize,
        color: String,
    },
    Component {
        id: usize,
    },
}

impl FeatureProperties {
    fn into_object(self) -> Option<JsonObject> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Typed view of a feature's properties.
    pub fn of(feature: &Feature) -> Option<Self> {
        let properties = feature.properties.clone()?;
        serde_json::from_value(serde_json::Value::Object(properties)).ok()
    }
}

fn feature(value: Value, properties: FeatureProperties) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: properties.into_object(),
        foreign_members: None,
    }
}

fn ring(corners: [[f64; 2]; 4]) -> Value {
    let mut ring: Vec<Vec<f64>> = corners.iter().map(|c| c.to_vec()).collect();
    ring.push(corners[0].to_vec());
    Value::Polygon(vec![ring])
}

fn bbox_polygon(bbox: &BoundingBox) -> Value {
    let (left, top) = (bbox.x as f64, bbox.y as f64);
    let (right, bottom) = (bbox.right() as f64, bbox.bottom() as f64);
    ring([[left, top], [right, top], [right, bottom], [left, bottom]])
}

fn boundary_polygon(boundary: &Boundary) -> Value {
    ring([
        [boundary.left, boundary.top],
        [boundary.right, boundary.top],
        [boundary.right, boundary.bottom],
        [boundary.left, boundary.bottom],
    ])
}

impl StructuralRecord {
    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let mut features = vec![feature(boundary_polygon(&self.boundary), FeatureProperties::Boundary)];

        for (id, hole) in self.holes.iter().enumerate() {
            let [x, y] = hole.centroid;
            features.push(feature(
                Value::Point(vec![x, y]),
                FeatureProperties::Hole {
                    id,
                    area: hole.descriptors.area,
                    aspect_ratio: hole.descriptors.aspect_ratio,
                    solidity: hole.descriptors.solidity,
                    row: self.grid_lines.assign_row(y),
                    column: self.grid_lines.assign_column(x),
                },
            ));
        }

        let grid = [
            (Orientation::Horizontal, &self.grid_lines.horizontal),
            (Orientation::Vertical, &self.grid_lines.vertical),
        ];
        for (orientation, segments) in grid {
            for (index, segment) in segments.iter().enumerate() {
                let coordinates = [segment.start, segment.end]
                    .iter()
                    .map(|&[x, y]| vec![x as f64, y as f64])
                    .collect();
                features.push(feature(
                    Value::LineString(coordinates),
                    FeatureProperties::GridLine { orientation, index, length: segment.length() },
                ));
            }
        }

        for (id, wire) in self.wires.iter().enumerate() {
            features.push(feature(
                bbox_polygon(&wire.bbox),
                FeatureProperties::Wire { id, color: wire.color.clone() },
            ));
        }

        for (id, component) in self.components.iter().enumerate() {
            features.push(feature(bbox_polygon(&component.bbox), FeatureProperties::Component { id }));
        }

        let mut foreign_members = JsonObject::new();
        foreign_members.insert("image_width".to_string(), self.image_width.into());
        foreign_members.insert("image_height".to_string(), self.image_height.into());
        foreign_members.insert("hole_count".to_string(), self.holes.len().into());

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }
}

/// Read back a previously exported feature collection.
pub fn read_feature_collection<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.parse::<FeatureCollection>()?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{
        ComponentDetection, GridLines, Hole, LineSegment, ShapeDescriptors, WireDetection,
    };

    pub(crate) fn sample_record() -> StructuralRecord {
        let hole_bbox = BoundingBox { x: 40, y: 38, width: 16, height: 16 };
        StructuralRecord {
            image_width: 200,
            image_height: 100,
            holes: vec![Hole {
                bbox: hole_bbox,
                centroid: [47.5, 45.5],
                descriptors: ShapeDescriptors { area: 225.0, aspect_ratio: 1.0, solidity: 0.875 },
            }],
            boundary: Boundary { left: 20.0, right: 180.0, top: 3.5, bottom: 95.0 },
            grid_lines: GridLines::from_segments([
                LineSegment::new([20, 10], [180, 10]),
                LineSegment::new([20, 50], [180, 50]),
                LineSegment::new([50, 5], [50, 95]),
            ]),
            wires: vec![WireDetection {
                bbox: BoundingBox { x: 100, y: 20, width: 30, height: 8 },
                centroid: [115, 24],
                color: "red".to_string(),
            }],
            components: vec![ComponentDetection {
                bbox: BoundingBox { x: 60, y: 60, width: 20, height: 20 },
                centroid: [70, 70],
            }],
        }
    }

    fn kinds(collection: &FeatureCollection) -> Vec<FeatureProperties> {
        collection.features.iter().filter_map(FeatureProperties::of).collect()
    }

    #[test]
    fn every_detection_becomes_a_feature() {
        let record = sample_record();
        let collection = record.to_geojson().unwrap();

        // boundary + 1 hole + 3 grid lines + 1 wire + 1 component
        assert_eq!(collection.features.len(), 7);
        let properties = kinds(&collection);
        assert_eq!(properties.len(), 7);
        assert_eq!(properties[0], FeatureProperties::Boundary);
        assert_eq!(
            properties[1],
            FeatureProperties::Hole {
                id: 0,
                area: 225.0,
                aspect_ratio: 1.0,
                solidity: 0.875,
                row: Some(1),
                column: Some(0),
            }
        );
        assert!(properties.contains(&FeatureProperties::Wire { id: 0, color: "red".to_string() }));
        assert!(properties.contains(&FeatureProperties::Component { id: 0 }));

        let foreign = collection.foreign_members.as_ref().unwrap();
        assert_eq!(foreign["image_width"], 200);
        assert_eq!(foreign["image_height"], 100);
        assert_eq!(foreign["hole_count"], 1);
    }

    #[test]
    fn geometries_use_pixel_coordinates() {
        let collection = sample_record().to_geojson().unwrap();
        let geometry = |index: usize| collection.features[index].geometry.as_ref().unwrap().value.clone();

        match geometry(0) {
            Value::Polygon(rings) => {
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0][0], vec![20.0, 3.5]);
                assert_eq!(rings[0][2], vec![180.0, 95.0]);
                assert_eq!(rings[0][0], rings[0][4]);
            }
            other => panic!("boundary should be a polygon, got {other:?}"),
        }
        assert_eq!(geometry(1), Value::Point(vec![47.5, 45.5]));
        assert_eq!(geometry(2), Value::LineString(vec![vec![20.0, 10.0], vec![180.0, 10.0]]));
    }

    #[test]
    fn saved_collection_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.geojson");
        let record = sample_record();
        record.save_geojson(&path).unwrap();

        let collection = read_feature_collection(&path).unwrap();
        assert_eq!(collection.features.len(), 7);
        assert_eq!(kinds(&collection), kinds(&record.to_geojson().unwrap()));
    }

    #[test]
    fn empty_grid_leaves_holes_unassigned() {
        let mut record = sample_record();
        record.grid_lines = GridLines::default();
        let collection = record.to_geojson().unwrap();

        match FeatureProperties::of(&collection.features[1]) {
            Some(FeatureProperties::Hole { row, column, .. }) => {
                assert_eq!(row, None);
                assert_eq!(column, None);
            }
            other => panic!("expected hole properties, got {other:?}"),
        }
    }
}
