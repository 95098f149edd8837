//! Bounding boxes of GeoJSON input.

use geo_types::{Coord, Rect};
use geojson::{GeoJson, Geometry, Position, Value};
use serde::{Deserialize, Serialize};

/// Errors from reading caller-supplied geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// The geometry holds no coordinates.
    Empty,
    /// The payload is not valid GeoJSON.
    Parse(String),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::Empty => write!(f, "Geometry has no coordinates"),
            GeometryError::Parse(msg) => write!(f, "Failed to parse GeoJSON: {}", msg),
        }
    }
}

impl std::error::Error for GeometryError {}

/// Parses a GeoJSON geometry, feature or feature collection.
pub fn parse_geojson(value: serde_json::Value) -> Result<GeoJson, GeometryError> {
    GeoJson::from_json_value(value).map_err(|e| GeometryError::Parse(e.to_string()))
}

/// `[min_x, min_y, max_x, max_y]` in longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Box spanned by two arbitrary corners, e.g. the ends of a drag.
    pub fn from_corners(a: Coord<f64>, b: Coord<f64>) -> Self {
        Self::from(Rect::new(a, b))
    }

    fn point(c: Coord<f64>) -> Self {
        Self {
            min_x: c.x,
            min_y: c.y,
            max_x: c.x,
            max_y: c.y,
        }
    }

    /// Computes the extent of every coordinate in `geojson`.
    pub fn of(geojson: &GeoJson) -> Result<Self, GeometryError> {
        let mut bbox: Option<BoundingBox> = None;
        match geojson {
            GeoJson::FeatureCollection(fc) => {
                for feature in &fc.features {
                    if let Some(geometry) = &feature.geometry {
                        collect_geometry(geometry, &mut bbox);
                    }
                }
            }
            GeoJson::Feature(feature) => {
                if let Some(geometry) = &feature.geometry {
                    collect_geometry(geometry, &mut bbox);
                }
            }
            GeoJson::Geometry(geometry) => collect_geometry(geometry, &mut bbox),
        }
        bbox.ok_or(GeometryError::Empty)
    }

    pub fn extend(&mut self, c: Coord<f64>) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True for a box with no area on either axis (a single point).
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 && self.height() == 0.0
    }

    pub fn center(&self) -> Coord<f64> {
        self.to_rect().center()
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_x,
                y: self.min_y,
            },
            Coord {
                x: self.max_x,
                y: self.max_y,
            },
        )
    }

    /// Closed counter-clockwise ring, starting at the lower-left corner.
    pub fn to_polygon(&self) -> Geometry {
        let ring: Vec<Position> = vec![
            vec![self.min_x, self.min_y],
            vec![self.max_x, self.min_y],
            vec![self.max_x, self.max_y],
            vec![self.min_x, self.max_y],
            vec![self.min_x, self.min_y],
        ];
        Geometry::new(Value::Polygon(vec![ring]))
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        }
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([a, b, c, d]: [f64; 4]) -> Self {
        Self::from_corners(Coord { x: a, y: b }, Coord { x: c, y: d })
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y]
    }
}

fn collect_position(position: &Position, bbox: &mut Option<BoundingBox>) {
    let [x, y, ..] = position.as_slice() else {
        return;
    };
    if !x.is_finite() || !y.is_finite() {
        return;
    }
    let c = Coord { x: *x, y: *y };
    match bbox {
        Some(b) => b.extend(c),
        None => *bbox = Some(BoundingBox::point(c)),
    }
}

fn collect_geometry(geometry: &Geometry, bbox: &mut Option<BoundingBox>) {
    match &geometry.value {
        Value::Point(p) => collect_position(p, bbox),
        Value::MultiPoint(points) | Value::LineString(points) => {
            for p in points {
                collect_position(p, bbox);
            }
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            for p in lines.iter().flatten() {
                collect_position(p, bbox);
            }
        }
        Value::MultiPolygon(polygons) => {
            for p in polygons.iter().flatten().flatten() {
                collect_position(p, bbox);
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_geometry(g, bbox);
            }
        }
    }
}
