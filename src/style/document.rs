//! Style document data structures.
//!
//! A style document is the declarative description of map sources and the
//! ordered list of layers the renderer paints. Only the fields the engine
//! reads or rewrites are modeled explicitly; everything else is carried
//! through untouched in flattened `extra` maps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::expr::Expr;
use super::StyleError;

/// Source name used by every dated vector layer.
pub const COMPOSITE_SOURCE: &str = "composite";

/// Id of the undated land polygon layer.
pub const LAND_LAYER_ID: &str = "land";

/// Kind of a named source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceKind {
    Vector,
    Raster,
    RasterDem,
    GeoJson,
    Image,
    Video,
    Other(String),
}

impl From<String> for SourceKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "vector" => SourceKind::Vector,
            "raster" => SourceKind::Raster,
            "raster-dem" => SourceKind::RasterDem,
            "geojson" => SourceKind::GeoJson,
            "image" => SourceKind::Image,
            "video" => SourceKind::Video,
            _ => SourceKind::Other(s),
        }
    }
}

impl From<SourceKind> for String {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Vector => "vector".to_string(),
            SourceKind::Raster => "raster".to_string(),
            SourceKind::RasterDem => "raster-dem".to_string(),
            SourceKind::GeoJson => "geojson".to_string(),
            SourceKind::Image => "image".to_string(),
            SourceKind::Video => "video".to_string(),
            SourceKind::Other(s) => s,
        }
    }
}

/// A named tile or data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// Tiles, url, attribution and anything else the renderer needs.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Rendering kind of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayerKind {
    Fill,
    Line,
    Symbol,
    Raster,
    Background,
    Other(String),
}

impl LayerKind {
    /// Basemap chrome that never carries dated content.
    pub fn is_chrome(&self) -> bool {
        matches!(self, LayerKind::Raster | LayerKind::Background)
    }
}

impl From<String> for LayerKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "fill" => LayerKind::Fill,
            "line" => LayerKind::Line,
            "symbol" => LayerKind::Symbol,
            "raster" => LayerKind::Raster,
            "background" => LayerKind::Background,
            _ => LayerKind::Other(s),
        }
    }
}

impl From<LayerKind> for String {
    fn from(kind: LayerKind) -> Self {
        match kind {
            LayerKind::Fill => "fill".to_string(),
            LayerKind::Line => "line".to_string(),
            LayerKind::Symbol => "symbol".to_string(),
            LayerKind::Raster => "raster".to_string(),
            LayerKind::Background => "background".to_string(),
            LayerKind::Other(s) => s,
        }
    }
}

/// A single entry of the paint stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(
        rename = "source-layer",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paint: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LayerSpec {
    pub fn new(id: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            kind,
            source: None,
            source_layer: None,
            filter: None,
            layout: None,
            paint: None,
            metadata: None,
            extra: Map::new(),
        }
    }

    /// Returns true if this layer reads from the dated composite source.
    pub fn is_composite(&self) -> bool {
        self.source.as_deref() == Some(COMPOSITE_SOURCE)
    }

    /// Basemap chrome and the land layer, which carry no dated content.
    pub fn is_basemap(&self) -> bool {
        self.kind.is_chrome() || self.id == LAND_LAYER_ID
    }

    /// Case-insensitive comparison against the thematic sub-layer name.
    pub fn has_source_layer(&self, name: &str) -> bool {
        self.source_layer
            .as_deref()
            .is_some_and(|sl| sl.to_lowercase() == name.to_lowercase())
    }

    /// Parsed filter tree, if the layer has one.
    pub fn filter_expr(&self) -> Option<Expr> {
        self.filter.as_ref().map(Expr::from_value)
    }

    /// Returns true if the filter asserts `type == thematic_type`.
    pub fn asserts_type(&self, thematic_type: &str) -> bool {
        self.filter_expr()
            .is_some_and(|expr| expr.asserts_property("type", thematic_type))
    }

    /// The layer/type matching rule shared by highlighting and legends.
    ///
    /// Both the sub-layer name and a `type` clause in the filter must match;
    /// a layer whose filter never mentions `type` is never a match.
    pub fn matches_selection(&self, layer_name: &str, thematic_type: &str) -> bool {
        self.has_source_layer(layer_name) && self.asserts_type(thematic_type)
    }

    pub fn paint_value(&self, key: &str) -> Option<&Value> {
        self.paint.as_ref().and_then(|p| p.get(key))
    }

    pub fn paint_mut(&mut self) -> &mut Map<String, Value> {
        self.paint.get_or_insert_with(Map::new)
    }
}

/// A complete style document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDocument {
    #[serde(default)]
    pub sources: BTreeMap<String, SourceSpec>,
    /// Paint order, bottom first.
    #[serde(default)]
    pub layers: Vec<LayerSpec>,
    /// Version, glyphs, sprite, center and other top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StyleDocument {
    /// Parses a style document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        serde_json::from_str(json).map_err(|e| StyleError::Parse(e.to_string()))
    }

    /// Builds a style document from an already parsed JSON tree.
    pub fn from_value(value: Value) -> Result<Self, StyleError> {
        serde_json::from_value(value).map_err(|e| StyleError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, StyleError> {
        serde_json::to_string(self).map_err(|e| StyleError::Parse(e.to_string()))
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Checks that every layer source other than the composite sentinel
    /// names an entry in `sources`.
    pub fn validate_sources(&self) -> Result<(), StyleError> {
        for layer in &self.layers {
            let Some(source) = layer.source.as_deref() else {
                continue;
            };
            if source == COMPOSITE_SOURCE || self.sources.contains_key(source) {
                continue;
            }
            return Err(StyleError::MissingSource {
                layer: layer.id.clone(),
                source: source.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "version": 8,
            "sprite": "mapbox://sprites/example",
            "sources": {
                "composite": { "type": "vector", "url": "mapbox://example.tiles" },
                "hillshade1900": {
                    "type": "raster",
                    "tiles": ["https://example.com/1900/{z}/{x}/{y}.png"]
                }
            },
            "layers": [
                { "id": "bg", "type": "background", "paint": { "background-color": "#eee" } },
                { "id": "hillshade", "type": "raster", "source": "hillshade1900" },
                {
                    "id": "buildings-residential",
                    "type": "fill",
                    "source": "composite",
                    "source-layer": "BuildingsPoly",
                    "minzoom": 12,
                    "filter": ["all", ["==", ["get", "type"], "residential"]],
                    "paint": { "fill-color": "#c8a060" }
                }
            ]
        })
    }

    #[test]
    fn test_round_trip_preserves_unknown_fields() {
        let value = sample();
        let style = StyleDocument::from_value(value.clone()).unwrap();
        assert_eq!(style.layers.len(), 3);
        assert_eq!(style.layers[2].kind, LayerKind::Fill);
        assert_eq!(style.sources["hillshade1900"].kind, SourceKind::Raster);

        let back = serde_json::to_value(&style).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_unknown_layer_kind_is_kept() {
        let style = StyleDocument::from_value(json!({
            "sources": {},
            "layers": [{ "id": "pts", "type": "circle" }]
        }))
        .unwrap();
        assert_eq!(style.layers[0].kind, LayerKind::Other("circle".to_string()));
        let back = serde_json::to_value(&style).unwrap();
        assert_eq!(back["layers"][0]["type"], "circle");
    }

    #[test]
    fn test_validate_sources() {
        let mut style = StyleDocument::from_value(sample()).unwrap();
        assert!(style.validate_sources().is_ok());

        style.layers[1].source = Some("hillshade1850".to_string());
        match style.validate_sources() {
            Err(StyleError::MissingSource { layer, source }) => {
                assert_eq!(layer, "hillshade");
                assert_eq!(source, "hillshade1850");
            }
            other => panic!("expected missing source, got {:?}", other),
        }
    }

    #[test]
    fn test_matches_selection_is_case_insensitive() {
        let style = StyleDocument::from_value(sample()).unwrap();
        let layer = &style.layers[2];
        assert!(layer.matches_selection("buildingspoly", "residential"));
        assert!(!layer.matches_selection("buildingspoly", "commercial"));
        assert!(!layer.matches_selection("Roads", "residential"));
        assert!(!style.layers[0].matches_selection("buildingspoly", "residential"));
    }

    #[test]
    fn test_is_basemap() {
        let style = StyleDocument::from_value(sample()).unwrap();
        assert!(style.layers[0].is_basemap());
        assert!(style.layers[1].is_basemap());
        assert!(!style.layers[2].is_basemap());
        assert!(LayerSpec::new("land", LayerKind::Fill).is_basemap());
    }
}
