//! Emphasis of one thematic selection.
//!
//! Layers matching the selected (sub-layer, type) pair stay fully opaque and
//! active fills are darkened; every other dated layer is dimmed. Basemap
//! chrome is never touched.
//!
//! Every paint value the transform overwrites is stashed in the layer's
//! metadata under [`BASE_PAINT_KEY`] and restored before the next
//! application, so highlighting an already highlighted document (or clearing
//! the selection on one) behaves as if it were applied to the base style.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::color::{is_recolorable, HslColor};
use super::document::{LayerKind, LayerSpec, StyleDocument, LAND_LAYER_ID};
use super::StyleError;

/// Metadata key holding the pre-highlight paint values of a layer.
pub const BASE_PAINT_KEY: &str = "atlas:base-paint";

const FILL_COLOR: &str = "fill-color";
const FILL_OPACITY: &str = "fill-opacity";
const LINE_OPACITY: &str = "line-opacity";
const SYMBOL_OPACITY: [&str; 2] = ["text-opacity", "icon-opacity"];

/// The (sub-layer, thematic type) pair to emphasize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighlightSelector {
    #[serde(rename = "layer")]
    pub layer_name: String,
    #[serde(rename = "type")]
    pub thematic_type: String,
}

impl HighlightSelector {
    pub fn new(layer_name: impl Into<String>, thematic_type: impl Into<String>) -> Self {
        Self {
            layer_name: layer_name.into(),
            thematic_type: thematic_type.into(),
        }
    }

    pub fn matches(&self, layer: &LayerSpec) -> bool {
        layer.matches_selection(&self.layer_name, &self.thematic_type)
    }
}

/// Opacity and exemption settings for highlighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightSettings {
    pub active_opacity: f64,
    pub dim_opacity: f64,
    /// Saturation and lightness reduction for active fill colours.
    pub emphasis_step: f64,
    pub exempt_layer_ids: Vec<String>,
    /// Source layers that are basemap content despite coming from the
    /// composite source.
    pub exempt_source_layers: Vec<String>,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            active_opacity: 1.0,
            dim_opacity: 0.2,
            emphasis_step: 0.2,
            exempt_layer_ids: vec![LAND_LAYER_ID.to_string()],
            exempt_source_layers: vec!["groundcoverpoly".to_string()],
        }
    }
}

impl HighlightSettings {
    pub fn is_exempt(&self, layer: &LayerSpec) -> bool {
        layer.kind.is_chrome()
            || self.exempt_layer_ids.iter().any(|id| *id == layer.id)
            || self
                .exempt_source_layers
                .iter()
                .any(|name| layer.has_source_layer(name))
    }
}

/// Emphasizes `selector` in a copy of `style`; `None` clears any emphasis.
pub fn apply_highlight(
    style: &StyleDocument,
    selector: Option<&HighlightSelector>,
    settings: &HighlightSettings,
) -> Result<StyleDocument, StyleError> {
    style.validate_sources()?;

    let layers = style
        .layers
        .iter()
        .map(|layer| {
            if settings.is_exempt(layer) {
                return layer.clone();
            }
            let mut layer = layer.clone();
            restore_base_paint(&mut layer);
            if let Some(selector) = selector {
                let active = selector.matches(&layer);
                log::debug!(
                    "Highlight: layer {} {}",
                    layer.id,
                    if active { "active" } else { "dimmed" }
                );
                emphasize(&mut layer, active, settings);
            }
            layer
        })
        .collect();

    Ok(StyleDocument {
        sources: style.sources.clone(),
        layers,
        extra: style.extra.clone(),
    })
}

fn emphasize(layer: &mut LayerSpec, active: bool, settings: &HighlightSettings) {
    let opacity = if active {
        settings.active_opacity
    } else {
        settings.dim_opacity
    };

    match layer.kind {
        LayerKind::Fill => emphasize_fill(layer, active, opacity, settings),
        LayerKind::Line => set_paint(layer, LINE_OPACITY, opacity.into()),
        LayerKind::Symbol => {
            for key in SYMBOL_OPACITY {
                set_paint(layer, key, opacity.into());
            }
        }
        _ => {}
    }
}

/// Fills carry opacity in `fill-opacity` when the style sets it, otherwise
/// in the alpha channel of a literal `fill-color`. Data-driven colours are
/// never rewritten; without an explicit opacity they fall back to
/// `fill-opacity`.
fn emphasize_fill(
    layer: &mut LayerSpec,
    active: bool,
    opacity: f64,
    settings: &HighlightSettings,
) {
    let explicit_opacity = layer.paint_value(FILL_OPACITY).is_some();
    let color = layer
        .paint_value(FILL_COLOR)
        .and_then(Value::as_str)
        .filter(|s| is_recolorable(s))
        .and_then(HslColor::parse);

    match color {
        Some(hsl) if active => {
            let emphasized = hsl.emphasized(settings.emphasis_step);
            set_paint(layer, FILL_COLOR, emphasized.to_string().into());
        }
        Some(hsl) if !explicit_opacity => {
            let dimmed = hsl.with_alpha(settings.dim_opacity);
            set_paint(layer, FILL_COLOR, dimmed.to_string().into());
        }
        Some(_) => {}
        None if !explicit_opacity => set_paint(layer, FILL_OPACITY, opacity.into()),
        None => {}
    }

    if explicit_opacity {
        set_paint(layer, FILL_OPACITY, opacity.into());
    }
}

/// Writes a paint value, remembering the first value it replaced.
fn set_paint(layer: &mut LayerSpec, key: &str, value: Value) {
    let original = layer.paint_value(key).cloned().unwrap_or(Value::Null);
    let stash = layer
        .metadata
        .get_or_insert_with(Map::new)
        .entry(BASE_PAINT_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(stash) = stash {
        stash.entry(key).or_insert(original);
    }
    layer.paint_mut().insert(key.to_string(), value);
}

/// Puts back the paint values stashed by a previous application.
fn restore_base_paint(layer: &mut LayerSpec) {
    let stash = match layer.metadata.as_mut().and_then(|m| m.remove(BASE_PAINT_KEY)) {
        Some(Value::Object(stash)) => stash,
        _ => return,
    };
    if layer.metadata.as_ref().is_some_and(Map::is_empty) {
        layer.metadata = None;
    }

    let paint = layer.paint_mut();
    for (key, value) in stash {
        if value.is_null() {
            paint.remove(&key);
        } else {
            paint.insert(key, value);
        }
    }
    if paint.is_empty() {
        layer.paint = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn style() -> StyleDocument {
        StyleDocument::from_value(json!({
            "version": 8,
            "sources": {
                "composite": { "type": "vector" },
                "hillshade1950": { "type": "raster" }
            },
            "layers": [
                {
                    "id": "background",
                    "type": "background",
                    "paint": { "background-color": "#f8f4f0" }
                },
                {
                    "id": "hillshade",
                    "type": "raster",
                    "source": "hillshade1950",
                    "paint": { "raster-opacity": 0.5 }
                },
                {
                    "id": "land",
                    "type": "fill",
                    "source": "composite",
                    "source-layer": "Land",
                    "paint": { "fill-color": "#e0dccc" }
                },
                {
                    "id": "groundcover",
                    "type": "fill",
                    "source": "composite",
                    "source-layer": "GroundCoverPoly",
                    "filter": ["==", ["get", "type"], "residential"],
                    "paint": { "fill-color": "#cfe3c0" }
                },
                {
                    "id": "buildings-residential",
                    "type": "fill",
                    "source": "composite",
                    "source-layer": "Buildings",
                    "filter": ["all", ["==", ["get", "type"], "residential"]],
                    "paint": { "fill-color": "hsl(30, 60%, 50%)", "fill-opacity": 0.8 }
                },
                {
                    "id": "buildings-outline",
                    "type": "line",
                    "source": "composite",
                    "source-layer": "buildings",
                    "filter": ["all", ["==", ["get", "type"], "residential"]],
                    "paint": { "line-color": "#8a6a40" }
                },
                {
                    "id": "buildings-commercial",
                    "type": "fill",
                    "source": "composite",
                    "source-layer": "Buildings",
                    "filter": ["all", ["==", ["get", "type"], "commercial"]],
                    "paint": { "fill-color": "#336699" }
                },
                {
                    "id": "buildings-data-driven",
                    "type": "fill",
                    "source": "composite",
                    "source-layer": "Buildings",
                    "paint": { "fill-color": ["get", "color"] }
                },
                {
                    "id": "roads",
                    "type": "line",
                    "source": "composite",
                    "source-layer": "Roads",
                    "filter": ["all", ["==", ["get", "type"], "primary"]],
                    "paint": { "line-color": "#999" }
                },
                {
                    "id": "labels",
                    "type": "symbol",
                    "source": "composite",
                    "source-layer": "Buildings",
                    "filter": ["all", ["==", ["get", "type"], "residential"]],
                    "layout": { "text-field": ["get", "name"] }
                }
            ]
        }))
        .unwrap()
    }

    fn opacity(layer: &LayerSpec, key: &str) -> f64 {
        layer
            .paint_value(key)
            .and_then(Value::as_f64)
            .unwrap_or(1.0)
    }

    fn residential() -> HighlightSelector {
        HighlightSelector::new("Buildings", "residential")
    }

    #[test]
    fn test_active_and_dimmed_opacity() {
        let settings = HighlightSettings::default();
        let out = apply_highlight(&style(), Some(&residential()), &settings).unwrap();

        let fill = out.layer("buildings-residential").unwrap();
        assert_eq!(opacity(fill, "fill-opacity"), 1.0);
        assert_eq!(fill.paint_value("fill-color"), Some(&json!("hsl(30, 40%, 30%)")));

        let outline = out.layer("buildings-outline").unwrap();
        assert_eq!(opacity(outline, "line-opacity"), 1.0);

        let labels = out.layer("labels").unwrap();
        assert_eq!(opacity(labels, "text-opacity"), 1.0);
        assert_eq!(opacity(labels, "icon-opacity"), 1.0);

        let roads = out.layer("roads").unwrap();
        assert_eq!(opacity(roads, "line-opacity"), 0.2);

        // no explicit fill-opacity: dimmed through the colour's alpha
        let commercial = out.layer("buildings-commercial").unwrap();
        assert_eq!(
            commercial.paint_value("fill-color"),
            Some(&json!("hsla(210, 50%, 40%, 0.2)"))
        );
        assert_eq!(commercial.paint_value("fill-opacity"), None);

        // data-driven colour is left alone, opacity carries the dimming
        let data_driven = out.layer("buildings-data-driven").unwrap();
        assert_eq!(data_driven.paint_value("fill-color"), Some(&json!(["get", "color"])));
        assert_eq!(opacity(data_driven, "fill-opacity"), 0.2);
    }

    #[test]
    fn test_clearing_restores_full_opacity() {
        let settings = HighlightSettings::default();
        let base = style();
        let highlighted = apply_highlight(&base, Some(&residential()), &settings).unwrap();
        let cleared = apply_highlight(&highlighted, None, &settings).unwrap();

        assert_eq!(cleared, base);
        for layer in cleared.layers.iter().filter(|l| !settings.is_exempt(l)) {
            let key = match layer.kind {
                LayerKind::Fill => "fill-opacity",
                LayerKind::Line => "line-opacity",
                _ => "text-opacity",
            };
            assert!(opacity(layer, key) >= 0.8, "{}", layer.id);
        }
    }

    #[test]
    fn test_none_on_base_is_identity() {
        let base = style();
        let out = apply_highlight(&base, None, &HighlightSettings::default()).unwrap();
        assert_eq!(out, base);
    }

    #[test]
    fn test_idempotent_and_switchable() {
        let settings = HighlightSettings::default();
        let once = apply_highlight(&style(), Some(&residential()), &settings).unwrap();
        let twice = apply_highlight(&once, Some(&residential()), &settings).unwrap();
        assert_eq!(once, twice);

        let roads = HighlightSelector::new("roads", "primary");
        let switched = apply_highlight(&once, Some(&roads), &settings).unwrap();
        let direct = apply_highlight(&style(), Some(&roads), &settings).unwrap();
        assert_eq!(switched, direct);
    }

    #[test]
    fn test_exempt_layers_untouched() {
        let settings = HighlightSettings::default();
        let base = style();
        let roads = HighlightSelector::new("Roads", "primary");
        for selector in [None, Some(residential()), Some(roads)] {
            let out = apply_highlight(&base, selector.as_ref(), &settings).unwrap();
            for id in ["background", "hillshade", "land", "groundcover"] {
                assert_eq!(
                    serde_json::to_string(out.layer(id).unwrap()).unwrap(),
                    serde_json::to_string(base.layer(id).unwrap()).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_input_is_not_mutated() {
        let base = style();
        let snapshot = base.clone();
        let _ = apply_highlight(&base, Some(&residential()), &HighlightSettings::default());
        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_layer_without_type_clause_is_never_active() {
        let out = apply_highlight(
            &style(),
            Some(&HighlightSelector::new("Buildings", "color")),
            &HighlightSettings::default(),
        )
        .unwrap();
        let data_driven = out.layer("buildings-data-driven").unwrap();
        assert_eq!(opacity(data_driven, "fill-opacity"), 0.2);
    }

    #[test]
    fn test_missing_source_is_rejected() {
        let mut base = style();
        base.layers[1].source = Some("hillshade1850".to_string());
        for selector in [None, Some(residential())] {
            match apply_highlight(&base, selector.as_ref(), &HighlightSettings::default()) {
                Err(StyleError::MissingSource { layer, source }) => {
                    assert_eq!(layer, "hillshade");
                    assert_eq!(source, "hillshade1850");
                }
                other => panic!("expected missing source, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_selector_serde() {
        let selector: HighlightSelector =
            serde_json::from_value(json!({ "layer": "Buildings", "type": "residential" })).unwrap();
        assert_eq!(selector, residential());
    }
}
