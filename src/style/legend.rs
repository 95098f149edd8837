//! Legend swatch derivation.
//!
//! A swatch is read straight out of the style document using the same
//! (sub-layer, type) matching rule as highlighting, so the legend shows what
//! the map draws.

use serde::{Deserialize, Serialize};

use super::color::{normalize, SwatchColor};
use super::document::{LayerSpec, StyleDocument};

/// The zig-zag stroke icon drawn next to line swatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeGlyph {
    pub id: &'static str,
    pub width: u32,
    pub height: u32,
    pub view_box: &'static str,
    /// Fill colour of the zig-zag shape.
    pub color: &'static str,
    pub path: &'static str,
}

impl StrokeGlyph {
    /// Standalone SVG markup for the icon.
    pub fn to_svg(&self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"{}\" width=\"{}\" \
             height=\"{}\" viewBox=\"{}\"><path fill=\"{}\" d=\"{}\"/></svg>",
            self.id, self.width, self.height, self.view_box, self.color, self.path
        )
    }
}

pub const LINE_GLYPH: StrokeGlyph = StrokeGlyph {
    id: "legend-line",
    width: 40,
    height: 20,
    view_box: "0 20 80 40",
    color: "#999",
    path: "M6.4,54.7c-1.4,0-2.7-0.5-3.6-1.4c-1-0.9-1.5-2.1-1.5-3.4c0-1.3,0.6-2.5,1.6-3.3\
           l23.5-20c0.9-0.8,2.2-1.2,3.4-1.2c1.3,0,2.6,0.5,3.6,1.4l18.3,16.7L70,26.7\
           c1-0.9,2.2-1.4,3.6-1.4c1.3,0,2.5,0.5,3.5,1.3c1,0.9,1.6,2.1,1.6,3.3\
           c0,1.3-0.5,2.5-1.5,3.4l-21.8,20c-0.9,0.8-2.2,1.3-3.6,1.3c-1.4,0-2.7-0.5-3.6-1.3\
           L29.8,36.5l-19.9,17C8.9,54.2,7.7,54.7,6.4,54.7z",
};

/// Visual sample for one thematic type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LegendSwatch {
    Polygon {
        #[serde(rename = "borderColor")]
        border_color: SwatchColor,
        #[serde(rename = "backgroundColor")]
        background_color: SwatchColor,
        #[serde(rename = "borderWidth")]
        border_width: u32,
    },
    Line {
        color: SwatchColor,
        /// Id of the stroke glyph, see [`LINE_GLYPH`].
        #[serde(rename = "strokeGlyph")]
        stroke_glyph: String,
    },
    Default {
        #[serde(rename = "backgroundColor")]
        background_color: SwatchColor,
    },
}

/// A legend row: the type label and its swatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    #[serde(rename = "type")]
    pub thematic_type: String,
    pub swatch: LegendSwatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendSettings {
    /// Background of the swatch shown when nothing matches.
    pub default_background: String,
    pub polygon_border_width: u32,
}

impl Default for LegendSettings {
    fn default() -> Self {
        Self {
            default_background: "white".to_string(),
            polygon_border_width: 2,
        }
    }
}

impl LegendSettings {
    fn default_swatch(&self) -> LegendSwatch {
        LegendSwatch::Default {
            background_color: SwatchColor::Literal(self.default_background.clone()),
        }
    }
}

/// Layers describing `thematic_type` within `layer_name`, in paint order.
///
/// Falls back to every layer of the sub-layer when none asserts the type.
pub fn candidate_layers<'a>(
    layer_name: &str,
    thematic_type: &str,
    style: &'a StyleDocument,
) -> Vec<&'a LayerSpec> {
    let typed: Vec<&LayerSpec> = style
        .layers
        .iter()
        .filter(|l| l.matches_selection(layer_name, thematic_type))
        .collect();
    if !typed.is_empty() {
        return typed;
    }
    style
        .layers
        .iter()
        .filter(|l| l.has_source_layer(layer_name))
        .collect()
}

/// Derives the swatch for one (sub-layer, type) pair.
pub fn derive_swatch(
    layer_name: &str,
    thematic_type: &str,
    style: &StyleDocument,
    settings: &LegendSettings,
) -> LegendSwatch {
    let candidates = candidate_layers(layer_name, thematic_type, style);
    let Some(first) = candidates.first() else {
        log::trace!("Legend: no layers for {}/{}", layer_name, thematic_type);
        return settings.default_swatch();
    };

    if let Some(background_color) = normalize(first.paint_value("fill-color")) {
        let border = first
            .paint_value("fill-outline-color")
            .or_else(|| candidates.get(1).and_then(|l| l.paint_value("fill-color")));
        let border_color = normalize(border).unwrap_or_else(|| background_color.clone());
        return LegendSwatch::Polygon {
            border_color,
            background_color,
            border_width: settings.polygon_border_width,
        };
    }

    // Later layers paint on top, so the last line colour is representative.
    let line_color = candidates
        .iter()
        .rev()
        .find_map(|l| normalize(l.paint_value("line-color")));
    if let Some(color) = line_color {
        return LegendSwatch::Line {
            color,
            stroke_glyph: LINE_GLYPH.id.to_string(),
        };
    }

    settings.default_swatch()
}

pub fn derive_legend_entry(
    layer_name: &str,
    thematic_type: &str,
    style: &StyleDocument,
    settings: &LegendSettings,
) -> LegendEntry {
    LegendEntry {
        thematic_type: thematic_type.to_string(),
        swatch: derive_swatch(layer_name, thematic_type, style, settings),
    }
}

/// One entry per type, in the order given.
pub fn derive_legend<S: AsRef<str>>(
    layer_name: &str,
    thematic_types: &[S],
    style: &StyleDocument,
    settings: &LegendSettings,
) -> Vec<LegendEntry> {
    thematic_types
        .iter()
        .map(|t| derive_legend_entry(layer_name, t.as_ref(), style, settings))
        .collect()
}
