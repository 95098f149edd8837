//! Style document transforms.
//!
//! Every transform takes the caller's document by reference and returns a
//! new one; nothing here mutates its input or keeps state between calls.

mod color;
mod document;
mod expr;
mod highlight;
mod legend;
mod year_filter;

pub use color::{is_recolorable, normalize, parse_rgba, to_hex, HslColor, SwatchColor};
pub use document::{
    LayerKind, LayerSpec, SourceKind, SourceSpec, StyleDocument, COMPOSITE_SOURCE,
    LAND_LAYER_ID,
};
pub use expr::{BooleanOp, ComparisonOp, Expr, MatchArm};
pub use highlight::{apply_highlight, HighlightSelector, HighlightSettings, BASE_PAINT_KEY};
pub use legend::{
    candidate_layers, derive_legend, derive_legend_entry, derive_swatch, LegendEntry,
    LegendSettings, LegendSwatch, StrokeGlyph, LINE_GLYPH,
};
pub use year_filter::{
    apply_year_filter, RasterFallback, RasterSettings, YearRange, BASE_VISIBILITY_KEY,
    FIRST_YEAR_PROPERTY, LAST_YEAR_PROPERTY,
};

/// Errors raised by style transforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    /// A layer names a source the document does not declare.
    MissingSource { layer: String, source: String },
    /// A year range whose start is after its end.
    InvalidRange { min_year: i32, max_year: i32 },
    /// A document or settings payload could not be (de)serialized.
    Parse(String),
}

impl std::fmt::Display for StyleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StyleError::MissingSource { layer, source } => {
                write!(f, "Layer {} references missing source {}", layer, source)
            }
            StyleError::InvalidRange { min_year, max_year } => {
                write!(f, "Invalid year range: {} > {}", min_year, max_year)
            }
            StyleError::Parse(msg) => write!(f, "Style parse error: {}", msg),
        }
    }
}

impl std::error::Error for StyleError {}

/// The style handed to the renderer: the year window first, then emphasis.
pub fn compose_style(
    base: &StyleDocument,
    range: YearRange,
    selector: Option<&HighlightSelector>,
    raster: &RasterSettings,
    highlight: &HighlightSettings,
) -> Result<StyleDocument, StyleError> {
    let filtered = apply_year_filter(base, range, raster)?;
    apply_highlight(&filtered, selector, highlight)
}
