//! Time-window filtering of a style document.
//!
//! Dated vector features carry a `firstyear`/`lastyear` validity interval.
//! A layer drawn from the composite source is restricted to features whose
//! interval overlaps the selected years; basemap rasters published per
//! epoch (`hillshade1900`, `hillshade1950`, ...) are switched to the newest
//! edition not after the selected years.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::{LayerSpec, StyleDocument};
use super::expr::{BooleanOp, ComparisonOp, Expr};
use super::StyleError;

/// Feature property holding the first year a feature exists.
pub const FIRST_YEAR_PROPERTY: &str = "firstyear";
/// Feature property holding the last year a feature exists.
pub const LAST_YEAR_PROPERTY: &str = "lastyear";

/// Metadata key holding the `visibility` a raster layer had before
/// [`RasterFallback::Hide`] overwrote it.
pub const BASE_VISIBILITY_KEY: &str = "atlas:base-visibility";

const VISIBILITY: &str = "visibility";

/// Inclusive `[min_year, max_year]` selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[i32; 2]", into = "[i32; 2]")]
pub struct YearRange {
    min_year: i32,
    max_year: i32,
}

impl YearRange {
    pub fn new(min_year: i32, max_year: i32) -> Result<Self, StyleError> {
        if min_year > max_year {
            return Err(StyleError::InvalidRange { min_year, max_year });
        }
        Ok(Self { min_year, max_year })
    }

    /// The degenerate range a single year control selects.
    pub fn single(year: i32) -> Self {
        Self {
            min_year: year,
            max_year: year,
        }
    }

    pub fn min_year(&self) -> i32 {
        self.min_year
    }

    pub fn max_year(&self) -> i32 {
        self.max_year
    }

    /// Interval overlap, inclusive on both ends.
    pub fn overlaps(&self, first_year: i32, last_year: i32) -> bool {
        first_year <= self.max_year && last_year >= self.min_year
    }
}

impl TryFrom<[i32; 2]> for YearRange {
    type Error = StyleError;

    fn try_from([min_year, max_year]: [i32; 2]) -> Result<Self, Self::Error> {
        Self::new(min_year, max_year)
    }
}

impl From<YearRange> for [i32; 2] {
    fn from(range: YearRange) -> Self {
        [range.min_year, range.max_year]
    }
}

/// What to do with a time-varying raster layer when every edition is newer
/// than the selected years.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RasterFallback {
    /// Leave the layer pointing at whatever the base style names.
    #[default]
    KeepCurrent,
    /// Use the oldest edition available.
    Earliest,
    /// Set the layer's `visibility` layout property to `none`.
    Hide,
}

/// Settings for time-varying raster selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    /// Name fragment shared by all editions of a time-varying raster.
    pub source_prefix: String,
    pub fallback: RasterFallback,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            source_prefix: "hillshade".to_string(),
            fallback: RasterFallback::default(),
        }
    }
}

impl RasterSettings {
    /// Returns true if `source` follows the time-varying raster convention.
    pub fn is_time_varying(&self, source: &str) -> bool {
        !self.source_prefix.is_empty() && source.contains(self.source_prefix.as_str())
    }

    /// Year embedded in a source name: all of its digits, read as a number.
    pub fn embedded_year(&self, source: &str) -> Option<i32> {
        if !self.is_time_varying(source) {
            return None;
        }
        let digits: String = source.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

/// Restricts every dated layer of `style` to `range`.
///
/// Returns a new document; `style` is left untouched. Re-applying the same
/// range to the output yields the same document.
pub fn apply_year_filter(
    style: &StyleDocument,
    range: YearRange,
    settings: &RasterSettings,
) -> Result<StyleDocument, StyleError> {
    style.validate_sources()?;

    let mut editions: Vec<(i32, &str)> = style
        .sources
        .keys()
        .filter_map(|name| settings.embedded_year(name).map(|y| (y, name.as_str())))
        .collect();
    editions.sort();

    let layers = style
        .layers
        .iter()
        .map(|layer| {
            let mut layer = layer.clone();
            if layer.is_composite() && !layer.is_basemap() {
                layer.filter = Some(year_window_filter(&layer, range));
            } else if layer
                .source
                .as_deref()
                .is_some_and(|s| settings.is_time_varying(s))
            {
                select_edition(&mut layer, &editions, range, settings.fallback);
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

/// `["all", firstyear <= max, lastyear >= min, ...remaining clauses]`
fn year_window_filter(layer: &LayerSpec, range: YearRange) -> Value {
    let remaining: Vec<Expr> = match layer.filter_expr() {
        None => Vec::new(),
        Some(Expr::Boolean {
            op: BooleanOp::All,
            operands,
        }) => operands.into_iter().filter(|e| !e.is_range_bound()).collect(),
        Some(expr) if expr.is_range_bound() => Vec::new(),
        Some(expr) => vec![expr],
    };

    let mut operands = Vec::with_capacity(remaining.len() + 2);
    operands.push(Expr::compare(
        ComparisonOp::Le,
        Expr::get(FIRST_YEAR_PROPERTY),
        Expr::literal(range.max_year()),
    ));
    operands.push(Expr::compare(
        ComparisonOp::Ge,
        Expr::get(LAST_YEAR_PROPERTY),
        Expr::literal(range.min_year()),
    ));
    operands.extend(remaining);

    Expr::Boolean {
        op: BooleanOp::All,
        operands,
    }
    .to_value()
}

/// Points a time-varying raster layer at the newest edition not after
/// `range.max_year()`. `editions` is sorted by year.
fn select_edition(
    layer: &mut LayerSpec,
    editions: &[(i32, &str)],
    range: YearRange,
    fallback: RasterFallback,
) {
    restore_visibility(layer);

    let newest = editions
        .iter()
        .rev()
        .find(|(year, _)| *year <= range.max_year());

    match (newest, fallback) {
        (Some((_, name)), _) => swap_source(layer, name),
        (None, RasterFallback::KeepCurrent) => {
            log::debug!(
                "YearFilter: no edition of {:?} before {}, keeping current source",
                layer.source,
                range.max_year()
            );
        }
        (None, RasterFallback::Earliest) => {
            if let Some((_, name)) = editions.first() {
                swap_source(layer, name);
            }
        }
        (None, RasterFallback::Hide) => {
            log::debug!(
                "YearFilter: hiding layer {} (no edition before {})",
                layer.id,
                range.max_year()
            );
            hide(layer);
        }
    }
}

/// Hides the layer, remembering the authored visibility.
fn hide(layer: &mut LayerSpec) {
    let original = layer
        .layout
        .get_or_insert_with(Map::new)
        .insert(VISIBILITY.to_string(), Value::from("none"))
        .unwrap_or(Value::Null);
    layer
        .metadata
        .get_or_insert_with(Map::new)
        .insert(BASE_VISIBILITY_KEY.to_string(), original);
}

/// Undoes a previous [`hide`].
fn restore_visibility(layer: &mut LayerSpec) {
    let Some(original) = layer
        .metadata
        .as_mut()
        .and_then(|m| m.remove(BASE_VISIBILITY_KEY))
    else {
        return;
    };
    if layer.metadata.as_ref().is_some_and(Map::is_empty) {
        layer.metadata = None;
    }

    let layout = layer.layout.get_or_insert_with(Map::new);
    if original.is_null() {
        layout.remove(VISIBILITY);
    } else {
        layout.insert(VISIBILITY.to_string(), original);
    }
    if layout.is_empty() {
        layer.layout = None;
    }
}

fn swap_source(layer: &mut LayerSpec, name: &str) {
    if layer.source.as_deref() != Some(name) {
        log::debug!(
            "YearFilter: layer {} source {:?} -> {}",
            layer.id,
            layer.source,
            name
        );
        layer.source = Some(name.to_string());
    }
}
