#![warn(clippy::all)]

//! Atlas Style - A time-aware style engine for historical vector maps.
//!
//! This crate rewrites map style documents for a chosen year or range of
//! years, emphasizes one thematic type of one sub-layer, derives legend
//! swatches from the same document, and fits the camera to GeoJSON
//! geometry. It does no rendering itself: every output is plain data for a
//! renderer to consume.

pub mod geo;
pub mod state;
pub mod style;

pub use geo::{fit_bounds, parse_geojson, BoundingBox, GeometryError, Viewport, ViewportSettings};
pub use state::{AtlasState, EngineSettings, TimeSelection};
pub use style::{
    apply_highlight, apply_year_filter, compose_style, derive_legend, HighlightSelector,
    LegendEntry, LegendSwatch, StyleDocument, StyleError, YearRange,
};
