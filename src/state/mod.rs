//! Viewer state.
//!
//! [`AtlasState`] holds the inputs the host application changes (time
//! selection, highlight, camera) together with the base style, and keeps the
//! rendered style in sync with them. Each setter recomputes only what its
//! input affects.

mod settings;

pub use settings::EngineSettings;

use geojson::GeoJson;
use serde::{Deserialize, Serialize};

use crate::geo::{fit_bounds, BoundingBox, Viewport};
use crate::style::{
    compose_style, derive_legend, HighlightSelector, LegendEntry, StyleDocument, StyleError,
    YearRange,
};

/// The time the map shows: a single year or an inclusive range of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeSelection {
    Year(i32),
    Dates(YearRange),
}

impl TimeSelection {
    pub fn range(&self) -> YearRange {
        match self {
            TimeSelection::Year(year) => YearRange::single(*year),
            TimeSelection::Dates(range) => *range,
        }
    }
}

/// Root state for one map view.
#[derive(Debug, Clone)]
pub struct AtlasState {
    settings: EngineSettings,
    base_style: StyleDocument,
    time: TimeSelection,
    highlight: Option<HighlightSelector>,
    rendered: StyleDocument,
    viewport: Viewport,
    min_zoom: f64,
    max_zoom: f64,
    /// Id of the geometry the camera was last fitted to.
    fitted_geometry: Option<String>,
}

impl AtlasState {
    /// Builds the state and renders the initial style.
    ///
    /// Fails when the base style is inconsistent for the initial year.
    pub fn new(
        base_style: StyleDocument,
        time: TimeSelection,
        viewport: Viewport,
        settings: EngineSettings,
    ) -> Result<Self, StyleError> {
        let (min_zoom, max_zoom) = (settings.viewport.min_zoom, settings.viewport.max_zoom);
        let rendered = compose_style(
            &base_style,
            time.range(),
            None,
            &settings.raster,
            &settings.highlight,
        )?;
        log::info!("Atlas state initialized with {} layers", base_style.layers.len());
        Ok(Self {
            viewport: viewport.clamp_zoom(min_zoom, max_zoom),
            settings,
            base_style,
            time,
            highlight: None,
            rendered,
            min_zoom,
            max_zoom,
            fitted_geometry: None,
        })
    }

    /// Style to hand to the renderer.
    pub fn style(&self) -> &StyleDocument {
        &self.rendered
    }

    pub fn base_style(&self) -> &StyleDocument {
        &self.base_style
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn time(&self) -> TimeSelection {
        self.time
    }

    pub fn highlight(&self) -> Option<&HighlightSelector> {
        self.highlight.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn zoom_limits(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// Shows a single year. Returns whether the rendered style changed.
    pub fn set_year(&mut self, year: i32) -> Result<bool, StyleError> {
        self.set_time(TimeSelection::Year(year))
    }

    /// Shows every feature alive during `range`.
    pub fn set_dates(&mut self, range: YearRange) -> Result<bool, StyleError> {
        self.set_time(TimeSelection::Dates(range))
    }

    pub fn set_time(&mut self, time: TimeSelection) -> Result<bool, StyleError> {
        if time == self.time {
            return Ok(false);
        }
        self.rendered = self.render(time, self.highlight.as_ref())?;
        self.time = time;
        log::debug!("Time selection: {:?}", time);
        Ok(true)
    }

    /// Emphasizes one (sub-layer, type) pair, or clears emphasis with `None`.
    pub fn set_highlight(
        &mut self,
        selector: Option<HighlightSelector>,
    ) -> Result<bool, StyleError> {
        if selector == self.highlight {
            return Ok(false);
        }
        self.rendered = self.render(self.time, selector.as_ref())?;
        log::debug!("Highlight: {:?}", selector);
        self.highlight = selector;
        Ok(true)
    }

    /// Replaces the base style and re-renders it with the current inputs.
    ///
    /// On error the previous style is kept.
    pub fn set_base_style(&mut self, base_style: StyleDocument) -> Result<(), StyleError> {
        let rendered = compose_style(
            &base_style,
            self.time.range(),
            self.highlight.as_ref(),
            &self.settings.raster,
            &self.settings.highlight,
        )?;
        self.base_style = base_style;
        self.rendered = rendered;
        Ok(())
    }

    /// Fits the camera to a newly shown geometry.
    ///
    /// Showing the same `id` again leaves the camera alone, so a user who
    /// panned away is not pulled back. Returns whether the camera moved.
    pub fn show_geometry(&mut self, id: &str, geometry: &GeoJson) -> bool {
        if self.fitted_geometry.as_deref() == Some(id) {
            return false;
        }
        self.viewport = fit_bounds(
            geometry,
            &self.viewport,
            self.min_zoom,
            self.max_zoom,
            &self.settings.viewport,
        );
        self.fitted_geometry = Some(id.to_string());
        log::debug!("Fitted geometry {} at zoom {:.2}", id, self.viewport.zoom);
        true
    }

    /// Forgets the fitted geometry so the next one is fitted even if it
    /// shares the id.
    pub fn clear_geometry(&mut self) {
        self.fitted_geometry = None;
    }

    /// Accepts a camera reported by the renderer after user interaction.
    ///
    /// The zoom is clamped into range and the visible bounds are returned.
    pub fn on_viewport_change(&mut self, viewport: Viewport) -> BoundingBox {
        self.viewport = Viewport {
            transition: None,
            ..viewport.clamp_zoom(self.min_zoom, self.max_zoom)
        };
        self.viewport.visible_bounds()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = self
            .viewport
            .resized(width, height, self.min_zoom, self.max_zoom);
    }

    pub fn set_bearing(&mut self, bearing: f64) {
        self.viewport = self.viewport.with_bearing(bearing);
    }

    /// Tightens or widens the allowed zoom range and re-clamps the camera.
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.viewport = self.viewport.clamp_zoom(min_zoom, max_zoom);
    }

    pub fn visible_bounds(&self) -> BoundingBox {
        self.viewport.visible_bounds()
    }

    /// Legend rows for `layer_name`, read from the undimmed base style.
    pub fn legend<S: AsRef<str>>(
        &self,
        layer_name: &str,
        thematic_types: &[S],
    ) -> Vec<LegendEntry> {
        derive_legend(
            layer_name,
            thematic_types,
            &self.base_style,
            &self.settings.legend,
        )
    }

    fn render(
        &self,
        time: TimeSelection,
        selector: Option<&HighlightSelector>,
    ) -> Result<StyleDocument, StyleError> {
        compose_style(
            &self.base_style,
            time.range(),
            selector,
            &self.settings.raster,
            &self.settings.highlight,
        )
    }
}
