//! Camera viewport and Web Mercator fitting.
//!
//! World coordinates follow the 512 px tile convention: at zoom 0 the whole
//! world is one 512 x 512 tile, and every zoom level doubles the scale.
//! World `y` grows northward.

use geo_types::Coord;
use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::bounds::BoundingBox;

/// Edge length of a world tile in pixels at zoom 0.
pub const TILE_SIZE: f64 = 512.0;

/// Latitude limit of the Web Mercator square.
pub const MAX_LATITUDE: f64 = 85.051_129;

/// Interpolation the renderer should use for a camera transition.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// Zoom out, pan, zoom in.
    #[default]
    FlyTo,
    Linear,
}

/// Camera transition hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub duration_ms: u32,
    pub easing: Easing,
}

/// Camera position and the size of the map canvas in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    #[serde(default)]
    pub bearing: f64,
    #[serde(default)]
    pub pitch: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            longitude: 0.0,
            latitude: 0.0,
            zoom: 0.0,
            bearing: 0.0,
            pitch: 0.0,
            width: 800.0,
            height: 600.0,
            transition: None,
        }
    }
}

/// Settings for camera fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// Padding kept free on every side of the fitted box.
    pub padding_px: f64,
    pub transition_ms: u32,
    pub easing: Easing,
    /// Zoom used for boxes without extent, before clamping.
    pub fit_max_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            padding_px: 100.0,
            transition_ms: 1000,
            easing: Easing::FlyTo,
            fit_max_zoom: 24.0,
            min_zoom: 9.0,
            max_zoom: 17.0,
        }
    }
}

impl ViewportSettings {
    fn transition(&self) -> Transition {
        Transition {
            duration_ms: self.transition_ms,
            easing: self.easing,
        }
    }
}

/// Projects longitude/latitude to zoom-0 world pixels.
pub fn lng_lat_to_world(c: Coord<f64>) -> Coord<f64> {
    let lambda = c.x.to_radians();
    let phi = c.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    Coord {
        x: TILE_SIZE * (lambda + PI) / (2.0 * PI),
        y: TILE_SIZE * (PI + (PI / 4.0 + phi * 0.5).tan().ln()) / (2.0 * PI),
    }
}

/// Inverse of [`lng_lat_to_world`].
pub fn world_to_lng_lat(c: Coord<f64>) -> Coord<f64> {
    let lambda = c.x / TILE_SIZE * 2.0 * PI - PI;
    let phi = 2.0 * ((c.y / TILE_SIZE * 2.0 * PI - PI).exp().atan() - PI / 4.0);
    Coord {
        x: lambda.to_degrees(),
        y: phi.to_degrees(),
    }
}

/// Clamps `zoom` into `[min_zoom, max_zoom]`.
///
/// Swapped limits are put back in order and a NaN limit leaves that side
/// unbounded. A NaN zoom resolves to the upper limit, or the lower one when
/// the upper is unbounded.
pub fn clamp_zoom(zoom: f64, min_zoom: f64, max_zoom: f64) -> f64 {
    let lo = if min_zoom.is_nan() {
        f64::NEG_INFINITY
    } else {
        min_zoom
    };
    let hi = if max_zoom.is_nan() {
        f64::INFINITY
    } else {
        max_zoom
    };
    let (lo, hi) = if lo <= hi {
        (lo, hi)
    } else {
        log::warn!("Viewport: zoom limits swapped ({} > {})", lo, hi);
        (hi, lo)
    };
    if zoom.is_nan() {
        return if hi.is_finite() {
            hi
        } else if lo.is_finite() {
            lo
        } else {
            0.0
        };
    }
    zoom.clamp(lo, hi)
}

impl Viewport {
    /// Applies the zoom limits the host enforces on every camera change.
    pub fn clamp_zoom(&self, min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            zoom: clamp_zoom(self.zoom, min_zoom, max_zoom),
            ..self.clone()
        }
    }

    /// Same camera on a resized canvas.
    pub fn resized(&self, width: f64, height: f64, min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            width,
            height,
            ..self.clamp_zoom(min_zoom, max_zoom)
        }
    }

    pub fn with_bearing(&self, bearing: f64) -> Self {
        Self {
            bearing,
            ..self.clone()
        }
    }

    /// Longitude/latitude box currently on screen.
    ///
    /// Bearing rotates the screen corners; pitch is ignored.
    pub fn visible_bounds(&self) -> BoundingBox {
        let scale = 2f64.powf(self.zoom);
        let center = lng_lat_to_world(Coord {
            x: self.longitude,
            y: self.latitude,
        });
        let (sin, cos) = self.bearing.to_radians().sin_cos();
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);

        let corners = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(dx, dy)| {
            // screen offset (right, up) rotated into world axes
            let wx = dx * cos + dy * sin;
            let wy = -dx * sin + dy * cos;
            world_to_lng_lat(Coord {
                x: center.x + wx / scale,
                y: center.y + wy / scale,
            })
        });

        let mut bounds = BoundingBox::from_corners(corners[0], corners[0]);
        for corner in &corners[1..] {
            bounds.extend(*corner);
        }
        bounds
    }
}

/// Frames `bbox` inside the canvas of `current` and returns the new camera
/// center and unclamped zoom.
fn frame(bbox: &BoundingBox, current: &Viewport, settings: &ViewportSettings) -> (Coord<f64>, f64) {
    let nw = lng_lat_to_world(Coord {
        x: bbox.min_x,
        y: bbox.max_y,
    });
    let se = lng_lat_to_world(Coord {
        x: bbox.max_x,
        y: bbox.min_y,
    });
    let size_x = (se.x - nw.x).abs();
    let size_y = (se.y - nw.y).abs();
    let center = world_to_lng_lat(Coord {
        x: (nw.x + se.x) / 2.0,
        y: (nw.y + se.y) / 2.0,
    });

    if size_x == 0.0 && size_y == 0.0 {
        log::debug!("Viewport: degenerate bounds, using zoom {}", settings.fit_max_zoom);
        return (center, settings.fit_max_zoom);
    }

    let target = |extent: f64| -> f64 {
        let padded = extent - 2.0 * settings.padding_px;
        if padded > 0.0 {
            padded
        } else {
            log::warn!(
                "Viewport: padding {} does not fit canvas extent {}",
                settings.padding_px,
                extent
            );
            extent
        }
    };
    let scale_x = target(current.width) / size_x;
    let scale_y = target(current.height) / size_y;
    let zoom = scale_x.min(scale_y).abs().log2().min(settings.fit_max_zoom);
    (center, zoom)
}

/// Camera that frames `geometry` within `current`'s canvas.
///
/// The zoom always lands in `[min_zoom, max_zoom]`. Geometry without
/// coordinates keeps the current center. Bearing and pitch are preserved and
/// a fly-to transition hint is attached.
pub fn fit_bounds(
    geometry: &GeoJson,
    current: &Viewport,
    min_zoom: f64,
    max_zoom: f64,
    settings: &ViewportSettings,
) -> Viewport {
    let (center, zoom) = match BoundingBox::of(geometry) {
        Ok(bbox) => frame(&bbox, current, settings),
        Err(e) => {
            log::warn!("Viewport: cannot fit geometry ({}), keeping camera", e);
            (
                Coord {
                    x: current.longitude,
                    y: current.latitude,
                },
                current.zoom,
            )
        }
    };

    Viewport {
        longitude: center.x,
        latitude: center.y,
        zoom: clamp_zoom(zoom, min_zoom, max_zoom),
        transition: Some(settings.transition()),
        ..current.clone()
    }
}
