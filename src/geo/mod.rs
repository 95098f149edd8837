//! Geographic helpers for camera placement.
//!
//! This module computes extents of caller-supplied GeoJSON and the camera
//! viewport that frames them. Nothing here animates the camera; transitions
//! are returned as hints for the renderer.

mod bounds;
mod viewport;

pub use bounds::{parse_geojson, BoundingBox, GeometryError};
pub use viewport::{
    clamp_zoom, fit_bounds, lng_lat_to_world, world_to_lng_lat, Easing, Transition, Viewport,
    ViewportSettings, MAX_LATITUDE, TILE_SIZE,
};
