//! geeplan: typed, lazy request builders for Earth Engine composites
//!
//! Scripts describe what to compute (load a boundary, filter a collection,
//! mask and derive bands, reduce over time, clip, display, export) and hand
//! the description to the platform. No pixels are processed locally.

pub mod types;
pub mod config;
pub mod core;
pub mod io;
pub mod recipes;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use crate::types::{
    BoundingBox, Crs, DateRange, GeeError, GeeResult, Geometry, ImageMetadata, TIME_START,
};

pub use crate::config::Config;
pub use crate::core::{
    Boundary, CloudMask, ExportSpec, Filter, Image, ImageCollection, MapLayer, MapView,
    NormalizedDifference, RasterStatistics, ReducerKind, Region, VisParams,
};
pub use crate::io::{EarthEngineClient, ExportTask};
pub use crate::recipes::{Recipe, RecipeParams, Script};
