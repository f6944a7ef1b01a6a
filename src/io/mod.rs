//! I/O modules for the Earth Engine REST API and exported rasters

pub mod client;
#[cfg(feature = "gdal")]
pub mod raster;

pub use client::{EarthEngineClient, ExportTask, MapId};
#[cfg(feature = "gdal")]
pub use raster::{summarize_folder, summarize_raster, write_report, RasterReport};
