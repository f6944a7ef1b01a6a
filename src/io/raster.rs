//! Statistics for folders of exported GeoTIFFs.

use crate::core::statistics::{Histogram, RasterStatistics, StatisticsParams};
use crate::types::{GeeError, GeeResult};
use gdal::Dataset;
use ndarray::Array2;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Statistics of one raster file
#[derive(Debug, Clone, Serialize)]
pub struct RasterReport {
    pub file: String,
    pub statistics: RasterStatistics,
    pub histogram: Histogram,
}

/// Read the first band of a raster with its nodata value
pub fn read_band<P: AsRef<Path>>(path: P) -> GeeResult<(Array2<f64>, Option<f64>)> {
    log::debug!("Reading raster: {}", path.as_ref().display());
    let dataset = Dataset::open(path.as_ref())?;
    let (width, height) = dataset.raster_size();

    let band = dataset.rasterband(1)?;
    let nodata = band.no_data_value();
    let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;

    let data = Array2::from_shape_vec((height, width), buffer.data)
        .map_err(|e| GeeError::Raster(format!("Failed to reshape band: {}", e)))?;
    Ok((data, nodata))
}

/// Summarise one raster; `Ok(None)` when it holds no valid pixel
pub fn summarize_raster<P: AsRef<Path>>(
    path: P,
    params: &StatisticsParams,
) -> GeeResult<Option<RasterReport>> {
    let path = path.as_ref();
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let (band, nodata) = read_band(path)?;
    let statistics = match RasterStatistics::compute(&band, nodata) {
        Some(s) => s,
        None => {
            log::warn!("Skipping {}: no valid data", file);
            return Ok(None);
        }
    };
    let histogram = Histogram::compute(&band, nodata, params.histogram_bins).ok_or_else(|| {
        GeeError::Raster(format!("Histogram needs at least one bin, got {}", params.histogram_bins))
    })?;

    Ok(Some(RasterReport {
        file,
        statistics,
        histogram,
    }))
}

/// `.tif` files directly inside `folder`, sorted by name
pub fn list_tiffs<P: AsRef<Path>>(folder: P) -> GeeResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder.as_ref())? {
        let path = entry?.path();
        let is_tiff = path
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case("tif"))
            .unwrap_or(false);
        if path.is_file() && is_tiff {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Summarise every `.tif` in `folder`. Rasters without valid data are skipped.
pub fn summarize_folder<P: AsRef<Path>>(
    folder: P,
    params: &StatisticsParams,
) -> GeeResult<Vec<RasterReport>> {
    let folder = folder.as_ref();
    if !folder.is_dir() {
        return Err(GeeError::InvalidParameter(format!(
            "Not a directory: {}",
            folder.display()
        )));
    }

    let files = list_tiffs(folder)?;
    if files.is_empty() {
        return Err(GeeError::InvalidParameter(format!(
            "No .tif files found in {}",
            folder.display()
        )));
    }
    log::info!("Summarising {} rasters in {}", files.len(), folder.display());

    #[cfg(feature = "parallel")]
    let results: Vec<GeeResult<Option<RasterReport>>> =
        files.par_iter().map(|f| summarize_raster(f, params)).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<GeeResult<Option<RasterReport>>> =
        files.iter().map(|f| summarize_raster(f, params)).collect();

    let mut reports = Vec::new();
    for result in results {
        if let Some(report) = result? {
            reports.push(report);
        }
    }
    Ok(reports)
}

/// Write reports as pretty JSON
pub fn write_report<P: AsRef<Path>>(path: P, reports: &[RasterReport]) -> GeeResult<()> {
    let text = serde_json::to_string_pretty(reports)?;
    std::fs::write(path.as_ref(), text)?;
    log::info!("Report saved to: {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_folder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert!(list_tiffs(dir.path()).unwrap().is_empty());
        assert!(summarize_folder(dir.path(), &StatisticsParams::default()).is_err());
    }

    #[test]
    fn test_list_tiffs_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.TIF"), "").unwrap();
        std::fs::write(dir.path().join("a.tif"), "").unwrap();
        std::fs::write(dir.path().join("c.tiff"), "").unwrap();

        let names: Vec<String> = list_tiffs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.tif", "b.TIF"]);
    }

    #[test]
    fn test_missing_folder() {
        assert!(summarize_folder("/nonexistent/rasters", &StatisticsParams::default()).is_err());
    }
}
