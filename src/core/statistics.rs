//! Descriptive statistics for exported single-band rasters.

use ndarray::Array2;
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Statistics parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsParams {
    /// Number of equal-width histogram bins
    pub histogram_bins: usize,
}

impl Default for StatisticsParams {
    fn default() -> Self {
        Self { histogram_bins: 50 }
    }
}

/// Summary of the valid pixels of one band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterStatistics {
    pub count: usize,
    pub missing: usize,
    pub percent_missing: f64,
    pub cardinality: usize,
    pub min: f64,
    pub first_quartile: f64,
    pub mean: f64,
    pub median: f64,
    /// Most frequent value; the smallest one on ties
    pub mode: f64,
    pub third_quartile: f64,
    pub max: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

/// Equal-width histogram; the last bin is closed on the right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl RasterStatistics {
    /// Summarise a band, treating `nodata`, NaN and infinities as missing.
    ///
    /// Returns `None` when no valid pixel remains.
    pub fn compute<T: Float>(band: &Array2<T>, nodata: Option<T>) -> Option<Self> {
        let total = band.len();
        let mut values = valid_values(band, nodata);
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.total_cmp(b));

        let count = values.len();
        let missing = total - count;
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            count,
            missing,
            percent_missing: missing as f64 / total as f64 * 100.0,
            cardinality: cardinality(&values),
            min: values[0],
            first_quartile: percentile(&values, 25.0),
            mean,
            median: percentile(&values, 50.0),
            mode: mode(&values),
            third_quartile: percentile(&values, 75.0),
            max: values[count - 1],
            std_dev: variance.sqrt(),
        })
    }

    /// Rows in display order, as written to reports
    pub fn rows(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("Count", self.count as f64),
            ("Missing Values", self.missing as f64),
            ("% Missing", self.percent_missing),
            ("Cardinality", self.cardinality as f64),
            ("Min", self.min),
            ("1st Quartile", self.first_quartile),
            ("Mean", self.mean),
            ("Median", self.median),
            ("Mode", self.mode),
            ("3rd Quartile", self.third_quartile),
            ("Max", self.max),
            ("Std Dev", self.std_dev),
        ]
    }
}

impl Histogram {
    /// Histogram of the valid pixels; `None` when there are none or `bins` is 0
    pub fn compute<T: Float>(band: &Array2<T>, nodata: Option<T>, bins: usize) -> Option<Self> {
        let values = valid_values(band, nodata);
        if values.is_empty() || bins == 0 {
            return None;
        }
        let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for v in values {
            let index = (((v - lo) / width) as usize).min(bins - 1);
            counts[index] += 1;
        }
        Some(Self { edges, counts })
    }
}

fn valid_values<T: Float>(band: &Array2<T>, nodata: Option<T>) -> Vec<f64> {
    band.iter()
        .filter(|v| v.is_finite() && Some(**v) != nodata)
        .filter_map(|v| v.to_f64())
        .collect()
}

/// Linear-interpolated percentile of sorted values
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

fn cardinality(sorted: &[f64]) -> usize {
    let mut unique = sorted.to_vec();
    unique.dedup();
    unique.len()
}

fn mode(sorted: &[f64]) -> f64 {
    let mut best = (sorted[0], 0usize);
    let mut run = (sorted[0], 0usize);
    for &v in sorted {
        if v == run.0 {
            run.1 += 1;
        } else {
            run = (v, 1);
        }
        if run.1 > best.1 {
            best = run;
        }
    }
    best.0
}
