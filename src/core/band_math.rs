//! Normalized-difference band derivation (NDVI and friends).

use crate::core::collection::Image;

/// `(a - b) / (a + b)` clamped to `[-1, 1]`.
///
/// `None` when the denominator is zero or either input is not finite.
pub fn normalized_difference(a: f64, b: f64) -> Option<f64> {
    if !(a.is_finite() && b.is_finite()) {
        return None;
    }
    let sum = a + b;
    if sum == 0.0 {
        return None;
    }
    Some(((a - b) / sum).clamp(-1.0, 1.0))
}

/// NDVI from near-infrared and red reflectance
pub fn ndvi(nir: f64, red: f64) -> Option<f64> {
    normalized_difference(nir, red)
}

/// Named normalized-difference band derived from two existing bands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDifference {
    pub first: String,
    pub second: String,
    pub name: String,
}

impl NormalizedDifference {
    pub fn new(first: &str, second: &str, name: &str) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
            name: name.to_string(),
        }
    }

    /// Sentinel-2 NDVI: (B8 - B4) / (B8 + B4)
    pub fn ndvi() -> Self {
        Self::new("B8", "B4", "NDVI")
    }

    /// Sentinel-2 NDWI (McFeeters): (B3 - B8) / (B3 + B8)
    pub fn ndwi() -> Self {
        Self::new("B3", "B8", "NDWI")
    }

    /// Sentinel-2 normalized burn ratio: (B8 - B12) / (B8 + B12)
    pub fn nbr() -> Self {
        Self::new("B8", "B12", "NBR")
    }

    /// The derived band alone, renamed
    pub fn compute(&self, image: &Image) -> Image {
        image
            .normalized_difference(&self.first, &self.second)
            .rename(&[self.name.as_str()])
    }

    /// Original bands plus the derived band
    pub fn add_to(&self, image: Image) -> Image {
        let derived = self.compute(&image);
        image.add_bands(&derived)
    }
}

impl Default for NormalizedDifference {
    fn default() -> Self {
        Self::ndvi()
    }
}
