use crate::core::collection::Image;
use crate::types::{GeeError, GeeResult, TIME_START};
use regex::Regex;

/// Bit-flag cloud masking parameters.
///
/// Defaults describe the Sentinel-2 `QA60` band: bit 10 opaque clouds,
/// bit 11 cirrus, reflectance stored as DN * 10000.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudMask {
    /// Bit-packed quality band
    pub qa_band: String,
    pub cloud_bit: u32,
    pub cirrus_bit: u32,
    /// Divisor turning stored DN into reflectance
    pub scale_divisor: f64,
    /// Regular expression of the bands kept after masking
    pub band_pattern: String,
    /// Metadata properties carried over from the source image
    pub preserved_properties: Vec<String>,
}

impl Default for CloudMask {
    fn default() -> Self {
        Self {
            qa_band: "QA60".to_string(),
            cloud_bit: 10,
            cirrus_bit: 11,
            scale_divisor: 10000.0,
            band_pattern: "B.*".to_string(),
            preserved_properties: vec![TIME_START.to_string()],
        }
    }
}

impl CloudMask {
    /// Sentinel-2 `QA60` mask
    pub fn sentinel2() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> GeeResult<()> {
        if self.cloud_bit >= 32 || self.cirrus_bit >= 32 {
            return Err(GeeError::InvalidParameter(format!(
                "Quality bits must be below 32, got {} and {}",
                self.cloud_bit, self.cirrus_bit
            )));
        }
        if !(self.scale_divisor.is_finite() && self.scale_divisor != 0.0) {
            return Err(GeeError::InvalidParameter(format!(
                "Invalid reflectance divisor: {}",
                self.scale_divisor
            )));
        }
        self.band_regex().map(|_| ())
    }

    /// Out-of-range bits select nothing; `validate` reports them
    fn cloud_mask(&self) -> u32 {
        1u32.checked_shl(self.cloud_bit).unwrap_or(0)
    }

    fn cirrus_mask(&self) -> u32 {
        1u32.checked_shl(self.cirrus_bit).unwrap_or(0)
    }

    /// True when neither the cloud nor the cirrus flag is set
    pub fn is_clear(&self, qa: u32) -> bool {
        qa & self.cloud_mask() == 0 && qa & self.cirrus_mask() == 0
    }

    pub fn scale_reflectance(&self, dn: f64) -> f64 {
        dn / self.scale_divisor
    }

    fn band_regex(&self) -> GeeResult<Regex> {
        Regex::new(&format!("^(?:{})$", self.band_pattern)).map_err(|e| {
            GeeError::InvalidParameter(format!("Invalid band pattern '{}': {}", self.band_pattern, e))
        })
    }

    /// Band names that survive the selection step
    pub fn retained_bands<S: AsRef<str>>(&self, bands: &[S]) -> GeeResult<Vec<String>> {
        let regex = self.band_regex()?;
        Ok(bands
            .iter()
            .map(|b| b.as_ref())
            .filter(|b| regex.is_match(b))
            .map(str::to_string)
            .collect())
    }

    /// Per-image transform: mask flagged pixels, rescale, keep matching bands
    /// and the preserved properties
    pub fn apply(&self, image: Image) -> Image {
        let qa = image.select(&[self.qa_band.as_str()]);
        let clear = qa
            .bitwise_and(self.cloud_mask())
            .eq_value(0.0)
            .and(&qa.bitwise_and(self.cirrus_mask()).eq_value(0.0));

        image
            .update_mask(&clear)
            .divide(self.scale_divisor)
            .select(&[self.band_pattern.as_str()])
            .copy_properties(&image, &self.preserved_properties)
    }
}
