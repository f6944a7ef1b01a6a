//! Asynchronous raster export requests.
//!
//! An [`ExportSpec`] is immutable once built. Submitting it only starts the
//! platform-side job; success or failure is observed in the platform's task
//! manager, never here.

use crate::core::boundary::Region;
use crate::core::collection::Image;
use crate::core::expr::{Expr, Expression};
use crate::types::{Crs, GeeError, GeeResult};

pub const DEFAULT_FOLDER: &str = "GEE_exports";
pub const DEFAULT_MAX_PIXELS: u64 = 10_000_000_000_000;
const MAX_DESCRIPTION_LEN: usize = 100;

/// Where the rendered file lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportDestination {
    Drive { folder: String },
    CloudStorage { bucket: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpec {
    image: Image,
    description: String,
    destination: ExportDestination,
    file_name_prefix: String,
    region: Region,
    scale: f64,
    crs: Crs,
    max_pixels: u64,
}

impl ExportSpec {
    pub fn builder(image: Image) -> ExportSpecBuilder {
        ExportSpecBuilder::new(image)
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn destination(&self) -> &ExportDestination {
        &self.destination
    }

    pub fn file_name_prefix(&self) -> &str {
        &self.file_name_prefix
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Ground resolution in metres
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn max_pixels(&self) -> u64 {
        self.max_pixels
    }

    /// The rendered expression: the image cut to the region's bounds at `scale`
    pub fn expression(&self) -> Expr {
        Expr::call(
            "Image.clipToBoundsAndScale",
            [
                ("input", self.image.expr().clone()),
                ("geometry", self.region.to_expr()),
                ("scale", Expr::constant(self.scale)),
            ],
        )
    }

    /// Body for `POST .../image:export`
    pub fn request_body(&self) -> serde_json::Value {
        let destination = match &self.destination {
            ExportDestination::Drive { folder } => serde_json::json!({
                "driveDestination": {
                    "folder": folder,
                    "filenamePrefix": self.file_name_prefix,
                }
            }),
            ExportDestination::CloudStorage { bucket } => serde_json::json!({
                "gcsDestination": {
                    "bucket": bucket,
                    "filenamePrefix": self.file_name_prefix,
                }
            }),
        };

        let mut file_options = serde_json::json!({"fileFormat": "GEO_TIFF"});
        if let (Some(options), Some(dest)) = (file_options.as_object_mut(), destination.as_object()) {
            options.extend(dest.clone());
        }

        serde_json::json!({
            "expression": Expression::encode(&self.expression()),
            "description": self.description,
            "fileExportOptions": file_options,
            "grid": {"crsCode": self.crs.as_str()},
            // int64 fields travel as strings
            "maxPixels": self.max_pixels.to_string(),
        })
    }
}

/// Builder with the defaults the recipes share: Drive folder `GEE_exports`,
/// `EPSG:4326`, a 1e13 pixel ceiling
#[derive(Debug, Clone)]
pub struct ExportSpecBuilder {
    image: Image,
    description: Option<String>,
    destination: ExportDestination,
    file_name_prefix: Option<String>,
    region: Option<Region>,
    scale: Option<f64>,
    crs: String,
    max_pixels: u64,
}

impl ExportSpecBuilder {
    fn new(image: Image) -> Self {
        Self {
            image,
            description: None,
            destination: ExportDestination::Drive {
                folder: DEFAULT_FOLDER.to_string(),
            },
            file_name_prefix: None,
            region: None,
            scale: None,
            crs: Crs::wgs84().to_string(),
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn folder(mut self, folder: &str) -> Self {
        self.destination = ExportDestination::Drive {
            folder: folder.to_string(),
        };
        self
    }

    pub fn bucket(mut self, bucket: &str) -> Self {
        self.destination = ExportDestination::CloudStorage {
            bucket: bucket.to_string(),
        };
        self
    }

    pub fn file_name_prefix(mut self, prefix: &str) -> Self {
        self.file_name_prefix = Some(prefix.to_string());
        self
    }

    pub fn region(mut self, region: impl Into<Region>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn scale(mut self, metres: f64) -> Self {
        self.scale = Some(metres);
        self
    }

    pub fn crs(mut self, crs: &str) -> Self {
        self.crs = crs.to_string();
        self
    }

    pub fn max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    pub fn build(self) -> GeeResult<ExportSpec> {
        let description = self
            .description
            .ok_or_else(|| GeeError::InvalidParameter("Export description is required".to_string()))?;
        validate_description(&description)?;

        let region = self
            .region
            .ok_or_else(|| GeeError::InvalidParameter("Export region is required".to_string()))?;

        let scale = self
            .scale
            .ok_or_else(|| GeeError::InvalidParameter("Export scale is required".to_string()))?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(GeeError::InvalidParameter(format!(
                "Export scale must be positive, got {}",
                scale
            )));
        }

        if self.max_pixels == 0 {
            return Err(GeeError::InvalidParameter(
                "maxPixels must be at least 1".to_string(),
            ));
        }

        let destination_name = match &self.destination {
            ExportDestination::Drive { folder } => folder,
            ExportDestination::CloudStorage { bucket } => bucket,
        };
        if destination_name.is_empty() {
            return Err(GeeError::InvalidParameter(
                "Export destination must not be empty".to_string(),
            ));
        }

        let file_name_prefix = self.file_name_prefix.unwrap_or_else(|| description.clone());
        let crs = Crs::parse(&self.crs)?;

        log::debug!(
            "Export '{}': scale={} m, crs={}, maxPixels={}",
            description,
            scale,
            crs,
            self.max_pixels
        );

        Ok(ExportSpec {
            image: self.image,
            description,
            destination: self.destination,
            file_name_prefix,
            region,
            scale,
            crs,
            max_pixels: self.max_pixels,
        })
    }
}

fn validate_description(description: &str) -> GeeResult<()> {
    if description.is_empty() || description.len() > MAX_DESCRIPTION_LEN {
        return Err(GeeError::InvalidParameter(format!(
            "Export description must be 1-{} characters, got {}",
            MAX_DESCRIPTION_LEN,
            description.len()
        )));
    }
    if let Some(bad) = description
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || ".,:;_ -".contains(*c)))
    {
        return Err(GeeError::InvalidParameter(format!(
            "Export description contains invalid character '{}'",
            bad
        )));
    }
    Ok(())
}
