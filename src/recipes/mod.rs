//! Ready-made composite recipes.
//!
//! Each recipe has the same shape: load the boundary, load and filter a
//! collection, transform and reduce it, clip to the boundary, describe the
//! map layers and (usually) an export. Building a recipe sends nothing.

pub mod chirps;
pub mod dynamic_world;
pub mod era5;
pub mod s2_ndvi;
pub mod s2_rgb;

use crate::config::Config;
use crate::core::boundary::Boundary;
use crate::core::collection::Image;
use crate::core::export::{ExportSpec, ExportSpecBuilder};
use crate::core::visualize::MapView;
use crate::types::{DateRange, GeeError, GeeResult, Geometry};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_BOUNDARY: &str = "projects/git712-gds/assets/Extent";

/// Overrides applied on top of a recipe's built-in parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeParams {
    pub boundary_asset: Option<String>,
    /// Locally known boundary shape, for dry runs
    pub boundary_geometry: Option<Geometry>,
    pub dates: Option<DateRange>,
    /// Export ground resolution in metres
    pub scale: Option<f64>,
    pub description: Option<String>,
    pub file_name_prefix: Option<String>,
    pub zoom: Option<u8>,
}

impl RecipeParams {
    pub fn boundary(&self) -> Boundary {
        let boundary = Boundary::load(self.boundary_asset.as_deref().unwrap_or(DEFAULT_BOUNDARY));
        match &self.boundary_geometry {
            Some(geometry) => boundary.with_geometry(geometry.clone()),
            None => boundary,
        }
    }

    pub fn dates_or(&self, start: &str, end: &str) -> GeeResult<DateRange> {
        match self.dates {
            Some(range) => Ok(range),
            None => DateRange::from_dates(start, end),
        }
    }

    pub fn zoom_or(&self, zoom: u8) -> u8 {
        self.zoom.unwrap_or(zoom)
    }

    /// Export builder with recipe defaults, overrides and config applied
    pub fn export(
        &self,
        image: Image,
        boundary: &Boundary,
        config: &Config,
        description: &str,
        file_name_prefix: &str,
        scale: f64,
    ) -> ExportSpecBuilder {
        ExportSpec::builder(image)
            .description(self.description.as_deref().unwrap_or(description))
            .file_name_prefix(self.file_name_prefix.as_deref().unwrap_or(file_name_prefix))
            .folder(&config.export_folder)
            .region(boundary)
            .scale(self.scale.unwrap_or(scale))
            .crs(&config.crs)
            .max_pixels(config.max_pixels)
    }
}

/// A fully described, not yet submitted, analysis
#[derive(Debug, Clone)]
pub struct Script {
    pub name: String,
    pub boundary: Boundary,
    /// The final clipped product
    pub result: Image,
    pub map: MapView,
    pub export: Option<ExportSpec>,
}

impl Script {
    /// JSON plan: every layer's map request and the export request
    pub fn plan(&self) -> GeeResult<serde_json::Value> {
        let layers = self
            .map
            .layers()
            .iter()
            .map(|layer| {
                Ok(serde_json::json!({
                    "name": layer.name,
                    "request": layer.request_body()?,
                }))
            })
            .collect::<GeeResult<Vec<_>>>()?;

        let center = self.map.center().map(|c| {
            serde_json::json!({
                "zoom": c.zoom,
                "bounds": c.region.bounds(),
            })
        });

        Ok(serde_json::json!({
            "name": self.name,
            "boundary": self.boundary.asset_id(),
            "center": center,
            "layers": layers,
            "export": self.export.as_ref().map(ExportSpec::request_body),
        }))
    }
}

/// The bundled recipes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipe {
    ChirpsMean,
    Era5Temp2m,
    S2Rgb,
    S2Ndvi,
    DynamicWorldMode,
}

impl Recipe {
    pub const ALL: &'static [Recipe] = &[
        Recipe::ChirpsMean,
        Recipe::Era5Temp2m,
        Recipe::S2Rgb,
        Recipe::S2Ndvi,
        Recipe::DynamicWorldMode,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Recipe::ChirpsMean => "chirps-mean",
            Recipe::Era5Temp2m => "era5-temp2m",
            Recipe::S2Rgb => "s2-rgb",
            Recipe::S2Ndvi => "s2-ndvi",
            Recipe::DynamicWorldMode => "dynamic-world-mode",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Recipe::ChirpsMean => "CHIRPS daily precipitation, monthly mean",
            Recipe::Era5Temp2m => "ERA5 daily mean 2m air temperature, mean",
            Recipe::S2Rgb => "Sentinel-2 cloud-masked median RGB composite",
            Recipe::S2Ndvi => "Sentinel-2 cloud-masked mean NDVI",
            Recipe::DynamicWorldMode => "Dynamic World land cover, per-pixel mode",
        }
    }

    pub fn build(&self, params: &RecipeParams, config: &Config) -> GeeResult<Script> {
        log::info!("Building recipe: {}", self.name());
        match self {
            Recipe::ChirpsMean => chirps::build(params, config),
            Recipe::Era5Temp2m => era5::build(params, config),
            Recipe::S2Rgb => s2_rgb::build(params, config),
            Recipe::S2Ndvi => s2_ndvi::build(params, config),
            Recipe::DynamicWorldMode => dynamic_world::build(params, config),
        }
    }
}

impl std::fmt::Display for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Recipe {
    type Err = GeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase().replace('_', "-");
        Recipe::ALL
            .iter()
            .copied()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Recipe::ALL.iter().map(Recipe::name).collect();
                GeeError::InvalidParameter(format!(
                    "Unknown recipe '{}' (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_names_roundtrip() {
        for recipe in Recipe::ALL {
            assert_eq!(recipe.name().parse::<Recipe>().unwrap(), *recipe);
        }
        assert_eq!("S2_NDVI".parse::<Recipe>().unwrap(), Recipe::S2Ndvi);
        assert!("landsat".parse::<Recipe>().is_err());
    }

    #[test]
    fn test_every_recipe_builds_with_defaults() {
        let config = Config::default();
        for recipe in Recipe::ALL {
            let script = recipe.build(&RecipeParams::default(), &config).unwrap();
            assert_eq!(script.boundary.asset_id(), DEFAULT_BOUNDARY);
            assert!(!script.map.layers().is_empty());
            script.plan().unwrap();
        }
    }

    #[test]
    fn test_params_reject_reversed_dates() {
        let reversed = r#"{"dates": {"start": "2016-12-31T00:00:00Z", "end": "2016-01-01T00:00:00Z"}}"#;
        assert!(serde_json::from_str::<RecipeParams>(reversed).is_err());

        let params: RecipeParams = serde_json::from_str(r#"{"scale": 250.0}"#).unwrap();
        assert!(params.dates.is_none());
        assert_eq!(params.scale, Some(250.0));
    }

    #[test]
    fn test_params_override_export() {
        let params = RecipeParams {
            scale: Some(250.0),
            file_name_prefix: Some("custom".to_string()),
            ..RecipeParams::default()
        };
        let script = Recipe::ChirpsMean.build(&params, &Config::default()).unwrap();
        let export = script.export.unwrap();
        assert_eq!(export.scale(), 250.0);
        assert_eq!(export.file_name_prefix(), "custom");
        assert_eq!(export.description(), "CHIRPS_Precip");
    }
}
