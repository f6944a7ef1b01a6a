//! Cloud-masked Sentinel-2 median RGB composite.

use super::{RecipeParams, Script};
use crate::config::Config;
use crate::core::cloud_mask::CloudMask;
use crate::core::collection::ImageCollection;
use crate::core::filter::Filter;
use crate::core::visualize::{MapLayer, MapView, VisParams};
use crate::types::GeeResult;

pub const DATASET: &str = "COPERNICUS/S2_HARMONIZED";
pub const CLOUD_PROPERTY: &str = "CLOUDY_PIXEL_PERCENTAGE";
pub const MAX_CLOUD_PERCENT: f64 = 30.0;

/// Sentinel-2 top-of-atmosphere collection with granule pre-filter and QA60 mask
pub fn masked_collection(params: &RecipeParams, with_bounds: bool) -> GeeResult<ImageCollection> {
    let mask = CloudMask::sentinel2();
    mask.validate()?;

    let mut collection = ImageCollection::load(DATASET).filter_date(params.dates_or("2016-01-01", "2016-12-31")?);
    if with_bounds {
        collection = collection.filter_bounds(&params.boundary());
    }
    Ok(collection
        .filter(Filter::lt(CLOUD_PROPERTY, MAX_CLOUD_PERCENT))
        .map(|image| mask.apply(image)))
}

pub fn build(params: &RecipeParams, config: &Config) -> GeeResult<Script> {
    let boundary = params.boundary();
    let composite = masked_collection(params, false)?.median().clip(&boundary);

    let mut map = MapView::new();
    map.center_object(&boundary, params.zoom_or(11))?;
    map.add_layer(MapLayer::image(
        composite.clone(),
        VisParams::new().bands(&["B4", "B3", "B2"]).range(0.0, 0.3),
        "Clipped RGB Composite",
    ))?;
    map.add_layer(MapLayer::features(&boundary, "red", "Boundary"))?;

    let export = params
        .export(
            composite.clone(),
            &boundary,
            config,
            "Sentinel2_2016_Composite_RGB",
            "Sentinel2_2016_Jonkershoek_RGB",
            10.0,
        )
        .build()?;

    Ok(Script {
        name: "s2-rgb".to_string(),
        boundary,
        result: composite,
        map,
        export: Some(export),
    })
}
