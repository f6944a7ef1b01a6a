//! Mean CHIRPS daily precipitation over the study area.

use super::{RecipeParams, Script};
use crate::config::Config;
use crate::core::collection::ImageCollection;
use crate::core::visualize::{MapLayer, MapView, VisParams};
use crate::types::GeeResult;

pub const DATASET: &str = "UCSB-CHG/CHIRPS/DAILY";
pub const BAND: &str = "precipitation";
pub const PALETTE: [&str; 5] = ["001137", "0aab1e", "e7eb05", "ff4a2d", "e90000"];

pub fn build(params: &RecipeParams, config: &Config) -> GeeResult<Script> {
    let boundary = params.boundary();
    let dates = params.dates_or("2016-01-01", "2016-01-31")?;

    // CHIRPS is global and small; no bounds pre-filter
    let precipitation = ImageCollection::load(DATASET)
        .filter_date(dates)
        .select(&[BAND]);
    let mean_precip = precipitation.mean().clip(&boundary);

    let mut map = MapView::new();
    map.center_object(&boundary, params.zoom_or(10))?;
    map.add_layer(MapLayer::image(
        mean_precip.clone(),
        VisParams::new().range(1.0, 100.0).palette(&PALETTE),
        "Mean Precipitation",
    ))?;
    map.add_layer(MapLayer::features(&boundary, "black", "Boundary"))?;

    // CHIRPS native resolution is ~5.5 km
    let export = params
        .export(
            mean_precip.clone(),
            &boundary,
            config,
            "CHIRPS_Precip",
            "CHIRPS_MeanRain_Jonkershoek",
            5000.0,
        )
        .build()?;

    Ok(Script {
        name: "chirps-mean".to_string(),
        boundary,
        result: mean_precip,
        map,
        export: Some(export),
    })
}
