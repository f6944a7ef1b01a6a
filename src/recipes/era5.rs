//! Mean ERA5 2 m air temperature.

use super::{RecipeParams, Script};
use crate::config::Config;
use crate::core::collection::ImageCollection;
use crate::core::visualize::{MapLayer, MapView, VisParams};
use crate::types::GeeResult;

pub const DATASET: &str = "ECMWF/ERA5/DAILY";
pub const BAND: &str = "mean_2m_air_temperature";
pub const PALETTE: [&str; 18] = [
    "000080", "0000d9", "4000ff", "8000ff", "0080ff", "00ffff", "00ff80", "80ff00", "daff00",
    "ffff00", "fff500", "ffda00", "ffb000", "ffa400", "ff4f00", "ff2500", "ff0a00", "ff00ff",
];

pub fn build(params: &RecipeParams, config: &Config) -> GeeResult<Script> {
    let study_area = params.boundary();
    let dates = params.dates_or("2016-01-01", "2019-01-31")?;

    let temperature = ImageCollection::load(DATASET)
        .select(&[BAND])
        .filter_date(dates)
        .filter_bounds(&study_area);
    let mean_temp = temperature.mean().clip(&study_area);

    // Kelvin
    let vis = VisParams::new().range(250.0, 320.0).palette(&PALETTE);

    let mut map = MapView::new();
    map.center_object(&study_area, params.zoom_or(10))?;
    map.add_layer(MapLayer::image(mean_temp.clone(), vis, "Mean 2m Temp"))?;

    // ERA5 is ~31 km natively; 1 km keeps the boundary outline smooth
    let export = params
        .export(
            mean_temp.clone(),
            &study_area,
            config,
            "Mean_2m_Temp_Jonkershoek",
            "mean_2m_temp_jonkershoek",
            1000.0,
        )
        .build()?;

    Ok(Script {
        name: "era5-temp2m".to_string(),
        boundary: study_area,
        result: mean_temp,
        map,
        export: Some(export),
    })
}
