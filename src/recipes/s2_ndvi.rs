//! Mean Sentinel-2 NDVI over the cloud-masked collection.

use super::s2_rgb::masked_collection;
use super::{RecipeParams, Script};
use crate::config::Config;
use crate::core::band_math::NormalizedDifference;
use crate::core::visualize::{MapLayer, MapView, VisParams};
use crate::types::GeeResult;

pub fn build(params: &RecipeParams, config: &Config) -> GeeResult<Script> {
    let study_area = params.boundary();
    let index = NormalizedDifference::ndvi();

    let with_ndvi = masked_collection(params, true)?.map(|image| index.add_to(image));
    let mean_ndvi = with_ndvi
        .select(&[index.name.as_str()])
        .mean()
        .clip(&study_area);

    let mut map = MapView::new();
    map.center_object(&study_area, params.zoom_or(11))?;
    map.add_layer(MapLayer::image(
        mean_ndvi.clone(),
        VisParams::new().range(0.0, 1.0).palette(&["brown", "yellow", "green"]),
        "Mean NDVI",
    ))?;

    let export = params
        .export(
            mean_ndvi.clone(),
            &study_area,
            config,
            "Mean_NDVI_2016_Jonkershoek",
            "mean_ndvi_2016_jonkershoek",
            10.0,
        )
        .build()?;

    Ok(Script {
        name: "s2-ndvi".to_string(),
        boundary: study_area,
        result: mean_ndvi,
        map,
        export: Some(export),
    })
}
