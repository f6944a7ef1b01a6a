//! Dynamic World land cover: most frequent class per pixel.

use super::{RecipeParams, Script};
use crate::config::Config;
use crate::core::collection::ImageCollection;
use crate::core::reducer::ReducerKind;
use crate::core::visualize::{MapLayer, MapView, VisParams};
use crate::types::GeeResult;

pub const DATASET: &str = "GOOGLE/DYNAMICWORLD/V1";
pub const BAND: &str = "label";

/// Class colours, indexed by label value
pub const CLASSES: [(&str, &str); 9] = [
    ("Water", "#419BDF"),
    ("Trees", "#397D49"),
    ("Grass", "#88B053"),
    ("Flooded vegetation", "#7A87C6"),
    ("Crops", "#E49635"),
    ("Shrub & scrub", "#DFC35A"),
    ("Built-up", "#C4281B"),
    ("Bare ground", "#A59B8F"),
    ("Snow & ice", "#B39FE1"),
];

/// Display-only unless a `scale` override asks for an export
pub fn build(params: &RecipeParams, config: &Config) -> GeeResult<Script> {
    let boundary = params.boundary();
    let dates = params.dates_or("2021-01-01", "2021-12-31")?;

    let mut map = MapView::new();
    map.center_object(&boundary, params.zoom_or(9))?;
    map.add_layer(MapLayer::features(&boundary, "blue", "Cape Town Boundary"))?;

    let labels = ImageCollection::load(DATASET)
        .filter_date(dates)
        .filter_bounds(&boundary)
        .select(&[BAND]);
    let dw_mode = labels.reduce(ReducerKind::Mode).clip(&boundary);

    let palette: Vec<&str> = CLASSES.iter().map(|(_, colour)| *colour).collect();
    map.add_layer(MapLayer::image(
        dw_mode.clone(),
        VisParams::new().range(0.0, (CLASSES.len() - 1) as f64).palette(&palette),
        "Dynamic World Mode",
    ))?;

    let export = match params.scale {
        Some(scale) => Some(
            params
                .export(dw_mode.clone(), &boundary, config, "Dynamic_World_Mode", "dw_mode", scale)
                .build()?,
        ),
        None => None,
    };

    Ok(Script {
        name: "dynamic-world-mode".to_string(),
        boundary,
        result: dw_mode,
        map,
        export,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::visualize::Rgb;

    #[test]
    fn test_display_only_by_default() {
        let script = build(&RecipeParams::default(), &Config::default()).unwrap();
        assert!(script.export.is_none());
        assert_eq!(script.map.layers().len(), 2);
        assert_eq!(script.map.center().unwrap().zoom, 9);
    }

    #[test]
    fn test_class_colours_match_labels() {
        let script = build(&RecipeParams::default(), &Config::default()).unwrap();
        let vis = &script.map.layer("Dynamic World Mode").unwrap().vis;
        assert_eq!(vis.ramp(0.0), Some(Rgb::parse("#419BDF").unwrap()));
        assert_eq!(vis.ramp(6.0), Some(Rgb::parse("#C4281B").unwrap()));
        assert_eq!(vis.ramp(8.0), Some(Rgb::parse("#B39FE1").unwrap()));
    }

    #[test]
    fn test_scale_enables_export() {
        let params = RecipeParams {
            scale: Some(10.0),
            ..RecipeParams::default()
        };
        let script = build(&params, &Config::default()).unwrap();
        assert_eq!(script.export.unwrap().scale(), 10.0);
    }

    #[test]
    fn test_mode_uses_explicit_reducer() {
        let script = build(&RecipeParams::default(), &Config::default()).unwrap();
        let reduced = script.result.expr().argument("input").unwrap();
        assert_eq!(reduced.function_name(), Some("ImageCollection.reduce"));
        assert_eq!(
            reduced.argument("reducer").and_then(|r| r.function_name()),
            Some("Reducer.mode")
        );
    }
}
