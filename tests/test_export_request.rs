use geeplan::core::{ExportDestination, Expr, Image, ImageCollection, Region};
use geeplan::types::{BoundingBox, GeeError};
use geeplan::{Boundary, ExportSpec};

fn composite() -> Image {
    ImageCollection::load("UCSB-CHG/CHIRPS/DAILY")
        .select(&["precipitation"])
        .mean()
}

#[test]
fn test_export_carries_region_scale_and_crs() {
    let _ = env_logger::builder().is_test(true).try_init();

    let bbox = BoundingBox::new(18.9, -34.02, 19.02, -33.94).unwrap();
    let spec = ExportSpec::builder(composite().clip(bbox))
        .description("CHIRPS_Precip")
        .file_name_prefix("CHIRPS_MeanRain_Jonkershoek")
        .region(bbox)
        .scale(5000.0)
        .crs("EPSG:32734")
        .build()
        .unwrap();

    assert_eq!(spec.region(), &Region::from(bbox));
    assert_eq!(spec.scale(), 5000.0);
    assert_eq!(spec.crs().as_str(), "EPSG:32734");

    let body = spec.request_body();
    println!("{}", serde_json::to_string_pretty(&body).unwrap());

    assert_eq!(body["description"], "CHIRPS_Precip");
    assert_eq!(body["grid"]["crsCode"], "EPSG:32734");
    assert_eq!(body["maxPixels"], "10000000000000");
    let options = &body["fileExportOptions"];
    assert_eq!(options["fileFormat"], "GEO_TIFF");
    assert_eq!(options["driveDestination"]["folder"], "GEE_exports");
    assert_eq!(options["driveDestination"]["filenamePrefix"], "CHIRPS_MeanRain_Jonkershoek");

    let expression = spec.expression();
    assert_eq!(expression.function_name(), Some("Image.clipToBoundsAndScale"));
    assert_eq!(expression.argument("scale"), Some(&Expr::constant(5000.0)));
    assert_eq!(expression.argument("geometry"), Some(&Region::from(bbox).to_expr()));
}

#[test]
fn test_cloud_storage_destination() {
    let boundary = Boundary::load("projects/example/assets/Extent");
    let spec = ExportSpec::builder(composite())
        .description("bucket_export")
        .bucket("my-bucket")
        .region(&boundary)
        .scale(30.0)
        .build()
        .unwrap();

    assert!(matches!(spec.destination(), ExportDestination::CloudStorage { .. }));
    assert_eq!(spec.file_name_prefix(), "bucket_export");
    let body = spec.request_body();
    assert_eq!(body["fileExportOptions"]["gcsDestination"]["bucket"], "my-bucket");
    assert!(body["fileExportOptions"].get("driveDestination").is_none());
}

#[test]
fn test_invalid_exports_are_rejected() {
    let boundary = Boundary::load("projects/example/assets/Extent");
    let base = || {
        ExportSpec::builder(composite())
            .description("ok")
            .region(&boundary)
            .scale(10.0)
    };

    assert!(base().build().is_ok());
    for builder in [
        base().scale(0.0),
        base().scale(f64::NAN),
        base().max_pixels(0),
        base().description("bad/name"),
        base().description(""),
        base().crs("not a crs"),
        base().folder(""),
        ExportSpec::builder(composite()).description("no_region").scale(10.0),
    ] {
        assert!(matches!(builder.build(), Err(GeeError::InvalidParameter(_))));
    }
}
