use chrono::{TimeZone, Utc};
use geeplan::core::{Filter, ImageCollection};
use geeplan::types::{BoundingBox, DateRange, ImageMetadata};

fn scene(id: &str, day: u32, cloudy: f64, footprint: BoundingBox) -> ImageMetadata {
    ImageMetadata::new(id, Utc.with_ymd_and_hms(2016, 1, day, 8, 30, 0).unwrap())
        .with_footprint(footprint)
        .with_property("CLOUDY_PIXEL_PERCENTAGE", cloudy)
}

#[test]
fn test_date_range_is_half_open() {
    let range = DateRange::from_dates("2016-01-01", "2016-01-31").unwrap();

    assert!(range.contains(Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap()));
    assert!(range.contains(Utc.with_ymd_and_hms(2016, 1, 30, 23, 59, 59).unwrap()));
    assert!(!range.contains(Utc.with_ymd_and_hms(2016, 1, 31, 0, 0, 0).unwrap()));
    assert!(!range.contains(Utc.with_ymd_and_hms(2015, 12, 31, 23, 59, 59).unwrap()));

    assert_eq!(range.start_millis(), 1_451_606_400_000);
    assert!(DateRange::from_dates("2016-02-01", "2016-01-01").is_err());
    assert!(DateRange::from_dates("2016-01-01", "2016-01-01").is_err());
    assert!(DateRange::from_dates("2016/01/01", "2016-02-01").is_err());
}

#[test]
fn test_collection_filters_select_matching_scenes() {
    let _ = env_logger::builder().is_test(true).try_init();

    let area = BoundingBox::new(18.9, -34.02, 19.02, -33.94).unwrap();
    let elsewhere = BoundingBox::new(30.0, -26.0, 31.0, -25.0).unwrap();
    let range = DateRange::from_dates("2016-01-01", "2016-01-31").unwrap();

    let collection = ImageCollection::load("COPERNICUS/S2")
        .filter_date(range)
        .filter_bounds(area)
        .filter(Filter::lt("CLOUDY_PIXEL_PERCENTAGE", 30.0));

    let scenes = [
        scene("clear", 5, 4.0, area),
        scene("cloudy", 10, 75.0, area),
        scene("outside", 15, 2.0, elsewhere),
        scene("threshold", 20, 30.0, area),
    ];
    let kept: Vec<&str> = scenes
        .iter()
        .filter(|s| collection.matches(s))
        .map(|s| s.id.as_str())
        .collect();
    println!("Kept scenes: {:?}", kept);
    assert_eq!(kept, vec!["clear"]);

    let late = ImageMetadata::new("late", Utc.with_ymd_and_hms(2016, 2, 3, 8, 30, 0).unwrap())
        .with_footprint(area)
        .with_property("CLOUDY_PIXEL_PERCENTAGE", 1.0);
    assert!(!collection.matches(&late));

    let unlabelled = ImageMetadata::new("unlabelled", Utc.with_ymd_and_hms(2016, 1, 8, 0, 0, 0).unwrap())
        .with_footprint(area);
    assert!(!collection.matches(&unlabelled));
}

#[test]
fn test_filter_order_does_not_change_selection() {
    let area = BoundingBox::new(18.9, -34.02, 19.02, -33.94).unwrap();
    let range = DateRange::from_dates("2016-01-01", "2016-01-31").unwrap();
    let cloud = Filter::lt("CLOUDY_PIXEL_PERCENTAGE", 30.0);

    let first = ImageCollection::load("COPERNICUS/S2")
        .filter_date(range)
        .filter_bounds(area)
        .filter(cloud.clone());
    let second = ImageCollection::load("COPERNICUS/S2")
        .filter(cloud)
        .filter_bounds(area)
        .filter_date(range);

    for day in 1..=31 {
        for cloudy in [0.0, 29.9, 30.0, 80.0] {
            let image = scene("s", day, cloudy, area);
            assert_eq!(first.matches(&image), second.matches(&image));
        }
    }
}
