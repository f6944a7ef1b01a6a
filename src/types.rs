use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata property holding the acquisition time in epoch milliseconds
pub const TIME_START: &str = "system:time_start";

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> GeeResult<Self> {
        if !(min_lon <= max_lon && min_lat <= max_lat) {
            return Err(GeeError::InvalidParameter(format!(
                "Degenerate bounding box: ({}, {}) - ({}, {})",
                min_lon, min_lat, max_lon, max_lat
            )));
        }
        Ok(Self { min_lon, max_lon, min_lat, max_lat })
    }

    /// True when the two boxes share at least one point
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }

    /// Closed rectangular polygon covering the box
    pub fn to_geometry(&self) -> Geometry {
        Geometry::Polygon {
            coordinates: vec![vec![
                [self.min_lon, self.min_lat],
                [self.max_lon, self.min_lat],
                [self.max_lon, self.max_lat],
                [self.min_lon, self.max_lat],
                [self.min_lon, self.min_lat],
            ]],
        }
    }

    fn extend(&mut self, other: &BoundingBox) {
        self.min_lon = self.min_lon.min(other.min_lon);
        self.max_lon = self.max_lon.max(other.max_lon);
        self.min_lat = self.min_lat.min(other.min_lat);
        self.max_lat = self.max_lat.max(other.max_lat);
    }
}

/// GeoJSON polygonal geometry (lon/lat, EPSG:4326)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

impl Geometry {
    /// Bounding box of all vertices, `None` for an empty geometry
    pub fn bounds(&self) -> Option<BoundingBox> {
        let rings: Vec<&Vec<[f64; 2]>> = match self {
            Geometry::Polygon { coordinates } => coordinates.iter().collect(),
            Geometry::MultiPolygon { coordinates } => coordinates.iter().flatten().collect(),
        };

        let mut bbox: Option<BoundingBox> = None;
        for [lon, lat] in rings.into_iter().flatten().copied() {
            let point = BoundingBox { min_lon: lon, max_lon: lon, min_lat: lat, max_lat: lat };
            match bbox.as_mut() {
                Some(b) => b.extend(&point),
                None => bbox = Some(point),
            }
        }
        bbox
    }

    /// Parse a GeoJSON geometry, or the geometry of a GeoJSON Feature
    pub fn from_geojson(text: &str) -> GeeResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let geometry = match value.get("type").and_then(|t| t.as_str()) {
            Some("Feature") => value.get("geometry").cloned().ok_or_else(|| {
                GeeError::InvalidParameter("GeoJSON feature has no geometry".to_string())
            })?,
            _ => value,
        };
        Ok(serde_json::from_value(geometry)?)
    }
}

/// Half-open acquisition window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Unchecked wire form; deserialized ranges go through `DateRange::new`
#[derive(Deserialize)]
struct RawDateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = GeeError;

    fn try_from(raw: RawDateRange) -> GeeResult<Self> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> GeeResult<Self> {
        if start >= end {
            return Err(GeeError::InvalidParameter(format!(
                "Date range start {} must precede end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a range from two `YYYY-MM-DD` dates, both at midnight UTC
    pub fn from_dates(start: &str, end: &str) -> GeeResult<Self> {
        Self::new(parse_day(start)?, parse_day(end)?)
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time < self.end
    }

    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

fn parse_day(text: &str) -> GeeResult<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| GeeError::InvalidParameter(format!("Invalid date '{}': {}", text, e)))?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| GeeError::InvalidParameter(format!("Invalid date '{}'", text)))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

/// Per-image metadata as reported by the platform's collection listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub id: String,
    pub time_start: DateTime<Utc>,
    pub footprint: Option<BoundingBox>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl ImageMetadata {
    pub fn new(id: &str, time_start: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            time_start,
            footprint: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_footprint(mut self, footprint: BoundingBox) -> Self {
        self.footprint = Some(footprint);
        self
    }

    pub fn with_property(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Property value, with `system:time_start` resolved from the acquisition time
    pub fn property(&self, name: &str) -> Option<serde_json::Value> {
        if name == TIME_START {
            return Some(self.time_start.timestamp_millis().into());
        }
        self.properties.get(name).cloned()
    }
}

/// Coordinate reference system code such as `EPSG:4326`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs(String);

impl Crs {
    pub fn parse(code: &str) -> GeeResult<Self> {
        match code.split_once(':') {
            Some((authority, id))
                if !authority.is_empty()
                    && authority.chars().all(|c| c.is_ascii_alphanumeric())
                    && !id.is_empty()
                    && id.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                Ok(Self(code.to_string()))
            }
            _ => Err(GeeError::InvalidParameter(format!(
                "CRS must look like AUTHORITY:CODE, got '{}'",
                code
            ))),
        }
    }

    pub fn wgs84() -> Self {
        Self("EPSG:4326".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Crs {
    type Error = GeeError;

    fn try_from(value: String) -> GeeResult<Self> {
        Crs::parse(&value)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> String {
        crs.0
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error types for request building and platform calls
#[derive(Debug, thiserror::Error)]
pub enum GeeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Earth Engine API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Raster error: {0}")]
    Raster(String),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for geeplan operations
pub type GeeResult<T> = Result<T, GeeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_is_half_open() {
        let range = DateRange::from_dates("2016-01-01", "2016-01-31").unwrap();
        assert!(range.contains(range.start));
        assert!(!range.contains(range.end));
        assert!(!range.contains(range.start - chrono::Duration::milliseconds(1)));
        assert!(range.contains(range.end - chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn test_date_range_rejects_reversed_dates() {
        assert!(DateRange::from_dates("2016-12-31", "2016-01-01").is_err());
        assert!(DateRange::from_dates("2016-01-01", "2016-01-01").is_err());
        assert!(DateRange::from_dates("2016-13-01", "2016-12-01").is_err());
    }

    #[test]
    fn test_deserialized_date_range_is_validated() {
        let range: DateRange =
            serde_json::from_str(r#"{"start":"2016-01-01T00:00:00Z","end":"2016-12-31T00:00:00Z"}"#)
                .unwrap();
        assert_eq!(range, DateRange::from_dates("2016-01-01", "2016-12-31").unwrap());

        let reversed = serde_json::from_str::<DateRange>(
            r#"{"start":"2016-12-31T00:00:00Z","end":"2016-01-01T00:00:00Z"}"#,
        );
        let message = reversed.unwrap_err().to_string();
        assert!(message.contains("must precede"), "{}", message);
    }

    #[test]
    fn test_geometry_bounds() {
        let geometry = Geometry::MultiPolygon {
            coordinates: vec![
                vec![vec![[18.9, -34.0], [19.0, -34.0], [19.0, -33.9], [18.9, -34.0]]],
                vec![vec![[19.1, -34.1], [19.2, -34.1], [19.2, -34.05], [19.1, -34.1]]],
            ],
        };
        let bbox = geometry.bounds().unwrap();
        assert_eq!(bbox.min_lon, 18.9);
        assert_eq!(bbox.max_lon, 19.2);
        assert_eq!(bbox.min_lat, -34.1);
        assert_eq!(bbox.max_lat, -33.9);
    }

    #[test]
    fn test_geometry_from_feature() {
        let text = r#"{"type": "Feature", "properties": {},
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}}"#;
        let geometry = Geometry::from_geojson(text).unwrap();
        assert_eq!(geometry.bounds().unwrap(), BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap());
    }

    #[test]
    fn test_crs_parsing() {
        assert_eq!(Crs::parse("EPSG:32734").unwrap().as_str(), "EPSG:32734");
        assert!(Crs::parse("4326").is_err());
        assert!(Crs::parse("EPSG:").is_err());
    }

    #[test]
    fn test_time_start_property() {
        let range = DateRange::from_dates("2016-01-01", "2016-01-02").unwrap();
        let meta = ImageMetadata::new("img", range.start);
        assert_eq!(meta.property(TIME_START), Some(range.start_millis().into()));
        assert_eq!(meta.property("CLOUDY_PIXEL_PERCENTAGE"), None);
    }
}
