//! Interactive map layers.
//!
//! Visualization only affects display tiles; export requests never read
//! anything from here.

use crate::core::boundary::{Boundary, Region};
use crate::core::collection::Image;
use crate::core::expr::{Expr, Expression};
use crate::types::{GeeError, GeeResult};
use serde::Serialize;

/// RGB colour as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB`, `#RRGGBB` or a CSS colour name
    pub fn parse(text: &str) -> GeeResult<Self> {
        if let Some(rgb) = named_color(text) {
            return Ok(rgb);
        }
        let hex = text.strip_prefix('#').unwrap_or(text);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GeeError::InvalidParameter(format!("Invalid colour: '{}'", text)));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| GeeError::InvalidParameter(format!("Invalid colour '{}': {}", text, e)))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Upper-case `RRGGBB` without a leading `#`
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    fn lerp(&self, other: &Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name.to_lowercase().as_str() {
        "black" => Rgb::new(0, 0, 0),
        "white" => Rgb::new(255, 255, 255),
        "red" => Rgb::new(255, 0, 0),
        "green" => Rgb::new(0, 128, 0),
        "blue" => Rgb::new(0, 0, 255),
        "yellow" => Rgb::new(255, 255, 0),
        "brown" => Rgb::new(165, 42, 42),
        "orange" => Rgb::new(255, 165, 0),
        "purple" => Rgb::new(128, 0, 128),
        "cyan" => Rgb::new(0, 255, 255),
        "magenta" => Rgb::new(255, 0, 255),
        "gray" | "grey" => Rgb::new(128, 128, 128),
        _ => return None,
    };
    Some(rgb)
}

/// Display parameters for one layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisParams {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub palette: Vec<String>,
    /// One band, or three for an RGB rendering
    pub bands: Vec<String>,
    /// Stroke colour for vector layers
    pub color: Option<String>,
}

impl VisParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn palette<S: AsRef<str>>(mut self, colours: &[S]) -> Self {
        self.palette = colours.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    pub fn bands<S: AsRef<str>>(mut self, bands: &[S]) -> Self {
        self.bands = bands.iter().map(|b| b.as_ref().to_string()).collect();
        self
    }

    pub fn color(mut self, colour: &str) -> Self {
        self.color = Some(colour.to_string());
        self
    }

    pub fn validate(&self) -> GeeResult<()> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if !(min < max) {
                return Err(GeeError::InvalidParameter(format!(
                    "Visualization min {} must be below max {}",
                    min, max
                )));
            }
        }
        match self.bands.len() {
            0 | 1 => {}
            3 if self.palette.is_empty() => {}
            3 => {
                return Err(GeeError::InvalidParameter(
                    "A palette requires a single band".to_string(),
                ))
            }
            n => {
                return Err(GeeError::InvalidParameter(format!(
                    "Expected 1 or 3 bands, got {}",
                    n
                )))
            }
        }
        self.palette_colors()?;
        if let Some(colour) = &self.color {
            Rgb::parse(colour)?;
        }
        Ok(())
    }

    pub fn palette_colors(&self) -> GeeResult<Vec<Rgb>> {
        self.palette.iter().map(|c| Rgb::parse(c)).collect()
    }

    /// Linear colour ramp over `[min, max]`, `None` without range or palette.
    /// Values outside the range saturate at the end colours.
    pub fn ramp(&self, value: f64) -> Option<Rgb> {
        let (min, max) = (self.min?, self.max?);
        let colors = self.palette_colors().ok()?;
        if colors.is_empty() || !value.is_finite() || !(min < max) {
            return None;
        }
        if colors.len() == 1 {
            return Some(colors[0]);
        }
        let t = ((value - min) / (max - min)).clamp(0.0, 1.0);
        let position = t * (colors.len() - 1) as f64;
        let lower = (position.floor() as usize).min(colors.len() - 2);
        Some(colors[lower].lerp(&colors[lower + 1], position - lower as f64))
    }

    /// REST `visualizationOptions` object
    pub fn visualization_options(&self) -> GeeResult<serde_json::Value> {
        let mut options = serde_json::Map::new();
        if let (Some(min), Some(max)) = (self.min, self.max) {
            let ranges: Vec<_> = (0..self.bands.len().max(1))
                .map(|_| serde_json::json!({"min": min, "max": max}))
                .collect();
            options.insert("ranges".to_string(), ranges.into());
        }
        if !self.palette.is_empty() {
            let colours: Vec<String> = self.palette_colors()?.iter().map(Rgb::hex).collect();
            options.insert("paletteColors".to_string(), colours.into());
        }
        Ok(options.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerSource {
    Image(Image),
    Features(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    pub name: String,
    pub source: LayerSource,
    pub vis: VisParams,
}

impl MapLayer {
    pub fn image(image: Image, vis: VisParams, name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: LayerSource::Image(image),
            vis,
        }
    }

    /// Outline layer for a boundary's features
    pub fn features(boundary: &Boundary, colour: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: LayerSource::Features(boundary.to_expr()),
            vis: VisParams::new().color(colour),
        }
    }

    /// The expression the tile server renders
    pub fn expression(&self) -> GeeResult<Expr> {
        match &self.source {
            LayerSource::Image(image) if self.vis.bands.is_empty() => Ok(image.expr().clone()),
            LayerSource::Image(image) => Ok(image.select(&self.vis.bands).into_expr()),
            LayerSource::Features(collection) => {
                let colour = match &self.vis.color {
                    Some(c) => Rgb::parse(c)?,
                    None => Rgb::new(0, 0, 0),
                };
                Ok(Expr::call(
                    "Collection.draw",
                    [
                        ("collection", collection.clone()),
                        ("color", Expr::string(&colour.hex())),
                        ("pointRadius", Expr::constant(3)),
                        ("strokeWidth", Expr::constant(2)),
                    ],
                ))
            }
        }
    }

    /// Body for `POST .../maps`
    pub fn request_body(&self) -> GeeResult<serde_json::Value> {
        self.vis.validate()?;
        let expression = Expression::encode(&self.expression()?);
        let mut body = serde_json::json!({
            "expression": expression,
            "fileFormat": "AUTO_JPEG_PNG",
        });
        if let LayerSource::Image(_) = self.source {
            body["visualizationOptions"] = self.vis.visualization_options()?;
        }
        Ok(body)
    }
}

/// Map centre and zoom level
#[derive(Debug, Clone, PartialEq)]
pub struct MapCenter {
    pub region: Region,
    pub zoom: u8,
}

/// Display-only collection of layers, drawn in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapView {
    center: Option<MapCenter>,
    layers: Vec<MapLayer>,
}

impl MapView {
    pub const MAX_ZOOM: u8 = 24;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn center_object(&mut self, region: impl Into<Region>, zoom: u8) -> GeeResult<()> {
        if zoom > Self::MAX_ZOOM {
            return Err(GeeError::InvalidParameter(format!(
                "Zoom level {} exceeds {}",
                zoom,
                Self::MAX_ZOOM
            )));
        }
        self.center = Some(MapCenter {
            region: region.into(),
            zoom,
        });
        Ok(())
    }

    pub fn add_layer(&mut self, layer: MapLayer) -> GeeResult<()> {
        layer.vis.validate()?;
        log::debug!("Adding map layer: {}", layer.name);
        self.layers.push(layer);
        Ok(())
    }

    pub fn center(&self) -> Option<&MapCenter> {
        self.center.as_ref()
    }

    pub fn layers(&self) -> &[MapLayer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&MapLayer> {
        self.layers.iter().find(|l| l.name == name)
    }
}
