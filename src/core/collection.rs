//! Lazily evaluated images and image collections.
//!
//! Builder methods only extend the request description. The platform runs
//! the computation once a display tile or export asks for it.

use crate::core::boundary::Region;
use crate::core::expr::Expr;
use crate::core::filter::Filter;
use crate::core::reducer::ReducerKind;
use crate::types::{DateRange, ImageMetadata};

/// Spatial extent of a derived image
#[derive(Debug, Clone, PartialEq)]
pub enum Extent {
    /// Composites and raw collections have no bound until clipped
    Unbounded,
    Region(Region),
    /// Successive clips
    Intersection(Vec<Region>),
}

impl Extent {
    fn clipped_to(self, region: Region) -> Extent {
        match self {
            Extent::Unbounded => Extent::Region(region),
            Extent::Region(existing) if existing == region => Extent::Region(existing),
            Extent::Region(existing) => Extent::Intersection(vec![existing, region]),
            Extent::Intersection(mut regions) => {
                if !regions.contains(&region) {
                    regions.push(region);
                }
                Extent::Intersection(regions)
            }
        }
    }
}

/// Unevaluated single image
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    expr: Expr,
    extent: Extent,
}

impl Image {
    pub fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            extent: Extent::Unbounded,
        }
    }

    pub fn load(asset_id: &str) -> Self {
        Self::from_expr(Expr::call("Image.load", [("id", Expr::string(asset_id))]))
    }

    /// Image with the same value in every pixel
    pub fn constant(value: f64) -> Self {
        Self::from_expr(Expr::call("Image.constant", [("value", Expr::constant(value))]))
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    fn derive(&self, expr: Expr) -> Self {
        Self {
            expr,
            extent: self.extent.clone(),
        }
    }

    fn binary(&self, algorithm: &str, other: &Image) -> Self {
        self.derive(Expr::call(
            algorithm,
            [("image1", self.expr.clone()), ("image2", other.expr.clone())],
        ))
    }

    /// Select bands by name or regular expression
    pub fn select<S: AsRef<str>>(&self, bands: &[S]) -> Self {
        self.derive(Expr::call(
            "Image.select",
            [("input", self.expr.clone()), ("bandSelectors", Expr::strings(bands))],
        ))
    }

    pub fn rename<S: AsRef<str>>(&self, names: &[S]) -> Self {
        self.derive(Expr::call(
            "Image.rename",
            [("input", self.expr.clone()), ("names", Expr::strings(names))],
        ))
    }

    pub fn update_mask(&self, mask: &Image) -> Self {
        self.derive(Expr::call(
            "Image.updateMask",
            [("image", self.expr.clone()), ("mask", mask.expr.clone())],
        ))
    }

    pub fn divide(&self, divisor: f64) -> Self {
        self.binary("Image.divide", &Image::constant(divisor))
    }

    pub fn bitwise_and(&self, bits: u32) -> Self {
        self.binary("Image.bitwiseAnd", &Image::constant(bits as f64))
    }

    pub fn eq_value(&self, value: f64) -> Self {
        self.binary("Image.eq", &Image::constant(value))
    }

    pub fn and(&self, other: &Image) -> Self {
        self.binary("Image.and", other)
    }

    /// Copy metadata properties from `source` onto this image
    pub fn copy_properties<S: AsRef<str>>(&self, source: &Image, properties: &[S]) -> Self {
        self.derive(Expr::call(
            "Element.copyProperties",
            [
                ("destination", self.expr.clone()),
                ("source", source.expr.clone()),
                ("properties", Expr::strings(properties)),
            ],
        ))
    }

    /// `(first - second) / (first + second)` as a single band named `nd`
    pub fn normalized_difference(&self, first: &str, second: &str) -> Self {
        self.derive(Expr::call(
            "Image.normalizedDifference",
            [("input", self.expr.clone()), ("bandNames", Expr::strings(&[first, second]))],
        ))
    }

    pub fn add_bands(&self, other: &Image) -> Self {
        self.derive(Expr::call(
            "Image.addBands",
            [("dstImg", self.expr.clone()), ("srcImg", other.expr.clone())],
        ))
    }

    /// Restrict valid pixels to `region`
    pub fn clip(&self, region: impl Into<Region>) -> Self {
        let region = region.into();
        Self {
            expr: Expr::call(
                "Image.clip",
                [("input", self.expr.clone()), ("geometry", region.to_expr())],
            ),
            extent: self.extent.clone().clipped_to(region),
        }
    }
}

/// Unevaluated, filterable image collection
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCollection {
    dataset_id: String,
    expr: Expr,
    filters: Vec<Filter>,
}

impl ImageCollection {
    pub fn load(dataset_id: &str) -> Self {
        log::debug!("Loading image collection: {}", dataset_id);
        Self {
            dataset_id: dataset_id.to_string(),
            expr: Expr::call("ImageCollection.load", [("id", Expr::string(dataset_id))]),
            filters: Vec::new(),
        }
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Filters in application order
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.expr = Expr::call(
            "Collection.filter",
            [("collection", self.expr), ("filter", filter.to_expr())],
        );
        self.filters.push(filter);
        self
    }

    /// Keep images acquired within `[start, end)`
    pub fn filter_date(self, range: DateRange) -> Self {
        self.filter(Filter::date(range))
    }

    pub fn filter_bounds(self, region: impl Into<Region>) -> Self {
        self.filter(Filter::bounds(region))
    }

    /// Apply a pure per-image transform to every image
    pub fn map<F>(mut self, transform: F) -> Self
    where
        F: FnOnce(Image) -> Image,
    {
        let algorithm = Expr::lambda(|argument| transform(Image::from_expr(argument)).into_expr());
        self.expr = Expr::call(
            "Collection.map",
            [("collection", self.expr), ("baseAlgorithm", algorithm)],
        );
        self
    }

    pub fn select<S: AsRef<str>>(self, bands: &[S]) -> Self {
        self.map(|image| image.select(bands))
    }

    /// Whether an image with this metadata survives every filter.
    ///
    /// Filters are a conjunction, so the answer does not depend on the
    /// order in which they were applied.
    pub fn matches(&self, image: &ImageMetadata) -> bool {
        self.filters.iter().all(|f| f.matches(image))
    }

    /// Reduce with an explicit reducer; output bands carry the reducer suffix
    pub fn reduce(&self, kind: ReducerKind) -> Image {
        log::debug!("Reducing {} with {}", self.dataset_id, kind);
        Image::from_expr(Expr::call(
            "ImageCollection.reduce",
            [("collection", self.expr.clone()), ("reducer", kind.reducer_expr())],
        ))
    }

    /// Composite that keeps the input band names
    pub fn composite(&self, kind: ReducerKind) -> Image {
        log::debug!("Compositing {} by {}", self.dataset_id, kind);
        Image::from_expr(Expr::call(
            kind.composite_algorithm(),
            [("collection", self.expr.clone())],
        ))
    }

    pub fn mean(&self) -> Image {
        self.composite(ReducerKind::Mean)
    }

    pub fn median(&self) -> Image {
        self.composite(ReducerKind::Median)
    }

    pub fn mode(&self) -> Image {
        self.composite(ReducerKind::Mode)
    }
}
