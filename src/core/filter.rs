//! Collection filters.
//!
//! A [`Filter`] is both a request fragment ([`Filter::to_expr`]) and a
//! predicate over image metadata ([`Filter::matches`]) so a plan can be
//! checked against a known catalogue listing without contacting the platform.

use crate::core::boundary::Region;
use crate::core::expr::Expr;
use crate::types::{DateRange, ImageMetadata, TIME_START};

/// Numeric comparison applied to a metadata property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    Equals,
}

impl Comparison {
    fn algorithm(&self) -> &'static str {
        match self {
            Comparison::LessThan => "Filter.lessThan",
            Comparison::LessThanOrEquals => "Filter.lessThanOrEquals",
            Comparison::GreaterThan => "Filter.greaterThan",
            Comparison::GreaterThanOrEquals => "Filter.greaterThanOrEquals",
            Comparison::Equals => "Filter.equals",
        }
    }

    fn holds(&self, left: f64, right: f64) -> bool {
        match self {
            Comparison::LessThan => left < right,
            Comparison::LessThanOrEquals => left <= right,
            Comparison::GreaterThan => left > right,
            Comparison::GreaterThanOrEquals => left >= right,
            Comparison::Equals => left == right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Acquisition time within `[start, end)`
    Date(DateRange),
    /// Footprint intersects the region
    Bounds(Region),
    Property {
        name: String,
        comparison: Comparison,
        value: f64,
    },
    And(Vec<Filter>),
}

impl Filter {
    pub fn date(range: DateRange) -> Self {
        Filter::Date(range)
    }

    pub fn bounds(region: impl Into<Region>) -> Self {
        Filter::Bounds(region.into())
    }

    pub fn lt(name: &str, value: f64) -> Self {
        Self::property(name, Comparison::LessThan, value)
    }

    pub fn lte(name: &str, value: f64) -> Self {
        Self::property(name, Comparison::LessThanOrEquals, value)
    }

    pub fn gt(name: &str, value: f64) -> Self {
        Self::property(name, Comparison::GreaterThan, value)
    }

    pub fn gte(name: &str, value: f64) -> Self {
        Self::property(name, Comparison::GreaterThanOrEquals, value)
    }

    pub fn eq(name: &str, value: f64) -> Self {
        Self::property(name, Comparison::Equals, value)
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    fn property(name: &str, comparison: Comparison, value: f64) -> Self {
        Filter::Property {
            name: name.to_string(),
            comparison,
            value,
        }
    }

    /// Evaluate against image metadata.
    ///
    /// Missing or non-numeric properties never match. A bounds filter whose
    /// region has no local geometry cannot exclude anything; an image with
    /// no known footprint never matches a bounds filter.
    pub fn matches(&self, image: &ImageMetadata) -> bool {
        match self {
            Filter::Date(range) => range.contains(image.time_start),
            Filter::Bounds(region) => match (region.bounds(), image.footprint) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(bounds), Some(footprint)) => bounds.intersects(&footprint),
            },
            Filter::Property { name, comparison, value } => image
                .property(name)
                .and_then(|v| v.as_f64())
                .map(|left| comparison.holds(left, *value))
                .unwrap_or(false),
            Filter::And(filters) => filters.iter().all(|f| f.matches(image)),
        }
    }

    pub fn to_expr(&self) -> Expr {
        match self {
            Filter::Date(range) => Expr::call(
                "Filter.dateRangeContains",
                [
                    (
                        "leftValue",
                        Expr::call(
                            "DateRange",
                            [
                                ("start", Expr::constant(range.start_millis())),
                                ("end", Expr::constant(range.end_millis())),
                            ],
                        ),
                    ),
                    ("rightField", Expr::string(TIME_START)),
                ],
            ),
            Filter::Bounds(region) => Expr::call(
                "Filter.intersects",
                [
                    ("leftField", Expr::string(".all")),
                    ("rightValue", region.to_expr()),
                ],
            ),
            Filter::Property { name, comparison, value } => Expr::call(
                comparison.algorithm(),
                [
                    ("leftField", Expr::string(name)),
                    ("rightValue", Expr::constant(*value)),
                ],
            ),
            Filter::And(filters) => Expr::call(
                "Filter.and",
                [("filters", Expr::Array(filters.iter().map(Filter::to_expr).collect()))],
            ),
        }
    }
}
