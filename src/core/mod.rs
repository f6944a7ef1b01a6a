//! Request-building modules

pub mod expr;
pub mod boundary;
pub mod filter;
pub mod collection;
pub mod reducer;
pub mod cloud_mask;
pub mod band_math;
pub mod visualize;
pub mod export;
pub mod statistics;

// Re-export main types
pub use expr::{Expr, Expression, ValueNode};
pub use boundary::{Boundary, Region};
pub use filter::{Comparison, Filter};
pub use collection::{Extent, Image, ImageCollection};
pub use reducer::ReducerKind;
pub use cloud_mask::CloudMask;
pub use band_math::{ndvi, normalized_difference, NormalizedDifference};
pub use visualize::{LayerSource, MapCenter, MapLayer, MapView, Rgb, VisParams};
pub use export::{ExportDestination, ExportSpec, ExportSpecBuilder};
pub use statistics::{Histogram, RasterStatistics, StatisticsParams};
