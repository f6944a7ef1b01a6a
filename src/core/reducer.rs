use crate::core::expr::Expr;
use crate::types::GeeError;
use std::str::FromStr;

/// Pixel-wise aggregation across a collection's time dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReducerKind {
    Mean,
    Median,
    /// Most frequent value, for categorical bands
    Mode,
}

impl ReducerKind {
    /// Reducer object for `ImageCollection.reduce`
    pub fn reducer_expr(&self) -> Expr {
        let algorithm = match self {
            ReducerKind::Mean => "Reducer.mean",
            ReducerKind::Median => "Reducer.median",
            ReducerKind::Mode => "Reducer.mode",
        };
        Expr::call(algorithm, Vec::<(String, Expr)>::new())
    }

    /// Composite shortcut that keeps the input band names
    pub fn composite_algorithm(&self) -> &'static str {
        match self {
            ReducerKind::Mean => "ImageCollection.mean",
            ReducerKind::Median => "ImageCollection.median",
            ReducerKind::Mode => "ImageCollection.mode",
        }
    }

    /// Suffix the platform appends to band names when reducing explicitly
    pub fn band_suffix(&self) -> &'static str {
        match self {
            ReducerKind::Mean => "_mean",
            ReducerKind::Median => "_median",
            ReducerKind::Mode => "_mode",
        }
    }
}

impl std::fmt::Display for ReducerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReducerKind::Mean => write!(f, "mean"),
            ReducerKind::Median => write!(f, "median"),
            ReducerKind::Mode => write!(f, "mode"),
        }
    }
}

impl FromStr for ReducerKind {
    type Err = GeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(ReducerKind::Mean),
            "median" => Ok(ReducerKind::Median),
            "mode" => Ok(ReducerKind::Mode),
            _ => Err(GeeError::InvalidParameter(format!("Unknown reducer: {}", s))),
        }
    }
}
