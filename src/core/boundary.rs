//! Study-area boundaries and the regions derived from them.

use crate::core::expr::Expr;
use crate::types::{BoundingBox, Geometry};

/// Spatial region used for bounds filtering, clipping and export
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// Union geometry of a stored table asset. `geometry` is the locally
    /// known shape, if any; the platform remains the source of truth.
    Asset {
        asset_id: String,
        geometry: Option<Geometry>,
    },
    /// Literal geometry sent with the request
    Literal(Geometry),
}

impl Region {
    pub fn to_expr(&self) -> Expr {
        match self {
            Region::Asset { asset_id, .. } => Expr::call(
                "Collection.geometry",
                [("collection", load_table(asset_id))],
            ),
            Region::Literal(geometry) => geometry_expr(geometry),
        }
    }

    /// Bounding box of the locally known geometry
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.geometry().and_then(Geometry::bounds)
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match self {
            Region::Asset { geometry, .. } => geometry.as_ref(),
            Region::Literal(geometry) => Some(geometry),
        }
    }
}

impl From<Geometry> for Region {
    fn from(geometry: Geometry) -> Self {
        Region::Literal(geometry)
    }
}

impl From<BoundingBox> for Region {
    fn from(bbox: BoundingBox) -> Self {
        Region::Literal(bbox.to_geometry())
    }
}

impl From<&Boundary> for Region {
    fn from(boundary: &Boundary) -> Self {
        boundary.geometry()
    }
}

/// Reference to a stored vector asset (polygon or multipolygon features).
///
/// Loading performs no validation: a missing or malformed asset only
/// surfaces when the platform evaluates a request that uses it.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    asset_id: String,
    geometry: Option<Geometry>,
}

impl Boundary {
    pub fn load(asset_id: &str) -> Self {
        log::debug!("Referencing boundary asset: {}", asset_id);
        Self {
            asset_id: asset_id.to_string(),
            geometry: None,
        }
    }

    /// Attach the locally known shape of the asset (e.g. read from GeoJSON)
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    /// The feature collection itself, for display layers
    pub fn to_expr(&self) -> Expr {
        load_table(&self.asset_id)
    }

    /// Union geometry of all features, used as clip and export region
    pub fn geometry(&self) -> Region {
        Region::Asset {
            asset_id: self.asset_id.clone(),
            geometry: self.geometry.clone(),
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.geometry.as_ref().and_then(Geometry::bounds)
    }
}

fn load_table(asset_id: &str) -> Expr {
    Expr::call("Collection.loadTable", [("tableId", Expr::string(asset_id))])
}

fn geometry_expr(geometry: &Geometry) -> Expr {
    let (constructor, coordinates) = match geometry {
        Geometry::Polygon { coordinates } => (
            "GeometryConstructors.Polygon",
            serde_json::json!(coordinates),
        ),
        Geometry::MultiPolygon { coordinates } => (
            "GeometryConstructors.MultiPolygon",
            serde_json::json!(coordinates),
        ),
    };
    Expr::call(
        constructor,
        [
            ("coordinates", Expr::Constant(coordinates)),
            ("evenOdd", Expr::constant(true)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTENT: &str = "projects/git712-gds/assets/Extent";

    #[test]
    fn test_boundary_geometry_references_asset() {
        let boundary = Boundary::load(EXTENT);
        let expr = boundary.geometry().to_expr();
        assert_eq!(expr.function_name(), Some("Collection.geometry"));

        let table = expr.argument("collection").unwrap();
        assert_eq!(table.function_name(), Some("Collection.loadTable"));
        assert_eq!(table.argument("tableId"), Some(&Expr::string(EXTENT)));
    }

    #[test]
    fn test_boundary_bounds_only_when_known() {
        let boundary = Boundary::load(EXTENT);
        assert!(boundary.bounds().is_none());

        let bbox = BoundingBox::new(18.9, -34.05, 19.05, -33.95).unwrap();
        let boundary = boundary.with_geometry(bbox.to_geometry());
        assert_eq!(boundary.bounds(), Some(bbox));
        assert_eq!(boundary.geometry().bounds(), Some(bbox));
    }

    #[test]
    fn test_literal_region_encodes_coordinates() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let expr = Region::from(bbox).to_expr();
        assert_eq!(expr.function_name(), Some("GeometryConstructors.Polygon"));
        match expr.argument("coordinates") {
            Some(Expr::Constant(value)) => assert_eq!(value[0][2], serde_json::json!([1.0, 1.0])),
            other => panic!("unexpected coordinates: {:?}", other),
        }
    }
}
