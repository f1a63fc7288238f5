use std::collections::BTreeSet;

use foundation::{Aabb2, EntityId};
use geo::{ChamberlainDuquetteArea, Coord, LineString, MultiPolygon, Polygon};
use serde_json::{Map, Value};

/// Property names that carry the glacier id, in lookup order.
///
/// Older inventory vintages only have `SGI`; cleaned files copy it to `sgi-id`.
pub const DEFAULT_ID_FIELDS: [&str; 2] = ["sgi-id", "SGI"];

const SQUARE_METERS_PER_KM2: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub id_fields: Vec<String>,
    /// Numeric property holding a precomputed area in km². When absent on a
    /// feature the geodesic area of its geometry is used.
    pub area_field: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            id_fields: DEFAULT_ID_FIELDS.iter().map(|s| s.to_string()).collect(),
            area_field: None,
        }
    }
}

/// One polygonal glacier outline with its validated id and area.
#[derive(Debug, Clone, PartialEq)]
pub struct GlacierFeature {
    /// Position of the feature in the source `features` array.
    pub index: usize,
    pub feature_id: Option<String>,
    pub entity: EntityId,
    pub geometry: MultiPolygon<f64>,
    pub area_km2: f64,
    pub bounds: Aabb2,
    pub properties: Map<String, Value>,
}

/// Why a feature was left out of the typed collection.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureDiagnostic {
    NotAFeature { index: usize },
    MissingEntityId { index: usize },
    UnsupportedGeometry { index: usize, kind: String },
    InvalidGeometry { index: usize, reason: String },
}

impl FeatureDiagnostic {
    pub fn index(&self) -> usize {
        match self {
            FeatureDiagnostic::NotAFeature { index }
            | FeatureDiagnostic::MissingEntityId { index }
            | FeatureDiagnostic::UnsupportedGeometry { index, .. }
            | FeatureDiagnostic::InvalidGeometry { index, .. } => *index,
        }
    }
}

impl std::fmt::Display for FeatureDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureDiagnostic::NotAFeature { index } => {
                write!(f, "feature {index}: not a GeoJSON Feature object")
            }
            FeatureDiagnostic::MissingEntityId { index } => {
                write!(f, "feature {index}: no glacier id property")
            }
            FeatureDiagnostic::UnsupportedGeometry { index, kind } => {
                write!(f, "feature {index}: unsupported geometry type {kind}")
            }
            FeatureDiagnostic::InvalidGeometry { index, reason } => {
                write!(f, "feature {index}: invalid geometry: {reason}")
            }
        }
    }
}

#[derive(Debug)]
pub enum CollectionError {
    Json(serde_json::Error),
    NotAFeatureCollection,
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionError::Json(e) => write!(f, "JSON parse error: {e}"),
            CollectionError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
        }
    }
}

impl std::error::Error for CollectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectionError::Json(e) => Some(e),
            CollectionError::NotAFeatureCollection => None,
        }
    }
}

/// Glacier outlines of a single survey year.
///
/// Only features with a glacier id and polygonal geometry make it into
/// `features`; everything else is reported in `diagnostics`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlacierCollection {
    pub features: Vec<GlacierFeature>,
    pub diagnostics: Vec<FeatureDiagnostic>,
}

impl GlacierCollection {
    pub fn from_geojson_str(payload: &str, options: &ParseOptions) -> Result<Self, CollectionError> {
        let value: Value = serde_json::from_str(payload).map_err(CollectionError::Json)?;
        Self::from_geojson_value(&value, options)
    }

    pub fn from_geojson_value(value: &Value, options: &ParseOptions) -> Result<Self, CollectionError> {
        let obj = value
            .as_object()
            .ok_or(CollectionError::NotAFeatureCollection)?;
        if obj.get("type").and_then(|v| v.as_str()) != Some("FeatureCollection") {
            return Err(CollectionError::NotAFeatureCollection);
        }
        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(CollectionError::NotAFeatureCollection)?;

        let mut out = GlacierCollection::default();
        for (index, feat_val) in features_val.iter().enumerate() {
            match parse_feature(index, feat_val, options) {
                Ok(feature) => out.features.push(feature),
                Err(diag) => out.diagnostics.push(diag),
            }
        }
        Ok(out)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn entity_ids(&self) -> BTreeSet<&EntityId> {
        self.features.iter().map(|f| &f.entity).collect()
    }

    pub fn features_of<'a>(
        &'a self,
        entity: &'a EntityId,
    ) -> impl Iterator<Item = &'a GlacierFeature> + 'a {
        self.features.iter().filter(move |f| &f.entity == entity)
    }

    pub fn bounds(&self) -> Aabb2 {
        self.features
            .iter()
            .fold(Aabb2::empty(), |acc, f| acc.union(&f.bounds))
    }

    pub fn entity_bounds(&self, entity: &EntityId) -> Aabb2 {
        self.features_of(entity)
            .fold(Aabb2::empty(), |acc, f| acc.union(&f.bounds))
    }
}

fn parse_feature(
    index: usize,
    value: &Value,
    options: &ParseOptions,
) -> Result<GlacierFeature, FeatureDiagnostic> {
    let obj = value
        .as_object()
        .filter(|o| o.get("type").and_then(|v| v.as_str()) == Some("Feature"))
        .ok_or(FeatureDiagnostic::NotAFeature { index })?;

    let feature_id = match obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let properties = obj
        .get("properties")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    let entity = entity_id_from(&properties, &options.id_fields)
        .ok_or(FeatureDiagnostic::MissingEntityId { index })?;

    let geometry = match obj.get("geometry") {
        None | Some(Value::Null) => {
            return Err(FeatureDiagnostic::InvalidGeometry {
                index,
                reason: "feature has no geometry".to_string(),
            });
        }
        Some(g) => parse_polygonal(g)
            .map_err(|e| e.into_diagnostic(index))?,
    };

    let area_km2 = options
        .area_field
        .as_deref()
        .and_then(|key| properties.get(key))
        .and_then(|v| v.as_f64())
        .filter(|a| a.is_finite())
        .unwrap_or_else(|| geometry.chamberlain_duquette_unsigned_area() / SQUARE_METERS_PER_KM2);

    let mut bounds = Aabb2::empty();
    for poly in &geometry.0 {
        for c in &poly.exterior().0 {
            bounds.extend(c.x, c.y);
        }
    }

    Ok(GlacierFeature {
        index,
        feature_id,
        entity,
        geometry,
        area_km2,
        bounds,
        properties,
    })
}

fn entity_id_from(properties: &Map<String, Value>, fields: &[String]) -> Option<EntityId> {
    fields.iter().find_map(|field| match properties.get(field)? {
        Value::String(s) => EntityId::new(s.as_str()),
        Value::Number(n) => EntityId::new(n.to_string()),
        _ => None,
    })
}

enum GeometryProblem {
    Unsupported(String),
    Invalid(String),
}

impl GeometryProblem {
    fn into_diagnostic(self, index: usize) -> FeatureDiagnostic {
        match self {
            GeometryProblem::Unsupported(kind) => {
                FeatureDiagnostic::UnsupportedGeometry { index, kind }
            }
            GeometryProblem::Invalid(reason) => FeatureDiagnostic::InvalidGeometry { index, reason },
        }
    }
}

fn parse_polygonal(value: &Value) -> Result<MultiPolygon<f64>, GeometryProblem> {
    let ty = value
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| GeometryProblem::Invalid("geometry missing type".to_string()))?;
    let coords = value
        .get("coordinates")
        .ok_or_else(|| GeometryProblem::Invalid("geometry missing coordinates".to_string()))?;

    match ty {
        "Polygon" => Ok(MultiPolygon::new(vec![parse_polygon(coords)?])),
        "MultiPolygon" => {
            let polys = coords
                .as_array()
                .ok_or_else(|| GeometryProblem::Invalid("MultiPolygon must be an array".to_string()))?;
            let polys = polys
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>, _>>()?;
            if polys.is_empty() {
                return Err(GeometryProblem::Invalid("MultiPolygon has no polygons".to_string()));
            }
            Ok(MultiPolygon::new(polys))
        }
        other => Err(GeometryProblem::Unsupported(other.to_string())),
    }
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>, GeometryProblem> {
    let rings = value
        .as_array()
        .ok_or_else(|| GeometryProblem::Invalid("polygon must be an array of rings".to_string()))?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings
        .next()
        .ok_or_else(|| GeometryProblem::Invalid("polygon has no rings".to_string()))??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(value: &Value) -> Result<LineString<f64>, GeometryProblem> {
    let positions = value
        .as_array()
        .ok_or_else(|| GeometryProblem::Invalid("ring must be an array".to_string()))?;
    if positions.len() < 3 {
        return Err(GeometryProblem::Invalid(format!(
            "ring needs at least 3 positions, got {}",
            positions.len()
        )));
    }
    let coords = positions
        .iter()
        .map(parse_position)
        .collect::<Result<Vec<_>, _>>()?;
    // Polygon::new closes open rings.
    Ok(LineString::new(coords))
}

fn parse_position(value: &Value) -> Result<Coord<f64>, GeometryProblem> {
    let arr = value
        .as_array()
        .ok_or_else(|| GeometryProblem::Invalid("position must be an array".to_string()))?;
    let lon = arr.first().and_then(|v| v.as_f64());
    let lat = arr.get(1).and_then(|v| v.as_f64());
    match (lon, lat) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(GeometryProblem::Invalid(
            "position must have numeric lon/lat".to_string(),
        )),
    }
}
