//! Features delivered by the vehicle feeds and their classification.

use geojson::Value;
use serde_json::Value as JsonValue;

use crate::error::FeatureError;
use crate::geo::GeoPoint;

mod classifier;
mod properties;

pub use classifier::{FeatureClassifier, FeatureKind};
pub use properties::Properties;

/// Geometry of a [`VehicleFeature`].
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// Single position, e.g. the last known vehicle position.
    Point(GeoPoint),
    /// Path of a vehicle.
    Path(Vec<GeoPoint>),
    /// Several disconnected paths of a vehicle.
    MultiPath(Vec<Vec<GeoPoint>>),
}

impl FeatureGeometry {
    /// Returns the position if the geometry is a point.
    pub fn as_point(&self) -> Option<GeoPoint> {
        match self {
            Self::Point(point) => Some(*point),
            _ => None,
        }
    }

    /// Returns the geometry as a list of paths. A point has no paths.
    pub fn paths(&self) -> Vec<Vec<GeoPoint>> {
        match self {
            Self::Point(_) => vec![],
            Self::Path(path) => vec![path.clone()],
            Self::MultiPath(paths) => paths.clone(),
        }
    }
}

impl TryFrom<&geojson::Geometry> for FeatureGeometry {
    type Error = FeatureError;

    fn try_from(geometry: &geojson::Geometry) -> Result<Self, Self::Error> {
        match &geometry.value {
            Value::Point(position) => Ok(Self::Point(GeoPoint::try_from_position(position)?)),
            Value::LineString(line) => Ok(Self::Path(convert_path(line)?)),
            Value::MultiLineString(lines) => Ok(Self::MultiPath(
                lines
                    .iter()
                    .map(|line| convert_path(line))
                    .collect::<Result<_, _>>()?,
            )),
            other => Err(FeatureError::InvalidGeometry(format!(
                "unsupported geometry type {}",
                geometry_type_name(other)
            ))),
        }
    }
}

fn geometry_type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn convert_path(line: &[Vec<f64>]) -> Result<Vec<GeoPoint>, FeatureError> {
    line.iter()
        .map(|position| GeoPoint::try_from_position(position))
        .collect()
}

/// One geographic record of a vehicle feed.
///
/// The `tag` is the GeoJSON `id` of the feature. Feeds use it to say what the feature is
/// (`track`, `last_pos`, `water_temperature`...), not to identify it uniquely.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleFeature {
    tag: String,
    geometry: FeatureGeometry,
    properties: Properties,
}

impl VehicleFeature {
    /// Creates a new feature.
    pub fn new(tag: impl Into<String>, geometry: FeatureGeometry, properties: Properties) -> Self {
        Self {
            tag: tag.into(),
            geometry,
            properties,
        }
    }

    /// Tag used to classify the feature.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Geometry of the feature.
    pub fn geometry(&self) -> &FeatureGeometry {
        &self.geometry
    }

    /// Display properties of the feature.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Position of the feature, failing if the geometry is not a point.
    pub fn position(&self) -> Result<GeoPoint, FeatureError> {
        self.geometry.as_point().ok_or_else(|| {
            FeatureError::InvalidGeometry(format!("feature '{}' must be a point", self.tag))
        })
    }
}

impl TryFrom<geojson::Feature> for VehicleFeature {
    type Error = FeatureError;

    fn try_from(feature: geojson::Feature) -> Result<Self, Self::Error> {
        let tag = feature_tag(&feature).ok_or(FeatureError::MissingTag)?;

        let geometry = feature
            .geometry
            .as_ref()
            .ok_or(FeatureError::MissingGeometry)
            .and_then(FeatureGeometry::try_from)?;

        let properties = feature
            .properties
            .map(Properties::from)
            .unwrap_or_default();

        Ok(Self {
            tag,
            geometry,
            properties,
        })
    }
}

/// Tag of a GeoJSON feature: its `id`, converted to a string if numeric.
pub(crate) fn feature_tag(feature: &geojson::Feature) -> Option<String> {
    match &feature.id {
        Some(geojson::feature::Id::String(tag)) => Some(tag.clone()),
        Some(geojson::feature::Id::Number(number)) => Some(number.to_string()),
        None => None,
    }
}

/// Reads a GeoJSON-like point object (`{"type": "Point", "coordinates": [lon, lat]}`) stored in a
/// property value.
pub(crate) fn point_from_json(property: &str, value: &JsonValue) -> Result<GeoPoint, FeatureError> {
    let coordinates = value
        .get("coordinates")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| FeatureError::InvalidProperty {
            property: property.to_string(),
            expected: "a point with coordinates",
        })?;

    let position = coordinates
        .iter()
        .map(JsonValue::as_f64)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| FeatureError::InvalidProperty {
            property: property.to_string(),
            expected: "numeric coordinates",
        })?;

    GeoPoint::try_from_position(&position)
}
