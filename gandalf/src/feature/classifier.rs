use std::fmt::{Display, Formatter};

use ahash::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::FeatureError;
use crate::feature::VehicleFeature;

/// Rendering role of a feature.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Path travelled by a vehicle.
    Track,
    /// Last known position of a vehicle.
    LastPosition,
    /// Surfacing or sensor reading location.
    SurfaceMarker,
    /// Next waypoint of a vehicle.
    Waypoint,
}

impl FeatureKind {
    /// All feature kinds.
    pub const ALL: [FeatureKind; 4] = [
        FeatureKind::Track,
        FeatureKind::LastPosition,
        FeatureKind::SurfaceMarker,
        FeatureKind::Waypoint,
    ];

    /// Canonical feature tag of the kind.
    pub fn canonical_tag(&self) -> &'static str {
        match self {
            FeatureKind::Track => "track",
            FeatureKind::LastPosition => "last_position",
            FeatureKind::SurfaceMarker => "surface_marker",
            FeatureKind::Waypoint => "waypoint",
        }
    }

    /// Kind named by a canonical tag or by one of the short tags the vehicle feeds emit
    /// (`last_pos`, `surf_marker`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "track" => Some(FeatureKind::Track),
            "last_position" | "last_pos" => Some(FeatureKind::LastPosition),
            "surface_marker" | "surf_marker" => Some(FeatureKind::SurfaceMarker),
            "waypoint" => Some(FeatureKind::Waypoint),
            _ => None,
        }
    }
}

impl Display for FeatureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical_tag())
    }
}

/// Maps feature tags to their [`FeatureKind`].
///
/// Besides the canonical tags, a classifier knows the sensor tags of its feed. A sensor tag
/// (e.g. `water_temperature`) classifies as [`FeatureKind::SurfaceMarker`] and names the layer its
/// markers go to.
#[derive(Debug, Clone, Default)]
pub struct FeatureClassifier {
    sensor_layers: HashMap<String, String>,
}

impl FeatureClassifier {
    /// Creates a classifier that knows only the canonical tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sensor tag and the layer its markers belong to.
    pub fn with_sensor(mut self, tag: impl Into<String>, layer: impl Into<String>) -> Self {
        self.sensor_layers.insert(tag.into(), layer.into());
        self
    }

    /// Classifies the feature by its tag.
    pub fn classify(&self, feature: &VehicleFeature) -> Result<FeatureKind, FeatureError> {
        self.classify_tag(feature.tag())
    }

    /// Classifies a raw feature tag.
    pub fn classify_tag(&self, tag: &str) -> Result<FeatureKind, FeatureError> {
        if let Some(kind) = FeatureKind::from_tag(tag) {
            return Ok(kind);
        }

        if self.sensor_layers.contains_key(tag) {
            return Ok(FeatureKind::SurfaceMarker);
        }

        Err(FeatureError::Unrecognized(tag.to_string()))
    }

    /// Layer for the markers of a sensor tag, if the tag is a sensor tag.
    pub fn sensor_layer(&self, tag: &str) -> Option<&str> {
        self.sensor_layers.get(tag).map(String::as_str)
    }

    /// Returns true if any sensor tag maps to the given layer.
    pub fn knows_layer(&self, layer: &str) -> bool {
        self.sensor_layers.values().any(|name| name == layer)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::feature::{FeatureGeometry, Properties};
    use crate::latlon;

    fn feature(tag: &str) -> VehicleFeature {
        VehicleFeature::new(
            tag,
            FeatureGeometry::Point(latlon!(27.0, -88.0)),
            Properties::default(),
        )
    }

    #[test]
    fn canonical_tags_round_trip() {
        let classifier = FeatureClassifier::new();
        for kind in FeatureKind::ALL {
            assert_eq!(classifier.classify(&feature(kind.canonical_tag())), Ok(kind));
        }
    }

    #[test]
    fn short_tags() {
        let classifier = FeatureClassifier::new();
        assert_eq!(
            classifier.classify(&feature("last_pos")),
            Ok(FeatureKind::LastPosition)
        );
        assert_eq!(
            classifier.classify(&feature("surf_marker")),
            Ok(FeatureKind::SurfaceMarker)
        );
    }

    #[test]
    fn unknown_tag_is_unrecognized() {
        let classifier = FeatureClassifier::new();
        assert_matches!(
            classifier.classify(&feature("eez_warning")),
            Err(FeatureError::Unrecognized(tag)) if tag == "eez_warning"
        );
    }

    #[test]
    fn sensor_tags() {
        let classifier =
            FeatureClassifier::new().with_sensor("water_temperature", "WG_Water_Temp_Layer");

        assert_eq!(
            classifier.classify(&feature("water_temperature")),
            Ok(FeatureKind::SurfaceMarker)
        );
        assert_eq!(
            classifier.sensor_layer("water_temperature"),
            Some("WG_Water_Temp_Layer")
        );
        assert!(classifier.knows_layer("WG_Water_Temp_Layer"));
        assert!(classifier.classify(&feature("salinity")).is_err());
    }
}
