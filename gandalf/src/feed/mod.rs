//! Vehicle feeds: where they are loaded from, how their features are styled and which layers they
//! populate.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::GandalfError;
use crate::feature::{FeatureClassifier, FeatureKind};
use crate::marker::MarkerProfile;

mod loader;

pub use loader::{apply, FeedLoader, FetchedFeed};

/// Layer a feed puts the markers of one feature kind into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerRole {
    /// Vehicle tracks.
    Track,
    /// Last known positions.
    Positions,
    /// Waypoints, both standalone and attached to last positions.
    Waypoints,
    /// Surface markers without a sensor layer.
    Markers,
}

impl LayerRole {
    /// All roles.
    pub const ALL: [LayerRole; 4] = [Self::Track, Self::Positions, Self::Waypoints, Self::Markers];

    /// Suffix of the layer name.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Positions => "positions",
            Self::Waypoints => "waypoints",
            Self::Markers => "markers",
        }
    }
}

impl From<FeatureKind> for LayerRole {
    fn from(kind: FeatureKind) -> Self {
        match kind {
            FeatureKind::Track => Self::Track,
            FeatureKind::LastPosition => Self::Positions,
            FeatureKind::SurfaceMarker => Self::Markers,
            FeatureKind::Waypoint => Self::Waypoints,
        }
    }
}

fn default_show_on_load() -> bool {
    true
}

/// One vehicle feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedDefinition {
    /// Unique name of the feed. Layer names of the feed are derived from it.
    pub name: String,
    /// Url of the GeoJSON feature collection.
    pub url: String,
    /// Url of the vehicle configuration feed, loaded before the feature collection.
    #[serde(default)]
    pub config_url: Option<String>,
    /// Appends a timestamp to request urls so that caches are bypassed.
    #[serde(default)]
    pub cache_bust: bool,
    /// Styling rules of the vehicle class.
    #[serde(default)]
    pub profile: MarkerProfile,
    /// Sensor tags of the feed and the layers their surface markers go to.
    #[serde(default)]
    pub sensor_layers: BTreeMap<String, String>,
    /// Sensor layer shown when the feed is loaded for the first time.
    #[serde(default)]
    pub default_layer: Option<String>,
    /// Whether the track, position, waypoint and marker layers are shown on the first load.
    #[serde(default = "default_show_on_load")]
    pub show_on_load: bool,
}

impl FeedDefinition {
    /// Creates a definition with the default profile and no sensors.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            config_url: None,
            cache_bust: false,
            profile: MarkerProfile::default(),
            sensor_layers: BTreeMap::new(),
            default_layer: None,
            show_on_load: true,
        }
    }

    /// Name of the layer with the given role, `<feed>.<role>`.
    pub fn layer_name(&self, role: LayerRole) -> String {
        format!("{}.{}", self.name, role.suffix())
    }

    /// Classifier knowing the sensor tags of the feed.
    pub fn classifier(&self) -> FeatureClassifier {
        self.sensor_layers
            .iter()
            .fold(FeatureClassifier::new(), |classifier, (tag, layer)| {
                classifier.with_sensor(tag, layer)
            })
    }

    /// Returns true if the feed can populate a layer with this name.
    pub fn knows_layer(&self, layer: &str) -> bool {
        LayerRole::ALL
            .iter()
            .any(|role| self.layer_name(*role) == layer)
            || self.sensor_layers.values().any(|name| name == layer)
    }

    /// Checks that the definition is consistent.
    pub fn validate(&self) -> Result<(), GandalfError> {
        if self.name.is_empty() {
            return Err(GandalfError::Configuration(
                "feed name cannot be empty".to_string(),
            ));
        }

        if self.url.is_empty() {
            return Err(GandalfError::Configuration(format!(
                "feed {} has no url",
                self.name
            )));
        }

        if let Some(layer) = &self.default_layer {
            if !self.knows_layer(layer) {
                return Err(GandalfError::Configuration(format!(
                    "default layer {layer} of feed {} is not one of its layers",
                    self.name
                )));
            }
        }

        self.profile
            .validate()
            .map_err(|reason| GandalfError::Configuration(format!("feed {}: {reason}", self.name)))
    }
}

/// Contents of the vehicle configuration feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Sensor layers to create before the features are loaded.
    #[serde(default)]
    pub surf_marker_layers: Vec<String>,
}

/// Counts of what happened to the features of a feed.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedSummary {
    /// Markers added, not counting waypoints attached to last positions.
    pub added: usize,
    /// Waypoint markers attached to last positions.
    pub waypoints: usize,
    /// Features with a tag the classifier does not know.
    pub skipped: usize,
    /// Features that could not be turned into markers.
    pub rejected: usize,
}

/// Load status of a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FeedStatus {
    /// The feed was not loaded yet.
    #[default]
    Pending,
    /// The last load succeeded.
    Loaded(FeedSummary),
    /// The last load failed.
    Unavailable {
        /// Failure description.
        reason: String,
    },
}

impl Display for FeedStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Loaded(summary) => write!(
                f,
                "loaded, {} markers, {} waypoints, {} skipped, {} rejected",
                summary.added, summary.waypoints, summary.skipped, summary.rejected
            ),
            Self::Unavailable { reason } => write!(f, "unavailable: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn wave_glider() -> FeedDefinition {
        let mut feed = FeedDefinition::new("sv3-076", "/data/gandalf/sv3-076.json");
        feed.sensor_layers
            .insert("water_temperature".into(), "WG_Water_Temp_Layer".into());
        feed.sensor_layers
            .insert("salinity".into(), "WG_Sal_Layer".into());
        feed.default_layer = Some("WG_Water_Temp_Layer".into());
        feed
    }

    #[test]
    fn layer_names() {
        let feed = wave_glider();
        assert_eq!(feed.layer_name(LayerRole::Track), "sv3-076.track");
        assert_eq!(feed.layer_name(LayerRole::Waypoints), "sv3-076.waypoints");
        assert!(feed.knows_layer("sv3-076.positions"));
        assert!(feed.knows_layer("WG_Sal_Layer"));
        assert!(!feed.knows_layer("WG_Wind_Speed_Layer"));
    }

    #[test]
    fn classifier_knows_sensors() {
        let classifier = wave_glider().classifier();
        assert_eq!(
            classifier.classify_tag("salinity"),
            Ok(FeatureKind::SurfaceMarker)
        );
        assert_eq!(classifier.sensor_layer("salinity"), Some("WG_Sal_Layer"));
    }

    #[test]
    fn validation() {
        assert!(wave_glider().validate().is_ok());

        let mut feed = wave_glider();
        feed.default_layer = Some("WG_Wind_Speed_Layer".into());
        assert_matches!(feed.validate(), Err(GandalfError::Configuration(_)));

        let feed = FeedDefinition::new("argo", "");
        assert_matches!(feed.validate(), Err(GandalfError::Configuration(_)));
    }

    #[test]
    fn deserialize_definition() {
        let feed: FeedDefinition = serde_json::from_str(
            r#"{
                "name": "argo",
                "url": "/data/gandalf/argo.json",
                "profile": {
                    "surface_style": {
                        "rule": "fixed",
                        "radius": 3, "color": "yellow", "fill_color": "yellow",
                        "opacity": 1, "fill_opacity": 1, "weight": 0.5
                    },
                    "tooltip_prefix": "ARGO Float"
                }
            }"#,
        )
        .unwrap();

        assert!(feed.show_on_load);
        assert!(!feed.cache_bust);
        assert_eq!(feed.profile.tooltip_prefix.as_deref(), Some("ARGO Float"));
        assert!(feed.validate().is_ok());
    }

    #[test]
    fn status_display() {
        let status = FeedStatus::Loaded(FeedSummary {
            added: 2,
            waypoints: 1,
            skipped: 1,
            rejected: 0,
        });
        insta::assert_snapshot!(status.to_string(), @"loaded, 2 markers, 1 waypoints, 1 skipped, 0 rejected");
    }
}
