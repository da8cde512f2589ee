//! Portal configuration: the initial view, the vehicle feeds, exclusivity groups, control
//! bindings, overlays and fetch settings, read from a JSON document.
//!
//! ```json
//! {
//!   "view": {"center": {"lat": 27.0, "lon": -90.0}, "zoom": 6},
//!   "feeds": [{"name": "usf-sam", "url": "https://gandalf.gcoos.org/data/usf-sam.json"}],
//!   "groups": [{"name": "wave_glider", "members": ["WG_Water_Temp_Layer", "WG_Sal_Layer"]}],
//!   "controls": {"glider-track": {"action": "layer", "layer": "usf-sam.track"}},
//!   "overlays": {"include_defaults": true, "extra": []},
//!   "fetch": {"timeout_secs": 30}
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use ahash::HashSet;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::control::{ControlPanel, ToggleAction};
use crate::error::GandalfError;
use crate::feed::{FeedDefinition, FeedStatus};
use crate::layer::ExclusivityGroup;
use crate::map::{Map, MapView};
use crate::overlay::{default_overlays, Overlay, OverlayCollection};
use crate::platform::native::{NativePlatformService, DEFAULT_USER_AGENT};

fn default_include_defaults() -> bool {
    true
}

/// Which overlays the map session has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySettings {
    /// Whether the portal's default oceanographic overlays are added.
    #[serde(default = "default_include_defaults")]
    pub include_defaults: bool,
    /// Additional overlays. An overlay named like a default one replaces it.
    #[serde(default)]
    pub extra: Vec<Overlay>,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            include_defaults: true,
            extra: vec![],
        }
    }
}

/// Settings of the HTTP client loading the feeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSettings {
    /// Request timeout in seconds. Without it a hung request leaves the feed pending.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// User agent of the requests.
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Configuration of a portal session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Initial view of the map.
    pub view: MapView,
    /// Vehicle feeds.
    pub feeds: Vec<FeedDefinition>,
    /// Exclusivity groups of layers.
    pub groups: Vec<ExclusivityGroup>,
    /// Control ids and the actions they are bound to.
    pub controls: BTreeMap<String, ToggleAction>,
    /// Overlays.
    pub overlays: OverlaySettings,
    /// HTTP client settings.
    pub fetch: FetchSettings,
}

impl PortalConfig {
    /// Parses and validates a configuration.
    pub fn from_json_str(json: &str) -> Result<Self, GandalfError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GandalfError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks that names are unique and that every control refers to a defined group or overlay.
    pub fn validate(&self) -> Result<(), GandalfError> {
        let mut feed_names = HashSet::default();
        for feed in &self.feeds {
            feed.validate()?;
            if !feed_names.insert(feed.name.as_str()) {
                return Err(GandalfError::Configuration(format!(
                    "feed {} is defined twice",
                    feed.name
                )));
            }
        }

        let mut group_names = HashSet::default();
        for group in &self.groups {
            if group.members().is_empty() {
                return Err(GandalfError::Configuration(format!(
                    "group {} has no members",
                    group.name()
                )));
            }
            if !group_names.insert(group.name()) {
                return Err(GandalfError::Configuration(format!(
                    "group {} is defined twice",
                    group.name()
                )));
            }
        }

        for overlay in &self.overlays.extra {
            overlay.validate()?;
        }
        let overlays = self.overlay_names();

        for (control, action) in &self.controls {
            let unknown = match action {
                ToggleAction::Layer { layer } => {
                    self.warn_unknown_layer(control, layer);
                    None
                }
                ToggleAction::Exclusive { layer, group } => {
                    self.warn_unknown_layer(control, layer);
                    (!group_names.contains(group.as_str())).then(|| format!("group {group}"))
                }
                ToggleAction::ClearGroup { group } => {
                    (!group_names.contains(group.as_str())).then(|| format!("group {group}"))
                }
                ToggleAction::OverlayOpacity { overlay }
                | ToggleAction::OverlayElevation { overlay } => {
                    (!overlays.contains(overlay)).then(|| format!("overlay {overlay}"))
                }
            };

            if let Some(unknown) = unknown {
                return Err(GandalfError::Configuration(format!(
                    "control {control} refers to unknown {unknown}"
                )));
            }
        }

        Ok(())
    }

    /// Overlays of the session, with GIBS products dated relative to `today`.
    pub fn overlay_collection(&self, today: NaiveDate) -> OverlayCollection {
        let mut collection = if self.overlays.include_defaults {
            OverlayCollection::from(default_overlays(today))
        } else {
            OverlayCollection::default()
        };

        for overlay in &self.overlays.extra {
            collection.insert(overlay.clone());
        }

        collection
    }

    /// Creates the map session: view, overlays, exclusivity groups and pending feed statuses.
    pub fn build_map(&self, today: NaiveDate) -> Map {
        let mut map = Map::new(self.view, self.overlay_collection(today));
        for group in &self.groups {
            map.layers_mut().define_group(group.clone());
        }

        for feed in &self.feeds {
            map.set_feed_status(&feed.name, FeedStatus::Pending);
        }

        map
    }

    /// Creates the control panel with all configured bindings.
    pub fn build_panel(&self) -> ControlPanel {
        let mut panel = ControlPanel::new();
        for (control, action) in &self.controls {
            panel.bind(control, action.clone());
        }

        panel
    }

    /// Creates the HTTP platform service with the configured settings.
    pub fn platform(&self) -> Result<NativePlatformService, GandalfError> {
        NativePlatformService::with_settings(
            self.fetch.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT),
            self.fetch_timeout(),
        )
    }

    /// Configured request timeout.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch.timeout_secs.map(Duration::from_secs)
    }

    fn overlay_names(&self) -> Vec<String> {
        let mut names: Vec<String> = if self.overlays.include_defaults {
            default_overlays(NaiveDate::default())
                .iter()
                .map(|overlay| overlay.name().to_string())
                .collect()
        } else {
            vec![]
        };

        names.extend(self.overlays.extra.iter().map(|o| o.name().to_string()));
        names
    }

    fn warn_unknown_layer(&self, control: &str, layer: &str) {
        let known = self.feeds.iter().any(|feed| feed.knows_layer(layer))
            || self.groups.iter().any(|group| group.contains(layer));
        if !known {
            warn!("Control {control} refers to layer {layer} that no feed populates");
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::control::{ControlEvent, ControlInput};

    const CONFIG: &str = r#"{
        "view": {"center": {"lat": 27.5, "lon": -90.0}, "zoom": 7},
        "feeds": [
            {"name": "usf-sam", "url": "https://gandalf.gcoos.org/data/usf-sam.json"},
            {
                "name": "sv3-076",
                "url": "https://gandalf.gcoos.org/data/sv3-076.json",
                "config_url": "https://gandalf.gcoos.org/configs/sv3-076.cfg",
                "cache_bust": true,
                "sensor_layers": {
                    "water_temperature": "WG_Water_Temp_Layer",
                    "salinity": "WG_Sal_Layer"
                },
                "default_layer": "WG_Water_Temp_Layer",
                "profile": {"surface_style": {"rule": "age_scaled", "divisor": 10}}
            }
        ],
        "groups": [
            {"name": "wave_glider", "members": ["WG_Water_Temp_Layer", "WG_Sal_Layer"], "scope": "registry"}
        ],
        "controls": {
            "glider-track": {"action": "layer", "layer": "usf-sam.track"},
            "wg-sal": {"action": "exclusive", "layer": "WG_Sal_Layer", "group": "wave_glider"},
            "salinity-depth": {"action": "overlay_elevation", "overlay": "rtofs_salinity"}
        },
        "fetch": {"timeout_secs": 20}
    }"#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date")
    }

    #[test]
    fn full_config() {
        let config = PortalConfig::from_json_str(CONFIG).unwrap();
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.view.zoom, 7.0);
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(20)));
        assert!(config.overlays.include_defaults);

        let mut map = config.build_map(today());
        assert!(map.layers().group("wave_glider").is_some());
        assert!(map.overlays().get("rtofs_salinity").is_some());
        assert_eq!(map.feeds().count(), 2);

        let panel = config.build_panel();
        assert_eq!(panel.controls(), vec!["glider-track", "salinity-depth", "wg-sal"]);
        let event = ControlEvent::new("wg-sal", ControlInput::Checked(true));
        assert!(panel.handle(&event, &mut map).unwrap());
        assert!(map.layers().is_visible("WG_Sal_Layer"));
    }

    #[test]
    fn empty_config() {
        let config = PortalConfig::from_json_str("{}").unwrap();
        assert!(config.feeds.is_empty());
        assert_eq!(config.view, MapView::default());
        assert!(!config.build_map(today()).overlays().is_empty());
    }

    #[test]
    fn extra_overlays_replace_defaults() {
        let config = PortalConfig::from_json_str(
            r#"{"overlays": {"extra": [{
                "name": "eez",
                "source": {"kind": "tiles", "url": "https://tiles.example.com/eez/{z}/{x}/{y}.png"},
                "opacity": 0.5
            }]}}"#,
        )
        .unwrap();

        let overlays = config.overlay_collection(today());
        assert_eq!(overlays.len(), default_overlays(today()).len());
        assert_eq!(overlays.get("eez").map(Overlay::opacity), Some(0.5));
    }

    #[test]
    fn invalid_configs() {
        let duplicate = r#"{"feeds": [
            {"name": "a", "url": "https://a"},
            {"name": "a", "url": "https://b"}
        ]}"#;
        assert_matches!(
            PortalConfig::from_json_str(duplicate),
            Err(GandalfError::Configuration(_))
        );

        let unknown_group = r#"{"controls": {"none": {"action": "clear_group", "group": "argo"}}}"#;
        assert_matches!(
            PortalConfig::from_json_str(unknown_group),
            Err(GandalfError::Configuration(reason)) if reason.contains("group argo")
        );

        let unknown_overlay = r#"{
            "overlays": {"include_defaults": false},
            "controls": {"sst": {"action": "overlay_opacity", "overlay": "lsu_sst"}}
        }"#;
        assert_matches!(
            PortalConfig::from_json_str(unknown_overlay),
            Err(GandalfError::Configuration(reason)) if reason.contains("overlay lsu_sst")
        );

        let bad_divisor = r#"{"feeds": [{"name": "wg", "url": "https://wg",
            "profile": {"surface_style": {"rule": "age_scaled", "divisor": 0}}}]}"#;
        assert_matches!(
            PortalConfig::from_json_str(bad_divisor),
            Err(GandalfError::Configuration(_))
        );

        assert_matches!(
            PortalConfig::from_json_str("{\"feeds\": 3}"),
            Err(GandalfError::Decoding(_))
        );
    }

    #[test]
    fn missing_file() {
        assert_matches!(
            PortalConfig::from_file("/nonexistent/gandalf.json"),
            Err(GandalfError::FsIo(_))
        );
    }
}
