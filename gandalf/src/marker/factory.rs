use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FeatureError;
use crate::feature::{point_from_json, FeatureKind, Properties, VehicleFeature};
use crate::marker::{CircleMarker, CircleStyle, Icon, IconMarker, Marker, TrackMarker, TrackStyle};

/// Drawing order step of age scaled surface markers per pixel of radius.
const Z_INDEX_PER_RADIUS: i64 = 25_000;

/// How the style of a track is chosen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TrackStyleRule {
    /// Style is read from the `style` object of the feature. Keys missing from the object take
    /// the values of [`TrackStyle::default`].
    #[default]
    Properties,
    /// All tracks of the feed use the same style.
    Fixed(TrackStyle),
}

/// How the style of a surface marker is chosen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SurfaceStyleRule {
    /// `radius`, `marker_color`, `fillColor`, `opacity`, `fillOpacity` and `weight` are read from
    /// the feature properties. All of them are required.
    #[default]
    Properties,
    /// All surface markers of the feed use the same style.
    Fixed(CircleStyle),
    /// Like [`SurfaceStyleRule::Properties`], but the radius grows with the `days_wet` property:
    /// `radius = trunc(|days_wet / divisor|)`. Older markers are drawn above younger ones.
    AgeScaled {
        /// Number of days per pixel of radius.
        divisor: f64,
    },
}

/// Styling rules for one vehicle class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerProfile {
    /// Track styling.
    pub track_style: TrackStyleRule,
    /// Surface marker styling.
    pub surface_style: SurfaceStyleRule,
    /// When set, surface markers get a `"<prefix> <platform>"` tooltip, e.g. `ARGO Float 4903245`.
    pub tooltip_prefix: Option<String>,
    /// The feed has no last position feature. The vehicle position is drawn from the surface
    /// marker with `index` 0, which carries the last position properties.
    pub position_from_index: bool,
}

impl MarkerProfile {
    /// Checks that the profile rules can be applied.
    pub fn validate(&self) -> Result<(), String> {
        if let SurfaceStyleRule::AgeScaled { divisor } = self.surface_style {
            if !(divisor.is_finite() && divisor > 0.0) {
                return Err(format!(
                    "age scale divisor must be a positive number, got {divisor}"
                ));
            }
        }

        Ok(())
    }
}

/// Markers built from one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltMarkers {
    /// The marker representing the feature itself.
    pub marker: Marker,
    /// Waypoint marker, for last positions that carry a waypoint.
    pub waypoint: Option<Marker>,
    /// Vehicle position drawn from a surface marker, see [`MarkerProfile::position_from_index`].
    pub position: Option<Marker>,
}

impl From<Marker> for BuiltMarkers {
    fn from(marker: Marker) -> Self {
        Self {
            marker,
            waypoint: None,
            position: None,
        }
    }
}

/// Builds markers from classified features according to a [`MarkerProfile`].
#[derive(Debug, Clone, Default)]
pub struct MarkerFactory {
    profile: MarkerProfile,
}

impl MarkerFactory {
    /// Creates a new factory.
    pub fn new(profile: MarkerProfile) -> Self {
        Self { profile }
    }

    /// Builds markers for a feature of the given kind.
    pub fn build(
        &self,
        kind: FeatureKind,
        feature: &VehicleFeature,
    ) -> Result<BuiltMarkers, FeatureError> {
        match kind {
            FeatureKind::Track => self.track(feature).map(BuiltMarkers::from),
            FeatureKind::LastPosition => self.last_position(feature),
            FeatureKind::SurfaceMarker => {
                let mut built = BuiltMarkers::from(self.surface_marker(feature)?);
                built.position = self.indexed_position(feature)?;
                Ok(built)
            }
            FeatureKind::Waypoint => self.waypoint(feature).map(BuiltMarkers::from),
        }
    }

    fn track(&self, feature: &VehicleFeature) -> Result<Marker, FeatureError> {
        let paths = feature.geometry().paths();
        if paths.is_empty() {
            return Err(FeatureError::InvalidGeometry(format!(
                "track '{}' must be a line",
                feature.tag()
            )));
        }

        let style = match &self.profile.track_style {
            TrackStyleRule::Fixed(style) => *style,
            TrackStyleRule::Properties => match feature.properties().object("style")? {
                Some(style) => serde_json::from_value(Value::Object(style.clone())).map_err(
                    |_| FeatureError::InvalidProperty {
                        property: "style".to_string(),
                        expected: "a track style",
                    },
                )?,
                None => TrackStyle::default(),
            },
        };

        Ok(Marker::Track(TrackMarker { paths, style }))
    }

    fn last_position(&self, feature: &VehicleFeature) -> Result<BuiltMarkers, FeatureError> {
        let position = feature.position()?;
        let props = feature.properties();
        let public_name = props.str("public_name")?;
        let icon_size = props.size("iconSize")?;

        let marker = Marker::Icon(IconMarker {
            position,
            icon: Icon {
                url: props.str("currPosIcon")?.to_string(),
                size: icon_size,
            },
            rotation: props.optional_f64("bearing")?.unwrap_or_default(),
            popup: Some(props.str("html")?.to_string()),
            tooltip: Some(public_name.to_uppercase()),
        });

        let waypoint = match props.get("waypoint_point") {
            Some(value) => Some(Marker::Icon(IconMarker {
                position: point_from_json("waypoint_point", value)?,
                icon: Icon {
                    url: props.str("wpIcon")?.to_string(),
                    size: icon_size,
                },
                rotation: 0.0,
                popup: props.optional_str("waypoint_html")?.map(str::to_string),
                tooltip: Some(format!("{public_name} waypoint")),
            })),
            None => None,
        };

        Ok(BuiltMarkers {
            marker,
            waypoint,
            position: None,
        })
    }

    fn indexed_position(&self, feature: &VehicleFeature) -> Result<Option<Marker>, FeatureError> {
        if !self.profile.position_from_index
            || feature.properties().optional_f64("index")? != Some(0.0)
        {
            return Ok(None);
        }

        match self.last_position(feature) {
            Ok(built) => Ok(Some(built.marker)),
            Err(err) => {
                warn!("Surface marker with index 0 has no usable position: {err}");
                Ok(None)
            }
        }
    }

    fn waypoint(&self, feature: &VehicleFeature) -> Result<Marker, FeatureError> {
        let props = feature.properties();

        Ok(Marker::Icon(IconMarker {
            position: feature.position()?,
            icon: Icon {
                url: props.str("wpIcon")?.to_string(),
                size: props.size("iconSize")?,
            },
            rotation: 0.0,
            popup: props.optional_str("html")?.map(str::to_string),
            tooltip: props
                .optional_str("public_name")?
                .map(|name| format!("{name} waypoint")),
        }))
    }

    fn surface_marker(&self, feature: &VehicleFeature) -> Result<Marker, FeatureError> {
        let props = feature.properties();

        let (style, z_index_offset) = match &self.profile.surface_style {
            SurfaceStyleRule::Properties => (circle_style(props, props.f64("radius")?)?, 0),
            SurfaceStyleRule::Fixed(style) => (*style, 0),
            SurfaceStyleRule::AgeScaled { divisor } => {
                let radius = (props.f64("days_wet")? / divisor).abs().trunc();
                let z_index_offset = (radius as i64)
                    .checked_mul(Z_INDEX_PER_RADIUS)
                    .ok_or_else(|| FeatureError::InvalidProperty {
                        property: "days_wet".to_string(),
                        expected: "a number of days small enough to scale the marker",
                    })?;
                (circle_style(props, radius)?, z_index_offset)
            }
        };

        let tooltip = match &self.profile.tooltip_prefix {
            Some(prefix) => Some(format!("{prefix} {}", props.text("platform")?)),
            None => None,
        };

        Ok(Marker::Circle(CircleMarker {
            position: feature.position()?,
            style,
            popup: props.optional_str("html")?.map(str::to_string),
            tooltip,
            z_index_offset,
        }))
    }
}

fn circle_style(props: &Properties, radius: f64) -> Result<CircleStyle, FeatureError> {
    Ok(CircleStyle {
        radius,
        color: props.color("marker_color")?,
        fill_color: props.color("fillColor")?,
        opacity: props.f64("opacity")?,
        fill_opacity: props.f64("fillOpacity")?,
        weight: props.f64("weight")?,
    })
}
