//! Renderable markers built from vehicle features.
//!
//! A marker owns copies of everything needed to draw it. It does not keep a reference to the
//! feature it was built from.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::geo::GeoPoint;

mod factory;

pub use factory::{BuiltMarkers, MarkerFactory, MarkerProfile, SurfaceStyleRule, TrackStyleRule};

/// Stroke style of a track.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackStyle {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels.
    pub weight: f64,
    /// Stroke opacity, `0.0..=1.0`.
    pub opacity: f64,
}

impl Default for TrackStyle {
    fn default() -> Self {
        Self {
            color: Color::TRACK_BLUE,
            weight: 3.0,
            opacity: 1.0,
        }
    }
}

/// Style of a circle marker.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleStyle {
    /// Radius in pixels.
    pub radius: f64,
    /// Stroke color.
    pub color: Color,
    /// Fill color.
    pub fill_color: Color,
    /// Stroke opacity.
    pub opacity: f64,
    /// Fill opacity.
    pub fill_opacity: f64,
    /// Stroke width in pixels.
    pub weight: f64,
}

/// Icon image of a point marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    /// Url of the icon image.
    pub url: String,
    /// Size of the icon in pixels, `[width, height]`.
    pub size: [u32; 2],
}

/// Styled vehicle path.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMarker {
    /// Paths of the track. Most tracks have one path; gaps in the data split it into several.
    pub paths: Vec<Vec<GeoPoint>>,
    /// Stroke style.
    pub style: TrackStyle,
}

/// Point marker drawn with an icon.
#[derive(Debug, Clone, PartialEq)]
pub struct IconMarker {
    /// Marker position.
    pub position: GeoPoint,
    /// Icon image.
    pub icon: Icon,
    /// Icon rotation in degrees clockwise (vehicle bearing).
    pub rotation: f64,
    /// HTML content of the popup.
    pub popup: Option<String>,
    /// Tooltip text.
    pub tooltip: Option<String>,
}

/// Circle marker with a fixed screen radius.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleMarker {
    /// Marker position.
    pub position: GeoPoint,
    /// Circle style.
    pub style: CircleStyle,
    /// HTML content of the popup.
    pub popup: Option<String>,
    /// Tooltip text.
    pub tooltip: Option<String>,
    /// Offset of the marker in the drawing order.
    pub z_index_offset: i64,
}

/// A marker is one of the three shapes the map can draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    /// Styled track.
    Track(TrackMarker),
    /// Icon point marker.
    Icon(IconMarker),
    /// Circle marker.
    Circle(CircleMarker),
}

impl Marker {
    /// HTML content of the marker popup.
    pub fn popup(&self) -> Option<&str> {
        match self {
            Marker::Track(_) => None,
            Marker::Icon(icon) => icon.popup.as_deref(),
            Marker::Circle(circle) => circle.popup.as_deref(),
        }
    }

    /// Tooltip text of the marker.
    pub fn tooltip(&self) -> Option<&str> {
        match self {
            Marker::Track(_) => None,
            Marker::Icon(icon) => icon.tooltip.as_deref(),
            Marker::Circle(circle) => circle.tooltip.as_deref(),
        }
    }
}
