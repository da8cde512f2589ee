//! Overlays rendered from remote services: WMS layers, templated tile layers, single image
//! overlays and animated current fields.
//!
//! Overlays are not populated from feeds. They are always present in the map session and are made
//! visible by raising their opacity above zero.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::attribution::Attribution;
use crate::error::GandalfError;

mod catalog;
mod template;
mod wms;

pub use catalog::{default_overlays, gibs_date};
pub use template::TileTemplate;
pub use wms::{WmsSource, DEFAULT_TILE_SIZE, WEB_MERCATOR_ORIGIN};

/// Tile index.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct TileIndex {
    /// X index.
    pub x: u32,
    /// Y index.
    pub y: u32,
    /// Z index.
    pub z: u32,
}

impl TileIndex {
    /// Create a new index instance.
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Bounding box of the tile in Web Mercator meters, `[min_x, min_y, max_x, max_y]`.
    pub fn web_mercator_bbox(&self) -> [f64; 4] {
        let tile_size = 2.0 * WEB_MERCATOR_ORIGIN / 2f64.powi(self.z as i32);
        let min_x = -WEB_MERCATOR_ORIGIN + f64::from(self.x) * tile_size;
        let max_y = WEB_MERCATOR_ORIGIN - f64::from(self.y) * tile_size;

        [min_x, max_y - tile_size, min_x + tile_size, max_y]
    }
}

/// Single georeferenced image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOverlay {
    /// Url of the image.
    pub url: String,
    /// Corners of the image, `[[south, west], [north, east]]` in degrees.
    pub bounds: [[f64; 2]; 2],
}

/// Gridded surface current field drawn as animated streamlines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityField {
    /// Url of the JSON document with the `u` and `v` components of the field.
    pub url: String,
    /// Speed mapped to the first color of the scale, in m/s.
    #[serde(default)]
    pub min_velocity: f64,
    /// Speed mapped to the last color of the scale, in m/s.
    #[serde(default = "default_max_velocity")]
    pub max_velocity: f64,
    /// Multiplier of the particle speed.
    #[serde(default = "default_velocity_scale")]
    pub velocity_scale: f64,
}

fn default_max_velocity() -> f64 {
    1.5
}

fn default_velocity_scale() -> f64 {
    0.9
}

impl VelocityField {
    /// Creates a field with the water current defaults: `0..1.5` m/s, scale `0.9`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            min_velocity: 0.0,
            max_velocity: default_max_velocity(),
            velocity_scale: default_velocity_scale(),
        }
    }
}

/// Where the overlay images come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlaySource {
    /// WMS `GetMap` tiles.
    Wms(WmsSource),
    /// Tiles addressed by a url template.
    Tiles(TileTemplate),
    /// One image.
    Image(ImageOverlay),
    /// Current field document.
    Velocity(VelocityField),
}

/// Named raster overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    name: String,
    source: OverlaySource,
    #[serde(default)]
    opacity: f64,
    #[serde(default)]
    attribution: Option<Attribution>,
    #[serde(default)]
    legend: Option<String>,
}

impl Overlay {
    /// Creates a transparent overlay.
    pub fn new(name: impl Into<String>, source: OverlaySource) -> Self {
        Self {
            name: name.into(),
            source,
            opacity: 0.0,
            attribution: None,
            legend: None,
        }
    }

    /// Sets the initial opacity. The value is clamped to `0.0..=1.0`.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.set_opacity(opacity);
        self
    }

    /// Sets the attribution.
    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = Some(attribution);
        self
    }

    /// Sets an explicit legend image url.
    pub fn with_legend(mut self, legend: impl Into<String>) -> Self {
        self.legend = Some(legend.into());
        self
    }

    /// Name of the overlay.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Image source.
    pub fn source(&self) -> &OverlaySource {
        &self.source
    }

    /// Opacity, `0.0..=1.0`.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Attribution of the data.
    pub fn attribution(&self) -> Option<&Attribution> {
        self.attribution.as_ref()
    }

    /// Returns true if the overlay is not fully transparent.
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }

    /// Sets the opacity, clamped to `0.0..=1.0`. Non-finite values are ignored.
    ///
    /// Returns true if the opacity changed.
    pub fn set_opacity(&mut self, opacity: f64) -> bool {
        if !opacity.is_finite() {
            return false;
        }

        let opacity = opacity.clamp(0.0, 1.0);
        let changed = self.opacity != opacity;
        self.opacity = opacity;
        changed
    }

    /// Sets the `ELEVATION` dimension of a WMS overlay, or removes it with `None`.
    ///
    /// Returns true if the value changed.
    pub fn set_elevation(&mut self, elevation: Option<f64>) -> Result<bool, GandalfError> {
        let OverlaySource::Wms(wms) = &mut self.source else {
            return Err(GandalfError::Elevation {
                overlay: self.name.clone(),
                reason: "the overlay has no elevation dimension".to_string(),
            });
        };

        if elevation.is_some_and(|value| !value.is_finite()) {
            return Err(GandalfError::Elevation {
                overlay: self.name.clone(),
                reason: "must be a finite number".to_string(),
            });
        }

        let changed = wms.elevation != elevation;
        wms.elevation = elevation;
        debug!("Elevation of overlay {} set to {elevation:?}", self.name);

        Ok(changed)
    }

    /// Url of the image to draw for the tile.
    ///
    /// Image and velocity overlays are single documents, so their url is returned for any tile.
    pub fn tile_url(&self, index: &TileIndex) -> Result<String, GandalfError> {
        match &self.source {
            OverlaySource::Wms(wms) => Ok(wms.get_map_url(index)),
            OverlaySource::Tiles(template) => template.tile_url(index),
            OverlaySource::Image(image) => Ok(image.url.clone()),
            OverlaySource::Velocity(field) => Ok(field.url.clone()),
        }
    }

    /// Url of the legend image. WMS overlays without an explicit legend use `GetLegendGraphic`.
    pub fn legend_url(&self) -> Option<String> {
        match (&self.legend, &self.source) {
            (Some(legend), _) => Some(legend.clone()),
            (None, OverlaySource::Wms(wms)) => Some(wms.legend_url()),
            (None, _) => None,
        }
    }

    /// Checks that the overlay can be drawn.
    pub fn validate(&self) -> Result<(), GandalfError> {
        if self.name.is_empty() {
            return Err(GandalfError::Configuration(
                "overlay name cannot be empty".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(GandalfError::Configuration(format!(
                "opacity of overlay {} must be in 0..1, got {}",
                self.name, self.opacity
            )));
        }

        match &self.source {
            OverlaySource::Wms(wms) if wms.layers.is_empty() => Err(GandalfError::Configuration(
                format!("overlay {} has no WMS layers", self.name),
            )),
            OverlaySource::Tiles(template) => template.tile_url(&TileIndex::new(0, 0, 0)).map(|_| ()),
            OverlaySource::Velocity(field)
                if !(field.min_velocity < field.max_velocity && field.velocity_scale > 0.0) =>
            {
                Err(GandalfError::Configuration(format!(
                    "overlay {} needs min_velocity < max_velocity and a positive velocity_scale",
                    self.name
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Ordered set of overlays with unique names. Overlays are drawn in collection order.
#[derive(Debug, Clone, Default)]
pub struct OverlayCollection {
    overlays: Vec<Overlay>,
}

impl From<Vec<Overlay>> for OverlayCollection {
    fn from(overlays: Vec<Overlay>) -> Self {
        let mut collection = Self::default();
        for overlay in overlays {
            collection.insert(overlay);
        }

        collection
    }
}

impl OverlayCollection {
    /// Adds an overlay to the end of the collection. An overlay with the same name is replaced in
    /// place and returned.
    pub fn insert(&mut self, overlay: Overlay) -> Option<Overlay> {
        match self.overlays.iter_mut().find(|o| o.name == overlay.name) {
            Some(existing) => Some(std::mem::replace(existing, overlay)),
            None => {
                self.overlays.push(overlay);
                None
            }
        }
    }

    /// Returns the overlay with the given name.
    pub fn get(&self, name: &str) -> Option<&Overlay> {
        self.overlays.iter().find(|overlay| overlay.name == name)
    }

    /// Returns the overlay with the given name, failing with [`GandalfError::UnknownOverlay`].
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Overlay, GandalfError> {
        self.overlays
            .iter_mut()
            .find(|overlay| overlay.name == name)
            .ok_or_else(|| GandalfError::UnknownOverlay(name.to_string()))
    }

    /// Iterates over the overlays in drawing order.
    pub fn iter(&self) -> impl Iterator<Item = &Overlay> + '_ {
        self.overlays.iter()
    }

    /// Iterates over the overlays that are not fully transparent.
    pub fn iter_visible(&self) -> impl Iterator<Item = &Overlay> + '_ {
        self.overlays.iter().filter(|overlay| overlay.is_visible())
    }

    /// Number of overlays.
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// Returns true if there are no overlays.
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;

    use super::*;

    fn salinity() -> Overlay {
        Overlay::new(
            "rtofs_salinity",
            OverlaySource::Wms(WmsSource::new(
                "https://gandalf.gcoos.org:8443/ncWMS2/wms?",
                "RTOFS/salinity",
            )),
        )
    }

    #[test]
    fn tile_bbox() {
        let [min_x, min_y, max_x, max_y] = TileIndex::new(0, 0, 0).web_mercator_bbox();
        assert_relative_eq!(min_x, -WEB_MERCATOR_ORIGIN);
        assert_relative_eq!(min_y, -WEB_MERCATOR_ORIGIN);
        assert_relative_eq!(max_x, WEB_MERCATOR_ORIGIN);
        assert_relative_eq!(max_y, WEB_MERCATOR_ORIGIN);

        let [min_x, min_y, max_x, max_y] = TileIndex::new(3, 2, 2).web_mercator_bbox();
        assert_relative_eq!(min_x, WEB_MERCATOR_ORIGIN / 2.0);
        assert_relative_eq!(min_y, -WEB_MERCATOR_ORIGIN / 2.0, epsilon = 1e-6);
        assert_relative_eq!(max_x, WEB_MERCATOR_ORIGIN);
        assert_relative_eq!(max_y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn opacity_is_clamped() {
        let mut overlay = salinity();
        assert!(!overlay.is_visible());

        assert!(overlay.set_opacity(1.5));
        assert_eq!(overlay.opacity(), 1.0);
        assert!(!overlay.set_opacity(2.0));
        assert!(!overlay.set_opacity(f64::NAN));
        assert!(overlay.set_opacity(-1.0));
        assert_eq!(overlay.opacity(), 0.0);
    }

    #[test]
    fn elevation() {
        let mut overlay = salinity();
        assert!(overlay.set_elevation(Some(-100.0)).unwrap());
        assert!(!overlay.set_elevation(Some(-100.0)).unwrap());
        assert!(overlay
            .tile_url(&TileIndex::new(0, 0, 0))
            .unwrap()
            .ends_with("&ELEVATION=-100"));

        assert_matches!(
            overlay.set_elevation(Some(f64::INFINITY)),
            Err(GandalfError::Elevation { overlay, .. }) if overlay == "rtofs_salinity"
        );

        let mut image = Overlay::new(
            "usf_sst",
            OverlaySource::Image(ImageOverlay {
                url: "/data/gandalf/modis/sst.png".into(),
                bounds: [[17.9, -98.0], [30.9, -79.0]],
            }),
        );
        assert_matches!(image.set_elevation(Some(-5.0)), Err(GandalfError::Elevation { .. }));
    }

    #[test]
    fn legend() {
        assert!(salinity().legend_url().is_some());

        let tiles = Overlay::new("tiles", OverlaySource::Tiles(TileTemplate::new("{z}/{x}/{y}")));
        assert_eq!(tiles.legend_url(), None);
        assert_eq!(
            tiles.with_legend("/legends/tiles.png").legend_url().as_deref(),
            Some("/legends/tiles.png")
        );
    }

    #[test]
    fn collection_replaces_by_name() {
        let mut collection = OverlayCollection::default();
        assert!(collection.insert(salinity()).is_none());
        assert!(collection.insert(salinity().with_opacity(0.5)).is_some());

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.iter_visible().count(), 1);
        assert_matches!(
            collection.get_mut("gebco"),
            Err(GandalfError::UnknownOverlay(name)) if name == "gebco"
        );
    }

    #[test]
    fn deserialize_overlay() {
        let overlay: Overlay = serde_json::from_str(
            r#"{
                "name": "eez",
                "source": {"kind": "wms", "url": "https://geo.vliz.be/geoserver/MarineRegions/wms?", "layers": "eez_boundaries"},
                "attribution": {"text": "Marine Regions"}
            }"#,
        )
        .unwrap();

        assert_eq!(overlay.opacity(), 0.0);
        assert_matches!(overlay.source(), OverlaySource::Wms(wms) if wms.transparent && wms.format == "image/png");
        assert!(overlay.validate().is_ok());
    }

    #[test]
    fn velocity_field() {
        let overlay: Overlay = serde_json::from_str(
            r#"{
                "name": "hycom_currents",
                "source": {"kind": "velocity", "url": "/data/gandalf/hycom/hycom_surface_current_v2.json"},
                "opacity": 0.99
            }"#,
        )
        .unwrap();

        assert_eq!(
            overlay.source(),
            &OverlaySource::Velocity(VelocityField::new(
                "/data/gandalf/hycom/hycom_surface_current_v2.json"
            ))
        );
        assert!(overlay.validate().is_ok());
        assert_eq!(
            overlay.tile_url(&TileIndex::new(5, 7, 4)).unwrap(),
            "/data/gandalf/hycom/hycom_surface_current_v2.json"
        );
        assert_eq!(overlay.legend_url(), None);

        let inverted = Overlay::new(
            "inverted",
            OverlaySource::Velocity(VelocityField {
                min_velocity: 2.0,
                ..VelocityField::new("/currents.json")
            }),
        );
        assert_matches!(inverted.validate(), Err(GandalfError::Configuration(_)));
    }
}
