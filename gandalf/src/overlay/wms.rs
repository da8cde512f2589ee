use serde::{Deserialize, Serialize};

use crate::overlay::TileIndex;

/// Half of the extent of the Web Mercator (EPSG:3857) projection in meters.
pub const WEB_MERCATOR_ORIGIN: f64 = 20_037_508.342_789_244;

/// Size of the tiles requested from WMS services, in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

const WMS_VERSION: &str = "1.1.1";

fn default_format() -> String {
    "image/png".to_string()
}

fn default_transparent() -> bool {
    true
}

fn default_tile_size() -> u32 {
    DEFAULT_TILE_SIZE
}

/// Layer of a remote WMS service, requested tile by tile in EPSG:3857.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmsSource {
    /// Service endpoint. It may already contain query parameters.
    pub url: String,
    /// Comma separated list of WMS layer names.
    pub layers: String,
    /// Comma separated list of styles. Empty means the default style of each layer.
    #[serde(default)]
    pub styles: String,
    /// Image format of the tiles.
    #[serde(default = "default_format")]
    pub format: String,
    /// Whether tiles are requested with a transparent background.
    #[serde(default = "default_transparent")]
    pub transparent: bool,
    /// Value of the `ELEVATION` dimension, e.g. a depth in meters for ocean models (negative
    /// below the surface).
    #[serde(default)]
    pub elevation: Option<f64>,
    /// Tile width and height in pixels.
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
}

impl WmsSource {
    /// Creates a source with png transparent tiles in the default style.
    pub fn new(url: impl Into<String>, layers: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            layers: layers.into(),
            styles: String::new(),
            format: default_format(),
            transparent: true,
            elevation: None,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }

    /// Sets the styles of the layers.
    pub fn with_styles(mut self, styles: impl Into<String>) -> Self {
        self.styles = styles.into();
        self
    }

    /// Url of the `GetMap` request for the tile.
    pub fn get_map_url(&self, index: &TileIndex) -> String {
        let [min_x, min_y, max_x, max_y] = index.web_mercator_bbox();
        let mut url = format!(
            "{}SERVICE=WMS&REQUEST=GetMap&VERSION={WMS_VERSION}&LAYERS={}&STYLES={}&FORMAT={}&TRANSPARENT={}&SRS=EPSG:3857&BBOX={min_x},{min_y},{max_x},{max_y}&WIDTH={size}&HEIGHT={size}",
            self.base(),
            self.layers,
            self.styles,
            self.format,
            self.transparent,
            size = self.tile_size,
        );

        if let Some(elevation) = self.elevation {
            url.push_str(&format!("&ELEVATION={elevation}"));
        }

        url
    }

    /// Url of the `GetLegendGraphic` request for the layers.
    pub fn legend_url(&self) -> String {
        let mut url = format!(
            "{}REQUEST=GetLegendGraphic&PALETTE=default&LAYERS={}",
            self.base(),
            self.layers
        );

        if !self.styles.is_empty() {
            url.push_str(&format!("&STYLES={}", self.styles));
        }

        url
    }

    fn base(&self) -> String {
        if self.url.ends_with('?') || self.url.ends_with('&') {
            self.url.clone()
        } else if self.url.contains('?') {
            format!("{}&", self.url)
        } else {
            format!("{}?", self.url)
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn bbox_of(url: &str) -> Vec<f64> {
        let bbox = url
            .split('&')
            .find_map(|param| param.strip_prefix("BBOX="))
            .expect("no bbox in url");
        bbox.split(',')
            .map(|value| value.parse().expect("invalid bbox value"))
            .collect()
    }

    #[test]
    fn get_map_url() {
        let source = WmsSource::new("https://gandalf.gcoos.org:8443/ncWMS2/wms?", "RTOFS/salinity")
            .with_styles("default/seq-BlueHeat");

        let url = source.get_map_url(&TileIndex::new(0, 0, 1));
        assert!(url.starts_with(
            "https://gandalf.gcoos.org:8443/ncWMS2/wms?SERVICE=WMS&REQUEST=GetMap&VERSION=1.1.1"
        ));
        assert!(url.contains("&LAYERS=RTOFS/salinity&STYLES=default/seq-BlueHeat&"));
        assert!(url.contains("&SRS=EPSG:3857&"));
        assert!(url.ends_with("&WIDTH=256&HEIGHT=256"));

        let bbox = bbox_of(&url);
        assert_relative_eq!(bbox[0], -WEB_MERCATOR_ORIGIN);
        assert_relative_eq!(bbox[1], 0.0);
        assert_relative_eq!(bbox[2], 0.0);
        assert_relative_eq!(bbox[3], WEB_MERCATOR_ORIGIN);
    }

    #[test]
    fn elevation_parameter() {
        let mut source = WmsSource::new("https://example.com/wms", "RTOFS/water_u:water_v-group");
        assert!(!source.get_map_url(&TileIndex::new(0, 0, 0)).contains("ELEVATION"));

        source.elevation = Some(-50.0);
        assert!(source
            .get_map_url(&TileIndex::new(0, 0, 0))
            .ends_with("&ELEVATION=-50"));
    }

    #[test]
    fn url_separators() {
        let plain = WmsSource::new("https://example.com/wms", "a");
        assert!(plain.legend_url().starts_with("https://example.com/wms?REQUEST="));

        let with_query = WmsSource::new("https://example.com/ows?SERVICE=WMS", "a");
        assert!(with_query
            .legend_url()
            .starts_with("https://example.com/ows?SERVICE=WMS&REQUEST="));

        let trailing = WmsSource::new("https://example.com/ows?SERVICE=WMS&", "a");
        assert!(trailing
            .legend_url()
            .starts_with("https://example.com/ows?SERVICE=WMS&REQUEST="));
    }

    #[test]
    fn legend_url() {
        let source = WmsSource::new("https://gandalf.gcoos.org:8443/ncWMS2/wms?", "SST/sst")
            .with_styles("default/x-Sst");
        insta::assert_snapshot!(source.legend_url(), @"https://gandalf.gcoos.org:8443/ncWMS2/wms?REQUEST=GetLegendGraphic&PALETTE=default&LAYERS=SST/sst&STYLES=default/x-Sst");
    }
}
