use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use strfmt::strfmt;

use crate::error::GandalfError;
use crate::overlay::TileIndex;

/// Tile source addressed by a url template.
///
/// The template may contain `{z}`, `{x}` and `{y}` tile coordinates, the `{s}` subdomain and any
/// named parameter from `params`, e.g. WMTS `{layer}`, `{time}` and `{tileMatrixSet}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileTemplate {
    /// Url template.
    pub url: String,
    /// Subdomains substituted for `{s}`. Tiles are spread over them by their index.
    #[serde(default)]
    pub subdomains: Vec<String>,
    /// Named template parameters.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl TileTemplate {
    /// Creates a template without subdomains and parameters.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subdomains: vec![],
            params: BTreeMap::new(),
        }
    }

    /// Sets the subdomains, one per character of `subdomains` (e.g. `"abc"`).
    pub fn with_subdomains(mut self, subdomains: &str) -> Self {
        self.subdomains = subdomains.chars().map(String::from).collect();
        self
    }

    /// Adds a named template parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Url of the tile.
    pub fn tile_url(&self, index: &TileIndex) -> Result<String, GandalfError> {
        let mut vars: HashMap<String, String> = self
            .params
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        vars.insert("x".to_string(), index.x.to_string());
        vars.insert("y".to_string(), index.y.to_string());
        vars.insert("z".to_string(), index.z.to_string());

        if !self.subdomains.is_empty() {
            let subdomain = (index.x as usize + index.y as usize) % self.subdomains.len();
            vars.insert("s".to_string(), self.subdomains[subdomain].clone());
        }

        strfmt(&self.url, &vars).map_err(|err| {
            GandalfError::Configuration(format!("invalid tile url template {}: {err}", self.url))
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn xyz_template() {
        let template = TileTemplate::new(
            "https://server.arcgisonline.com/ArcGIS/rest/services/Ocean_Basemap/MapServer/tile/{z}/{y}/{x}",
        );

        insta::assert_snapshot!(
            template.tile_url(&TileIndex::new(3, 5, 4)).unwrap(),
            @"https://server.arcgisonline.com/ArcGIS/rest/services/Ocean_Basemap/MapServer/tile/4/5/3"
        );
    }

    #[test]
    fn wmts_template() {
        let template = TileTemplate::new(
            "https://gibs-{s}.earthdata.nasa.gov/wmts/epsg3857/best/{layer}/default/{time}/{tileMatrixSet}/{z}/{y}/{x}.jpg",
        )
        .with_subdomains("abc")
        .with_param("layer", "MODIS_Aqua_L2_Chlorophyll_A")
        .with_param("tileMatrixSet", "EPSG3857_1km")
        .with_param("time", "2024-05-01");

        insta::assert_snapshot!(
            template.tile_url(&TileIndex::new(1, 3, 5)).unwrap(),
            @"https://gibs-b.earthdata.nasa.gov/wmts/epsg3857/best/MODIS_Aqua_L2_Chlorophyll_A/default/2024-05-01/EPSG3857_1km/5/3/1.jpg"
        );
    }

    #[test]
    fn subdomains_rotate() {
        let template = TileTemplate::new("{s}").with_subdomains("abc");
        let subdomains: Vec<_> = (0..4)
            .map(|x| template.tile_url(&TileIndex::new(x, 0, 2)).unwrap())
            .collect();

        assert_eq!(subdomains, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn missing_parameter() {
        let template = TileTemplate::new("https://tiles/{layer}/{z}/{x}/{y}.png");
        assert_matches!(
            template.tile_url(&TileIndex::new(0, 0, 0)),
            Err(GandalfError::Configuration(_))
        );
    }
}
