//! Oceanographic overlays of the Gulf of Mexico portal.

use chrono::{Days, NaiveDate};

use crate::attribution::Attribution;
use crate::overlay::{ImageOverlay, Overlay, OverlaySource, TileTemplate, VelocityField, WmsSource};

const NCWMS: &str = "https://gandalf.gcoos.org:8443/ncWMS2/wms?";
const NOAA_CHARTS: &str = "https://gis.charttools.noaa.gov/arcgis/rest/services/MCS/ENCOnline/MapServer/exts/MaritimeChartService/WMSServer?";
const GIBS_WMTS: &str = "https://gibs-{s}.earthdata.nasa.gov/wmts/epsg3857/best/{layer}/default/{time}/{tileMatrixSet}/{z}/{y}/{x}.jpg";
const GIBS_WMS: &str = "https://gibs-{s}.earthdata.nasa.gov/wms/epsg3857/best/{layer}/default/{time}/{tileMatrixSet}/{z}/{y}/{x}.jpg";
const HYCOM_CURRENTS: &str = "https://gandalf.gcoos.org/data/gandalf/hycom/hycom_surface_current_v2.json";
const MODIS_BOUNDS: [[f64; 2]; 2] = [[17.9, -98.0], [30.9, -79.0]];

/// Date of a GIBS daily product `days_back` days before `today`, formatted as `YYYY-MM-DD`.
pub fn gibs_date(today: NaiveDate, days_back: u64) -> String {
    (today - Days::new(days_back)).format("%Y-%m-%d").to_string()
}

fn wms(name: &str, url: &str, layers: &str) -> Overlay {
    Overlay::new(name, OverlaySource::Wms(WmsSource::new(url, layers)))
}

fn styled_wms(name: &str, url: &str, layers: &str, styles: &str) -> Overlay {
    Overlay::new(
        name,
        OverlaySource::Wms(WmsSource::new(url, layers).with_styles(styles)),
    )
}

fn gibs(name: &str, template: &str, layer: &str, time: String) -> Overlay {
    let template = TileTemplate::new(template)
        .with_subdomains("abc")
        .with_param("layer", layer)
        .with_param("tileMatrixSet", "EPSG3857_1km")
        .with_param("time", time);

    Overlay::new(name, OverlaySource::Tiles(template)).with_attribution(Attribution::new(
        "NASA EOSDIS GIBS",
        Some("https://wiki.earthdata.nasa.gov/display/GIBS"),
    ))
}

fn modis_image(name: &str, url: &str) -> Overlay {
    Overlay::new(
        name,
        OverlaySource::Image(ImageOverlay {
            url: url.to_string(),
            bounds: MODIS_BOUNDS,
        }),
    )
}

/// Default overlays of the portal, in drawing order.
///
/// The ocean basemap and the tropical weather summary are opaque and the HYCOM surface currents
/// are drawn on top of everything. All other overlays start fully transparent. GIBS products are dated relative to `today` (UTC): chlorophyll is a three-day
/// composite of the days before `today`, SST is yesterday's.
pub fn default_overlays(today: NaiveDate) -> Vec<Overlay> {
    let esri = Attribution::new("Tiles © Esri, Sources: GEBCO, NOAA", None);
    let boem = Attribution::new("GCOOS-RA, BOEM", None);
    let noaa = Attribution::new("GCOOS-RA, NOAA", None);

    let mut overlays = vec![
        Overlay::new(
            "ocean_basemap",
            OverlaySource::Tiles(TileTemplate::new(
                "https://server.arcgisonline.com/ArcGIS/rest/services/Ocean_Basemap/MapServer/tile/{z}/{y}/{x}",
            )),
        )
        .with_opacity(1.0)
        .with_attribution(esri),
        wms(
            "nhc_weather",
            "https://mapservices.weather.noaa.gov:443/tropical/services/tropical/NHC_tropical_weather_summary/MapServer/WMSServer?",
            "26,27,28",
        )
        .with_opacity(1.0),
        wms(
            "gebco",
            "https://www.gebco.net/data_and_products/gebco_web_services/2022/mapserv?",
            "gebco_latest",
        )
        .with_attribution(boem.clone()),
        wms(
            "noaa_bag",
            "https://gis.ngdc.noaa.gov/arcgis/services/web_mercator/nos_hydro_dynamic/MapServer/WMSServer?",
            "2",
        )
        .with_attribution(noaa),
        wms("noaa_buoys", NOAA_CHARTS, "6"),
        wms("noaa_depths", NOAA_CHARTS, "2"),
        wms(
            "nexrad",
            "https://opengeo.ncep.noaa.gov:443/geoserver/conus/conus_bref_qcd/ows?SERVICE=WMS&",
            "conus_bref_qcd",
        ),
    ];

    for (index, days_back) in (1..=3).enumerate() {
        overlays.push(gibs(
            &format!("modis_chl_{}", index + 1),
            GIBS_WMTS,
            "MODIS_Aqua_L2_Chlorophyll_A",
            gibs_date(today, days_back),
        ));
    }

    overlays.push(gibs(
        "gibs_sst",
        GIBS_WMS,
        "GHRSST_L4_MUR_Sea_Surface_Temperature",
        gibs_date(today, 1),
    ));

    overlays.extend([
        wms(
            "geostrophic",
            "https://cwcgom.aoml.noaa.gov/thredds/wms/OCEAN_GEOSTROPHIC_CURRENTS/CURRENTS.nc",
            "sea_water_velocity",
        ),
        styled_wms("rtofs_salinity", NCWMS, "RTOFS/salinity", "default/seq-BlueHeat"),
        wms("rtofs_velocity", NCWMS, "RTOFS/water_u:water_v-group"),
        styled_wms("rtofs_ssh", NCWMS, "RTOFS/surf_el", "default/psu-plasma"),
        styled_wms("lsu_sst", NCWMS, "SST/sst", "default/x-Sst"),
        styled_wms("lsu_sst_unmasked", NCWMS, "SST/unmasked_sst", "default/x-Sst"),
        wms(
            "hfr_6km",
            "https://hfrnet-tds.ucsd.edu/thredds/wms/HFR/USEGC/6km/hourly/RTV/HFRADAR_US_East_and_Gulf_Coast_6km_Resolution_Hourly_RTV_best.ncd",
            "surface_sea_water_velocity",
        ),
        wms(
            "ocean_platforms",
            "https://gis.ngdc.noaa.gov/arcgis/services/GulfDataAtlas/BOEM_DrillingPlatforms/MapServer/WmsServer?",
            "0",
        )
        .with_attribution(boem),
        wms(
            "eez",
            "https://geo.vliz.be/geoserver/MarineRegions/wms?",
            "eez_boundaries",
        ),
        styled_wms("rutgers_dac", NCWMS, "DAC_RTOFS/dir_depth_avg", "default/psu-plasma"),
        modis_image("usf_sst", "/data/gandalf/modis/sst.png"),
        modis_image("usf_chl", "/data/gandalf/modis/chl.png"),
        Overlay::new(
            "hycom_currents",
            OverlaySource::Velocity(VelocityField::new(HYCOM_CURRENTS)),
        )
        .with_opacity(0.99)
        .with_attribution(Attribution::new("HYCOM", Some("https://www.hycom.org"))),
    ]);

    overlays
}

#[cfg(test)]
mod tests {
    use ahash::HashSet;

    use super::*;
    use crate::overlay::TileIndex;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
    }

    #[test]
    fn gibs_dates_cross_month() {
        assert_eq!(gibs_date(day(), 1), "2024-02-29");
        assert_eq!(gibs_date(day(), 3), "2024-02-27");
    }

    #[test]
    fn default_overlay_names_are_unique() {
        let overlays = default_overlays(day());
        let names: HashSet<_> = overlays.iter().map(Overlay::name).collect();
        assert_eq!(names.len(), overlays.len());

        for overlay in &overlays {
            assert!(overlay.validate().is_ok(), "{} is invalid", overlay.name());
        }
    }

    #[test]
    fn visible_on_start() {
        let overlays = default_overlays(day());
        let visible: Vec<_> = overlays
            .iter()
            .filter(|overlay| overlay.is_visible())
            .map(Overlay::name)
            .collect();

        assert_eq!(visible, vec!["ocean_basemap", "nhc_weather", "hycom_currents"]);
    }

    #[test]
    fn chlorophyll_composite_dates() {
        let overlays = default_overlays(day());
        let urls: Vec<_> = ["modis_chl_1", "modis_chl_2", "modis_chl_3", "gibs_sst"]
            .iter()
            .map(|name| {
                overlays
                    .iter()
                    .find(|overlay| overlay.name() == *name)
                    .expect("overlay exists")
                    .tile_url(&TileIndex::new(0, 0, 0))
                    .expect("valid template")
            })
            .collect();

        assert!(urls[0].contains("/2024-02-29/"));
        assert!(urls[1].contains("/2024-02-28/"));
        assert!(urls[2].contains("/2024-02-27/"));
        assert!(urls[3].contains("GHRSST_L4_MUR_Sea_Surface_Temperature/default/2024-02-29/"));
    }

    #[test]
    fn lsu_legend() {
        let overlays = default_overlays(day());
        let lsu = overlays
            .iter()
            .find(|overlay| overlay.name() == "lsu_sst_unmasked")
            .expect("overlay exists");

        insta::assert_snapshot!(
            lsu.legend_url().unwrap_or_default(),
            @"https://gandalf.gcoos.org:8443/ncWMS2/wms?REQUEST=GetLegendGraphic&PALETTE=default&LAYERS=SST/unmasked_sst&STYLES=default/x-Sst"
        );
    }
}
