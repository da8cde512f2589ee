use std::sync::Arc;

use chrono::Utc;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use geojson::FeatureCollection;
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;

use crate::async_runtime;
use crate::error::{FeatureError, GandalfError};
use crate::feature::{feature_tag, FeatureKind, VehicleFeature};
use crate::feed::{FeedDefinition, FeedStatus, FeedSummary, LayerRole, VehicleConfig};
use crate::layer::LayerStatus;
use crate::map::Map;
use crate::marker::MarkerFactory;
use crate::platform::PlatformService;

/// Documents downloaded for one feed.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    /// Vehicle configuration, if the feed has a configuration feed and it was loaded.
    pub config: Option<VehicleConfig>,
    /// Features of the feed.
    pub collection: FeatureCollection,
}

/// Loads vehicle feeds and puts their markers into the layers of a [`Map`].
///
/// Loading is split into two halves. [`FeedLoader::fetch`] downloads the documents and does not
/// touch the map. [`apply`] turns the documents into markers and runs to completion without
/// suspending, so a shared map is locked only for the time of `apply`.
pub struct FeedLoader<P: PlatformService> {
    platform: Arc<P>,
}

impl<P: PlatformService> Clone for FeedLoader<P> {
    fn clone(&self) -> Self {
        Self {
            platform: self.platform.clone(),
        }
    }
}

impl<P: PlatformService + 'static> FeedLoader<P> {
    /// Creates a loader fetching through the given platform service.
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }

    /// Platform service of the loader.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Fetches and decodes a feature collection.
    ///
    /// Network errors, error statuses and malformed documents all fail with
    /// [`GandalfError::FeedUnavailable`].
    pub async fn load(&self, url: &str) -> Result<FeatureCollection, GandalfError> {
        self.load_json(url).await
    }

    /// Fetches and decodes a vehicle configuration feed.
    pub async fn load_config(&self, url: &str) -> Result<VehicleConfig, GandalfError> {
        self.load_json(url).await
    }

    /// Downloads the configuration feed (if any) and then the feature collection of the feed.
    ///
    /// A failed configuration feed is logged and the feed is loaded without it.
    pub async fn fetch(&self, feed: &FeedDefinition) -> Result<FetchedFeed, GandalfError> {
        let stamp = feed.cache_bust.then(|| Utc::now().timestamp_millis());

        let config = match &feed.config_url {
            Some(url) => match self.load_config(&request_url(url, stamp)).await {
                Ok(config) => Some(config),
                Err(err) => {
                    warn!("Configuration of feed {} is not loaded: {err}", feed.name);
                    None
                }
            },
            None => None,
        };

        let collection = self.load(&request_url(&feed.url, stamp)).await?;
        Ok(FetchedFeed { config, collection })
    }

    /// Loads the feed into a map owned by the caller.
    pub async fn refresh(&self, feed: &FeedDefinition, map: &mut Map) -> FeedStatus {
        let fetched = self.fetch(feed).await;
        apply(feed, fetched, map)
    }

    /// Fetches all feeds concurrently and applies each one to the shared map as soon as it is
    /// downloaded. Returns the statuses in completion order.
    pub async fn refresh_all(
        &self,
        feeds: &[FeedDefinition],
        map: &Arc<RwLock<Map>>,
    ) -> Vec<(String, FeedStatus)> {
        let mut pending: FuturesUnordered<_> = feeds
            .iter()
            .map(|feed| async move { (feed, self.fetch(feed).await) })
            .collect();

        let mut statuses = Vec::with_capacity(feeds.len());
        while let Some((feed, fetched)) = pending.next().await {
            let status = apply(feed, fetched, &mut map.write());
            statuses.push((feed.name.clone(), status));
        }

        statuses
    }

    /// Loads the feed into the shared map in background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_refresh(&self, feed: FeedDefinition, map: Arc<RwLock<Map>>) {
        let loader = self.clone();
        async_runtime::spawn(async move {
            let fetched = loader.fetch(&feed).await;
            apply(&feed, fetched, &mut map.write());
        });
    }

    async fn load_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GandalfError> {
        debug!("Loading {url}");
        let bytes = self.platform.load_bytes_from_url(url).await?;

        serde_json::from_slice(&bytes).map_err(|err| GandalfError::FeedUnavailable {
            url: url.to_string(),
            reason: format!("malformed document: {err}"),
        })
    }
}

fn request_url(url: &str, stamp: Option<i64>) -> String {
    match stamp {
        Some(stamp) if url.contains('?') => format!("{url}&t={stamp}"),
        Some(stamp) => format!("{url}?t={stamp}"),
        None => url.to_string(),
    }
}

/// Replaces the markers of the feed in the map with the ones built from `fetched`.
///
/// The layers of the feed are cleared first. When `fetched` is an error the cleared layers are
/// marked as unavailable. Feature level errors are logged and counted in the returned summary,
/// they never stop the processing of the rest of the collection.
///
/// On the first successful load the default sensor layer is shown and, if the feed says so, its
/// track, position, waypoint and marker layers. Later loads keep the visibility the user chose.
pub fn apply(
    feed: &FeedDefinition,
    fetched: Result<FetchedFeed, GandalfError>,
    map: &mut Map,
) -> FeedStatus {
    let first_load = !matches!(map.feed_status(&feed.name), FeedStatus::Loaded(_));

    let fetched = match fetched {
        Ok(fetched) => fetched,
        Err(err) => {
            warn!("Feed {} is unavailable: {err}", feed.name);
            let reason = err.to_string();
            map.layers_mut().mark_unavailable(&feed.name, &reason);

            let status = FeedStatus::Unavailable { reason };
            map.set_feed_status(&feed.name, status.clone());
            map.redraw();
            return status;
        }
    };

    let layers = map.layers_mut();
    layers.clear_source(&feed.name);

    if let Some(config) = &fetched.config {
        for name in &config.surf_marker_layers {
            if feed.knows_layer(name) {
                layers.ensure_for(name, &feed.name);
            } else {
                warn!("Feed {} does not know layer {name} from its configuration", feed.name);
            }
        }
    }

    if first_load {
        if let Some(default_layer) = &feed.default_layer {
            layers.ensure_for(default_layer, &feed.name);
            layers.show(default_layer);
        }
    }

    let classifier = feed.classifier();
    let factory = MarkerFactory::new(feed.profile.clone());
    let mut summary = FeedSummary::default();
    let mut has_position = false;

    for feature in fetched.collection.features {
        let classified = feature_tag(&feature)
            .ok_or(FeatureError::MissingTag)
            .and_then(|tag| classifier.classify_tag(&tag));
        let kind = match classified {
            Ok(kind) => kind,
            Err(err) => {
                debug!("Skipping feature of feed {}: {err}", feed.name);
                summary.skipped += 1;
                continue;
            }
        };

        let built = VehicleFeature::try_from(feature).and_then(|feature| {
            factory
                .build(kind, &feature)
                .map(|built| (built, feature))
        });
        let (built, feature) = match built {
            Ok(built) => built,
            Err(err) => {
                warn!("Rejected {kind} feature of feed {}: {err}", feed.name);
                summary.rejected += 1;
                continue;
            }
        };

        let layer = match (kind, classifier.sensor_layer(feature.tag())) {
            (FeatureKind::SurfaceMarker, Some(sensor_layer)) => sensor_layer.to_string(),
            (kind, _) => feed.layer_name(LayerRole::from(kind)),
        };
        layers.ensure_for(&layer, &feed.name).push(built.marker);
        summary.added += 1;

        if let Some(waypoint) = built.waypoint {
            layers
                .ensure_for(&feed.layer_name(LayerRole::Waypoints), &feed.name)
                .push(waypoint);
            summary.waypoints += 1;
        }

        if let Some(position) = built.position {
            if !has_position {
                layers
                    .ensure_for(&feed.layer_name(LayerRole::Positions), &feed.name)
                    .push(position);
                has_position = true;
            }
        }
    }

    layers.set_source_status(&feed.name, LayerStatus::Ready);

    if first_load && feed.show_on_load {
        for role in LayerRole::ALL {
            let name = feed.layer_name(role);
            if layers.contains(&name) {
                layers.show(&name);
            }
        }
    }

    info!(
        "Loaded feed {}: {} markers, {} waypoints, {} skipped, {} rejected",
        feed.name, summary.added, summary.waypoints, summary.skipped, summary.rejected
    );

    let status = FeedStatus::Loaded(summary);
    map.set_feed_status(&feed.name, status.clone());
    map.redraw();
    status
}
