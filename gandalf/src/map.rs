//! The [`Map`] session owns everything that is shown on the portal map.

use ahash::{HashMap, HashMapExt};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::GandalfError;
use crate::feed::FeedStatus;
use crate::geo::GeoPoint;
use crate::latlon;
use crate::layer::{LayerRegistry, LayerStatus};
use crate::messenger::Messenger;
use crate::overlay::OverlayCollection;

/// Center and zoom level of the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    /// Geographic center of the view.
    pub center: GeoPoint,
    /// Zoom level in the standard web tile scheme.
    pub zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: latlon!(31.0, -88.7),
            zoom: 6.0,
        }
    }
}

/// Map session: the view, the layers populated from the vehicle feeds, the raster overlays and
/// the load status of every feed.
///
/// Every operation that changes what is drawn requests a redraw through the [`Messenger`], if one
/// is set.
pub struct Map {
    view: MapView,
    layers: LayerRegistry,
    overlays: OverlayCollection,
    feeds: HashMap<String, FeedStatus>,
    messenger: Option<Box<dyn Messenger>>,
}

impl Default for Map {
    fn default() -> Self {
        Self::new(MapView::default(), OverlayCollection::default())
    }
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("view", &self.view)
            .field("layers", &self.layers)
            .field("overlays", &self.overlays)
            .field("feeds", &self.feeds)
            .finish_non_exhaustive()
    }
}

impl Map {
    /// Creates a new map without layers.
    pub fn new(view: MapView, overlays: OverlayCollection) -> Self {
        Self {
            view,
            layers: LayerRegistry::default(),
            overlays,
            feeds: HashMap::new(),
            messenger: None,
        }
    }

    /// Current view of the map.
    pub fn view(&self) -> &MapView {
        &self.view
    }

    /// Changes the view of the map to the given one.
    pub fn set_view(&mut self, view: MapView) {
        self.view = view;
        self.redraw();
    }

    /// Layer registry of the map.
    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    /// Returns a mutable reference to the layer registry.
    ///
    /// Changes made through the registry do not request a redraw, call [`Map::redraw`] when done.
    pub fn layers_mut(&mut self) -> &mut LayerRegistry {
        &mut self.layers
    }

    /// Raster overlays of the map.
    pub fn overlays(&self) -> &OverlayCollection {
        &self.overlays
    }

    /// Returns a mutable reference to the overlays.
    pub fn overlays_mut(&mut self) -> &mut OverlayCollection {
        &mut self.overlays
    }

    /// Load status of the feed. Feeds that were never loaded are [`FeedStatus::Pending`].
    pub fn feed_status(&self, feed: &str) -> &FeedStatus {
        static PENDING: FeedStatus = FeedStatus::Pending;
        self.feeds.get(feed).unwrap_or(&PENDING)
    }

    /// Iterates over the statuses of all feeds that were registered or loaded.
    pub fn feeds(&self) -> impl Iterator<Item = (&str, &FeedStatus)> + '_ {
        self.feeds
            .iter()
            .map(|(name, status)| (name.as_str(), status))
    }

    /// Records the load status of the feed.
    pub fn set_feed_status(&mut self, feed: &str, status: FeedStatus) {
        info!("Feed {feed}: {status}");
        self.feeds.insert(feed.to_string(), status);
    }

    /// Shows the layer.
    ///
    /// Fails with [`GandalfError::LayerUnavailable`] if the feed populating the layer failed.
    pub fn show_layer(&mut self, name: &str) -> Result<bool, GandalfError> {
        self.check_available(name)?;
        let changed = self.layers.show(name);
        self.redraw_if(changed);
        Ok(changed)
    }

    /// Hides the layer.
    pub fn hide_layer(&mut self, name: &str) -> bool {
        let changed = self.layers.hide(name);
        self.redraw_if(changed);
        changed
    }

    /// Shows the layer, hiding the layers excluded by the group.
    pub fn show_exclusive(&mut self, name: &str, group: &str) -> Result<bool, GandalfError> {
        self.check_available(name)?;
        let changed = self.layers.show_exclusive(name, group)?;
        self.redraw_if(changed);
        Ok(changed)
    }

    /// Hides all members of the group.
    pub fn hide_group(&mut self, group: &str) -> Result<bool, GandalfError> {
        let changed = self.layers.hide_group(group)?;
        self.redraw_if(changed);
        Ok(changed)
    }

    /// Sets the opacity of the overlay.
    pub fn set_overlay_opacity(&mut self, name: &str, opacity: f64) -> Result<bool, GandalfError> {
        let changed = self.overlays.get_mut(name)?.set_opacity(opacity);
        self.redraw_if(changed);
        Ok(changed)
    }

    /// Sets the elevation (depth) of a WMS overlay.
    pub fn set_overlay_elevation(
        &mut self,
        name: &str,
        elevation: Option<f64>,
    ) -> Result<bool, GandalfError> {
        let changed = self.overlays.get_mut(name)?.set_elevation(elevation)?;
        self.redraw_if(changed);
        Ok(changed)
    }

    /// Request redraw of the map.
    pub fn redraw(&self) {
        if let Some(messenger) = &self.messenger {
            messenger.request_redraw()
        }
    }

    /// Sets the new event messenger for the map.
    pub fn set_messenger(&mut self, messenger: Option<impl Messenger + 'static>) {
        self.messenger = messenger.map(|m| Box::new(m) as Box<dyn Messenger>);
    }

    fn redraw_if(&self, changed: bool) {
        if changed {
            self.redraw();
        }
    }

    fn check_available(&self, name: &str) -> Result<(), GandalfError> {
        match self.layers.get(name).map(|layer| layer.status()) {
            Some(LayerStatus::Unavailable(reason)) => {
                debug!("Refusing to show unavailable layer {name}");
                Err(GandalfError::LayerUnavailable {
                    layer: name.to_string(),
                    reason: reason.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;
    use crate::layer::ExclusivityGroup;
    use crate::overlay::{Overlay, OverlaySource, TileTemplate};

    fn counting_map() -> (Map, Arc<AtomicUsize>) {
        let redraws = Arc::new(AtomicUsize::new(0));
        let counter = redraws.clone();

        let overlays = OverlayCollection::from(vec![Overlay::new(
            "gebco",
            OverlaySource::Tiles(TileTemplate::new("{z}/{x}/{y}")),
        )]);
        let mut map = Map::new(MapView::default(), overlays);
        map.set_messenger(Some(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        (map, redraws)
    }

    #[test]
    fn redraw_only_on_change() {
        let (mut map, redraws) = counting_map();

        map.show_layer("wg.track").unwrap();
        map.show_layer("wg.track").unwrap();
        map.hide_layer("wg.track");
        map.hide_layer("wg.track");
        assert_eq!(redraws.load(Ordering::Relaxed), 2);

        map.set_overlay_opacity("gebco", 0.5).unwrap();
        map.set_overlay_opacity("gebco", 0.5).unwrap();
        assert_eq!(redraws.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn unavailable_layer_is_refused() {
        let (mut map, _) = counting_map();
        map.layers_mut().ensure_for("wg.track", "wg");
        map.layers_mut().mark_unavailable("wg", "503 Service Unavailable");

        assert_matches!(
            map.show_layer("wg.track"),
            Err(GandalfError::LayerUnavailable { layer, reason })
                if layer == "wg.track" && reason == "503 Service Unavailable"
        );
        assert!(!map.layers().is_visible("wg.track"));
    }

    #[test]
    fn group_operations() {
        let (mut map, _) = counting_map();
        map.layers_mut()
            .define_group(ExclusivityGroup::new("wg", ["temp", "salinity"]));

        map.show_exclusive("temp", "wg").unwrap();
        map.show_exclusive("salinity", "wg").unwrap();
        assert!(!map.layers().is_visible("temp"));
        assert!(map.hide_group("wg").unwrap());
        assert_eq!(map.layers().iter_visible().count(), 0);
        assert_matches!(map.hide_group("argo"), Err(GandalfError::UnknownGroup(_)));
    }

    #[test]
    fn unknown_feed_is_pending() {
        let map = Map::default();
        assert_eq!(map.feed_status("wg"), &FeedStatus::Pending);
        assert_matches!(
            Map::default().set_overlay_elevation("rtofs", Some(-5.0)),
            Err(GandalfError::UnknownOverlay(_))
        );
    }
}
