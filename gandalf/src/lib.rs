//! Gandalf turns the GeoJSON feeds of autonomous ocean vehicles (gliders, floats, wave gliders)
//! into named layers of map markers, and keeps track of which of them are shown, alongside
//! remotely rendered oceanographic overlays.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gandalf::config::PortalConfig;
//! use gandalf::feed::FeedLoader;
//! use parking_lot::RwLock;
//!
//! # tokio_test::block_on(async {
//! let config = PortalConfig::from_file("gandalf.json").unwrap();
//! let map = Arc::new(RwLock::new(config.build_map(chrono::Utc::now().date_naive())));
//!
//! let loader = FeedLoader::new(Arc::new(config.platform().unwrap()));
//! loader.refresh_all(&config.feeds, &map).await;
//!
//! for layer in map.read().layers().iter_visible() {
//!     println!("{}: {} markers", layer.name(), layer.len());
//! }
//! # });
//! ```
//!
//! # Main components of Gandalf
//!
//! * [`Map`] is the session object. It owns the current [`MapView`], the
//!   [`LayerRegistry`](layer::LayerRegistry), the [`overlays`](overlay) and the status of every
//!   feed. There is no global state: everything the portal shows lives in the map.
//! * [`Layers`](layer) are named collections of [`markers`](marker) that are shown and hidden as
//!   a unit. [Exclusivity groups](layer::ExclusivityGroup) guarantee that at most one of their
//!   members is visible.
//! * The [`FeedLoader`](feed::FeedLoader) downloads the feeds through a
//!   [`PlatformService`](platform::PlatformService), [classifies](feature::FeatureClassifier) every
//!   feature, builds its markers with a [`MarkerFactory`](marker::MarkerFactory) and puts them into
//!   the layers of the feed. A failed feed never panics: its layers are reported as unavailable.
//! * The [`ControlPanel`](control::ControlPanel) binds the portal controls to layer and overlay
//!   operations.
//! * The [`PortalConfig`](config::PortalConfig) describes all of the above in one JSON document.

pub(crate) mod async_runtime;
mod attribution;
mod color;
pub mod config;
pub mod control;
pub mod error;
pub mod feature;
pub mod feed;
pub mod geo;
pub mod layer;
mod map;
pub mod marker;
mod messenger;
pub mod overlay;
pub mod platform;

pub use attribution::Attribution;
pub use color::Color;
pub use error::{FeatureError, GandalfError};
pub use geo::GeoPoint;
pub use map::{Map, MapView};
pub use messenger::Messenger;
