//! [Layers](Layer) are named collections of markers that are shown on and hidden from the map as a
//! unit.

use crate::marker::Marker;

mod group;
mod registry;

pub use group::{ExclusivityGroup, GroupScope};
pub use registry::LayerRegistry;

/// Loading state of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LayerStatus {
    /// The feed populating the layer has not completed yet.
    #[default]
    Pending,
    /// The layer contains the markers of the last successful feed load.
    Ready,
    /// The feed populating the layer failed. The layer is empty.
    Unavailable(String),
}

/// Named, ordered collection of markers.
///
/// A layer is either attached to the map with all its markers, or detached. There is no partially
/// attached state.
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    markers: Vec<Marker>,
    is_attached: bool,
    source: Option<String>,
    status: LayerStatus,
}

impl Layer {
    /// Creates a new empty detached layer.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markers: vec![],
            is_attached: false,
            source: None,
            status: LayerStatus::default(),
        }
    }

    /// Name of the layer.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Markers of the layer, in the order they were added.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Number of markers in the layer.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Returns `true` if the layer has no markers.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Returns `true` if the layer is attached to the map.
    pub fn is_attached(&self) -> bool {
        self.is_attached
    }

    /// Name of the feed that populates the layer.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Loading state of the layer.
    pub fn status(&self) -> &LayerStatus {
        &self.status
    }

    pub(crate) fn push(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    pub(crate) fn set_attached(&mut self, is_attached: bool) -> bool {
        let changed = self.is_attached != is_attached;
        self.is_attached = is_attached;
        changed
    }

    pub(crate) fn set_source(&mut self, source: &str) {
        if self.source.is_none() {
            self.source = Some(source.to_string());
        }
    }

    pub(crate) fn set_status(&mut self, status: LayerStatus) {
        self.status = status;
    }

    pub(crate) fn clear(&mut self) {
        self.markers.clear();
    }
}
