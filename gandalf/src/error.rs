//! Error types used by the crate.

use thiserror::Error;

/// Gandalf error type.
#[derive(Debug, Error)]
pub enum GandalfError {
    /// A feed could not be fetched or decoded. The layers it owns are reported as unavailable.
    #[error("feed {url} is unavailable: {reason}")]
    FeedUnavailable {
        /// Url of the feed.
        url: String,
        /// Human readable failure reason.
        reason: String,
    },
    /// Error decoding data.
    #[error("failed to decode data: {0}")]
    Decoding(String),
    /// Exclusivity group with the given name is not defined.
    #[error("unknown exclusivity group: {0}")]
    UnknownGroup(String),
    /// No action is bound to the control.
    #[error("unknown control: {0}")]
    UnknownControl(String),
    /// Overlay with the given name is not in the collection.
    #[error("unknown overlay: {0}")]
    UnknownOverlay(String),
    /// The layer cannot be shown because the feed it is populated from failed.
    #[error("layer {layer} is unavailable: {reason}")]
    LayerUnavailable {
        /// Name of the layer.
        layer: String,
        /// Reason reported by the feed loader.
        reason: String,
    },
    /// The control received an input that its action cannot handle.
    #[error("invalid input for control {control}: {reason}")]
    InvalidInput {
        /// Control id.
        control: String,
        /// What was wrong with the input.
        reason: String,
    },
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// A feature could not be turned into a marker.
    #[error(transparent)]
    Feature(#[from] FeatureError),
    /// Error reading/writing data to the FS.
    #[error("failed to read file: {0}")]
    FsIo(#[from] std::io::Error),
    /// The overlay has no elevation dimension, or the elevation value is unusable.
    #[error("elevation of overlay {overlay}: {reason}")]
    Elevation {
        /// Name of the overlay.
        overlay: String,
        /// What was wrong.
        reason: String,
    },
}

impl From<reqwest::Error> for GandalfError {
    fn from(value: reqwest::Error) -> Self {
        Self::FeedUnavailable {
            url: value.url().map(|url| url.to_string()).unwrap_or_default(),
            reason: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for GandalfError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decoding(value.to_string())
    }
}

/// Errors produced while classifying a feature or building a marker from it.
///
/// None of these abort the processing of a feed: the offending feature is skipped and the rest of
/// the collection is still loaded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// Feature has no `id` to classify it by.
    #[error("feature has no identifying tag")]
    MissingTag,
    /// Feature tag is not known to the classifier.
    #[error("unrecognized feature tag: {0}")]
    Unrecognized(String),
    /// Feature has no geometry.
    #[error("feature has no geometry")]
    MissingGeometry,
    /// Feature geometry cannot be used for the marker.
    #[error("invalid feature geometry: {0}")]
    InvalidGeometry(String),
    /// A property required to build the marker is absent.
    #[error("missing property: {0}")]
    MissingProperty(String),
    /// A property is present but has a wrong type.
    #[error("property {property} must be {expected}")]
    InvalidProperty {
        /// Property name.
        property: String,
        /// Expected value type.
        expected: &'static str,
    },
}
