//! Notifications from the map session to the host that draws it.

/// Receives requests to redraw the map.
pub trait Messenger: Send + Sync {
    /// Requests the host to redraw the map on the next frame.
    fn request_redraw(&self);
}

impl<T: Fn() + Send + Sync> Messenger for T {
    fn request_redraw(&self) {
        self()
    }
}
