use std::future::Future;

/// Runs the future on the tokio runtime without waiting for its result.
///
/// Must be called from within a tokio runtime.
pub fn spawn<T>(future: T)
where
    T: Future + Send + 'static,
    T::Output: Send + 'static,
{
    tokio::spawn(future);
}
