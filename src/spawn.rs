use tokio::task::JoinHandle;

/// A handle to a spawned task that aborts it on drop.
///
/// Used for the per-session reader task and the auto-release timer, so that a dropped
/// [`Session`][`crate::Session`] cannot leave either running.
#[derive(Debug)]
pub struct TaskHandle<T>(JoinHandle<T>);

impl<T> TaskHandle<T> {
    /// Stop the task.
    pub fn abort(&self) {
        self.0.abort();
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Spawn a future, discarding its result.
pub fn spawn<F>(future: F)
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(future);
}

/// Spawn a future, keeping a handle that aborts it on drop.
pub fn spawn_with_handle<F>(future: F) -> TaskHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    TaskHandle(tokio::spawn(future))
}
