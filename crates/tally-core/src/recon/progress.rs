//! Progress reporting hooks for long-running reconciliation runs.

/// Observer notified as the scheduler completes addresses.
///
/// Implementations must be safe to call from multiple tasks; `update`
/// receives the monotonically increasing count of completed addresses
/// but may observe it out of order under concurrency.
pub trait ProgressObserver: Send + Sync {
    fn start(&self, total: usize);
    fn update(&self, completed: usize);
    fn stop(&self);
}

/// Observer that discards all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn start(&self, _total: usize) {}
    fn update(&self, _completed: usize) {}
    fn stop(&self) {}
}
