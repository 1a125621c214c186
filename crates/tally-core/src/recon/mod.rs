//! Reconciliation pipeline: comparison, scheduling, retry, and progress.

pub mod comparator;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod union;

pub use comparator::{compare_balances, extract_addresses, generate_report};
pub use progress::{NoopProgress, ProgressObserver};
pub use retry::RetryPolicy;
pub use scheduler::{FallbackPolicy, Scheduler};
