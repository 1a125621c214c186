//! Bounded-concurrency fetch-and-compare scheduler.

use crate::recon::comparator::compare_balances;
use crate::recon::progress::ProgressObserver;
use crate::source::SourceError;
use crate::types::{BalanceMap, Comparison};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What to do with an address whose counterpart fetch fails after all
/// retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Treat the failed fetch as a zero balance and compare normally.
    #[default]
    ZeroBalance,
    /// Record the address as [`Outcome::Unknown`](crate::types::Outcome)
    /// without comparing.
    MarkUnknown,
}

/// Runs per-address fetches with a fixed concurrency ceiling, comparing
/// each result against the baseline.
///
/// A per-address failure never aborts the run: the address falls back
/// per the configured [`FallbackPolicy`] and the run continues.
#[derive(Debug, Clone)]
pub struct Scheduler {
    concurrency: usize,
    fallback: FallbackPolicy,
}

impl Scheduler {
    #[must_use]
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            fallback: FallbackPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Fetches the counterpart balance for every address and compares it
    /// against the baseline.
    ///
    /// At most `concurrency` fetches run at once. Results arrive in
    /// completion order; the caller sorts if it needs determinism.
    pub async fn run<F, Fut>(
        &self,
        baseline: &BalanceMap,
        addresses: Vec<String>,
        fetch: F,
        progress: &dyn ProgressObserver,
    ) -> Vec<Comparison>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<String, SourceError>>,
    {
        let total = addresses.len();
        progress.start(total);
        let completed = AtomicUsize::new(0);

        let comparisons: Vec<Comparison> = stream::iter(addresses)
            .map(|address| {
                let fetch = &fetch;
                let completed = &completed;
                async move {
                    let baseline_value = baseline.get(&address).map(String::as_str);
                    let comparison = match fetch(address.clone()).await {
                        Ok(counterpart) => {
                            compare_balances(&address, baseline_value, Some(&counterpart))
                        }
                        Err(err) => {
                            tracing::warn!(
                                address = %address,
                                error = %err,
                                "counterpart fetch failed, applying fallback"
                            );
                            self.fallback_comparison(&address, baseline_value)
                        }
                    };
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.update(done);
                    comparison
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        progress.stop();
        comparisons
    }

    fn fallback_comparison(&self, address: &str, baseline: Option<&str>) -> Comparison {
        match self.fallback {
            FallbackPolicy::ZeroBalance => compare_balances(address, baseline, Some("0")),
            FallbackPolicy::MarkUnknown => compare_balances(address, baseline, None),
        }
    }
}
