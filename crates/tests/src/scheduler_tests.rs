//! Concurrency and failure-absorption tests for the bounded scheduler.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tally_core::recon::{FallbackPolicy, NoopProgress, ProgressObserver, Scheduler};
use tally_core::source::SourceError;
use tally_core::types::{BalanceMap, Outcome};

fn baseline(n: usize) -> BalanceMap {
    (0..n)
        .map(|i| (format!("addr-{i:04}"), format!("{}", i * 10)))
        .collect()
}

fn addresses(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("addr-{i:04}")).collect()
}

#[tokio::test]
async fn test_concurrent_limit_respected() {
    const LIMIT: usize = 5;
    const TOTAL: usize = 60;

    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let baseline = baseline(TOTAL);
    let scheduler = Scheduler::new(LIMIT);

    let comparisons = scheduler
        .run(
            &baseline,
            addresses(TOTAL),
            |_address| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok("0".to_string())
                }
            },
            &NoopProgress,
        )
        .await;

    assert_eq!(comparisons.len(), TOTAL);
    assert!(
        peak.load(Ordering::SeqCst) <= LIMIT,
        "peak concurrency {} exceeded limit {}",
        peak.load(Ordering::SeqCst),
        LIMIT
    );
}

#[tokio::test]
async fn test_every_address_produces_exactly_one_result() {
    const TOTAL: usize = 40;
    let baseline = baseline(TOTAL);
    let scheduler = Scheduler::new(8);

    let comparisons = scheduler
        .run(
            &baseline,
            addresses(TOTAL),
            |address| async move {
                // Echo the baseline value back so everything matches.
                let index: usize = address[5..].parse().unwrap();
                Ok(format!("{}", index * 10))
            },
            &NoopProgress,
        )
        .await;

    assert_eq!(comparisons.len(), TOTAL);
    let unique: HashSet<&str> = comparisons.iter().map(|c| c.address.as_str()).collect();
    assert_eq!(unique.len(), TOTAL);
    assert!(comparisons.iter().all(|c| c.outcome == Outcome::Match));
}

struct RecordingProgress {
    started_with: AtomicUsize,
    last_seen: AtomicUsize,
    stopped: AtomicUsize,
}

impl RecordingProgress {
    fn new() -> Self {
        Self {
            started_with: AtomicUsize::new(0),
            last_seen: AtomicUsize::new(0),
            stopped: AtomicUsize::new(0),
        }
    }
}

impl ProgressObserver for RecordingProgress {
    fn start(&self, total: usize) {
        self.started_with.store(total, Ordering::SeqCst);
    }

    fn update(&self, completed: usize) {
        self.last_seen.fetch_max(completed, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_progress_counter_reaches_total() {
    const TOTAL: usize = 25;
    let baseline = baseline(TOTAL);
    let scheduler = Scheduler::new(4);
    let progress = RecordingProgress::new();

    scheduler
        .run(
            &baseline,
            addresses(TOTAL),
            |_| async { Ok("0".to_string()) },
            &progress,
        )
        .await;

    assert_eq!(progress.started_with.load(Ordering::SeqCst), TOTAL);
    assert_eq!(progress.last_seen.load(Ordering::SeqCst), TOTAL);
    assert_eq!(progress.stopped.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failures_absorbed_without_aborting() {
    const TOTAL: usize = 20;
    let baseline = baseline(TOTAL);
    let scheduler = Scheduler::new(6);

    // Every third address fails terminally.
    let comparisons = scheduler
        .run(
            &baseline,
            addresses(TOTAL),
            |address| async move {
                let index: usize = address[5..].parse().unwrap();
                if index % 3 == 0 {
                    Err(SourceError::HttpStatus(500, "boom".into()))
                } else {
                    Ok(format!("{}", index * 10))
                }
            },
            &NoopProgress,
        )
        .await;

    assert_eq!(comparisons.len(), TOTAL);
    // Failed fetches fall back to zero; addr-0000 has baseline 0 so it
    // still matches, the other failures mismatch against their baseline.
    let mismatches = comparisons
        .iter()
        .filter(|c| c.outcome == Outcome::Mismatch)
        .count();
    let expected_failures = (0..TOTAL).filter(|i| i % 3 == 0 && *i != 0).count();
    assert_eq!(mismatches, expected_failures);
}

#[tokio::test]
async fn test_mark_unknown_policy_separates_failures() {
    const TOTAL: usize = 10;
    let baseline = baseline(TOTAL);
    let scheduler = Scheduler::new(3).with_fallback(FallbackPolicy::MarkUnknown);

    let comparisons = scheduler
        .run(
            &baseline,
            addresses(TOTAL),
            |address| async move {
                let index: usize = address[5..].parse().unwrap();
                if index < 4 {
                    Err(SourceError::Timeout)
                } else {
                    Ok(format!("{}", index * 10))
                }
            },
            &NoopProgress,
        )
        .await;

    let unknowns = comparisons
        .iter()
        .filter(|c| c.outcome == Outcome::Unknown)
        .count();
    let matches = comparisons
        .iter()
        .filter(|c| c.outcome == Outcome::Match)
        .count();
    assert_eq!(unknowns, 4);
    assert_eq!(matches, TOTAL - 4);
}

#[tokio::test]
async fn test_sequential_waves_reuse_capacity() {
    // Two runs back to back on the same scheduler must both complete.
    const TOTAL: usize = 30;
    let baseline = baseline(TOTAL);
    let scheduler = Scheduler::new(5);

    for _ in 0..2 {
        let comparisons = scheduler
            .run(
                &baseline,
                addresses(TOTAL),
                |_| async {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    Ok("0".to_string())
                },
                &NoopProgress,
            )
            .await;
        assert_eq!(comparisons.len(), TOTAL);
    }
}
