//! Terminal progress bar wired into the scheduler's observer hook.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tally_core::recon::ProgressObserver;

/// Progress bar rendered on stderr while addresses are being checked.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressObserver for ConsoleProgress {
    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{bar:40.cyan/dim} {percent:>3}% | {pos}/{len} addresses",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
    }

    fn update(&self, completed: usize) {
        self.bar.set_position(completed as u64);
    }

    fn stop(&self) {
        self.bar.finish_and_clear();
    }
}
