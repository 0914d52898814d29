//! Progress reporting for bulk operations

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress indicator drawn on stderr
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    /// Create a progress bar; hidden when `visible` is false (quiet, JSON, non-terminal)
    pub fn new(total: u64, operation: &str, dry_run: bool, visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total);
        let template = if dry_run {
            "{spinner:.yellow} {msg} [{bar:40.yellow/blue}] {pos}/{len}"
        } else {
            "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}"
        };
        let style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░");
        bar.set_style(style);

        let message = if dry_run {
            format!("(dry-run) {}", operation)
        } else {
            operation.to_string()
        };
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Increment the progress by one
    pub fn inc(&self) {
        self.bar.inc(1);
    }

    /// Print a line above the bar without corrupting it
    pub fn println(&self, line: &str) {
        if self.bar.is_hidden() {
            return;
        }
        self.bar.println(line);
    }

    /// Finish and clear the progress bar
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}
