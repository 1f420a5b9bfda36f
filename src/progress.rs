//! # Progress Tracking and Statistics Module
//!
//! Visual progress bar via `indicatif` plus the cumulative tally the final
//! report is printed from. The per-file ledger lives in the pipeline's
//! report; this is only the live console feedback.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages the progress bar for a batch run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Advance by one file with a status message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics tracker for conversion results
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub files_processed: usize,
    pub files_converted: usize,
    pub files_skipped: usize,
}

impl ConversionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_converted(&mut self) {
        self.files_processed += 1;
        self.files_converted += 1;
    }

    pub fn add_skipped(&mut self) {
        self.files_processed += 1;
        self.files_skipped += 1;
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Converted: {} | Skipped: {}",
            self.files_processed, self.files_converted, self.files_skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_tally() {
        let mut stats = ConversionStats::new();
        stats.add_converted();
        stats.add_converted();
        stats.add_skipped();

        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.files_converted, 2);
        assert_eq!(stats.files_skipped, 1);
        assert!(stats.format_summary().contains("Converted: 2"));
    }
}
