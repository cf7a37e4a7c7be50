use crate::extractor::{ItemOutcome, ItemStatus};
use crate::ui::output::format_duration;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    pub fn create_scan_spinner(&self, message: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new_spinner());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.set_message(message.to_string());
        pb
    }

    pub fn create_extract_progress(&self, total_items: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new(total_items));
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>5}/{len:5} items {msg}"
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        );
        pb.set_message("Extracting elements...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn suspend<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if self.enabled {
            self.multi_progress.suspend(f)
        } else {
            f()
        }
    }

    pub fn clear(&self) {
        if self.enabled {
            self.multi_progress.clear().ok();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new(true)
    }
}

// Helper functions for updating progress bars based on extraction events
pub fn update_extract_progress(pb: &ProgressBar, outcome: &ItemOutcome) {
    pb.inc(1);

    let verb = match outcome.status {
        ItemStatus::Success => "extracted",
        ItemStatus::Skipped => "skipped",
        ItemStatus::Failed => "failed",
    };
    pb.set_message(format!(
        "{} {}.{:04} [{}]",
        verb, outcome.sequence, outcome.frame, outcome.element
    ));
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    let final_message = format!("{} (completed in {})", message, format_duration(duration));
    pb.finish_with_message(final_message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_progress_manager_creation() {
        let manager = ProgressManager::new(true);
        assert!(manager.is_enabled());

        let disabled_manager = ProgressManager::new(false);
        assert!(!disabled_manager.is_enabled());
    }

    #[test]
    fn test_disabled_progress_bars() {
        let manager = ProgressManager::new(false);

        let spinner = manager.create_scan_spinner("scanning");
        assert!(spinner.is_hidden());

        let bar = manager.create_extract_progress(10);
        assert!(bar.is_hidden());
    }

    #[test]
    fn test_extract_progress_updates() {
        let manager = ProgressManager::new(true);
        let pb = manager.create_extract_progress(4);

        let outcome = ItemOutcome {
            sequence: "shot".to_string(),
            frame: 1,
            element: "BEAUTY".to_string(),
            output_path: PathBuf::from("/r/shot/shot_BEAUTY.0001.exr"),
            status: ItemStatus::Success,
            error: None,
        };

        update_extract_progress(&pb, &outcome);
        assert_eq!(pb.position(), 1);

        finish_progress_with_summary(&pb, "Extracted 1 item", Duration::from_secs(2));
    }
}
