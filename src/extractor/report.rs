use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Final state of one (frame, element) item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemStatus {
    Success,
    Skipped,
    Failed,
}

/// One batch-report entry. Every attempted item produces exactly one.
#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub sequence: String,
    pub frame: u32,
    /// Element name, or "ALL" for the wildcard extraction.
    pub element: String,
    pub output_path: PathBuf,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Overall classification of a finished run, used for the process exit
/// code. Fatal conditions (tool unavailable, cancellation) surface as
/// errors instead and never reach a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Every item ended Success or Skipped-by-policy.
    Success,
    /// At least one item Failed; the rest were still attempted.
    Partial,
}

/// Aggregated outcome of one extraction run, in deterministic plan
/// order. Printing or persisting the report is the caller's job.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub items: Vec<ItemOutcome>,
    pub completed_at: DateTime<Utc>,
    pub duration: Duration,
}

impl BatchReport {
    pub fn new(items: Vec<ItemOutcome>, duration: Duration) -> Self {
        Self {
            items,
            completed_at: Utc::now(),
            duration,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.count(ItemStatus::Success)
    }

    pub fn skipped(&self) -> usize {
        self.count(ItemStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(ItemStatus::Failed)
    }

    pub fn run_status(&self) -> RunStatus {
        if self.failed() == 0 {
            RunStatus::Success
        } else {
            RunStatus::Partial
        }
    }

    pub fn failed_items(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Failed)
    }

    fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: ItemStatus) -> ItemOutcome {
        ItemOutcome {
            sequence: "shot".to_string(),
            frame: 1,
            element: "BEAUTY".to_string(),
            output_path: PathBuf::from("/r/shot/shot_BEAUTY.0001.exr"),
            status,
            error: match status {
                ItemStatus::Failed => Some("boom".to_string()),
                _ => None,
            },
        }
    }

    #[test]
    fn test_counts_and_status() {
        let report = BatchReport::new(
            vec![
                outcome(ItemStatus::Success),
                outcome(ItemStatus::Skipped),
                outcome(ItemStatus::Success),
            ],
            Duration::from_secs(1),
        );

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.run_status(), RunStatus::Success);
    }

    #[test]
    fn test_any_failure_is_partial() {
        let report = BatchReport::new(
            vec![outcome(ItemStatus::Success), outcome(ItemStatus::Failed)],
            Duration::from_secs(1),
        );

        assert_eq!(report.run_status(), RunStatus::Partial);
        assert_eq!(report.failed_items().count(), 1);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = BatchReport::new(vec![outcome(ItemStatus::Failed)], Duration::from_secs(2));
        let json = serde_json::to_string(&report).unwrap();

        assert!(json.contains("\"Failed\""));
        assert!(json.contains("boom"));
    }
}
