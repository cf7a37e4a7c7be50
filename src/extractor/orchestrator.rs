use crate::error::{CxrError, Result};
use crate::extractor::report::{BatchReport, ItemOutcome, ItemStatus};
use crate::extractor::selection::{ElementChoice, Selection};
use crate::tool::{ElementArg, ExtractJob, RenderTool};
use crate::ui::signals::CancelToken;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// One planned (frame, element) extraction unit with its resolved
/// output path. Produced deterministically from a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedItem {
    pub sequence: String,
    pub frame_number: u32,
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub output: PathBuf,
    pub element: ElementArg,
}

/// Compute the work items for a selection without touching the
/// filesystem or the tool. Order: selection order, then frame number
/// ascending, then element order. Two plans over the same selection and
/// directory state are identical.
pub fn plan(selection: &Selection) -> Result<Vec<PlannedItem>> {
    selection.validate()?;

    let mut items = Vec::with_capacity(selection.item_count());

    for selected in &selection.sequences {
        let sequence = &selected.sequence;
        let folder = selection
            .prefix
            .clone()
            .unwrap_or_else(|| sequence.base_name().to_string());
        let output_dir = sequence.directory().join(&folder);

        let element_args: Vec<ElementArg> = match &selected.elements {
            ElementChoice::All => vec![ElementArg::All],
            ElementChoice::Named(names) => {
                names.iter().map(|n| ElementArg::Named(n.clone())).collect()
            }
        };

        for frame in selected.resolved_frames()? {
            for element in &element_args {
                let file_name = format!(
                    "{}_{}.{}.{}",
                    sequence.base_name(),
                    element.label(),
                    frame.padded_number(),
                    selection.format.extension()
                );

                items.push(PlannedItem {
                    sequence: sequence.base_name().to_string(),
                    frame_number: frame.number(),
                    input: frame.path().to_path_buf(),
                    output_dir: output_dir.clone(),
                    output: output_dir.join(file_name),
                    element: element.clone(),
                });
            }
        }
    }

    Ok(items)
}

type ProgressCallback = Box<dyn Fn(&ItemOutcome) + Send + Sync>;

/// Drives a batch of extractions against a `RenderTool`.
///
/// Item failures are isolated: every attempted item produces exactly one
/// report entry and never stops its siblings. Only an unavailable tool
/// aborts the run as a whole.
pub struct Orchestrator<T: RenderTool> {
    tool: Arc<T>,
    jobs: usize,
    cancel: Option<CancelToken>,
    progress: Option<ProgressCallback>,
}

impl<T: RenderTool + 'static> Orchestrator<T> {
    pub fn new(tool: T) -> Self {
        Self {
            tool: Arc::new(tool),
            jobs: num_cpus::get(),
            cancel: None,
            progress: None,
        }
    }

    /// Cap on concurrent tool invocations.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ItemOutcome) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    pub async fn run(&self, selection: &Selection) -> Result<BatchReport> {
        let start = Instant::now();

        // Nothing can be attempted without the tool; fail before any
        // directory is created or item classified.
        self.tool.verify_available().await?;

        let items = plan(selection)?;
        let mut outcomes: Vec<Option<ItemOutcome>> = vec![None; items.len()];

        // Output directories are created once per sequence up front;
        // create_dir_all treats "already exists" as success, so workers
        // of the same sequence cannot race each other. A failure here
        // fails that sequence's items only.
        let mut dir_errors: HashMap<PathBuf, String> = HashMap::new();
        for item in &items {
            if dir_errors.contains_key(&item.output_dir) {
                continue;
            }
            if let Err(e) = fs::create_dir_all(&item.output_dir) {
                dir_errors.insert(item.output_dir.clone(), e.to_string());
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let mut join_set: JoinSet<(usize, Result<()>)> = JoinSet::new();

        for (idx, item) in items.iter().enumerate() {
            if let Some(error) = dir_errors.get(&item.output_dir) {
                self.record(
                    &mut outcomes,
                    idx,
                    self.outcome(
                        item,
                        ItemStatus::Failed,
                        Some(format!("cannot create output directory: {}", error)),
                    ),
                );
                continue;
            }

            // Overwrite policy: a plain existence check, nothing more.
            if !selection.overwrite && item.output.exists() {
                self.record(
                    &mut outcomes,
                    idx,
                    self.outcome(item, ItemStatus::Skipped, None),
                );
                continue;
            }

            let tool = self.tool.clone();
            let semaphore = semaphore.clone();
            let cancel = self.cancel.clone();
            let job = ExtractJob {
                input: item.input.clone(),
                output: item.output.clone(),
                element: item.element.clone(),
            };

            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (idx, Err(CxrError::Cancelled)),
                };

                // Stop dispatching promptly once cancellation is
                // requested; in-flight invocations are killed by the
                // adapter itself.
                if cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                    return (idx, Err(CxrError::Cancelled));
                }

                (idx, tool.extract(&job).await)
            });
        }

        let mut cancelled = false;
        let mut fatal: Option<CxrError> = None;

        while let Some(joined) = join_set.join_next().await {
            let (idx, result) = match joined {
                Ok(pair) => pair,
                Err(e) if e.is_cancelled() => continue,
                Err(e) => {
                    return Err(CxrError::Config {
                        message: format!("extraction task failed: {}", e),
                    });
                }
            };

            let item = &items[idx];
            match result {
                Ok(()) => {
                    self.record(&mut outcomes, idx, self.outcome(item, ItemStatus::Success, None));
                }
                Err(CxrError::Cancelled) => {
                    cancelled = true;
                }
                Err(e @ CxrError::ToolUnavailable { .. }) => {
                    // Non-recoverable: stop everything and surface one
                    // terminal error instead of per-item failures.
                    if fatal.is_none() {
                        fatal = Some(e);
                        join_set.abort_all();
                    }
                }
                Err(e) => {
                    self.record(
                        &mut outcomes,
                        idx,
                        self.outcome(item, ItemStatus::Failed, Some(e.to_string())),
                    );
                }
            }
        }

        if let Some(error) = fatal {
            return Err(error);
        }

        if cancelled || self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(CxrError::Cancelled);
        }

        let items = outcomes.into_iter().flatten().collect();
        Ok(BatchReport::new(items, start.elapsed()))
    }

    fn outcome(
        &self,
        item: &PlannedItem,
        status: ItemStatus,
        error: Option<String>,
    ) -> ItemOutcome {
        ItemOutcome {
            sequence: item.sequence.clone(),
            frame: item.frame_number,
            element: item.element.label().to_string(),
            output_path: item.output.clone(),
            status,
            error,
        }
    }

    fn record(&self, outcomes: &mut [Option<ItemOutcome>], idx: usize, outcome: ItemOutcome) {
        if let Some(callback) = &self.progress {
            callback(&outcome);
        }
        outcomes[idx] = Some(outcome);
    }
}
