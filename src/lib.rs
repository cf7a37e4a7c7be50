pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod scanner;
pub mod tool;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, ImageFormat, OutputConfig, ScanConfig, ToolConfig};
pub use error::{CxrError, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{
    plan, BatchReport, ItemOutcome, ItemStatus, Orchestrator, PlannedItem, RunStatus, Selection,
    SelectionOptions,
};
pub use scanner::{DuplicateFrame, Frame, ScanOutcome, Sequence, SequenceScanner};
pub use tool::{CoronaImageCmd, Element, ElementSet, ExtractJob, RenderTool};
pub use ui::{CancelToken, GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;

/// Main library interface: scan for sequences, introspect elements and
/// drive batch extractions with progress and cancellation wired in.
pub struct CxrExtract {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl CxrExtract {
    /// Create a new instance with the provided configuration.
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Create an instance for testing (no signal handler conflicts).
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet);
        let shutdown = GracefulShutdown::new_for_test();

        Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        }
    }

    /// Create an instance from CLI arguments.
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// Full workflow: scan the input, build a selection from the filter
    /// options and run the extraction batch.
    pub async fn run(&self, input: &Path, options: &SelectionOptions) -> Result<BatchReport> {
        self.shutdown.check_shutdown()?;

        let outcome = self.scan(input)?;
        self.output_formatter.print_scan_summary(&outcome);

        if outcome.is_empty() {
            return Err(CxrError::NoSequencesFound {
                path: input.to_path_buf(),
                extension: self.config.scan.extension.clone(),
            });
        }

        let selection = Selection::from_scan(outcome.sequences, options)?;
        self.shutdown.check_shutdown()?;

        self.run_extraction(&selection).await
    }

    /// Scan a file or directory for sequences.
    pub fn scan(&self, input: &Path) -> Result<ScanOutcome> {
        self.output_formatter.start_operation("Scanning for CXR sequences");

        let scanner = SequenceScanner::new(&self.config.scan);
        let outcome = scanner.scan(input)?;

        self.output_formatter
            .debug(&outcome.statistics().display_summary());

        Ok(outcome)
    }

    /// Elements of a sequence, introspected from its first frame.
    pub async fn list_elements(&self, sequence: &Sequence) -> Result<ElementSet> {
        let tool = self.make_tool();
        let elements = tool.list_elements(sequence.first_frame()).await?;
        Ok(ElementSet::new(sequence, elements))
    }

    /// Run one extraction batch with progress tracking.
    pub async fn run_extraction(&self, selection: &Selection) -> Result<BatchReport> {
        self.output_formatter.start_operation("Extracting render elements");

        let progress_bar = self
            .progress_manager
            .create_extract_progress(selection.item_count() as u64);
        let progress_callback = {
            let pb = progress_bar.clone();
            move |outcome: &ItemOutcome| {
                ui::progress::update_extract_progress(&pb, outcome);
            }
        };

        let orchestrator = Orchestrator::new(self.make_tool())
            .with_jobs(self.config.effective_jobs())
            .with_cancel(self.shutdown.token())
            .with_progress(progress_callback);

        match orchestrator.run(selection).await {
            Ok(report) => {
                ui::progress::finish_progress_with_summary(
                    &progress_bar,
                    &format!(
                        "Extracted {} item(s), skipped {}",
                        report.succeeded(),
                        report.skipped()
                    ),
                    report.duration,
                );
                Ok(report)
            }
            Err(error) => {
                progress_bar.abandon_with_message("Extraction aborted".to_string());
                Err(error)
            }
        }
    }

    fn make_tool(&self) -> CoronaImageCmd {
        CoronaImageCmd::new(&self.config.tool.path)
            .with_timeout(self.config.tool_timeout_duration())
            .with_cancel(self.shutdown.token())
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config).map_err(CxrError::Io)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &CxrError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}
