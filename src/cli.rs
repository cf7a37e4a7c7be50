use crate::config::{CliOverrides, Config, ImageFormat};
use crate::error::{CxrError, Result};
use crate::extractor::SelectionOptions;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cxr-extract")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract render elements from Corona CXR sequences")]
#[command(
    long_about = "cxr-extract scans a file or directory for CXR frame sequences and drives \
                  CoronaImageCmd to extract the selected render elements from each frame."
)]
#[command(after_help = "EXAMPLES:\n  \
    cxr-extract scene.0001.cxr\n  \
    cxr-extract /path/to/renders/ --elements BEAUTY,Alpha\n  \
    cxr-extract /path/to/renders/ --sequences interior --frames 1-50 --format jpg\n  \
    cxr-extract scene.0001.cxr --prefix extracted --overwrite\n  \
    cxr-extract /path/to/renders/ --list")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input CXR file or directory
    pub input: PathBuf,

    /// Sequences to process, by base name (comma-separated; default: all)
    #[arg(short, long, value_delimiter = ',')]
    pub sequences: Option<Vec<String>>,

    /// Frames to process, e.g. "1-10,15" (default: all frames)
    #[arg(long, value_parser = validate_frame_spec)]
    pub frames: Option<String>,

    /// Elements to extract (comma-separated names, or "all")
    #[arg(short, long, value_delimiter = ',')]
    pub elements: Option<Vec<String>>,

    /// Output image format
    #[arg(short, long, value_enum)]
    pub format: Option<ImageFormat>,

    /// Output folder name (defaults to each sequence's base name)
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Overwrite existing output files
    #[arg(long)]
    pub overwrite: bool,

    /// Maximum concurrent tool invocations (default: one per CPU core)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Path to the CoronaImageCmd executable
    #[arg(long, env = "CORONA_IMAGE_CMD")]
    pub tool_path: Option<PathBuf>,

    /// Per-invocation timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Render-container extension to scan for
    #[arg(long, help = "Container extension without the dot (default: cxr)")]
    pub extension: Option<String>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// List sequences and their elements, then exit
    #[arg(long)]
    pub list: bool,

    /// Show the extraction plan without invoking the tool
    #[arg(long, help = "Show what would be extracted without actually doing it")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_extension(self.extension.clone())
            .with_tool_path(self.tool_path.clone())
            .with_jobs(self.jobs)
            .with_timeout(self.timeout)
            .with_format(self.format)
            .with_prefix(self.prefix.clone())
            .with_overwrite(self.overwrite)
    }

    /// Assemble the selection filters from the CLI surface and the
    /// merged configuration. `--elements all` maps to the wildcard.
    pub fn selection_options(&self, config: &Config) -> Result<SelectionOptions> {
        let frames = match &self.frames {
            Some(spec) => Some(
                parse_frame_spec(spec)
                    .map_err(|message| CxrError::InvalidSelection { message })?,
            ),
            None => None,
        };

        let elements = match &self.elements {
            Some(names) if names.len() == 1 && names[0].eq_ignore_ascii_case("all") => None,
            other => other.clone(),
        };

        Ok(SelectionOptions {
            sequences: self.sequences.clone(),
            frames,
            elements,
            format: config.output.format,
            prefix: config.output.prefix.clone(),
            overwrite: config.output.overwrite,
        })
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose > 0 && !self.quiet
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

/// Upper bound on frames expanded from one `--frames` specification.
const MAX_FRAME_SPEC_LEN: usize = 1_000_000;

pub fn parse_frame_spec(spec: &str) -> std::result::Result<Vec<u32>, String> {
    let mut frames = Vec::new();

    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        match part.split_once('-') {
            Some((start, end)) => {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid frame number: '{}'", start.trim()))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid frame number: '{}'", end.trim()))?;

                if end < start {
                    return Err(format!("Descending frame range: '{}'", part));
                }

                if (end - start) as usize >= MAX_FRAME_SPEC_LEN {
                    return Err(format!("Frame range too large: '{}'", part));
                }

                frames.extend(start..=end);
            }
            None => {
                frames.push(
                    part.parse()
                        .map_err(|_| format!("Invalid frame number: '{}'", part))?,
                );
            }
        }

        if frames.len() > MAX_FRAME_SPEC_LEN {
            return Err("Frame specification expands to too many frames".to_string());
        }
    }

    if frames.is_empty() {
        return Err("Frame specification is empty".to_string());
    }

    Ok(frames)
}

pub fn validate_frame_spec(spec: &str) -> std::result::Result<String, String> {
    parse_frame_spec(spec).map(|_| spec.to_string())
}
