use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CxrError {
    #[error("Input path does not exist or is unreadable: {path}")]
    InvalidInput { path: PathBuf },

    #[error("No render sequences found under {path} (extension: .{extension})")]
    NoSequencesFound { path: PathBuf, extension: String },

    #[error("Duplicate frame number {number} in sequence '{base_name}'")]
    DuplicateFrame { base_name: String, number: u32 },

    #[error("Frame {number} not found in sequence '{base_name}'")]
    FrameNotFound { base_name: String, number: u32 },

    #[error("Invalid selection: {message}")]
    InvalidSelection { message: String },

    #[error("External tool not found: {path}")]
    ToolUnavailable { path: PathBuf },

    #[error("Cannot read render elements from {path}: {reason}")]
    UnsupportedFile { path: PathBuf, reason: String },

    #[error("Extraction failed: {detail}")]
    ExtractionFailed { detail: String },

    #[error("Tool invocation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for CxrError {
    fn user_message(&self) -> String {
        match self {
            CxrError::InvalidInput { path } => {
                format!("Input path does not exist: {}", path.display())
            }
            CxrError::NoSequencesFound { path, extension } => {
                format!(
                    "No .{} sequences found under: {}",
                    extension,
                    path.display()
                )
            }
            CxrError::ToolUnavailable { path } => {
                format!("CoronaImageCmd not found at: {}", path.display())
            }
            CxrError::UnsupportedFile { path, reason } => {
                format!(
                    "Cannot read render elements from {}: {}",
                    path.display(),
                    reason
                )
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            CxrError::InvalidInput { .. } => Some(
                "Pass a .cxr file or a directory containing frames named like scene.0001.cxr."
                    .to_string(),
            ),
            CxrError::NoSequencesFound { .. } => Some(
                "Check the directory and the configured container extension. Frames must be \
                 named <name>.<digits>.<ext> to be grouped into a sequence."
                    .to_string(),
            ),
            CxrError::ToolUnavailable { .. } => Some(
                "Install the Corona Image Editor or point --tool-path (or the CORONA_IMAGE_CMD \
                 environment variable) at CoronaImageCmd."
                    .to_string(),
            ),
            CxrError::DuplicateFrame { .. } => Some(
                "Two files resolve to the same frame number. Rename or remove one of them, \
                 then re-run the scan."
                    .to_string(),
            ),
            CxrError::FrameNotFound { .. } => Some(
                "Use --list to see the frame range of each sequence before selecting frames."
                    .to_string(),
            ),
            CxrError::Timeout { .. } => Some(
                "The tool took longer than expected. Increase the limit with --timeout."
                    .to_string(),
            ),
            CxrError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for CxrError {
    fn from(error: toml::de::Error) -> Self {
        CxrError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CxrError>;
