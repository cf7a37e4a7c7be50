pub mod corona;
pub mod elements;

pub use corona::CoronaImageCmd;
pub use elements::{Element, ElementSet};

use crate::error::Result;
use crate::scanner::Frame;
use async_trait::async_trait;
use std::path::PathBuf;

/// The element argument of one extraction call: a single named element,
/// or the tool's `*` wildcard covering every element in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementArg {
    All,
    Named(String),
}

impl ElementArg {
    /// Value passed to the tool's `-e` flag.
    pub fn tool_argument(&self) -> &str {
        match self {
            ElementArg::All => "*",
            ElementArg::Named(name) => name,
        }
    }

    /// Label used in output file names and batch reports.
    pub fn label(&self) -> &str {
        match self {
            ElementArg::All => "ALL",
            ElementArg::Named(name) => name,
        }
    }
}

/// One extraction unit handed to the adapter: read `element` from
/// `input` and write it to `output`.
#[derive(Debug, Clone)]
pub struct ExtractJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub element: ElementArg,
}

/// Narrow seam around the external image-processing executable.
///
/// The orchestrator only speaks this trait, so its batching, overwrite
/// and failure-isolation logic is testable with a scripted fake.
#[async_trait]
pub trait RenderTool: Send + Sync {
    /// Confirm the tool can be invoked at all. Checked once, before any
    /// extraction begins.
    async fn verify_available(&self) -> Result<()>;

    /// Enumerate the render elements of one frame.
    async fn list_elements(&self, frame: &Frame) -> Result<Vec<Element>>;

    /// Run one extraction. Exit code zero is success; any diagnostic
    /// detail comes from the tool's error stream.
    async fn extract(&self, job: &ExtractJob) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_arg_forms() {
        assert_eq!(ElementArg::All.tool_argument(), "*");
        assert_eq!(ElementArg::All.label(), "ALL");

        let named = ElementArg::Named("Alpha".to_string());
        assert_eq!(named.tool_argument(), "Alpha");
        assert_eq!(named.label(), "Alpha");
    }
}
