use crate::error::{CxrError, Result};
use crate::scanner::Frame;
use crate::tool::elements::{self, Element};
use crate::tool::{ExtractJob, RenderTool};
use crate::ui::signals::CancelToken;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Adapter around the CoronaImageCmd executable.
///
/// Invocation contract: `<exe> --batch -e <element|*> <input> <output>`;
/// exit code zero signals success, anything else is a failure with
/// diagnostics on stderr. Element listings are read from the input
/// file's EXR header rather than the executable.
pub struct CoronaImageCmd {
    exe_path: PathBuf,
    timeout: Duration,
    cancel: Option<CancelToken>,
}

impl CoronaImageCmd {
    pub fn new<P: Into<PathBuf>>(exe_path: P) -> Self {
        Self {
            exe_path: exe_path.into(),
            timeout: Duration::from_secs(600),
            cancel: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn exe_path(&self) -> &PathBuf {
        &self.exe_path
    }

    fn build_args(job: &ExtractJob) -> Vec<OsString> {
        vec![
            OsString::from("--batch"),
            OsString::from("-e"),
            OsString::from(job.element.tool_argument()),
            job.input.clone().into_os_string(),
            job.output.clone().into_os_string(),
        ]
    }

    /// Locate the executable: either the configured path itself, or a
    /// PATH lookup when only a bare command name was given.
    fn resolve_executable(&self) -> Option<PathBuf> {
        if self.exe_path.is_file() {
            return Some(self.exe_path.clone());
        }

        if self.exe_path.components().count() == 1 {
            let name = self.exe_path.as_os_str();
            let search_path = std::env::var_os("PATH").unwrap_or_default();
            for dir in std::env::split_paths(&search_path) {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }

        None
    }

    fn unavailable(&self) -> CxrError {
        CxrError::ToolUnavailable {
            path: self.exe_path.clone(),
        }
    }
}

#[async_trait]
impl RenderTool for CoronaImageCmd {
    async fn verify_available(&self) -> Result<()> {
        match self.resolve_executable() {
            Some(_) => Ok(()),
            None => Err(self.unavailable()),
        }
    }

    async fn list_elements(&self, frame: &Frame) -> Result<Vec<Element>> {
        let path = frame.path().to_path_buf();

        let attribute = tokio::task::spawn_blocking(move || {
            elements::read_elements_attribute(&path)
        })
        .await
        .map_err(|e| CxrError::Config {
            message: format!("Header read task failed: {}", e),
        })?
        .map_err(|reason| CxrError::UnsupportedFile {
            path: frame.path().to_path_buf(),
            reason,
        })?;

        Ok(attribute
            .map(|raw| elements::parse_corona_elements(&raw))
            .unwrap_or_default())
    }

    async fn extract(&self, job: &ExtractJob) -> Result<()> {
        let exe = self.resolve_executable().ok_or_else(|| self.unavailable())?;

        let mut command = Command::new(&exe);
        command
            .args(Self::build_args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                self.unavailable()
            } else {
                CxrError::Io(e)
            }
        })?;

        // Drain stderr concurrently so a chatty tool cannot block on a
        // full pipe before exiting.
        let stderr_task = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buffer = String::new();
                pipe.read_to_string(&mut buffer).await.ok();
                buffer
            })
        });

        let cancel = self.cancel.clone();
        let cancelled = async move {
            match cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };

        enum WaitOutcome {
            Exited(std::process::ExitStatus),
            TimedOut,
            Cancelled,
        }

        // The wait future borrows the child, so the kill paths run after
        // the select has settled and released it.
        let waited = tokio::select! {
            outcome = tokio::time::timeout(self.timeout, child.wait()) => match outcome {
                Ok(Ok(status)) => WaitOutcome::Exited(status),
                Ok(Err(e)) => return Err(CxrError::Io(e)),
                Err(_) => WaitOutcome::TimedOut,
            },
            _ = cancelled => WaitOutcome::Cancelled,
        };

        match waited {
            WaitOutcome::Exited(status) if status.success() => Ok(()),
            WaitOutcome::Exited(status) => {
                let detail = match stderr_task {
                    Some(task) => task.await.unwrap_or_default(),
                    None => String::new(),
                };
                let detail = detail.trim();
                Err(CxrError::ExtractionFailed {
                    detail: if detail.is_empty() {
                        format!("tool exited with {}", status)
                    } else {
                        detail.to_string()
                    },
                })
            }
            WaitOutcome::TimedOut => {
                child.kill().await.ok();
                Err(CxrError::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            }
            WaitOutcome::Cancelled => {
                child.kill().await.ok();
                Err(CxrError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::sequence::frame_stem_regex;
    use crate::tool::ElementArg;
    use std::path::Path;

    fn job(element: ElementArg) -> ExtractJob {
        ExtractJob {
            input: PathBuf::from("/renders/shot.0001.cxr"),
            output: PathBuf::from("/renders/shot/shot_BEAUTY.0001.exr"),
            element,
        }
    }

    #[test]
    fn test_build_args_named_element() {
        let args = CoronaImageCmd::build_args(&job(ElementArg::Named("BEAUTY".to_string())));
        assert_eq!(
            args,
            vec![
                OsString::from("--batch"),
                OsString::from("-e"),
                OsString::from("BEAUTY"),
                OsString::from("/renders/shot.0001.cxr"),
                OsString::from("/renders/shot/shot_BEAUTY.0001.exr"),
            ]
        );
    }

    #[test]
    fn test_build_args_wildcard() {
        let args = CoronaImageCmd::build_args(&job(ElementArg::All));
        assert_eq!(args[2], OsString::from("*"));
    }

    #[tokio::test]
    async fn test_verify_available_rejects_missing_executable() {
        let tool = CoronaImageCmd::new("/definitely/not/a/real/CoronaImageCmd");
        assert!(matches!(
            tool.verify_available().await,
            Err(CxrError::ToolUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_extract_without_executable_is_tool_unavailable() {
        let tool = CoronaImageCmd::new("/definitely/not/a/real/CoronaImageCmd");
        let result = tool.extract(&job(ElementArg::All)).await;
        assert!(matches!(result, Err(CxrError::ToolUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_list_elements_on_non_exr_is_unsupported() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("broken.0001.cxr");
        std::fs::write(&path, b"definitely not exr data").unwrap();

        let frame = Frame::parse(&path, &frame_stem_regex()).unwrap();
        let tool = CoronaImageCmd::new("CoronaImageCmd");

        let result = tool.list_elements(&frame).await;
        assert!(matches!(result, Err(CxrError::UnsupportedFile { .. })));
    }

    #[test]
    fn test_resolve_executable_from_path_dir() {
        // A direct path to an existing file resolves to itself.
        let temp = tempfile::TempDir::new().unwrap();
        let exe = temp.path().join("CoronaImageCmd");
        std::fs::write(&exe, b"#!/bin/sh\n").unwrap();

        let tool = CoronaImageCmd::new(&exe);
        assert_eq!(tool.resolve_executable(), Some(exe));
        assert!(Path::new(tool.exe_path()).exists());
    }
}
