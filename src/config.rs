use crate::error::{CxrError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub scan: ScanConfig,
    pub tool: ToolConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Render-container extension, without the leading dot.
    pub extension: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolConfig {
    /// Path to the CoronaImageCmd executable.
    pub path: PathBuf,
    /// Maximum concurrent tool invocations; 0 means one per CPU core.
    pub jobs: usize,
    /// Per-invocation timeout in seconds.
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub format: ImageFormat,
    /// Output folder name; defaults to each sequence's base name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    pub overwrite: bool,
}

/// Output image format accepted by the external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Exr,
    Jpg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Exr => "exr",
            ImageFormat::Jpg => "jpg",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl Default for ImageFormat {
    fn default() -> Self {
        ImageFormat::Exr
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: "cxr".to_string(),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            path: default_tool_path(),
            jobs: 0, // One worker per CPU core
            timeout: 600,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::Exr,
            prefix: None,
            overwrite: false,
        }
    }
}

/// The Corona installer's default location on Windows; elsewhere the
/// executable is resolved through PATH.
fn default_tool_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(
            r"C:\Program Files\Chaos\Corona\Corona Renderer for 3ds Max\Image Editor\CoronaImageCmd.exe",
        )
    } else {
        PathBuf::from("CoronaImageCmd")
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(CxrError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CxrError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| CxrError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["cxr-extract.toml", ".cxr-extract.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref extension) = cli_args.extension {
            self.scan.extension = extension.trim_start_matches('.').to_lowercase();
        }

        if let Some(ref tool_path) = cli_args.tool_path {
            self.tool.path = tool_path.clone();
        }

        if let Some(jobs) = cli_args.jobs {
            self.tool.jobs = jobs;
        }

        if let Some(timeout) = cli_args.timeout {
            self.tool.timeout = timeout;
        }

        if let Some(format) = cli_args.format {
            self.output.format = format;
        }

        if let Some(ref prefix) = cli_args.prefix {
            self.output.prefix = Some(prefix.clone());
        }

        if cli_args.overwrite {
            self.output.overwrite = true;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| CxrError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| CxrError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan.extension.is_empty() {
            return Err(CxrError::Config {
                message: "Container extension must not be empty".to_string(),
            });
        }

        if self.scan.extension.contains('.') {
            return Err(CxrError::Config {
                message: "Container extension must be given without a dot".to_string(),
            });
        }

        if self.tool.path.as_os_str().is_empty() {
            return Err(CxrError::Config {
                message: "Tool path must not be empty".to_string(),
            });
        }

        if self.tool.timeout == 0 {
            return Err(CxrError::Config {
                message: "Tool timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Effective worker count for extraction.
    pub fn effective_jobs(&self) -> usize {
        if self.tool.jobs == 0 {
            num_cpus::get()
        } else {
            self.tool.jobs
        }
    }

    pub fn tool_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.tool.timeout)
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub extension: Option<String>,
    pub tool_path: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub timeout: Option<u64>,
    pub format: Option<ImageFormat>,
    pub prefix: Option<String>,
    pub overwrite: bool,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension;
        self
    }

    pub fn with_tool_path(mut self, tool_path: Option<PathBuf>) -> Self {
        self.tool_path = tool_path;
        self
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<u64>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_format(mut self, format: Option<ImageFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan.extension, "cxr");
        assert_eq!(config.output.format, ImageFormat::Exr);
        assert!(!config.output.overwrite);
        assert_eq!(config.tool.timeout, 600);
        assert!(config.effective_jobs() >= 1);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.scan.extension = String::new();
        assert!(config.validate().is_err());

        config.scan.extension = ".cxr".to_string();
        assert!(config.validate().is_err());

        config.scan.extension = "cxr".to_string();
        config.tool.timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let config = Config::default();
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.scan.extension, loaded_config.scan.extension);
        assert_eq!(config.tool.timeout, loaded_config.tool.timeout);
        assert_eq!(config.output.format, loaded_config.output.format);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_extension(Some(".CXR".to_string()))
            .with_jobs(Some(2))
            .with_format(Some(ImageFormat::Jpg))
            .with_prefix(Some("elements".to_string()))
            .with_overwrite(true);

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.scan.extension, "cxr");
        assert_eq!(config.tool.jobs, 2);
        assert_eq!(config.effective_jobs(), 2);
        assert_eq!(config.output.format, ImageFormat::Jpg);
        assert_eq!(config.output.prefix.as_deref(), Some("elements"));
        assert!(config.output.overwrite);
    }

    #[test]
    fn test_sample_config_generation() {
        let sample = Config::create_sample_config();
        assert!(!sample.is_empty());
        assert!(sample.contains("[scan]"));
        assert!(sample.contains("[tool]"));
        assert!(sample.contains("[output]"));
    }

    #[test]
    fn test_image_format_extension() {
        assert_eq!(ImageFormat::Exr.extension(), "exr");
        assert_eq!(ImageFormat::Jpg.extension(), "jpg");
        assert_eq!(ImageFormat::Jpg.to_string(), "jpg");
    }
}
