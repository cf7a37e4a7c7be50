use crate::config::ScanConfig;
use crate::error::{CxrError, Result};
use crate::scanner::sequence::{frame_stem_regex, Frame, Sequence};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A candidate file that carried the container extension but could not be
/// parsed into a frame. Surfaced as a warning, never a scan failure.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of one scan: sequences sorted by base name, plus the files that
/// were passed over.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub sequences: Vec<Sequence>,
    pub skipped: Vec<SkippedFile>,
}

impl ScanOutcome {
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn statistics(&self) -> ScanStatistics {
        let total_frames = self.sequences.iter().map(Sequence::len).sum();
        let duplicate_frames = self
            .sequences
            .iter()
            .map(|s| s.duplicates().len())
            .sum();

        ScanStatistics {
            total_sequences: self.sequences.len(),
            total_frames,
            duplicate_frames,
            skipped_files: self.skipped.len(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanStatistics {
    pub total_sequences: usize,
    pub total_frames: usize,
    pub duplicate_frames: usize,
    pub skipped_files: usize,
}

impl ScanStatistics {
    pub fn display_summary(&self) -> String {
        let mut summary = format!(
            "Scan results:\n  Sequences: {}\n  Frames: {}\n",
            self.total_sequences, self.total_frames
        );

        if self.duplicate_frames > 0 {
            summary.push_str(&format!(
                "  Duplicate frame numbers: {}\n",
                self.duplicate_frames
            ));
        }

        if self.skipped_files > 0 {
            summary.push_str(&format!("  Skipped files: {}\n", self.skipped_files));
        }

        summary
    }
}

/// Locates render-container files and groups them into sequences.
///
/// The scan is non-recursive: only direct children of the root directory
/// are considered, matching typical render-output layouts.
pub struct SequenceScanner {
    extension: String,
    pattern: Regex,
}

impl SequenceScanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            extension: config.extension.to_lowercase(),
            pattern: frame_stem_regex(),
        }
    }

    /// Scan a file or directory for sequences. A single-file input scans
    /// its containing directory but keeps only frames sharing the file's
    /// base name.
    pub fn scan<P: AsRef<Path>>(&self, input: P) -> Result<ScanOutcome> {
        let input = input.as_ref();

        if !input.exists() {
            return Err(CxrError::InvalidInput {
                path: input.to_path_buf(),
            });
        }

        if input.is_file() {
            self.scan_single_file(input)
        } else {
            self.scan_directory(input, None)
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    fn scan_single_file(&self, file: &Path) -> Result<ScanOutcome> {
        if !self.has_container_extension(file) {
            return Err(CxrError::InvalidInput {
                path: file.to_path_buf(),
            });
        }

        let root = file.parent().unwrap_or_else(|| Path::new("."));

        // Siblings sharing the file's base name belong to the same
        // sequence; everything else in the directory is ignored.
        match Frame::parse(file, &self.pattern) {
            Ok(frame) => self.scan_directory(root, Some(frame.base_name().to_string())),
            Err(reason) => Ok(ScanOutcome {
                sequences: Vec::new(),
                skipped: vec![SkippedFile {
                    path: file.to_path_buf(),
                    reason,
                }],
            }),
        }
    }

    fn scan_directory(&self, root: &Path, base_filter: Option<String>) -> Result<ScanOutcome> {
        let mut groups: BTreeMap<String, Vec<Frame>> = BTreeMap::new();
        let mut skipped = Vec::new();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    skipped.push(SkippedFile {
                        path: err.path().map(Path::to_path_buf).unwrap_or_default(),
                        reason: format!("scan error: {}", err),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.has_container_extension(entry.path()) {
                continue;
            }

            match Frame::parse(entry.path(), &self.pattern) {
                Ok(frame) => {
                    if base_filter
                        .as_deref()
                        .is_some_and(|base| base != frame.base_name())
                    {
                        continue;
                    }
                    groups.entry(frame.base_name().to_string()).or_default().push(frame);
                }
                Err(reason) => {
                    skipped.push(SkippedFile {
                        path: entry.path().to_path_buf(),
                        reason,
                    });
                }
            }
        }

        // BTreeMap iteration keeps sequences sorted by base name, so
        // repeated scans of the same directory state are deterministic.
        let sequences = groups
            .into_values()
            .filter_map(Sequence::from_frames)
            .collect();

        Ok(ScanOutcome { sequences, skipped })
    }

    fn has_container_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}
