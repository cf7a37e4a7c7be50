use crate::error::{CxrError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Filename pattern for sequence frames: `<baseName>.<digits>` applied to
/// the file stem, where `<digits>` is the rightmost run of digits before
/// the extension. Earlier numeric groups stay part of the base name.
const FRAME_STEM_PATTERN: &str = r"^(?P<base>.+)\.(?P<number>\d+)$";

pub fn frame_stem_regex() -> Regex {
    Regex::new(FRAME_STEM_PATTERN).expect("static frame pattern compiles")
}

/// One numbered file within a render sequence.
///
/// Immutable once parsed; the zero-padding width of the frame token is
/// preserved so output names can mirror the source naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    base_name: String,
    number: u32,
    width: usize,
    path: PathBuf,
    extension: String,
}

impl Frame {
    /// Parse a frame from a candidate path, using a pre-compiled stem
    /// pattern. Returns the reason the name was rejected otherwise.
    pub fn parse(path: &Path, pattern: &Regex) -> std::result::Result<Self, String> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| "missing file extension".to_string())?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| "unreadable file name".to_string())?;

        let captures = pattern
            .captures(stem)
            .ok_or_else(|| "no frame number before the extension (expected <name>.<digits>.<ext>)".to_string())?;

        let digits = &captures["number"];
        let number: u32 = digits
            .parse()
            .map_err(|_| format!("frame token '{}' exceeds the supported range", digits))?;

        Ok(Self {
            base_name: captures["base"].to_string(),
            number,
            width: digits.len(),
            path: path.to_path_buf(),
            extension,
        })
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn directory(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Frame number zero-padded to its original width.
    pub fn padded_number(&self) -> String {
        format!("{:0width$}", self.number, width = self.width)
    }

    /// Reconstruct the source file name; the round trip of `parse`.
    pub fn file_name(&self) -> String {
        format!(
            "{}.{}.{}",
            self.base_name,
            self.padded_number(),
            self.extension
        )
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.base_name, self.padded_number())
    }
}

/// A second file resolving to an already-claimed frame number. Kept as a
/// condition on the sequence instead of failing the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateFrame {
    pub number: u32,
    pub kept: PathBuf,
    pub discarded: PathBuf,
}

/// An ordered set of frames sharing a base name inside one directory.
///
/// Always non-empty; frame numbers are unique within `frames` and any
/// collisions are recorded in `duplicates`. Identity is
/// `(directory, base_name)`.
#[derive(Debug, Clone)]
pub struct Sequence {
    base_name: String,
    directory: PathBuf,
    frames: Vec<Frame>,
    duplicates: Vec<DuplicateFrame>,
}

impl Sequence {
    /// Build a sequence from parsed frames of one base name. Frames are
    /// sorted by number; on a collision the first file in (number, path)
    /// order is kept and the loser recorded. Returns `None` for an empty
    /// input.
    pub fn from_frames(mut frames: Vec<Frame>) -> Option<Self> {
        frames.sort_by(|a, b| {
            a.number
                .cmp(&b.number)
                .then_with(|| a.path.cmp(&b.path))
        });

        let first = frames.first()?;
        let base_name = first.base_name.clone();
        let directory = first.directory();

        let mut unique: Vec<Frame> = Vec::with_capacity(frames.len());
        let mut duplicates = Vec::new();

        for frame in frames {
            if let Some(kept) = unique.last() {
                if kept.number == frame.number {
                    duplicates.push(DuplicateFrame {
                        number: frame.number,
                        kept: kept.path.clone(),
                        discarded: frame.path,
                    });
                    continue;
                }
            }
            unique.push(frame);
        }

        Some(Self {
            base_name,
            directory,
            frames: unique,
            duplicates,
        })
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Frames ordered by frame number ascending.
    pub fn frames_sorted(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The representative frame used for element introspection.
    pub fn first_frame(&self) -> &Frame {
        &self.frames[0]
    }

    pub fn frame_range(&self) -> (u32, u32) {
        (
            self.frames[0].number,
            self.frames[self.frames.len() - 1].number,
        )
    }

    pub fn duplicates(&self) -> &[DuplicateFrame] {
        &self.duplicates
    }

    /// Look up a frame by number. An ambiguous number (one with a
    /// recorded collision) is an error rather than a guess.
    pub fn frame_by_number(&self, number: u32) -> Result<&Frame> {
        if self.duplicates.iter().any(|d| d.number == number) {
            return Err(CxrError::DuplicateFrame {
                base_name: self.base_name.clone(),
                number,
            });
        }

        self.frames
            .binary_search_by_key(&number, |f| f.number)
            .map(|idx| &self.frames[idx])
            .map_err(|_| CxrError::FrameNotFound {
                base_name: self.base_name.clone(),
                number,
            })
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.directory == other.directory && self.base_name == other.base_name
    }
}

impl Eq for Sequence {}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> std::result::Result<Frame, String> {
        Frame::parse(Path::new(name), &frame_stem_regex())
    }

    #[test]
    fn test_parse_round_trip() {
        let names = [
            "shot.0001.cxr",
            "interior_night.0250.cxr",
            "a.b.c.0099.cxr",
            "take2.007.cxr",
        ];

        for name in names {
            let frame = parse(name).unwrap();
            assert_eq!(frame.file_name(), *name, "round trip for {}", name);
        }
    }

    #[test]
    fn test_parse_fields() {
        let frame = parse("/renders/shot.0042.CXR").unwrap();
        assert_eq!(frame.base_name(), "shot");
        assert_eq!(frame.number(), 42);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.extension(), "cxr");
        assert_eq!(frame.padded_number(), "0042");
        assert_eq!(frame.directory(), PathBuf::from("/renders"));
    }

    #[test]
    fn test_rightmost_numeric_group_wins() {
        let frame = parse("shot_v002.take3.0010.cxr").unwrap();
        assert_eq!(frame.base_name(), "shot_v002.take3");
        assert_eq!(frame.number(), 10);
        assert_eq!(frame.width(), 4);
    }

    #[test]
    fn test_no_numeric_group_is_rejected() {
        let reason = parse("notes.cxr").unwrap_err();
        assert!(reason.contains("no frame number"));

        // Digits not dot-delimited stay part of the stem.
        assert!(parse("shot0001.cxr").is_err());
        assert!(parse("0001.cxr").is_err());
    }

    #[test]
    fn test_oversized_frame_token_is_rejected() {
        let reason = parse("shot.99999999999999.cxr").unwrap_err();
        assert!(reason.contains("exceeds"));
    }

    #[test]
    fn test_sequence_ordering_and_lookup() {
        let frames: Vec<Frame> = [3u32, 1, 2]
            .iter()
            .map(|n| parse(&format!("/r/shot.{:04}.cxr", n)).unwrap())
            .collect();

        let sequence = Sequence::from_frames(frames).unwrap();
        assert_eq!(sequence.base_name(), "shot");
        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence.frame_range(), (1, 3));

        let numbers: Vec<u32> = sequence.frames_sorted().iter().map(Frame::number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        assert_eq!(sequence.frame_by_number(2).unwrap().number(), 2);
        assert!(matches!(
            sequence.frame_by_number(9),
            Err(CxrError::FrameNotFound { number: 9, .. })
        ));
    }

    #[test]
    fn test_duplicate_numbers_become_conditions() {
        // Same frame number with different padding widths collides.
        let frames = vec![
            parse("/r/shot.0001.cxr").unwrap(),
            parse("/r/shot.001.cxr").unwrap(),
            parse("/r/shot.0002.cxr").unwrap(),
        ];

        let sequence = Sequence::from_frames(frames).unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.duplicates().len(), 1);
        assert_eq!(sequence.duplicates()[0].number, 1);

        // The ambiguous number errors; unambiguous lookups still work.
        assert!(matches!(
            sequence.frame_by_number(1),
            Err(CxrError::DuplicateFrame { number: 1, .. })
        ));
        assert_eq!(sequence.frame_by_number(2).unwrap().number(), 2);
    }

    #[test]
    fn test_empty_input_has_no_sequence() {
        assert!(Sequence::from_frames(Vec::new()).is_none());
    }

    #[test]
    fn test_sequence_identity() {
        let a = Sequence::from_frames(vec![parse("/r/shot.0001.cxr").unwrap()]).unwrap();
        let b = Sequence::from_frames(vec![parse("/r/shot.0002.cxr").unwrap()]).unwrap();
        let c = Sequence::from_frames(vec![parse("/other/shot.0001.cxr").unwrap()]).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
