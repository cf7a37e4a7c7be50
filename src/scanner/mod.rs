pub mod sequence;
pub mod sequence_scanner;

pub use sequence::{DuplicateFrame, Frame, Sequence};
pub use sequence_scanner::{ScanOutcome, ScanStatistics, SequenceScanner, SkippedFile};
