use crate::config::ImageFormat;
use crate::error::{CxrError, Result};
use crate::scanner::{Frame, Sequence};

/// Frames of a sequence chosen for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameChoice {
    All,
    /// Sorted, de-duplicated frame numbers.
    Numbers(Vec<u32>),
}

/// Elements chosen for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementChoice {
    /// The tool's wildcard; extracts every element in one call per frame.
    All,
    Named(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct SequenceSelection {
    pub sequence: Sequence,
    pub frames: FrameChoice,
    pub elements: ElementChoice,
}

impl SequenceSelection {
    /// Resolve the chosen frames against the sequence, in ascending
    /// frame order.
    pub fn resolved_frames(&self) -> Result<Vec<&Frame>> {
        match &self.frames {
            FrameChoice::All => Ok(self.sequence.frames_sorted().iter().collect()),
            FrameChoice::Numbers(numbers) => numbers
                .iter()
                .map(|n| self.sequence.frame_by_number(*n))
                .collect(),
        }
    }

    fn element_count(&self) -> usize {
        match &self.elements {
            ElementChoice::All => 1,
            ElementChoice::Named(names) => names.len(),
        }
    }
}

/// Filter options used to build a `Selection` from scan results. This is
/// the scripted stand-in for an interactive picker: the orchestrator
/// itself never prompts.
#[derive(Debug, Clone, Default)]
pub struct SelectionOptions {
    pub sequences: Option<Vec<String>>,
    pub frames: Option<Vec<u32>>,
    pub elements: Option<Vec<String>>,
    pub format: ImageFormat,
    pub prefix: Option<String>,
    pub overwrite: bool,
}

/// The resolved set of sequences, frames, elements and output options
/// for one extraction run. Pure data, immutable during the run.
#[derive(Debug, Clone)]
pub struct Selection {
    pub sequences: Vec<SequenceSelection>,
    pub format: ImageFormat,
    pub prefix: Option<String>,
    pub overwrite: bool,
}

impl Selection {
    /// Build a validated selection from scanned sequences and filter
    /// options. Unknown sequence names and frames missing from any
    /// selected sequence are errors, not silent omissions.
    pub fn from_scan(sequences: Vec<Sequence>, options: &SelectionOptions) -> Result<Self> {
        let chosen: Vec<Sequence> = match &options.sequences {
            Some(names) => {
                for name in names {
                    if !sequences.iter().any(|s| s.base_name() == name) {
                        return Err(CxrError::InvalidSelection {
                            message: format!("unknown sequence '{}'", name),
                        });
                    }
                }
                sequences
                    .into_iter()
                    .filter(|s| names.iter().any(|n| n == s.base_name()))
                    .collect()
            }
            None => sequences,
        };

        if chosen.is_empty() {
            return Err(CxrError::InvalidSelection {
                message: "no sequences selected".to_string(),
            });
        }

        let frames = match &options.frames {
            Some(numbers) => {
                let mut numbers = numbers.clone();
                numbers.sort_unstable();
                numbers.dedup();
                FrameChoice::Numbers(numbers)
            }
            None => FrameChoice::All,
        };

        let elements = match &options.elements {
            Some(names) if names.is_empty() => {
                return Err(CxrError::InvalidSelection {
                    message: "element set must not be empty".to_string(),
                });
            }
            Some(names) => {
                let mut unique: Vec<String> = Vec::with_capacity(names.len());
                for name in names {
                    if !unique.contains(name) {
                        unique.push(name.clone());
                    }
                }
                ElementChoice::Named(unique)
            }
            None => ElementChoice::All,
        };

        let selection = Self {
            sequences: chosen
                .into_iter()
                .map(|sequence| SequenceSelection {
                    sequence,
                    frames: frames.clone(),
                    elements: elements.clone(),
                })
                .collect(),
            format: options.format,
            prefix: options.prefix.clone(),
            overwrite: options.overwrite,
        };

        selection.validate()?;
        Ok(selection)
    }

    /// Enforce the selection invariants: at least one sequence, non-empty
    /// element sets, and every chosen frame resolvable in its sequence.
    pub fn validate(&self) -> Result<()> {
        if self.sequences.is_empty() {
            return Err(CxrError::InvalidSelection {
                message: "no sequences selected".to_string(),
            });
        }

        for selected in &self.sequences {
            if let ElementChoice::Named(names) = &selected.elements {
                if names.is_empty() {
                    return Err(CxrError::InvalidSelection {
                        message: format!(
                            "element set for sequence '{}' must not be empty",
                            selected.sequence.base_name()
                        ),
                    });
                }
            }

            if let FrameChoice::Numbers(numbers) = &selected.frames {
                if numbers.is_empty() {
                    return Err(CxrError::InvalidSelection {
                        message: format!(
                            "frame set for sequence '{}' must not be empty",
                            selected.sequence.base_name()
                        ),
                    });
                }
                for number in numbers {
                    selected.sequence.frame_by_number(*number)?;
                }
            }
        }

        Ok(())
    }

    /// Number of (frame × element) items this selection will produce.
    pub fn item_count(&self) -> usize {
        self.sequences
            .iter()
            .map(|s| {
                let frames = match &s.frames {
                    FrameChoice::All => s.sequence.len(),
                    FrameChoice::Numbers(numbers) => numbers.len(),
                };
                frames * s.element_count()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::sequence::frame_stem_regex;
    use std::path::Path;

    fn sequence(base: &str, numbers: &[u32]) -> Sequence {
        let frames = numbers
            .iter()
            .map(|n| {
                Frame::parse(
                    Path::new(&format!("/r/{}.{:04}.cxr", base, n)),
                    &frame_stem_regex(),
                )
                .unwrap()
            })
            .collect();
        Sequence::from_frames(frames).unwrap()
    }

    #[test]
    fn test_default_options_select_everything() {
        let sequences = vec![sequence("a", &[1, 2]), sequence("b", &[1])];
        let selection = Selection::from_scan(sequences, &SelectionOptions::default()).unwrap();

        assert_eq!(selection.sequences.len(), 2);
        assert_eq!(selection.sequences[0].frames, FrameChoice::All);
        assert_eq!(selection.sequences[0].elements, ElementChoice::All);
        assert_eq!(selection.item_count(), 3);
    }

    #[test]
    fn test_sequence_filter() {
        let sequences = vec![sequence("a", &[1]), sequence("b", &[1])];
        let options = SelectionOptions {
            sequences: Some(vec!["b".to_string()]),
            ..Default::default()
        };

        let selection = Selection::from_scan(sequences, &options).unwrap();
        assert_eq!(selection.sequences.len(), 1);
        assert_eq!(selection.sequences[0].sequence.base_name(), "b");
    }

    #[test]
    fn test_unknown_sequence_is_an_error() {
        let sequences = vec![sequence("a", &[1])];
        let options = SelectionOptions {
            sequences: Some(vec!["missing".to_string()]),
            ..Default::default()
        };

        assert!(matches!(
            Selection::from_scan(sequences, &options),
            Err(CxrError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_frames_are_sorted_and_deduplicated() {
        let sequences = vec![sequence("a", &[1, 2, 3])];
        let options = SelectionOptions {
            frames: Some(vec![3, 1, 3]),
            ..Default::default()
        };

        let selection = Selection::from_scan(sequences, &options).unwrap();
        assert_eq!(
            selection.sequences[0].frames,
            FrameChoice::Numbers(vec![1, 3])
        );
        assert_eq!(selection.item_count(), 2);
    }

    #[test]
    fn test_missing_frame_is_an_error() {
        let sequences = vec![sequence("a", &[1, 2])];
        let options = SelectionOptions {
            frames: Some(vec![7]),
            ..Default::default()
        };

        assert!(matches!(
            Selection::from_scan(sequences, &options),
            Err(CxrError::FrameNotFound { number: 7, .. })
        ));
    }

    #[test]
    fn test_empty_element_list_is_an_error() {
        let sequences = vec![sequence("a", &[1])];
        let options = SelectionOptions {
            elements: Some(Vec::new()),
            ..Default::default()
        };

        assert!(matches!(
            Selection::from_scan(sequences, &options),
            Err(CxrError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_elements_are_deduplicated_in_order() {
        let sequences = vec![sequence("a", &[1])];
        let options = SelectionOptions {
            elements: Some(vec![
                "BEAUTY".to_string(),
                "Alpha".to_string(),
                "BEAUTY".to_string(),
            ]),
            ..Default::default()
        };

        let selection = Selection::from_scan(sequences, &options).unwrap();
        assert_eq!(
            selection.sequences[0].elements,
            ElementChoice::Named(vec!["BEAUTY".to_string(), "Alpha".to_string()])
        );
    }

    #[test]
    fn test_resolved_frames_ascending() {
        let selected = SequenceSelection {
            sequence: sequence("a", &[5, 1, 3]),
            frames: FrameChoice::All,
            elements: ElementChoice::All,
        };

        let numbers: Vec<u32> = selected
            .resolved_frames()
            .unwrap()
            .iter()
            .map(|f| f.number())
            .collect();
        assert_eq!(numbers, vec![1, 3, 5]);
    }
}
