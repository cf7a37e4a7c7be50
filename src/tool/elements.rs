use crate::scanner::{Frame, Sequence};
use serde::Serialize;
use std::path::Path;

/// EXR header attribute carrying Corona's element manifest.
const CORONA_ELEMENTS_ATTRIBUTE: &str = "corona.elements";

/// Element types that are never offered for extraction.
const EXCLUDED_ELEMENT_TYPES: &[&str] = &[
    "SamplingFocus",
    "VisibleDiffuse",
    "VisibleNormals",
    "Hybrid",
];

/// A named render pass extractable from a frame. The index is the tool's
/// channel identifier and is opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub name: String,
    pub index: Option<String>,
}

impl Element {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }
}

/// The element capabilities of a sequence, introspected from its first
/// frame. Elements are assumed identical across all frames of a
/// sequence; that homogeneity is an unchecked assumption of the render
/// pipeline, not something this type verifies.
#[derive(Debug, Clone)]
pub struct ElementSet {
    representative: Frame,
    elements: Vec<Element>,
}

impl ElementSet {
    pub fn new(sequence: &Sequence, elements: Vec<Element>) -> Self {
        Self {
            representative: sequence.first_frame().clone(),
            elements,
        }
    }

    /// The frame the listing was read from.
    pub fn representative(&self) -> &Frame {
        &self.representative
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.elements.iter().map(|e| e.name.as_str()).collect()
    }
}

/// Read the raw `corona.elements` attribute from an EXR container
/// header. Only metadata is touched, never pixel data. `Ok(None)` means
/// the file is readable but carries no manifest.
pub fn read_elements_attribute(path: &Path) -> std::result::Result<Option<String>, String> {
    let meta = exr::meta::MetaData::read_from_file(path, false).map_err(|e| e.to_string())?;

    let header = meta
        .headers
        .first()
        .ok_or_else(|| "no image headers".to_string())?;

    let attribute = header
        .shared_attributes
        .other
        .iter()
        .chain(header.own_attributes.other.iter())
        .find(|(name, _)| name.to_string() == CORONA_ELEMENTS_ATTRIBUTE)
        .map(|(_, value)| value);

    match attribute {
        Some(exr::meta::attribute::AttributeValue::Text(text)) => Ok(Some(text.to_string())),
        Some(_) => Err(format!(
            "attribute '{}' has an unexpected type",
            CORONA_ELEMENTS_ATTRIBUTE
        )),
        None => Ok(None),
    }
}

/// Parse a `corona.elements` manifest into the offered element list.
///
/// The manifest is a sequence of quoted `name|index|type` records.
/// Excluded types are filtered out; BEAUTY and Alpha are always offered
/// first and never duplicated.
pub fn parse_corona_elements(raw: &str) -> Vec<Element> {
    let mut elements = vec![Element::named("BEAUTY"), Element::named("Alpha")];

    for part in raw.split("\", \"") {
        let part = part.trim_matches('"').trim();
        if part.is_empty() {
            continue;
        }

        let components: Vec<&str> = part.split('|').collect();
        if components.len() < 3 {
            continue;
        }

        let name = components[0].trim();
        let index = components[1].trim();
        let element_type = components[2].trim();

        if EXCLUDED_ELEMENT_TYPES.contains(&element_type) {
            continue;
        }

        if elements.iter().any(|e| e.name == name) {
            continue;
        }

        elements.push(Element {
            name: name.to_string(),
            index: Some(index.to_string()),
        });
    }

    elements
}
