use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Class assigned to the whole-text record used when a reply cannot be parsed.
pub const FALLBACK_CLASS: &str = "text";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub extraction_class: String,
    pub extraction_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
}

impl Extraction {
    pub fn new(class: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            extraction_class: class.into(),
            extraction_text: text.into(),
            attributes: None,
        }
    }

    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Pseudo-entity covering the whole source text
    pub fn fallback(source_text: &str) -> Self {
        Self::new(FALLBACK_CLASS, source_text.trim())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub extractions: Vec<Extraction>,
}

/// Source text together with the records extracted from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    pub document_id: String,
    pub text: String,
    pub extractions: Vec<Extraction>,
}

impl AnnotatedDocument {
    pub fn new(text: impl Into<String>, extractions: Vec<Extraction>) -> Self {
        Self {
            document_id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            extractions,
        }
    }
}
