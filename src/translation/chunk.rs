/*!
 * Chunk of protected markup sent to the translator as one request.
 */

use serde::{Deserialize, Serialize};

/// A token-bounded slice of one sub-file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk within its split, starting at "1"
    pub id: String,

    /// Sub-file the chunk belongs to
    pub file_id: String,

    /// Trimmed markup to translate
    pub content: String,

    /// Translator output, set once the chunk has been translated
    #[serde(default)]
    pub translated: Option<String>,

    /// Token count of `content` as measured by the splitter
    #[serde(default)]
    pub tokens: Option<usize>,

    /// Failed translation attempts so far
    #[serde(default)]
    pub retry_count: u32,

    /// Whitespace trimmed off the front of `content`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub leading_whitespace: String,

    /// Whitespace trimmed off the back of `content`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trailing_whitespace: String,
}

impl Chunk {
    /// Create an untranslated chunk with no surrounding whitespace
    pub fn new(id: impl Into<String>, file_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file_id: file_id.into(),
            content: content.into(),
            translated: None,
            tokens: None,
            retry_count: 0,
            leading_whitespace: String::new(),
            trailing_whitespace: String::new(),
        }
    }

    /// Whether a non-empty translation is present
    pub fn is_translated(&self) -> bool {
        self.translated.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// The text the reassembler will emit for this chunk body
    pub fn body(&self) -> &str {
        match self.translated.as_deref() {
            Some(translated) if !translated.is_empty() => translated,
            _ => &self.content,
        }
    }
}
