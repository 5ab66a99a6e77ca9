/*!
 * Token counting used to size chunks.
 */

use std::fmt::Debug;

/// Counts how many model tokens a piece of text costs.
///
/// Implementations must be deterministic and should be non-decreasing as
/// the text grows; the splitter's search relies on it.
pub trait TokenCounter: Send + Sync + Debug {
    /// Token count of `text`
    fn count(&self, text: &str) -> usize;
}

/// Estimates tokens from the number of characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRatioCounter {
    chars_per_token: usize,
}

impl CharRatioCounter {
    /// Roughly four characters per token for English prose
    pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

    /// Create an estimator; a ratio of zero is treated as one
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    /// Characters per token used by this estimator
    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }
}

impl Default for CharRatioCounter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHARS_PER_TOKEN)
    }
}

impl TokenCounter for CharRatioCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }
}
