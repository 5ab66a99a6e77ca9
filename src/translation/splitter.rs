/*!
 * Token-bounded splitting of protected markup.
 *
 * Chunks are cut greedily: each one takes the longest prefix that fits the
 * token budget, then backs off to the end of the last closing tag inside that
 * prefix so chunks start and end on whole elements whenever possible.
 * Placeholder tokens are never cut in half.
 */

use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::PipelineError;
use crate::markup::protector::PLACEHOLDER_REGEX;

use super::chunk::Chunk;
use super::tokens::{CharRatioCounter, TokenCounter};

/// Closing tags such as `</p>` or `</div >`
static CLOSING_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</[^>]+>").expect("Invalid closing tag regex"));

/// Splits markup into chunks that fit a token budget
#[derive(Debug, Clone)]
pub struct Splitter {
    token_budget: usize,
    counter: Arc<dyn TokenCounter>,
}

impl Splitter {
    /// Create a splitter; a zero budget is rejected
    pub fn new(token_budget: usize, counter: Arc<dyn TokenCounter>) -> Result<Self, PipelineError> {
        if token_budget == 0 {
            return Err(PipelineError::InvalidConfiguration(
                "token budget must be a positive number of tokens".to_string(),
            ));
        }
        Ok(Self {
            token_budget,
            counter,
        })
    }

    /// Create a splitter using the character-ratio estimator
    pub fn with_default_counter(token_budget: usize) -> Result<Self, PipelineError> {
        Self::new(token_budget, Arc::new(CharRatioCounter::default()))
    }

    /// Maximum tokens per chunk
    pub fn token_budget(&self) -> usize {
        self.token_budget
    }

    /// Token counter used for sizing
    pub fn counter(&self) -> &Arc<dyn TokenCounter> {
        &self.counter
    }

    /// Split `markup` into ordered chunks tagged with `file_id`.
    ///
    /// Chunk contents are trimmed; the trimmed whitespace is kept on the
    /// chunks so that reassembling untranslated chunks gives back `markup`
    /// exactly, provided `markup` is not blank. Blank markup yields no
    /// chunks at all, and callers keep such input as it is. A chunk may
    /// exceed the budget only when it is a single character or a single
    /// placeholder token.
    pub fn split(&self, markup: &str, file_id: &str) -> Vec<Chunk> {
        let boundaries: Vec<usize> = markup
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(markup.len()))
            .collect();
        let scalar_count = boundaries.len() - 1;
        let exclusions: Vec<(usize, usize)> = PLACEHOLDER_REGEX
            .find_iter(markup)
            .map(|m| (m.start(), m.end()))
            .collect();

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut pending_leading = String::new();
        let mut pos_idx = 0;

        while pos_idx < scalar_count {
            let pos = boundaries[pos_idx];
            let limit = boundaries[self.budget_limit(markup, &boundaries, pos_idx)];

            let tag_aligned = CLOSING_TAG_REGEX
                .find_iter(&markup[pos..limit])
                .last()
                .map(|m| pos + m.end())
                .filter(|&end| end > pos);
            let split_at = avoid_exclusions(tag_aligned.unwrap_or(limit), pos, &exclusions);

            let segment = &markup[pos..split_at];
            let content = segment.trim();

            if content.is_empty() {
                match chunks.last_mut() {
                    Some(previous) => previous.trailing_whitespace.push_str(segment),
                    None => pending_leading.push_str(segment),
                }
            } else {
                let leading = &segment[..segment.len() - segment.trim_start().len()];
                let trailing = &segment[segment.trim_end().len()..];

                let mut chunk = Chunk::new((chunks.len() + 1).to_string(), file_id, content);
                chunk.tokens = Some(self.counter.count(content));
                chunk.leading_whitespace = std::mem::take(&mut pending_leading) + leading;
                chunk.trailing_whitespace = trailing.to_string();
                chunks.push(chunk);
            }

            pos_idx = boundaries
                .binary_search(&split_at)
                .unwrap_or_else(|insert_at| insert_at);
        }

        debug!(
            "Split {} characters of '{}' into {} chunk(s) (budget {} tokens)",
            scalar_count,
            file_id,
            chunks.len(),
            self.token_budget
        );
        chunks
    }

    /// Index of the furthest boundary whose prefix from `pos_idx` fits the budget.
    ///
    /// Gallops outward then bisects, so each chunk costs a logarithmic number
    /// of counter calls. Always advances by at least one character.
    fn budget_limit(&self, markup: &str, boundaries: &[usize], pos_idx: usize) -> usize {
        let last = boundaries.len() - 1;
        let pos = boundaries[pos_idx];
        let fits = |idx: usize| self.counter.count(&markup[pos..boundaries[idx]]) <= self.token_budget;

        let mut good = pos_idx;
        let mut step = 1;
        let mut bad = None;

        loop {
            let probe = (pos_idx + step).min(last);
            if !fits(probe) {
                bad = Some(probe);
                break;
            }
            good = probe;
            if probe == last {
                break;
            }
            step *= 2;
        }

        if let Some(mut hi) = bad {
            let mut lo = good + 1;
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                if fits(mid) {
                    good = mid;
                    lo = mid + 1;
                } else {
                    hi = mid;
                }
            }
        }

        if good == pos_idx { pos_idx + 1 } else { good }
    }
}

/// Move a cut point out of any placeholder span it would split
fn avoid_exclusions(split_at: usize, pos: usize, exclusions: &[(usize, usize)]) -> usize {
    let containing = exclusions
        .iter()
        .find(|(start, end)| *start < split_at && split_at < *end);

    match containing {
        Some((start, _)) if *start > pos => *start,
        Some((_, end)) => *end,
        None => split_at,
    }
}
