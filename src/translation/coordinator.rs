/*!
 * Per-document orchestration of the translation pipeline.
 *
 * For every sub-file of a document the coordinator:
 * - skips it when the checkpoint says it is done
 * - protects non-translatable markup behind placeholders
 * - splits the protected markup into token-bounded chunks
 * - translates the chunks one at a time through the shared rate limiter,
 *   retrying failures with exponential backoff
 * - reassembles the chunks and restores the placeholders
 * - hands the result to the caller's sink, then checkpoints the sub-file
 *
 * A sub-file with chunks that never translated is still handed to the sink
 * (those chunks keep their source text) but is not checkpointed, so the next
 * run translates it again.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::checkpoint::CheckpointStore;
use crate::errors::{IntegrityWarning, TranslationError};
use crate::markup::{IgnoreTags, Protector};

use super::chunk::Chunk;
use super::core::Translator;
use super::rate_limit::RateLimiter;
use super::reassembler::Reassembler;
use super::splitter::Splitter;

/// One markup file inside a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubFile {
    /// Stable identifier, used as the checkpoint key
    pub id: String,
    /// Source markup
    pub markup: String,
}

impl SubFile {
    /// Create a sub-file
    pub fn new(id: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            markup: markup.into(),
        }
    }
}

/// A unit of resumable work: an ordered list of sub-files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Stable identifier, used as the checkpoint key
    pub id: String,
    /// Sub-files in processing order
    pub subfiles: Vec<SubFile>,
}

/// Retry schedule for a single chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait after the first failure
    pub backoff_base: Duration,
    /// Longest wait between attempts
    pub backoff_max: Duration,
}

impl RetryPolicy {
    /// Wait after failed attempt number `attempt` (1-based): `base * 2^(attempt-1)`, capped
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_base: Duration::from_secs(10),
            backoff_max: Duration::from_secs(30),
        }
    }
}

/// Result of translating one sub-file
#[derive(Debug, Clone)]
pub struct SubFileOutcome {
    /// Sub-file identifier
    pub subfile_id: String,
    /// Reassembled and restored markup
    pub markup: String,
    /// Number of chunks the sub-file was split into
    pub chunk_count: usize,
    /// Chunks left untranslated after all attempts
    pub failed_chunks: usize,
    /// Placeholder problems found while restoring
    pub integrity: Option<IntegrityWarning>,
}

impl SubFileOutcome {
    /// Whether every chunk was translated
    pub fn is_complete(&self) -> bool {
        self.failed_chunks == 0
    }
}

/// Summary of one document run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentReport {
    /// Document identifier
    pub document_id: String,
    /// Sub-files fully translated and checkpointed in this run
    pub translated: Vec<String>,
    /// Sub-files skipped because the checkpoint had them
    pub skipped: Vec<String>,
    /// Sub-files written with some chunks left in the source language
    pub incomplete: Vec<String>,
    /// Sub-files that could not be processed at all, with the reason
    pub failed: Vec<(String, String)>,
    /// Sub-files whose placeholders did not all come back
    pub integrity_warnings: usize,
}

impl DocumentReport {
    /// Whether nothing was left for a rerun
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty() && self.failed.is_empty()
    }
}

/// Drives sub-files through protect, split, translate, build and restore
pub struct Coordinator {
    translator: Arc<dyn Translator>,
    limiter: Arc<RateLimiter>,
    splitter: Splitter,
    ignore_tags: IgnoreTags,
    retry: RetryPolicy,
}

impl Coordinator {
    /// Create a coordinator; `limiter` should be the one process-wide instance
    pub fn new(
        translator: Arc<dyn Translator>,
        limiter: Arc<RateLimiter>,
        splitter: Splitter,
        ignore_tags: IgnoreTags,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            translator,
            limiter,
            splitter,
            ignore_tags,
            retry,
        }
    }

    /// Translate every pending sub-file of `document`.
    ///
    /// `sink` receives each translated sub-file before it is checkpointed; a
    /// sink error stops the run with `TranslationError::Output` and leaves
    /// that sub-file unrecorded. Sub-files whose markup cannot be parsed are
    /// reported in `DocumentReport::failed` and never reach the sink.
    pub async fn translate_document<F>(
        &self,
        document: &Document,
        mut checkpoint: Option<&mut CheckpointStore>,
        mut sink: F,
    ) -> Result<DocumentReport, TranslationError>
    where
        F: FnMut(&SubFileOutcome) -> std::io::Result<()>,
    {
        let mut report = DocumentReport {
            document_id: document.id.clone(),
            ..Default::default()
        };

        for subfile in &document.subfiles {
            let done = checkpoint
                .as_deref()
                .is_some_and(|store| store.is_processed(&document.id, &subfile.id));
            if done {
                debug!("Skipping {} (already translated)", subfile.id);
                report.skipped.push(subfile.id.clone());
                continue;
            }

            let outcome = match self.translate_subfile(&subfile.id, &subfile.markup).await {
                Ok(outcome) => outcome,
                Err(TranslationError::Pipeline(e)) => {
                    error!("Cannot process {}: {}", subfile.id, e);
                    report.failed.push((subfile.id.clone(), e.to_string()));
                    continue;
                }
                Err(e) => return Err(e),
            };

            sink(&outcome).map_err(|e| {
                TranslationError::Output(format!("failed to write {}: {}", outcome.subfile_id, e))
            })?;

            if outcome.integrity.is_some() {
                report.integrity_warnings += 1;
            }

            if outcome.is_complete() {
                if let Some(store) = checkpoint.as_deref_mut() {
                    store.mark_processed(&document.id, &subfile.id)?;
                }
                report.translated.push(subfile.id.clone());
            } else {
                warn!(
                    "{} has {} untranslated chunk(s); it will be retried on the next run",
                    subfile.id, outcome.failed_chunks
                );
                report.incomplete.push(subfile.id.clone());
            }
        }

        info!(
            "Document {}: {} translated, {} skipped, {} incomplete, {} failed",
            report.document_id,
            report.translated.len(),
            report.skipped.len(),
            report.incomplete.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Run one sub-file through the full pipeline
    pub async fn translate_subfile(&self, subfile_id: &str, markup: &str) -> Result<SubFileOutcome, TranslationError> {
        let mut protector = Protector::new(self.ignore_tags.clone());
        let protected = protector.protect(markup)?;
        let mut chunks = self.splitter.split(&protected, subfile_id);

        if chunks.is_empty() {
            // Blank sub-file; nothing to translate
            return Ok(SubFileOutcome {
                subfile_id: subfile_id.to_string(),
                markup: markup.to_string(),
                chunk_count: 0,
                failed_chunks: 0,
                integrity: None,
            });
        }

        debug!(
            "{}: {} placeholder(s), {} chunk(s)",
            subfile_id,
            protector.placeholders().len(),
            chunks.len()
        );

        let total = chunks.len();
        let mut failed_chunks = 0;
        for (index, chunk) in chunks.iter_mut().enumerate() {
            debug!("{}: translating chunk {}/{}", subfile_id, index + 1, total);
            if !self.translate_chunk(chunk).await {
                failed_chunks += 1;
            }
        }

        let built = Reassembler::build(&chunks)?;
        let restored = protector.restore(&built);
        let integrity = restored.warning();

        Ok(SubFileOutcome {
            subfile_id: subfile_id.to_string(),
            markup: restored.markup,
            chunk_count: total,
            failed_chunks,
            integrity,
        })
    }

    /// Translate one chunk in place; `false` when every attempt failed
    async fn translate_chunk(&self, chunk: &mut Chunk) -> bool {
        for attempt in 1..=self.retry.max_attempts {
            let result = {
                let _permit = self.limiter.acquire().await;
                self.translator.translate(&chunk.content).await
            };

            match result {
                Ok(translated) => {
                    chunk.translated = Some(translated);
                    return true;
                }
                Err(e) => {
                    chunk.retry_count += 1;
                    warn!(
                        "Chunk {} of {} failed (attempt {}/{}): {}",
                        chunk.id, chunk.file_id, attempt, self.retry.max_attempts, e
                    );
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.backoff(attempt)).await;
                    }
                }
            }
        }

        warn!(
            "Giving up on chunk {} of {}; keeping source text",
            chunk.id, chunk.file_id
        );
        false
    }
}
