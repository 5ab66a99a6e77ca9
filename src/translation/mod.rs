/*!
 * Chunked translation of protected markup.
 *
 * This module turns protected markup into translated markup. It is split
 * into several submodules:
 *
 * - `chunk`: the unit of work sent to the translator
 * - `tokens`: token counting used to size chunks
 * - `splitter`: token-bounded, tag-aligned splitting
 * - `reassembler`: joining translated chunks back together
 * - `rate_limit`: the admission gate shared by all provider calls
 * - `core`: the `Translator` capability and the provider-backed service
 * - `coordinator`: per-document orchestration with retries and checkpoints
 */

// Re-export main types for easier usage
pub use self::chunk::Chunk;
pub use self::coordinator::{Coordinator, Document, DocumentReport, RetryPolicy, SubFile, SubFileOutcome};
pub use self::core::{TranslationService, Translator};
pub use self::rate_limit::RateLimiter;
pub use self::reassembler::Reassembler;
pub use self::splitter::Splitter;
pub use self::tokens::{CharRatioCounter, TokenCounter};

// Submodules
pub mod chunk;
pub mod coordinator;
pub mod core;
pub mod rate_limit;
pub mod reassembler;
pub mod splitter;
pub mod tokens;
