/*!
 * # chunkwise - structure-preserving translation of long markup documents
 *
 * A Rust library and CLI that translates HTML/XHTML documents through a
 * size-limited LLM translation API without losing their tag structure.
 *
 * ## Features
 *
 * - Protect scripts, code, media, form controls and metadata behind opaque
 *   `{XXXXXXXX}` placeholders so the translator never sees them
 * - Split protected markup into token-bounded chunks cut on closing tags
 * - Translate chunks serially through a rate limiter with retry and backoff
 * - Reassemble and restore byte-for-byte, reporting damaged placeholders
 * - Resume interrupted runs from a per-document checkpoint file
 * - Providers: Mistral, OpenAI, DeepSeek, Kimi (chat completions) and Anthropic
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `markup`: permissive markup tree and the placeholder protector
 * - `translation`: chunking, reassembly, rate limiting and orchestration:
 *   - `translation::splitter`: token-bounded splitting
 *   - `translation::reassembler`: chunk reassembly
 *   - `translation::coordinator`: per-document pipeline
 * - `checkpoint`: resumable-run state
 * - `providers`: chat-completion API clients
 * - `app_config`: configuration management
 * - `app_controller`: directory-level runs with progress reporting
 * - `file_utils`: file system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![cfg_attr(test, allow(non_snake_case))]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod checkpoint;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod markup;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use checkpoint::CheckpointStore;
pub use errors::{AppError, IntegrityWarning, PipelineError, ProviderError, StorageError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use markup::{IgnoreTags, MarkupTree, Protector, RestoreReport};
pub use translation::{Chunk, Coordinator, Reassembler, Splitter, TranslationService, Translator};
