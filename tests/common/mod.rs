/*!
 * Common test utilities for the chunkwise test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use chunkwise::app_config::Config;

// Re-export the mock providers module
pub mod mock_providers;

/// First chapter of the sample book
pub const CHAPTER_ONE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Chapter One</title><style>p { margin: 0 }</style></head>
<body>
  <h1>Hello</h1>
  <p>Hello world, said the <em>robot</em>.</p>
  <pre><code>fn main() {}</code></pre>
  <img src="../images/cover.png" alt="cover"/>
</body>
</html>
"#;

/// Second chapter of the sample book
pub const CHAPTER_TWO: &str = r#"<html><body>
<p>Goodbye</p>
<script>var greeting = "Hello";</script>
</body></html>
"#;

/// Route `log` output through the test harness; safe to call repeatedly
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a small book directory: two chapters, a stylesheet and an image
pub fn create_test_book(dir: &Path) -> Result<PathBuf> {
    let book = dir.join("book");
    create_test_file(&book, "text/ch1.xhtml", CHAPTER_ONE)?;
    create_test_file(&book, "text/ch2.xhtml", CHAPTER_TWO)?;
    create_test_file(&book, "styles/book.css", "p { text-indent: 1em; }")?;
    fs::create_dir_all(book.join("images"))?;
    fs::write(book.join("images/cover.png"), [0x89, b'P', b'N', b'G'])?;
    Ok(book)
}

/// Configuration with a dummy key, no cooldown and instant retries
pub fn test_config(state_file: &Path) -> Config {
    let mut config = Config::default();
    config.translation.active_provider_config_mut().api_key = "test-key".to_string();
    config.translation.common.cooldown_ms = 0;
    config.translation.common.retry_count = 2;
    config.translation.common.retry_backoff_ms = 0;
    config.translation.common.retry_backoff_max_ms = 0;
    config.checkpoint.state_file = state_file.to_path_buf();
    config
}
