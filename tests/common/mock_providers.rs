/*!
 * Mock translator implementations for testing
 *
 * These stand in for the provider-backed translation service so that tests
 * never make external API calls. Every mock records the text it was asked
 * to translate.
 */

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chunkwise::errors::ProviderError;
use chunkwise::markup::protector::PLACEHOLDER_REGEX;
use chunkwise::translation::Translator;

/// How a mock translator behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Replace a few English words with Chinese
    Working,
    /// Return the input unchanged
    Echo,
    /// Fail every call
    Failing,
    /// Fail the first `n` calls, then behave like `Working`
    Intermittent(usize),
    /// Translate, but strip the braces off every placeholder token
    ManglePlaceholders,
}

/// Translator double with call recording
#[derive(Debug)]
pub struct MockTranslator {
    behavior: MockBehavior,
    calls: AtomicUsize,
    requests: Mutex<Vec<String>>,
}

impl MockTranslator {
    /// Create a mock with the given behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of translate calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every text passed to translate, in call order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn dictionary(text: &str) -> String {
        text.replace("Hello", "你好")
            .replace("Goodbye", "再见")
            .replace("world", "世界")
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(text.to_string());

        match self.behavior {
            MockBehavior::Working => Ok(Self::dictionary(text)),
            MockBehavior::Echo => Ok(text.to_string()),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 503,
                message: "service unavailable".to_string(),
            }),
            MockBehavior::Intermittent(failures) if call < failures => {
                Err(ProviderError::RateLimitExceeded("slow down".to_string()))
            }
            MockBehavior::Intermittent(_) => Ok(Self::dictionary(text)),
            MockBehavior::ManglePlaceholders => {
                let translated = Self::dictionary(text);
                Ok(PLACEHOLDER_REGEX
                    .replace_all(&translated, |caps: &regex::Captures<'_>| {
                        caps[0].trim_matches(|c| c == '{' || c == '}').to_string()
                    })
                    .into_owned())
            }
        }
    }
}
