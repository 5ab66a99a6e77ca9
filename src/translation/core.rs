/*!
 * Core translation service implementation.
 *
 * This module contains the `Translator` capability used by the coordinator
 * and `TranslationService`, its implementation on top of the configured
 * chat-completion provider.
 */

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use std::time::Instant;

use crate::app_config::Config;
use crate::errors::ProviderError;
use crate::language_utils::get_language_name;
use crate::providers::Provider;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::openai::{OpenAI, OpenAIRequest};

/// Upper bound on generated tokens per Anthropic request
const ANTHROPIC_MAX_TOKENS: u32 = 8192;

/// Translates one chunk of markup.
///
/// Calls may fail transiently; retrying is the caller's concern.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text`, returning the translated markup
    async fn translate(&self, text: &str) -> Result<String, ProviderError>;
}

/// Translation provider implementation variants
#[derive(Debug)]
enum TranslationProviderImpl {
    /// Any OpenAI-compatible chat completions service
    OpenAI {
        /// Client instance
        client: OpenAI,
    },

    /// Anthropic API service
    Anthropic {
        /// Client instance
        client: Anthropic,
    },
}

/// Sends markup chunks to the configured provider
#[derive(Debug)]
pub struct TranslationService {
    provider: TranslationProviderImpl,
    model: String,
    system_prompt: String,
    source_language: String,
    target_language: String,
    temperature: f32,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: &Config) -> Result<Self> {
        let translation = &config.translation;
        let model = translation.get_model();
        let api_key = translation.get_api_key();
        let endpoint = translation.get_endpoint();
        let timeout = translation.get_timeout();

        let provider = if translation.provider.is_openai_compatible() {
            TranslationProviderImpl::OpenAI {
                client: OpenAI::new(api_key, endpoint, model.clone(), timeout),
            }
        } else {
            TranslationProviderImpl::Anthropic {
                client: Anthropic::new(api_key, endpoint, model.clone(), timeout),
            }
        };

        let source_language = get_language_name(&config.source_language)?;
        let target_language = get_language_name(&config.target_language)?;
        let system_prompt = translation
            .common
            .system_prompt
            .replace("{source_language}", &source_language)
            .replace("{target_language}", &target_language);

        Ok(Self {
            provider,
            model,
            system_prompt,
            source_language,
            target_language,
            temperature: translation.common.temperature,
        })
    }

    /// Model requests are sent to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check credentials and reachability of the provider
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        match &self.provider {
            TranslationProviderImpl::OpenAI { client } => client.test_connection().await,
            TranslationProviderImpl::Anthropic { client } => client.test_connection().await,
        }
    }

    fn user_prompt(&self, text: &str) -> String {
        format!(
            "Translate the following HTML from {} to {}:\n\n```html\n{}\n```",
            self.source_language, self.target_language, text
        )
    }
}

#[async_trait]
impl Translator for TranslationService {
    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let start_time = Instant::now();
        let prompt = self.user_prompt(text);

        let raw = match &self.provider {
            TranslationProviderImpl::OpenAI { client } => {
                let request = OpenAIRequest::new(self.model.clone())
                    .add_message("system", &self.system_prompt)
                    .add_message("user", prompt)
                    .temperature(self.temperature);
                let response = client.complete(request).await?;
                OpenAI::extract_text(&response)
            }
            TranslationProviderImpl::Anthropic { client } => {
                let request = AnthropicRequest::new(self.model.clone(), ANTHROPIC_MAX_TOKENS)
                    .system(&self.system_prompt)
                    .add_message("user", prompt)
                    .temperature(self.temperature);
                let response = client.complete(request).await?;
                Anthropic::extract_text(&response)
            }
        };

        debug!(
            "Translated {} chars with {} in {:?}",
            text.chars().count(),
            self.model,
            start_time.elapsed()
        );

        let cleaned = clean_response(&raw);
        if cleaned.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(cleaned)
    }
}

/// Strip code fences the model wrapped around its answer.
///
/// Removes a leading fence line (```` ```html ````, ```` ```xml ```` or a
/// bare ```` ``` ````) and a trailing ```` ``` ````, then trims.
pub fn clean_response(text: &str) -> String {
    let mut text = text.trim();

    if text.starts_with("```") {
        text = match text.find('\n') {
            Some(newline) => &text[newline + 1..],
            None => &text[3..],
        };
    }

    let trimmed_end = text.trim_end();
    if let Some(stripped) = trimmed_end.strip_suffix("```") {
        text = stripped;
    }

    text.trim().to_string()
}
