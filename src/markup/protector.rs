/*!
 * Placeholder protection for non-translatable markup.
 *
 * Scripts, code, media, form controls and similar subtrees are lifted out of
 * the document before it is sent for translation and replaced by short
 * `{XXXXXXXX}` tokens. After translation the tokens are swapped back for the
 * original markup.
 */

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, warn};
use once_cell::sync::Lazy;
use rand::Rng;
use rand::distr::Alphanumeric;
use regex::Regex;

use crate::errors::{INTEGRITY_SAMPLE_LIMIT, IntegrityWarning, PipelineError};

use super::{MarkupTree, Node};

/// Number of random characters inside a placeholder
pub const PLACEHOLDER_LEN: usize = 8;

/// Anything shaped like a placeholder token
pub static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[A-Za-z0-9]{8}\}").expect("Invalid placeholder regex"));

/// Tags whose whole subtree is never sent for translation
pub const DEFAULT_IGNORE_TAGS: &[&str] = &[
    // Scripts and styles
    "script", "style",
    // Code
    "code", "pre", "kbd", "var", "samp",
    // Embedded and interactive content
    "img", "audio", "video", "track", "source", "svg", "math", "canvas", "iframe", "embed",
    "object", "param", "applet",
    // Forms
    "input", "button", "select", "option", "textarea", "form",
    // Metadata
    "meta", "link", "time", "data", "meter", "progress", "address",
    // XML and EPUB annotations
    "xml", "xmlns", "epub:switch", "epub:case", "epub:default", "annotation", "note",
];

/// Case-insensitive set of ignored tag names, shared between protector instances
#[derive(Debug, Clone)]
pub struct IgnoreTags {
    tags: Arc<HashSet<String>>,
}

impl IgnoreTags {
    /// The built-in ignore set plus `extra` tag names.
    ///
    /// Fails with `InvalidConfiguration` when a name is empty or contains
    /// whitespace or markup delimiters.
    pub fn with_extra<I, S>(extra: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: HashSet<String> = DEFAULT_IGNORE_TAGS.iter().map(|t| t.to_string()).collect();

        for tag in extra {
            let tag = tag.as_ref();
            validate_tag_name(tag)?;
            tags.insert(tag.to_ascii_lowercase());
        }

        Ok(Self { tags: Arc::new(tags) })
    }

    /// Whether an element with this name is protected
    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains(&name.to_ascii_lowercase())
    }

    /// Number of tag names in the set
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Default for IgnoreTags {
    fn default() -> Self {
        Self {
            tags: Arc::new(DEFAULT_IGNORE_TAGS.iter().map(|t| t.to_string()).collect()),
        }
    }
}

/// Check a configured tag name for obvious mistakes
pub fn validate_tag_name(tag: &str) -> Result<(), PipelineError> {
    if tag.is_empty() {
        return Err(PipelineError::InvalidConfiguration(
            "ignore tag names must not be empty".to_string(),
        ));
    }
    if tag
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '/'))
    {
        return Err(PipelineError::InvalidConfiguration(format!(
            "invalid ignore tag name: {:?}",
            tag
        )));
    }
    Ok(())
}

/// Token → original markup, owned by one protection pass
#[derive(Debug, Default)]
pub struct PlaceholderMap {
    entries: HashMap<String, String>,
    generated: HashSet<String>,
}

impl PlaceholderMap {
    /// Store `original` under a fresh token and return the token
    pub fn insert(&mut self, original: String) -> String {
        let mut rng = rand::rng();
        loop {
            let candidate: String = (&mut rng)
                .sample_iter(Alphanumeric)
                .take(PLACEHOLDER_LEN)
                .map(char::from)
                .collect();

            if self.generated.insert(candidate.clone()) {
                let token = format!("{{{}}}", candidate);
                self.entries.insert(token.clone(), original);
                return token;
            }
        }
    }

    /// Original markup stored under `token`
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    /// Number of stored placeholders
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been protected yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(token, original)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Outcome of a restore pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// Markup with every known placeholder replaced
    pub markup: String,
    /// Placeholder-shaped strings that matched nothing, in order of appearance
    pub leftover_tokens: Vec<String>,
    /// Stored placeholders that never appeared in the input
    pub missing_tokens: Vec<String>,
}

impl RestoreReport {
    /// Whether every placeholder came back intact
    pub fn is_clean(&self) -> bool {
        self.leftover_tokens.is_empty() && self.missing_tokens.is_empty()
    }

    /// Warning describing the damage, if any
    pub fn warning(&self) -> Option<IntegrityWarning> {
        if self.is_clean() {
            return None;
        }
        Some(IntegrityWarning {
            leftover_count: self.leftover_tokens.len(),
            sample: self
                .leftover_tokens
                .iter()
                .take(INTEGRITY_SAMPLE_LIMIT)
                .cloned()
                .collect(),
            missing_count: self.missing_tokens.len(),
        })
    }
}

/// Replaces ignored subtrees with placeholders and restores them later.
///
/// One instance covers one document: the placeholder map produced by
/// `protect` is what `restore` uses.
#[derive(Debug, Default)]
pub struct Protector {
    ignore_tags: IgnoreTags,
    placeholders: PlaceholderMap,
}

impl Protector {
    /// Create a protector using the given ignore set
    pub fn new(ignore_tags: IgnoreTags) -> Self {
        Self {
            ignore_tags,
            placeholders: PlaceholderMap::default(),
        }
    }

    /// Placeholders produced so far
    pub fn placeholders(&self) -> &PlaceholderMap {
        &self.placeholders
    }

    /// Parse `markup` and replace every ignored subtree with a placeholder
    pub fn protect(&mut self, markup: &str) -> Result<String, PipelineError> {
        let mut tree = MarkupTree::parse(markup)?;
        let before = self.placeholders.len();
        self.protect_nodes(&mut tree.nodes);

        debug!(
            "Protected {} subtree(s) in {} bytes of markup",
            self.placeholders.len() - before,
            markup.len()
        );
        Ok(tree.to_markup())
    }

    fn protect_nodes(&mut self, nodes: &mut [Node]) {
        for node in nodes.iter_mut() {
            let original = match node {
                Node::Element(element) if self.ignore_tags.contains(&element.name) => {
                    Some(element.to_markup())
                }
                Node::Element(element) => {
                    self.protect_nodes(&mut element.children);
                    None
                }
                Node::Text(_) | Node::Other(_) => None,
            };

            if let Some(original) = original {
                *node = Node::Text(self.placeholders.insert(original));
            }
        }
    }

    /// Put the original markup back in place of every known placeholder.
    ///
    /// Never fails: unknown placeholder-shaped strings stay in the text and
    /// are listed in the report, as are placeholders that disappeared.
    pub fn restore(&self, markup: &str) -> RestoreReport {
        let mut leftover_tokens = Vec::new();
        let mut seen = HashSet::new();

        let restored = PLACEHOLDER_REGEX.replace_all(markup, |caps: &regex::Captures<'_>| {
            let token = &caps[0];
            match self.placeholders.get(token) {
                Some(original) => {
                    seen.insert(token.to_string());
                    original.to_string()
                }
                None => {
                    leftover_tokens.push(token.to_string());
                    token.to_string()
                }
            }
        });

        let mut missing_tokens: Vec<String> = self
            .placeholders
            .iter()
            .map(|(token, _)| token)
            .filter(|token| !seen.contains(*token))
            .map(str::to_string)
            .collect();
        missing_tokens.sort();

        let report = RestoreReport {
            markup: restored.into_owned(),
            leftover_tokens,
            missing_tokens,
        };

        if let Some(warning) = report.warning() {
            warn!("Placeholder restoration incomplete: {}", warning);
        }
        report
    }
}
