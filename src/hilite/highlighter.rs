//! Highlighting entry points
//!
//!     highlight   tokenize, encode and stringify with one grammar
//!     Highlighter owns a registry and a renderer and picks the language per snippet
//!
//! A tokenize failure (the segment overflow guard) never reaches markup callers: the
//! snippet is returned escaped and unhighlighted instead.

use super::config::{HiliteConfig, HighlightSettings};
use super::detect::detect_language;
use super::error::HiliteError;
use super::grammar::GrammarId;
use super::registry::{GrammarRegistry, PLAIN_LANGUAGES};
use super::render::{encode, escape_text, Renderer};
use super::token::Node;
use super::tokenizer::tokenize;
use tracing::{debug, warn};

/// Highlight `text` with `grammar`, producing markup.
///
/// `language` is passed to the renderer for the element classes of wrap hooks.
pub fn highlight(text: &str, registry: &GrammarRegistry, grammar: GrammarId, language: &str) -> String {
    highlight_with(&Renderer::new(), text, registry, grammar, language)
}

fn highlight_with(
    renderer: &Renderer,
    text: &str,
    registry: &GrammarRegistry,
    grammar: GrammarId,
    language: &str,
) -> String {
    match tokenize(text, registry, grammar) {
        Ok(nodes) => renderer.stringify(&encode(&nodes), language),
        Err(err) => {
            warn!(language, error = %err, "tokenize failed, emitting plain text");
            escape_text(text)
        }
    }
}

/// Registry, renderer and language selection in one place
#[derive(Debug)]
pub struct Highlighter {
    registry: GrammarRegistry,
    renderer: Renderer,
    settings: HighlightSettings,
}

impl Highlighter {
    pub fn new(registry: GrammarRegistry, settings: HighlightSettings) -> Self {
        Self {
            registry,
            renderer: Renderer::new(),
            settings,
        }
    }

    /// Built-in languages and default settings
    pub fn with_defaults() -> Result<Self, HiliteError> {
        Ok(Self::new(
            GrammarRegistry::with_defaults()?,
            HighlightSettings::default(),
        ))
    }

    /// Built-in languages with the highlight settings of a loaded configuration
    pub fn from_config(config: &HiliteConfig) -> Result<Self, HiliteError> {
        Ok(Self::new(
            GrammarRegistry::with_defaults()?,
            config.highlight.clone(),
        ))
    }

    pub fn registry(&self) -> &GrammarRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut GrammarRegistry {
        &mut self.registry
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn settings(&self) -> &HighlightSettings {
        &self.settings
    }

    /// Choose the language id for a snippet.
    ///
    /// An explicitly requested language wins if it is registered. Otherwise the snippet is
    /// detected (when enabled) or the default language is used. If the chosen id is not
    /// registered either, the fallback language is used, and `plain` when the fallback
    /// is not registered.
    pub fn resolve_language(&self, text: &str, requested: Option<&str>) -> String {
        let chosen = match requested {
            Some(language) => language.to_string(),
            None if self.settings.detect_language => detect_language(text).to_string(),
            None => self.settings.default_language.clone(),
        };
        if self.registry.has(&chosen) {
            return chosen;
        }
        let fallback = if self.registry.has(&self.settings.fallback_language) {
            self.settings.fallback_language.as_str()
        } else {
            warn!(
                fallback = %self.settings.fallback_language,
                "fallback language not registered"
            );
            PLAIN_LANGUAGES[0]
        };
        debug!(language = %chosen, fallback, "language not registered, using fallback");
        fallback.to_string()
    }

    /// Token stream for `text` in a registered language
    pub fn tokenize(&self, text: &str, language: &str) -> Result<Vec<Node>, HiliteError> {
        let grammar = self.registry.resolve(language)?;
        tokenize(text, &self.registry, grammar)
    }

    /// Markup for `text` in a registered language
    pub fn highlight(&self, text: &str, language: &str) -> Result<String, HiliteError> {
        let grammar = self.registry.resolve(language)?;
        debug!(language, length = text.len(), "highlight");
        Ok(highlight_with(&self.renderer, text, &self.registry, grammar, language))
    }

    /// Markup wrapped in a `pre`/`code` block carrying the `language-x` class
    pub fn highlight_block(&self, text: &str, language: &str) -> Result<String, HiliteError> {
        let body = self.highlight(text, language)?;
        Ok(format!(
            "<pre class=\"language-{language}\"><code class=\"language-{language}\">{body}</code></pre>"
        ))
    }
}
