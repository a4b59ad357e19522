//! Configuration loading
//!
//! `defaults/hilite.default.toml` is embedded into the crate so the documented defaults
//! and runtime behavior cannot drift apart. Callers layer their own files and single-key
//! overrides on top of it with [`Loader`] before deserializing into [`HiliteConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../../defaults/hilite.default.toml");

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HiliteConfig {
    pub highlight: HighlightSettings,
    pub render: RenderSettings,
    pub output: OutputSettings,
}

/// How a language is chosen for a snippet
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HighlightSettings {
    pub default_language: String,
    pub detect_language: bool,
    pub fallback_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderSettings {
    pub code_block: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputSettings {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Html,
    Json,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            default_language: "javascript".to_string(),
            detect_language: true,
            fallback_language: "plain".to_string(),
        }
    }
}

/// Builds a [`HiliteConfig`] from the embedded defaults, then any files, then key overrides
///
/// Later layers win key by key, so a file only needs the settings it changes.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let defaults = File::from_str(DEFAULT_TOML, FileFormat::Toml);
        Self {
            builder: Config::builder().add_source(defaults),
        }
    }

    /// Layer a TOML file that must exist
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Layer a TOML file, skipped when absent
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        let source = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Set a dotted key such as `highlight.default_language`
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Force the output format by name (`html` or `json`); checked when built
    pub fn output_format(self, format: &str) -> Result<Self, ConfigError> {
        self.set_override("output.format", format)
    }

    /// Wrap highlighted markup in `pre`/`code`
    pub fn code_block(self, enabled: bool) -> Result<Self, ConfigError> {
        self.set_override("render.code_block", enabled)
    }

    /// Language used when none is requested and detection is off
    pub fn default_language(self, language: &str) -> Result<Self, ConfigError> {
        self.set_override("highlight.default_language", language)
    }

    pub fn build(self) -> Result<HiliteConfig, ConfigError> {
        let config: HiliteConfig = self.builder.build()?.try_deserialize()?;
        if config.highlight.fallback_language.is_empty() {
            return Err(ConfigError::Message(
                "highlight.fallback_language must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<HiliteConfig, ConfigError> {
    Loader::new().build()
}
