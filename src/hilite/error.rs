//! Error types for grammar construction and tokenization

use thiserror::Error;

/// Errors produced by the grammar registry and the tokenizer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HiliteError {
    /// No grammar is registered under the requested language id
    #[error("Language '{0}' not found")]
    LanguageNotFound(String),

    /// A rule pattern failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// An insertion target named a rule the grammar does not have
    #[error("Rule '{rule}' not found")]
    RuleNotFound { rule: String },

    /// An insertion target named a rule alternative without a nested grammar
    #[error("Rule '{rule}' alternative {alternative} has no nested grammar")]
    MissingInside { rule: String, alternative: usize },

    /// The segment list outgrew the input; usually a pattern that matches the empty string
    #[error("Tokenization aborted: {segments} segments for {length} bytes of input")]
    SegmentOverflow { segments: usize, length: usize },
}
