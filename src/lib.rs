//! # hilite
//!
//! A grammar-driven tokenizer for presentational syntax highlighting.
//!
//! Text is partitioned into typed, possibly nested tokens by matching an ordered set of
//! declarative regex rules, then rendered to escaped markup with styling classes.
//!
//! ## Testing
//!
//! Helpers for asserting on token streams live in the [testing module](hilite::testing).

pub mod hilite;

pub use hilite::error::HiliteError;
pub use hilite::grammar::{Grammar, GrammarId, Pattern, Rule};
pub use hilite::highlighter::{highlight, Highlighter};
pub use hilite::registry::{GrammarRegistry, InsertTarget};
pub use hilite::render::{encode, stringify, Renderer};
pub use hilite::token::{Content, Node, Token};
pub use hilite::tokenizer::tokenize;
