//! Main module for hilite library functionality
//!
//! Data flows through the modules in one direction:
//!
//!     registry (grammars by language id) -> tokenizer -> token tree -> render -> markup
//!
//! The registry is only consulted to obtain or derive grammars before tokenization
//! begins. Token trees are created fresh per call and own no external resources.

pub mod config;
pub mod detect;
pub mod error;
pub mod grammar;
pub mod highlighter;
pub mod languages;
pub mod registry;
pub mod render;
pub mod testing;
pub mod token;
pub mod tokenizer;
