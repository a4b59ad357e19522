//! Grammar definitions
//!
//!     A grammar is an ordered mapping from rule name to a rule. A rule is an ordered list of
//!     alternative patterns. Order is priority: rules declared earlier, and earlier alternatives
//!     within a rule, win at a given scan position.
//!
//!     Grammars live in a [GrammarRegistry](super::registry::GrammarRegistry) arena and refer
//!     to each other (nested `inside` grammars, `rest` merges) by [GrammarId]. Identity of a
//!     grammar is its id, so shared and cyclic references are plain copies of an id.
//!
//! Example
//!
//!     number:  /\d+/
//!     string:  { pattern: /"[^"]*"/, greedy, inside: { escape: /\\./ } }
//!
//!     becomes
//!
//!     Grammar::new()
//!         .rule("number", Pattern::new(r"\d+")?)
//!         .rule("string", Pattern::new(r#""[^"]*""#)?.greedy().inside(escapes))

use super::error::HiliteError;
use indexmap::IndexMap;
use regex::Regex;

/// Identity of a grammar inside a registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GrammarId(pub(crate) usize);

impl GrammarId {
    /// Position of the grammar in its registry arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single rule alternative: a regex plus matching metadata
#[derive(Debug, Clone)]
pub struct Pattern {
    pub(crate) regex: Regex,
    pub(crate) inside: Option<GrammarId>,
    pub(crate) lookbehind: bool,
    pub(crate) greedy: bool,
    pub(crate) alias: Vec<String>,
}

impl Pattern {
    /// Compile a pattern from regex source
    pub fn new(source: &str) -> Result<Self, HiliteError> {
        let regex = Regex::new(source).map_err(|e| HiliteError::InvalidPattern {
            pattern: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_regex(regex))
    }

    /// Wrap an already compiled regex
    pub fn from_regex(regex: Regex) -> Self {
        Self {
            regex,
            inside: None,
            lookbehind: false,
            greedy: false,
            alias: Vec::new(),
        }
    }

    /// Allow the match to span several segments, re-anchoring the scan
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    /// Treat the first capture group as leading context, not token content
    pub fn lookbehind(mut self) -> Self {
        self.lookbehind = true;
        self
    }

    /// Tokenize the matched text again with a nested grammar
    pub fn inside(mut self, grammar: GrammarId) -> Self {
        self.inside = Some(grammar);
        self
    }

    /// Add one style alias
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    /// Add several style aliases
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alias.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn inside_grammar(&self) -> Option<GrammarId> {
        self.inside
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    pub fn has_lookbehind(&self) -> bool {
        self.lookbehind
    }

    pub fn alias_list(&self) -> &[String] {
        &self.alias
    }
}

/// Ordered alternatives for one token type
///
/// A rule without alternatives is the "absent" rule: it is kept in the grammar (and keeps
/// its position) but the tokenizer skips it.
#[derive(Debug, Clone, Default)]
pub struct Rule {
    pub(crate) patterns: Vec<Pattern>,
}

impl Rule {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    /// The absent rule
    pub fn none() -> Self {
        Self::default()
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl From<Pattern> for Rule {
    fn from(pattern: Pattern) -> Self {
        Self {
            patterns: vec![pattern],
        }
    }
}

impl From<Vec<Pattern>> for Rule {
    fn from(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }
}

/// Ordered rule set for one language
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    pub(crate) rules: IndexMap<String, Rule>,
    pub(crate) rest: Option<GrammarId>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [Grammar::set]
    pub fn rule(mut self, name: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.set(name, rule);
        self
    }

    /// Builder form of [Grammar::set_rest]
    pub fn with_rest(mut self, rest: GrammarId) -> Self {
        self.rest = Some(rest);
        self
    }

    /// Add or replace a rule.
    ///
    /// Replacing keeps the rule's original priority slot; new names go last.
    pub fn set(&mut self, name: impl Into<String>, rule: impl Into<Rule>) {
        self.rules.insert(name.into(), rule.into());
    }

    /// Rules of another grammar to merge into this one before first use
    pub fn set_rest(&mut self, rest: Option<GrammarId>) {
        self.rest = rest;
    }

    /// Remove a rule, keeping the relative order of the others
    pub fn remove(&mut self, name: &str) -> Option<Rule> {
        self.rules.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn rest(&self) -> Option<GrammarId> {
        self.rest
    }

    /// Rules in priority order
    pub fn rules(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Rule names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn patterns_mut(&mut self) -> impl Iterator<Item = &mut Pattern> {
        self.rules
            .values_mut()
            .flat_map(|rule| rule.patterns.iter_mut())
    }
}
