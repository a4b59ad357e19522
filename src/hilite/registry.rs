//! Grammar registry
//!
//! This module provides the process-wide table of grammars. Grammars are stored in an arena
//! and addressed by [GrammarId]; language ids map onto arena slots, and several ids may alias
//! the same grammar (`plain`, `plaintext`, `text` and `txt` all point at the empty grammar).
//!
//! Grammars are built once, then changed only through:
//!
//!     - derive:        deep-clone a registered grammar and override some of its rules
//!     - insert_before: rebuild a grammar with new rules ahead of an existing one, then
//!                      repoint every reference to the old grammar at the new one
//!     - merge_rest:    the one-time merge of a grammar's `rest` rules into its own
//!
//! The tokenizer only ever reads the registry, so a built registry can be shared across
//! threads.

use super::error::HiliteError;
use super::grammar::{Grammar, GrammarId, Rule};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Language ids for the empty grammar, always registered
pub const PLAIN_LANGUAGES: &[&str] = &["plain", "plaintext", "text", "txt"];

/// Where [GrammarRegistry::insert_before] finds the grammar to rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertTarget<'a> {
    /// The grammar registered under a language id
    Language(&'a str),
    /// The nested grammar of one alternative of a rule
    Inside {
        grammar: GrammarId,
        rule: &'a str,
        alternative: usize,
    },
}

/// Registry of grammars by language id
///
/// # Examples
///
/// ```ignore
/// let mut registry = GrammarRegistry::new();
/// registry.register("numbers", Grammar::new().rule("number", Pattern::new(r"\d+")?));
///
/// let grammar = registry.resolve("numbers")?;
/// let tokens = tokenize("a12b", &registry, grammar)?;
/// ```
#[derive(Debug, Clone)]
pub struct GrammarRegistry {
    grammars: Vec<Grammar>,
    languages: IndexMap<String, GrammarId>,
}

impl GrammarRegistry {
    /// Create a registry holding only the empty grammar
    pub fn new() -> Self {
        let mut registry = Self {
            grammars: Vec::new(),
            languages: IndexMap::new(),
        };
        let plain = registry.add(Grammar::new());
        for name in PLAIN_LANGUAGES {
            registry.set_language(*name, plain);
        }
        registry
    }

    /// Create a registry with the built-in languages
    pub fn with_defaults() -> Result<Self, HiliteError> {
        let mut registry = Self::new();
        super::languages::register_builtins(&mut registry)?;
        Ok(registry)
    }

    /// Store a grammar in the arena without naming it
    pub fn add(&mut self, grammar: Grammar) -> GrammarId {
        let id = GrammarId(self.grammars.len());
        self.grammars.push(grammar);
        id
    }

    /// Allocate an empty slot, to be filled by [GrammarRegistry::define].
    ///
    /// This is how a grammar refers to itself: reserve the id, build patterns that nest it,
    /// then define it.
    pub fn reserve(&mut self) -> GrammarId {
        self.add(Grammar::new())
    }

    /// Fill (or overwrite) the slot of an id obtained from this registry
    pub fn define(&mut self, id: GrammarId, grammar: Grammar) {
        self.grammars[id.0] = grammar;
    }

    /// Store a grammar and register it under a language id
    pub fn register(&mut self, name: &str, grammar: Grammar) -> GrammarId {
        let id = self.add(grammar);
        self.set_language(name, id);
        id
    }

    /// Point a language id at a grammar, replacing any previous binding
    pub fn set_language(&mut self, name: &str, id: GrammarId) {
        trace!(language = name, grammar = id.0, "registering language");
        self.languages.insert(name.to_string(), id);
    }

    /// Make `alias` resolve to the grammar currently registered as `target`
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<GrammarId, HiliteError> {
        let id = self.resolve(target)?;
        self.set_language(alias, id);
        Ok(id)
    }

    pub fn language(&self, name: &str) -> Option<GrammarId> {
        self.languages.get(name).copied()
    }

    /// Look up a language id
    pub fn resolve(&self, name: &str) -> Result<GrammarId, HiliteError> {
        self.language(name)
            .ok_or_else(|| HiliteError::LanguageNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.languages.contains_key(name)
    }

    /// List all registered language ids (sorted)
    pub fn list_languages(&self) -> Vec<String> {
        let mut names: Vec<_> = self.languages.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get a grammar by id
    pub fn get(&self, id: GrammarId) -> Option<&Grammar> {
        self.grammars.get(id.0)
    }

    /// Get a grammar by id for in-place edits
    pub fn get_mut(&mut self, id: GrammarId) -> Option<&mut Grammar> {
        self.grammars.get_mut(id.0)
    }

    /// Deep-clone the grammar registered as `base` and apply `overrides` to the copy.
    ///
    /// The clone follows nested and rest grammars. Grammars reached more than once (shared
    /// or cyclic references) are cloned once and the copy is reused, so the clone has the
    /// same sharing shape as the original. The base grammar is left untouched, and the copy
    /// is not registered under any language id.
    pub fn derive(&mut self, base: &str, overrides: Grammar) -> Result<GrammarId, HiliteError> {
        let base_id = self.resolve(base)?;
        Ok(self.derive_from(base_id, overrides))
    }

    /// [GrammarRegistry::derive] starting from an id rather than a language id
    pub fn derive_from(&mut self, base: GrammarId, overrides: Grammar) -> GrammarId {
        let mut visited = HashMap::new();
        let copy = self.clone_grammar(base, &mut visited);
        debug!(
            base = base.0,
            copy = copy.0,
            cloned = visited.len(),
            "derived grammar"
        );

        let grammar = &mut self.grammars[copy.0];
        for (name, rule) in overrides.rules {
            grammar.rules.insert(name, rule);
        }
        if overrides.rest.is_some() {
            grammar.rest = overrides.rest;
        }
        copy
    }

    fn clone_grammar(
        &mut self,
        id: GrammarId,
        visited: &mut HashMap<GrammarId, GrammarId>,
    ) -> GrammarId {
        if let Some(&copy) = visited.get(&id) {
            return copy;
        }
        let copy = self.reserve();
        visited.insert(id, copy);

        let mut grammar = self.grammars[id.0].clone();
        for pattern in grammar.patterns_mut() {
            if let Some(inside) = pattern.inside {
                pattern.inside = Some(self.clone_grammar(inside, visited));
            }
        }
        if let Some(rest) = grammar.rest {
            grammar.rest = Some(self.clone_grammar(rest, visited));
        }
        self.grammars[copy.0] = grammar;
        copy
    }

    /// Rebuild a grammar with `rules` placed immediately before the rule named `before`.
    ///
    /// Existing rules keep their relative order. An existing rule whose name also appears in
    /// `rules` is dropped in favor of the new one. When `before` is not present the new
    /// rules are appended at the end.
    ///
    /// The rebuilt grammar is a new arena entry. The target is pointed at it, and every
    /// language id and every nested or rest reference reachable from the language table
    /// that pointed at the old grammar is repointed as well, so aliases keep working.
    pub fn insert_before(
        &mut self,
        target: InsertTarget<'_>,
        before: &str,
        rules: Grammar,
    ) -> Result<GrammarId, HiliteError> {
        let old = self.target_grammar(target)?;
        let current = &self.grammars[old.0];

        let mut ordered: IndexMap<String, Rule> = IndexMap::new();
        let mut inserted = false;
        for (name, rule) in &current.rules {
            if name == before {
                ordered.extend(rules.rules.iter().map(|(n, r)| (n.clone(), r.clone())));
                inserted = true;
            }
            if !rules.rules.contains_key(name) {
                ordered.insert(name.clone(), rule.clone());
            }
        }
        if !inserted {
            ordered.extend(rules.rules.into_iter());
        }

        let rebuilt = Grammar {
            rules: ordered,
            rest: current.rest,
        };
        let new = self.add(rebuilt);

        match target {
            InsertTarget::Language(name) => self.set_language(name, new),
            InsertTarget::Inside {
                grammar,
                rule,
                alternative,
            } => {
                if let Some(pattern) = self.grammars[grammar.0]
                    .rules
                    .get_mut(rule)
                    .and_then(|r| r.patterns.get_mut(alternative))
                {
                    pattern.inside = Some(new);
                }
            }
        }

        let repointed = self.repoint(old, new);
        debug!(
            old = old.0,
            new = new.0,
            before,
            repointed,
            "inserted rules"
        );
        Ok(new)
    }

    fn target_grammar(&self, target: InsertTarget<'_>) -> Result<GrammarId, HiliteError> {
        match target {
            InsertTarget::Language(name) => self.resolve(name),
            InsertTarget::Inside {
                grammar,
                rule,
                alternative,
            } => {
                let found = self
                    .get(grammar)
                    .and_then(|g| g.get(rule))
                    .ok_or_else(|| HiliteError::RuleNotFound {
                        rule: rule.to_string(),
                    })?;
                found
                    .patterns
                    .get(alternative)
                    .and_then(|p| p.inside)
                    .ok_or_else(|| HiliteError::MissingInside {
                        rule: rule.to_string(),
                        alternative,
                    })
            }
        }
    }

    /// Replace every reference to `old` by `new`, returning how many were changed.
    ///
    /// Walks the language table and every grammar reachable from it through nested and rest
    /// edges, visiting each grammar once. References are compared by id.
    fn repoint(&mut self, old: GrammarId, new: GrammarId) -> usize {
        let mut changed = 0;
        for id in self.languages.values_mut() {
            if *id == old {
                *id = new;
                changed += 1;
            }
        }

        let mut visited = HashSet::new();
        let mut stack: Vec<GrammarId> = self.languages.values().copied().collect();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let grammar = &mut self.grammars[id.0];
            for pattern in grammar.patterns_mut() {
                if let Some(inside) = pattern.inside {
                    let inside = if inside == old {
                        changed += 1;
                        new
                    } else {
                        inside
                    };
                    pattern.inside = Some(inside);
                    stack.push(inside);
                }
            }
            if let Some(rest) = grammar.rest {
                let rest = if rest == old {
                    changed += 1;
                    new
                } else {
                    rest
                };
                grammar.rest = Some(rest);
                stack.push(rest);
            }
        }
        changed
    }

    /// Merge a grammar's `rest` rules into its own rule set, then clear `rest`.
    ///
    /// Rules already present are overwritten in place; new rules are appended. Calling it
    /// again is a no-op.
    pub fn merge_rest(&mut self, id: GrammarId) {
        let Some(rest) = self.grammars[id.0].rest else {
            return;
        };
        let merged: Vec<(String, Rule)> = self.grammars[rest.0]
            .rules
            .iter()
            .map(|(name, rule)| (name.clone(), rule.clone()))
            .collect();
        let grammar = &mut self.grammars[id.0];
        for (name, rule) in merged {
            grammar.rules.insert(name, rule);
        }
        grammar.rest = None;
        trace!(grammar = id.0, rest = rest.0, "merged rest grammar");
    }

    /// Perform the `rest` merge on every grammar in the arena
    pub fn merge_all_rest(&mut self) {
        for index in 0..self.grammars.len() {
            self.merge_rest(GrammarId(index));
        }
    }

    /// The rules the tokenizer applies for a grammar, in priority order.
    ///
    /// An unmerged `rest` is overlaid exactly as [GrammarRegistry::merge_rest] would apply
    /// it, without touching the registry.
    pub(crate) fn effective_rules(&self, id: GrammarId) -> Vec<(&str, &Rule)> {
        let grammar = &self.grammars[id.0];
        match grammar.rest {
            None => grammar.rules().collect(),
            Some(rest) => {
                let mut rules: IndexMap<&str, &Rule> = grammar.rules().collect();
                for (name, rule) in self.grammars[rest.0].rules() {
                    rules.insert(name, rule);
                }
                rules.into_iter().collect()
            }
        }
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}
