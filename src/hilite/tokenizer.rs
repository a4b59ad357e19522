//! Tokenizer
//!
//! This module turns text into a token stream by applying a grammar's rules over a mutable
//! list of segments.
//!
//! Algorithm
//!
//!     The list starts as one text segment holding the whole input. Each rule alternative,
//!     in priority order, walks the list from the front:
//!
//!     1. Token segments are skipped; only unclaimed text is matched.
//!     2. A plain pattern is searched inside the current text segment alone.
//!     3. A greedy pattern is searched in the whole input from the current offset. The
//!        match may start in a later segment (the cursor re-anchors there) and may run over
//!        several segments, tokens included; all of them are replaced.
//!     4. With lookbehind, the first capture group is context and is trimmed off the match.
//!     5. The matched text becomes a token, tokenized again with the rule's nested grammar
//!        if it has one. Text before and after the match stays as text segments.
//!     6. When a match replaced more than one segment, the rules ahead of the one that
//!        matched are run again over the replaced span (up to its "reach"), since the
//!        merged leftover text may now hold matches that were split before.
//!
//!     If the list ever holds more segments than the input has bytes, some pattern is
//!     matching the empty string over and over and the call fails with
//!     [HiliteError::SegmentOverflow].
//!
//! Offsets
//!
//!     Offsets are byte offsets into the input. Every cut is at a match or segment boundary,
//!     so slices always fall on char boundaries.

mod segments;

use super::error::HiliteError;
use super::grammar::{GrammarId, Pattern};
use super::registry::GrammarRegistry;
use super::token::{Content, Node, Token};
use segments::{Segment, SegmentList, HEAD, TAIL};
use std::ops::Range;
use tracing::debug;

/// Tokenize `text` with the grammar `grammar` of `registry`.
///
/// Every byte of the input ends up in exactly one text node or in exactly one token's
/// (possibly nested) content, in the original order.
pub fn tokenize(
    text: &str,
    registry: &GrammarRegistry,
    grammar: GrammarId,
) -> Result<Vec<Node>, HiliteError> {
    debug!(grammar = grammar.index(), length = text.len(), "tokenize");
    tokenize_text(text, registry, grammar)
}

fn tokenize_text(
    text: &str,
    registry: &GrammarRegistry,
    grammar: GrammarId,
) -> Result<Vec<Node>, HiliteError> {
    if text.is_empty() {
        return Ok(vec![Node::Text(String::new())]);
    }

    let mut matcher = Matcher {
        text,
        registry,
        list: SegmentList::new(),
    };
    matcher.list.add_after(HEAD, Segment::Text(text));
    matcher.match_grammar(grammar, HEAD, 0, None)?;
    Ok(matcher.list.into_nodes())
}

/// Bounds a re-scan after a multi-segment match
struct Rematch {
    /// (rule index, alternative index) whose match triggered the re-scan; the re-scan stops
    /// when it gets there
    cause: (usize, usize),
    /// Offset the re-scan must not start matching at or beyond
    reach: usize,
}

struct Matcher<'a> {
    text: &'a str,
    registry: &'a GrammarRegistry,
    list: SegmentList<'a>,
}

impl<'a> Matcher<'a> {
    fn match_grammar(
        &mut self,
        grammar: GrammarId,
        start: usize,
        start_pos: usize,
        mut rematch: Option<&mut Rematch>,
    ) -> Result<(), HiliteError> {
        let registry = self.registry;
        let rules = registry.effective_rules(grammar);

        for (rule_index, (name, rule)) in rules.iter().enumerate() {
            for (alternative, pattern) in rule.patterns().iter().enumerate() {
                let cause = (rule_index, alternative);
                if rematch.as_deref().is_some_and(|r| r.cause == cause) {
                    return Ok(());
                }
                self.scan(
                    grammar,
                    name,
                    pattern,
                    cause,
                    start,
                    start_pos,
                    rematch.as_deref_mut(),
                )?;
            }
        }
        Ok(())
    }

    /// Apply one rule alternative along the list, starting after `start`
    #[allow(clippy::too_many_arguments)]
    fn scan(
        &mut self,
        grammar: GrammarId,
        name: &str,
        pattern: &Pattern,
        cause: (usize, usize),
        start: usize,
        start_pos: usize,
        mut rematch: Option<&mut Rematch>,
    ) -> Result<(), HiliteError> {
        let mut current = self.list.next(start);
        let mut pos = start_pos;

        'scan: while current != TAIL {
            if rematch.as_deref().is_some_and(|r| pos >= r.reach) {
                break;
            }

            if self.list.len() > self.text.len() {
                return Err(HiliteError::SegmentOverflow {
                    segments: self.list.len(),
                    length: self.text.len(),
                });
            }

            let segment: &'a str = match self.list.value(current) {
                Segment::Text(text) => *text,
                _ => {
                    pos += self.list.len_of(current);
                    current = self.list.next(current);
                    continue;
                }
            };

            let mut remove_count = 1;
            let target: &'a str;
            let found: Range<usize>;

            if pattern.greedy {
                let Some(m) = match_pattern(pattern, pos, self.text) else {
                    break;
                };

                // Re-anchor on the segment holding the match start
                let mut p = pos + self.list.len_of(current);
                while m.start >= p {
                    current = self.list.next(current);
                    if current == TAIL {
                        break 'scan;
                    }
                    p += self.list.len_of(current);
                }
                p -= self.list.len_of(current);
                pos = p;

                if !self.list.is_text(current) {
                    pos += self.list.len_of(current);
                    current = self.list.next(current);
                    continue;
                }

                // Take every segment the match overlaps, plus the text run that follows
                let mut k = current;
                while k != TAIL && (p < m.end || self.list.is_text(k)) {
                    remove_count += 1;
                    p += self.list.len_of(k);
                    k = self.list.next(k);
                }
                remove_count -= 1;

                target = &self.text[pos..p];
                found = (m.start - pos)..(m.end - pos);
            } else {
                let Some(m) = match_pattern(pattern, 0, segment) else {
                    pos += self.list.len_of(current);
                    current = self.list.next(current);
                    continue;
                };
                target = segment;
                found = m;
            }

            let before = &target[..found.start];
            let matched = &target[found.clone()];
            let after = &target[found.end..];

            let reach = pos + target.len();
            if let Some(r) = rematch.as_deref_mut() {
                r.reach = r.reach.max(reach);
            }

            let mut remove_from = self.list.prev(current);
            if !before.is_empty() {
                remove_from = self.list.add_after(remove_from, Segment::Text(before));
                pos += before.len();
            }
            self.list.remove_range(remove_from, remove_count);

            let content = match pattern.inside {
                Some(inside) => Content::Nested(tokenize_text(matched, self.registry, inside)?),
                None => Content::Text(matched.to_string()),
            };
            let token = Token::new(name, content, pattern.alias.clone(), matched.len());
            current = self.list.add_after(remove_from, Segment::Token(token));

            if !after.is_empty() {
                self.list.add_after(current, Segment::Text(after));
            }

            if remove_count > 1 {
                let mut nested = Rematch { cause, reach };
                let rescan_from = self.list.prev(current);
                self.match_grammar(grammar, rescan_from, pos, Some(&mut nested))?;
                if let Some(r) = rematch.as_deref_mut() {
                    r.reach = r.reach.max(nested.reach);
                }
            }

            pos += self.list.len_of(current);
            current = self.list.next(current);
        }
        Ok(())
    }
}

/// Search for `pattern` in `text` starting at `pos`, returning the token's byte range
fn match_pattern(pattern: &Pattern, pos: usize, text: &str) -> Option<Range<usize>> {
    let captures = pattern.regex.captures_at(text, pos)?;
    let whole = captures.get(0)?;
    let mut start = whole.start();
    if pattern.lookbehind {
        if let Some(context) = captures.get(1).filter(|c| !c.is_empty()) {
            start = (whole.start() + context.len()).min(whole.end());
        }
    }
    Some(start..whole.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hilite::grammar::{Grammar, Rule};
    use crate::hilite::token::flatten_text;

    fn pattern(source: &str) -> Pattern {
        Pattern::new(source).unwrap()
    }

    fn run(registry: &GrammarRegistry, id: GrammarId, text: &str) -> Vec<Node> {
        let nodes = tokenize(text, registry, id).unwrap();
        assert_eq!(flatten_text(&nodes), text);
        nodes
    }

    fn tok(kind: &str, text: &str) -> Node {
        Node::Token(Token::text(kind, text))
    }

    #[test]
    fn test_number_splits_text() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(Grammar::new().rule("number", pattern(r"\d+")));

        assert_eq!(
            run(&registry, id, "a12b"),
            vec![Node::from("a"), tok("number", "12"), Node::from("b")]
        );
    }

    #[test]
    fn test_empty_input() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(Grammar::new().rule("number", pattern(r"\d+")));
        assert_eq!(run(&registry, id, ""), vec![Node::from("")]);
    }

    #[test]
    fn test_plain_grammar_keeps_text() {
        let registry = GrammarRegistry::new();
        let plain = registry.resolve("plain").unwrap();
        assert_eq!(run(&registry, plain, "x < y"), vec![Node::from("x < y")]);
    }

    #[test]
    fn test_greedy_string_with_escaped_quotes() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(
            Grammar::new().rule("string", pattern(r#""(?:[^"\\]|\\.)*""#).greedy()),
        );

        let text = r#"say "hi \"there\"""#;
        assert_eq!(
            run(&registry, id, text),
            vec![Node::from("say "), tok("string", r#""hi \"there\"""#)]
        );
    }

    #[test]
    fn test_inside_grammar_nests_tokens() {
        let mut registry = GrammarRegistry::new();
        let digits = registry.add(Grammar::new().rule("number", pattern(r"\d+")));
        let id = registry.add(Grammar::new().rule("string", pattern(r#""[^"]*""#).inside(digits)));

        let nodes = run(&registry, id, r#"x "a1" 2"#);
        assert_eq!(nodes.len(), 3);
        let string = nodes[1].as_token().unwrap();
        assert!(string.is("string"));
        assert_eq!(string.length, 4);
        assert_eq!(
            string.children().unwrap(),
            &[Node::from("\"a"), tok("number", "1"), Node::from("\"")]
        );
        // The nested grammar never reads past the matched span
        assert_eq!(nodes[2], Node::from(" 2"));
    }

    #[test]
    fn test_earlier_rule_wins() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(
            Grammar::new()
                .rule("keyword", pattern(r"\bif\b"))
                .rule("identifier", pattern(r"\b\w+\b")),
        );

        let nodes = run(&registry, id, "if");
        assert_eq!(nodes, vec![tok("keyword", "if")]);
    }

    #[test]
    fn test_earlier_alternative_wins() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(Grammar::new().rule(
            "number",
            vec![pattern(r"0x[0-9a-f]+").alias("hex"), pattern(r"\d+")],
        ));

        let nodes = run(&registry, id, "0x1f");
        assert_eq!(
            nodes,
            vec![Node::Token(Token::new(
                "number",
                Content::Text("0x1f".to_string()),
                vec!["hex".to_string()],
                4
            ))]
        );
    }

    #[test]
    fn test_absent_rule_is_skipped() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(
            Grammar::new()
                .rule("boolean", Rule::none())
                .rule("number", pattern(r"\d")),
        );
        assert_eq!(run(&registry, id, "1"), vec![tok("number", "1")]);
    }

    #[test]
    fn test_lookbehind_trims_context() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(Grammar::new().rule("property", pattern(r"(\.)\w+").lookbehind()));

        assert_eq!(
            run(&registry, id, "a.b"),
            vec![Node::from("a."), tok("property", "b")]
        );
    }

    #[test]
    fn test_lookbehind_trims_group_length_not_group_end() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(Grammar::new().rule("t", pattern(r"a(b)c").lookbehind()));

        assert_eq!(
            run(&registry, id, "xabc"),
            vec![Node::from("xa"), tok("t", "bc")]
        );
    }

    #[test]
    fn test_lookbehind_ignores_empty_group() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(Grammar::new().rule("t", pattern(r"(^|,)ab").lookbehind()));

        assert_eq!(run(&registry, id, "ab"), vec![tok("t", "ab")]);
    }

    #[test]
    fn test_greedy_lookbehind_comment() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(
            Grammar::new().rule("comment", pattern(r"(^|[^\\])//.*").lookbehind().greedy()),
        );

        assert_eq!(
            run(&registry, id, "a // b"),
            vec![Node::from("a "), tok("comment", "// b")]
        );
    }

    #[test]
    fn test_greedy_match_reunites_split_text() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(
            Grammar::new()
                .rule("number", pattern(r"\d+"))
                .rule("string", pattern(r#""[^"]*""#).greedy()),
        );

        assert_eq!(
            run(&registry, id, r#"a "x1y" b"#),
            vec![Node::from("a "), tok("string", r#""x1y""#), Node::from(" b")]
        );
    }

    #[test]
    fn test_greedy_match_reanchors_past_tokens() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(
            Grammar::new()
                .rule("number", pattern(r"\d+"))
                .rule("string", pattern(r#""[^"]*""#).greedy()),
        );

        assert_eq!(
            run(&registry, id, r#"1 "x" 2"#),
            vec![
                tok("number", "1"),
                Node::from(" "),
                tok("string", r#""x""#),
                Node::from(" "),
                tok("number", "2"),
            ]
        );
    }

    #[test]
    fn test_rematch_reclaims_leftover_of_consumed_token() {
        // The string swallows half of the "12" number token; the leftover "2" is
        // matched again by the higher priority number rule.
        let mut registry = GrammarRegistry::new();
        let id = registry.add(
            Grammar::new()
                .rule("number", pattern(r"\d+"))
                .rule("string", pattern(r#""\d"#).greedy()),
        );

        assert_eq!(
            run(&registry, id, r#""12 34"#),
            vec![
                tok("string", "\"1"),
                tok("number", "2"),
                Node::from(" "),
                tok("number", "34"),
            ]
        );
    }

    #[test]
    fn test_rest_rules_apply_without_merge() {
        let mut registry = GrammarRegistry::new();
        let base = registry.add(Grammar::new().rule("keyword", pattern(r"\bif\b")));
        let id = registry.add(
            Grammar::new()
                .rule("punctuation", pattern(r"[()]"))
                .with_rest(base),
        );

        assert_eq!(
            run(&registry, id, "(if)"),
            vec![
                tok("punctuation", "("),
                tok("keyword", "if"),
                tok("punctuation", ")"),
            ]
        );
    }

    #[test]
    fn test_multibyte_text_is_conserved() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(
            Grammar::new()
                .rule("string", pattern(r#""[^"]*""#).greedy())
                .rule("word", pattern(r"\w+")),
        );

        let nodes = run(&registry, id, "héllo \"wörld\" ünï");
        assert_eq!(nodes[0], tok("word", "héllo"));
        assert_eq!(nodes[2], tok("string", "\"wörld\""));
    }

    #[test]
    fn test_empty_matches_overflow() {
        let mut registry = GrammarRegistry::new();
        let id = registry.add(Grammar::new().rule("nothing", pattern(r"x*")));

        assert_eq!(
            tokenize("ab", &registry, id),
            Err(HiliteError::SegmentOverflow {
                segments: 3,
                length: 2
            })
        );
    }

    #[test]
    fn test_overflow_in_nested_grammar_fails_the_call() {
        let mut registry = GrammarRegistry::new();
        let inner = registry.add(Grammar::new().rule("nothing", pattern(r"x*")));
        let id = registry.add(Grammar::new().rule("word", pattern(r"\w+").inside(inner)));

        assert!(matches!(
            tokenize("ab cd", &registry, id),
            Err(HiliteError::SegmentOverflow { .. })
        ));
    }
}
