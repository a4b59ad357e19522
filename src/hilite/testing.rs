//! Testing utilities for token streams
//!
//! Token streams nest, and spelling out the expected `Vec<Node>` by hand is long and hides
//! what a test is about. [assert_tokens] gives a fluent API instead:
//!
//! ```rust-example
//! use hilite::hilite::testing::assert_tokens;
//!
//! assert_tokens(&nodes)
//!     .count(3)
//!     .text(0, "x = ")
//!     .token(1, |t| {
//!         t.kind("string").content("\"a1\"").child(1, |n| {
//!             n.kind("number").content("1");
//!         });
//!     });
//! ```
//!
//! [summarize] flattens a stream into `(type, text)` pairs, which reads well in
//! `assert_eq!` and in snapshots.

use super::token::{flatten_text, Node, Token};

/// One `(type, text)` pair per top-level node; text nodes get the type `""`
pub fn summarize(nodes: &[Node]) -> Vec<(String, String)> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Text(text) => (String::new(), text.clone()),
            Node::Token(token) => (token.kind.clone(), token.content_text()),
        })
        .collect()
}

/// Every token's `length` equals the byte length of its (flattened) content, recursively
pub fn lengths_consistent(nodes: &[Node]) -> bool {
    nodes.iter().all(|node| match node {
        Node::Text(_) => true,
        Node::Token(token) => {
            token.length == token.content_text().len()
                && token.children().map_or(true, lengths_consistent)
        }
    })
}

/// Panic unless the stream's text leaves reproduce `input` exactly
pub fn assert_conserves(nodes: &[Node], input: &str) {
    let flattened = flatten_text(nodes);
    assert_eq!(
        flattened, input,
        "Token stream does not reproduce its input: {:?}",
        summarize(nodes)
    );
}

/// Create an assertion builder for a token stream
pub fn assert_tokens(nodes: &[Node]) -> StreamAssertion<'_> {
    StreamAssertion {
        nodes,
        context: "nodes".to_string(),
    }
}

pub struct StreamAssertion<'a> {
    nodes: &'a [Node],
    context: String,
}

impl<'a> StreamAssertion<'a> {
    pub fn count(self, expected: usize) -> Self {
        assert_eq!(
            self.nodes.len(),
            expected,
            "{}: expected {} nodes, found {:?}",
            self.context,
            expected,
            summarize(self.nodes)
        );
        self
    }

    /// Assert the node at `index` is unclaimed text
    pub fn text(self, index: usize, expected: &str) -> Self {
        match self.node(index) {
            Node::Text(text) => assert_eq!(
                text, expected,
                "{}[{}]: text mismatch",
                self.context, index
            ),
            Node::Token(token) => panic!(
                "{}[{}]: expected text {:?}, found token {}",
                self.context, index, expected, token.kind
            ),
        }
        self
    }

    /// Assert on the token at `index`
    pub fn token<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(TokenAssertion<'a>),
    {
        let context = format!("{}[{}]", self.context, index);
        match self.node(index) {
            Node::Token(token) => assertion(TokenAssertion { token, context }),
            Node::Text(text) => panic!("{}: expected a token, found text {:?}", context, text),
        }
        self
    }

    /// Assert no node of the stream is a token of type `kind`
    pub fn no_token(self, kind: &str) -> Self {
        let found = self
            .nodes
            .iter()
            .filter_map(Node::as_token)
            .find(|token| token.is(kind));
        assert!(
            found.is_none(),
            "{}: unexpected {} token {:?}",
            self.context,
            kind,
            found.map(Token::content_text)
        );
        self
    }

    fn node(&self, index: usize) -> &'a Node {
        assert!(
            index < self.nodes.len(),
            "{}: index {} out of bounds ({} nodes: {:?})",
            self.context,
            index,
            self.nodes.len(),
            summarize(self.nodes)
        );
        &self.nodes[index]
    }
}

pub struct TokenAssertion<'a> {
    token: &'a Token,
    context: String,
}

impl<'a> TokenAssertion<'a> {
    pub fn kind(self, expected: &str) -> Self {
        assert_eq!(self.token.kind, expected, "{}: type mismatch", self.context);
        self
    }

    /// Flattened content text
    pub fn content(self, expected: &str) -> Self {
        assert_eq!(
            self.token.content_text(),
            expected,
            "{}: content mismatch",
            self.context
        );
        self
    }

    pub fn alias(self, expected: &[&str]) -> Self {
        assert_eq!(self.token.alias, expected, "{}: alias mismatch", self.context);
        self
    }

    pub fn length(self, expected: usize) -> Self {
        assert_eq!(self.token.length, expected, "{}: length mismatch", self.context);
        self
    }

    /// Assert the content was not tokenized again
    pub fn flat(self) -> Self {
        assert!(
            self.token.children().is_none(),
            "{}: expected flat content, found nested nodes",
            self.context
        );
        self
    }

    /// Assert on the nested stream
    pub fn children<F>(self, assertion: F) -> Self
    where
        F: FnOnce(StreamAssertion<'a>),
    {
        let nodes = self
            .token
            .children()
            .unwrap_or_else(|| panic!("{}: expected nested content", self.context));
        assertion(StreamAssertion {
            nodes,
            context: format!("{}.content", self.context),
        });
        self
    }

    /// Assert on one token of the nested stream
    pub fn child<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(TokenAssertion<'a>),
    {
        let nodes = self
            .token
            .children()
            .unwrap_or_else(|| panic!("{}: expected nested content", self.context));
        StreamAssertion {
            nodes,
            context: format!("{}.content", self.context),
        }
        .token(index, assertion);
        self
    }
}
