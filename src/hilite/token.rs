//! Token tree produced by the tokenizer
//!
//!     A tokenize call yields an ordered list of [Node]s. A node is either text no rule
//!     claimed or a [Token]. A token's content is either the matched text or, when its rule
//!     declares a nested grammar, the nodes produced by tokenizing the matched text again.
//!
//!     Reading every text leaf in order, recursively through token content, reproduces the
//!     input exactly.
//!
//! Serialization
//!
//!     Nodes serialize to JSON with untagged variants, so a token stream reads as
//!     `["a", {"type": "number", "content": "12", "length": 2}, "b"]`.

use serde::Serialize;

/// One entry of a token stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Text(String),
    Token(Token),
}

/// Content of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Nested(Vec<Node>),
}

/// A typed span of the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Rule name that produced the token
    #[serde(rename = "type")]
    pub kind: String,
    pub content: Content,
    /// Extra style classes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<String>,
    /// Byte length of the input the token covers
    pub length: usize,
}

impl Token {
    pub fn new(kind: impl Into<String>, content: Content, alias: Vec<String>, length: usize) -> Self {
        Self {
            kind: kind.into(),
            content,
            alias,
            length,
        }
    }

    /// Token over plain text; its length is the text's length
    pub fn text(kind: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let length = text.len();
        Self::new(kind, Content::Text(text), Vec::new(), length)
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Concatenated text of the token's content
    pub fn content_text(&self) -> String {
        self.content.text()
    }

    /// Nested nodes, if the content was tokenized with a nested grammar
    pub fn children(&self) -> Option<&[Node]> {
        match &self.content {
            Content::Nested(nodes) => Some(nodes),
            Content::Text(_) => None,
        }
    }
}

impl Content {
    pub fn text(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Nested(nodes) => flatten_text(nodes),
        }
    }
}

impl Node {
    /// Concatenated text of the node
    pub fn text(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Token(token) => token.content_text(),
        }
    }

    /// Byte length of the input the node covers
    pub fn len(&self) -> usize {
        match self {
            Node::Text(text) => text.len(),
            Node::Token(token) => token.length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) => Some(token),
            Node::Text(_) => None,
        }
    }
}

impl From<Token> for Node {
    fn from(token: Token) -> Self {
        Node::Token(token)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

/// Concatenate all text leaves of a token stream
pub fn flatten_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    push_text(nodes, &mut out);
    out
}

fn push_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Token(token) => match &token.content {
                Content::Text(text) => out.push_str(text),
                Content::Nested(children) => push_text(children, out),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_nested() {
        let inner = vec![
            Node::from("\"a"),
            Node::Token(Token::text("number", "1")),
            Node::from("\""),
        ];
        let nodes = vec![
            Node::from("x = "),
            Node::Token(Token::new("string", Content::Nested(inner), vec![], 4)),
        ];

        assert_eq!(flatten_text(&nodes), "x = \"a1\"");
        assert_eq!(nodes[1].len(), 4);
        assert_eq!(nodes[1].as_token().unwrap().children().unwrap().len(), 3);
    }

    #[test]
    fn test_json_shape() {
        let nodes = vec![
            Node::from("a"),
            Node::Token(Token::text("number", "12")),
            Node::Token(Token::new(
                "decorator",
                Content::Text("@x".to_string()),
                vec!["annotation".to_string()],
                2,
            )),
        ];

        let json = serde_json::to_string(&nodes).unwrap();
        assert_eq!(
            json,
            r#"["a",{"type":"number","content":"12","length":2},{"type":"decorator","content":"@x","alias":["annotation"],"length":2}]"#
        );
    }
}
