//! Markup rendering
//!
//!     Rendering is two separate passes:
//!
//!     - encode:    escapes the text leaves of a token stream (`&`, `<`, and U+00A0 which
//!                  becomes a plain space). Token structure is copied untouched.
//!     - stringify: writes the stream as markup. Text leaves are written as they are, tokens
//!                  become `<span class="token <type> <aliases..>">content</span>`.
//!
//!     Keeping them apart leaves the token tree inspectable in unescaped form; callers that
//!     want safe markup encode first (see [highlight](super::highlighter::highlight)).
//!
//! Wrap hooks
//!
//!     Before a token's element is written, each registered [WrapHook] may edit its
//!     [WrapEnv]: tag, classes, attributes and the already rendered content.

use super::token::{Content, Node, Token};
use indexmap::IndexMap;

/// Escape a text leaf for inclusion in markup
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '\u{a0}' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape every text leaf of a token stream
pub fn encode(nodes: &[Node]) -> Vec<Node> {
    nodes.iter().map(encode_node).collect()
}

/// Escape every text leaf under a node
pub fn encode_node(node: &Node) -> Node {
    match node {
        Node::Text(text) => Node::Text(escape_text(text)),
        Node::Token(token) => Node::Token(encode_token(token)),
    }
}

fn encode_token(token: &Token) -> Token {
    let content = match &token.content {
        Content::Text(text) => Content::Text(escape_text(text)),
        Content::Nested(children) => Content::Nested(encode(children)),
    };
    Token::new(token.kind.clone(), content, token.alias.clone(), token.length)
}

/// Render a token stream with no wrap hooks
pub fn stringify(nodes: &[Node], language: &str) -> String {
    Renderer::new().stringify(nodes, language)
}

/// Element about to be written for a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapEnv {
    pub kind: String,
    pub content: String,
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: IndexMap<String, String>,
    pub language: String,
}

/// Edits the element of each token before it is written
pub trait WrapHook: Send + Sync {
    fn wrap(&self, env: &mut WrapEnv);
}

impl<F> WrapHook for F
where
    F: Fn(&mut WrapEnv) + Send + Sync,
{
    fn wrap(&self, env: &mut WrapEnv) {
        self(env)
    }
}

/// Token stream to markup writer
#[derive(Default)]
pub struct Renderer {
    hooks: Vec<Box<dyn WrapHook>>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a wrap hook; hooks run in the order they were added
    pub fn with_hook(mut self, hook: impl WrapHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn add_hook(&mut self, hook: impl WrapHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn stringify(&self, nodes: &[Node], language: &str) -> String {
        let mut out = String::new();
        for node in nodes {
            self.write_node(node, language, &mut out);
        }
        out
    }

    pub fn stringify_node(&self, node: &Node, language: &str) -> String {
        let mut out = String::new();
        self.write_node(node, language, &mut out);
        out
    }

    fn write_node(&self, node: &Node, language: &str, out: &mut String) {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Token(token) => self.write_token(token, language, out),
        }
    }

    fn write_token(&self, token: &Token, language: &str, out: &mut String) {
        let content = match &token.content {
            Content::Text(text) => text.clone(),
            Content::Nested(children) => self.stringify(children, language),
        };

        let mut classes = Vec::with_capacity(2 + token.alias.len());
        classes.push("token".to_string());
        classes.push(token.kind.clone());
        classes.extend(token.alias.iter().cloned());

        let mut env = WrapEnv {
            kind: token.kind.clone(),
            content,
            tag: "span".to_string(),
            classes,
            attributes: IndexMap::new(),
            language: language.to_string(),
        };
        for hook in &self.hooks {
            hook.wrap(&mut env);
        }

        out.push('<');
        out.push_str(&env.tag);
        out.push_str(" class=\"");
        out.push_str(&env.classes.join(" "));
        out.push('"');
        for (name, value) in &env.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&value.replace('"', "&quot;"));
            out.push('"');
        }
        out.push('>');
        out.push_str(&env.content);
        out.push_str("</");
        out.push_str(&env.tag);
        out.push('>');
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Node> {
        vec![
            Node::from("a < b && "),
            Node::Token(Token::new(
                "string",
                Content::Nested(vec![
                    Node::from("\"<"),
                    Node::Token(Token::text("number", "1")),
                    Node::from("\""),
                ]),
                vec!["literal".to_string()],
                4,
            )),
        ]
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a<b & c\u{a0}d > e"), "a&lt;b &amp; c d > e");
    }

    #[test]
    fn test_encode_keeps_structure() {
        let encoded = encode(&sample());
        assert_eq!(encoded[0], Node::from("a &lt; b &amp;&amp; "));
        let string = encoded[1].as_token().unwrap();
        assert_eq!(string.kind, "string");
        assert_eq!(string.alias, vec!["literal"]);
        assert_eq!(string.length, 4);
        assert_eq!(string.children().unwrap()[0], Node::from("\"&lt;"));
    }

    #[test]
    fn test_encode_without_text_leaves_is_identity() {
        let nodes = vec![Node::Token(Token::new("empty", Content::Nested(vec![]), vec![], 0))];
        assert_eq!(encode(&nodes), nodes);
    }

    #[test]
    fn test_stringify_tokens() {
        let html = stringify(&encode(&sample()), "js");
        assert_eq!(
            html,
            "a &lt; b &amp;&amp; <span class=\"token string literal\">\"&lt;<span class=\"token number\">1</span>\"</span>"
        );
    }

    #[test]
    fn test_stringify_leaves_text_as_is() {
        assert_eq!(stringify(&[Node::from("<b>")], "plain"), "<b>");
    }

    #[test]
    fn test_wrap_hooks_edit_element() {
        let renderer = Renderer::new()
            .with_hook(|env: &mut WrapEnv| {
                if env.kind == "number" {
                    env.tag = "em".to_string();
                    env.attributes
                        .insert("title".to_string(), format!("\"{}\" in {}", env.content, env.language));
                }
            })
            .with_hook(|env: &mut WrapEnv| env.classes.push("hooked".to_string()));

        let html = renderer.stringify(&[Node::Token(Token::text("number", "7"))], "py");
        assert_eq!(
            html,
            "<em class=\"token number hooked\" title=\"&quot;7&quot; in py\">7</em>"
        );
    }
}
