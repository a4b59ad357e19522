//! Segment list
//!
//!     A doubly linked list of segments stored in an arena, with sentinel head and tail
//!     nodes. The tokenizer walks it with a cursor while splicing: nodes inserted after the
//!     cursor are seen by the continuing walk, unlinked nodes are never visited again.
//!
//!     Unlinked nodes stay in the arena until the list is consumed; indices handed out are
//!     therefore stable for the life of the list.

use crate::hilite::token::{Node, Token};

pub(crate) const HEAD: usize = 0;
pub(crate) const TAIL: usize = 1;

/// Unconsumed text (a slice of the input) or a produced token
#[derive(Debug)]
pub(crate) enum Segment<'a> {
    Sentinel,
    Text(&'a str),
    Token(Token),
}

impl Segment<'_> {
    /// Byte length of input covered
    pub(crate) fn len(&self) -> usize {
        match self {
            Segment::Sentinel => 0,
            Segment::Text(text) => text.len(),
            Segment::Token(token) => token.length,
        }
    }
}

#[derive(Debug)]
struct Link<'a> {
    value: Segment<'a>,
    prev: usize,
    next: usize,
}

#[derive(Debug)]
pub(crate) struct SegmentList<'a> {
    links: Vec<Link<'a>>,
    len: usize,
}

impl<'a> SegmentList<'a> {
    pub(crate) fn new() -> Self {
        let links = vec![
            Link {
                value: Segment::Sentinel,
                prev: HEAD,
                next: TAIL,
            },
            Link {
                value: Segment::Sentinel,
                prev: HEAD,
                next: TAIL,
            },
        ];
        Self { links, len: 0 }
    }

    /// Number of linked segments, sentinels excluded
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn next(&self, node: usize) -> usize {
        self.links[node].next
    }

    pub(crate) fn prev(&self, node: usize) -> usize {
        self.links[node].prev
    }

    pub(crate) fn value(&self, node: usize) -> &Segment<'a> {
        &self.links[node].value
    }

    /// Length of a node's segment; zero for the sentinels
    pub(crate) fn len_of(&self, node: usize) -> usize {
        self.links[node].value.len()
    }

    pub(crate) fn is_text(&self, node: usize) -> bool {
        matches!(self.links[node].value, Segment::Text(_))
    }

    /// Link a new segment right after `node`, returning its index
    pub(crate) fn add_after(&mut self, node: usize, value: Segment<'a>) -> usize {
        let next = self.links[node].next;
        let index = self.links.len();
        self.links.push(Link {
            value,
            prev: node,
            next,
        });
        self.links[node].next = index;
        self.links[next].prev = index;
        self.len += 1;
        index
    }

    /// Unlink up to `count` segments following `node`, stopping at the tail
    pub(crate) fn remove_range(&mut self, node: usize, count: usize) {
        let mut next = self.links[node].next;
        let mut removed = 0;
        while removed < count && next != TAIL {
            next = self.links[next].next;
            removed += 1;
        }
        self.links[node].next = next;
        self.links[next].prev = node;
        self.len -= removed;
    }

    /// Consume the list into nodes, in order
    pub(crate) fn into_nodes(mut self) -> Vec<Node> {
        let mut nodes = Vec::with_capacity(self.len);
        let mut current = self.links[HEAD].next;
        while current != TAIL {
            let next = self.links[current].next;
            match std::mem::replace(&mut self.links[current].value, Segment::Sentinel) {
                Segment::Text(text) => nodes.push(Node::Text(text.to_string())),
                Segment::Token(token) => nodes.push(Node::Token(token)),
                Segment::Sentinel => {}
            }
            current = next;
        }
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(list: SegmentList<'_>) -> Vec<String> {
        list.into_nodes().iter().map(Node::text).collect()
    }

    #[test]
    fn test_add_after_links_in_order() {
        let mut list = SegmentList::new();
        let a = list.add_after(HEAD, Segment::Text("a"));
        let c = list.add_after(a, Segment::Text("c"));
        let b = list.add_after(a, Segment::Text("b"));

        assert_eq!(list.len(), 3);
        assert_eq!(list.next(a), b);
        assert_eq!(list.prev(c), b);
        assert_eq!(texts(list), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_range_stops_at_tail() {
        let mut list = SegmentList::new();
        let a = list.add_after(HEAD, Segment::Text("a"));
        let b = list.add_after(a, Segment::Text("b"));
        list.add_after(b, Segment::Text("c"));

        list.remove_range(a, 5);
        assert_eq!(list.len(), 1);
        assert_eq!(list.next(a), TAIL);
        assert_eq!(list.prev(TAIL), a);
        assert_eq!(texts(list), vec!["a"]);
    }

    #[test]
    fn test_splice_token_between_text() {
        let mut list = SegmentList::new();
        let whole = list.add_after(HEAD, Segment::Text("a12b"));
        let before = list.add_after(list.prev(whole), Segment::Text("a"));
        list.remove_range(before, 1);
        let token = list.add_after(before, Segment::Token(Token::text("number", "12")));
        list.add_after(token, Segment::Text("b"));

        assert_eq!(list.len(), 3);
        assert!(list.is_text(before));
        assert!(!list.is_text(token));
        assert_eq!(list.len_of(token), 2);
        assert_eq!(list.len_of(TAIL), 0);
        assert_eq!(texts(list), vec!["a", "12", "b"]);
    }
}
