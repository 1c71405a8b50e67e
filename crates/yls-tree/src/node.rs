//! Node types for parsed YAML documents.

/// A byte range in the document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start offset, inclusive.
    pub start: u32,
    /// End offset, inclusive for containment checks (a cursor sitting
    /// right after the last character of a node still belongs to it).
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Whether the span contains the given offset.
    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// A node in a parsed YAML document.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub content: NodeContent,
    pub span: Span,
}

/// The shape of a syntax node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    /// A scalar value (plain, quoted, or block scalar text).
    Scalar { text: String },
    /// A single `key: value` pair. The value is `None` while the user
    /// is still typing it (`key: ` with nothing after the colon).
    Entry {
        key: Box<SyntaxNode>,
        value: Option<Box<SyntaxNode>>,
    },
    /// A block or flow mapping; children are `Entry` nodes.
    Mapping { entries: Vec<SyntaxNode> },
    /// A block or flow sequence.
    Sequence { items: Vec<SyntaxNode> },
}

impl SyntaxNode {
    pub fn scalar(text: impl Into<String>, span: Span) -> Self {
        SyntaxNode {
            content: NodeContent::Scalar { text: text.into() },
            span,
        }
    }

    pub fn entry(key: SyntaxNode, value: Option<SyntaxNode>, span: Span) -> Self {
        SyntaxNode {
            content: NodeContent::Entry {
                key: Box::new(key),
                value: value.map(Box::new),
            },
            span,
        }
    }

    pub fn mapping(entries: Vec<SyntaxNode>, span: Span) -> Self {
        SyntaxNode {
            content: NodeContent::Mapping { entries },
            span,
        }
    }

    pub fn sequence(items: Vec<SyntaxNode>, span: Span) -> Self {
        SyntaxNode {
            content: NodeContent::Sequence { items },
            span,
        }
    }

    /// Scalar text, if this node is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Scalar { text } => Some(text),
            _ => None,
        }
    }

    /// Mapping entries, if this node is a mapping.
    pub fn as_mapping(&self) -> Option<&[SyntaxNode]> {
        match &self.content {
            NodeContent::Mapping { entries } => Some(entries),
            _ => None,
        }
    }

    /// Key text of an entry node, if the key is a scalar.
    pub fn entry_key_text(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Entry { key, .. } => key.as_scalar(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_containment_is_inclusive() {
        let span = Span::new(2, 5);
        assert!(!span.contains(1));
        assert!(span.contains(2));
        assert!(span.contains(5));
        assert!(!span.contains(6));
    }

    #[test]
    fn entry_key_text() {
        let entry = SyntaxNode::entry(
            SyntaxNode::scalar("name", Span::new(0, 4)),
            Some(SyntaxNode::scalar("demo", Span::new(6, 10))),
            Span::new(0, 10),
        );
        assert_eq!(entry.entry_key_text(), Some("name"));
        assert_eq!(entry.as_scalar(), None);
    }
}
