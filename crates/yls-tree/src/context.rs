//! Cursor-context derivation.
//!
//! Given a document tree and a byte offset, figure out what the cursor
//! is positioned on: a key slot inside a mapping, the value slot of a
//! known key, or a fresh item slot inside a sequence. The path of keys
//! and indices from the root to that position is accumulated while
//! descending, and later drives the schema walk.

use crate::node::{NodeContent, SyntaxNode};

/// One step of the document path from the root to the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// What the cursor is positioned on.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorContext {
    /// Inside a mapping, on a key or in blank space between entries.
    ObjectKey {
        /// Path from the root to the enclosing mapping.
        path: Vec<PathSegment>,
        /// Keys already present as siblings (excluding the one being
        /// typed, if any).
        existing_keys: Vec<String>,
        /// The partially typed key under the cursor, if the cursor sits
        /// on an existing key scalar.
        current_key: Option<String>,
    },
    /// In the value position of a known key.
    PropertyValue {
        /// Path from the root to the enclosing mapping.
        path: Vec<PathSegment>,
        key: String,
    },
    /// Inside a sequence but not inside any existing item.
    ArrayItem {
        /// Path from the root to the enclosing sequence.
        path: Vec<PathSegment>,
    },
    /// The offset does not map to a usable position.
    Nothing,
}

/// Locate the cursor context for `offset` within `root`.
///
/// Degenerate positions (offset past the end of the tree, scalar root,
/// malformed shapes) all resolve to [`CursorContext::Nothing`]; this
/// function never fails.
pub fn context_at(root: &SyntaxNode, offset: u32) -> CursorContext {
    if !root.span.contains(offset) {
        return CursorContext::Nothing;
    }
    descend(root, offset, Vec::new())
}

fn descend(node: &SyntaxNode, offset: u32, path: Vec<PathSegment>) -> CursorContext {
    match &node.content {
        NodeContent::Mapping { entries } => in_mapping(entries, offset, path),
        NodeContent::Sequence { items } => in_sequence(items, offset, path),
        // A bare scalar or entry at this level gives the cursor nothing
        // to complete against.
        NodeContent::Scalar { .. } | NodeContent::Entry { .. } => CursorContext::Nothing,
    }
}

fn in_mapping(entries: &[SyntaxNode], offset: u32, path: Vec<PathSegment>) -> CursorContext {
    for (idx, entry) in entries.iter().enumerate() {
        let NodeContent::Entry { key, value } = &entry.content else {
            continue;
        };
        if !entry.span.contains(offset) {
            continue;
        }

        // On the key itself: completing a (possibly partial) key.
        if key.span.contains(offset) {
            let current_key = key.as_scalar().map(str::to_owned);
            return CursorContext::ObjectKey {
                path,
                existing_keys: sibling_keys(entries, Some(idx)),
                current_key,
            };
        }

        let Some(key_text) = key.as_scalar() else {
            return CursorContext::Nothing;
        };

        if let Some(value) = value
            && value.span.contains(offset)
        {
            return match &value.content {
                NodeContent::Mapping { .. } | NodeContent::Sequence { .. } => {
                    let mut path = path;
                    path.push(PathSegment::Key(key_text.to_owned()));
                    descend(value, offset, path)
                }
                _ => CursorContext::PropertyValue {
                    path,
                    key: key_text.to_owned(),
                },
            };
        }

        // Inside the entry, past the key, but not on a value node:
        // `key: ` with the cursor after the colon.
        if offset > key.span.end {
            return CursorContext::PropertyValue {
                path,
                key: key_text.to_owned(),
            };
        }

        return CursorContext::ObjectKey {
            path,
            existing_keys: sibling_keys(entries, Some(idx)),
            current_key: None,
        };
    }

    // Inside the mapping but between entries: a fresh key slot.
    CursorContext::ObjectKey {
        path,
        existing_keys: sibling_keys(entries, None),
        current_key: None,
    }
}

fn in_sequence(items: &[SyntaxNode], offset: u32, path: Vec<PathSegment>) -> CursorContext {
    for (idx, item) in items.iter().enumerate() {
        if !item.span.contains(offset) {
            continue;
        }
        match &item.content {
            NodeContent::Mapping { .. } | NodeContent::Sequence { .. } => {
                let mut path = path;
                path.push(PathSegment::Index(idx));
                return descend(item, offset, path);
            }
            // On a scalar item: suggestions come from the item schema,
            // same as an empty slot.
            _ => return CursorContext::ArrayItem { path },
        }
    }
    CursorContext::ArrayItem { path }
}

fn sibling_keys(entries: &[SyntaxNode], skip: Option<usize>) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != skip)
        .filter_map(|(_, entry)| entry.entry_key_text().map(str::to_owned))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Span;

    /// `name: demo` followed by an empty line the cursor sits on.
    fn simple_doc() -> SyntaxNode {
        // name: demo\n
        // 0123456789a
        let entry = SyntaxNode::entry(
            SyntaxNode::scalar("name", Span::new(0, 4)),
            Some(SyntaxNode::scalar("demo", Span::new(6, 10))),
            Span::new(0, 10),
        );
        SyntaxNode::mapping(vec![entry], Span::new(0, 11))
    }

    #[test]
    fn offset_outside_root_is_nothing() {
        let doc = simple_doc();
        assert_eq!(context_at(&doc, 42), CursorContext::Nothing);
    }

    #[test]
    fn cursor_on_key_reports_object_key_with_current() {
        let doc = simple_doc();
        match context_at(&doc, 2) {
            CursorContext::ObjectKey {
                path,
                existing_keys,
                current_key,
            } => {
                assert!(path.is_empty());
                assert!(existing_keys.is_empty());
                assert_eq!(current_key.as_deref(), Some("name"));
            }
            other => panic!("expected ObjectKey, got {other:?}"),
        }
    }

    #[test]
    fn cursor_on_value_reports_property_value() {
        let doc = simple_doc();
        assert_eq!(
            context_at(&doc, 8),
            CursorContext::PropertyValue {
                path: vec![],
                key: "name".into()
            }
        );
    }

    #[test]
    fn cursor_after_colon_without_value_is_property_value() {
        // kind: |
        let entry = SyntaxNode::entry(
            SyntaxNode::scalar("kind", Span::new(0, 4)),
            None,
            Span::new(0, 6),
        );
        let doc = SyntaxNode::mapping(vec![entry], Span::new(0, 6));
        assert_eq!(
            context_at(&doc, 6),
            CursorContext::PropertyValue {
                path: vec![],
                key: "kind".into()
            }
        );
    }

    #[test]
    fn cursor_in_blank_space_lists_existing_siblings() {
        let doc = simple_doc();
        match context_at(&doc, 11) {
            CursorContext::ObjectKey {
                existing_keys,
                current_key,
                ..
            } => {
                assert_eq!(existing_keys, vec!["name".to_owned()]);
                assert_eq!(current_key, None);
            }
            other => panic!("expected ObjectKey, got {other:?}"),
        }
    }

    #[test]
    fn nested_mapping_accumulates_path() {
        // spec:\n  containers:\n    - image: x\n
        // offsets are synthetic but internally consistent
        let image_entry = SyntaxNode::entry(
            SyntaxNode::scalar("image", Span::new(24, 29)),
            Some(SyntaxNode::scalar("x", Span::new(31, 32))),
            Span::new(24, 32),
        );
        let item = SyntaxNode::mapping(vec![image_entry], Span::new(24, 32));
        let seq = SyntaxNode::sequence(vec![item], Span::new(22, 33));
        let containers = SyntaxNode::entry(
            SyntaxNode::scalar("containers", Span::new(8, 18)),
            Some(seq),
            Span::new(8, 33),
        );
        let spec_map = SyntaxNode::mapping(vec![containers], Span::new(8, 33));
        let spec = SyntaxNode::entry(
            SyntaxNode::scalar("spec", Span::new(0, 4)),
            Some(spec_map),
            Span::new(0, 33),
        );
        let doc = SyntaxNode::mapping(vec![spec], Span::new(0, 34));

        match context_at(&doc, 26) {
            CursorContext::ObjectKey { path, .. } => {
                assert_eq!(
                    path,
                    vec![
                        PathSegment::Key("spec".into()),
                        PathSegment::Key("containers".into()),
                        PathSegment::Index(0),
                    ]
                );
            }
            other => panic!("expected ObjectKey, got {other:?}"),
        }
    }

    #[test]
    fn sequence_slot_between_items() {
        let item = SyntaxNode::scalar("a", Span::new(10, 11));
        let seq = SyntaxNode::sequence(vec![item], Span::new(8, 14));
        let entry = SyntaxNode::entry(
            SyntaxNode::scalar("args", Span::new(0, 4)),
            Some(seq),
            Span::new(0, 14),
        );
        let doc = SyntaxNode::mapping(vec![entry], Span::new(0, 14));

        assert_eq!(
            context_at(&doc, 13),
            CursorContext::ArrayItem {
                path: vec![PathSegment::Key("args".into())]
            }
        );
    }

    #[test]
    fn scalar_root_is_nothing() {
        let doc = SyntaxNode::scalar("just text", Span::new(0, 9));
        assert_eq!(context_at(&doc, 3), CursorContext::Nothing);
    }
}
