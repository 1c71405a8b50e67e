//! Completion-time view of an open document.

use lsp_types::Position;

/// An open YAML document: its URI (used for schema association) and its
/// current text.
pub struct Document {
    uri: String,
    text: String,
}

impl Document {
    pub fn new(uri: impl Into<String>, text: impl Into<String>) -> Self {
        Document {
            uri: uri.into(),
            text: text.into(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of an LSP position, or `None` when the line does not
    /// exist. A character beyond the end of its line clamps to the line
    /// end, matching how editors send positions for trailing cursors.
    pub fn position_to_offset(&self, position: Position) -> Option<u32> {
        let mut offset = 0usize;
        for (index, line) in self.text.split('\n').enumerate() {
            if index as u32 == position.line {
                let column = (position.character as usize).min(line.len());
                return Some((offset + column) as u32);
            }
            offset += line.len() + 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_within_line() {
        let doc = Document::new("file:///a.yml", "name: demo\nkind: Pod\n");
        assert_eq!(doc.position_to_offset(Position::new(0, 6)), Some(6));
        assert_eq!(doc.position_to_offset(Position::new(1, 0)), Some(11));
        assert_eq!(doc.position_to_offset(Position::new(1, 9)), Some(20));
    }

    #[test]
    fn character_clamps_to_line_end() {
        let doc = Document::new("file:///a.yml", "ab\ncd");
        assert_eq!(doc.position_to_offset(Position::new(0, 99)), Some(2));
    }

    #[test]
    fn line_past_end_of_document() {
        let doc = Document::new("file:///a.yml", "ab\ncd");
        assert_eq!(doc.position_to_offset(Position::new(5, 0)), None);
    }

    #[test]
    fn empty_document_origin() {
        let doc = Document::new("file:///a.yml", "");
        assert_eq!(doc.position_to_offset(Position::new(0, 0)), Some(0));
    }
}
