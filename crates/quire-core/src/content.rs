//! Predicates over the opaque editor document.
//!
//! The engine never interprets note content beyond these two questions.

use serde_json::Value;

/// Object-storage paths referenced by a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageRefs {
    pub images: Vec<String>,
    pub files: Vec<String>,
}

impl StorageRefs {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.files.is_empty()
    }
}

/// Content questions answered by the editor layer
pub trait ContentPredicates {
    /// True when the document holds nothing worth keeping
    fn is_empty(&self, content: &str) -> bool;

    /// Binary assets the document points at
    fn extract_storage_references(&self, content: &str) -> StorageRefs;
}

/// Predicates for the editor's JSON document tree.
///
/// Content that is not JSON is treated as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentContent;

impl DocumentContent {
    /// Readable text of a document, one line per block. Plain text passes through.
    pub fn plain_text(content: &str) -> String {
        match serde_json::from_str::<Value>(content) {
            Ok(doc @ Value::Object(_)) => {
                let mut lines = Vec::new();
                collect_text(&doc, &mut lines);
                lines.join("\n")
            }
            _ => content.to_string(),
        }
    }
}

const IMAGE_NODE: &str = "image";
const FILE_NODES: [&str; 2] = ["fileAttachment", "pdf"];

impl ContentPredicates for DocumentContent {
    fn is_empty(&self, content: &str) -> bool {
        if content.trim().is_empty() {
            return true;
        }
        match serde_json::from_str::<Value>(content) {
            Ok(doc @ Value::Object(_)) => !has_substance(&doc),
            _ => false,
        }
    }

    fn extract_storage_references(&self, content: &str) -> StorageRefs {
        let mut refs = StorageRefs::default();
        if let Ok(doc) = serde_json::from_str::<Value>(content) {
            collect_refs(&doc, &mut refs);
        }
        refs
    }
}

fn node_type(node: &Value) -> Option<&str> {
    node.get("type").and_then(Value::as_str)
}

fn children(node: &Value) -> impl Iterator<Item = &Value> {
    node.get("content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn has_substance(node: &Value) -> bool {
    match node_type(node) {
        Some("text") => node
            .get("text")
            .and_then(Value::as_str)
            .is_some_and(|text| !text.trim().is_empty()),
        Some(kind) if kind == IMAGE_NODE || FILE_NODES.contains(&kind) => true,
        _ => children(node).any(has_substance),
    }
}

fn collect_text(node: &Value, lines: &mut Vec<String>) {
    if node_type(node) == Some("text") {
        if let Some(text) = node.get("text").and_then(Value::as_str) {
            match lines.last_mut() {
                Some(line) => line.push_str(text),
                None => lines.push(text.to_string()),
            }
        }
        return;
    }
    let is_block = children(node).next().is_some() && node_type(node) != Some("doc");
    if is_block && !matches!(lines.last(), Some(line) if line.is_empty()) {
        lines.push(String::new());
    }
    for child in children(node) {
        collect_text(child, lines);
    }
}

fn attr_source(node: &Value) -> Option<String> {
    let attrs = node.get("attrs")?;
    attrs
        .get("src")
        .or_else(|| attrs.get("url"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(ToString::to_string)
}

fn collect_refs(node: &Value, refs: &mut StorageRefs) {
    match node_type(node) {
        Some(IMAGE_NODE) => refs.images.extend(attr_source(node)),
        Some(kind) if FILE_NODES.contains(&kind) => refs.files.extend(attr_source(node)),
        _ => {}
    }
    for child in children(node) {
        collect_refs(child, refs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EMPTY_DOC: &str = r#"{"type":"doc","content":[{"type":"paragraph"}]}"#;

    #[test]
    fn blank_and_empty_documents_are_empty() {
        let predicates = DocumentContent;
        assert!(predicates.is_empty(""));
        assert!(predicates.is_empty("   \n"));
        assert!(predicates.is_empty(EMPTY_DOC));
        assert!(predicates.is_empty(
            r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"  "}]}]}"#
        ));
    }

    #[test]
    fn plain_text_joins_blocks() {
        let doc = r#"{"type":"doc","content":[
            {"type":"paragraph","content":[{"type":"text","text":"Hello "},{"type":"text","text":"there"}]},
            {"type":"paragraph","content":[{"type":"text","text":"second"}]}
        ]}"#;
        assert_eq!(DocumentContent::plain_text(doc), "Hello there\nsecond");
        assert_eq!(DocumentContent::plain_text("just text"), "just text");
    }

    #[test]
    fn text_or_media_makes_a_document_non_empty() {
        let predicates = DocumentContent;
        assert!(!predicates.is_empty("plain words"));
        assert!(!predicates.is_empty(
            r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"hi"}]}]}"#
        ));
        assert!(!predicates.is_empty(
            r#"{"type":"doc","content":[{"type":"image","attrs":{"src":"u1/a.png"}}]}"#
        ));
    }

    #[test]
    fn storage_references_are_collected_from_nested_nodes() {
        let doc = r#"{"type":"doc","content":[
            {"type":"image","attrs":{"src":"u1/a.png"}},
            {"type":"blockquote","content":[{"type":"image","attrs":{"src":"u1/b.png"}}]},
            {"type":"pdf","attrs":{"src":"u1/c.pdf"}},
            {"type":"fileAttachment","attrs":{"url":"u1/d.zip"}},
            {"type":"image","attrs":{"src":""}}
        ]}"#;
        let refs = DocumentContent.extract_storage_references(doc);
        assert_eq!(refs.images, vec!["u1/a.png", "u1/b.png"]);
        assert_eq!(refs.files, vec!["u1/c.pdf", "u1/d.zip"]);
    }

    #[test]
    fn plain_text_has_no_storage_references() {
        assert!(DocumentContent
            .extract_storage_references("just text")
            .is_empty());
    }
}
