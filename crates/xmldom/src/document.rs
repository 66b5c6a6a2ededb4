//! Document anchor: creation index and URI

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{DocumentData, NodeId, NodeKind};

impl DomArena {
    pub fn document(&self, doc: NodeId) -> Result<&DocumentData> {
        let node = self.get(doc)?;
        node.as_document()
            .ok_or_else(|| DomError::invalid_type("Document", node.node_type()))
    }

    pub fn document_uri(&self, doc: NodeId) -> Result<Option<&str>> {
        Ok(self.document(doc)?.uri.as_deref())
    }

    pub fn set_document_uri(&mut self, doc: NodeId, uri: Option<&str>) -> Result<()> {
        match &mut self.get_mut(doc)?.kind {
            NodeKind::Document(data) => {
                data.uri = uri.map(str::to_string);
                Ok(())
            }
            other => Err(DomError::invalid_type("Document", other.node_type())),
        }
    }

    /// Process-wide creation order of the document
    pub fn document_index(&self, doc: NodeId) -> Result<u64> {
        Ok(self.document(doc)?.index)
    }

    /// The document a node belongs to; `None` for detached trees
    pub fn owner_document(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        let root = self.root(node_id)?;
        Ok(self.get(root)?.is_document().then_some(root))
    }

    /// First element child of a document
    pub fn document_element(&self, doc: NodeId) -> Result<Option<NodeId>> {
        for &child in &self.document(doc)?.children {
            if self.get(child)?.is_element() {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_uri() {
        let mut arena = DomArena::new();
        let doc = arena.create_document(Some("http://h/doc.xml")).unwrap();
        assert_eq!(arena.document_uri(doc).unwrap(), Some("http://h/doc.xml"));

        arena.set_document_uri(doc, None).unwrap();
        assert_eq!(arena.document_uri(doc).unwrap(), None);
    }

    #[test]
    fn test_document_accessors_reject_elements() {
        let mut arena = DomArena::new();
        let el = arena.create_element(None, "a").unwrap();
        assert!(matches!(
            arena.document_index(el),
            Err(DomError::InvalidNodeType { .. })
        ));
        assert!(arena.set_document_uri(el, Some("x")).is_err());
    }

    #[test]
    fn test_owner_document() {
        let mut arena = DomArena::new();
        let doc = arena.create_document(None).unwrap();
        let comment = arena.create_comment("lead").unwrap();
        let root = arena.create_element(None, "root").unwrap();
        let detached = arena.create_element(None, "loose").unwrap();
        arena.append_child(doc, comment).unwrap();
        arena.append_child(doc, root).unwrap();

        assert_eq!(arena.owner_document(root).unwrap(), Some(doc));
        assert_eq!(arena.owner_document(doc).unwrap(), Some(doc));
        assert_eq!(arena.owner_document(detached).unwrap(), None);
        assert_eq!(arena.document_element(doc).unwrap(), Some(root));
    }
}
