//! Core type definitions for the XML tree
//!
//! Key design principles:
//! 1. Nodes are addressed by a 4-byte `NodeId`, never by pointer
//! 2. Parent links are plain ids, the arena owns everything
//! 3. Use SmallVec for child lists (most elements have <4 children)
//! 4. Attribute and namespace maps always exist, empty until populated

use crate::maps::{AttributeMap, NamespaceMap};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// The namespace bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

pub const XML_PREFIX: &str = "xml";

/// Ordered child list of a container node
pub type ChildList = SmallVec<[NodeId; 4]>;

/// Node identity token (index into arena)
///
/// Ids are handed out once and never reused within an arena, so two handles
/// compare equal exactly when they name the same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw value, for embedding in external handles
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node type tag
///
/// Numbering follows the DOM where the DOM has the kind; namespace nodes
/// only exist in the XPath data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    Comment = 8,
    Document = 9,
    Namespace = 13,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(NodeType::Element),
            2 => Some(NodeType::Attribute),
            3 => Some(NodeType::Text),
            8 => Some(NodeType::Comment),
            9 => Some(NodeType::Document),
            13 => Some(NodeType::Namespace),
            _ => None,
        }
    }

    /// Whether nodes of this type own an ordered child sequence
    pub fn is_container(self) -> bool {
        matches!(self, NodeType::Document | NodeType::Element)
    }
}

/// Root container of a tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentData {
    /// Creation order across all documents in the process
    pub index: u64,
    pub uri: Option<String>,
    pub children: ChildList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementData {
    pub namespace_uri: Option<String>,
    pub local_name: String,
    pub qualified_name: String,
    pub attributes: AttributeMap,
    pub namespaces: NamespaceMap,
    pub children: ChildList,
}

impl ElementData {
    /// Prefix part of the qualified name, if any
    pub fn prefix(&self) -> Option<&str> {
        self.qualified_name
            .split_once(':')
            .map(|(prefix, _)| prefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrData {
    pub namespace_uri: Option<String>,
    pub local_name: String,
    pub qualified_name: String,
    pub value: String,
}

/// A namespace declaration (`xmlns` / `xmlns:p`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceData {
    /// `None` is the default namespace
    pub prefix: Option<String>,
    /// Empty on the default prefix is skipped by in-scope resolution
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    Document(DocumentData),
    Element(ElementData),
    Attribute(AttrData),
    Namespace(NamespaceData),
    Text(String),
    Comment(String),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Document(_) => NodeType::Document,
            NodeKind::Element(_) => NodeType::Element,
            NodeKind::Attribute(_) => NodeType::Attribute,
            NodeKind::Namespace(_) => NodeType::Namespace,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Comment(_) => NodeType::Comment,
        }
    }
}

/// A slot in the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub id: NodeId,
    /// Ownership parent. Attributes and namespace declarations point at
    /// their element; children point at their container.
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl NodeData {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            parent: None,
            kind,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self.kind, NodeKind::Document(_))
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&AttrData> {
        match &self.kind {
            NodeKind::Attribute(attr) => Some(attr),
            _ => None,
        }
    }

    pub fn as_namespace(&self) -> Option<&NamespaceData> {
        match &self.kind {
            NodeKind::Namespace(ns) => Some(ns),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&DocumentData> {
        match &self.kind {
            NodeKind::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Ordered children; empty for leaves
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Document(doc) => &doc.children,
            NodeKind::Element(element) => &element.children,
            _ => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut ChildList> {
        match &mut self.kind {
            NodeKind::Document(doc) => Some(&mut doc.children),
            NodeKind::Element(element) => Some(&mut element.children),
            _ => None,
        }
    }

    /// String value of leaves, attributes and namespace declarations
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Attribute(attr) => Some(&attr.value),
            NodeKind::Namespace(ns) => Some(&ns.value),
            NodeKind::Text(text) | NodeKind::Comment(text) => Some(text),
            NodeKind::Document(_) | NodeKind::Element(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_roundtrip() {
        for ty in [
            NodeType::Element,
            NodeType::Attribute,
            NodeType::Text,
            NodeType::Comment,
            NodeType::Document,
            NodeType::Namespace,
        ] {
            assert_eq!(NodeType::from_u8(ty as u8), Some(ty));
        }
        assert_eq!(NodeType::from_u8(4), None);
    }

    #[test]
    fn test_container_types() {
        assert!(NodeType::Document.is_container());
        assert!(NodeType::Element.is_container());
        assert!(!NodeType::Attribute.is_container());
        assert!(!NodeType::Text.is_container());
    }

    #[test]
    fn test_element_prefix() {
        let element = ElementData {
            namespace_uri: Some("urn:a".to_string()),
            local_name: "x".to_string(),
            qualified_name: "p:x".to_string(),
            attributes: AttributeMap::new(),
            namespaces: NamespaceMap::new(),
            children: ChildList::new(),
        };
        assert_eq!(element.prefix(), Some("p"));
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(7).to_string(), "#7");
    }
}
