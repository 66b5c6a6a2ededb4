//! Arena-based XML tree storage
//!
//! Every node of every tree lives in one `Vec`, addressed by `NodeId`.
//! Containers own ordered lists of ids; a node's parent is just another id.
//! The arena is the only real owner, so the parent/child back-references
//! cannot form ownership cycles.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<Option<NodeData>>
//!        [xml ns][Node1][Node2][None][Node4]...
//!                               ↑ released slot, id retired
//! ```
//!
//! Slot 0 holds the built-in declaration of the `xml` prefix, which every
//! in-scope namespace map starts from.

use crate::error::{DomError, Result};
use crate::maps::{AttributeMap, NamespaceMap};
use crate::types::{
    AttrData, ChildList, DocumentData, ElementData, NamespaceData, NodeData, NodeId, NodeKind,
    NodeType, XML_NAMESPACE, XML_PREFIX,
};
use crate::utils::split_qname;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Creation index source shared by all documents in the process
static NEXT_DOCUMENT_INDEX: AtomicU64 = AtomicU64::new(1);

pub(crate) const XML_NAMESPACE_NODE: NodeId = NodeId(0);

/// Id for the slot at `len`; ids are `u32`, so a full arena refuses to
/// hand one out rather than wrap onto a live identity.
fn next_id(len: usize) -> Result<NodeId> {
    u32::try_from(len)
        .map(NodeId)
        .map_err(|_| DomError::ArenaFull(len))
}

/// Configuration for an arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Slots reserved up front
    pub initial_capacity: usize,
    /// Deepest allowed node, counted in parent steps from the tree top
    pub max_depth: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            max_depth: 4096,
        }
    }
}

/// Owner of every node
///
/// Design:
/// - Single Vec for sequential allocation
/// - Ids are never reused, so a stale id fails lookup instead of aliasing
/// - No Rc/RefCell: `&mut DomArena` is the one write path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomArena {
    nodes: Vec<Option<NodeData>>,

    /// Allocated, unreleased nodes (the built-in xml declaration excluded)
    live: usize,

    #[serde(default)]
    config: ArenaConfig,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(ArenaConfig {
            initial_capacity: capacity,
            ..ArenaConfig::default()
        })
    }

    pub fn with_config(config: ArenaConfig) -> Self {
        let mut nodes = Vec::with_capacity(config.initial_capacity.max(1));
        nodes.push(Some(NodeData::new(
            XML_NAMESPACE_NODE,
            NodeKind::Namespace(NamespaceData {
                prefix: Some(XML_PREFIX.to_string()),
                value: XML_NAMESPACE.to_string(),
            }),
        )));
        Self {
            nodes,
            live: 0,
            config,
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// The shared declaration binding `xml` to the XML namespace
    pub fn xml_namespace_node(&self) -> NodeId {
        XML_NAMESPACE_NODE
    }

    fn alloc(&mut self, kind: NodeKind) -> Result<NodeId> {
        let id = next_id(self.nodes.len())?;
        self.nodes.push(Some(NodeData::new(id, kind)));
        self.live += 1;
        Ok(id)
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&NodeData> {
        self.nodes
            .get(node_id.index())
            .and_then(Option::as_ref)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable). Structural fields are only changed through
    /// the arena's own operations.
    pub(crate) fn get_mut(&mut self, node_id: NodeId) -> Result<&mut NodeData> {
        self.nodes
            .get_mut(node_id.index())
            .and_then(Option::as_mut)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.get(node_id).is_ok()
    }

    pub fn node_type(&self, node_id: NodeId) -> Result<NodeType> {
        Ok(self.get(node_id)?.node_type())
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterator over all live nodes
    pub fn iter(&self) -> impl Iterator<Item = &NodeData> {
        self.nodes.iter().skip(1).flatten()
    }

    /// Iterator over all live node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().map(|node| node.id)
    }

    // -- construction -----------------------------------------------------

    /// Create a detached document
    pub fn create_document(&mut self, uri: Option<&str>) -> Result<NodeId> {
        let index = NEXT_DOCUMENT_INDEX.fetch_add(1, Ordering::Relaxed);
        let id = self.alloc(NodeKind::Document(DocumentData {
            index,
            uri: uri.map(str::to_string),
            children: ChildList::new(),
        }))?;
        tracing::debug!("Created document {} (index {}, uri {:?})", id, index, uri);
        Ok(id)
    }

    /// Create a detached element, splitting the prefix off `qualified_name`
    ///
    /// A prefixed name without a namespace fails before anything is
    /// allocated.
    pub fn create_element(
        &mut self,
        namespace_uri: Option<&str>,
        qualified_name: &str,
    ) -> Result<NodeId> {
        let (prefix, local_name) = split_qname(qualified_name);
        if prefix.is_some() && namespace_uri.is_none() {
            return Err(DomError::NamespaceConstraint {
                qualified_name: qualified_name.to_string(),
            });
        }

        self.alloc(NodeKind::Element(ElementData {
            namespace_uri: namespace_uri.map(str::to_string),
            local_name: local_name.to_string(),
            qualified_name: qualified_name.to_string(),
            attributes: AttributeMap::new(),
            namespaces: NamespaceMap::new(),
            children: ChildList::new(),
        }))
    }

    /// Create a detached attribute
    pub fn create_attribute(
        &mut self,
        namespace_uri: Option<&str>,
        qualified_name: &str,
        local_name: &str,
        value: &str,
    ) -> Result<NodeId> {
        self.alloc(NodeKind::Attribute(AttrData {
            namespace_uri: namespace_uri.map(str::to_string),
            local_name: local_name.to_string(),
            qualified_name: qualified_name.to_string(),
            value: value.to_string(),
        }))
    }

    /// Create a detached namespace declaration; `None` is the default prefix
    pub fn create_namespace(&mut self, prefix: Option<&str>, uri: &str) -> Result<NodeId> {
        self.alloc(NodeKind::Namespace(NamespaceData {
            prefix: prefix.map(str::to_string),
            value: uri.to_string(),
        }))
    }

    pub fn create_text(&mut self, value: &str) -> Result<NodeId> {
        self.alloc(NodeKind::Text(value.to_string()))
    }

    pub fn create_comment(&mut self, value: &str) -> Result<NodeId> {
        self.alloc(NodeKind::Comment(value.to_string()))
    }

    // -- containers -------------------------------------------------------

    /// Ordered children of a node (empty for leaves)
    pub fn children(&self, node_id: NodeId) -> Result<&[NodeId]> {
        Ok(self.get(node_id)?.children())
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insertable(parent, child)?;
        self.detach(child)?;
        self.container_mut(parent)?.push(child);
        self.get_mut(child)?.parent = Some(parent);
        tracing::debug!("Appended {} to {}", child, parent);
        Ok(())
    }

    /// Insert `child` into `parent` right before `reference`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<()> {
        let reference_node = self.get(reference)?;
        if matches!(
            reference_node.node_type(),
            NodeType::Attribute | NodeType::Namespace
        ) || reference_node.parent != Some(parent)
        {
            return Err(DomError::HierarchyRequest(format!(
                "reference {} is not a child of {}",
                reference, parent
            )));
        }
        if child == reference {
            return Ok(());
        }
        self.check_insertable(parent, child)?;

        // Everything is validated before the child leaves its old parent.
        let siblings = self.children(parent)?;
        let mut position = siblings
            .iter()
            .position(|&id| id == reference)
            .ok_or_else(|| lost_from_parent(reference, parent))?;
        if siblings[..position].contains(&child) {
            position -= 1;
        }
        self.detach(child)?;
        self.container_mut(parent)?.insert(position, child);
        self.get_mut(child)?.parent = Some(parent);
        tracing::debug!("Inserted {} into {} before {}", child, parent, reference);
        Ok(())
    }

    /// Detach `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let node = self.get(child)?;
        if matches!(node.node_type(), NodeType::Attribute | NodeType::Namespace) {
            return Err(DomError::HierarchyRequest(format!(
                "{} is owned through a map, not the child list",
                child
            )));
        }
        match node.parent {
            Some(owner) if owner == parent => {
                self.detach(child)?;
                tracing::debug!("Removed {} from {}", child, parent);
                Ok(())
            }
            _ => Err(DomError::HierarchyRequest(format!(
                "{} is not a child of {}",
                child, parent
            ))),
        }
    }

    /// Unlink a child from its container, if it has one
    fn detach(&mut self, child: NodeId) -> Result<()> {
        let Some(parent) = self.get(child)?.parent else {
            return Ok(());
        };
        let siblings = self.container_mut(parent)?;
        let position = siblings
            .iter()
            .position(|&id| id == child)
            .ok_or_else(|| lost_from_parent(child, parent))?;
        siblings.remove(position);
        self.get_mut(child)?.parent = None;
        Ok(())
    }

    fn container_mut(&mut self, node_id: NodeId) -> Result<&mut ChildList> {
        let node = self.get_mut(node_id)?;
        let actual = node.node_type();
        node.children_mut()
            .ok_or_else(|| DomError::invalid_type("Document or Element", actual))
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_type = self.node_type(parent)?;
        if !parent_type.is_container() {
            return Err(DomError::invalid_type("Document or Element", parent_type));
        }
        match self.node_type(child)? {
            NodeType::Element | NodeType::Text | NodeType::Comment => {}
            other => {
                return Err(DomError::HierarchyRequest(format!(
                    "{:?} node {} cannot be inserted as a child",
                    other, child
                )))
            }
        }

        let mut depth = 0;
        let mut current = Some(parent);
        while let Some(id) = current {
            if id == child {
                return Err(DomError::HierarchyRequest(format!(
                    "{} is an ancestor of {}",
                    child, parent
                )));
            }
            current = self.get(id)?.parent;
            depth += 1;
        }

        // `depth` now counts the parent itself, i.e. the child's new depth
        let deepest = depth + self.subtree_height(child)?;
        if deepest > self.config.max_depth {
            return Err(DomError::MaxDepthExceeded {
                current: deepest,
                max: self.config.max_depth,
            });
        }
        Ok(())
    }

    /// Longest parent-step distance from `node_id` down to a descendant
    fn subtree_height(&self, node_id: NodeId) -> Result<usize> {
        let mut height = 0;
        let mut stack = vec![(node_id, 0usize)];
        while let Some((id, level)) = stack.pop() {
            height = height.max(level);
            for &child in self.get(id)?.children() {
                stack.push((child, level + 1));
            }
        }
        Ok(height)
    }

    // -- lifecycle --------------------------------------------------------

    /// Destroy a detached node and everything it owns: children, attributes
    /// and namespace declarations. Their ids are retired.
    pub fn release(&mut self, node_id: NodeId) -> Result<()> {
        if node_id == XML_NAMESPACE_NODE {
            return Err(DomError::HierarchyRequest(
                "the built-in xml namespace declaration cannot be released".to_string(),
            ));
        }
        if let Some(parent) = self.get(node_id)?.parent {
            return Err(DomError::HierarchyRequest(format!(
                "{} is still owned by {}",
                node_id, parent
            )));
        }

        let mut released = 0;
        let mut stack = vec![node_id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id.index()).and_then(Option::take) else {
                continue;
            };
            if let NodeKind::Element(element) = &node.kind {
                stack.extend(element.attributes.iter());
                stack.extend(element.namespaces.iter());
            }
            stack.extend(node.children().iter().copied());
            released += 1;
        }
        self.live -= released;
        tracing::debug!("Released {} nodes rooted at {}", released, node_id);
        Ok(())
    }

    // -- traversal --------------------------------------------------------

    /// Traverse children depth-first in document order (iterative)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&NodeData) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children().iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// `start_id` followed by its descendants, in document order
    pub fn descendants(&self, start_id: NodeId) -> Result<Vec<NodeId>> {
        let mut found = Vec::new();
        self.traverse_df(start_id, |node| {
            found.push(node.id);
            Ok(())
        })?;
        Ok(found)
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn lost_from_parent(child: NodeId, parent: NodeId) -> DomError {
    tracing::warn!("{} claims parent {} but is not listed there", child, parent);
    DomError::InternalInconsistency(format!("{} lost from parent {}", child, parent))
}
