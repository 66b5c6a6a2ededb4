//! Generic node operations: ancestry, siblings, XML Base and document order
//!
//! All of these are upward walks over parent ids. None of them recurse, so
//! tree depth only costs time, never stack.

use crate::arena::{lost_from_parent, DomArena};
use crate::error::{DomError, Result};
use crate::types::{NodeId, NodeKind, XML_NAMESPACE};
use crate::uri::{UriResolver, UrlResolver};
use std::cmp::Ordering;

/// Position of a node inside its parent: namespace declarations sort
/// before attributes, attributes before children.
type SiblingRank = (u8, usize);

/// Sort key equivalent to `compare_order`
struct OrderKey {
    doc_index: Option<u64>,
    top: NodeId,
    path: Vec<SiblingRank>,
}

impl DomArena {
    pub fn parent(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.parent)
    }

    /// Parent, then grandparent, up to the top of the tree
    pub fn ancestors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let first = self.get(node_id).ok().and_then(|node| node.parent);
        std::iter::successors(first, move |&id| self.get(id).ok().and_then(|node| node.parent))
    }

    /// Topmost node of the tree: the Document, or the top of a detached
    /// subtree.
    pub fn root(&self, node_id: NodeId) -> Result<NodeId> {
        Ok(self.top_and_depth(node_id)?.0)
    }

    fn top_and_depth(&self, node_id: NodeId) -> Result<(NodeId, usize)> {
        let mut top = node_id;
        let mut depth = 0;
        while let Some(parent) = self.get(top)?.parent {
            top = parent;
            depth += 1;
        }
        Ok((top, depth))
    }

    fn required_parent(&self, node_id: NodeId) -> Result<NodeId> {
        self.get(node_id)?.parent.ok_or_else(|| {
            DomError::InternalInconsistency(format!("{} lost its parent during a walk", node_id))
        })
    }

    pub fn preceding_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        let Some((siblings, position)) = self.child_slot(node_id)? else {
            return Ok(None);
        };
        Ok(position.checked_sub(1).map(|index| siblings[index]))
    }

    pub fn following_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        let Some((siblings, position)) = self.child_slot(node_id)? else {
            return Ok(None);
        };
        Ok(siblings.get(position + 1).copied())
    }

    /// The parent's child sequence and this node's index in it. Attributes
    /// and namespace declarations are not part of any child sequence.
    fn child_slot(&self, node_id: NodeId) -> Result<Option<(&[NodeId], usize)>> {
        let node = self.get(node_id)?;
        let Some(parent) = node.parent else {
            return Ok(None);
        };
        if matches!(node.kind, NodeKind::Attribute(_) | NodeKind::Namespace(_)) {
            return Ok(None);
        }
        let siblings = self.get(parent)?.children();
        let position = siblings
            .iter()
            .position(|&id| id == node_id)
            .ok_or_else(|| lost_from_parent(node_id, parent))?;
        Ok(Some((siblings, position)))
    }

    /// Effective base URI per XML Base, or `None` when undefined
    pub fn base_uri(&self, node_id: NodeId) -> Result<Option<String>> {
        self.base_uri_with(node_id, &UrlResolver)
    }

    /// `base_uri` with a caller-supplied URI resolver
    ///
    /// Walks upwards collecting relative `xml:base` values until an absolute
    /// one (or the document URI) is found, then resolves the collected values
    /// onto it from the outermost inwards.
    pub fn base_uri_with<R>(&self, node_id: NodeId, resolver: &R) -> Result<Option<String>>
    where
        R: UriResolver + ?Sized,
    {
        let mut pending: Vec<&str> = Vec::new();
        let mut current = self.get(node_id)?;

        while let Some(parent) = current.parent {
            if let NodeKind::Element(element) = &current.kind {
                if let Some(attr) = element.attributes.get(Some(XML_NAMESPACE), "base") {
                    let value = self.attribute(attr)?.value.as_str();
                    if resolver.is_absolute(value) {
                        return Ok(resolve_pending(resolver, value, &pending));
                    }
                    pending.push(value);
                }
            }
            current = self.get(parent)?;
        }

        let base = match &current.kind {
            NodeKind::Document(doc) => doc
                .uri
                .as_deref()
                .filter(|uri| resolver.is_absolute(uri)),
            _ => None,
        };
        Ok(base.and_then(|base| resolve_pending(resolver, base, &pending)))
    }

    /// Document order of `a` relative to `b`
    ///
    /// `Some(Equal)` only when `a` and `b` are the same node. `None` means
    /// the nodes have no orderable common root: different trees where at
    /// least one is not rooted in a Document. Separate documents order by
    /// creation index.
    pub fn compare_order(&self, a: NodeId, b: NodeId) -> Result<Option<Ordering>> {
        if a == b {
            self.get(a)?;
            return Ok(Some(Ordering::Equal));
        }

        let (top_a, depth_a) = self.top_and_depth(a)?;
        let (top_b, depth_b) = self.top_and_depth(b)?;

        if top_a != top_b {
            let order = match (self.get(top_a)?.as_document(), self.get(top_b)?.as_document()) {
                (Some(doc_a), Some(doc_b)) => {
                    Some((doc_a.index, top_a.as_u32()).cmp(&(doc_b.index, top_b.as_u32())))
                }
                _ => None,
            };
            tracing::trace!("Cross-tree order of {} and {}: {:?}", a, b, order);
            return Ok(order);
        }

        // one of them is the top itself, which precedes everything under it
        if depth_a == 0 || depth_b == 0 {
            return Ok(Some(depth_a.cmp(&depth_b)));
        }

        let (mut a, mut b) = (a, b);
        for _ in depth_b..depth_a {
            a = self.required_parent(a)?;
        }
        for _ in depth_a..depth_b {
            b = self.required_parent(b)?;
        }
        if a == b {
            // ancestor precedes descendant
            return Ok(Some(depth_a.cmp(&depth_b)));
        }

        loop {
            let parent_a = self.required_parent(a)?;
            let parent_b = self.required_parent(b)?;
            if parent_a == parent_b {
                let rank_a = self.sibling_rank(parent_a, a)?;
                let rank_b = self.sibling_rank(parent_b, b)?;
                return Ok(Some(rank_a.cmp(&rank_b)));
            }
            a = parent_a;
            b = parent_b;
        }
    }

    fn sibling_rank(&self, parent: NodeId, child: NodeId) -> Result<SiblingRank> {
        let container = self.get(parent)?;
        let rank = match (&self.get(child)?.kind, &container.kind) {
            (NodeKind::Namespace(ns), NodeKind::Element(element)) => {
                let prefix = ns.prefix.as_deref();
                element
                    .namespaces
                    .position(prefix)
                    .filter(|_| element.namespaces.get(prefix) == Some(child))
                    .map(|index| (0, index))
            }
            (NodeKind::Attribute(attr), NodeKind::Element(element)) => {
                let (namespace, local) = (attr.namespace_uri.as_deref(), attr.local_name.as_str());
                element
                    .attributes
                    .position(namespace, local)
                    .filter(|_| element.attributes.get(namespace, local) == Some(child))
                    .map(|index| (1, index))
            }
            _ => container
                .children()
                .iter()
                .position(|&id| id == child)
                .map(|index| (2, index)),
        };
        rank.ok_or_else(|| lost_from_parent(child, parent))
    }

    fn order_key(&self, node_id: NodeId) -> Result<OrderKey> {
        let mut path = Vec::new();
        let mut current = node_id;
        while let Some(parent) = self.get(current)?.parent {
            path.push(self.sibling_rank(parent, current)?);
            current = parent;
        }
        path.reverse();
        Ok(OrderKey {
            doc_index: self.get(current)?.as_document().map(|doc| doc.index),
            top: current,
            path,
        })
    }

    /// Sort nodes into document order
    ///
    /// Fails with `UnorderableNodes` when the list mixes trees that
    /// `compare_order` cannot order.
    pub fn sort_document_order(&self, nodes: &mut [NodeId]) -> Result<()> {
        let mut keyed = Vec::with_capacity(nodes.len());
        for &id in nodes.iter() {
            keyed.push((self.order_key(id)?, id));
        }

        if let Some((first, first_id)) = keyed.first() {
            for (key, id) in &keyed[1..] {
                let orderable =
                    key.top == first.top || (key.doc_index.is_some() && first.doc_index.is_some());
                if !orderable {
                    return Err(DomError::UnorderableNodes(*first_id, *id));
                }
            }
        }

        keyed.sort_by(|(a, _), (b, _)| {
            (a.doc_index, a.top.as_u32(), &a.path).cmp(&(b.doc_index, b.top.as_u32(), &b.path))
        });
        for (slot, (_, id)) in nodes.iter_mut().zip(keyed) {
            *slot = id;
        }
        Ok(())
    }
}

fn resolve_pending<R>(resolver: &R, base: &str, pending: &[&str]) -> Option<String>
where
    R: UriResolver + ?Sized,
{
    pending
        .iter()
        .rev()
        .try_fold(base.to_string(), |base, reference| {
            resolver.absolutize(reference, &base)
        })
}
