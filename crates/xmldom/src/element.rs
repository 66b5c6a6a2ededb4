//! Element operations: attributes, namespace declarations, in-scope
//! namespaces and names.
//!
//! Attribute and namespace nodes have exactly one owner at a time. Moving
//! one into another element's map takes it out of the old map in the same
//! call, so the owner recorded on the node and the map holding it always
//! agree.

use crate::arena::{lost_from_parent, DomArena, XML_NAMESPACE_NODE};
use crate::error::{DomError, Result};
use crate::maps::{AttrKey, AttributeMap, NamespaceMap};
use crate::types::{AttrData, ElementData, NamespaceData, NodeId, NodeKind, XML_PREFIX};
use crate::utils::join_qname;

impl DomArena {
    pub fn element(&self, node_id: NodeId) -> Result<&ElementData> {
        let node = self.get(node_id)?;
        node.as_element()
            .ok_or_else(|| DomError::invalid_type("Element", node.node_type()))
    }

    fn element_mut(&mut self, node_id: NodeId) -> Result<&mut ElementData> {
        match &mut self.get_mut(node_id)?.kind {
            NodeKind::Element(element) => Ok(element),
            other => Err(DomError::invalid_type("Element", other.node_type())),
        }
    }

    pub fn attribute(&self, node_id: NodeId) -> Result<&AttrData> {
        let node = self.get(node_id)?;
        node.as_attribute()
            .ok_or_else(|| DomError::invalid_type("Attribute", node.node_type()))
    }

    pub fn namespace(&self, node_id: NodeId) -> Result<&NamespaceData> {
        let node = self.get(node_id)?;
        node.as_namespace()
            .ok_or_else(|| DomError::invalid_type("Namespace", node.node_type()))
    }

    /// The element's own attribute map
    pub fn attributes(&self, element: NodeId) -> Result<&AttributeMap> {
        Ok(&self.element(element)?.attributes)
    }

    /// The element's own namespace declarations
    pub fn namespaces(&self, element: NodeId) -> Result<&NamespaceMap> {
        Ok(&self.element(element)?.namespaces)
    }

    /// `(namespace URI, local name)`
    pub fn expanded_name(&self, element: NodeId) -> Result<(Option<&str>, &str)> {
        let data = self.element(element)?;
        Ok((data.namespace_uri.as_deref(), data.local_name.as_str()))
    }

    pub fn prefix(&self, element: NodeId) -> Result<Option<&str>> {
        Ok(self.element(element)?.prefix())
    }

    /// Rebuild the qualified name with a new prefix
    pub fn set_prefix(&mut self, element: NodeId, prefix: Option<&str>) -> Result<()> {
        let data = self.element_mut(element)?;
        let qualified_name = join_qname(prefix, &data.local_name);
        if prefix.is_some() && data.namespace_uri.is_none() {
            return Err(DomError::NamespaceConstraint { qualified_name });
        }
        data.qualified_name = qualified_name;
        Ok(())
    }

    /// One-line summary: name and namespace/attribute/child counts
    pub fn describe(&self, element: NodeId) -> Result<String> {
        let data = self.element(element)?;
        Ok(format!(
            "<Element {}: name '{}', {} namespaces, {} attributes, {} children>",
            element,
            data.qualified_name,
            data.namespaces.len(),
            data.attributes.len(),
            data.children.len()
        ))
    }

    // -- namespace declarations ---------------------------------------------

    /// Declare `prefix` → `uri` on the element, replacing any declaration
    /// of the same prefix
    pub fn add_namespace(
        &mut self,
        element: NodeId,
        prefix: Option<&str>,
        uri: &str,
    ) -> Result<NodeId> {
        self.element(element)?;
        let ns = self.create_namespace(prefix, uri)?;
        match self.set_namespace(element, ns) {
            Ok(_) => Ok(ns),
            Err(e) => {
                self.release(ns)?;
                Err(e)
            }
        }
    }

    /// Insert a namespace node, taking it from its previous owner.
    /// Returns the declaration it replaced, which is left without an owner.
    pub fn set_namespace(&mut self, element: NodeId, ns: NodeId) -> Result<Option<NodeId>> {
        if ns == XML_NAMESPACE_NODE {
            return Err(DomError::HierarchyRequest(
                "the built-in xml namespace declaration cannot be owned".to_string(),
            ));
        }
        self.element(element)?;
        let node = self.get(ns)?;
        let prefix = self.namespace(ns)?.prefix.clone();

        let previous_owner = node.parent;
        if let Some(owner) = previous_owner {
            if self.element(owner)?.namespaces.get(prefix.as_deref()) != Some(ns) {
                return Err(lost_from_parent(ns, owner));
            }
            if owner != element {
                self.element_mut(owner)?.namespaces.remove(prefix.as_deref());
            }
        }

        let replaced = self.element_mut(element)?.namespaces.set(prefix, ns);
        self.get_mut(ns)?.parent = Some(element);

        let replaced = replaced.filter(|&old| old != ns);
        if let Some(old) = replaced {
            self.get_mut(old)?.parent = None;
        }
        tracing::debug!("Namespace {} now declared on {} (replaced {:?})", ns, element, replaced);
        Ok(replaced)
    }

    /// Remove the declaration of `prefix`, leaving it without an owner
    pub fn remove_namespace(
        &mut self,
        element: NodeId,
        prefix: Option<&str>,
    ) -> Result<Option<NodeId>> {
        let removed = self.element_mut(element)?.namespaces.remove(prefix);
        if let Some(ns) = removed {
            self.get_mut(ns)?.parent = None;
        }
        Ok(removed)
    }

    // -- attributes -----------------------------------------------------------

    /// Create an attribute and insert it, replacing any attribute with the
    /// same expanded name
    pub fn add_attribute(
        &mut self,
        element: NodeId,
        namespace_uri: Option<&str>,
        qualified_name: &str,
        local_name: &str,
        value: &str,
    ) -> Result<NodeId> {
        self.element(element)?;
        let attr = self.create_attribute(namespace_uri, qualified_name, local_name, value)?;
        match self.set_attribute(element, attr) {
            Ok(_) => Ok(attr),
            Err(e) => {
                self.release(attr)?;
                Err(e)
            }
        }
    }

    pub fn get_attribute(
        &self,
        element: NodeId,
        namespace_uri: Option<&str>,
        local_name: &str,
    ) -> Result<Option<NodeId>> {
        Ok(self
            .element(element)?
            .attributes
            .get(namespace_uri, local_name))
    }

    /// Value of the attribute with the given expanded name
    pub fn attribute_value(
        &self,
        element: NodeId,
        namespace_uri: Option<&str>,
        local_name: &str,
    ) -> Result<Option<&str>> {
        match self.get_attribute(element, namespace_uri, local_name)? {
            Some(attr) => Ok(Some(self.attribute(attr)?.value.as_str())),
            None => Ok(None),
        }
    }

    pub fn set_attribute_value(&mut self, attr: NodeId, value: &str) -> Result<()> {
        match &mut self.get_mut(attr)?.kind {
            NodeKind::Attribute(data) => {
                data.value = value.to_string();
                Ok(())
            }
            other => Err(DomError::invalid_type("Attribute", other.node_type())),
        }
    }

    /// Insert a pre-built attribute, taking it from its previous owner.
    ///
    /// An attribute with the same expanded name is replaced in place and
    /// left without an owner; it is returned.
    pub fn set_attribute(&mut self, element: NodeId, attr: NodeId) -> Result<Option<NodeId>> {
        self.element(element)?;
        let node = self.get(attr)?;
        let data = self.attribute(attr)?;
        let key = AttrKey::new(data.namespace_uri.as_deref(), &data.local_name);

        let previous_owner = node.parent;
        if let Some(owner) = previous_owner {
            let listed = self
                .element(owner)?
                .attributes
                .get(key.namespace.as_deref(), &key.local);
            if listed != Some(attr) {
                return Err(lost_from_parent(attr, owner));
            }
            if owner != element {
                self.element_mut(owner)?
                    .attributes
                    .remove(key.namespace.as_deref(), &key.local);
            }
        }

        let replaced = self.element_mut(element)?.attributes.set(key, attr);
        self.get_mut(attr)?.parent = Some(element);

        let replaced = replaced.filter(|&old| old != attr);
        if let Some(old) = replaced {
            self.get_mut(old)?.parent = None;
        }
        tracing::debug!("Attribute {} now owned by {} (replaced {:?})", attr, element, replaced);
        Ok(replaced)
    }

    /// Remove an attribute by expanded name, leaving it without an owner
    pub fn remove_attribute(
        &mut self,
        element: NodeId,
        namespace_uri: Option<&str>,
        local_name: &str,
    ) -> Result<Option<NodeId>> {
        let removed = self
            .element_mut(element)?
            .attributes
            .remove(namespace_uri, local_name);
        if let Some(attr) = removed {
            self.get_mut(attr)?.parent = None;
        }
        Ok(removed)
    }

    // -- in-scope namespaces --------------------------------------------------

    /// Prefix bindings visible at `element`
    ///
    /// Starts from the fixed `xml` binding, then walks the element and its
    /// element ancestors; the closest declaration of a prefix wins.
    ///
    /// An empty default-namespace declaration (`xmlns=""`) is skipped, not
    /// recorded: the default slot stays open and a default declared further
    /// up still fills it. Only the default prefix is skipped this way; an
    /// empty value on any other prefix is an ordinary binding.
    ///
    /// The result is a new map; the nodes in it stay owned by the elements
    /// that declare them.
    pub fn inscope_namespaces(&self, element: NodeId) -> Result<NamespaceMap> {
        self.element(element)?;

        let mut inscope = NamespaceMap::new();
        inscope.set(Some(XML_PREFIX.to_string()), XML_NAMESPACE_NODE);

        let mut current = Some(element);
        while let Some(id) = current {
            let node = self.get(id)?;
            let Some(data) = node.as_element() else {
                break;
            };
            for decl in data.namespaces.iter() {
                let ns = self.namespace(decl)?;
                if ns.prefix.is_none() && ns.value.is_empty() {
                    continue;
                }
                if !inscope.contains(ns.prefix.as_deref()) {
                    inscope.set(ns.prefix.clone(), decl);
                }
            }
            current = node.parent;
        }

        tracing::trace!("{} has {} in-scope namespaces", element, inscope.len());
        Ok(inscope)
    }

    /// Namespace URI bound to `prefix` at `element`
    pub fn lookup_namespace(&self, element: NodeId, prefix: Option<&str>) -> Result<Option<&str>> {
        match self.inscope_namespaces(element)?.get(prefix) {
            Some(decl) => Ok(Some(self.namespace(decl)?.value.as_str())),
            None => Ok(None),
        }
    }
}
