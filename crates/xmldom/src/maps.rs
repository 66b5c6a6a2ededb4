//! Ordered node maps owned by elements
//!
//! ```text
//! AttributeMap: (namespace, local) → NodeId
//! NamespaceMap: prefix             → NodeId
//! ```
//!
//! Both are insertion ordered. Replacing the node under an existing key keeps
//! the key where it was, which serializers rely on to reproduce attribute and
//! declaration order.

use crate::types::NodeId;
use ahash::RandomState;
use indexmap::{Equivalent, IndexMap};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Attribute key: expanded name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrKey {
    pub namespace: Option<String>,
    pub local: String,
}

impl AttrKey {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
        }
    }
}

// Must hash exactly like `AttrKeyRef`.
impl Hash for AttrKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.as_deref().hash(state);
        self.local.as_str().hash(state);
    }
}

/// Borrowed form of `AttrKey` for allocation-free lookups
struct AttrKeyRef<'a> {
    namespace: Option<&'a str>,
    local: &'a str,
}

impl Hash for AttrKeyRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local.hash(state);
    }
}

impl Equivalent<AttrKey> for AttrKeyRef<'_> {
    fn equivalent(&self, key: &AttrKey) -> bool {
        self.namespace == key.namespace.as_deref() && self.local == key.local
    }
}

/// Borrowed prefix; `Option<&str>` hashes like `Option<String>`
struct PrefixRef<'a>(Option<&'a str>);

impl Hash for PrefixRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Equivalent<Option<String>> for PrefixRef<'_> {
    fn equivalent(&self, key: &Option<String>) -> bool {
        self.0 == key.as_deref()
    }
}

/// Attributes of one element, keyed by expanded name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeMap {
    #[serde(with = "indexmap::map::serde_seq")]
    entries: IndexMap<AttrKey, NodeId, RandomState>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, namespace: Option<&str>, local: &str) -> Option<NodeId> {
        self.entries
            .get(&AttrKeyRef { namespace, local })
            .copied()
    }

    pub fn contains(&self, namespace: Option<&str>, local: &str) -> bool {
        self.get(namespace, local).is_some()
    }

    /// Insert or replace, returning the previous occupant.
    ///
    /// A replaced key keeps its position.
    pub fn set(&mut self, key: AttrKey, node: NodeId) -> Option<NodeId> {
        self.entries.insert(key, node)
    }

    /// Remove an entry; the remaining entries keep their relative order.
    pub fn remove(&mut self, namespace: Option<&str>, local: &str) -> Option<NodeId> {
        self.entries
            .shift_remove(&AttrKeyRef { namespace, local })
    }

    /// Position of a key in iteration order
    pub fn position(&self, namespace: Option<&str>, local: &str) -> Option<usize> {
        self.entries
            .get_index_of(&AttrKeyRef { namespace, local })
    }

    /// Attribute nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.values().copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AttrKey> + '_ {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Namespace declarations of one element (or an in-scope snapshot), keyed
/// by prefix. `None` is the default-namespace slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamespaceMap {
    #[serde(with = "indexmap::map::serde_seq")]
    entries: IndexMap<Option<String>, NodeId, RandomState>,
}

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, prefix: Option<&str>) -> Option<NodeId> {
        self.entries.get(&PrefixRef(prefix)).copied()
    }

    pub fn contains(&self, prefix: Option<&str>) -> bool {
        self.get(prefix).is_some()
    }

    /// Insert or replace, returning the previous occupant.
    ///
    /// A replaced prefix keeps its position.
    pub fn set(&mut self, prefix: Option<String>, node: NodeId) -> Option<NodeId> {
        self.entries.insert(prefix, node)
    }

    pub fn remove(&mut self, prefix: Option<&str>) -> Option<NodeId> {
        self.entries.shift_remove(&PrefixRef(prefix))
    }

    pub fn position(&self, prefix: Option<&str>) -> Option<usize> {
        self.entries.get_index_of(&PrefixRef(prefix))
    }

    /// Namespace nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.values().copied()
    }

    pub fn prefixes(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.entries.keys().map(|prefix| prefix.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
