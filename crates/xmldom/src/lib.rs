//! XML Document Tree Core
//!
//! The in-memory tree shared by parsers, serializers and query engines:
//! node identity and ownership, elements with their attribute and namespace
//! maps, in-scope namespace resolution, `xml:base` resolution and document
//! order across trees.
//!
//! ## Philosophy
//!
//! - **Data structures first**: one arena owns every node, everything else is an id
//! - **No ownership cycles**: parents are ids, not references
//! - **Misses are values**: absent attributes, undefined base URIs and
//!   unorderable nodes come back as `None`, not as errors
//!
//! ## Core Design
//!
//! ```text
//! builder ──create_*/append_child/add_*──▶ DomArena ◀──root/base_uri/compare_order── readers
//!                                             │
//!                                        NodeId (u32)
//! ```

pub mod arena;
pub mod document;
pub mod element;
pub mod error;
pub mod maps;
pub mod node;
pub mod types;
pub mod uri;
pub mod utils;

pub use arena::{ArenaConfig, DomArena};
pub use error::{DomError, Result};
pub use maps::{AttrKey, AttributeMap, NamespaceMap};
pub use types::*;
pub use uri::{UriResolver, UrlResolver};
