//! Core domain types for content trees and extracted schemas.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator used in materialized content paths.
pub const PATH_SEPARATOR: char = '/';

// ---------------------------------------------------------------------------
// NodeType
// ---------------------------------------------------------------------------

/// Kind of a content node.
///
/// `category` and `collection` are the structural kinds; every other tag is a
/// document-defining kind and is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Category,
    Collection,
    Other(String),
}

impl NodeType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Category => "category",
            Self::Collection => "collection",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for NodeType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "category" => Self::Category,
            "collection" => Self::Collection,
            _ => Self::Other(tag),
        }
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Other(tag) => tag,
            structural => structural.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ContentNode
// ---------------------------------------------------------------------------

/// A flat, parent-referencing content record as stored by the content repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Opaque unique identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name; must be non-empty and free of [`PATH_SEPARATOR`].
    pub name: String,
    /// Parent node id. `None` marks a root.
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "nodeType")]
    pub node_type: NodeType,
    /// Any further record attributes, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentNode {
    /// Create a node with no extra attributes.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: Option<&str>,
        node_type: NodeType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: parent_id.map(String::from),
            node_type,
            extra: Map::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

// ---------------------------------------------------------------------------
// ExtendedContentNode
// ---------------------------------------------------------------------------

/// A [`ContentNode`] placed in a forest, with its materialized path and children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedContentNode {
    #[serde(flatten)]
    pub node: ContentNode,
    /// Absolute path, e.g. `/Blog/Posts`.
    pub path: String,
    /// Children in input order.
    #[serde(default)]
    pub children: Vec<ExtendedContentNode>,
}

// ---------------------------------------------------------------------------
// MinimalContentNode
// ---------------------------------------------------------------------------

/// Synthetic category node derived from a directory-like path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalContentNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "nodeType")]
    pub node_type: NodeType,
}

impl MinimalContentNode {
    pub fn category(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            node_type: NodeType::Category,
        }
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// A collection schema extracted from module source text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Identifier taken from the module's `UUID:` marker.
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Relative file path (`a/b/c.ts`), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Field definitions as produced by the widget registry.
    #[serde(default)]
    pub fields: Value,
    /// Remaining attributes defined by the schema literal.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Schema {
    /// Schema with only a path set; used by callers that derive categories.
    pub fn at_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }
}
