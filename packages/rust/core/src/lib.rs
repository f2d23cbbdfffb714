//! Content tree assembly for contentkit.
//!
//! Turns the content repository's flat, parent-referencing node list into a
//! nested forest with materialized paths, flattens it back into a path index,
//! and derives category nodes from schema file paths.

pub mod categories;
pub mod tree;
pub mod validate;

pub use categories::{extend_category_nodes, generate_category_nodes_from_paths};
pub use tree::{
    construct_content_paths, construct_nested_structure, flatten_nested_structure,
    try_construct_nested_structure,
};
pub use validate::{StructureIssue, validate_structure};
