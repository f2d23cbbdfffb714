//! Category nodes synthesized from schema file paths.

use std::collections::BTreeMap;

use tracing::debug;

use contentkit_shared::{MinimalContentNode, PATH_SEPARATOR, Schema};

/// Derive one category node per directory-like prefix of the schemas' paths.
///
/// `news/tech/post1.md` yields `/news` and `/news/tech`; the leaf segment is
/// never a category. Schemas without a path are skipped. The first node
/// written for a path is kept, so repeated or overlapping input is harmless.
pub fn generate_category_nodes_from_paths(
    schemas: &[Schema],
) -> BTreeMap<String, MinimalContentNode> {
    let mut folders = BTreeMap::new();
    extend_category_nodes(&mut folders, schemas);
    folders
}

/// Add category nodes for `schemas` to an existing map without touching
/// entries already present.
pub fn extend_category_nodes(
    folders: &mut BTreeMap<String, MinimalContentNode>,
    schemas: &[Schema],
) {
    for schema in schemas {
        let Some(path) = schema.path.as_deref() else {
            continue;
        };

        let parts: Vec<&str> = path
            .split(PATH_SEPARATOR)
            .filter(|part| !part.is_empty())
            .collect();
        let Some((_leaf, dirs)) = parts.split_last() else {
            continue;
        };

        let mut prefix = String::new();
        for name in dirs {
            prefix.push(PATH_SEPARATOR);
            prefix.push_str(name);
            folders
                .entry(prefix.clone())
                .or_insert_with(|| MinimalContentNode::category(*name, prefix.clone()));
        }
    }

    debug!(categories = folders.len(), "category nodes derived");
}
