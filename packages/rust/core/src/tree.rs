//! Forest assembly from flat, parent-referencing content nodes.
//!
//! Both directions (nested forest and flat path index) share one traversal:
//! nodes are bucketed by parent in input order, then walked depth-first with
//! an explicit stack so tree depth never turns into call-stack depth.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, instrument};

use contentkit_shared::{ContentKitError, ContentNode, ExtendedContentNode, Result};

use crate::validate::validate_structure;

/// Build a nested forest from a flat node list.
///
/// Roots get `/<name>`; every other reachable node gets `<parent path>/<name>`.
/// Siblings keep their relative input order. Nodes that cannot be reached from
/// a root (dangling `parentId`, cycles) are left out.
#[instrument(skip_all, fields(node_count = nodes.len()))]
pub fn construct_nested_structure(nodes: &[ContentNode]) -> Vec<ExtendedContentNode> {
    let Traversal {
        roots,
        order,
        mut paths,
        mut children,
    } = traverse(nodes);

    // Pre-order puts every child after its parent, so building in reverse
    // order always finds a node's children already assembled.
    let mut built: Vec<Option<ExtendedContentNode>> = vec![None; nodes.len()];
    for &idx in order.iter().rev() {
        let kids = std::mem::take(&mut children[idx])
            .into_iter()
            .filter_map(|child| built[child].take())
            .collect();
        built[idx] = Some(ExtendedContentNode {
            node: nodes[idx].clone(),
            path: paths[idx].take().unwrap_or_default(),
            children: kids,
        });
    }

    let forest: Vec<ExtendedContentNode> =
        roots.iter().filter_map(|&root| built[root].take()).collect();

    debug!(roots = forest.len(), placed = order.len(), "nested structure built");
    forest
}

/// Validate the node list, then build the nested forest.
///
/// Fails with a validation error listing every structural issue found.
pub fn try_construct_nested_structure(nodes: &[ContentNode]) -> Result<Vec<ExtendedContentNode>> {
    validate_structure(nodes).map_err(|issues| {
        let listed = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        ContentKitError::validation(format!(
            "{} structural issue(s): {listed}",
            issues.len()
        ))
    })?;
    Ok(construct_nested_structure(nodes))
}

/// Build a flat index of reachable nodes keyed by their absolute path.
///
/// Values are plain copies of the input nodes. On a duplicate path the node
/// visited last wins; well-formed input never produces one.
#[instrument(skip_all, fields(node_count = nodes.len()))]
pub fn construct_content_paths(nodes: &[ContentNode]) -> BTreeMap<String, ContentNode> {
    let Traversal {
        order, mut paths, ..
    } = traverse(nodes);

    let mut result = BTreeMap::new();
    for idx in order {
        if let Some(path) = paths[idx].take() {
            result.insert(path, nodes[idx].clone());
        }
    }

    debug!(paths = result.len(), "content paths built");
    result
}

/// Flatten a forest back into `(path, node)` pairs in depth-first pre-order.
pub fn flatten_nested_structure(forest: &[ExtendedContentNode]) -> Vec<(String, ContentNode)> {
    let mut flat = Vec::new();
    let mut stack: Vec<&ExtendedContentNode> = forest.iter().rev().collect();

    while let Some(entry) = stack.pop() {
        flat.push((entry.path.clone(), entry.node.clone()));
        stack.extend(entry.children.iter().rev());
    }

    flat
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// Result of walking the forest encoded in a flat node list.
/// All vectors are indexed by position in the input slice.
pub(crate) struct Traversal {
    /// Root indices in input order.
    pub roots: Vec<usize>,
    /// Reachable indices in depth-first pre-order.
    pub order: Vec<usize>,
    /// Materialized path of every reachable node.
    pub paths: Vec<Option<String>>,
    /// Child indices placed under each node, in input order.
    pub children: Vec<Vec<usize>>,
}

/// Group node indices by parent id; `None` is the root bucket.
fn group_by_parent(nodes: &[ContentNode]) -> HashMap<Option<&str>, Vec<usize>> {
    let mut by_parent: HashMap<Option<&str>, Vec<usize>> = HashMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        by_parent
            .entry(node.parent_id.as_deref())
            .or_default()
            .push(idx);
    }
    by_parent
}

/// Walk the forest with an explicit stack, assigning each node a path once.
pub(crate) fn traverse(nodes: &[ContentNode]) -> Traversal {
    let by_parent = group_by_parent(nodes);
    let roots = by_parent.get(&None).cloned().unwrap_or_default();

    let mut paths: Vec<Option<String>> = vec![None; nodes.len()];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());
    let mut stack = Vec::with_capacity(roots.len());

    for &root in roots.iter().rev() {
        paths[root] = Some(format!("/{}", nodes[root].name));
        stack.push(root);
    }

    while let Some(idx) = stack.pop() {
        order.push(idx);

        let Some(bucket) = by_parent.get(&Some(nodes[idx].id.as_str())) else {
            continue;
        };
        let parent_path = paths[idx].clone().unwrap_or_default();

        // Reverse push so the stack pops siblings left to right.
        let mut placed = Vec::with_capacity(bucket.len());
        for &child in bucket.iter().rev() {
            // Already placed: duplicate ids would otherwise revisit a subtree.
            if paths[child].is_some() {
                continue;
            }
            paths[child] = Some(format!("{parent_path}/{}", nodes[child].name));
            stack.push(child);
            placed.push(child);
        }
        placed.reverse();
        children[idx] = placed;
    }

    let omitted = nodes.len() - order.len();
    if omitted > 0 {
        debug!(omitted, "nodes unreachable from any root were skipped");
    }

    Traversal {
        roots,
        order,
        paths,
        children,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use contentkit_shared::NodeType;

    fn node(id: &str, name: &str, parent: Option<&str>) -> ContentNode {
        let kind = if parent.is_none() {
            NodeType::Category
        } else {
            NodeType::Collection
        };
        ContentNode::new(id, name, parent, kind)
    }

    fn blog() -> Vec<ContentNode> {
        vec![node("a", "Blog", None), node("b", "Posts", Some("a"))]
    }

    #[test]
    fn nests_blog_and_posts() {
        let forest = construct_nested_structure(&blog());

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].node.name, "Blog");
        assert_eq!(forest[0].path, "/Blog");
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].node.id, "b");
        assert_eq!(forest[0].children[0].path, "/Blog/Posts");
        assert!(forest[0].children[0].children.is_empty());
    }

    #[test]
    fn flat_paths_for_blog_and_posts() {
        let paths = construct_content_paths(&blog());

        assert_eq!(paths.len(), 2);
        assert_eq!(paths["/Blog"].id, "a");
        assert_eq!(paths["/Blog/Posts"].id, "b");
    }

    #[test]
    fn siblings_keep_input_order() {
        // Unrelated nodes interleaved between the siblings of `root`.
        let nodes = vec![
            node("r", "root", None),
            node("c3", "gamma", Some("r")),
            node("x", "other", None),
            node("c1", "alpha", Some("r")),
            node("x1", "inner", Some("x")),
            node("c2", "beta", Some("r")),
        ];

        let forest = construct_nested_structure(&nodes);
        let names: Vec<&str> = forest[0]
            .children
            .iter()
            .map(|c| c.node.name.as_str())
            .collect();
        assert_eq!(names, ["gamma", "alpha", "beta"]);

        let roots: Vec<&str> = forest.iter().map(|r| r.node.name.as_str()).collect();
        assert_eq!(roots, ["root", "other"]);
    }

    #[test]
    fn children_may_precede_parents_in_input() {
        let nodes = vec![
            node("leaf", "Leaf", Some("mid")),
            node("mid", "Mid", Some("top")),
            node("top", "Top", None),
        ];

        let forest = construct_nested_structure(&nodes);
        assert_eq!(forest[0].children[0].children[0].path, "/Top/Mid/Leaf");
    }

    #[test]
    fn deep_chain_is_walked_iteratively() {
        const DEPTH: usize = 2_000;
        let mut nodes = vec![node("n0", "n0", None)];
        for i in 1..DEPTH {
            let parent = format!("n{}", i - 1);
            nodes.push(node(&format!("n{i}"), &format!("n{i}"), Some(&parent)));
        }

        let paths = construct_content_paths(&nodes);
        assert_eq!(paths.len(), DEPTH);

        let forest = construct_nested_structure(&nodes);
        let mut deepest = &forest[0];
        while let Some(child) = deepest.children.first() {
            deepest = child;
        }
        assert_eq!(deepest.node.id, "n1999");
        assert!(deepest.path.ends_with("/n1998/n1999"));
        assert!(paths.contains_key(&deepest.path));
    }

    #[test]
    fn dangling_and_cyclic_nodes_are_omitted() {
        let nodes = vec![
            node("a", "A", None),
            node("orphan", "Orphan", Some("missing")),
            node("self", "Selfish", Some("self")),
            node("c1", "C1", Some("c2")),
            node("c2", "C2", Some("c1")),
        ];

        let forest = construct_nested_structure(&nodes);
        assert_eq!(forest.len(), 1);
        assert!(forest[0].children.is_empty());

        let paths = construct_content_paths(&nodes);
        assert_eq!(paths.keys().collect::<Vec<_>>(), ["/A"]);
    }

    #[test]
    fn duplicate_ids_visit_each_node_once() {
        let nodes = vec![
            node("p", "P1", None),
            node("p", "P2", None),
            node("c", "Child", Some("p")),
        ];

        let traversal = traverse(&nodes);
        assert_eq!(traversal.order.len(), 3);

        let flat = flatten_nested_structure(&construct_nested_structure(&nodes));
        assert_eq!(flat.len(), 3);
    }

    #[test]
    fn nested_and_flat_agree_on_paths() {
        let nodes = vec![
            node("docs", "Docs", None),
            node("guide", "Guide", Some("docs")),
            node("api", "Api", Some("docs")),
            node("install", "Install", Some("guide")),
            node("news", "News", None),
            node("tech", "Tech", Some("news")),
            node("lost", "Lost", Some("nowhere")),
        ];

        let flat = flatten_nested_structure(&construct_nested_structure(&nodes));
        let index = construct_content_paths(&nodes);

        let mut from_tree: Vec<&str> = flat.iter().map(|(p, _)| p.as_str()).collect();
        from_tree.sort_unstable();
        let from_index: Vec<&str> = index.keys().map(String::as_str).collect();
        assert_eq!(from_tree, from_index);

        for (path, node) in &flat {
            assert_eq!(&index[path], node);
        }
    }

    #[test]
    fn content_paths_are_injective() {
        let nodes = vec![
            node("1", "A", None),
            node("2", "B", Some("1")),
            node("3", "B", None),
            node("4", "A", Some("3")),
        ];

        let index = construct_content_paths(&nodes);
        assert_eq!(index.len(), nodes.len());
        let mut ids: Vec<&str> = index.values().map(|n| n.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, ["1", "2", "3", "4"]);
    }

    #[test]
    fn output_nodes_copy_extra_attributes() {
        let mut root = node("a", "Blog", None);
        root.extra
            .insert("icon".into(), serde_json::json!("mdi:folder"));

        let forest = construct_nested_structure(&[root.clone()]);
        assert_eq!(forest[0].node, root);
        assert_eq!(construct_content_paths(&[root.clone()])["/Blog"], root);
    }

    #[test]
    fn try_construct_rejects_malformed_input() {
        let nodes = vec![node("a", "A", None), node("b", "B", Some("ghost"))];
        let err = try_construct_nested_structure(&nodes).unwrap_err();
        assert!(err.to_string().contains("ghost"));

        let forest = try_construct_nested_structure(&blog()).expect("well-formed input");
        assert_eq!(forest[0].children[0].path, "/Blog/Posts");
    }

    #[test]
    fn fixture_structure_builds() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/content-nodes.fixture.json")
            .expect("read fixture");
        let nodes: Vec<ContentNode> = serde_json::from_str(&fixture).expect("deserialize nodes");

        let forest = try_construct_nested_structure(&nodes).expect("fixture is well-formed");
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].path, "/Blog");
        let blog_children: Vec<&str> = forest[0]
            .children
            .iter()
            .map(|c| c.path.as_str())
            .collect();
        assert_eq!(blog_children, ["/Blog/Posts", "/Blog/Authors"]);
        assert_eq!(forest[0].children[0].children[0].path, "/Blog/Posts/Archive");
        assert_eq!(
            forest[0].children[0].children[0].node.node_type,
            NodeType::Other("landingPage".into())
        );

        let paths = construct_content_paths(&nodes);
        assert_eq!(paths.len(), nodes.len());
        assert_eq!(paths["/Shop/Items"].id, "c-items");
        assert_eq!(paths["/Blog"].extra["icon"], "mdi:folder");
    }

    #[test]
    fn empty_input_yields_empty_outputs() {
        assert!(construct_nested_structure(&[]).is_empty());
        assert!(construct_content_paths(&[]).is_empty());
        assert!(flatten_nested_structure(&[]).is_empty());
    }
}
