//! Structural precondition checks for flat content node lists.
//!
//! Assembly itself never fails: it places what it can reach from a root and
//! skips the rest. Callers that cannot vouch for their input run
//! [`validate_structure`] first to learn what would be skipped and why.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use contentkit_shared::{ContentNode, PATH_SEPARATOR};

use crate::tree::traverse;

/// A single violation of the content tree's structural preconditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureIssue {
    EmptyName { id: String },
    NameContainsSeparator { id: String, name: String },
    DuplicateId { id: String },
    SelfReference { id: String },
    DanglingParent { id: String, parent_id: String },
    /// The node's ancestor chain loops without reaching a root.
    Cycle { id: String },
    /// The node hangs below a self-referencing or dangling node.
    Unreachable { id: String },
    DuplicatePath { path: String },
}

impl std::fmt::Display for StructureIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName { id } => write!(f, "node `{id}` has an empty name"),
            Self::NameContainsSeparator { id, name } => {
                write!(f, "node `{id}` name `{name}` contains `{PATH_SEPARATOR}`")
            }
            Self::DuplicateId { id } => write!(f, "id `{id}` is used by more than one node"),
            Self::SelfReference { id } => write!(f, "node `{id}` is its own parent"),
            Self::DanglingParent { id, parent_id } => {
                write!(f, "node `{id}` references missing parent `{parent_id}`")
            }
            Self::Cycle { id } => write!(f, "node `{id}` is part of or below a parent cycle"),
            Self::Unreachable { id } => {
                write!(f, "node `{id}` is below a node with a broken parent reference")
            }
            Self::DuplicatePath { path } => write!(f, "path `{path}` is used by more than one node"),
        }
    }
}

/// Check names, id uniqueness, parent references, cycles, and path uniqueness.
///
/// Returns every issue found, in input order per check.
pub fn validate_structure(nodes: &[ContentNode]) -> Result<(), Vec<StructureIssue>> {
    let mut issues = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    let mut marks = vec![Mark::Unvisited; nodes.len()];

    for (idx, node) in nodes.iter().enumerate() {
        if node.name.is_empty() {
            issues.push(StructureIssue::EmptyName {
                id: node.id.clone(),
            });
        } else if node.name.contains(PATH_SEPARATOR) {
            issues.push(StructureIssue::NameContainsSeparator {
                id: node.id.clone(),
                name: node.name.clone(),
            });
        }

        if index.insert(node.id.as_str(), idx).is_some() {
            issues.push(StructureIssue::DuplicateId {
                id: node.id.clone(),
            });
        }
    }

    for (idx, node) in nodes.iter().enumerate() {
        let Some(parent_id) = node.parent_id.as_deref() else {
            continue;
        };
        if parent_id == node.id {
            marks[idx] = Mark::Broken;
            issues.push(StructureIssue::SelfReference {
                id: node.id.clone(),
            });
        } else if !index.contains_key(parent_id) {
            marks[idx] = Mark::Broken;
            issues.push(StructureIssue::DanglingParent {
                id: node.id.clone(),
                parent_id: parent_id.to_string(),
            });
        }
    }

    let traversal = traverse(nodes);
    for &idx in &traversal.order {
        marks[idx] = Mark::Reached;
    }

    classify_unplaced(nodes, &index, &mut marks);
    for (node, mark) in nodes.iter().zip(&marks) {
        match mark {
            Mark::Cycle => issues.push(StructureIssue::Cycle {
                id: node.id.clone(),
            }),
            Mark::Unreachable => issues.push(StructureIssue::Unreachable {
                id: node.id.clone(),
            }),
            _ => {}
        }
    }

    let mut seen_paths = HashSet::new();
    for &idx in &traversal.order {
        if let Some(path) = traversal.paths[idx].as_deref() {
            if !seen_paths.insert(path) {
                issues.push(StructureIssue::DuplicatePath {
                    path: path.to_string(),
                });
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Where following a node's parent links leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    /// On the chain currently being followed.
    OnPath,
    Reached,
    /// Self-referencing or dangling; reported on its own.
    Broken,
    Cycle,
    Unreachable,
}

/// Resolve every still-unvisited node to `Cycle`, `Unreachable` or `Reached`.
///
/// Each node is put on a path at most once and every node on a finished path
/// takes the path's verdict, so the whole pass is linear.
fn classify_unplaced(nodes: &[ContentNode], index: &HashMap<&str, usize>, marks: &mut [Mark]) {
    let mut path = Vec::new();

    for start in 0..nodes.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }

        let mut current = start;
        let verdict = loop {
            match marks[current] {
                Mark::Unvisited => {
                    marks[current] = Mark::OnPath;
                    path.push(current);
                    let Some(parent_id) = nodes[current].parent_id.as_deref() else {
                        break Mark::Reached;
                    };
                    match index.get(parent_id) {
                        Some(&parent) => current = parent,
                        None => break Mark::Unreachable,
                    }
                }
                Mark::OnPath | Mark::Cycle => break Mark::Cycle,
                Mark::Broken | Mark::Unreachable => break Mark::Unreachable,
                Mark::Reached => break Mark::Reached,
            }
        };

        debug!(start = %nodes[start].id, len = path.len(), ?verdict, "resolved unplaced chain");
        for idx in path.drain(..) {
            marks[idx] = verdict;
        }
    }
}
