//! Resource node graph types shared by providers, panes and the session.
//!
//! Nodes are addressed by id within an organization. Every node carries its
//! full `path` (root id first, own id last), so the graph per organization is a
//! forest whose paths can be checked without walking parent links.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Closed set of node kinds.
///
/// The five category kinds are the fixed top-level roots of every organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Boards,
    Repos,
    Pipelines,
    Tests,
    Artifacts,
    Folder,
    Item,
}

impl ResourceKind {
    /// The category roots in display order
    pub fn categories() -> [ResourceKind; 5] {
        [
            ResourceKind::Boards,
            ResourceKind::Repos,
            ResourceKind::Pipelines,
            ResourceKind::Tests,
            ResourceKind::Artifacts,
        ]
    }

    pub fn is_category(&self) -> bool {
        !matches!(self, ResourceKind::Folder | ResourceKind::Item)
    }

    /// Whether nodes of this kind may contain children
    pub fn is_container(&self) -> bool {
        !matches!(self, ResourceKind::Item)
    }

    /// Lowercase identifier, as used in ids and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Boards => "boards",
            ResourceKind::Repos => "repos",
            ResourceKind::Pipelines => "pipelines",
            ResourceKind::Tests => "tests",
            ResourceKind::Artifacts => "artifacts",
            ResourceKind::Folder => "folder",
            ResourceKind::Item => "item",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Boards => "Boards",
            ResourceKind::Repos => "Repos",
            ResourceKind::Pipelines => "Pipelines",
            ResourceKind::Tests => "Tests",
            ResourceKind::Artifacts => "Artifacts",
            ResourceKind::Folder => "Folder",
            ResourceKind::Item => "Item",
        }
    }
}

/// A node in one organization's resource tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNode {
    /// Unique within its organization, not across organizations
    pub id: String,
    pub organization_id: String,
    pub kind: ResourceKind,
    pub name: String,
    /// None only for category roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Lazy-loading hint, independent of `children`
    #[serde(default)]
    pub has_children: bool,
    /// None = not loaded yet, Some(empty) = loaded with no children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    /// Ancestor ids from the root, ending with `id`
    pub path: Vec<String>,
    /// Opaque to the core
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ResourceNode {
    /// Build a category root for an organization
    pub fn category_root(organization_id: &str, id: String, kind: ResourceKind) -> Self {
        Self {
            path: vec![id.clone()],
            id,
            organization_id: organization_id.to_string(),
            kind,
            name: kind.display_name().to_string(),
            parent_id: None,
            has_children: true,
            children: None,
            metadata: HashMap::new(),
        }
    }

    /// Build a child under `parent`, deriving `parent_id` and `path` from it
    pub fn child_of(parent: &ResourceNode, id: String, kind: ResourceKind, name: String) -> Self {
        let mut path = parent.path.clone();
        path.push(id.clone());
        let container = kind.is_container();
        Self {
            id,
            organization_id: parent.organization_id.clone(),
            kind,
            name,
            parent_id: Some(parent.id.clone()),
            has_children: container,
            children: if container { None } else { Some(Vec::new()) },
            path,
            metadata: HashMap::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Whether `ancestor_id` appears on this node's path (including itself)
    pub fn is_within(&self, ancestor_id: &str) -> bool {
        self.path.iter().any(|p| p == ancestor_id)
    }
}

/// One resolved step of a breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadcrumbSegment {
    pub id: String,
    pub label: String,
}

impl From<&ResourceNode> for BreadcrumbSegment {
    fn from(node: &ResourceNode) -> Self {
        Self {
            id: node.id.clone(),
            label: node.name.clone(),
        }
    }
}

/// Navigation and selection snapshot of a single pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneState {
    pub organization_id: String,
    /// Fixed category roots, in provider order
    pub root_ids: Vec<String>,
    /// Folder whose children form the visible listing
    pub current_folder_id: String,
    pub expanded_ids: HashSet<String>,
    pub selected_ids: HashSet<String>,
}

impl PaneState {
    /// Fresh state after a root load: first root open and expanded
    pub fn after_root_load(organization_id: &str, root_ids: Vec<String>) -> Option<Self> {
        let first = root_ids.first()?.clone();
        Some(Self {
            organization_id: organization_id.to_string(),
            expanded_ids: HashSet::from([first.clone()]),
            current_folder_id: first,
            root_ids,
            selected_ids: HashSet::new(),
        })
    }
}

/// Ways a node map can violate the forest invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestViolation {
    PathDoesNotEndWithId { id: String },
    RootWithLongPath { id: String },
    MissingParent { id: String, parent_id: String },
    PathMismatch { id: String },
}

/// Check every node in `nodes` against the forest invariant.
///
/// Parents must be present for every non-root node, and a node's path must be
/// its parent's path plus its own id.
pub fn check_forest(nodes: &HashMap<String, ResourceNode>) -> Vec<ForestViolation> {
    let mut violations = Vec::new();
    for node in nodes.values() {
        if node.path.last() != Some(&node.id) {
            violations.push(ForestViolation::PathDoesNotEndWithId {
                id: node.id.clone(),
            });
            continue;
        }
        match &node.parent_id {
            None => {
                if node.path.len() != 1 {
                    violations.push(ForestViolation::RootWithLongPath {
                        id: node.id.clone(),
                    });
                }
            }
            Some(parent_id) => match nodes.get(parent_id) {
                None => violations.push(ForestViolation::MissingParent {
                    id: node.id.clone(),
                    parent_id: parent_id.clone(),
                }),
                Some(parent) => {
                    let expected_len = parent.path.len() + 1;
                    if node.path.len() != expected_len
                        || node.path[..parent.path.len()] != parent.path[..]
                    {
                        violations.push(ForestViolation::PathMismatch {
                            id: node.id.clone(),
                        });
                    }
                }
            },
        }
    }
    violations
}

/// Rewrite `parent_id`/`path` for `id` and every materialized descendant.
///
/// Descendants are reached through `children` lists; ids listed but absent
/// from the map are skipped.
pub fn rederive_subtree(
    nodes: &mut HashMap<String, ResourceNode>,
    id: &str,
    new_parent_path: &[String],
) {
    let mut stack: Vec<(String, Vec<String>)> = vec![(id.to_string(), new_parent_path.to_vec())];
    while let Some((current, parent_path)) = stack.pop() {
        let Some(node) = nodes.get_mut(&current) else {
            continue;
        };
        let mut path = parent_path.clone();
        path.push(node.id.clone());
        node.parent_id = parent_path.last().cloned();
        node.path = path.clone();
        if let Some(children) = &node.children {
            for child in children {
                stack.push((child.clone(), path.clone()));
            }
        }
    }
}

/// Collect `id` and all of its materialized descendants (pre-order)
pub fn collect_subtree(nodes: &HashMap<String, ResourceNode>, id: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![id.to_string()];
    while let Some(current) = stack.pop() {
        let Some(node) = nodes.get(&current) else {
            continue;
        };
        out.push(current);
        if let Some(children) = &node.children {
            for child in children.iter().rev() {
                stack.push(child.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> HashMap<String, ResourceNode> {
        let root = ResourceNode::category_root("orgA", "r".into(), ResourceKind::Boards);
        let folder = ResourceNode::child_of(&root, "f".into(), ResourceKind::Folder, "F".into());
        let item = ResourceNode::child_of(&folder, "i".into(), ResourceKind::Item, "I".into());
        let mut root = root;
        root.children = Some(vec!["f".into()]);
        let mut folder = folder;
        folder.children = Some(vec!["i".into()]);
        HashMap::from([
            ("r".to_string(), root),
            ("f".to_string(), folder),
            ("i".to_string(), item),
        ])
    }

    #[test]
    fn test_child_paths_extend_parent() {
        let nodes = small_tree();
        assert_eq!(nodes["i"].path, vec!["r", "f", "i"]);
        assert_eq!(nodes["i"].depth(), 2);
        assert!(check_forest(&nodes).is_empty());
    }

    #[test]
    fn test_item_children_are_loaded_empty() {
        let nodes = small_tree();
        assert_eq!(nodes["i"].children, Some(Vec::new()));
        assert!(!nodes["i"].has_children);
        assert_eq!(nodes["f"].children, Some(vec!["i".to_string()]));
    }

    #[test]
    fn test_check_forest_reports_missing_parent() {
        let mut nodes = small_tree();
        nodes.remove("f");
        assert_eq!(
            check_forest(&nodes),
            vec![ForestViolation::MissingParent {
                id: "i".into(),
                parent_id: "f".into()
            }]
        );
    }

    #[test]
    fn test_rederive_subtree_rewrites_descendants() {
        let mut nodes = small_tree();
        let other = ResourceNode::category_root("orgA", "r2".into(), ResourceKind::Repos);
        nodes.insert("r2".into(), other);

        rederive_subtree(&mut nodes, "f", &["r2".to_string()]);

        assert_eq!(nodes["f"].parent_id.as_deref(), Some("r2"));
        assert_eq!(nodes["i"].path, vec!["r2", "f", "i"]);
    }

    #[test]
    fn test_collect_subtree_is_preorder() {
        let nodes = small_tree();
        assert_eq!(collect_subtree(&nodes, "r"), vec!["r", "f", "i"]);
        assert!(collect_subtree(&nodes, "missing").is_empty());
    }

    #[test]
    fn test_pane_state_after_root_load() {
        let state = PaneState::after_root_load("orgA", vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(state.current_folder_id, "a");
        assert!(state.expanded_ids.contains("a"));
        assert!(state.selected_ids.is_empty());
        assert!(PaneState::after_root_load("orgA", Vec::new()).is_none());
    }
}
