//! Breadcrumb trail for the current folder of a pane.
//!
//! Long trails keep their first segment and last three, with a synthetic
//! ellipsis standing in for the middle. The ellipsis is not a navigation
//! target; it carries the elided segments so a caller can reveal them.

use super::types::{BreadcrumbSegment, ResourceNode};
use std::collections::HashMap;

pub const DEFAULT_BREADCRUMB_BUDGET: usize = 5;

/// Segments always shown at the end of a collapsed trail
const TAIL_SEGMENTS: usize = 3;

/// Length of a collapsed trail: first segment, ellipsis, then the tail
pub const MIN_BREADCRUMB_BUDGET: usize = TAIL_SEGMENTS + 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreadcrumbItem {
    Segment(BreadcrumbSegment),
    Ellipsis { hidden: Vec<BreadcrumbSegment> },
}

impl BreadcrumbItem {
    /// Id to navigate to when clicked; None for the ellipsis
    pub fn navigation_target(&self) -> Option<&str> {
        match self {
            BreadcrumbItem::Segment(segment) => Some(&segment.id),
            BreadcrumbItem::Ellipsis { .. } => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            BreadcrumbItem::Segment(segment) => segment.label.clone(),
            BreadcrumbItem::Ellipsis { .. } => "…".to_string(),
        }
    }

    /// Labels of the elided segments, for the expanded ellipsis view
    pub fn reveal(&self) -> Option<String> {
        match self {
            BreadcrumbItem::Segment(_) => None,
            BreadcrumbItem::Ellipsis { hidden } => Some(join_labels(hidden)),
        }
    }

    pub fn is_ellipsis(&self) -> bool {
        matches!(self, BreadcrumbItem::Ellipsis { .. })
    }
}

fn join_labels(segments: &[BreadcrumbSegment]) -> String {
    segments
        .iter()
        .map(|s| s.label.as_str())
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Resolve `node.path` against `nodes`, skipping ids that are not loaded
pub fn resolve_trail(nodes: &HashMap<String, ResourceNode>, node: &ResourceNode) -> Vec<ResourceNode> {
    node.path
        .iter()
        .filter_map(|id| {
            if id == &node.id {
                Some(node.clone())
            } else {
                nodes.get(id).cloned()
            }
        })
        .collect()
}

/// Collapse a root-to-node chain to at most `budget` items.
///
/// A chain no longer than the budget is returned whole. Budgets below
/// [`MIN_BREADCRUMB_BUDGET`] are raised to it, since a collapsed trail
/// always has exactly that many items.
pub fn collapse_breadcrumbs(chain: &[BreadcrumbSegment], budget: usize) -> Vec<BreadcrumbItem> {
    let budget = budget.max(MIN_BREADCRUMB_BUDGET);
    if chain.len() <= budget {
        return chain.iter().cloned().map(BreadcrumbItem::Segment).collect();
    }

    let tail_start = chain.len() - TAIL_SEGMENTS;
    let mut items = Vec::with_capacity(TAIL_SEGMENTS + 2);
    items.push(BreadcrumbItem::Segment(chain[0].clone()));
    items.push(BreadcrumbItem::Ellipsis {
        hidden: chain[1..tail_start].to_vec(),
    });
    items.extend(chain[tail_start..].iter().cloned().map(BreadcrumbItem::Segment));
    items
}

pub fn collapse_trail(trail: &[ResourceNode], budget: usize) -> Vec<BreadcrumbItem> {
    let chain: Vec<BreadcrumbSegment> = trail.iter().map(BreadcrumbSegment::from).collect();
    collapse_breadcrumbs(&chain, budget)
}

/// Full trail as text, ellipsis expanded
pub fn trail_text(items: &[BreadcrumbItem]) -> String {
    items
        .iter()
        .map(|item| match item {
            BreadcrumbItem::Segment(segment) => segment.label.clone(),
            BreadcrumbItem::Ellipsis { hidden } => join_labels(hidden),
        })
        .collect::<Vec<_>>()
        .join(" / ")
}
