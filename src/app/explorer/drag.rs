//! Cross-pane drag intent.
//!
//! The coordinator only records what is being dragged and where it hovers.
//! It never talks to a provider; the session turns a finished drop into a move.

use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragState {
    pub dragging_id: Option<String>,
    pub source_organization_id: Option<String>,
    pub drag_over_organization_id: Option<String>,
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        self.dragging_id.is_none()
            && self.source_organization_id.is_none()
            && self.drag_over_organization_id.is_none()
    }
}

/// What a drop on a pane amounts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing was being dragged
    Idle,
    /// Dropped back onto the source organization
    SamePane,
    CrossPane {
        dragging_id: String,
        source_organization_id: String,
        target_organization_id: String,
    },
}

#[derive(Debug, Default)]
pub struct DragDropCoordinator {
    state: DragState,
}

impl DragDropCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_drag(&mut self, id: &str, organization_id: &str) {
        debug!("Drag started: {} from {}", id, organization_id);
        self.state = DragState {
            dragging_id: Some(id.to_string()),
            source_organization_id: Some(organization_id.to_string()),
            drag_over_organization_id: None,
        };
    }

    pub fn set_drag_over(&mut self, organization_id: Option<&str>) {
        self.state.drag_over_organization_id = organization_id.map(str::to_string);
    }

    /// Clear everything; used for both drops and cancellations
    pub fn end_drag(&mut self) {
        self.state = DragState::default();
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state.dragging_id.is_some()
    }

    /// Resolve a drop on `target_organization_id` and end the drag
    pub fn take_drop(&mut self, target_organization_id: &str) -> DropOutcome {
        let state = std::mem::take(&mut self.state);
        match (state.dragging_id, state.source_organization_id) {
            (Some(dragging_id), Some(source_organization_id)) => {
                if source_organization_id == target_organization_id {
                    DropOutcome::SamePane
                } else {
                    DropOutcome::CrossPane {
                        dragging_id,
                        source_organization_id,
                        target_organization_id: target_organization_id.to_string(),
                    }
                }
            }
            _ => DropOutcome::Idle,
        }
    }
}
