//! Explorer Session - the dual-pane unit.
//!
//! Owns one provider, two [`PaneController`]s and the drag coordinator.
//! Consumers get the session passed in; nothing here is global.

use super::breadcrumbs::BreadcrumbItem;
use super::config::ExplorerConfig;
use super::drag::{DragDropCoordinator, DragState, DropOutcome};
use super::errors::{ExplorerError, ExplorerResult};
use super::pane::PaneController;
use super::provider::{provider_for, DataProvider, MoveTarget};
use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneSide {
    Left,
    Right,
}

impl PaneSide {
    pub fn opposite(self) -> Self {
        match self {
            PaneSide::Left => PaneSide::Right,
            PaneSide::Right => PaneSide::Left,
        }
    }
}

impl fmt::Display for PaneSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaneSide::Left => write!(f, "left"),
            PaneSide::Right => write!(f, "right"),
        }
    }
}

/// What a drop on a pane did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReport {
    Idle,
    SamePane,
    Moved {
        id: String,
        from_organization_id: String,
        target: MoveTarget,
    },
}

pub struct ExplorerSession {
    id: Uuid,
    config: ExplorerConfig,
    provider: Arc<dyn DataProvider>,
    left: PaneController,
    right: PaneController,
    drag: Mutex<DragDropCoordinator>,
}

impl ExplorerSession {
    pub fn new(config: ExplorerConfig, provider: Arc<dyn DataProvider>) -> Self {
        let left = PaneController::new(config.left_organization.clone(), provider.clone());
        let right = PaneController::new(config.right_organization.clone(), provider.clone());
        let id = Uuid::new_v4();
        info!(
            "Explorer session {} created ({} | {}) on {} provider",
            id,
            config.left_organization,
            config.right_organization,
            provider.name()
        );
        Self {
            id,
            config,
            provider,
            left,
            right,
            drag: Mutex::new(DragDropCoordinator::new()),
        }
    }

    /// Build the session and the provider `config` selects
    pub fn from_config(config: ExplorerConfig) -> Result<Self> {
        config.validate()?;
        let provider = provider_for(&config)?;
        Ok(Self::new(config, provider))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn DataProvider> {
        &self.provider
    }

    pub fn pane(&self, side: PaneSide) -> &PaneController {
        match side {
            PaneSide::Left => &self.left,
            PaneSide::Right => &self.right,
        }
    }

    /// Pane heading; the organization id
    pub async fn title(&self, side: PaneSide) -> String {
        self.pane(side).organization_id().await
    }

    /// Load both panes in parallel, then preload the first root's children.
    ///
    /// Both panes are attempted; the first error is returned.
    pub async fn open(&self) -> ExplorerResult<()> {
        let (left, right) = futures::join!(self.open_pane(PaneSide::Left), self.open_pane(PaneSide::Right));
        left.and(right)
    }

    async fn open_pane(&self, side: PaneSide) -> ExplorerResult<()> {
        let pane = self.pane(side);
        pane.load_root().await.inspect_err(|e| {
            error!("Session {}: loading {} pane failed: {}", self.id, side, e)
        })?;
        if let Some(current) = pane.current_folder_id().await {
            if let Err(e) = pane.ensure_children(&current).await {
                warn!("Session {}: preloading {} failed: {}", self.id, current, e);
            }
        }
        Ok(())
    }

    /// Expand `id` and make sure its children are materialized
    pub async fn expand_and_load(&self, side: PaneSide, id: &str) -> ExplorerResult<()> {
        let pane = self.pane(side);
        let expanded = pane
            .pane_state()
            .await
            .map(|state| state.expanded_ids.contains(id))
            .unwrap_or(false);
        if !expanded {
            pane.toggle_expand(id).await;
        }
        pane.ensure_children(id).await.map(|_| ())
    }

    pub async fn breadcrumbs(&self, side: PaneSide) -> Vec<BreadcrumbItem> {
        self.pane(side)
            .breadcrumbs(self.config.breadcrumb_budget)
            .await
    }

    // ========================================================================
    // Drag and drop
    // ========================================================================

    pub async fn begin_drag(&self, side: PaneSide, id: &str) {
        let organization_id = self.pane(side).organization_id().await;
        self.drag.lock().await.begin_drag(id, &organization_id);
    }

    /// Hover over a pane, or over nothing
    pub async fn drag_over(&self, side: Option<PaneSide>) {
        let organization_id = match side {
            Some(side) => Some(self.pane(side).organization_id().await),
            None => None,
        };
        self.drag
            .lock()
            .await
            .set_drag_over(organization_id.as_deref());
    }

    pub async fn end_drag(&self) {
        self.drag.lock().await.end_drag();
    }

    pub async fn drag_state(&self) -> DragState {
        self.drag.lock().await.state().clone()
    }

    /// Finish a drag on `side`.
    ///
    /// A cross-organization drop issues exactly one provider move into the
    /// target pane's current folder. After the move is confirmed the source
    /// pane evicts the node and the target pane re-fetches its listing.
    pub async fn drop_on(&self, side: PaneSide) -> ExplorerResult<DropReport> {
        let target_pane = self.pane(side);
        let target_organization_id = target_pane.organization_id().await;
        let outcome = self.drag.lock().await.take_drop(&target_organization_id);

        let (dragging_id, source_organization_id) = match outcome {
            DropOutcome::Idle => return Ok(DropReport::Idle),
            DropOutcome::SamePane => return Ok(DropReport::SamePane),
            DropOutcome::CrossPane {
                dragging_id,
                source_organization_id,
                ..
            } => (dragging_id, source_organization_id),
        };

        let parent_id = target_pane.current_folder_id().await.ok_or_else(|| {
            ExplorerError::invalid_target(format!(
                "{} pane has not loaded {}",
                side, target_organization_id
            ))
        })?;
        let target = MoveTarget::new(target_organization_id, parent_id);
        let ids = vec![dragging_id.clone()];

        self.provider
            .move_nodes(&source_organization_id, &ids, &target)
            .await
            .inspect_err(|e| {
                error!(
                    "Session {}: moving {} to {}/{} failed: {}",
                    self.id, dragging_id, target.organization_id, target.parent_id, e
                )
            })?;
        info!(
            "Session {}: moved {} from {} to {}/{}",
            self.id, dragging_id, source_organization_id, target.organization_id, target.parent_id
        );

        let source_pane = self.pane(side.opposite());
        if source_pane.organization_id().await == source_organization_id {
            source_pane.release_and_refresh(&ids).await;
        }
        if let Err(e) = target_pane.refresh_children(&target.parent_id).await {
            warn!(
                "Session {}: refreshing {} after drop failed: {}",
                self.id, target.parent_id, e
            );
        }

        Ok(DropReport::Moved {
            id: dragging_id,
            from_organization_id: source_organization_id,
            target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::explorer::mock_provider::MockDataProvider;

    fn session() -> ExplorerSession {
        ExplorerSession::new(
            ExplorerConfig::default(),
            Arc::new(MockDataProvider::instant()),
        )
    }

    #[tokio::test]
    async fn test_open_loads_both_panes() {
        let session = session();
        session.open().await.unwrap();
        assert_eq!(session.title(PaneSide::Left).await, "orgA");
        assert_eq!(session.pane(PaneSide::Right).visible_children().await.len(), 3);
    }

    #[tokio::test]
    async fn test_drop_without_drag_is_idle() {
        let session = session();
        session.open().await.unwrap();
        assert_eq!(session.drop_on(PaneSide::Right).await.unwrap(), DropReport::Idle);
    }

    #[test]
    fn test_from_config_rejects_api_without_url() {
        let config = ExplorerConfig {
            provider: crate::app::explorer::config::ProviderKind::Api,
            ..Default::default()
        };
        assert!(ExplorerSession::from_config(config).is_err());
    }
}
