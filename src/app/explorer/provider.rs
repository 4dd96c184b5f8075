//! Data provider boundary
//!
//! A [`DataProvider`] is the only way panes obtain or mutate nodes. The mock
//! and HTTP backends implement the same contract:
//! - `load_root` returns the fixed category roots of an organization
//! - `load_children` is idempotent and materializes a parent's children at most once,
//!   even when two calls for the same parent are in flight together
//! - `rename` fails with `NotFound` for ids unknown to the organization
//! - `delete` is best-effort and does not cascade to descendants
//! - `move_nodes` preserves the forest invariant, failing with `InvalidTarget` otherwise
//! - `copy` returns fresh clones and leaves the sources untouched
//!
//! Providers hand out clones; callers never share mutable nodes with the backend.

use super::api_provider::ApiDataProvider;
use super::config::{ExplorerConfig, ProviderKind};
use super::credentials::EnvToken;
use super::errors::ExplorerResult;
use super::mock_provider::MockDataProvider;
use super::types::ResourceNode;
use async_trait::async_trait;
use std::sync::Arc;

/// Category roots of one organization
#[derive(Debug, Clone, PartialEq)]
pub struct RootListing {
    pub nodes: Vec<ResourceNode>,
    pub root_ids: Vec<String>,
}

/// Destination of a move, possibly in another organization
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MoveTarget {
    pub organization_id: String,
    pub parent_id: String,
}

impl MoveTarget {
    pub fn new(organization_id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            parent_id: parent_id.into(),
        }
    }
}

#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    async fn load_root(&self, organization_id: &str) -> ExplorerResult<RootListing>;

    async fn load_children(
        &self,
        organization_id: &str,
        parent_id: &str,
    ) -> ExplorerResult<Vec<ResourceNode>>;

    async fn rename(
        &self,
        organization_id: &str,
        id: &str,
        new_name: &str,
    ) -> ExplorerResult<ResourceNode>;

    async fn delete(&self, organization_id: &str, ids: &[String]) -> ExplorerResult<()>;

    /// Move `ids` (owned by `organization_id`) under `target`
    async fn move_nodes(
        &self,
        organization_id: &str,
        ids: &[String],
        target: &MoveTarget,
    ) -> ExplorerResult<()>;

    async fn copy(
        &self,
        organization_id: &str,
        ids: &[String],
        target_parent_id: &str,
    ) -> ExplorerResult<Vec<ResourceNode>>;

    /// Drop any cached listing of `parent_id` so the next load hits the backend
    async fn forget_children(&self, _organization_id: &str, _parent_id: &str) {}
}

/// Build the provider selected by `config`
pub fn provider_for(config: &ExplorerConfig) -> anyhow::Result<Arc<dyn DataProvider>> {
    match config.provider {
        ProviderKind::Mock => {
            tracing::info!("Using mock data provider");
            Ok(Arc::new(MockDataProvider::new(config.mock.clone())))
        }
        ProviderKind::Api => {
            let token = Arc::new(EnvToken::new(config.api.token_env.clone()));
            let provider = ApiDataProvider::new(&config.api, token)?;
            tracing::info!("Using API data provider at {}", provider.base_url());
            Ok(Arc::new(provider))
        }
    }
}
