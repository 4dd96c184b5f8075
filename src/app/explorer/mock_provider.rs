//! In-memory data provider with simulated latency.
//!
//! Each configured organization is seeded with the five category roots. Children
//! are generated on first request (`children_per_folder` per container, odd
//! positions are folders and even positions are items) and remembered, so later
//! requests return the same listing. Generation happens while the store lock is
//! held and before the simulated delay, which makes concurrent requests for the
//! same parent observe one shared listing.
//!
//! The provider also keeps a journal of calls and can be told to fail the next
//! call of a given operation, which tests use to exercise error paths.

use super::config::MockConfig;
use super::errors::{ExplorerError, ExplorerResult};
use super::provider::{DataProvider, MoveTarget, RootListing};
use super::types::{collect_subtree, rederive_subtree, ResourceKind, ResourceNode};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Provider operations, used for the call journal and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderOperation {
    LoadRoot,
    LoadChildren,
    Rename,
    Delete,
    Move,
    Copy,
}

/// One recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    pub operation: ProviderOperation,
    pub organization_id: String,
    pub ids: Vec<String>,
    /// Target parent for move/copy; `org/parent` for moves
    pub target: Option<String>,
}

#[derive(Debug, Default)]
struct OrganizationStore {
    nodes: HashMap<String, ResourceNode>,
    root_ids: Vec<String>,
}

#[derive(Debug, Default)]
struct MockStore {
    organizations: HashMap<String, OrganizationStore>,
    calls: Vec<ProviderCall>,
    failures: HashMap<ProviderOperation, VecDeque<ExplorerError>>,
}

pub struct MockDataProvider {
    config: MockConfig,
    store: Mutex<MockStore>,
}

/// Lowercase root id, e.g. `orga:root:boards`
pub fn root_id(organization_id: &str, kind: ResourceKind) -> String {
    format!("{}:root:{}", organization_id, kind.as_str()).to_lowercase()
}

impl MockDataProvider {
    pub fn new(config: MockConfig) -> Self {
        let mut store = MockStore::default();
        for organization_id in &config.organizations {
            let mut org = OrganizationStore::default();
            for kind in ResourceKind::categories() {
                let id = root_id(organization_id, kind);
                org.root_ids.push(id.clone());
                org.nodes.insert(
                    id.clone(),
                    ResourceNode::category_root(organization_id, id, kind),
                );
            }
            store.organizations.insert(organization_id.clone(), org);
        }
        info!(
            "Mock provider seeded {} organization(s)",
            config.organizations.len()
        );
        Self {
            config,
            store: Mutex::new(store),
        }
    }

    /// Mock without latency, for tests
    pub fn instant() -> Self {
        Self::new(MockConfig {
            latency_ms: 0,
            ..Default::default()
        })
    }

    /// Make the next call of `operation` fail with `error`
    pub async fn fail_next(&self, operation: ProviderOperation, error: ExplorerError) {
        let mut store = self.store.lock().await;
        store.failures.entry(operation).or_default().push_back(error);
    }

    /// All calls received so far, in arrival order
    pub async fn calls(&self) -> Vec<ProviderCall> {
        self.store.lock().await.calls.clone()
    }

    pub async fn calls_of(&self, operation: ProviderOperation) -> Vec<ProviderCall> {
        self.store
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Copy of an organization's node map
    pub async fn snapshot(&self, organization_id: &str) -> HashMap<String, ResourceNode> {
        self.store
            .lock()
            .await
            .organizations
            .get(organization_id)
            .map(|org| org.nodes.clone())
            .unwrap_or_default()
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    /// Record the call and pop an injected failure, if any
    fn begin(
        store: &mut MockStore,
        operation: ProviderOperation,
        organization_id: &str,
        ids: Vec<String>,
        target: Option<String>,
    ) -> ExplorerResult<()> {
        store.calls.push(ProviderCall {
            operation,
            organization_id: organization_id.to_string(),
            ids,
            target,
        });
        match store
            .failures
            .get_mut(&operation)
            .and_then(|queue| queue.pop_front())
        {
            Some(error) => {
                warn!("Mock provider: injected {:?} failure: {}", operation, error);
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn organization<'a>(
        store: &'a mut MockStore,
        organization_id: &str,
    ) -> ExplorerResult<&'a mut OrganizationStore> {
        store
            .organizations
            .get_mut(organization_id)
            .ok_or_else(|| ExplorerError::not_found(organization_id, organization_id))
    }

    /// Materialize children of `parent_id` once and return them
    fn ensure_children(
        &self,
        org: &mut OrganizationStore,
        organization_id: &str,
        parent_id: &str,
    ) -> ExplorerResult<Vec<ResourceNode>> {
        let parent = org
            .nodes
            .get(parent_id)
            .ok_or_else(|| ExplorerError::not_found(organization_id, parent_id))?
            .clone();

        if let Some(children) = &parent.children {
            return Ok(children
                .iter()
                .filter_map(|id| org.nodes.get(id))
                .cloned()
                .collect());
        }

        let mut generated = Vec::with_capacity(self.config.children_per_folder);
        for i in 1..=self.config.children_per_folder {
            let child_id = format!("{}::child{}", parent_id, i);
            let (kind, name) = if i % 2 == 1 {
                (ResourceKind::Folder, format!("Folder {}", i))
            } else {
                (ResourceKind::Item, format!("Item {}", i))
            };
            let child = ResourceNode::child_of(&parent, child_id, kind, name);
            org.nodes.insert(child.id.clone(), child.clone());
            generated.push(child);
        }

        if let Some(stored) = org.nodes.get_mut(parent_id) {
            stored.children = Some(generated.iter().map(|c| c.id.clone()).collect());
        }
        debug!(
            "Mock provider generated {} children for {}",
            generated.len(),
            parent_id
        );
        Ok(generated)
    }

    /// Drop ids whose ancestor is also being moved; they travel with it
    fn outermost(org: &OrganizationStore, ids: &[String]) -> Vec<String> {
        let requested: HashSet<&String> = ids.iter().collect();
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert((*id).clone()))
            .filter(|id| match org.nodes.get(*id) {
                Some(node) => !node.path[..node.path.len().saturating_sub(1)]
                    .iter()
                    .any(|ancestor| requested.contains(ancestor)),
                None => true,
            })
            .cloned()
            .collect()
    }

    fn validate_move(
        store: &MockStore,
        organization_id: &str,
        ids: &[String],
        target: &MoveTarget,
    ) -> ExplorerResult<()> {
        let source = store
            .organizations
            .get(organization_id)
            .ok_or_else(|| ExplorerError::not_found(organization_id, organization_id))?;
        let destination = store
            .organizations
            .get(&target.organization_id)
            .ok_or_else(|| {
                ExplorerError::not_found(&target.organization_id, &target.organization_id)
            })?;
        let parent = destination
            .nodes
            .get(&target.parent_id)
            .ok_or_else(|| ExplorerError::not_found(&target.organization_id, &target.parent_id))?;
        if !parent.kind.is_container() {
            return Err(ExplorerError::invalid_target(format!(
                "'{}' cannot contain children",
                parent.name
            )));
        }

        let same_organization = organization_id == target.organization_id;
        for id in ids {
            let node = source
                .nodes
                .get(id)
                .ok_or_else(|| ExplorerError::not_found(organization_id, id))?;
            if node.is_root() {
                return Err(ExplorerError::invalid_target(format!(
                    "category root '{}' cannot be moved",
                    node.name
                )));
            }
            if same_organization && parent.is_within(id) {
                return Err(ExplorerError::invalid_target(format!(
                    "cannot move '{}' into itself or its own descendant",
                    node.name
                )));
            }
            if !same_organization {
                if let Some(taken) = collect_subtree(&source.nodes, id)
                    .into_iter()
                    .find(|sub| destination.nodes.contains_key(sub))
                {
                    return Err(ExplorerError::invalid_target(format!(
                        "'{}' already exists in organization '{}'",
                        taken, target.organization_id
                    )));
                }
            }
        }
        Ok(())
    }

    fn detach(org: &mut OrganizationStore, id: &str) {
        let parent_id = org.nodes.get(id).and_then(|n| n.parent_id.clone());
        if let Some(parent) = parent_id.and_then(|pid| org.nodes.get_mut(&pid)) {
            if let Some(children) = parent.children.as_mut() {
                children.retain(|c| c != id);
            }
        }
    }

    fn attach(org: &mut OrganizationStore, parent_id: &str, id: &str) {
        if let Some(parent) = org.nodes.get_mut(parent_id) {
            let children = parent.children.get_or_insert_with(Vec::new);
            children.push(id.to_string());
            parent.has_children = true;
        }
    }

    fn unique_copy_id(org: &OrganizationStore, id: &str) -> String {
        let base = format!("{}:copy", id);
        if !org.nodes.contains_key(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{}{}", base, n))
            .find(|candidate| !org.nodes.contains_key(candidate))
            .unwrap_or(base)
    }
}

#[async_trait]
impl DataProvider for MockDataProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn load_root(&self, organization_id: &str) -> ExplorerResult<RootListing> {
        let result = {
            let mut store = self.store.lock().await;
            Self::begin(
                &mut store,
                ProviderOperation::LoadRoot,
                organization_id,
                Vec::new(),
                None,
            )
            .and_then(|_| {
                let org = Self::organization(&mut store, organization_id)?;
                let nodes = org
                    .root_ids
                    .iter()
                    .filter_map(|id| org.nodes.get(id))
                    .cloned()
                    .collect();
                Ok(RootListing {
                    nodes,
                    root_ids: org.root_ids.clone(),
                })
            })
        };
        self.simulate_latency().await;
        result
    }

    async fn load_children(
        &self,
        organization_id: &str,
        parent_id: &str,
    ) -> ExplorerResult<Vec<ResourceNode>> {
        let result = {
            let mut store = self.store.lock().await;
            match Self::begin(
                &mut store,
                ProviderOperation::LoadChildren,
                organization_id,
                vec![parent_id.to_string()],
                None,
            ) {
                Ok(()) => Self::organization(&mut store, organization_id)
                    .and_then(|org| self.ensure_children(org, organization_id, parent_id)),
                Err(e) => Err(e),
            }
        };
        self.simulate_latency().await;
        result
    }

    async fn rename(
        &self,
        organization_id: &str,
        id: &str,
        new_name: &str,
    ) -> ExplorerResult<ResourceNode> {
        let result = {
            let mut store = self.store.lock().await;
            Self::begin(
                &mut store,
                ProviderOperation::Rename,
                organization_id,
                vec![id.to_string()],
                None,
            )
            .and_then(|_| {
                let trimmed = new_name.trim();
                if trimmed.is_empty() {
                    return Err(ExplorerError::InvalidName {
                        name: new_name.to_string(),
                    });
                }
                let org = Self::organization(&mut store, organization_id)?;
                let node = org
                    .nodes
                    .get_mut(id)
                    .ok_or_else(|| ExplorerError::not_found(organization_id, id))?;
                node.name = trimmed.to_string();
                Ok(node.clone())
            })
        };
        self.simulate_latency().await;
        result
    }

    async fn delete(&self, organization_id: &str, ids: &[String]) -> ExplorerResult<()> {
        let result = {
            let mut store = self.store.lock().await;
            Self::begin(
                &mut store,
                ProviderOperation::Delete,
                organization_id,
                ids.to_vec(),
                None,
            )
            .and_then(|_| {
                let org = Self::organization(&mut store, organization_id)?;
                // Descendants are left in place; deletion does not cascade.
                for id in ids {
                    if !org.nodes.contains_key(id) {
                        debug!("Mock delete: ignoring unknown id {}", id);
                        continue;
                    }
                    Self::detach(org, id);
                    org.root_ids.retain(|r| r != id);
                    org.nodes.remove(id);
                }
                Ok(())
            })
        };
        self.simulate_latency().await;
        result
    }

    async fn move_nodes(
        &self,
        organization_id: &str,
        ids: &[String],
        target: &MoveTarget,
    ) -> ExplorerResult<()> {
        let result = {
            let mut store = self.store.lock().await;
            Self::begin(
                &mut store,
                ProviderOperation::Move,
                organization_id,
                ids.to_vec(),
                Some(format!("{}/{}", target.organization_id, target.parent_id)),
            )
            .and_then(|_| {
                let ids = match store.organizations.get(organization_id) {
                    Some(org) => Self::outermost(org, ids),
                    None => ids.to_vec(),
                };
                Self::validate_move(&store, organization_id, &ids, target)?;

                // The target listing must be materialized before nodes are appended to it.
                {
                    let destination = Self::organization(&mut store, &target.organization_id)?;
                    self.ensure_children(destination, &target.organization_id, &target.parent_id)?;
                }

                for id in &ids {
                    if organization_id == target.organization_id {
                        let org = Self::organization(&mut store, organization_id)?;
                        Self::detach(org, id);
                        let parent_path = org
                            .nodes
                            .get(&target.parent_id)
                            .map(|p| p.path.clone())
                            .unwrap_or_default();
                        rederive_subtree(&mut org.nodes, id, &parent_path);
                        Self::attach(org, &target.parent_id, id);
                    } else {
                        let moved: Vec<ResourceNode> = {
                            let source = Self::organization(&mut store, organization_id)?;
                            Self::detach(source, id);
                            collect_subtree(&source.nodes, id)
                                .into_iter()
                                .filter_map(|sub| source.nodes.remove(&sub))
                                .collect()
                        };
                        let destination = Self::organization(&mut store, &target.organization_id)?;
                        for mut node in moved {
                            node.organization_id = target.organization_id.clone();
                            destination.nodes.insert(node.id.clone(), node);
                        }
                        let parent_path = destination
                            .nodes
                            .get(&target.parent_id)
                            .map(|p| p.path.clone())
                            .unwrap_or_default();
                        rederive_subtree(&mut destination.nodes, id, &parent_path);
                        Self::attach(destination, &target.parent_id, id);
                    }
                }
                info!(
                    "Mock provider moved {} node(s) from {} to {}/{}",
                    ids.len(),
                    organization_id,
                    target.organization_id,
                    target.parent_id
                );
                Ok(())
            })
        };
        self.simulate_latency().await;
        result
    }

    async fn copy(
        &self,
        organization_id: &str,
        ids: &[String],
        target_parent_id: &str,
    ) -> ExplorerResult<Vec<ResourceNode>> {
        let result = {
            let mut store = self.store.lock().await;
            Self::begin(
                &mut store,
                ProviderOperation::Copy,
                organization_id,
                ids.to_vec(),
                Some(target_parent_id.to_string()),
            )
            .and_then(|_| {
                let org = Self::organization(&mut store, organization_id)?;
                let parent = org
                    .nodes
                    .get(target_parent_id)
                    .ok_or_else(|| ExplorerError::not_found(organization_id, target_parent_id))?;
                if !parent.kind.is_container() {
                    return Err(ExplorerError::invalid_target(format!(
                        "'{}' cannot contain children",
                        parent.name
                    )));
                }
                if let Some(missing) = ids.iter().find(|id| !org.nodes.contains_key(*id)) {
                    return Err(ExplorerError::not_found(organization_id, missing));
                }
                self.ensure_children(org, organization_id, target_parent_id)?;

                let mut clones = Vec::with_capacity(ids.len());
                for id in ids {
                    let Some(source) = org.nodes.get(id).cloned() else {
                        continue;
                    };
                    let Some(parent) = org.nodes.get(target_parent_id).cloned() else {
                        continue;
                    };
                    let clone_id = Self::unique_copy_id(org, id);
                    let mut clone =
                        ResourceNode::child_of(&parent, clone_id, source.kind, source.name.clone());
                    clone.metadata = source.metadata.clone();
                    org.nodes.insert(clone.id.clone(), clone.clone());
                    Self::attach(org, target_parent_id, &clone.id);
                    clones.push(clone);
                }
                Ok(clones)
            })
        };
        self.simulate_latency().await;
        result
    }
}
