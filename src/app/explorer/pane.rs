//! Pane Controller - navigation, selection and expansion over one organization
//!
//! A pane starts unloaded. `load_root` seeds the node map with the category
//! roots, opens the first root and expands it. Everything after that is either
//! a pure state toggle (navigate, expand, select, filter) or a provider call
//! whose result is merged into the node map once the provider confirms it.
//!
//! Provider calls never run under the state lock. Each call takes a
//! [`LoadTicket`] (organization + generation) first; when the completion
//! arrives the ticket is compared with the live state and stale results are
//! dropped. Rebinding the pane to another organization bumps the generation.

use super::breadcrumbs::{collapse_trail, resolve_trail, BreadcrumbItem};
use super::errors::{ExplorerError, ExplorerResult};
use super::provider::{DataProvider, MoveTarget};
use super::types::{collect_subtree, PaneState, ResourceNode};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Identity of the pane state a provider call was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadTicket {
    organization_id: String,
    generation: u64,
}

#[derive(Debug, Clone)]
struct PaneData {
    pane: PaneState,
    nodes_by_id: HashMap<String, ResourceNode>,
    filter_text: String,
}

#[derive(Debug)]
struct PaneSlot {
    organization_id: String,
    generation: u64,
    data: Option<PaneData>,
}

impl PaneSlot {
    fn ticket(&self) -> LoadTicket {
        LoadTicket {
            organization_id: self.organization_id.clone(),
            generation: self.generation,
        }
    }

    fn is_live(&self, ticket: &LoadTicket) -> bool {
        self.generation == ticket.generation && self.organization_id == ticket.organization_id
    }
}

impl PaneData {
    fn seeded(organization_id: &str, roots: Vec<ResourceNode>, root_ids: Vec<String>) -> Option<Self> {
        let pane = PaneState::after_root_load(organization_id, root_ids)?;
        let nodes_by_id = roots.into_iter().map(|n| (n.id.clone(), n)).collect();
        Some(Self {
            pane,
            nodes_by_id,
            filter_text: String::new(),
        })
    }

    /// Insert or replace a node whose parent is already known.
    ///
    /// A replacement without a children listing keeps the listing already held,
    /// so a shallow provider response does not hide materialized children.
    /// A replacement at a different path was moved elsewhere: its loaded
    /// descendants are evicted and the old parent's listing forgets it.
    fn upsert(&mut self, mut node: ResourceNode) -> bool {
        let consistent = match &node.parent_id {
            None => node.path.len() == 1 && node.path[0] == node.id,
            Some(parent_id) => match self.nodes_by_id.get(parent_id) {
                Some(parent) => {
                    node.path.len() == parent.path.len() + 1
                        && node.path[..parent.path.len()] == parent.path[..]
                        && node.path.last() == Some(&node.id)
                }
                None => false,
            },
        };
        if !consistent {
            warn!(
                "Pane {}: ignoring node {} with inconsistent parent/path",
                self.pane.organization_id, node.id
            );
            return false;
        }
        let relocated = match self.nodes_by_id.get(&node.id) {
            Some(existing) if existing.path != node.path => Some(existing.parent_id.clone()),
            Some(existing) => {
                if node.children.is_none() {
                    node.children = existing.children.clone();
                }
                None
            }
            None => None,
        };
        match relocated {
            Some(old_parent_id) => self.relocate(node, old_parent_id),
            None => {
                self.nodes_by_id.insert(node.id.clone(), node);
            }
        }
        true
    }

    /// Replace a node that now lives under another path
    fn relocate(&mut self, node: ResourceNode, old_parent_id: Option<String>) {
        let current_path = self.current_path();
        let descendants: HashSet<String> = collect_subtree(&self.nodes_by_id, &node.id)
            .into_iter()
            .skip(1)
            .collect();
        for id in &descendants {
            self.nodes_by_id.remove(id);
        }
        self.pane.selected_ids.retain(|s| !descendants.contains(s));
        self.pane.expanded_ids.retain(|e| !descendants.contains(e));

        if let Some(old_parent_id) = old_parent_id {
            if node.parent_id.as_ref() != Some(&old_parent_id) {
                if let Some(old_parent) = self.nodes_by_id.get_mut(&old_parent_id) {
                    if let Some(children) = old_parent.children.as_mut() {
                        children.retain(|c| c != &node.id);
                    }
                }
            }
        }
        debug!(
            "Pane {}: {} relocated, evicted {} stale descendant(s)",
            self.pane.organization_id,
            node.id,
            descendants.len()
        );
        self.nodes_by_id.insert(node.id.clone(), node);
        self.repair_current_folder(&current_path);
    }

    /// Upsert a children listing and record its order on the parent
    fn merge_children(&mut self, parent_id: &str, children: Vec<ResourceNode>) {
        let mut order = Vec::with_capacity(children.len());
        for child in children {
            if child.parent_id.as_deref() != Some(parent_id) {
                warn!(
                    "Pane {}: child {} does not belong to {}",
                    self.pane.organization_id, child.id, parent_id
                );
                continue;
            }
            let id = child.id.clone();
            if self.upsert(child) {
                order.push(id);
            }
        }
        if let Some(parent) = self.nodes_by_id.get_mut(parent_id) {
            parent.has_children = !order.is_empty();
            parent.children = Some(order);
        }
    }

    fn children_materialized(&self, id: &str) -> bool {
        match self.nodes_by_id.get(id).and_then(|n| n.children.as_ref()) {
            Some(children) => children.iter().all(|c| self.nodes_by_id.contains_key(c)),
            None => false,
        }
    }

    /// Remove `ids` with their materialized subtrees; returns the former parents
    fn evict(&mut self, ids: &[String]) -> Vec<String> {
        let current_path = self.current_path();
        let mut removed = HashSet::new();
        let mut parents = Vec::new();

        for id in ids {
            let Some(parent_id) = self.nodes_by_id.get(id).map(|n| n.parent_id.clone()) else {
                continue;
            };
            if let Some(parent_id) = parent_id {
                if let Some(parent) = self.nodes_by_id.get_mut(&parent_id) {
                    if let Some(children) = parent.children.as_mut() {
                        children.retain(|c| c != id);
                    }
                }
                if !parents.contains(&parent_id) {
                    parents.push(parent_id);
                }
            }
            for sub in collect_subtree(&self.nodes_by_id, id) {
                self.nodes_by_id.remove(&sub);
                removed.insert(sub);
            }
        }

        self.pane.root_ids.retain(|r| !removed.contains(r));
        self.pane.selected_ids.retain(|s| !removed.contains(s));
        self.pane.expanded_ids.retain(|e| !removed.contains(e));
        parents.retain(|p| !removed.contains(p));
        self.repair_current_folder(&current_path);
        parents
    }

    fn current_path(&self) -> Vec<String> {
        self.nodes_by_id
            .get(&self.pane.current_folder_id)
            .map(|n| n.path.clone())
            .unwrap_or_else(|| vec![self.pane.current_folder_id.clone()])
    }

    /// Point the current folder at the deepest surviving node of `previous_path`,
    /// or the first root. Returns false when nothing is left to point at.
    fn repair_current_folder(&mut self, previous_path: &[String]) -> bool {
        if self.nodes_by_id.contains_key(&self.pane.current_folder_id) {
            return true;
        }
        let fallback = previous_path
            .iter()
            .rev()
            .find(|id| self.nodes_by_id.contains_key(*id))
            .or_else(|| self.pane.root_ids.first())
            .cloned();
        match fallback {
            Some(id) => {
                debug!(
                    "Pane {}: current folder {} gone, falling back to {}",
                    self.pane.organization_id, self.pane.current_folder_id, id
                );
                self.pane.current_folder_id = id;
                true
            }
            None => false,
        }
    }

    fn visible_children(&self) -> Vec<ResourceNode> {
        let Some(children) = self
            .nodes_by_id
            .get(&self.pane.current_folder_id)
            .and_then(|n| n.children.as_ref())
        else {
            return Vec::new();
        };
        let filter = self.filter_text.to_lowercase();
        children
            .iter()
            .filter_map(|id| self.nodes_by_id.get(id))
            .filter(|n| filter.is_empty() || n.name.to_lowercase().contains(&filter))
            .cloned()
            .collect()
    }
}

/// Navigation/selection state machine for one organization
pub struct PaneController {
    provider: Arc<dyn DataProvider>,
    slot: RwLock<PaneSlot>,
}

impl PaneController {
    pub fn new(organization_id: impl Into<String>, provider: Arc<dyn DataProvider>) -> Self {
        Self {
            provider,
            slot: RwLock::new(PaneSlot {
                organization_id: organization_id.into(),
                generation: 0,
                data: None,
            }),
        }
    }

    pub async fn organization_id(&self) -> String {
        self.slot.read().await.organization_id.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.slot.read().await.data.is_some()
    }

    /// Bind the pane to another organization, discarding its state.
    ///
    /// Completions of calls issued before the rebind are dropped on arrival.
    pub async fn rebind(&self, organization_id: impl Into<String>) {
        let mut slot = self.slot.write().await;
        slot.organization_id = organization_id.into();
        slot.generation += 1;
        slot.data = None;
        info!(
            "Pane rebound to {} (generation {})",
            slot.organization_id, slot.generation
        );
    }

    async fn ticket(&self) -> LoadTicket {
        self.slot.read().await.ticket()
    }

    /// Ticket plus a copy of a known node, or NotFound
    async fn ticket_for(&self, id: &str) -> ExplorerResult<(LoadTicket, ResourceNode)> {
        let slot = self.slot.read().await;
        let node = slot
            .data
            .as_ref()
            .and_then(|d| d.nodes_by_id.get(id))
            .cloned()
            .ok_or_else(|| ExplorerError::not_found(&slot.organization_id, id))?;
        Ok((slot.ticket(), node))
    }

    // ========================================================================
    // Loading
    // ========================================================================

    pub async fn load_root(&self) -> ExplorerResult<()> {
        let ticket = self.ticket().await;
        debug!("Pane {}: loading roots", ticket.organization_id);
        let result = self.provider.load_root(&ticket.organization_id).await;

        let mut guard = self.slot.write().await;
        let slot = &mut *guard;
        if !slot.is_live(&ticket) {
            warn!(
                "Pane: dropping stale root load for {} (generation {})",
                ticket.organization_id, ticket.generation
            );
            return Ok(());
        }
        let listing = result?;

        match slot.data.as_mut() {
            Some(data) => {
                for node in listing.nodes {
                    data.upsert(node);
                }
            }
            None => {
                let data = PaneData::seeded(&ticket.organization_id, listing.nodes, listing.root_ids)
                    .ok_or_else(|| {
                        ExplorerError::not_found(&ticket.organization_id, &ticket.organization_id)
                    })?;
                info!(
                    "Pane {}: loaded {} root(s), current folder {}",
                    ticket.organization_id,
                    data.pane.root_ids.len(),
                    data.pane.current_folder_id
                );
                slot.data = Some(data);
            }
        }
        Ok(())
    }

    /// Re-fetch the children of `id`, bypassing provider caches, and merge them by id
    pub async fn refresh_children(&self, id: &str) -> ExplorerResult<()> {
        let (ticket, _) = self.ticket_for(id).await?;
        self.provider
            .forget_children(&ticket.organization_id, id)
            .await;
        self.load_children(id).await
    }

    async fn load_children(&self, id: &str) -> ExplorerResult<()> {
        let (ticket, _) = self.ticket_for(id).await?;
        let result = self
            .provider
            .load_children(&ticket.organization_id, id)
            .await;

        let mut slot = self.slot.write().await;
        if !slot.is_live(&ticket) {
            warn!(
                "Pane: dropping stale children of {} for {}",
                id, ticket.organization_id
            );
            return Ok(());
        }
        let children = result?;
        if let Some(data) = slot.data.as_mut() {
            if !data.nodes_by_id.contains_key(id) {
                debug!("Pane {}: {} vanished while loading", ticket.organization_id, id);
                return Ok(());
            }
            debug!(
                "Pane {}: merging {} children of {}",
                ticket.organization_id,
                children.len(),
                id
            );
            data.merge_children(id, children);
        }
        Ok(())
    }

    /// Load children of `id` unless its listing is already materialized.
    ///
    /// Returns whether the provider was asked.
    pub async fn ensure_children(&self, id: &str) -> ExplorerResult<bool> {
        {
            let slot = self.slot.read().await;
            let Some(data) = slot.data.as_ref() else {
                return Err(ExplorerError::not_found(&slot.organization_id, id));
            };
            if data.children_materialized(id) {
                return Ok(false);
            }
        }
        self.load_children(id).await?;
        Ok(true)
    }

    /// Refresh the listing of the current folder
    pub async fn refresh(&self) -> ExplorerResult<()> {
        let current = match self.current_folder_id().await {
            Some(id) => id,
            None => return Ok(()),
        };
        self.refresh_children(&current).await
    }

    // ========================================================================
    // Pure state transitions
    // ========================================================================

    /// Open `id`. Ignored before the pane has loaded or for unknown ids.
    pub async fn navigate_to(&self, id: &str) -> bool {
        let mut slot = self.slot.write().await;
        let Some(data) = slot.data.as_mut() else {
            debug!("Pane: navigate_to({}) before load ignored", id);
            return false;
        };
        if !data.nodes_by_id.contains_key(id) {
            warn!(
                "Pane {}: cannot navigate to unknown node {}",
                data.pane.organization_id, id
            );
            return false;
        }
        data.pane.current_folder_id = id.to_string();
        true
    }

    /// Flip expansion of `id`; does not load anything
    pub async fn toggle_expand(&self, id: &str) -> bool {
        let mut slot = self.slot.write().await;
        let Some(data) = slot.data.as_mut() else {
            return false;
        };
        let expanded = &mut data.pane.expanded_ids;
        if !expanded.remove(id) {
            expanded.insert(id.to_string());
        }
        true
    }

    /// Single select toggles between `{id}` and empty; multi flips `id` only
    pub async fn toggle_select(&self, id: &str, multi: bool) -> bool {
        let mut slot = self.slot.write().await;
        let Some(data) = slot.data.as_mut() else {
            return false;
        };
        let selected = &mut data.pane.selected_ids;
        if multi {
            if !selected.remove(id) {
                selected.insert(id.to_string());
            }
        } else if selected.len() == 1 && selected.contains(id) {
            selected.clear();
        } else {
            selected.clear();
            selected.insert(id.to_string());
        }
        true
    }

    pub async fn clear_selection(&self) {
        if let Some(data) = self.slot.write().await.data.as_mut() {
            data.pane.selected_ids.clear();
        }
    }

    pub async fn set_filter(&self, text: &str) {
        if let Some(data) = self.slot.write().await.data.as_mut() {
            data.filter_text = text.to_string();
        }
    }

    /// Keep only the current folder expanded
    pub async fn collapse_all(&self) {
        if let Some(data) = self.slot.write().await.data.as_mut() {
            let current = data.pane.current_folder_id.clone();
            data.pane.expanded_ids.clear();
            data.pane.expanded_ids.insert(current);
        }
    }

    /// Expand every materialized node that can have children
    pub async fn expand_all(&self) {
        if let Some(data) = self.slot.write().await.data.as_mut() {
            let containers: Vec<String> = data
                .nodes_by_id
                .values()
                .filter(|n| n.has_children)
                .map(|n| n.id.clone())
                .collect();
            data.pane.expanded_ids.extend(containers);
        }
    }

    // ========================================================================
    // Mutations (state changes only after provider confirmation)
    // ========================================================================

    /// Rename `id`; the provider's returned node replaces the local one
    pub async fn rename(&self, id: &str, new_name: &str) -> ExplorerResult<ResourceNode> {
        let (ticket, node) = self.ticket_for(id).await?;
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Err(ExplorerError::InvalidName {
                name: new_name.to_string(),
            });
        }
        if trimmed == node.name {
            return Ok(node);
        }

        let updated = self
            .provider
            .rename(&ticket.organization_id, id, trimmed)
            .await
            .inspect_err(|e| {
                warn!(
                    "Pane {}: rename of {} failed: {}",
                    ticket.organization_id, id, e
                )
            })?;

        let mut slot = self.slot.write().await;
        if slot.is_live(&ticket) {
            if let Some(data) = slot.data.as_mut() {
                data.upsert(updated.clone());
            }
            info!(
                "Pane {}: renamed {} to '{}'",
                ticket.organization_id, id, updated.name
            );
        }
        Ok(updated)
    }

    /// Rename the single selected node; None unless exactly one is selected
    pub async fn rename_selected(&self, new_name: &str) -> ExplorerResult<Option<ResourceNode>> {
        let selected = self.selected_ids().await;
        if selected.len() != 1 {
            return Ok(None);
        }
        self.rename(&selected[0], new_name).await.map(Some)
    }

    /// Delete `ids` and drop them (with loaded descendants) from the view
    pub async fn delete(&self, ids: &[String]) -> ExplorerResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let ticket = self.ticket().await;
        self.provider
            .delete(&ticket.organization_id, ids)
            .await
            .inspect_err(|e| warn!("Pane {}: delete failed: {}", ticket.organization_id, e))?;

        let mut slot = self.slot.write().await;
        if !slot.is_live(&ticket) {
            return Ok(());
        }
        let emptied = match slot.data.as_mut() {
            Some(data) => {
                data.evict(ids);
                !data.nodes_by_id.contains_key(&data.pane.current_folder_id)
            }
            None => false,
        };
        if emptied {
            warn!(
                "Pane {}: nothing left to show after delete",
                ticket.organization_id
            );
            slot.data = None;
        }
        info!("Pane {}: deleted {} node(s)", ticket.organization_id, ids.len());
        Ok(())
    }

    pub async fn delete_selected(&self) -> ExplorerResult<()> {
        let selected = self.selected_ids().await;
        self.delete(&selected).await
    }

    /// Copy `ids` under `target_parent_id`, then refresh the target listing
    pub async fn copy(
        &self,
        ids: &[String],
        target_parent_id: &str,
    ) -> ExplorerResult<Vec<ResourceNode>> {
        let (ticket, _) = self.ticket_for(target_parent_id).await?;
        let clones = self
            .provider
            .copy(&ticket.organization_id, ids, target_parent_id)
            .await?;
        if let Err(e) = self.refresh_children(target_parent_id).await {
            warn!(
                "Pane {}: copy succeeded but refreshing {} failed: {}",
                ticket.organization_id, target_parent_id, e
            );
        }
        Ok(clones)
    }

    /// Move `ids` under `target_parent_id` within this organization.
    ///
    /// On success the moved subtrees are evicted, then the former parents and
    /// the target are re-fetched so every path comes from the provider again.
    pub async fn move_nodes(&self, ids: &[String], target_parent_id: &str) -> ExplorerResult<()> {
        let (ticket, _) = self.ticket_for(target_parent_id).await?;
        let target = MoveTarget::new(ticket.organization_id.clone(), target_parent_id);
        self.provider
            .move_nodes(&ticket.organization_id, ids, &target)
            .await?;

        let mut affected = self.release_moved(&ticket, ids).await;
        if !affected.iter().any(|p| p == target_parent_id) {
            affected.push(target_parent_id.to_string());
        }
        self.refresh_all(&affected).await;
        Ok(())
    }

    /// Evict nodes that left this pane; returns their former parents
    async fn release_moved(&self, ticket: &LoadTicket, ids: &[String]) -> Vec<String> {
        let mut slot = self.slot.write().await;
        if !slot.is_live(ticket) {
            return Vec::new();
        }
        match slot.data.as_mut() {
            Some(data) => data.evict(ids),
            None => Vec::new(),
        }
    }

    /// Evict `ids` after they were moved away by someone else, then re-fetch
    /// their former parents
    pub async fn release_and_refresh(&self, ids: &[String]) {
        let ticket = self.ticket().await;
        let parents = self.release_moved(&ticket, ids).await;
        self.refresh_all(&parents).await;
    }

    async fn refresh_all(&self, ids: &[String]) {
        for id in ids {
            if let Err(e) = self.refresh_children(id).await {
                warn!("Pane: re-fetching {} after move failed: {}", id, e);
            }
        }
    }

    // ========================================================================
    // Read access
    // ========================================================================

    pub async fn pane_state(&self) -> Option<PaneState> {
        self.slot.read().await.data.as_ref().map(|d| d.pane.clone())
    }

    pub async fn current_folder_id(&self) -> Option<String> {
        self.slot
            .read()
            .await
            .data
            .as_ref()
            .map(|d| d.pane.current_folder_id.clone())
    }

    pub async fn selected_ids(&self) -> Vec<String> {
        let slot = self.slot.read().await;
        let mut ids: Vec<String> = slot
            .data
            .as_ref()
            .map(|d| d.pane.selected_ids.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub async fn node(&self, id: &str) -> Option<ResourceNode> {
        self.slot
            .read()
            .await
            .data
            .as_ref()
            .and_then(|d| d.nodes_by_id.get(id).cloned())
    }

    /// Copy of the node map
    pub async fn nodes(&self) -> HashMap<String, ResourceNode> {
        self.slot
            .read()
            .await
            .data
            .as_ref()
            .map(|d| d.nodes_by_id.clone())
            .unwrap_or_default()
    }

    pub async fn filter_text(&self) -> String {
        self.slot
            .read()
            .await
            .data
            .as_ref()
            .map(|d| d.filter_text.clone())
            .unwrap_or_default()
    }

    /// Children of the current folder matching the filter, in listing order
    pub async fn visible_children(&self) -> Vec<ResourceNode> {
        self.slot
            .read()
            .await
            .data
            .as_ref()
            .map(|d| d.visible_children())
            .unwrap_or_default()
    }

    /// Resolved root-to-current trail
    pub async fn trail(&self) -> Vec<ResourceNode> {
        let slot = self.slot.read().await;
        match slot.data.as_ref() {
            Some(data) => match data.nodes_by_id.get(&data.pane.current_folder_id) {
                Some(current) => resolve_trail(&data.nodes_by_id, current),
                None => Vec::new(),
            },
            None => Vec::new(),
        }
    }

    /// Breadcrumbs for the current folder, collapsed to `budget` segments
    pub async fn breadcrumbs(&self, budget: usize) -> Vec<BreadcrumbItem> {
        collapse_trail(&self.trail().await, budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::explorer::mock_provider::MockDataProvider;

    /// Records which listings the pane asked to forget
    struct ForgetLog {
        inner: MockDataProvider,
        forgotten: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl DataProvider for ForgetLog {
        fn name(&self) -> &'static str {
            "forget-log"
        }

        async fn load_root(
            &self,
            organization_id: &str,
        ) -> ExplorerResult<crate::app::explorer::provider::RootListing> {
            self.inner.load_root(organization_id).await
        }

        async fn load_children(
            &self,
            organization_id: &str,
            parent_id: &str,
        ) -> ExplorerResult<Vec<ResourceNode>> {
            self.inner.load_children(organization_id, parent_id).await
        }

        async fn rename(
            &self,
            organization_id: &str,
            id: &str,
            new_name: &str,
        ) -> ExplorerResult<ResourceNode> {
            self.inner.rename(organization_id, id, new_name).await
        }

        async fn delete(&self, organization_id: &str, ids: &[String]) -> ExplorerResult<()> {
            self.inner.delete(organization_id, ids).await
        }

        async fn move_nodes(
            &self,
            organization_id: &str,
            ids: &[String],
            target: &MoveTarget,
        ) -> ExplorerResult<()> {
            self.inner.move_nodes(organization_id, ids, target).await
        }

        async fn copy(
            &self,
            organization_id: &str,
            ids: &[String],
            target_parent_id: &str,
        ) -> ExplorerResult<Vec<ResourceNode>> {
            self.inner.copy(organization_id, ids, target_parent_id).await
        }

        async fn forget_children(&self, _organization_id: &str, parent_id: &str) {
            self.forgotten.lock().unwrap().push(parent_id.to_string());
        }
    }

    async fn loaded_pane() -> PaneController {
        let pane = PaneController::new("orgA", Arc::new(MockDataProvider::instant()));
        pane.load_root().await.unwrap();
        pane
    }

    #[tokio::test]
    async fn test_unloaded_pane_ignores_state_changes() {
        let pane = PaneController::new("orgA", Arc::new(MockDataProvider::instant()));
        assert!(!pane.navigate_to("orga:root:repos").await);
        assert!(!pane.toggle_expand("orga:root:repos").await);
        assert!(!pane.toggle_select("orga:root:repos", false).await);
        assert!(pane.pane_state().await.is_none());
        assert!(pane.visible_children().await.is_empty());
    }

    #[tokio::test]
    async fn test_rebind_resets_to_unloaded() {
        let pane = loaded_pane().await;
        pane.toggle_select("orga:root:repos", false).await;

        pane.rebind("orgB").await;
        assert_eq!(pane.organization_id().await, "orgB");
        assert!(!pane.is_loaded().await);
        assert!(pane.selected_ids().await.is_empty());

        pane.load_root().await.unwrap();
        assert_eq!(
            pane.current_folder_id().await.as_deref(),
            Some("orgb:root:boards")
        );
    }

    #[tokio::test]
    async fn test_navigate_to_unknown_node_is_ignored() {
        let pane = loaded_pane().await;
        assert!(!pane.navigate_to("orga:root:nothing").await);
        assert_eq!(
            pane.current_folder_id().await.as_deref(),
            Some("orga:root:boards")
        );
    }

    #[tokio::test]
    async fn test_single_select_narrows_multi_selection() {
        let pane = loaded_pane().await;
        pane.toggle_select("a", false).await;
        pane.toggle_select("b", true).await;
        pane.toggle_select("a", false).await;
        assert_eq!(pane.selected_ids().await, vec!["a".to_string()]);
        pane.toggle_select("a", false).await;
        assert!(pane.selected_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_children_loads_once() {
        let pane = loaded_pane().await;
        assert!(pane.ensure_children("orga:root:boards").await.unwrap());
        assert!(!pane.ensure_children("orga:root:boards").await.unwrap());
        assert_eq!(pane.visible_children().await.len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cached_listing() {
        let provider = Arc::new(ForgetLog {
            inner: MockDataProvider::instant(),
            forgotten: std::sync::Mutex::new(Vec::new()),
        });
        let pane = PaneController::new("orgA", provider.clone());
        pane.load_root().await.unwrap();

        pane.ensure_children("orga:root:boards").await.unwrap();
        assert!(provider.forgotten.lock().unwrap().is_empty());

        pane.refresh().await.unwrap();
        pane.refresh_children("orga:root:repos").await.unwrap();
        assert_eq!(
            *provider.forgotten.lock().unwrap(),
            vec!["orga:root:boards".to_string(), "orga:root:repos".to_string()]
        );
    }

    #[tokio::test]
    async fn test_collapse_all_keeps_current_folder() {
        let pane = loaded_pane().await;
        pane.refresh().await.unwrap();
        pane.expand_all().await;
        let expanded = pane.pane_state().await.unwrap().expanded_ids;
        assert!(expanded.contains("orga:root:repos"));
        assert!(expanded.contains("orga:root:boards::child1"));
        assert!(!expanded.contains("orga:root:boards::child2"));

        pane.collapse_all().await;
        let expanded = pane.pane_state().await.unwrap().expanded_ids;
        assert_eq!(expanded, HashSet::from(["orga:root:boards".to_string()]));
    }

    #[tokio::test]
    async fn test_upsert_rejects_orphans() {
        let pane = loaded_pane().await;
        let mut slot = pane.slot.write().await;
        let data = slot.data.as_mut().unwrap();
        let root = data.nodes_by_id["orga:root:boards"].clone();
        let child = ResourceNode::child_of(
            &root,
            "x".into(),
            crate::app::explorer::types::ResourceKind::Folder,
            "X".into(),
        );
        let grandchild = ResourceNode::child_of(
            &child,
            "y".into(),
            crate::app::explorer::types::ResourceKind::Item,
            "Y".into(),
        );
        assert!(!data.upsert(grandchild));
        assert!(data.upsert(child));
    }
}
