//! Pane Controller Tests
//!
//! Exercises a single pane against the mock provider.
//!
//! # Test Coverage
//!
//! - **Root Loading**: category roots, initial navigation and expansion
//! - **Lazy Children**: idempotent loads, concurrent loads of one parent
//! - **Selection**: single and multi toggling, command bar operations
//! - **Mutations**: rename, delete, copy and move only change state after success
//! - **Stale Completions**: results for a previous binding are dropped
//! - **Forest Invariant**: pane node maps stay consistent after every operation

use orgexplorer::app::explorer::config::MockConfig;
use orgexplorer::app::explorer::mock_provider::{root_id, ProviderOperation};
use orgexplorer::app::explorer::types::check_forest;
use orgexplorer::app::explorer::{
    ExplorerError, MockDataProvider, PaneController, ResourceKind,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn boards() -> String {
    root_id("orgA", ResourceKind::Boards)
}

fn repos() -> String {
    root_id("orgA", ResourceKind::Repos)
}

fn child(parent: &str, i: usize) -> String {
    format!("{}::child{}", parent, i)
}

async fn loaded(provider: Arc<MockDataProvider>) -> PaneController {
    let pane = PaneController::new("orgA", provider);
    pane.load_root().await.unwrap();
    pane
}

async fn visible_ids(pane: &PaneController) -> Vec<String> {
    pane.visible_children()
        .await
        .into_iter()
        .map(|n| n.id)
        .collect()
}

// ============================================================================
// Root Loading and Lazy Children
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_root_load_opens_first_category() {
    let provider = Arc::new(MockDataProvider::new(MockConfig::default()));
    let pane = loaded(provider).await;

    let state = pane.pane_state().await.unwrap();
    assert_eq!(state.root_ids.len(), 5);
    assert_eq!(state.current_folder_id, boards());
    assert_eq!(state.expanded_ids, HashSet::from([boards()]));
    assert!(state.selected_ids.is_empty());
    assert!(pane.visible_children().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_children_load_is_idempotent() {
    let provider = Arc::new(MockDataProvider::new(MockConfig::default()));
    let pane = loaded(provider).await;

    pane.refresh_children(&boards()).await.unwrap();
    let first = pane.visible_children().await;
    pane.refresh_children(&boards()).await.unwrap();
    let second = pane.visible_children().await;

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(
        first.iter().map(|n| n.name.as_str()).collect::<Vec<_>>(),
        vec!["Folder 1", "Item 2", "Folder 3"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_loads_of_one_parent_share_children() {
    let provider = Arc::new(MockDataProvider::new(MockConfig::default()));
    let pane = loaded(provider.clone()).await;

    let (boards_a, boards_b) = (boards(), boards());
    let (a, b) = tokio::join!(
        pane.refresh_children(&boards_a),
        pane.refresh_children(&boards_b)
    );
    a.unwrap();
    b.unwrap();

    let generated = provider
        .snapshot("orgA")
        .await
        .values()
        .filter(|n| n.parent_id.as_deref() == Some(boards().as_str()))
        .count();
    assert_eq!(generated, 3);
    assert_eq!(provider.calls_of(ProviderOperation::LoadChildren).await.len(), 2);
    assert_eq!(
        visible_ids(&pane).await,
        vec![child(&boards(), 1), child(&boards(), 2), child(&boards(), 3)]
    );
}

#[tokio::test]
async fn test_unknown_organization_fails_to_load() {
    let pane = PaneController::new("nowhere", Arc::new(MockDataProvider::instant()));
    let result = pane.load_root().await;
    assert!(matches!(result, Err(ExplorerError::NotFound { .. })));
    assert!(!pane.is_loaded().await);
}

#[tokio::test]
async fn test_children_of_unknown_node_not_found() {
    let pane = loaded(Arc::new(MockDataProvider::instant())).await;
    let result = pane.refresh_children("orga:root:nothing").await;
    assert!(matches!(result, Err(ExplorerError::NotFound { .. })));
}

// ============================================================================
// Stale Completions
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_rebind_drops_stale_root_load() {
    let provider = Arc::new(MockDataProvider::new(MockConfig::default()));
    let pane = PaneController::new("orgA", provider);

    let (stale, _) = tokio::join!(pane.load_root(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        pane.rebind("orgB").await;
    });

    assert!(stale.is_ok());
    assert!(!pane.is_loaded().await);
    assert_eq!(pane.organization_id().await, "orgB");

    pane.load_root().await.unwrap();
    assert_eq!(
        pane.current_folder_id().await,
        Some(root_id("orgB", ResourceKind::Boards))
    );
}

#[tokio::test(start_paused = true)]
async fn test_rebind_swallows_stale_failure() {
    let provider = Arc::new(MockDataProvider::new(MockConfig::default()));
    let pane = loaded(provider.clone()).await;
    provider
        .fail_next(
            ProviderOperation::LoadChildren,
            ExplorerError::unavailable("simulated outage"),
        )
        .await;

    let boards_id = boards();
    let (stale, _) = tokio::join!(pane.refresh_children(&boards_id), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        pane.rebind("orgB").await;
    });

    assert!(stale.is_ok());
    assert!(!pane.is_loaded().await);
}

// ============================================================================
// Navigation, Selection and Filtering
// ============================================================================

#[tokio::test]
async fn test_selection_toggles() {
    let pane = loaded(Arc::new(MockDataProvider::instant())).await;
    let a = child(&boards(), 1);
    let b = child(&boards(), 2);

    pane.toggle_select(&a, false).await;
    assert_eq!(pane.selected_ids().await, vec![a.clone()]);
    pane.toggle_select(&b, true).await;
    assert_eq!(pane.selected_ids().await, vec![a.clone(), b.clone()]);
    pane.toggle_select(&a, true).await;
    assert_eq!(pane.selected_ids().await, vec![b.clone()]);
    pane.toggle_select(&b, false).await;
    assert!(pane.selected_ids().await.is_empty());
}

#[tokio::test]
async fn test_toggle_expand_does_not_load() {
    let provider = Arc::new(MockDataProvider::instant());
    let pane = loaded(provider.clone()).await;

    pane.toggle_expand(&repos()).await;
    assert!(pane.pane_state().await.unwrap().expanded_ids.contains(&repos()));
    assert!(provider.calls_of(ProviderOperation::LoadChildren).await.is_empty());

    pane.toggle_expand(&repos()).await;
    assert!(!pane.pane_state().await.unwrap().expanded_ids.contains(&repos()));
}

#[tokio::test]
async fn test_filter_matches_names_case_insensitively() {
    let pane = loaded(Arc::new(MockDataProvider::instant())).await;
    pane.refresh().await.unwrap();

    pane.set_filter("ITEM").await;
    assert_eq!(visible_ids(&pane).await, vec![child(&boards(), 2)]);

    pane.set_filter("").await;
    assert_eq!(visible_ids(&pane).await.len(), 3);
}

#[tokio::test]
async fn test_navigate_into_loaded_folder() {
    let pane = loaded(Arc::new(MockDataProvider::instant())).await;
    pane.refresh().await.unwrap();
    let folder = child(&boards(), 1);

    assert!(pane.navigate_to(&folder).await);
    assert!(pane.visible_children().await.is_empty());
    assert!(pane.ensure_children(&folder).await.unwrap());
    assert_eq!(visible_ids(&pane).await.len(), 3);
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_rename_failure_leaves_name_unchanged() {
    let provider = Arc::new(MockDataProvider::instant());
    let pane = loaded(provider.clone()).await;
    pane.refresh().await.unwrap();
    let id = child(&boards(), 1);
    provider
        .fail_next(
            ProviderOperation::Rename,
            ExplorerError::unavailable("simulated rejection"),
        )
        .await;

    let result = pane.rename(&id, "Renamed").await;

    assert!(result.is_err());
    assert_eq!(pane.node(&id).await.unwrap().name, "Folder 1");
}

#[tokio::test]
async fn test_rename_selected_trims_and_requires_single_selection() {
    let provider = Arc::new(MockDataProvider::instant());
    let pane = loaded(provider.clone()).await;
    pane.refresh().await.unwrap();
    let a = child(&boards(), 1);
    let b = child(&boards(), 2);

    pane.toggle_select(&a, false).await;
    pane.toggle_select(&b, true).await;
    assert_eq!(pane.rename_selected("Nope").await.unwrap(), None);
    assert!(provider.calls_of(ProviderOperation::Rename).await.is_empty());

    pane.toggle_select(&b, true).await;
    let renamed = pane.rename_selected("  Planning  ").await.unwrap().unwrap();
    assert_eq!(renamed.name, "Planning");
    assert_eq!(pane.node(&a).await.unwrap().name, "Planning");
}

#[tokio::test]
async fn test_rename_rejects_blank_and_skips_unchanged() {
    let provider = Arc::new(MockDataProvider::instant());
    let pane = loaded(provider.clone()).await;
    pane.refresh().await.unwrap();
    let id = child(&boards(), 2);

    assert!(matches!(
        pane.rename(&id, "   ").await,
        Err(ExplorerError::InvalidName { .. })
    ));
    assert_eq!(pane.rename(&id, "Item 2").await.unwrap().name, "Item 2");
    assert!(provider.calls_of(ProviderOperation::Rename).await.is_empty());
}

#[tokio::test]
async fn test_delete_current_folder_falls_back_to_parent() {
    let provider = Arc::new(MockDataProvider::instant());
    let pane = loaded(provider.clone()).await;
    pane.refresh().await.unwrap();
    let folder = child(&boards(), 1);
    pane.navigate_to(&folder).await;
    pane.refresh().await.unwrap();
    pane.toggle_select(&folder, false).await;

    pane.delete_selected().await.unwrap();

    let state = pane.pane_state().await.unwrap();
    assert_eq!(state.current_folder_id, boards());
    assert!(state.selected_ids.is_empty());
    assert!(pane.node(&folder).await.is_none());
    assert!(pane.node(&child(&folder, 1)).await.is_none());
    assert_eq!(visible_ids(&pane).await, vec![child(&boards(), 2), child(&boards(), 3)]);
    assert!(check_forest(&pane.nodes().await).is_empty());
}

#[tokio::test]
async fn test_delete_failure_keeps_state() {
    let provider = Arc::new(MockDataProvider::instant());
    let pane = loaded(provider.clone()).await;
    pane.refresh().await.unwrap();
    provider
        .fail_next(
            ProviderOperation::Delete,
            ExplorerError::Unauthorized {
                message: "expired".to_string(),
            },
        )
        .await;

    let result = pane.delete(&[child(&boards(), 2)]).await;

    assert!(matches!(result, Err(ExplorerError::Unauthorized { .. })));
    assert_eq!(visible_ids(&pane).await.len(), 3);
}

#[tokio::test]
async fn test_copy_refreshes_target_listing() {
    let provider = Arc::new(MockDataProvider::instant());
    let pane = loaded(provider).await;
    pane.refresh().await.unwrap();
    let item = child(&boards(), 2);

    let clones = pane.copy(&[item.clone()], &boards()).await.unwrap();

    assert_eq!(clones[0].id, format!("{}:copy", item));
    assert_eq!(visible_ids(&pane).await.len(), 4);
    assert_eq!(pane.node(&item).await.unwrap().name, "Item 2");
}

#[tokio::test]
async fn test_move_within_pane_rederives_paths() {
    let provider = Arc::new(MockDataProvider::instant());
    let pane = loaded(provider).await;
    pane.refresh().await.unwrap();
    let folder = child(&boards(), 1);
    pane.ensure_children(&folder).await.unwrap();
    pane.toggle_select(&folder, false).await;

    pane.move_nodes(&[folder.clone()], &repos()).await.unwrap();

    let nodes = pane.nodes().await;
    assert!(check_forest(&nodes).is_empty());
    assert_eq!(nodes[&folder].path, vec![repos(), folder.clone()]);
    assert!(!nodes.contains_key(&child(&folder, 1)));
    assert!(pane.selected_ids().await.is_empty());
    assert_eq!(visible_ids(&pane).await, vec![child(&boards(), 2), child(&boards(), 3)]);

    pane.ensure_children(&folder).await.unwrap();
    let nodes = pane.nodes().await;
    assert_eq!(
        nodes[&child(&folder, 1)].path,
        vec![repos(), folder.clone(), child(&folder, 1)]
    );
    assert!(check_forest(&nodes).is_empty());
}

#[tokio::test]
async fn test_move_seen_from_second_pane_relocates_folder() {
    let provider = Arc::new(MockDataProvider::instant());
    let watcher = loaded(provider.clone()).await;
    watcher.refresh().await.unwrap();
    let folder = child(&boards(), 1);
    watcher.ensure_children(&folder).await.unwrap();
    watcher.toggle_select(&child(&folder, 2), false).await;

    let mover = loaded(provider).await;
    mover.refresh().await.unwrap();
    mover.move_nodes(&[folder.clone()], &repos()).await.unwrap();

    watcher.refresh_children(&repos()).await.unwrap();

    let nodes = watcher.nodes().await;
    assert!(check_forest(&nodes).is_empty());
    assert_eq!(nodes[&folder].path, vec![repos(), folder.clone()]);
    assert!(nodes[&repos()].children.as_ref().unwrap().contains(&folder));
    assert!(!nodes[&boards()].children.as_ref().unwrap().contains(&folder));
    assert!(!nodes.contains_key(&child(&folder, 1)));
    assert!(watcher.selected_ids().await.is_empty());
    assert_eq!(
        visible_ids(&watcher).await,
        vec![child(&boards(), 2), child(&boards(), 3)]
    );
}

#[tokio::test]
async fn test_invalid_move_leaves_pane_untouched() {
    let provider = Arc::new(MockDataProvider::instant());
    let pane = loaded(provider).await;
    pane.refresh().await.unwrap();
    let before = pane.nodes().await;

    let result = pane
        .move_nodes(&[child(&boards(), 1)], &child(&boards(), 2))
        .await;

    assert!(matches!(result, Err(ExplorerError::InvalidTarget { .. })));
    assert_eq!(pane.nodes().await, before);
}

// ============================================================================
// Command Bar
// ============================================================================

#[tokio::test]
async fn test_expand_all_then_collapse_all() {
    let pane = loaded(Arc::new(MockDataProvider::instant())).await;
    pane.refresh().await.unwrap();

    pane.expand_all().await;
    let expanded = pane.pane_state().await.unwrap().expanded_ids;
    assert_eq!(expanded.len(), 5 + 2);

    pane.collapse_all().await;
    assert_eq!(
        pane.pane_state().await.unwrap().expanded_ids,
        HashSet::from([boards()])
    );
}
