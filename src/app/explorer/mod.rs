//! Dual-pane resource explorer core.
//!
//! Two panes each browse one organization's resource forest through a shared
//! [`DataProvider`]. Nodes are loaded lazily; mutations go through the provider
//! first and only then touch pane state.
//!
//! # Modules
//! - [`types`] - node graph, pane state and forest checks
//! - [`provider`] - the backend contract, with [`mock_provider`] and [`api_provider`]
//! - [`pane`] - per-pane navigation, selection and mutation
//! - [`drag`] - cross-pane drag intent
//! - [`breadcrumbs`] - collapsed navigation trail
//! - [`session`] - two panes, one provider, one drag coordinator

pub mod api_provider;
pub mod breadcrumbs;
pub mod config;
pub mod credentials;
pub mod drag;
pub mod errors;
pub mod mock_provider;
pub mod pane;
pub mod provider;
pub mod session;
pub mod types;

pub use breadcrumbs::{
    collapse_breadcrumbs, BreadcrumbItem, DEFAULT_BREADCRUMB_BUDGET, MIN_BREADCRUMB_BUDGET,
};
pub use config::{ExplorerConfig, ProviderKind};
pub use drag::{DragDropCoordinator, DragState, DropOutcome};
pub use errors::{ExplorerError, ExplorerResult};
pub use mock_provider::MockDataProvider;
pub use pane::PaneController;
pub use provider::{DataProvider, MoveTarget, RootListing};
pub use session::{DropReport, ExplorerSession, PaneSide};
pub use types::{BreadcrumbSegment, PaneState, ResourceKind, ResourceNode};
