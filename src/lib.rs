//! Organization Explorer - dual-pane browser for organization resource trees
//!
//! Two panes each show one organization's resources (boards, repos, pipelines,
//! tests, artifacts and their folders). Users navigate, select, rename, delete,
//! copy and move nodes, and drag nodes from one organization to the other.
//!
//! # Architecture Overview
//!
//! - **Node graph** ([`app::explorer::types`]): per-organization forest of
//!   [`app::explorer::ResourceNode`]s addressed by id, each carrying its full path
//! - **Data providers** ([`app::explorer::provider`]): async backend contract with an
//!   in-memory mock and an HTTP implementation
//! - **Panes** ([`app::explorer::pane`]): lazy loading, navigation and selection,
//!   guarded against stale completions
//! - **Session** ([`app::explorer::session`]): two panes plus the drag coordinator
//!
//! # Logging
//!
//! The binary installs a reloadable `EnvFilter`; its handle is registered here
//! so the filter can be changed while running via [`set_log_filter`].

#![warn(clippy::all, rust_2018_idioms)]

pub mod app;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::OnceCell;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "orgexplorer=info,reqwest=warn,hyper=warn";

pub type TracingReloadHandle = reload::Handle<EnvFilter, Registry>;

static TRACING_RELOAD_HANDLE: OnceCell<TracingReloadHandle> = OnceCell::new();

/// Register the reload handle of the global filter. Only the first call wins.
pub fn set_tracing_reload_handle(handle: TracingReloadHandle) {
    if TRACING_RELOAD_HANDLE.set(handle).is_err() {
        tracing::warn!("Tracing reload handle already set, ignoring");
    }
}

/// Replace the active filter, e.g. `orgexplorer=debug`
pub fn set_log_filter(directives: &str) -> Result<()> {
    let handle = TRACING_RELOAD_HANDLE
        .get()
        .ok_or_else(|| anyhow!("Logging has not been initialized"))?;
    let filter = EnvFilter::builder()
        .parse(directives)
        .with_context(|| format!("Invalid log filter '{}'", directives))?;
    handle
        .reload(filter)
        .context("Failed to reload log filter")?;
    tracing::info!("Log filter changed to {}", directives);
    Ok(())
}
