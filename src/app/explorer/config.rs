//! Explorer configuration
//!
//! Loaded from TOML. Every field has a default so an absent or partial file
//! yields a working mock setup with `orgA` on the left and `orgB` on the right.

use super::breadcrumbs::{DEFAULT_BREADCRUMB_BUDGET, MIN_BREADCRUMB_BUDGET};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which backend serves the node graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Mock,
    Api,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub provider: ProviderKind,
    pub left_organization: String,
    pub right_organization: String,
    /// Max breadcrumb segments shown before collapsing
    pub breadcrumb_budget: usize,
    pub mock: MockConfig,
    pub api: ApiConfig,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Mock,
            left_organization: "orgA".to_string(),
            right_organization: "orgB".to_string(),
            breadcrumb_budget: DEFAULT_BREADCRUMB_BUDGET,
            mock: MockConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Simulated latency for every provider call
    pub latency_ms: u64,
    pub children_per_folder: usize,
    /// Organizations seeded with category roots
    pub organizations: Vec<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency_ms: 150,
            children_per_folder: 3,
            organizations: vec!["orgA".to_string(), "orgB".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    /// How long a fetched children listing is reused
    pub children_cache_ttl_secs: u64,
    /// Environment variable holding the bearer token
    pub token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 30,
            children_cache_ttl_secs: 30,
            token_env: "ORGEXPLORER_TOKEN".to_string(),
        }
    }
}

impl ExplorerConfig {
    /// Default config location (`<config_dir>/orgexplorer.toml`)
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "", "orgexplorer")
            .map(|dirs| dirs.config_dir().join("orgexplorer.toml"))
    }

    /// Load and validate a config file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: ExplorerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else the default location; missing default file yields defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Some(default) if default.exists() => Self::load_from_file(default),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.left_organization.trim().is_empty() || self.right_organization.trim().is_empty()
        {
            return Err(anyhow!("Both pane organizations must be set"));
        }
        if self.left_organization.trim() == self.right_organization.trim() {
            return Err(anyhow!(
                "Panes must show two different organizations, both are {:?}",
                self.left_organization
            ));
        }
        if self.breadcrumb_budget < MIN_BREADCRUMB_BUDGET {
            return Err(anyhow!(
                "breadcrumb_budget must be at least {}, got {}",
                MIN_BREADCRUMB_BUDGET,
                self.breadcrumb_budget
            ));
        }
        if self.provider == ProviderKind::Api && self.api.base_url.is_none() {
            return Err(anyhow!("api.base_url is required when provider = \"api\""));
        }
        if self.provider == ProviderKind::Mock && self.mock.children_per_folder == 0 {
            return Err(anyhow!("mock.children_per_folder must be positive"));
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file {:?}", path.as_ref()))?;
        Ok(())
    }
}
