//! HTTP-backed data provider.
//!
//! Talks JSON to the resource proxy. Every request carries a bearer token from
//! the configured [`AccessTokenSource`]. Children listings are kept in a short
//! lived Moka cache keyed by `(organization, parent)`; `try_get_with` coalesces
//! concurrent loads of the same parent into one request, which gives the
//! at-most-once materialization the provider contract requires. Any successful
//! mutation clears the cache.

use super::config::ApiConfig;
use super::credentials::AccessTokenSource;
use super::errors::{ExplorerError, ExplorerResult};
use super::provider::{DataProvider, MoveTarget, RootListing};
use super::types::ResourceNode;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

type ChildrenKey = (String, String);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RootsResponse {
    nodes: Vec<ResourceNode>,
    root_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RenameRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveRequest<'a> {
    ids: &'a [String],
    target_organization_id: &'a str,
    target_parent_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CopyRequest<'a> {
    ids: &'a [String],
    target_parent_id: &'a str,
}

/// `Retry-After` as delay-seconds or an HTTP date
fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let delta = at.with_timezone(&chrono::Utc) - chrono::Utc::now();
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

pub struct ApiDataProvider {
    client: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn AccessTokenSource>,
    children: Cache<ChildrenKey, Arc<Vec<ResourceNode>>>,
}

impl ApiDataProvider {
    pub fn new(config: &ApiConfig, tokens: Arc<dyn AccessTokenSource>) -> Result<Self> {
        let raw = config
            .base_url
            .as_deref()
            .ok_or_else(|| anyhow!("api.base_url is not configured"))?;
        let base_url = Url::parse(raw).with_context(|| format!("Invalid api.base_url '{}'", raw))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("api.base_url '{}' cannot be used as a base", raw));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let children = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(config.children_cache_ttl_secs))
            .build();

        Ok(Self {
            client,
            base_url,
            tokens,
            children,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/orgs/{org}/{segments...}`, each segment percent-encoded
    fn endpoint(&self, organization_id: &str, segments: &[&str]) -> ExplorerResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ExplorerError::unavailable("base url cannot carry a path"))?;
            path.pop_if_empty().push("orgs").push(organization_id);
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn authorized(&self, request: reqwest::RequestBuilder) -> ExplorerResult<reqwest::RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(request.bearer_auth(token))
    }

    /// Send and check status; `id` names the addressed node for `NotFound`
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        organization_id: &str,
        id: &str,
    ) -> ExplorerResult<reqwest::Response> {
        let response = self.authorized(request).await?.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.text().await.unwrap_or_default();
        let err = ExplorerError::from_status(status.as_u16(), &body, organization_id, id)
            .with_retry_after(retry_after);
        error!("API request for {}/{} failed: {}", organization_id, id, err);
        Err(err)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        organization_id: &str,
        id: &str,
    ) -> ExplorerResult<T> {
        let response = self.execute(request, organization_id, id).await?;
        Ok(response.json::<T>().await?)
    }

    async fn fetch_children(
        &self,
        organization_id: &str,
        parent_id: &str,
    ) -> ExplorerResult<Vec<ResourceNode>> {
        let url = self.endpoint(organization_id, &["nodes", parent_id, "children"])?;
        debug!("GET {}", url);
        self.fetch(self.client.get(url), organization_id, parent_id)
            .await
    }
}

#[async_trait]
impl DataProvider for ApiDataProvider {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn load_root(&self, organization_id: &str) -> ExplorerResult<RootListing> {
        let url = self.endpoint(organization_id, &["roots"])?;
        debug!("GET {}", url);
        let response: RootsResponse = self
            .fetch(self.client.get(url), organization_id, organization_id)
            .await?;
        info!(
            "Loaded {} root(s) for {} from API",
            response.root_ids.len(),
            organization_id
        );
        Ok(RootListing {
            nodes: response.nodes,
            root_ids: response.root_ids,
        })
    }

    async fn load_children(
        &self,
        organization_id: &str,
        parent_id: &str,
    ) -> ExplorerResult<Vec<ResourceNode>> {
        let key = (organization_id.to_string(), parent_id.to_string());
        let children = self
            .children
            .try_get_with(key, async {
                self.fetch_children(organization_id, parent_id)
                    .await
                    .map(Arc::new)
            })
            .await
            .map_err(|e: Arc<ExplorerError>| (*e).clone())?;
        Ok(children.as_ref().clone())
    }

    async fn rename(
        &self,
        organization_id: &str,
        id: &str,
        new_name: &str,
    ) -> ExplorerResult<ResourceNode> {
        let url = self.endpoint(organization_id, &["nodes", id])?;
        let request = self.client.patch(url).json(&RenameRequest { name: new_name });
        let node = self.fetch(request, organization_id, id).await?;
        self.children.invalidate_all();
        Ok(node)
    }

    async fn delete(&self, organization_id: &str, ids: &[String]) -> ExplorerResult<()> {
        let url = self.endpoint(organization_id, &["nodes:delete"])?;
        let request = self.client.post(url).json(&DeleteRequest { ids });
        let first = ids.first().map(String::as_str).unwrap_or_default();
        self.execute(request, organization_id, first).await?;
        self.children.invalidate_all();
        Ok(())
    }

    async fn move_nodes(
        &self,
        organization_id: &str,
        ids: &[String],
        target: &MoveTarget,
    ) -> ExplorerResult<()> {
        let url = self.endpoint(organization_id, &["nodes:move"])?;
        let request = self.client.post(url).json(&MoveRequest {
            ids,
            target_organization_id: &target.organization_id,
            target_parent_id: &target.parent_id,
        });
        let first = ids.first().map(String::as_str).unwrap_or_default();
        self.execute(request, organization_id, first).await?;
        self.children.invalidate_all();
        Ok(())
    }

    async fn copy(
        &self,
        organization_id: &str,
        ids: &[String],
        target_parent_id: &str,
    ) -> ExplorerResult<Vec<ResourceNode>> {
        let url = self.endpoint(organization_id, &["nodes:copy"])?;
        let request = self.client.post(url).json(&CopyRequest {
            ids,
            target_parent_id,
        });
        let clones = self.fetch(request, organization_id, target_parent_id).await?;
        self.children.invalidate_all();
        Ok(clones)
    }

    async fn forget_children(&self, organization_id: &str, parent_id: &str) {
        self.children
            .invalidate(&(organization_id.to_string(), parent_id.to_string()))
            .await;
    }
}
