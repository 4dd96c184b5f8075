//! Access-token collaborator for remote providers.
//!
//! Authentication itself happens elsewhere; a provider only asks for a bearer
//! token before each request. Failing to produce one maps to
//! [`ExplorerError::Unauthorized`].

use super::errors::{ExplorerError, ExplorerResult};
use async_trait::async_trait;

#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> ExplorerResult<String>;
}

/// Fixed token, mainly for tests and service accounts
#[derive(Debug, Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> ExplorerResult<String> {
        Ok(self.token.clone())
    }
}

/// Reads the token from an environment variable on every request, so a
/// refreshed token is picked up without restarting.
#[derive(Debug, Clone)]
pub struct EnvToken {
    variable: String,
}

impl EnvToken {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

#[async_trait]
impl AccessTokenSource for EnvToken {
    async fn access_token(&self) -> ExplorerResult<String> {
        match std::env::var(&self.variable) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(ExplorerError::Unauthorized {
                message: format!("no access token in ${}", self.variable),
            }),
        }
    }
}
