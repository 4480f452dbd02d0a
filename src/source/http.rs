//! Project-management REST API as a project source.

use super::{default_portfolio_name, parse_projects, ProjectSource, SourcePortfolio};
use crate::config::SourceConfig;
use crate::error::SourceError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Fetches portfolios over HTTP.
///
/// Endpoints: `GET {base}/portfolios/{id}` for the portfolio itself and
/// `GET {base}/portfolios/{id}/projects` for its projects.
pub struct HttpSource {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: &str, token: Option<String>, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .context("No source URL configured (use --source-url or [source] base_url)")?;
        Self::new(base_url, config.token.clone(), config.timeout_seconds)
    }

    fn portfolio_url(&self, portfolio_id: &str) -> String {
        format!("{}/portfolios/{}", self.base_url, portfolio_id)
    }

    async fn get_json(&self, url: &str) -> Result<Value, SourceError> {
        debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| SourceError::Unreachable {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(SourceError::Unauthorized {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl ProjectSource for HttpSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn fetch_portfolio(&self, portfolio_id: &str) -> Result<SourcePortfolio, SourceError> {
        let url = self.portfolio_url(portfolio_id);

        let meta = match self.get_json(&url).await {
            Err(SourceError::Api { status: 404, .. }) => {
                return Err(SourceError::NotFound(portfolio_id.to_string()))
            }
            other => other?,
        };
        // Some APIs wrap the object in a `portfolio` envelope.
        let meta = meta.get("portfolio").cloned().unwrap_or(meta);
        let name = meta
            .get("name")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| default_portfolio_name(portfolio_id));

        let projects = parse_projects(self.get_json(&format!("{}/projects", url)).await?)?;
        info!("Fetched {} projects for portfolio {}", projects.len(), name);

        Ok(SourcePortfolio {
            id: portfolio_id.to_string(),
            name,
            projects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let source = HttpSource::new("https://pm.example.com/api/v1/", None, 5).unwrap();
        assert_eq!(source.describe(), "https://pm.example.com/api/v1");
        assert_eq!(
            source.portfolio_url("42"),
            "https://pm.example.com/api/v1/portfolios/42"
        );
    }

    #[test]
    fn test_from_config_requires_url() {
        let config = SourceConfig::default();
        assert!(HttpSource::from_config(&config).is_err());

        let config = SourceConfig {
            base_url: Some("http://localhost:8080".to_string()),
            ..SourceConfig::default()
        };
        assert!(HttpSource::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_is_retryable() {
        let source = HttpSource::new("http://127.0.0.1:9", None, 5).unwrap();
        let err = source.fetch_portfolio("1").await.unwrap_err();
        assert!(matches!(err, SourceError::Unreachable { .. }));
        assert!(err.is_retryable());
    }
}
