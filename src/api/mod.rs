//! HTTP clients for the simulation API.
//!
//! `ApiClient` owns the base URL and a resource path and does the GET; the
//! endpoint clients wrap it. Failures come back as `ApiError`, never as an
//! empty result.

pub mod trajectory;
pub mod vessels;

use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;

pub use trajectory::{
    TrajectoryApi, TrajectoryCollection, TrajectoryParam, TranslateError, TranslatedRequest,
};
pub use vessels::VesselsApi;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// `base` always acts as a directory; `path` is resolved under it.
pub fn resource_url(base: &str, path: &str) -> Result<Url, ApiError> {
    let mut base = base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let invalid = |reason: String| ApiError::InvalidUrl {
        url: format!("{base}{path}"),
        reason,
    };
    let base_url = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
    if base_url.cannot_be_a_base() {
        return Err(invalid("not a base url".to_string()));
    }
    base_url
        .join(path.trim_start_matches('/'))
        .map_err(|e| invalid(e.to_string()))
}

pub struct ApiClient {
    http: reqwest::Client,
    url: Url,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, path: &str) -> Result<Self, ApiError> {
        let url = resource_url(&config.base_url, path)?;
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("voyager/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::Client)?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// GET the resource with `query` and decode the JSON body.
    #[instrument(name = "api_get", skip(self, query), fields(url = %self.url))]
    pub async fn get<Q, R>(&self, query: &Q) -> Result<R, ApiError>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url.to_string();
        let transport = |source: reqwest::Error| {
            warn!(error = %source, "request failed");
            ApiError::Transport {
                url: url.clone(),
                source,
            }
        };

        let resp = self
            .http
            .get(self.url.clone())
            .query(query)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "request rejected");
            return Err(ApiError::Status {
                url: url.clone(),
                status,
            });
        }

        let body = resp.bytes().await.map_err(transport)?;
        debug!(bytes = body.len(), "response received");
        serde_json::from_slice(&body).map_err(|source| {
            warn!(error = %source, "response body did not decode");
            ApiError::Decode {
                url: url.clone(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_resolve_under_the_base() {
        let url = resource_url("https://voyager.gu.se/api/", "trajectory/").unwrap();
        assert_eq!(url.as_str(), "https://voyager.gu.se/api/trajectory/");

        // no trailing slash on the base, leading slash on the path
        let url = resource_url("http://127.0.0.1:5000/api", "/vessels/").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/api/vessels/");
    }

    #[test]
    fn bad_base_is_reported() {
        assert!(matches!(
            resource_url("not a url", "trajectory/"),
            Err(ApiError::InvalidUrl { .. })
        ));
        assert!(matches!(
            resource_url("mailto:someone@example.com", "trajectory/"),
            Err(ApiError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn client_keeps_its_resource_url() {
        let cfg = ApiConfig::with_base_url("http://localhost:5000/api/");
        let client = ApiClient::new(&cfg, "trajectory/").unwrap();
        assert_eq!(client.url().as_str(), "http://localhost:5000/api/trajectory/");
    }
}
