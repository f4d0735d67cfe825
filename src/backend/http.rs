//! HTTP client for the imagery compute service.
//!
//! Speaks the declarative protocol: each trait operation POSTs a serialized
//! expression to its compute endpoint and reads back a scalar or a feature
//! list. Constructed once at startup (`from_env`) and shared read-only for
//! the process lifetime.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::expr::{CollectionExpr, GeometryArea, RawFeature, RegionSum, VectorizeRequest};
use super::{BackendError, ImageryBackend};

/// Env var for the compute service base URL.
pub const BACKEND_URL_ENV: &str = "GEOLENS_BACKEND_URL";
/// Env var for the optional project id attached to every request.
pub const BACKEND_PROJECT_ENV: &str = "GEOLENS_BACKEND_PROJECT";
/// Env var for the optional bearer token.
pub const BACKEND_TOKEN_ENV: &str = "GEOLENS_BACKEND_TOKEN";

const DEFAULT_BASE_URL: &str = "http://localhost:8085";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Imagery compute client over HTTP/JSON.
pub struct HttpImageryClient {
    base_url: String,
    project: Option<String>,
    token: Option<String>,
    client: reqwest::Client,
    timeout_secs: u64,
}

/// Request envelope: the expression plus the optional billing project.
#[derive(Serialize)]
struct ComputeEnvelope<'a, E: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<&'a str>,
    expression: &'a E,
}

#[derive(Deserialize)]
struct ValueResponse<T> {
    value: T,
}

#[derive(Deserialize)]
struct FeaturesResponse {
    features: Vec<RawFeature>,
}

impl HttpImageryClient {
    /// Create a client pointing at a compute service.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project: None,
            token: None,
            client,
            timeout_secs,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build the process-wide client from the environment, falling back to
    /// a local compute service with the default timeout.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(BACKEND_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut client = Self::new(&base_url, DEFAULT_TIMEOUT_SECS);
        if let Ok(project) = std::env::var(BACKEND_PROJECT_ENV) {
            client = client.with_project(project);
        }
        if let Ok(token) = std::env::var(BACKEND_TOKEN_ENV) {
            client = client.with_token(token);
        }
        client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn compute<E: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        expression: &E,
    ) -> Result<T, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let envelope = ComputeEnvelope {
            project: self.project.as_deref(),
            expression,
        };

        let mut request = self.client.post(&url).json(&envelope);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                BackendError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                BackendError::Timeout(self.timeout_secs)
            } else {
                BackendError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Compute {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::ResponseParsing(e.to_string()))
    }
}

#[async_trait]
impl ImageryBackend for HttpImageryClient {
    async fn collection_size(&self, collection: &CollectionExpr) -> Result<u64, BackendError> {
        let parsed: ValueResponse<u64> =
            self.compute("/v1/collections:size", collection).await?;
        Ok(parsed.value)
    }

    async fn region_sum(&self, request: &RegionSum) -> Result<f64, BackendError> {
        let parsed: ValueResponse<f64> = self.compute("/v1/images:reduce", request).await?;
        Ok(parsed.value)
    }

    async fn geometry_area(&self, request: &GeometryArea) -> Result<f64, BackendError> {
        let parsed: ValueResponse<f64> = self.compute("/v1/geometries:area", request).await?;
        Ok(parsed.value)
    }

    async fn reduce_to_vectors(
        &self,
        request: &VectorizeRequest,
    ) -> Result<Vec<RawFeature>, BackendError> {
        let parsed: FeaturesResponse = self.compute("/v1/images:vectorize", request).await?;
        Ok(parsed.features)
    }
}
