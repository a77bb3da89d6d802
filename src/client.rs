//! Transport to the evaluation server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::model::{
    EvaluateResponseBody, EvaluationRequest, EvaluationResponse, MetricsInfo, SystemInfo,
};

pub const EVALUATE_PATH: &str = "api/evaluate";
pub const METRICS_DETAILS_PATH: &str = "api/metrics/details";
pub const SYSTEM_INFO_PATH: &str = "api/system/info";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(StatusCode),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),

    #[error("operation not supported by this transport: {0}")]
    Unsupported(&'static str),
}

#[async_trait]
pub trait EvaluationApi: Send + Sync {
    async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResponse, TransportError>;

    async fn metrics_details(&self) -> Result<MetricsInfo, TransportError>;

    async fn system_info(&self) -> Result<SystemInfo, TransportError> {
        Err(TransportError::Unsupported("system info"))
    }
}

pub fn decode_evaluate_body(raw: &[u8]) -> Result<EvaluationResponse, TransportError> {
    let body: EvaluateResponseBody = serde_json::from_slice(raw)
        .map_err(|err| TransportError::MalformedResponse(err.to_string()))?;
    EvaluationResponse::from_body(body).ok_or_else(|| {
        TransportError::MalformedResponse("success response without metrics".to_string())
    })
}

pub struct HttpEvaluationApi {
    client: Client,
    base_url: Url,
}

impl HttpEvaluationApi {
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.endpoint(path)?;
        debug!(url = %url, "GET");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl EvaluationApi for HttpEvaluationApi {
    async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResponse, TransportError> {
        let url = self.endpoint(EVALUATE_PATH)?;
        debug!(url = %url, operator = %request.operator, "POST");

        let response = self.client.post(url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }

        let raw = response.bytes().await?;
        decode_evaluate_body(&raw)
    }

    async fn metrics_details(&self) -> Result<MetricsInfo, TransportError> {
        let raw = self.get_bytes(METRICS_DETAILS_PATH).await?;
        serde_json::from_slice(&raw)
            .map_err(|err| TransportError::MalformedResponse(err.to_string()))
    }

    async fn system_info(&self) -> Result<SystemInfo, TransportError> {
        let raw = self.get_bytes(SYSTEM_INFO_PATH).await?;
        serde_json::from_slice(&raw)
            .map_err(|err| TransportError::MalformedResponse(err.to_string()))
    }
}

/// Serves a previously saved `/api/evaluate` response from disk.
pub struct ReplayApi {
    response_path: PathBuf,
    metrics_info_path: Option<PathBuf>,
}

impl ReplayApi {
    pub fn new(response_path: PathBuf, metrics_info_path: Option<PathBuf>) -> Self {
        Self {
            response_path,
            metrics_info_path,
        }
    }

    async fn read(path: &Path) -> Result<Vec<u8>, TransportError> {
        tokio::fs::read(path).await.map_err(|source| TransportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[async_trait]
impl EvaluationApi for ReplayApi {
    async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResponse, TransportError> {
        debug!(
            path = %self.response_path.display(),
            operator = %request.operator,
            "replaying saved evaluation"
        );
        let raw = Self::read(&self.response_path).await?;
        decode_evaluate_body(&raw)
    }

    async fn metrics_details(&self) -> Result<MetricsInfo, TransportError> {
        let path = self
            .metrics_info_path
            .as_ref()
            .ok_or(TransportError::Unsupported("metrics details without a saved file"))?;
        let raw = Self::read(path).await?;
        serde_json::from_slice(&raw)
            .map_err(|err| TransportError::MalformedResponse(err.to_string()))
    }
}
