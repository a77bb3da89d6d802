use std::time::Duration;

use anyhow::{bail, Context, Result};
use url::Url;

use crate::cli::ServerArgs;
use crate::client::HttpEvaluationApi;
use crate::i18n::Locale;
use crate::model::{EvaluationRequest, Operator};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_QRELS_FILE: &str = "data/qrels.txt";

/// What the dashboard asks for and how it presents the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub qrels_file: String,
    pub operator: Operator,
    pub locale: Locale,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            qrels_file: DEFAULT_QRELS_FILE.to_string(),
            operator: Operator::default(),
            locale: Locale::default(),
        }
    }
}

impl DashboardConfig {
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn with_qrels_file(mut self, qrels_file: impl Into<String>) -> Self {
        self.qrels_file = qrels_file.into();
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn request(&self, operator: Operator) -> EvaluationRequest {
        EvaluationRequest {
            qrels_file: self.qrels_file.clone(),
            operator,
        }
    }
}

/// Where the evaluation server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub url: Url,
    pub timeout: Option<Duration>,
}

impl ServerConfig {
    pub fn from_args(args: &ServerArgs) -> Result<Self> {
        let url = parse_server_url(&args.server_url)?;

        let timeout = match args.timeout_secs {
            Some(0) => bail!("--timeout-secs must be greater than zero"),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(Self { url, timeout })
    }

    pub fn connect(&self) -> Result<HttpEvaluationApi> {
        HttpEvaluationApi::new(self.url.clone(), self.timeout)
            .with_context(|| format!("failed to build http client for {}", self.url))
    }
}

/// Parses the base URL and guarantees a trailing slash so relative endpoint
/// paths join under it instead of replacing its last segment.
pub fn parse_server_url(raw: &str) -> Result<Url> {
    let mut url =
        Url::parse(raw.trim()).with_context(|| format!("invalid server url: {raw}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        bail!("server url must use http or https: {raw}");
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
