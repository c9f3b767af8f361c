use crate::domain::analytics::{AnalyticsRecord, Symbol};
use crate::ingest::error::FetchError;
use crate::ingest::types::{json_kind, AnalyticsPayload};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_API_HOST: &str = "yahoo-finance127.p.rapidapi.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const ANALYTICS_PATH: &str = "finance-analytics";

const API_KEY_HEADER: &str = "x-rapidapi-key";
const API_HOST_HEADER: &str = "x-rapidapi-host";

#[async_trait::async_trait]
pub trait AnalyticsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_analytics(
        &self,
        symbol: &Symbol,
        api_key: Option<&str>,
    ) -> Result<AnalyticsRecord, FetchError>;
}

#[derive(Debug, Clone)]
pub struct RapidApiAnalyticsClient {
    http: reqwest::Client,
    base_url: Url,
    host: String,
}

impl RapidApiAnalyticsClient {
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("ANALYTICS_API_HOST")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_HOST.to_string());

        let base_url = std::env::var("ANALYTICS_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("https://{host}"));

        let timeout_secs = std::env::var("ANALYTICS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(&base_url, &host, Duration::from_secs(timeout_secs))
    }

    pub fn new(base_url: &str, host: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid analytics base url: {base_url}"))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build analytics http client")?;

        Ok(Self {
            http,
            base_url,
            host: host.to_string(),
        })
    }

    fn url(&self, symbol: &Symbol) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidBaseUrl)?
            .pop_if_empty()
            .push(ANALYTICS_PATH)
            .push(&symbol.path_segment());
        Ok(url)
    }

    fn headers(&self, api_key: Option<&str>) -> Result<HeaderMap, FetchError> {
        let api_key = api_key.ok_or(FetchError::MissingApiKey)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(api_key).map_err(|_| FetchError::InvalidHeader(API_KEY_HEADER))?,
        );
        headers.insert(
            API_HOST_HEADER,
            HeaderValue::from_str(&self.host)
                .map_err(|_| FetchError::InvalidHeader(API_HOST_HEADER))?,
        );
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl AnalyticsProvider for RapidApiAnalyticsClient {
    fn provider_name(&self) -> &'static str {
        "rapidapi_finance_analytics"
    }

    async fn fetch_analytics(
        &self,
        symbol: &Symbol,
        api_key: Option<&str>,
    ) -> Result<AnalyticsRecord, FetchError> {
        let url = self.url(symbol)?;
        let headers = self.headers(api_key)?;

        let res = self.http.get(url).headers(headers).send().await?;
        let status = res.status();
        let body = res.bytes().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        parse_analytics_body(symbol, &body, Utc::now())
    }
}

/// Turns a response body into a record, requiring a single UTF-8 JSON object.
pub fn parse_analytics_body(
    symbol: &Symbol,
    body: &[u8],
    fetched_at: DateTime<Utc>,
) -> Result<AnalyticsRecord, FetchError> {
    let parsed: Value = serde_json::from_slice(body)?;

    if tracing::enabled!(tracing::Level::DEBUG) {
        let pretty = serde_json::to_string_pretty(&parsed).unwrap_or_default();
        tracing::debug!(%symbol, payload = %pretty, "analytics response");
    }

    let payload = AnalyticsPayload::from_value(parsed)
        .map_err(|other| FetchError::UnexpectedShape(json_kind(&other)))?;
    Ok(payload.into_record(symbol, fetched_at))
}
