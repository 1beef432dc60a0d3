//! REST request contract
//!
//! `RestClient::request(method, path, options)` returns the raw
//! `{status, headers, data}` triple and only fails on transport errors.
//! Typed operations call `ApiResponse::into_result()` to turn non-success
//! statuses into `ApiError`s.

use std::time::Duration;

use common::Secret;
use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::classify::error_for_status;
use crate::error::{ApiError, Result};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// REST API version pinned in every request.
pub const API_VERSION: &str = "2022-11-28";

/// GitHub caps `per_page` at 100.
pub const MAX_PER_PAGE: u32 = 100;

/// Connection settings for the REST client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("ghctl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Query parameters and JSON body for a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add the parameter only when a value is present.
    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw response: status, headers and decoded body.
///
/// Empty bodies decode to `Value::Null`; non-JSON bodies become a JSON string.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub data: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The body on 2xx, otherwise the classified error.
    pub fn into_result(self) -> Result<Value> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(error_for_status(self.status, &self.headers, &self.data))
        }
    }

    /// Deserialize a 2xx body into `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        let data = self.into_result()?;
        serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Authenticated GitHub REST client.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: Secret<String>,
}

impl RestClient {
    pub fn new(token: Secret<String>, config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(API_VERSION),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Http(format!("building HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Send a request. Fails only when no response was received.
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let mut req = self
            .http
            .request(method, self.url(path))
            .bearer_auth(self.token.expose());
        if !options.query.is_empty() {
            req = req.query(&options.query);
        }
        if let Some(body) = &options.body {
            req = req.json(body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Http(format!("reading response body: {e}")))?;

        let data = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        debug!(status, "GitHub responded");
        Ok(ApiResponse {
            status,
            headers,
            data,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        self.request(Method::GET, path, options).await?.into_typed()
    }

    /// Collect up to `limit` items across pages.
    ///
    /// `items_key` names the array inside an object response
    /// (`"workflow_runs"`); `None` means the response is the array itself.
    pub async fn paginate<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
        items_key: Option<&str>,
        limit: usize,
    ) -> Result<Vec<T>> {
        let per_page = limit.clamp(1, MAX_PER_PAGE as usize);
        let mut items = Vec::new();
        let mut page = 1u32;

        while items.len() < limit {
            let page_options = options
                .clone()
                .query("per_page", per_page)
                .query("page", page);
            let data = self
                .request(Method::GET, path, page_options)
                .await?
                .into_result()?;

            let batch = match items_key {
                Some(key) => data.get(key).cloned().unwrap_or(Value::Array(vec![])),
                None => data,
            };
            let batch: Vec<T> =
                serde_json::from_value(batch).map_err(|e| ApiError::Decode(e.to_string()))?;
            let fetched = batch.len();
            items.extend(batch);

            if fetched < per_page {
                break;
            }
            page += 1;
        }

        items.truncate(limit);
        Ok(items)
    }
}
