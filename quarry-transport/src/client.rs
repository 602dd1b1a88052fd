//! reqwest-backed transport.

use crate::{AsyncTransport, RawResponse, Result, TransportCall, TransportConfig, TransportError};
use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
#[cfg(feature = "blocking")]
use {crate::Transport, std::sync::OnceLock};
use tracing::debug;
use url::Url;

/// HTTP transport over reqwest.
///
/// Serves both seams: [`AsyncTransport`] through a pooled async client, and
/// [`Transport`] through a blocking client created on first use. The
/// blocking path must not be driven from inside an async runtime.
#[derive(Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
    base_url: Url,
    headers: HeaderMap,
    config: Arc<TransportConfig>,
    #[cfg(feature = "blocking")]
    blocking: Arc<OnceLock<reqwest::blocking::Client>>,
}

impl HttpTransport {
    /// Create a new transport with the given configuration.
    pub fn new(config: TransportConfig) -> Result<Self> {
        let base_url = normalize_base(&config.base_url)?;
        let headers = default_headers(&config)?;

        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .default_headers(headers.clone())
            .gzip(config.gzip)
            .build()?;

        debug!(base_url = %base_url, "HTTP transport initialized");

        Ok(Self {
            inner,
            base_url,
            headers,
            config: Arc::new(config),
            #[cfg(feature = "blocking")]
            blocking: Arc::new(OnceLock::new()),
        })
    }

    /// Get the transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Get the base URL every call is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve the full URL of a call, including its query string.
    pub fn url_for(&self, call: &TransportCall) -> Result<Url> {
        let mut url = self
            .base_url
            .join(call.path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        if !call.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &call.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    #[cfg(feature = "blocking")]
    fn blocking_client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(self.config.timeout)
            .connect_timeout(self.config.connect_timeout)
            .pool_idle_timeout(self.config.pool_idle_timeout)
            .pool_max_idle_per_host(self.config.pool_max_idle_per_host)
            .user_agent(&self.config.user_agent)
            .default_headers(self.headers.clone())
            .gzip(self.config.gzip)
            .build()?;
        Ok(self.blocking.get_or_init(|| client))
    }
}

#[async_trait]
impl AsyncTransport for HttpTransport {
    async fn send(&self, call: TransportCall) -> Result<RawResponse> {
        let url = self.url_for(&call)?;
        debug!(method = %call.method, url = %url, "Sending request");

        let mut request = self.inner.request(call.method.into(), url);
        if let Some(body) = call.body {
            request = request
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_exchange(e, self.config.timeout))?;
        let response = RawResponse::from_reqwest(response).await?;

        debug!(status = %response.status(), "Received response");
        Ok(response)
    }
}

#[cfg(feature = "blocking")]
impl Transport for HttpTransport {
    fn perform(&self, call: TransportCall) -> Result<RawResponse> {
        let url = self.url_for(&call)?;
        debug!(method = %call.method, url = %url, "Performing blocking request");

        let mut request = self.blocking_client()?.request(call.method.into(), url);
        if let Some(body) = call.body {
            request = request
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(body.to_vec());
        }

        let response = request
            .send()
            .map_err(|e| TransportError::from_exchange(e, self.config.timeout))?;
        let response = RawResponse::from_blocking(response)?;

        debug!(status = %response.status(), "Received response");
        Ok(response)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

/// Parse the base URL so that relative joins append instead of replacing
/// the last path segment.
fn normalize_base(base: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_headers(config: &TransportConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    for (name, value) in &config.default_headers {
        let name = HeaderName::try_from(name.as_str())
            .map_err(|e| TransportError::RequestBuild(e.to_string()))?;
        let value = HeaderValue::try_from(value.as_str())
            .map_err(|e| TransportError::RequestBuild(e.to_string()))?;
        headers.insert(name, value);
    }

    if let Some((username, password)) = &config.basic_auth {
        use base64::Engine;
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
        let mut value = HeaderValue::try_from(format!("Basic {}", encoded))
            .map_err(|e| TransportError::RequestBuild(e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(http::header::AUTHORIZATION, value);
    }

    Ok(headers)
}
