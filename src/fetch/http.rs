use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::Value;

use super::{parse_envelope, FetchError, ListSource, DEFAULT_LIST_KEY};

#[derive(Clone, Debug)]
pub struct HttpSourceConfig {
    pub url: String,
    pub list_key: String,
    pub token: Option<String>,
    pub header: Option<String>,
    pub timeout_seconds: u64,
}

impl HttpSourceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            list_key: DEFAULT_LIST_KEY.to_string(),
            token: None,
            header: None,
            timeout_seconds: 10,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpListSource {
    client: reqwest::Client,
    url: String,
    list_key: String,
    token: Option<String>,
}

impl HttpListSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, FetchError> {
        let client = build_client(config.header.as_deref(), config.timeout_seconds)?;
        Ok(Self {
            client,
            url: config.url,
            list_key: config.list_key,
            token: config.token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Shares an already configured client between several resources.
    pub fn with_client(
        client: reqwest::Client,
        url: impl Into<String>,
        list_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            list_key: list_key.into(),
            token: None,
        }
    }

    pub fn bearer(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }
}

pub(crate) fn build_client(
    header: Option<&str>,
    timeout_seconds: u64,
) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("adminview/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    if let Some(raw) = header.filter(|h| !h.trim().is_empty()) {
        let (name, value) = parse_header(raw)?;
        headers.insert(name, value);
    }

    let timeout = Duration::from_secs(if timeout_seconds == 0 { 10 } else { timeout_seconds });
    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::HttpClientBuild { source: e })
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), FetchError> {
    let invalid = || FetchError::InvalidHeader {
        header: raw.to_string(),
    };
    let (name, value) = raw.split_once(':').ok_or_else(invalid)?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
    Ok((name, value))
}

#[async_trait]
impl ListSource for HttpListSource {
    fn describe(&self) -> String {
        format!("GET {}", self.url)
    }

    async fn list(&self) -> Result<Vec<Value>, FetchError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = self.token.as_deref() {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| FetchError::Http {
            url: self.url.clone(),
            source: e,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let text = response.text().await.map_err(|e| FetchError::Http {
            url: self.url.clone(),
            source: e,
        })?;
        let body: Value = serde_json::from_str(&text).map_err(|e| FetchError::Decode {
            origin: self.url.clone(),
            source: e,
        })?;
        parse_envelope(body, &self.list_key)
    }
}
