//! remote::http
//!
//! REST transport over reqwest.
//!
//! # Authentication
//!
//! Every request carries `X-Parse-Application-Id` plus one of two
//! credential sets:
//!
//! - `X-Parse-Master-Key` alone, when a master key is configured
//! - otherwise `X-Parse-REST-API-Key`, with `X-Parse-Session-Token` when a
//!   user is logged in

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Url};
use serde_json::Value as Json;

use super::traits::{ApiRequest, ApiResponse, Method, Transport, TransportError};
use crate::core::config::ClientConfig;

const APPLICATION_ID_HEADER: &str = "X-Parse-Application-Id";
const REST_API_KEY_HEADER: &str = "X-Parse-REST-API-Key";
const MASTER_KEY_HEADER: &str = "X-Parse-Master-Key";
const SESSION_TOKEN_HEADER: &str = "X-Parse-Session-Token";

const USER_AGENT_VALUE: &str = concat!("keelson/", env!("CARGO_PKG_VERSION"));

/// Transport speaking HTTP to a live backend.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
}

// Custom Debug to avoid exposing credentials
impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("header_count", &self.headers.len())
            .finish()
    }
}

impl HttpTransport {
    /// Build a transport for `config`.
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` if `api_base` does not parse
    /// - `InvalidHeader` if a credential is not a valid header value
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut base_url = config
            .base_url()
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        // Url::join replaces the last segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            headers: Self::headers(config)?,
        })
    }

    /// Authentication headers for every request.
    fn headers(config: &ClientConfig) -> Result<HeaderMap, TransportError> {
        fn value(name: &'static str, raw: &str) -> Result<HeaderValue, TransportError> {
            let mut value =
                HeaderValue::from_str(raw).map_err(|_| TransportError::InvalidHeader(name))?;
            value.set_sensitive(true);
            Ok(value)
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        if let Some(app_id) = &config.application_id {
            headers.insert(APPLICATION_ID_HEADER, value(APPLICATION_ID_HEADER, app_id)?);
        }
        match &config.master_key {
            Some(master) => {
                headers.insert(MASTER_KEY_HEADER, value(MASTER_KEY_HEADER, master)?);
            }
            None => {
                if let Some(key) = &config.rest_api_key {
                    headers.insert(REST_API_KEY_HEADER, value(REST_API_KEY_HEADER, key)?);
                }
                if let Some(token) = &config.session_token {
                    headers.insert(SESSION_TOKEN_HEADER, value(SESSION_TOKEN_HEADER, token)?);
                }
            }
        }

        Ok(headers)
    }

    /// Absolute URL for a path relative to the backend root.
    fn url(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", path, e)))
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url(&request.path)?;

        let mut builder = self
            .client
            .request(reqwest_method(request.method), url)
            .headers(self.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let body = if bytes.is_empty() {
            Json::Null
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(body) => body,
                // Error pages from proxies are often HTML; the status says enough
                Err(_) if !matches!(status, 200 | 201) => Json::Null,
                Err(e) => {
                    return Err(TransportError::Decode {
                        status,
                        message: e.to_string(),
                    })
                }
            }
        };

        Ok(ApiResponse { status, body })
    }
}
