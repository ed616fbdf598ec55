//! remote::traits
//!
//! Transport trait and the request/response types it carries.
//!
//! # Design
//!
//! The `Transport` trait is async because every operation is network I/O.
//! It moves JSON and status codes only; deciding what a status means is
//! left to the engine, which keeps transports trivially mockable.
//!
//! # Example
//!
//! ```
//! use keelson::remote::{ApiRequest, Method};
//! use serde_json::json;
//!
//! let request = ApiRequest::get("classes/Post").with_query("limit", "10");
//! assert_eq!(request.method, Method::Get);
//! assert_eq!(request.query, vec![("limit".to_string(), "10".to_string())]);
//!
//! let request = ApiRequest::post("classes/Post", json!({"title": "Hi"}));
//! assert!(request.body.is_some());
//! ```

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as Json;
use thiserror::Error;

use crate::core::ModelError;

/// Errors raised before a usable response exists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// Connection, TLS or timeout failure.
    #[error("network error: {0}")]
    Network(String),

    /// A credential could not be encoded as a header value.
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A success response carried a body that is not JSON.
    #[error("failed to decode response (HTTP {status}): {message}")]
    Decode {
        /// HTTP status code
        status: u16,
        /// Parser message
        message: String,
    },

    /// No scripted response was available (mock only).
    #[error("no response scripted for {0}")]
    Unscripted(String),
}

/// HTTP method of a REST call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A REST call relative to the backend root.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the backend root (`classes/Post/p1`)
    pub path: String,
    /// Query string pairs, in order
    pub query: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<Json>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>, body: Option<Json>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path, None)
    }

    pub fn post(path: impl Into<String>, body: Json) -> Self {
        Self::new(Method::Post, path, Some(body))
    }

    pub fn put(path: impl Into<String>, body: Json) -> Self {
        Self::new(Method::Put, path, Some(body))
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path, None)
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Status and decoded body of a REST response.
///
/// An empty body decodes as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Decoded JSON body
    pub body: Json,
}

impl ApiResponse {
    pub fn new(status: u16, body: Json) -> Self {
        Self { status, body }
    }

    /// Whether the backend accepted the call.
    ///
    /// Only 200 and 201 count; any other status, 2xx included, is a
    /// failure.
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 201)
    }

    /// Structured `{"code": …, "error": …}` body, if present.
    pub fn server_error(&self) -> Option<(i64, String)> {
        let code = self.body.get("code")?.as_i64()?;
        let message = self.body.get("error")?.as_str()?.to_string();
        Some((code, message))
    }

    /// Error describing a failed response.
    pub fn to_error(&self) -> ModelError {
        match self.server_error() {
            Some((code, message)) => ModelError::Server { code, message },
            None => ModelError::Http {
                status: self.status,
            },
        }
    }
}

/// A way of delivering REST calls to the backend.
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    /// Short name for logs (`"http"`, `"mock"`).
    fn name(&self) -> &'static str;

    /// Deliver one call.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` only when no response was obtained. Error
    /// statuses are returned as `Ok` responses.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Method::Delete).unwrap(), json!("DELETE"));
        assert_eq!(format!("{}", Method::Put), "PUT");
    }

    #[test]
    fn success_is_200_or_201_only() {
        assert!(ApiResponse::new(200, Json::Null).is_success());
        assert!(ApiResponse::new(201, Json::Null).is_success());
        assert!(!ApiResponse::new(204, Json::Null).is_success());
        assert!(!ApiResponse::new(404, Json::Null).is_success());
    }

    #[test]
    fn structured_errors() {
        let response = ApiResponse::new(400, json!({"code": 137, "error": "duplicate value"}));
        assert_eq!(
            response.to_error(),
            ModelError::Server {
                code: 137,
                message: "duplicate value".into()
            }
        );

        let response = ApiResponse::new(502, json!("Bad Gateway"));
        assert_eq!(response.to_error(), ModelError::Http { status: 502 });
    }

    #[test]
    fn request_display() {
        assert_eq!(
            ApiRequest::delete("classes/Post/p1").to_string(),
            "DELETE classes/Post/p1"
        );
    }

    #[test]
    fn transport_error_display() {
        assert_eq!(
            TransportError::Network("connection refused".into()).to_string(),
            "network error: connection refused"
        );
        assert_eq!(
            TransportError::InvalidHeader("X-Parse-Application-Id").to_string(),
            "invalid header value for X-Parse-Application-Id"
        );
    }
}
