//! core::error
//!
//! Error taxonomy for persistence operations.
//!
//! # Propagation
//!
//! The boolean persistence API (`save`, `destroy`, `reload`,
//! `batch_save`) never returns these errors; it records them on the
//! entity's error collection and answers `false`. The `try_*` variants
//! return them directly, and lookup by id (`find`) always does.

use thiserror::Error;

use crate::remote::TransportError;

/// Errors from entity persistence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A local precondition failed; no request was sent.
    #[error("validation failed for '{key}': {message}")]
    Validation {
        /// Offending attribute
        key: String,
        /// Human-readable reason
        message: String,
    },

    /// The request never produced a parseable response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a structured `{code, error}` body.
    #[error("server error {code}: {message}")]
    Server {
        /// Backend error code
        code: i64,
        /// Backend error message
        message: String,
    },

    /// The backend answered with an unexpected status and no structured body.
    #[error("unexpected HTTP status {status}")]
    Http {
        /// HTTP status code
        status: u16,
    },

    /// Lookup by id found nothing.
    #[error("{class_name} '{object_id}' not found")]
    NotFound {
        /// Backend class name
        class_name: String,
        /// Requested identifier
        object_id: String,
    },

    /// A batch slice was rejected; earlier slices stay applied.
    #[error("batch aborted at slice {slice} with HTTP status {status}")]
    BatchAbort {
        /// Zero-based index of the rejected slice
        slice: usize,
        /// HTTP status code of the rejection
        status: u16,
    },

    /// A lifecycle hook stopped the operation.
    #[error("halted by {0} hook")]
    Halted(&'static str),

    /// The operation needs a persisted entity.
    #[error("entity has no objectId")]
    MissingObjectId,

    /// A response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ModelError {
    /// Whether the error was raised locally, before any request.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ModelError::Validation { .. } | ModelError::Halted(_) | ModelError::MissingObjectId
        )
    }
}

impl From<TransportError> for ModelError {
    fn from(err: TransportError) -> Self {
        ModelError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            ModelError::Validation {
                key: "title".into(),
                message: "can't be blank".into()
            }
            .to_string(),
            "validation failed for 'title': can't be blank"
        );
        assert_eq!(
            ModelError::Server {
                code: 137,
                message: "duplicate value".into()
            }
            .to_string(),
            "server error 137: duplicate value"
        );
        assert_eq!(
            ModelError::Http { status: 502 }.to_string(),
            "unexpected HTTP status 502"
        );
        assert_eq!(
            ModelError::NotFound {
                class_name: "Post".into(),
                object_id: "p1".into()
            }
            .to_string(),
            "Post 'p1' not found"
        );
        assert_eq!(
            ModelError::BatchAbort { slice: 2, status: 400 }.to_string(),
            "batch aborted at slice 2 with HTTP status 400"
        );
        assert_eq!(
            ModelError::Halted("before_save").to_string(),
            "halted by before_save hook"
        );
    }

    #[test]
    fn local_errors() {
        assert!(ModelError::MissingObjectId.is_local());
        assert!(ModelError::Halted("before_create").is_local());
        assert!(!ModelError::Http { status: 500 }.is_local());
    }

    #[test]
    fn transport_errors_convert() {
        let err: ModelError = TransportError::Network("connection refused".into()).into();
        assert_eq!(
            err,
            ModelError::Transport("network error: connection refused".into())
        );
    }
}
