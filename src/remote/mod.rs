//! remote
//!
//! Delivery of REST calls to the backend.
//!
//! # Architecture
//!
//! The engine talks to a `dyn Transport`. Production code uses
//! [`HttpTransport`]; tests script a [`MockTransport`].
//!
//! # Modules
//!
//! - `traits`: `Transport` trait and request/response types
//! - [`http`]: reqwest-backed implementation
//! - [`mock`]: scripted implementation for deterministic testing

pub mod http;
pub mod mock;
mod traits;

pub use http::HttpTransport;
pub use mock::MockTransport;
pub use traits::*;
