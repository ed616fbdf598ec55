//! engine
//!
//! Remote operations on entities: lookup, persistence and batching.
//!
//! # Architecture
//!
//! Everything hangs off [`Client`], which owns the configuration and a
//! [`Transport`](crate::remote::Transport):
//!
//! - [`client`]: construction, lookups and relation materialization
//! - [`lifecycle`]: save/create/update/destroy/reload for one entity
//! - [`batch`]: sliced `POST /batch` with positional merge
//!
//! # Concurrency
//!
//! Every call is awaited to completion before the next one starts. Batch
//! slices are sent strictly in order. There is no retry.
//!
//! # Example
//!
//! ```no_run
//! use keelson::core::config::ClientConfig;
//! use keelson::core::{Entity, Schema};
//! use keelson::engine::Client;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::new("app-id", "rest-key"))?;
//!
//! let mut user = Entity::new(Schema::dynamic("User"));
//! user.set("name", "Alice");
//! if client.save(&mut user).await {
//!     println!("saved as {}", user.object_id().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod client;
pub mod lifecycle;

pub use batch::{BatchReport, DEFAULT_SLICE_SIZE, MAX_BATCH_SIZE};
pub use client::{Client, ClientError, OBJECT_NOT_FOUND};
