//! Keelson - Typed models over a Parse-style JSON REST backend
//!
//! Keelson maps backend objects to Rust entities: attribute tracking with
//! dirty detection, a tagged-value codec (pointers, dates, files, geo
//! points), relation diffing into `AddRelation`/`RemoveRelation`
//! operations, a persistence lifecycle with validation and hooks, and
//! sliced batch saves through `POST /batch`.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Client, persistence lifecycle and batching
//! - [`core`] - Domain types, codec, attribute store, diffing, schemas and config
//! - [`remote`] - Transport abstraction (HTTP and scripted mock)
//!
//! # Correctness Invariants
//!
//! Keelson maintains the following invariants:
//!
//! 1. An entity's `objectId` never changes once assigned
//! 2. Only a successful response is merged into an entity
//! 3. Every failed operation leaves its reason on the entity
//! 4. Batch slices are sent one at a time, in order

pub mod cli;
pub mod core;
pub mod engine;
pub mod remote;
