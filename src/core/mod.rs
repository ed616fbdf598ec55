//! core
//!
//! Entity model: values, codec, attribute storage and relation diffing.
//!
//! # Modules
//!
//! - [`types`] - Pointers, geo points, files, class-name mapping
//! - [`value`] - The [`Value`] enum and typed extraction
//! - [`codec`] - Value ↔ wire JSON conversion
//! - [`attributes`] - Confirmed/pending attribute snapshots
//! - [`diff`] - Array membership changes → relation ops
//! - [`entity`] - Records of a model class
//! - [`relation`] - Mutable to-many handles
//! - [`schema`] - Per-model declarations and lifecycle hooks
//! - [`model`] - Typed model newtypes
//! - [`error`] - Persistence error taxonomy
//! - [`config`] - Client configuration and loading
//!
//! # Design Principles
//!
//! - Reads never touch the network; references decode unresolved
//! - Attribute storage holds wire JSON, so dirty tracking compares
//!   exactly what would be sent
//! - Schemas are immutable and shared

pub mod attributes;
pub mod codec;
pub mod config;
pub mod diff;
pub mod entity;
pub mod error;
pub mod model;
pub mod relation;
pub mod schema;
pub mod types;
pub mod value;

pub use attributes::{AttributeStore, Attributes};
pub use entity::{Entity, EntityState};
pub use error::ModelError;
pub use model::Model;
pub use relation::RelationMut;
pub use schema::{Flow, Hooks, Schema, SchemaBuilder, Violation};
pub use types::{Embedded, FileRef, GeoPoint, Pointer, RelationOp, ToPointer};
pub use value::{FromValue, Value};
