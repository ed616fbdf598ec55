//! core::schema
//!
//! Immutable per-model schema.
//!
//! # Design
//!
//! A [`Schema`] is built once per model and shared by every entity of that
//! model through an `Arc`. It names the model, declares which keys hold
//! to-many references, which keys are required, and optionally carries
//! lifecycle [`Hooks`].
//!
//! # Example
//!
//! ```
//! use keelson::core::Schema;
//!
//! let schema = Schema::builder("Post")
//!     .has_many("tags")
//!     .belongs_to("author")
//!     .relation("likes")
//!     .required("title")
//!     .build();
//!
//! assert_eq!(schema.class_name(), "Post");
//! assert!(schema.is_has_many("likes"));
//! ```

use std::fmt;
use std::sync::Arc;

use super::entity::Entity;
use super::types::{class_name_for, collection_path, RelationOp};

/// Whether a lifecycle hook lets the operation continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going
    Continue,
    /// Stop the operation
    Halt,
}

/// A failed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Offending attribute
    pub key: String,
    /// Human-readable reason
    pub message: String,
}

impl Violation {
    /// Create a violation for `key`.
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Lifecycle callbacks around `save`.
///
/// Hooks run in this order:
///
/// ```text
/// validate → before_save → before_create | before_update
///          → request
///          → after_create | after_update → after_save
/// ```
///
/// Returning [`Flow::Halt`] from any hook stops the chain. A halted
/// before-hook prevents the request entirely and fails the save. A halted
/// after-hook only skips the hooks after it; the write already went
/// through, so the save still succeeds.
#[allow(unused_variables)]
pub trait Hooks: Send + Sync {
    /// Add violations for anything that should block the save.
    fn validate(&self, entity: &Entity, violations: &mut Vec<Violation>) {}

    /// Runs before create or update.
    fn before_save(&self, entity: &mut Entity) -> Flow {
        Flow::Continue
    }

    /// Runs before the first save of a new entity.
    fn before_create(&self, entity: &mut Entity) -> Flow {
        Flow::Continue
    }

    /// Runs after a successful create.
    fn after_create(&self, entity: &mut Entity) -> Flow {
        Flow::Continue
    }

    /// Runs before saving a persisted entity.
    fn before_update(&self, entity: &mut Entity) -> Flow {
        Flow::Continue
    }

    /// Runs after a successful update.
    fn after_update(&self, entity: &mut Entity) -> Flow {
        Flow::Continue
    }

    /// Runs after a successful create or update.
    fn after_save(&self, entity: &mut Entity) -> Flow {
        Flow::Continue
    }
}

/// Per-model schema.
pub struct Schema {
    model_name: String,
    class_name: String,
    has_many: Vec<String>,
    belongs_to: Vec<String>,
    relations: Vec<String>,
    required: Vec<String>,
    hooks: Option<Arc<dyn Hooks>>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("model_name", &self.model_name)
            .field("class_name", &self.class_name)
            .field("has_many", &self.has_many)
            .field("belongs_to", &self.belongs_to)
            .field("relations", &self.relations)
            .field("required", &self.required)
            .field("has_hooks", &self.hooks.is_some())
            .finish()
    }
}

impl Schema {
    /// Start building a schema for `model_name`.
    pub fn builder(model_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            model_name: model_name.into(),
            has_many: Vec::new(),
            belongs_to: Vec::new(),
            relations: Vec::new(),
            required: Vec::new(),
            hooks: None,
        }
    }

    /// Schema with no declarations, for models only known by name.
    pub fn dynamic(model_name: impl Into<String>) -> Arc<Schema> {
        Self::builder(model_name).build()
    }

    /// Model name (`"User"`).
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Backend class name (`"_User"`).
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Relative REST path of the model's collection.
    pub fn collection_path(&self) -> String {
        collection_path(&self.class_name)
    }

    /// Relative REST path of one object.
    pub fn item_path(&self, object_id: &str) -> String {
        format!("{}/{}", self.collection_path(), object_id)
    }

    /// Whether `key` holds a to-many reference (array or relation column).
    pub fn is_has_many(&self, key: &str) -> bool {
        self.has_many.iter().any(|k| k == key) || self.is_relation(key)
    }

    /// Whether `key` is a backend relation column.
    pub fn is_relation(&self, key: &str) -> bool {
        self.relations.iter().any(|k| k == key)
    }

    /// Keys declared as to-one references.
    pub fn belongs_to(&self) -> &[String] {
        &self.belongs_to
    }

    /// Keys that must be present for a save to proceed.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Lifecycle hooks, if any.
    pub fn hooks(&self) -> Option<&dyn Hooks> {
        self.hooks.as_deref()
    }

    /// Operation names the diff engine uses for `key`.
    pub fn relation_ops(&self, key: &str) -> (RelationOp, RelationOp) {
        if self.is_relation(key) {
            (RelationOp::AddRelation, RelationOp::RemoveRelation)
        } else {
            (RelationOp::Add, RelationOp::Remove)
        }
    }

    /// Run presence checks and the `validate` hook.
    pub fn validate(&self, entity: &Entity) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .required
            .iter()
            .filter(|key| entity.get(key).map_or(true, |v| v.is_null()))
            .map(|key| Violation::new(key.as_str(), "can't be blank"))
            .collect();

        if let Some(hooks) = self.hooks() {
            hooks.validate(entity, &mut violations);
        }

        violations
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder {
    model_name: String,
    has_many: Vec<String>,
    belongs_to: Vec<String>,
    relations: Vec<String>,
    required: Vec<String>,
    hooks: Option<Arc<dyn Hooks>>,
}

impl SchemaBuilder {
    /// Declare an array column of references.
    pub fn has_many(mut self, key: impl Into<String>) -> Self {
        self.has_many.push(key.into());
        self
    }

    /// Declare a to-one reference.
    pub fn belongs_to(mut self, key: impl Into<String>) -> Self {
        self.belongs_to.push(key.into());
        self
    }

    /// Declare a backend relation column.
    pub fn relation(mut self, key: impl Into<String>) -> Self {
        self.relations.push(key.into());
        self
    }

    /// Require `key` to be present and non-null on save.
    pub fn required(mut self, key: impl Into<String>) -> Self {
        self.required.push(key.into());
        self
    }

    /// Attach lifecycle hooks.
    pub fn hooks(mut self, hooks: Arc<dyn Hooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Finish the schema.
    pub fn build(self) -> Arc<Schema> {
        let class_name = class_name_for(&self.model_name).to_string();
        Arc::new(Schema {
            model_name: self.model_name,
            class_name,
            has_many: self.has_many,
            belongs_to: self.belongs_to,
            relations: self.relations,
            required: self.required,
            hooks: self.hooks,
        })
    }
}
