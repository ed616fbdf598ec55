//! core::entity
//!
//! A record of some model class, with its attribute snapshots.
//!
//! # State
//!
//! An entity is **new** until its confirmed snapshot carries an
//! `objectId`, and **persisted** after. Persistence itself lives in
//! `engine`; this module only tracks what the entity knows locally.
//!
//! # Example
//!
//! ```
//! use keelson::core::{Entity, Schema};
//!
//! let mut user = Entity::new(Schema::dynamic("User"));
//! user.set("name", "Alice");
//!
//! assert!(user.is_new());
//! assert!(user.is_dirty());
//! assert_eq!(user.class_name(), "_User");
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use super::attributes::{AttributeStore, Attributes};
use super::codec;
use super::diff;
use super::error::ModelError;
use super::relation::RelationMut;
use super::schema::Schema;
use super::types::{Pointer, RelationOp, ToPointer, CREATED_AT, OBJECT_ID, SERVER_KEYS, UPDATED_AT};
use super::value::{FromValue, Value};

/// Whether an entity has been written to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// No `objectId` yet; a save creates it
    New,
    /// Carries an `objectId`; a save updates it
    Persisted,
}

/// A record of one model class.
#[derive(Debug, Clone)]
pub struct Entity {
    schema: Arc<Schema>,
    store: AttributeStore,
    errors: Vec<ModelError>,
    destroyed: bool,
}

impl Entity {
    /// Create a new, empty entity.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            store: AttributeStore::new(),
            errors: Vec::new(),
            destroyed: false,
        }
    }

    /// Create a new entity and assign each attribute in turn.
    pub fn with_attributes<K, V, I>(schema: Arc<Schema>, attributes: I) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut entity = Self::new(schema);
        for (key, value) in attributes {
            entity.set(key.as_ref(), value);
        }
        entity
    }

    /// Wrap a snapshot the backend returned. Nothing is pending.
    pub fn from_server(schema: Arc<Schema>, attributes: Attributes) -> Self {
        Self {
            schema,
            store: AttributeStore::from_confirmed(attributes),
            errors: Vec::new(),
            destroyed: false,
        }
    }

    /// Schema shared by every entity of this model.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Model name (`"User"`).
    pub fn model_name(&self) -> &str {
        self.schema.model_name()
    }

    /// Backend class name (`"_User"`).
    pub fn class_name(&self) -> &str {
        self.schema.class_name()
    }

    /// Server-assigned identifier, once persisted.
    pub fn object_id(&self) -> Option<&str> {
        self.store.confirmed().get(OBJECT_ID).and_then(Json::as_str)
    }

    pub fn state(&self) -> EntityState {
        if self.object_id().is_some() {
            EntityState::Persisted
        } else {
            EntityState::New
        }
    }

    pub fn is_new(&self) -> bool {
        self.state() == EntityState::New
    }

    pub fn is_persisted(&self) -> bool {
        self.state() == EntityState::Persisted
    }

    /// Whether the last destroy succeeded and nothing has been created since.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Read an attribute, decoded. References come back unresolved.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    /// Read an attribute as a concrete type.
    pub fn get_as<T: FromValue>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(T::from_value)
    }

    /// Assign an attribute and return the assigned value.
    ///
    /// `objectId` cannot be reassigned once present; such writes are
    /// ignored and the current value is returned.
    ///
    /// An array assigned to a relation column replaces its membership: the
    /// confirmed members stay as the baseline, so the next save sends the
    /// difference as `AddRelation`/`RemoveRelation`. Members without an
    /// identity cannot be related and are dropped.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Value {
        if key == OBJECT_ID {
            if let Some(current) = self.object_id() {
                tracing::warn!(
                    class = self.class_name(),
                    object_id = current,
                    "ignoring attempt to reassign objectId"
                );
                return Value::String(current.to_string());
            }
        }

        let value = value.into();
        if self.schema.is_relation(key) {
            if let Json::Array(items) = codec::encode(&value) {
                self.stage_relation(key, items);
                return value;
            }
        }
        self.store.set(key, value)
    }

    fn stage_relation(&mut self, key: &str, items: Vec<Json>) {
        let total = items.len();
        let members: Vec<Json> = items
            .into_iter()
            .filter(|item| codec::identity_of(item).is_some())
            .collect();
        if members.len() < total {
            tracing::warn!(
                class = self.class_name(),
                key,
                dropped = total - members.len(),
                "relation members need an objectId"
            );
        }
        self.store.stage(key, Json::Array(members));
    }

    /// Mutable handle on a to-many attribute.
    ///
    /// Only keys declared in the schema (array or relation columns) are
    /// eligible. The first call copies the stored sequence into pending,
    /// which marks the entity dirty even without further mutation. A
    /// `null` or absent value yields `None`.
    pub fn get_many(&mut self, key: &str) -> Option<RelationMut<'_>> {
        if !self.schema.is_has_many(key) {
            return None;
        }
        self.store.get_many(key).map(|items| RelationMut::new(items, None))
    }

    /// Queue members to add to a to-many key on the next save.
    ///
    /// Members without an identity are skipped. Relation columns use
    /// `AddRelation`, array columns `Add`.
    pub fn add_relation<T: ToPointer>(&mut self, key: &str, members: &[T]) {
        let (add, _) = self.schema.relation_ops(key);
        self.queue_op(key, add, members);
    }

    /// Queue members to remove from a to-many key on the next save.
    pub fn remove_relation<T: ToPointer>(&mut self, key: &str, members: &[T]) {
        let (_, remove) = self.schema.relation_ops(key);
        self.queue_op(key, remove, members);
    }

    /// Queue `members` under `op`, extending an op of the same kind that is
    /// already pending for `key`. A different pending value is replaced.
    fn queue_op<T: ToPointer>(&mut self, key: &str, op: RelationOp, members: &[T]) {
        let incoming: Vec<Pointer> = members.iter().filter_map(ToPointer::to_pointer).collect();
        if incoming.is_empty() {
            return;
        }

        let mut pointers = self.queued(key, op);
        for pointer in incoming {
            if !pointers.contains(&pointer) {
                pointers.push(pointer);
            }
        }
        self.store.set_pending(key, diff::op_json(op, &pointers));
    }

    /// Members of a pending `op` on `key`, if that is what is pending.
    fn queued(&self, key: &str, op: RelationOp) -> Vec<Pointer> {
        let Some(Json::Object(pending)) = self.store.pending().get(key) else {
            return Vec::new();
        };
        if pending.get(codec::OP_KEY).and_then(Json::as_str) != Some(op.as_str()) {
            return Vec::new();
        }
        pending
            .get("objects")
            .and_then(Json::as_array)
            .map(|objects| {
                objects
                    .iter()
                    .filter_map(codec::identity_of)
                    .map(|(class_name, object_id)| Pointer {
                        class_name: class_name.to_string(),
                        object_id: object_id.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether there are unsent local writes.
    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    /// Confirmed snapshot overlaid with pending writes.
    pub fn attributes(&self) -> Attributes {
        self.store.snapshot()
    }

    /// Attribute snapshots.
    pub fn store(&self) -> &AttributeStore {
        &self.store
    }

    /// Payload for the next create or update.
    ///
    /// Pending writes, with membership changes on to-many keys rewritten as
    /// relation ops. Relation columns cannot take a plain array, so an
    /// unchanged one is left out. Server-owned keys are never sent.
    pub fn attributes_for_saving(&self) -> Attributes {
        let pending = self.store.pending();
        let mut payload = pending.clone();

        let diffs = diff::diff(pending, self.store.confirmed());
        diff::apply(&mut payload, &diffs, |key| self.schema.relation_ops(key));

        for key in pending.keys().filter(|k| self.schema.is_relation(k)) {
            if matches!(payload.get(key), Some(Json::Array(_))) {
                payload.remove(key);
            }
        }
        for key in SERVER_KEYS {
            payload.remove(key);
        }

        payload
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(CREATED_AT)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(UPDATED_AT)
    }

    fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.store.confirmed().get(key)? {
            Json::String(iso) => codec::parse_date(iso),
            raw => codec::decode(raw).as_date().copied(),
        }
    }

    /// Errors recorded by the last failed operations.
    pub fn errors(&self) -> &[ModelError] {
        &self.errors
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub(crate) fn push_error(&mut self, error: ModelError) {
        self.errors.push(error);
    }

    /// Absorb a successful create or update response.
    pub(crate) fn merge(&mut self, mut response: Attributes) {
        if let (Some(current), Some(incoming)) = (
            self.object_id(),
            response.get(OBJECT_ID).and_then(Json::as_str),
        ) {
            if current != incoming {
                tracing::warn!(
                    class = self.class_name(),
                    object_id = current,
                    incoming,
                    "response carried a different objectId; keeping the original"
                );
                response.remove(OBJECT_ID);
            }
        }
        self.store.merge(response);
        self.destroyed = false;
    }

    /// Replace local state with a fresh fetch.
    pub(crate) fn refresh(&mut self, mut fresh: Attributes) {
        if self.object_id().is_some() {
            fresh.remove(OBJECT_ID);
        }
        self.store.refresh(fresh);
    }

    /// Reset after a successful destroy; the next save creates.
    pub(crate) fn mark_destroyed(&mut self) {
        self.store.clear();
        self.destroyed = true;
    }

    /// Install `members` as the confirmed baseline of `key` and hand back
    /// a tracked handle over it.
    pub(crate) fn attach_relation(
        &mut self,
        key: &str,
        target_class: &str,
        members: &[Pointer],
    ) -> Option<RelationMut<'_>> {
        let items = members.iter().map(codec::pointer_json).collect();
        self.store.set_baseline(key, items);
        self.store
            .get_many(key)
            .map(|items| RelationMut::new(items, Some(target_class.to_string())))
    }
}

impl ToPointer for Entity {
    fn to_pointer(&self) -> Option<Pointer> {
        self.object_id().map(|id| Pointer {
            class_name: self.class_name().to_string(),
            object_id: id.to_string(),
        })
    }
}

impl AsRef<Entity> for Entity {
    fn as_ref(&self) -> &Entity {
        self
    }
}

impl AsMut<Entity> for Entity {
    fn as_mut(&mut self) -> &mut Entity {
        self
    }
}

impl From<&Entity> for Value {
    /// A persisted entity becomes a pointer; a new one an embedded object.
    fn from(entity: &Entity) -> Self {
        match entity.to_pointer() {
            Some(pointer) => Value::Pointer(pointer),
            None => Value::Object(super::types::Embedded {
                class_name: entity.class_name().to_string(),
                fields: entity.attributes(),
            }),
        }
    }
}
