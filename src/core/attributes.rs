//! core::attributes
//!
//! Dual-snapshot attribute storage for one entity.
//!
//! # Snapshots
//!
//! - **confirmed**: last known server truth (`objectId`, `createdAt`,
//!   `updatedAt` once persisted)
//! - **pending**: local writes not yet sent
//!
//! Both hold wire JSON. Reads prefer pending over confirmed and decode on
//! the way out; writes encode on the way in.
//!
//! # Invariants
//!
//! - a key present in pending shadows confirmed
//! - the store is dirty iff pending is non-empty
//! - [`AttributeStore::merge`] clears pending

use serde_json::{Map, Value as Json};

use super::codec;
use super::value::Value;

/// Attribute map in wire form.
pub type Attributes = Map<String, Json>;

/// Confirmed and pending attribute snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeStore {
    confirmed: Attributes,
    pending: Attributes,
}

impl AttributeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose confirmed snapshot is `confirmed`.
    pub fn from_confirmed(confirmed: Attributes) -> Self {
        Self {
            confirmed,
            pending: Attributes::new(),
        }
    }

    /// Read a key: pending if present, else confirmed, decoded.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.raw(key).map(codec::decode)
    }

    /// Read a key in wire form, with the same precedence as [`get`].
    ///
    /// [`get`]: AttributeStore::get
    pub fn raw(&self, key: &str) -> Option<&Json> {
        self.pending.get(key).or_else(|| self.confirmed.get(key))
    }

    /// Mutable access to an array-valued key, copying it into pending.
    ///
    /// The stored sequence is cloned into pending the first time it is
    /// accessed, so mutations through the returned handle are tracked
    /// against the confirmed baseline. The key becomes dirty by this call
    /// alone. A `null`, absent or non-array value yields `None`.
    pub fn get_many(&mut self, key: &str) -> Option<&mut Vec<Json>> {
        if !self.pending.contains_key(key) {
            let copy = match self.confirmed.get(key) {
                Some(Json::Array(items)) => Json::Array(items.clone()),
                _ => return None,
            };
            self.pending.insert(key.to_string(), copy);
        }

        match self.pending.get_mut(key) {
            Some(Json::Array(items)) => Some(items),
            _ => None,
        }
    }

    /// Assign a value.
    ///
    /// The encoded value is recorded in pending unless it equals the
    /// current confirmed value, and is then written to confirmed
    /// unconditionally. Returns the assigned value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Value {
        let value = value.into();
        let encoded = codec::encode(&value);

        if self.confirmed.get(key) != Some(&encoded) {
            self.pending.insert(key.to_string(), encoded.clone());
        }
        self.confirmed.insert(key.to_string(), encoded);

        value
    }

    /// Record a raw wire value (typically an `__op`) in pending only.
    pub fn set_pending(&mut self, key: &str, raw: Json) {
        self.pending.insert(key.to_string(), raw);
    }

    /// Record `raw` in pending only, leaving confirmed as the baseline the
    /// next save diffs against. Staging the confirmed value itself drops
    /// any pending write for the key.
    pub fn stage(&mut self, key: &str, raw: Json) {
        if self.confirmed.get(key) == Some(&raw) {
            self.pending.remove(key);
        } else {
            self.pending.insert(key.to_string(), raw);
        }
    }

    /// Whether there are unsent local writes.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Absorb a successful write response.
    ///
    /// `confirmed = confirmed ∪ response ∪ pending`, with pending keys
    /// winning over the response, then pending is cleared. Queued `__op`
    /// values are not attribute values and are dropped.
    pub fn merge(&mut self, response: Attributes) {
        self.confirmed.extend(response);
        let pending = std::mem::take(&mut self.pending);
        self.confirmed
            .extend(pending.into_iter().filter(|(_, value)| !is_op(value)));
    }

    /// Replace the confirmed members of a to-many key, discarding any
    /// pending copy.
    pub(crate) fn set_baseline(&mut self, key: &str, items: Vec<Json>) {
        self.pending.remove(key);
        self.confirmed.insert(key.to_string(), Json::Array(items));
    }

    /// Overlay a freshly fetched snapshot and drop pending writes.
    pub fn refresh(&mut self, fresh: Attributes) {
        self.confirmed.extend(fresh);
        self.pending.clear();
    }

    /// Drop both snapshots.
    pub fn clear(&mut self) {
        self.confirmed.clear();
        self.pending.clear();
    }

    /// Confirmed snapshot.
    pub fn confirmed(&self) -> &Attributes {
        &self.confirmed
    }

    /// Pending snapshot.
    pub fn pending(&self) -> &Attributes {
        &self.pending
    }

    /// Confirmed snapshot overlaid with pending writes.
    pub fn snapshot(&self) -> Attributes {
        let mut merged = self.confirmed.clone();
        merged.extend(self.pending.clone());
        merged
    }
}

fn is_op(value: &Json) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key(codec::OP_KEY))
}
