//! core::diff
//!
//! Turns array mutations into relation-mutation operations.
//!
//! # Algorithm
//!
//! For every pending key holding an array, compare its identity-bearing
//! items (objects carrying `className` and `objectId`) with the confirmed
//! array for the same key:
//!
//! 1. items only in pending become an `Add` op that replaces the raw
//!    array in the payload
//! 2. items only in confirmed become a `Remove` op; this pass runs only
//!    while the pending map as a whole is non-empty
//!
//! All adds are written before all removes, so a key that gains and loses
//! members in the same save ends up carrying only the `Remove` op. Callers
//! needing both must save twice.
//!
//! Arrays without identity-bearing items are left untouched.

use serde_json::{json, Value as Json};

use super::attributes::Attributes;
use super::codec::{self, identity_of, OP_KEY};
use super::types::{Pointer, RelationOp};

/// Members added to and removed from one array-valued key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyDiff {
    /// Attribute key
    pub key: String,
    /// Members present in pending but not in confirmed
    pub added: Vec<Pointer>,
    /// Members present in confirmed but not in pending
    pub removed: Vec<Pointer>,
}

impl KeyDiff {
    /// Whether neither pass found anything.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compute per-key membership changes between pending and confirmed.
///
/// Keys whose arrays produce no changes are omitted.
pub fn diff(pending: &Attributes, confirmed: &Attributes) -> Vec<KeyDiff> {
    let mut diffs = Vec::new();

    for (key, value) in pending {
        let Json::Array(pending_items) = value else {
            continue;
        };
        let confirmed_items = match confirmed.get(key) {
            Some(Json::Array(items)) => items.as_slice(),
            _ => &[],
        };

        let added = missing_from(pending_items, confirmed_items);
        let removed = if pending.is_empty() {
            Vec::new()
        } else {
            missing_from(confirmed_items, pending_items)
        };

        let key_diff = KeyDiff {
            key: key.clone(),
            added,
            removed,
        };
        if !key_diff.is_empty() {
            diffs.push(key_diff);
        }
    }

    diffs
}

/// Identity-bearing items of `items` with no counterpart in `other`.
fn missing_from(items: &[Json], other: &[Json]) -> Vec<Pointer> {
    items
        .iter()
        .filter_map(identity_of)
        .filter(|identity| !other.iter().filter_map(identity_of).any(|o| o == *identity))
        .map(|(class_name, object_id)| Pointer {
            class_name: class_name.to_string(),
            object_id: object_id.to_string(),
        })
        .collect()
}

/// Write the ops for `diffs` into an outgoing payload.
///
/// `op_names` picks the (add, remove) operation pair for a key, which
/// lets relation columns use `AddRelation`/`RemoveRelation`.
pub fn apply(
    payload: &mut Attributes,
    diffs: &[KeyDiff],
    op_names: impl Fn(&str) -> (RelationOp, RelationOp),
) {
    for d in diffs.iter().filter(|d| !d.added.is_empty()) {
        let (add, _) = op_names(&d.key);
        payload.remove(&d.key);
        payload.insert(d.key.clone(), op_json(add, &d.added));
    }

    for d in diffs.iter().filter(|d| !d.removed.is_empty()) {
        let (_, remove) = op_names(&d.key);
        payload.remove(&d.key);
        payload.insert(d.key.clone(), op_json(remove, &d.removed));
    }
}

/// Wire form of a relation-mutation op.
pub fn op_json(op: RelationOp, objects: &[Pointer]) -> Json {
    let objects: Vec<Json> = objects.iter().map(codec::pointer_json).collect();
    json!({ OP_KEY: op.as_str(), "objects": objects })
}
