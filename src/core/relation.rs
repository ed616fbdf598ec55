//! core::relation
//!
//! Mutable view over a to-many attribute.
//!
//! A [`RelationMut`] borrows the pending copy of an array-valued key, so
//! every change made through it is diffed against the confirmed baseline
//! on the next save.

use serde_json::Value as Json;

use super::codec::{self, identity_of};
use super::types::{Pointer, ToPointer};

/// Handle for adding and removing members of a to-many attribute.
#[derive(Debug)]
pub struct RelationMut<'a> {
    items: &'a mut Vec<Json>,
    target_class: Option<String>,
}

impl<'a> RelationMut<'a> {
    pub(crate) fn new(items: &'a mut Vec<Json>, target_class: Option<String>) -> Self {
        let target_class = target_class.or_else(|| {
            items
                .iter()
                .find_map(identity_of)
                .map(|(class_name, _)| class_name.to_string())
        });
        Self {
            items,
            target_class,
        }
    }

    /// Class of the members, when known.
    pub fn target_class(&self) -> Option<&str> {
        self.target_class.as_deref()
    }

    /// Number of items, identity-bearing or not.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pointers to every identity-bearing member, in order.
    pub fn pointers(&self) -> Vec<Pointer> {
        self.items
            .iter()
            .filter_map(identity_of)
            .map(|(class_name, object_id)| Pointer {
                class_name: class_name.to_string(),
                object_id: object_id.to_string(),
            })
            .collect()
    }

    /// Whether `member` is already present.
    pub fn contains(&self, member: &impl ToPointer) -> bool {
        member
            .to_pointer()
            .is_some_and(|p| self.position(&p).is_some())
    }

    /// Append `member`.
    ///
    /// Returns `false` when the member has no identity or is already present.
    pub fn push(&mut self, member: &impl ToPointer) -> bool {
        let Some(pointer) = member.to_pointer() else {
            return false;
        };
        if self.position(&pointer).is_some() {
            return false;
        }
        if self.target_class.is_none() {
            self.target_class = Some(pointer.class_name.clone());
        }
        self.items.push(codec::pointer_json(&pointer));
        true
    }

    /// Remove `member`. Returns whether it was present.
    pub fn remove(&mut self, member: &impl ToPointer) -> bool {
        let Some(index) = member.to_pointer().and_then(|p| self.position(&p)) else {
            return false;
        };
        self.items.remove(index);
        true
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn position(&self, pointer: &Pointer) -> Option<usize> {
        self.items.iter().position(|item| {
            identity_of(item) == Some((pointer.class_name.as_str(), pointer.object_id.as_str()))
        })
    }
}
