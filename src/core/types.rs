//! core::types
//!
//! Value objects shared by the codec, the attribute store and the engine.
//!
//! # Class names
//!
//! Models are addressed by their model name (`"Post"`, `"User"`). The
//! backend reserves underscore-prefixed class names for its built-in
//! collections, so a handful of model names are translated before they
//! reach the wire:
//!
//! | model          | class            | collection       |
//! |----------------|------------------|------------------|
//! | `User`         | `_User`          | `users`          |
//! | `Installation` | `_Installation`  | `installations`  |
//! | `Role`         | `_Role`          | `roles`          |
//! | `Session`      | `_Session`       | `sessions`       |
//! | anything else  | unchanged        | `classes/{name}` |

use std::fmt;

use serde_json::{Map, Value as Json};

/// Attribute key holding the server-assigned identifier.
pub const OBJECT_ID: &str = "objectId";

/// Attribute key holding the creation timestamp.
pub const CREATED_AT: &str = "createdAt";

/// Attribute key holding the last-update timestamp.
pub const UPDATED_AT: &str = "updatedAt";

/// Keys owned by the server; they are never sent in a write payload.
pub const SERVER_KEYS: [&str; 3] = [OBJECT_ID, CREATED_AT, UPDATED_AT];

/// Built-in models and their reserved backend class names.
const RESERVED_CLASSES: [(&str, &str, &str); 4] = [
    ("User", "_User", "users"),
    ("Installation", "_Installation", "installations"),
    ("Role", "_Role", "roles"),
    ("Session", "_Session", "sessions"),
];

/// Map a model name to the class name the backend knows it by.
///
/// # Example
///
/// ```
/// use keelson::core::types::class_name_for;
///
/// assert_eq!(class_name_for("User"), "_User");
/// assert_eq!(class_name_for("Post"), "Post");
/// ```
pub fn class_name_for(model_name: &str) -> &str {
    RESERVED_CLASSES
        .iter()
        .find(|(model, _, _)| *model == model_name)
        .map(|(_, class, _)| *class)
        .unwrap_or(model_name)
}

/// Map a backend class name back to its model name (`_Role` → `Role`).
pub fn model_name_for(class_name: &str) -> &str {
    RESERVED_CLASSES
        .iter()
        .find(|(_, class, _)| *class == class_name)
        .map(|(model, _, _)| *model)
        .unwrap_or(class_name)
}

/// Relative REST path of the collection holding a model's objects.
///
/// Accepts either the model name or the reserved class name.
pub fn collection_path(model_name: &str) -> String {
    let class_name = class_name_for(model_name);
    match RESERVED_CLASSES.iter().find(|(_, class, _)| *class == class_name) {
        Some((_, _, collection)) => (*collection).to_string(),
        None => format!("classes/{}", class_name),
    }
}

/// Something that can be referenced by id from another object.
///
/// Implementors without an identity (an entity that was never saved)
/// return `None`.
pub trait ToPointer {
    /// Produce a weak by-id reference to `self`.
    fn to_pointer(&self) -> Option<Pointer>;
}

/// Weak, by-id reference to an object of another class.
///
/// A pointer never implies ownership; resolving it means fetching the
/// referenced object by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pointer {
    /// Backend class name (already mapped, e.g. `_Role`)
    pub class_name: String,
    /// Identifier of the referenced object
    pub object_id: String,
}

impl Pointer {
    /// Create a pointer to `object_id` of the given model.
    ///
    /// The model name is mapped to its backend class name, so
    /// `Pointer::new("Role", "R1")` points at class `_Role`.
    pub fn new(model_name: &str, object_id: impl Into<String>) -> Self {
        Self {
            class_name: class_name_for(model_name).to_string(),
            object_id: object_id.into(),
        }
    }

    /// Model name of the referenced class.
    pub fn model_name(&self) -> &str {
        model_name_for(&self.class_name)
    }
}

impl ToPointer for Pointer {
    fn to_pointer(&self) -> Option<Pointer> {
        Some(self.clone())
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.class_name, self.object_id)
    }
}

/// Geographic coordinate value object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new geo point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Reference to a file stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Server-side file name, when known
    pub name: Option<String>,
    /// Public URL of the file contents
    pub url: String,
}

/// Object embedded inline in another object's attributes.
///
/// Embedded objects arrive with their fields expanded. They are never
/// fetched and carry no pending state; if they have an `objectId` they
/// can still be referenced through [`ToPointer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Embedded {
    /// Backend class name
    pub class_name: String,
    /// Inline fields (without the `__type`/`className` tags)
    pub fields: Map<String, Json>,
}

impl Embedded {
    /// Identifier of the embedded object, if it has one.
    pub fn object_id(&self) -> Option<&str> {
        self.fields.get(OBJECT_ID).and_then(Json::as_str)
    }
}

impl ToPointer for Embedded {
    fn to_pointer(&self) -> Option<Pointer> {
        self.object_id().map(|id| Pointer {
            class_name: self.class_name.clone(),
            object_id: id.to_string(),
        })
    }
}

/// Relation-mutation operation names understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationOp {
    /// Append members to an array column
    Add,
    /// Remove members from an array column
    Remove,
    /// Add members to a relation column
    AddRelation,
    /// Remove members from a relation column
    RemoveRelation,
}

impl RelationOp {
    /// Wire name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationOp::Add => "Add",
            RelationOp::Remove => "Remove",
            RelationOp::AddRelation => "AddRelation",
            RelationOp::RemoveRelation => "RemoveRelation",
        }
    }
}

impl fmt::Display for RelationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
