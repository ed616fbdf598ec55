//! core::model
//!
//! Typed models over [`Entity`].
//!
//! A model is a newtype around an entity with a schema that is built once
//! per type. The [`model!`](crate::model) macro generates the newtype, the
//! [`Model`] impl and one getter/setter pair per declared field.
//!
//! # Example
//!
//! ```
//! use keelson::core::Model;
//!
//! keelson::model! {
//!     pub struct Post: "Post" {
//!         has_many: ["tags"];
//!         required: ["title"];
//!         fields {
//!             title / set_title: String => "title",
//!             views / set_views: i64 => "views",
//!         }
//!     }
//! }
//!
//! let mut post = Post::new();
//! post.set_title("Hello").set_views(3);
//! assert_eq!(post.title().as_deref(), Some("Hello"));
//! assert_eq!(post.views(), Some(3));
//! assert!(post.is_new());
//! ```

use std::sync::Arc;

use super::entity::Entity;
use super::schema::Schema;

/// A typed wrapper over an [`Entity`] of a fixed schema.
pub trait Model: Sized {
    /// Schema shared by every instance.
    fn schema() -> Arc<Schema>;

    /// Wrap an entity. The entity should carry [`Model::schema`].
    fn from_entity(entity: Entity) -> Self;

    fn entity(&self) -> &Entity;

    fn entity_mut(&mut self) -> &mut Entity;

    fn into_entity(self) -> Entity;

    /// A new, unsaved instance.
    fn new() -> Self {
        Self::from_entity(Entity::new(Self::schema()))
    }
}

/// Declare a typed model.
///
/// Sections before `fields` are optional but must appear in this order:
/// `has_many`, `belongs_to`, `relations`, `required`, `hooks`.
#[macro_export]
macro_rules! model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $model_name:literal {
            $(has_many: [$($has_many:literal),* $(,)?];)?
            $(belongs_to: [$($belongs_to:literal),* $(,)?];)?
            $(relations: [$($relation:literal),* $(,)?];)?
            $(required: [$($required:literal),* $(,)?];)?
            $(hooks: $hooks:expr;)?
            fields {
                $($getter:ident / $setter:ident : $ty:ty => $key:literal),* $(,)?
            }
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name($crate::core::Entity);

        impl $crate::core::Model for $name {
            fn schema() -> ::std::sync::Arc<$crate::core::Schema> {
                static SCHEMA: ::std::sync::OnceLock<::std::sync::Arc<$crate::core::Schema>> =
                    ::std::sync::OnceLock::new();
                SCHEMA
                    .get_or_init(|| {
                        let builder = $crate::core::Schema::builder($model_name);
                        $($(let builder = builder.has_many($has_many);)*)?
                        $($(let builder = builder.belongs_to($belongs_to);)*)?
                        $($(let builder = builder.relation($relation);)*)?
                        $($(let builder = builder.required($required);)*)?
                        $(let builder = builder.hooks($hooks);)?
                        builder.build()
                    })
                    .clone()
            }

            fn from_entity(entity: $crate::core::Entity) -> Self {
                Self(entity)
            }

            fn entity(&self) -> &$crate::core::Entity {
                &self.0
            }

            fn entity_mut(&mut self) -> &mut $crate::core::Entity {
                &mut self.0
            }

            fn into_entity(self) -> $crate::core::Entity {
                self.0
            }
        }

        impl $name {
            $(
                pub fn $getter(&self) -> ::std::option::Option<$ty> {
                    self.0.get_as::<$ty>($key)
                }

                pub fn $setter(&mut self, value: impl ::std::convert::Into<$crate::core::Value>) -> &mut Self {
                    self.0.set($key, value);
                    self
                }
            )*
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::core::Entity;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl ::std::convert::AsRef<$crate::core::Entity> for $name {
            fn as_ref(&self) -> &$crate::core::Entity {
                &self.0
            }
        }

        impl ::std::convert::AsMut<$crate::core::Entity> for $name {
            fn as_mut(&mut self) -> &mut $crate::core::Entity {
                &mut self.0
            }
        }

        impl $crate::core::ToPointer for $name {
            fn to_pointer(&self) -> ::std::option::Option<$crate::core::Pointer> {
                self.0.to_pointer()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Pointer, ToPointer};
    use serde_json::json;

    crate::model! {
        /// Test model
        pub struct Account: "User" {
            has_many: ["roles"];
            relations: ["friends"];
            required: ["username"];
            fields {
                username / set_username: String => "username",
                age / set_age: i64 => "age",
                manager / set_manager: Pointer => "manager",
            }
        }
    }

    #[test]
    fn schema_is_shared() {
        let a = Account::schema();
        let b = Account::schema();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.class_name(), "_User");
        assert!(a.is_has_many("roles"));
        assert!(a.is_relation("friends"));
        assert_eq!(a.required(), ["username".to_string()]);
    }

    #[test]
    fn typed_accessors() {
        let mut account = Account::new();
        account
            .set_username("alice")
            .set_age(30)
            .set_manager(Pointer::new("User", "m1"));

        assert_eq!(account.username().as_deref(), Some("alice"));
        assert_eq!(account.age(), Some(30));
        assert_eq!(account.manager(), Some(Pointer::new("User", "m1")));
        assert_eq!(
            account.store().pending().get("manager"),
            Some(&json!({"__type": "Pointer", "className": "_User", "objectId": "m1"}))
        );
    }

    #[test]
    fn wraps_server_entities() {
        let entity = Entity::from_server(
            Account::schema(),
            json!({"objectId": "u1", "username": "bob"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let account = Account::from_entity(entity);
        assert_eq!(account.username().as_deref(), Some("bob"));
        assert_eq!(account.to_pointer(), Some(Pointer::new("User", "u1")));
        assert_eq!(account.into_entity().object_id(), Some("u1"));
    }
}
