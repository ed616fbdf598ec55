//! engine::lifecycle
//!
//! Save, create, update, destroy and reload for a single entity.
//!
//! # Save Flow
//!
//! ```text
//! validate → before_save → before_create → POST   → after_create → after_save
//!                        → before_update → PUT    → after_update → after_save
//! ```
//!
//! A persisted entity with nothing pending is not sent at all. A halt from
//! a before-hook fails the save; a halt from an after-hook only skips the
//! hooks after it.
//!
//! # Error Reporting
//!
//! Every `try_*` method records its error on the entity (see
//! [`Entity::errors`]) before returning it. The boolean methods are thin
//! wrappers that answer whether the `try_*` call succeeded, so failures
//! never cross the boolean boundary as errors.

use std::sync::Arc;

use super::client::{into_attributes, Client};
use crate::core::{Entity, Flow, Hooks, ModelError};
use crate::remote::ApiRequest;

impl Client {
    /// Save `entity`, creating or updating as its state requires.
    pub async fn save(&self, entity: &mut Entity) -> bool {
        self.try_save(entity).await.is_ok()
    }

    /// [`Client::save`], returning the first error.
    pub async fn try_save(&self, entity: &mut Entity) -> Result<(), ModelError> {
        entity.clear_errors();

        let violations = entity.schema().validate(entity);
        if !violations.is_empty() {
            let mut errors: Vec<ModelError> = violations
                .into_iter()
                .map(|v| ModelError::Validation {
                    key: v.key,
                    message: v.message,
                })
                .collect();
            tracing::debug!(
                class = entity.class_name(),
                violations = errors.len(),
                "validation failed"
            );
            for error in &errors {
                entity.push_error(error.clone());
            }
            return Err(errors.swap_remove(0));
        }

        if entity.is_persisted() && !entity.is_dirty() {
            tracing::debug!(
                class = entity.class_name(),
                object_id = entity.object_id(),
                "nothing to save"
            );
            return Ok(());
        }

        let result = self.run_save(entity).await;
        record(entity, result)
    }

    async fn run_save(&self, entity: &mut Entity) -> Result<(), ModelError> {
        run_hook(entity, "before_save", |h, e| h.before_save(e))?;

        let flow = if entity.is_new() {
            self.run_create(entity).await?
        } else {
            self.run_update(entity).await?
        };

        if flow == Flow::Continue {
            run_after_hook(entity, "after_save", |h, e| h.after_save(e));
        }
        Ok(())
    }

    /// Create `entity` with `POST /{collection}`.
    pub async fn create(&self, entity: &mut Entity) -> bool {
        self.try_create(entity).await.is_ok()
    }

    /// [`Client::create`], returning the error.
    ///
    /// Runs the create hooks but not the save hooks or validation.
    pub async fn try_create(&self, entity: &mut Entity) -> Result<(), ModelError> {
        entity.clear_errors();
        let result = self.run_create(entity).await.map(|_| ());
        record(entity, result)
    }

    async fn run_create(&self, entity: &mut Entity) -> Result<Flow, ModelError> {
        run_hook(entity, "before_create", |h, e| h.before_create(e))?;

        let payload = entity.attributes_for_saving();
        let request = ApiRequest::post(entity.schema().collection_path(), payload.into());
        self.write(entity, request).await?;
        tracing::info!(
            class = entity.class_name(),
            object_id = entity.object_id(),
            "created"
        );

        Ok(run_after_hook(entity, "after_create", |h, e| h.after_create(e)))
    }

    /// Update `entity` with `PUT /{collection}/{id}`.
    pub async fn update(&self, entity: &mut Entity) -> bool {
        self.try_update(entity).await.is_ok()
    }

    /// [`Client::update`], returning the error.
    ///
    /// Runs the update hooks but not the save hooks or validation.
    pub async fn try_update(&self, entity: &mut Entity) -> Result<(), ModelError> {
        entity.clear_errors();
        let result = self.run_update(entity).await.map(|_| ());
        record(entity, result)
    }

    async fn run_update(&self, entity: &mut Entity) -> Result<Flow, ModelError> {
        let object_id = entity
            .object_id()
            .ok_or(ModelError::MissingObjectId)?
            .to_string();

        run_hook(entity, "before_update", |h, e| h.before_update(e))?;

        let payload = entity.attributes_for_saving();
        let request = ApiRequest::put(entity.schema().item_path(&object_id), payload.into());
        self.write(entity, request).await?;
        tracing::info!(class = entity.class_name(), object_id = %object_id, "updated");

        Ok(run_after_hook(entity, "after_update", |h, e| h.after_update(e)))
    }

    /// Send a create or update and merge the response.
    async fn write(&self, entity: &mut Entity, request: ApiRequest) -> Result<(), ModelError> {
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(response.to_error());
        }
        entity.merge(into_attributes(response.body)?);
        Ok(())
    }

    /// Delete `entity` with `DELETE /{collection}/{id}`.
    ///
    /// On success both snapshots are cleared and the entity becomes a new,
    /// identity-less husk; saving it again creates a fresh object.
    pub async fn destroy(&self, entity: &mut Entity) -> bool {
        self.try_destroy(entity).await.is_ok()
    }

    /// [`Client::destroy`], returning the error.
    pub async fn try_destroy(&self, entity: &mut Entity) -> Result<(), ModelError> {
        entity.clear_errors();
        let result = self.run_destroy(entity).await;
        record(entity, result)
    }

    async fn run_destroy(&self, entity: &mut Entity) -> Result<(), ModelError> {
        let object_id = entity.object_id().ok_or(ModelError::MissingObjectId)?;
        let path = entity.schema().item_path(object_id);

        let response = self.send(ApiRequest::delete(path)).await?;
        if !response.is_success() {
            return Err(response.to_error());
        }

        tracing::info!(
            class = entity.class_name(),
            object_id = entity.object_id(),
            "destroyed"
        );
        entity.mark_destroyed();
        Ok(())
    }

    /// Refetch `entity` and drop its pending writes.
    ///
    /// A new entity cannot be reloaded.
    pub async fn reload(&self, entity: &mut Entity) -> bool {
        self.try_reload(entity).await.is_ok()
    }

    /// [`Client::reload`], returning the error.
    pub async fn try_reload(&self, entity: &mut Entity) -> Result<(), ModelError> {
        entity.clear_errors();
        let result = self.run_reload(entity).await;
        record(entity, result)
    }

    async fn run_reload(&self, entity: &mut Entity) -> Result<(), ModelError> {
        let object_id = entity
            .object_id()
            .ok_or(ModelError::MissingObjectId)?
            .to_string();
        let schema = Arc::clone(entity.schema());

        let fresh = self.fetch(&schema, &object_id).await?;
        entity.refresh(fresh);
        Ok(())
    }
}

/// Run one hook, if the schema has hooks.
fn run_hook(
    entity: &mut Entity,
    name: &'static str,
    hook: impl FnOnce(&dyn Hooks, &mut Entity) -> Flow,
) -> Result<(), ModelError> {
    let schema = Arc::clone(entity.schema());
    let Some(hooks) = schema.hooks() else {
        return Ok(());
    };

    match hook(hooks, entity) {
        Flow::Continue => Ok(()),
        Flow::Halt => {
            tracing::debug!(class = entity.class_name(), hook = name, "halted by hook");
            Err(ModelError::Halted(name))
        }
    }
}

/// Run a hook that fires after the write went through.
///
/// The object is already persisted, so a halt only skips the hooks that
/// would follow; it is not an error.
fn run_after_hook(
    entity: &mut Entity,
    name: &'static str,
    hook: impl FnOnce(&dyn Hooks, &mut Entity) -> Flow,
) -> Flow {
    match run_hook(entity, name, hook) {
        Ok(()) => Flow::Continue,
        Err(_) => Flow::Halt,
    }
}

/// Record a failure on the entity and pass the result through.
fn record(entity: &mut Entity, result: Result<(), ModelError>) -> Result<(), ModelError> {
    if let Err(err) = &result {
        if !err.is_local() {
            tracing::warn!(class = entity.class_name(), error = %err, "persistence failed");
        }
        entity.push_error(err.clone());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ClientConfig;
    use crate::core::Schema;
    use crate::remote::{Method, MockTransport, TransportError};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client() -> (Client, MockTransport) {
        let mock = MockTransport::new();
        let client =
            Client::with_transport(ClientConfig::new("app", "key"), Arc::new(mock.clone()))
                .unwrap();
        (client, mock)
    }

    fn persisted(schema: Arc<Schema>, id: &str) -> Entity {
        Entity::from_server(schema, json!({ "objectId": id }).as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn update_sends_only_pending() {
        let (client, mock) = client();
        mock.respond(200, json!({"updatedAt": "2024-03-01T10:00:00.000Z"}));

        let mut post = Entity::from_server(
            Schema::dynamic("Post"),
            json!({"objectId": "p1", "title": "old", "views": 1})
                .as_object()
                .cloned()
                .unwrap(),
        );
        post.set("title", "new");

        assert!(client.save(&mut post).await);

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.path, "classes/Post/p1");
        assert_eq!(request.body, Some(json!({"title": "new"})));
        assert!(!post.is_dirty());
        assert!(post.updated_at().is_some());
    }

    #[tokio::test]
    async fn server_error_is_recorded() {
        let (client, mock) = client();
        mock.respond(400, json!({"code": 137, "error": "duplicate value"}));

        let mut user = Entity::with_attributes(Schema::dynamic("User"), [("email", "a@b.c")]);

        assert!(!client.save(&mut user).await);
        assert_eq!(
            user.errors(),
            [ModelError::Server {
                code: 137,
                message: "duplicate value".into()
            }]
        );
        assert!(user.is_dirty());
        assert!(user.is_new());
    }

    #[tokio::test]
    async fn non_structured_failure_is_http_error() {
        let (client, mock) = client();
        mock.respond(204, serde_json::Value::Null);

        let mut post = Entity::with_attributes(Schema::dynamic("Post"), [("a", 1)]);
        assert_eq!(
            client.try_save(&mut post).await,
            Err(ModelError::Http { status: 204 })
        );
    }

    #[tokio::test]
    async fn transport_failure_is_recorded() {
        let (client, mock) = client();
        mock.fail(TransportError::Network("connection reset".into()));

        let mut post = Entity::with_attributes(Schema::dynamic("Post"), [("a", 1)]);
        assert!(!client.save(&mut post).await);
        assert!(matches!(post.errors(), [ModelError::Transport(_)]));
    }

    #[tokio::test]
    async fn validation_blocks_request() {
        let (client, mock) = client();
        let schema = Schema::builder("Post")
            .required("title")
            .required("body")
            .build();
        let mut post = Entity::new(schema);

        let err = client.try_save(&mut post).await.unwrap_err();

        assert_eq!(
            err,
            ModelError::Validation {
                key: "title".into(),
                message: "can't be blank".into()
            }
        );
        assert_eq!(post.errors().len(), 2);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn errors_cleared_on_next_attempt() {
        let (client, mock) = client();
        mock.respond(500, json!({"code": 1, "error": "internal"}))
            .respond(201, json!({"objectId": "p1"}));

        let mut post = Entity::with_attributes(Schema::dynamic("Post"), [("a", 1)]);
        assert!(!client.save(&mut post).await);
        assert_eq!(post.errors().len(), 1);

        assert!(client.save(&mut post).await);
        assert!(post.errors().is_empty());
        assert_eq!(post.object_id(), Some("p1"));
    }

    #[derive(Default)]
    struct Recorder {
        calls: std::sync::Mutex<Vec<&'static str>>,
        halt_before_update: bool,
        halt_after_create: bool,
    }

    impl Recorder {
        fn push(&self, name: &'static str) {
            self.calls.lock().unwrap().push(name);
        }
    }

    impl Hooks for Recorder {
        fn before_save(&self, _: &mut Entity) -> Flow {
            self.push("before_save");
            Flow::Continue
        }
        fn before_create(&self, _: &mut Entity) -> Flow {
            self.push("before_create");
            Flow::Continue
        }
        fn after_create(&self, _: &mut Entity) -> Flow {
            self.push("after_create");
            if self.halt_after_create {
                Flow::Halt
            } else {
                Flow::Continue
            }
        }
        fn before_update(&self, _: &mut Entity) -> Flow {
            self.push("before_update");
            if self.halt_before_update {
                Flow::Halt
            } else {
                Flow::Continue
            }
        }
        fn after_update(&self, _: &mut Entity) -> Flow {
            self.push("after_update");
            Flow::Continue
        }
        fn after_save(&self, _: &mut Entity) -> Flow {
            self.push("after_save");
            Flow::Continue
        }
    }

    #[tokio::test]
    async fn hooks_run_in_order_on_create() {
        let (client, mock) = client();
        mock.respond(201, json!({"objectId": "p1"}));

        let recorder = Arc::new(Recorder::default());
        let schema = Schema::builder("Post").hooks(recorder.clone()).build();
        let mut post = Entity::with_attributes(schema, [("title", "x")]);

        assert!(client.save(&mut post).await);
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            ["before_save", "before_create", "after_create", "after_save"]
        );
    }

    #[tokio::test]
    async fn halting_hook_prevents_request() {
        let (client, mock) = client();
        let recorder = Arc::new(Recorder {
            halt_before_update: true,
            ..Default::default()
        });
        let schema = Schema::builder("Post").hooks(recorder.clone()).build();
        let mut post = persisted(schema, "p1");
        post.set("title", "x");

        assert_eq!(
            client.try_save(&mut post).await,
            Err(ModelError::Halted("before_update"))
        );
        assert_eq!(mock.request_count(), 0);
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            ["before_save", "before_update"]
        );
        assert!(post.is_dirty());
    }

    #[tokio::test]
    async fn halting_after_hook_keeps_successful_write() {
        let (client, mock) = client();
        mock.respond(201, json!({"objectId": "p1"}));

        let recorder = Arc::new(Recorder {
            halt_after_create: true,
            ..Default::default()
        });
        let schema = Schema::builder("Post").hooks(recorder.clone()).build();
        let mut post = Entity::with_attributes(schema, [("title", "x")]);

        assert!(client.save(&mut post).await);
        assert_eq!(post.object_id(), Some("p1"));
        assert!(post.errors().is_empty());
        assert!(!post.is_dirty());
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            ["before_save", "before_create", "after_create"]
        );
    }

    struct Stamp(AtomicUsize);

    impl Hooks for Stamp {
        fn before_save(&self, entity: &mut Entity) -> Flow {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            entity.set("revision", n as i64);
            Flow::Continue
        }
    }

    #[tokio::test]
    async fn before_save_can_modify_payload() {
        let (client, mock) = client();
        mock.respond(201, json!({"objectId": "p1"}));

        let schema = Schema::builder("Post")
            .hooks(Arc::new(Stamp(AtomicUsize::new(7))))
            .build();
        let mut post = Entity::with_attributes(schema, [("title", "x")]);

        assert!(client.save(&mut post).await);
        assert_eq!(
            mock.last_request().unwrap().body,
            Some(json!({"title": "x", "revision": 7}))
        );
    }

    #[tokio::test]
    async fn create_and_update_directly() {
        let (client, mock) = client();
        mock.respond(201, json!({"objectId": "p9"}))
            .respond(200, json!({"updatedAt": "2024-03-01T10:00:00.000Z"}));

        let mut post = Entity::with_attributes(Schema::dynamic("Post"), [("a", 1)]);
        assert!(client.create(&mut post).await);
        post.set("a", 2);
        assert!(client.update(&mut post).await);

        let requests = mock.requests();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[1].path, "classes/Post/p9");
    }

    #[tokio::test]
    async fn update_needs_object_id() {
        let (client, mock) = client();
        let mut post = Entity::with_attributes(Schema::dynamic("Post"), [("a", 1)]);
        assert_eq!(
            client.try_update(&mut post).await,
            Err(ModelError::MissingObjectId)
        );
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn failed_destroy_leaves_state() {
        let (client, mock) = client();
        mock.respond(403, json!({"code": 119, "error": "forbidden"}));

        let mut post = persisted(Schema::dynamic("Post"), "p1");
        post.set("title", "kept");

        assert!(!client.destroy(&mut post).await);
        assert_eq!(post.object_id(), Some("p1"));
        assert!(post.is_dirty());
        assert!(!post.is_destroyed());
    }

    #[tokio::test]
    async fn destroy_new_entity_fails_locally() {
        let (client, mock) = client();
        let mut post = Entity::new(Schema::dynamic("Post"));
        assert!(!client.destroy(&mut post).await);
        assert_eq!(post.errors(), [ModelError::MissingObjectId]);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn reload_overlays_and_drops_pending() {
        let (client, mock) = client();
        mock.respond(200, json!({"objectId": "p1", "title": "server", "views": 5}));

        let mut post = Entity::from_server(
            Schema::dynamic("Post"),
            json!({"objectId": "p1", "title": "stale", "local": true})
                .as_object()
                .cloned()
                .unwrap(),
        );
        post.set("title", "unsaved");

        assert!(client.reload(&mut post).await);
        assert_eq!(post.get_as::<String>("title").as_deref(), Some("server"));
        assert_eq!(post.get_as::<i64>("views"), Some(5));
        assert_eq!(post.get_as::<bool>("local"), Some(true));
        assert!(!post.is_dirty());
        assert_eq!(mock.last_request().unwrap().method, Method::Get);
    }

    #[tokio::test]
    async fn reload_new_entity_is_false() {
        let (client, mock) = client();
        let mut post = Entity::new(Schema::dynamic("Post"));
        assert!(!client.reload(&mut post).await);
        assert_eq!(mock.request_count(), 0);
    }
}
