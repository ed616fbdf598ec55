//! engine::client
//!
//! The context every remote operation runs in.
//!
//! A [`Client`] owns its configuration and a transport. There is no
//! process-wide state: two clients with different credentials can be used
//! side by side.
//!
//! # Lookups
//!
//! - [`Client::find`]: one object by id
//! - [`Client::find_by`] / [`Client::all`]: equality query on one field
//! - [`Client::resolve_pointer`]: follow a [`Pointer`]
//! - [`Client::related`] / [`Client::relation`]: members of a relation
//!   column, via the `$relatedTo` query

use std::sync::Arc;

use serde_json::{json, Value as Json};
use thiserror::Error;

use crate::core::codec;
use crate::core::config::{ClientConfig, ConfigError};
use crate::core::{
    Attributes, Entity, Model, ModelError, Pointer, RelationMut, Schema, ToPointer, Value,
};
use crate::remote::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportError};

/// Backend error code for a missing object.
pub const OBJECT_NOT_FOUND: i64 = 101;

/// Errors from building a [`Client`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Configuration plus transport.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    base_path: String,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Client speaking HTTP to the configured backend.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or lacks credentials.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.require_credentials()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport))?)
    }

    /// Client over an arbitrary transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let base_path = config.base_path()?;
        Ok(Self {
            config,
            base_path,
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Path prefix of the backend root (`"/1"`), used in batch requests.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Send one request.
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ModelError> {
        tracing::debug!(
            transport = self.transport.name(),
            method = %request.method,
            path = %request.path,
            "sending request"
        );
        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!(error = %e, "request failed");
            ModelError::from(e)
        })?;
        tracing::debug!(status = response.status, "received response");
        Ok(response)
    }

    /// Fetch one object by id.
    ///
    /// # Errors
    ///
    /// `NotFound` on HTTP 404 or backend code 101; otherwise the usual
    /// transport and server errors.
    pub async fn find(&self, schema: &Arc<Schema>, object_id: &str) -> Result<Entity, ModelError> {
        let attributes = self.fetch(schema, object_id).await?;
        Ok(Entity::from_server(Arc::clone(schema), attributes))
    }

    /// [`Client::find`] returning a typed model.
    pub async fn find_as<M: Model>(&self, object_id: &str) -> Result<M, ModelError> {
        self.find(&M::schema(), object_id).await.map(M::from_entity)
    }

    /// Raw snapshot of one object.
    pub(crate) async fn fetch(
        &self,
        schema: &Schema,
        object_id: &str,
    ) -> Result<Attributes, ModelError> {
        let response = self.send(ApiRequest::get(schema.item_path(object_id))).await?;

        let not_found = response.status == 404
            || response.server_error().map(|(code, _)| code) == Some(OBJECT_NOT_FOUND);
        if not_found {
            return Err(ModelError::NotFound {
                class_name: schema.class_name().to_string(),
                object_id: object_id.to_string(),
            });
        }
        if !response.is_success() {
            return Err(response.to_error());
        }

        into_attributes(response.body)
    }

    /// Every object whose `key` equals `value`.
    pub async fn find_by(
        &self,
        schema: &Arc<Schema>,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<Entity>, ModelError> {
        let mut constraints = Attributes::new();
        constraints.insert(key.to_string(), codec::encode(&value.into()));
        self.query(schema, schema, Some(constraints)).await
    }

    /// Every object of the class, as far as the backend's default limit.
    pub async fn all(&self, schema: &Arc<Schema>) -> Result<Vec<Entity>, ModelError> {
        self.query(schema, schema, None).await
    }

    /// Fetch the entity a pointer refers to.
    pub async fn resolve_pointer(&self, pointer: &Pointer) -> Result<Entity, ModelError> {
        let schema = Schema::dynamic(pointer.model_name());
        self.find(&schema, &pointer.object_id).await
    }

    /// Fetch every member of `owner`'s relation column `key`.
    pub async fn related(
        &self,
        owner: &Entity,
        key: &str,
        target: &Arc<Schema>,
    ) -> Result<Vec<Entity>, ModelError> {
        let pointer = owner.to_pointer().ok_or(ModelError::MissingObjectId)?;
        let mut constraints = Attributes::new();
        constraints.insert(
            "$relatedTo".to_string(),
            json!({ "object": codec::pointer_json(&pointer), "key": key }),
        );
        self.query(owner.schema(), target, Some(constraints)).await
    }

    /// Materialize `owner`'s relation column `key`.
    ///
    /// The fetched members become the confirmed baseline and the returned
    /// handle edits a pending copy, so the next save sends exactly the
    /// membership changes.
    pub async fn relation<'a>(
        &self,
        owner: &'a mut Entity,
        key: &str,
        target: &Arc<Schema>,
    ) -> Result<RelationMut<'a>, ModelError> {
        let members: Vec<Pointer> = self
            .related(owner, key, target)
            .await?
            .iter()
            .filter_map(ToPointer::to_pointer)
            .collect();
        tracing::debug!(
            class = owner.class_name(),
            key,
            members = members.len(),
            "materialized relation"
        );
        owner
            .attach_relation(key, target.class_name(), &members)
            .ok_or_else(|| ModelError::Decode(format!("relation '{}' is not an array", key)))
    }

    async fn query(
        &self,
        origin: &Schema,
        target: &Arc<Schema>,
        constraints: Option<Attributes>,
    ) -> Result<Vec<Entity>, ModelError> {
        let mut request = ApiRequest::get(target.collection_path());
        if let Some(constraints) = constraints {
            let encoded = serde_json::to_string(&constraints)
                .map_err(|e| ModelError::Decode(e.to_string()))?;
            request = request.with_query("where", encoded);
        }
        tracing::debug!(origin = origin.class_name(), target = target.class_name(), "query");

        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(response.to_error());
        }

        let Json::Object(mut body) = response.body else {
            return Err(ModelError::Decode("query response is not an object".into()));
        };
        let Some(Json::Array(results)) = body.remove("results") else {
            return Err(ModelError::Decode("query response has no results".into()));
        };

        results
            .into_iter()
            .map(|item| into_attributes(item).map(|a| Entity::from_server(Arc::clone(target), a)))
            .collect()
    }
}

/// A response body that must be a JSON object.
pub(crate) fn into_attributes(body: Json) -> Result<Attributes, ModelError> {
    match body {
        Json::Object(map) => Ok(map),
        other => Err(ModelError::Decode(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
