//! engine::batch
//!
//! Many entities per round trip through `POST /batch`.
//!
//! # Protocol
//!
//! Entities are split into consecutive slices of at most `slice_size`
//! (clamped to [`MAX_BATCH_SIZE`]) and each slice is sent as
//!
//! ```json
//! {"requests": [{"method": "POST", "path": "/1/classes/Post", "body": {…}}, …]}
//! ```
//!
//! Slices go out strictly one after another, in order. The response is an
//! array with one `{"success": …}` or `{"error": …}` element per request,
//! matched to entities by position.
//!
//! # Failure Semantics
//!
//! - HTTP 400 aborts the whole batch; earlier slices stay applied
//! - a response that is not an array of the right length is not merged,
//!   and the remaining slices still go out
//! - `{"error": …}` elements are recorded on the matching entity
//! - deletes are never merged
//!
//! Batches do not run lifecycle hooks or validation.

use serde_json::{json, Value as Json};

use super::client::Client;
use crate::core::{Entity, ModelError};
use crate::remote::{ApiRequest, Method};

/// Slice size when the caller has no preference.
pub const DEFAULT_SLICE_SIZE: usize = 20;

/// Most requests the backend accepts in one batch.
pub const MAX_BATCH_SIZE: usize = 50;

/// What happened to a batch that was not aborted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Slices sent
    pub slices: usize,
    /// Entities that absorbed a `success` payload
    pub merged: usize,
    /// Slices whose response could not be matched to their entities
    pub skipped: usize,
    /// Entities that received an `error` element
    pub item_errors: usize,
}

impl Client {
    /// Save `entities` in batches. Returns `false` if a slice was rejected.
    ///
    /// `method` overrides the per-entity choice of POST (new) or PUT
    /// (persisted).
    pub async fn batch_save<E: AsMut<Entity>>(
        &self,
        entities: &mut [E],
        slice_size: usize,
        method: Option<Method>,
    ) -> bool {
        self.try_batch_save(entities, slice_size, method)
            .await
            .is_ok()
    }

    /// Delete `entities` in batches.
    pub async fn batch_destroy<E: AsMut<Entity>>(
        &self,
        entities: &mut [E],
        slice_size: usize,
    ) -> bool {
        self.try_batch_save(entities, slice_size, Some(Method::Delete))
            .await
            .is_ok()
    }

    /// [`Client::batch_save`], reporting what happened.
    ///
    /// # Errors
    ///
    /// - `BatchAbort` when a slice is answered with HTTP 400
    /// - `Transport` when a slice gets no response at all
    pub async fn try_batch_save<E: AsMut<Entity>>(
        &self,
        entities: &mut [E],
        slice_size: usize,
        method: Option<Method>,
    ) -> Result<BatchReport, ModelError> {
        let slice_size = slice_size.clamp(1, MAX_BATCH_SIZE);
        let mut report = BatchReport::default();

        for (index, slice) in entities.chunks_mut(slice_size).enumerate() {
            let envelope = self.build_envelope(slice, method);
            tracing::debug!(slice = index, requests = slice.len(), "sending batch slice");

            let response = self.send(ApiRequest::post("batch", envelope)).await?;
            if response.status == 400 {
                tracing::warn!(slice = index, "batch slice rejected");
                return Err(ModelError::BatchAbort {
                    slice: index,
                    status: response.status,
                });
            }
            report.slices += 1;

            if method == Some(Method::Delete) {
                continue;
            }

            match response.body.as_array() {
                Some(items) if items.len() == slice.len() => {
                    for (entity, item) in slice.iter_mut().zip(items) {
                        absorb(entity.as_mut(), item, &mut report);
                    }
                }
                _ => {
                    tracing::debug!(
                        slice = index,
                        status = response.status,
                        "batch response does not match slice; not merging"
                    );
                    report.skipped += 1;
                }
            }
        }

        tracing::debug!(?report, "batch complete");
        Ok(report)
    }

    /// The `{"requests": […]}` envelope for one slice.
    pub fn build_envelope<E: AsMut<Entity>>(&self, slice: &mut [E], method: Option<Method>) -> Json {
        let requests: Vec<Json> = slice
            .iter_mut()
            .map(|entity| self.batch_request(entity.as_mut(), method))
            .collect();
        json!({ "requests": requests })
    }

    fn batch_request(&self, entity: &Entity, method: Option<Method>) -> Json {
        let method = method.unwrap_or(if entity.is_new() {
            Method::Post
        } else {
            Method::Put
        });

        let mut path = format!("{}/{}", self.base_path(), entity.schema().collection_path());
        if let Some(object_id) = entity.object_id() {
            path.push('/');
            path.push_str(object_id);
        }

        let mut request = json!({ "method": method, "path": path });
        if method != Method::Delete {
            request["body"] = Json::Object(entity.attributes_for_saving());
        }
        request
    }
}

/// Apply one response element to its entity.
fn absorb(entity: &mut Entity, item: &Json, report: &mut BatchReport) {
    if let Some(success) = item.get("success").and_then(Json::as_object) {
        entity.merge(success.clone());
        report.merged += 1;
    } else if let Some(error) = item.get("error") {
        let code = error.get("code").and_then(Json::as_i64);
        let message = error.get("error").and_then(Json::as_str);
        let err = match (code, message) {
            (Some(code), Some(message)) => ModelError::Server {
                code,
                message: message.to_string(),
            },
            _ => ModelError::Decode(format!("malformed batch error: {}", error)),
        };
        entity.push_error(err);
        report.item_errors += 1;
    }
}
