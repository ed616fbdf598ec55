//! Integration tests for batched persistence.
//!
//! These tests verify slicing, positional merging and abort semantics of
//! `POST /batch` using a scripted transport.

use std::sync::Arc;

use serde_json::{json, Value as Json};

use keelson::core::config::ClientConfig;
use keelson::core::{Entity, ModelError, Schema};
use keelson::engine::{BatchReport, Client};
use keelson::remote::{Method, MockTransport};

fn client() -> (Client, MockTransport) {
    let mock = MockTransport::new();
    let client = Client::with_transport(
        ClientConfig::new("app", "key"),
        Arc::new(mock.clone()),
    )
    .expect("valid config");
    (client, mock)
}

fn posts(n: usize) -> Vec<Entity> {
    (0..n)
        .map(|i| Entity::with_attributes(Schema::dynamic("Post"), [("n", i as i64)]))
        .collect()
}

fn successes(ids: &[&str]) -> Json {
    Json::Array(
        ids.iter()
            .map(|id| json!({"success": {"objectId": id, "createdAt": "2024-01-01T00:00:00.000Z"}}))
            .collect(),
    )
}

fn slice_len(body: &Option<Json>) -> usize {
    body.as_ref().unwrap()["requests"].as_array().unwrap().len()
}

#[tokio::test]
async fn slices_are_sent_in_order() {
    let (client, mock) = client();
    mock.respond(200, successes(&["a", "b"]));
    mock.respond(200, successes(&["c", "d"]));
    mock.respond(200, successes(&["e"]));

    let mut entities = posts(5);
    let report = client.try_batch_save(&mut entities, 2, None).await.unwrap();

    assert_eq!(
        report,
        BatchReport {
            slices: 3,
            merged: 5,
            skipped: 0,
            item_errors: 0
        }
    );

    let requests = mock.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests
        .iter()
        .all(|r| r.method == Method::Post && r.path == "batch"));
    assert_eq!(
        requests.iter().map(|r| slice_len(&r.body)).collect::<Vec<_>>(),
        [2, 2, 1]
    );
    assert_eq!(requests[2].body.as_ref().unwrap()["requests"][0]["body"], json!({"n": 4}));

    let ids: Vec<_> = entities.iter().map(|e| e.object_id().unwrap()).collect();
    assert_eq!(ids, ["a", "b", "c", "d", "e"]);
    assert!(entities.iter().all(|e| !e.is_dirty()));
}

#[tokio::test]
async fn mismatched_response_is_skipped_but_batch_continues() {
    let (client, mock) = client();
    mock.respond(200, successes(&["a"]));
    mock.respond(200, successes(&["c", "d"]));

    let mut entities = posts(4);
    let report = client.try_batch_save(&mut entities, 2, None).await.unwrap();

    assert_eq!(report.slices, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.merged, 2);
    assert!(entities[0].is_new());
    assert!(entities[1].is_new());
    assert_eq!(entities[2].object_id(), Some("c"));
    assert_eq!(entities[3].object_id(), Some("d"));
}

#[tokio::test]
async fn bad_request_aborts_and_keeps_earlier_slices() {
    let (client, mock) = client();
    mock.respond(200, successes(&["a", "b"]));
    mock.respond(400, json!({"code": 107, "error": "bad batch"}));

    let mut entities = posts(6);
    let err = client
        .try_batch_save(&mut entities, 2, None)
        .await
        .unwrap_err();

    assert_eq!(err, ModelError::BatchAbort { slice: 1, status: 400 });
    assert_eq!(mock.request_count(), 2);
    assert_eq!(entities[0].object_id(), Some("a"));
    assert_eq!(entities[1].object_id(), Some("b"));
    assert!(entities[2..].iter().all(Entity::is_new));
}

#[tokio::test]
async fn bool_wrapper_reports_abort() {
    let (client, mock) = client();
    mock.respond(400, json!({}));

    let mut entities = posts(1);
    assert!(!client.batch_save(&mut entities, 20, None).await);
}

#[tokio::test]
async fn forced_method_applies_to_every_item() {
    let (client, mock) = client();
    mock.respond(200, json!([{"success": {}}, {"success": {}}]));

    let mut entities: Vec<Entity> = ["p1", "p2"]
        .iter()
        .map(|id| {
            Entity::from_server(
                Schema::dynamic("Post"),
                json!({"objectId": id}).as_object().cloned().unwrap(),
            )
        })
        .collect();
    assert!(client.batch_destroy(&mut entities, 20).await);

    let body = mock.last_request().unwrap().body.unwrap();
    assert_eq!(
        body,
        json!({"requests": [
            {"method": "DELETE", "path": "/1/classes/Post/p1"},
            {"method": "DELETE", "path": "/1/classes/Post/p2"}
        ]})
    );
}

keelson::model! {
    struct Tag: "Tag" {
        fields {
            label / set_label: String => "label",
        }
    }
}

#[tokio::test]
async fn typed_models_batch_too() {
    use keelson::core::Model;

    let (client, mock) = client();
    mock.respond(200, successes(&["t1", "t2"]));

    let mut tags: Vec<Tag> = ["rust", "orm"]
        .iter()
        .map(|label| {
            let mut tag = Tag::new();
            tag.set_label(*label);
            tag
        })
        .collect();

    assert!(client.batch_save(&mut tags, 20, None).await);
    assert_eq!(tags[0].object_id(), Some("t1"));
    assert_eq!(tags[1].label().as_deref(), Some("orm"));
}
