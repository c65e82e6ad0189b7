mod common;

use std::sync::atomic::Ordering;

use backend::handlers::arrival;
use backend_storage::image_record::ImageStatus;
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_arrival_marks_record_uploaded() {
    let context = TestContext::new();
    context.table.insert(pending_record("alice", "img1", "a.png"));

    let response = arrival::handle(
        &context.service,
        queue_batch(&[s3_event(&["alice/img1_a.png"])]),
    )
    .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        body_of(&response),
        json!({
            "processed": [{
                "user_id": "alice",
                "image_id": "img1",
                "s3_key": "alice/img1_a.png",
                "ddb_updated": true
            }]
        })
    );

    let record = context.table.record("alice", "img1").unwrap();
    assert_eq!(record.status, ImageStatus::Uploaded);
    assert_eq!(record.filename.as_deref(), Some("a.png"));
}

#[tokio::test]
async fn test_arrival_skips_unparseable_key_without_table_call() {
    let context = TestContext::new();

    let response = arrival::handle(
        &context.service,
        queue_batch(&[s3_event(&["no-separator.png"])]),
    )
    .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        body_of(&response),
        json!({
            "processed": [{
                "key": "no-separator.png",
                "status": "skipped",
                "reason": "parse_failed"
            }]
        })
    );
    assert_eq!(context.table.update_calls(), 0);
}

#[tokio::test]
async fn test_arrival_skips_missing_key() {
    let context = TestContext::new();
    let event = json!({ "Records": [{ "s3": { "bucket": { "name": "b" }, "object": {} } }] });

    let response = arrival::handle(&context.service, queue_batch(&[event])).await;

    let entry = &body_of(&response)["processed"][0];
    assert_eq!(entry["status"], "skipped");
    assert_eq!(entry["reason"], "parse_failed");
    assert_eq!(context.table.update_calls(), 0);
}

#[tokio::test]
async fn test_arrival_reports_escaped_key_as_delivered() {
    let context = TestContext::new();

    let response = arrival::handle(
        &context.service,
        queue_batch(&[s3_event(&["alice/img1_my+summer%281%29.png"])]),
    )
    .await;

    let entry = &body_of(&response)["processed"][0];
    assert_eq!(entry["user_id"], "alice");
    assert_eq!(entry["image_id"], "img1");
    assert_eq!(entry["s3_key"], "alice/img1_my+summer%281%29.png");
}

#[tokio::test]
async fn test_arrival_continues_after_bad_record_body() {
    let context = TestContext::new();
    context.table.insert(pending_record("alice", "img1", "a.png"));
    context.table.insert(pending_record("bob", "img2", "b.png"));

    let batch = json!({
        "Records": [
            { "body": s3_event(&["alice/img1_a.png"]).to_string() },
            { "body": "{not json" },
            { "body": s3_event(&["bob/img2_b.png", "junk"]) }
        ]
    });

    let response = arrival::handle(&context.service, batch).await;

    assert_eq!(response.status_code, 200);
    let body = body_of(&response);
    let processed = body["processed"].as_array().unwrap();
    assert_eq!(processed.len(), 4);
    assert_eq!(processed[0]["image_id"], "img1");
    assert!(processed[1]["error"].is_string());
    assert_eq!(processed[2]["image_id"], "img2");
    assert_eq!(processed[3]["status"], "skipped");

    assert_eq!(
        context.table.record("bob", "img2").unwrap().status,
        ImageStatus::Uploaded
    );
}

#[tokio::test]
async fn test_arrival_update_failure_is_reported_not_raised() {
    let context = TestContext::new();
    context.table.fail_update.store(true, Ordering::SeqCst);

    let response = arrival::handle(
        &context.service,
        queue_batch(&[s3_event(&["alice/img1_a.png"])]),
    )
    .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(body_of(&response)["processed"][0]["ddb_updated"], false);
}

#[tokio::test]
async fn test_arrival_for_missing_record_creates_status_only_row() {
    let context = TestContext::new();

    arrival::handle(
        &context.service,
        queue_batch(&[s3_event(&["ghost/img1_a.png"])]),
    )
    .await;

    let record = context.table.record("ghost", "img1").unwrap();
    assert_eq!(record.status, ImageStatus::Uploaded);
    assert_eq!(record.filename, None);
}

#[tokio::test]
async fn test_arrival_empty_batch() {
    let context = TestContext::new();

    let response = arrival::handle(&context.service, json!({ "Records": [] })).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(body_of(&response), json!({ "processed": [] }));
}

#[tokio::test]
async fn test_arrival_null_records_is_empty_batch() {
    let context = TestContext::new();

    let response = arrival::handle(&context.service, json!({ "Records": null })).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(body_of(&response), json!({ "processed": [] }));
}

#[tokio::test]
async fn test_arrival_non_object_record_does_not_block_batch() {
    let context = TestContext::new();
    context.table.insert(pending_record("alice", "img1", "a.png"));

    let batch = json!({
        "Records": [
            "garbage",
            { "body": s3_event(&["alice/img1_a.png"]).to_string() },
            42
        ]
    });

    let response = arrival::handle(&context.service, batch).await;

    assert_eq!(response.status_code, 200);
    let body = body_of(&response);
    let processed = body["processed"].as_array().unwrap();
    assert_eq!(processed.len(), 3);
    assert!(processed[0]["error"].is_string());
    assert_eq!(processed[1]["image_id"], "img1");
    assert_eq!(processed[1]["ddb_updated"], true);
    assert!(processed[2]["error"].is_string());

    assert_eq!(
        context.table.record("alice", "img1").unwrap().status,
        ImageStatus::Uploaded
    );
}

#[tokio::test]
async fn test_arrival_malformed_event_is_500() {
    let context = TestContext::new();

    for event in [json!([1, 2, 3]), json!("Records"), json!({ "Records": 7 })] {
        let response = arrival::handle(&context.service, event).await;

        assert_eq!(response.status_code, 500);
        assert!(body_of(&response)["error"].is_string());
    }
}
