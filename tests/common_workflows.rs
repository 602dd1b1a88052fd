//! Integration tests for common quarry workflows.
//!
//! These tests verify that the most common use cases work correctly.

use quarry::prelude::*;
use quarry::{
    CreateRepositoryRequest, GenericProcessor, Id, Names, ProcessorShape, RepositoryKind,
    StubReply, StubTransport,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Snapshot Repository Tests
// =============================================================================

#[test]
fn test_repository_lifecycle() {
    let client = SearchClient::with_transport(StubTransport::respond(
        200,
        r#"{"acknowledged":true}"#,
    ));

    let created = client
        .create_repository("nightly", |d| d.fs("/mnt/nightly").verify(false))
        .unwrap();
    assert!(created.acknowledged);

    client.transport().set_reply(StubReply::Respond {
        status: 200,
        body: json!({
            "nightly": { "type": "fs", "settings": { "location": "/mnt/nightly" } }
        })
        .to_string(),
    });
    let fetched = client.get_repository(["nightly"], |d| d).unwrap();
    let repository = fetched.get("nightly").unwrap();
    assert_eq!(repository.kind, RepositoryKind::Fs);
    assert_eq!(repository.get_setting("location"), Some(&json!("/mnt/nightly")));

    client.transport().set_reply(StubReply::Respond {
        status: 200,
        body: r#"{"acknowledged":true}"#.to_string(),
    });
    let deleted = client
        .delete_repository(["nightly", "weekly"], |d| d.timeout(Duration::from_secs(30)))
        .unwrap();
    assert!(deleted.acknowledged);

    let paths: Vec<String> = client
        .transport()
        .calls()
        .into_iter()
        .map(|call| format!("{} {}", call.method, call.path))
        .collect();
    assert_eq!(
        paths,
        [
            "PUT _snapshot/nightly",
            "GET _snapshot/nightly",
            "DELETE _snapshot/nightly,weekly",
        ]
    );
}

#[tokio::test]
async fn test_repository_request_object() {
    let client = SearchClient::with_transport(StubTransport::respond(
        200,
        r#"{"acknowledged":true}"#,
    ));

    let request = CreateRepositoryRequest::new(
        Id::new("archive").unwrap(),
        SnapshotRepository::url("https://archive.example.com/snapshots/"),
    )
    .master_timeout(Duration::from_secs(120));

    assert!(client.execute_async(request).await.unwrap().acknowledged);

    let call = client.transport().last_call().unwrap();
    assert_eq!(call.query_param("master_timeout"), Some("2m"));
    assert_eq!(
        serde_json::from_str::<Value>(call.body_text().unwrap()).unwrap(),
        json!({ "type": "url", "settings": { "url": "https://archive.example.com/snapshots/" } })
    );
}

#[tokio::test]
async fn test_repository_lifecycle_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/_snapshot/nightly"))
        .and(body_json(json!({
            "type": "fs",
            "settings": { "location": "/mnt/nightly", "compress": true }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/_snapshot/nightly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SearchClient::new(ClientConfig::new(server.uri())).unwrap();

    let created = client
        .create_repository_async("nightly", |d| {
            d.repository(SnapshotRepository::fs("/mnt/nightly").compress(true))
        })
        .await
        .unwrap();
    assert!(created.is_acknowledged());

    let deleted = client
        .delete_repository_async(["nightly"], |d| d)
        .await
        .unwrap();
    assert!(deleted.is_acknowledged());
}

// =============================================================================
// Cancellation Tests
// =============================================================================

#[tokio::test]
async fn test_cancellation_token_abandons_call() {
    let client = SearchClient::with_transport(StubTransport::hanging());
    let token = CancellationToken::new();
    let scoped = client.with_cancellation(token.clone());

    let call = tokio::spawn(async move { scoped.get_pipeline_async(["logs"], |d| d).await });
    tokio::task::yield_now().await;
    token.cancel();

    let err = call.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn test_validation_precedes_transport() {
    let client = SearchClient::with_transport(StubTransport::respond(200, "{}"));

    let err = client
        .delete_pipeline_async(["logs", "logs"], |d| d)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(client.transport().call_count(), 0);
}

// =============================================================================
// Registry Tests
// =============================================================================

fn decode_geoip(name: &str, body: Value) -> std::result::Result<Processor, serde_json::Error> {
    use serde::de::Error as _;

    if body.get("field").and_then(Value::as_str).is_none() {
        return Err(serde_json::Error::custom("geoip requires a string `field`"));
    }
    Ok(Processor::Other(GenericProcessor::new(name, body)))
}

#[test]
fn test_custom_shape_on_client_registry() {
    let registry = ProcessorRegistry::builder()
        .register(ProcessorShape::custom("geoip", decode_geoip))
        .unwrap()
        .unknown_processors(UnknownProcessorPolicy::Reject)
        .build();

    let client = SearchClient::with_transport(StubTransport::respond(
        200,
        r#"{"geo":{"processors":[{"geoip":{"field":"client.ip"}}]}}"#,
    ))
    .with_registry(Arc::new(registry));

    let response = client.get_pipeline(["geo"], |d| d).unwrap();
    let processors = response.get("geo").unwrap().processor_list();
    assert_eq!(processors[0].name(), "geoip");

    client.transport().set_reply(StubReply::Respond {
        status: 200,
        body: r#"{"geo":{"processors":[{"geoip":{"field":7}}]}}"#.to_string(),
    });
    let err = client.get_pipeline(["geo"], |d| d).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

// =============================================================================
// Names Tests
// =============================================================================

#[test]
fn test_names_render_in_order() {
    let names = Names::new(["weekly", "nightly"]).unwrap();
    assert_eq!(names.to_string(), "weekly,nightly");
    assert!(Names::new(["nightly", "nightly"]).is_err());
}
