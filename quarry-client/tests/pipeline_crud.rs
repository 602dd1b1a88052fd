//! Pipeline create/read/update/delete against an in-memory cluster, through
//! every call surface.

use async_trait::async_trait;
use quarry_client::prelude::*;
use quarry_client::{
    AsyncTransport, DeletePipelineRequest, GetPipelineRequest, GetPipelineResponse, Id, Method,
    PutPipelineDescriptor, PutPipelineRequest, RawResponse, RenameProcessor, SetProcessor,
    Transport, TransportCall, UppercaseProcessor,
};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Stores pipeline bodies the way the engine does and answers with its
/// reply shapes.
#[derive(Clone, Default)]
struct FakeCluster {
    pipelines: Arc<Mutex<HashMap<String, Value>>>,
}

impl FakeCluster {
    fn handle(&self, call: TransportCall) -> RawResponse {
        let id = call
            .path
            .strip_prefix("_ingest/pipeline/")
            .unwrap_or_default()
            .to_string();
        let mut pipelines = self.pipelines.lock().unwrap();

        match call.method {
            Method::Put => {
                let body: Value = serde_json::from_slice(call.body.as_deref().unwrap()).unwrap();
                pipelines.insert(id, body);
                ack()
            }
            Method::Get => match pipelines.get(&id) {
                Some(body) => {
                    let mut reply = Map::new();
                    reply.insert(id.clone(), body.clone());
                    RawResponse::from_status(200, Value::Object(reply).to_string())
                }
                None => RawResponse::from_status(404, "{}"),
            },
            Method::Delete => match pipelines.remove(&id) {
                Some(_) => ack(),
                None => missing(&id),
            },
            Method::Post => RawResponse::from_status(405, "{}"),
        }
    }
}

fn ack() -> RawResponse {
    RawResponse::from_status(200, r#"{"acknowledged":true}"#)
}

fn missing(id: &str) -> RawResponse {
    RawResponse::from_status(
        404,
        json!({
            "error": {
                "type": "resource_not_found_exception",
                "reason": format!("pipeline [{}] is missing", id)
            },
            "status": 404
        })
        .to_string(),
    )
}

impl Transport for FakeCluster {
    fn perform(&self, call: TransportCall) -> quarry_client::TransportResult<RawResponse> {
        Ok(self.handle(call))
    }
}

#[async_trait]
impl AsyncTransport for FakeCluster {
    async fn send(&self, call: TransportCall) -> quarry_client::TransportResult<RawResponse> {
        Ok(self.handle(call))
    }
}

#[derive(Clone, Copy)]
enum ProjectField {
    State,
    NumberOfCommits,
    LeadDeveloper,
}

impl DocumentField for ProjectField {
    fn path(self) -> &'static str {
        match self {
            ProjectField::State => "state",
            ProjectField::NumberOfCommits => "numberOfCommits",
            ProjectField::LeadDeveloper => "leadDeveloper",
        }
    }
}

fn create(d: PutPipelineDescriptor) -> PutPipelineDescriptor {
    d.description("Project Pipeline").processors(|ps| {
        ps.uppercase(|u| u.field(Field::of(ProjectField::State)))
            .set(|s| s.field(Field::of(ProjectField::NumberOfCommits)).value(0))
    })
}

fn update(d: PutPipelineDescriptor) -> PutPipelineDescriptor {
    d.description("Project Pipeline (updated)").processors(|ps| {
        ps.uppercase(|u| u.field(Field::of(ProjectField::State)))
            .set(|s| s.field(Field::of(ProjectField::NumberOfCommits)).value(500))
            .rename(|r| {
                r.field(Field::of(ProjectField::LeadDeveloper))
                    .target_field("techLead")
            })
    })
}

fn find<'a, P: quarry_client::ProcessorKind + 'static>(
    processors: &'a [Processor],
    name: &str,
) -> &'a P {
    processors
        .iter()
        .find(|p| p.name() == name)
        .and_then(|p| p.as_kind::<P>())
        .unwrap_or_else(|| panic!("no `{}` processor", name))
}

fn expect_after_create(response: &GetPipelineResponse, id: &str) {
    assert_eq!(response.len(), 1);
    let pipeline = response.get(id).unwrap();
    let processors = pipeline.processor_list();
    assert_eq!(processors.len(), 2);

    let uppercase: &UppercaseProcessor = find(processors, "uppercase");
    assert_eq!(uppercase.field.as_ref().map(Field::as_str), Some("state"));

    let set: &SetProcessor = find(processors, "set");
    assert_eq!(set.field.as_ref().map(Field::as_str), Some("numberOfCommits"));
    assert_eq!(set.value, Some(json!(0)));
}

fn expect_after_update(response: &GetPipelineResponse, id: &str) {
    assert_eq!(response.len(), 1);
    let pipeline = response.get(id).unwrap();
    assert_eq!(
        pipeline.description.as_deref(),
        Some("Project Pipeline (updated)")
    );
    let processors = pipeline.processor_list();
    assert_eq!(processors.len(), 3);

    let set: &SetProcessor = find(processors, "set");
    assert_eq!(set.value, Some(json!(500)));

    let rename: &RenameProcessor = find(processors, "rename");
    assert_eq!(rename.field.as_ref().map(Field::as_str), Some("leadDeveloper"));
    assert_eq!(rename.target_field.as_ref().map(Field::as_str), Some("techLead"));
}

fn expect_deleted(result: Result<GetPipelineResponse>) {
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.status_code(), Some(404));
}

#[test]
fn test_crud_blocking_fluent() {
    let client = SearchClient::with_transport(FakeCluster::default());
    let id = "project-pipeline-fluent";

    assert!(client.put_pipeline(id, create).unwrap().acknowledged);
    expect_after_create(&client.get_pipeline([id], |d| d).unwrap(), id);

    assert!(client.put_pipeline(id, update).unwrap().acknowledged);
    expect_after_update(&client.get_pipeline([id], |d| d).unwrap(), id);

    assert!(client.delete_pipeline([id], |d| d).unwrap().acknowledged);
    expect_deleted(client.get_pipeline([id], |d| d));
}

#[test]
fn test_crud_blocking_request_objects() {
    let client = SearchClient::with_transport(FakeCluster::default());
    let id = Id::new("project-pipeline-request").unwrap();

    let created = PutPipelineRequest::new(
        id.clone(),
        PipelineConfig::new()
            .description("Project Pipeline")
            .processors(|ps| {
                ps.add(UppercaseProcessor::default().field(Field::of(ProjectField::State)))
                    .add(
                        SetProcessor::default()
                            .field(Field::of(ProjectField::NumberOfCommits))
                            .value(0),
                    )
            }),
    );
    assert!(client.execute(created).unwrap().acknowledged);
    expect_after_create(
        &client.execute(GetPipelineRequest::new(id.clone())).unwrap(),
        id.as_str(),
    );

    let updated = update(PutPipelineDescriptor::new(id.as_str())).build().unwrap();
    assert!(client.execute(updated).unwrap().acknowledged);
    expect_after_update(
        &client.execute(GetPipelineRequest::new(id.clone())).unwrap(),
        id.as_str(),
    );

    assert!(
        client
            .execute(DeletePipelineRequest::new(id.clone()))
            .unwrap()
            .acknowledged
    );
    expect_deleted(client.execute(GetPipelineRequest::new(id)));
}

#[tokio::test]
async fn test_crud_async_fluent() {
    let client = SearchClient::with_transport(FakeCluster::default());
    let id = "project-pipeline-async";

    assert!(client.put_pipeline_async(id, create).await.unwrap().acknowledged);
    expect_after_create(&client.get_pipeline_async([id], |d| d).await.unwrap(), id);

    assert!(client.put_pipeline_async(id, update).await.unwrap().acknowledged);
    expect_after_update(&client.get_pipeline_async([id], |d| d).await.unwrap(), id);

    assert!(
        client
            .delete_pipeline_async([id], |d| d)
            .await
            .unwrap()
            .acknowledged
    );
    expect_deleted(client.get_pipeline_async([id], |d| d).await);
}

#[tokio::test]
async fn test_crud_async_request_objects() {
    let client = SearchClient::with_transport(FakeCluster::default());
    let id = Id::new("project-pipeline-async-request").unwrap();

    let created = create(PutPipelineDescriptor::new(id.as_str())).build().unwrap();
    assert!(client.execute_async(created).await.unwrap().acknowledged);
    expect_after_create(
        &client
            .execute_async(GetPipelineRequest::new(id.clone()))
            .await
            .unwrap(),
        id.as_str(),
    );

    let updated = update(PutPipelineDescriptor::new(id.as_str())).build().unwrap();
    assert!(client.execute_async(updated).await.unwrap().acknowledged);
    expect_after_update(
        &client
            .execute_async(GetPipelineRequest::new(id.clone()))
            .await
            .unwrap(),
        id.as_str(),
    );

    let deleted = client
        .execute_async(DeletePipelineRequest::new(id.clone()))
        .await
        .unwrap();
    assert!(deleted.acknowledged);

    let err = client
        .execute_async(DeletePipelineRequest::new(id))
        .await
        .unwrap_err();
    match err {
        Error::Server(e) => assert_eq!(
            e.reason(),
            Some("pipeline [project-pipeline-async-request] is missing")
        ),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_surfaces_send_identical_calls() {
    let blocking = SearchClient::with_transport(quarry_client::StubTransport::respond(
        200,
        r#"{"acknowledged":true}"#,
    ));
    let nonblocking = SearchClient::with_transport(quarry_client::StubTransport::respond(
        200,
        r#"{"acknowledged":true}"#,
    ));

    blocking.put_pipeline("p", update).unwrap();
    futures::executor::block_on(nonblocking.put_pipeline_async("p", update)).unwrap();

    assert_eq!(blocking.transport().calls(), nonblocking.transport().calls());
}
