//! Resource clients against a mock server

mod common;

use common::MockServerFixture;
use fleetline_api_client::endpoints::tasks::{
    task_state, Address, CompleteTaskRequest, CreateTaskRequest, Destination, Recipient,
    TaskListParams,
};
use fleetline_api_client::endpoints::workers::{worker_state, WorkerListParams};
use mockito::Matcher;
use serde_json::json;

fn sample_task(notes: &str) -> CreateTaskRequest {
    CreateTaskRequest {
        destination: Destination {
            address: Address::unparsed("1264 Park Street, Oakland, CA"),
            ..Destination::default()
        },
        recipients: vec![Recipient {
            name: "A Customer".into(),
            phone: "+15551234567".into(),
            ..Recipient::default()
        }],
        notes: notes.into(),
        ..CreateTaskRequest::default()
    }
}

#[tokio::test]
async fn test_task_list_sends_query() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", MockServerFixture::path("/tasks/all").as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("from".into(), "1455072025000".into()),
            Matcher::UrlEncoded("state".into(), "0,3".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"lastId":"tPMO~h03sOIqFbnhqaOXgUsd","tasks":[{"id":"t1"},{"id":"t2"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let params = TaskListParams::since(1_455_072_025_000)
        .with_states([task_state::UNASSIGNED, task_state::COMPLETED]);
    let page = fixture.client().tasks().list(&params).await.unwrap();

    assert_eq!(page.tasks.len(), 2);
    assert_eq!(page.last_id.as_deref(), Some("tPMO~h03sOIqFbnhqaOXgUsd"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_worker_list_without_filters() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", MockServerFixture::path("/workers").as_str())
        .with_status(200)
        .with_body(r#"[{"id":"w1","name":"Andoni","onDuty":true}]"#)
        .expect(1)
        .create_async()
        .await;

    let workers = fixture
        .client()
        .workers()
        .list(&WorkerListParams::new())
        .await
        .unwrap();

    assert_eq!(workers.len(), 1);
    assert!(workers[0].on_duty);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_worker_list_joins_filters() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", MockServerFixture::path("/workers").as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("filter".into(), "name,phone".into()),
            Matcher::UrlEncoded("states".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let params = WorkerListParams::new()
        .with_fields(["name", "phone"])
        .with_states([worker_state::ACTIVE]);
    fixture.client().workers().list(&params).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_batch_create_reports_item_errors() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", MockServerFixture::path("/tasks/batch").as_str())
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""notes":"first""#.to_string()),
            Matcher::Regex(r#""notes":"second""#.to_string()),
        ]))
        .with_status(200)
        .with_body(
            r#"{
                "tasks": [{"id": "t1", "notes": "first"}],
                "errors": [{
                    "statusCode": 400,
                    "error": 2000,
                    "message": "Invalid phone number",
                    "taskData": {"notes": "second"}
                }]
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let tasks = [sample_task("first"), sample_task("second")];
    let response = fixture.client().tasks().batch_create(&tasks).await.unwrap();

    assert_eq!(response.tasks.len(), 1);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].error.status_code, Some(400));
    assert_eq!(response.errors[0].error.message, "Invalid phone number");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_complete_and_clone_paths() {
    let mut fixture = MockServerFixture::new().await;
    let complete = fixture
        .server
        .mock("POST", MockServerFixture::path("/tasks/t1/complete").as_str())
        .match_body(Matcher::Json(json!({
            "completionDetails": {"success": true, "notes": "left with concierge"}
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let clone = fixture
        .server
        .mock("POST", MockServerFixture::path("/tasks/t1/clone").as_str())
        .with_status(200)
        .with_body(r#"{"id":"t2","state":0}"#)
        .expect(1)
        .create_async()
        .await;

    let tasks = fixture.client().tasks();
    tasks
        .complete("t1", &CompleteTaskRequest::succeeded("left with concierge"))
        .await
        .unwrap();
    let copy = tasks.clone_task("t1").await.unwrap();

    assert_eq!(copy.id, "t2");
    complete.assert_async().await;
    clone.assert_async().await;
}

#[tokio::test]
async fn test_short_id_and_delegatee_paths() {
    let mut fixture = MockServerFixture::new().await;
    let short = fixture
        .server
        .mock("GET", MockServerFixture::path("/tasks/shortId/8f983639").as_str())
        .with_status(200)
        .with_body(r#"{"id":"t1","shortId":"8f983639"}"#)
        .expect(1)
        .create_async()
        .await;
    let delegatee = fixture
        .server
        .mock("GET", MockServerFixture::path("/organizations/d1").as_str())
        .with_status(200)
        .with_body(r#"{"id":"d1","name":"Partner","isFulfillment":true}"#)
        .expect(1)
        .create_async()
        .await;

    let client = fixture.client();
    let task = client.tasks().get_by_short_id("8f983639").await.unwrap();
    let partner = client.organization().get_delegatee("d1").await.unwrap();

    assert_eq!(task.short_id, "8f983639");
    assert!(partner.is_fulfillment);
    short.assert_async().await;
    delegatee.assert_async().await;
}

#[tokio::test]
async fn test_path_segments_are_escaped() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", MockServerFixture::path("/workers/a%2Fb").as_str())
        .with_status(200)
        .with_body(r#"{"id":"a/b"}"#)
        .expect(1)
        .create_async()
        .await;

    let worker = fixture.client().workers().get("a/b").await.unwrap();

    assert_eq!(worker.id, "a/b");
    mock.assert_async().await;
}
