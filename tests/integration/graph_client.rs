//! Batched query-language client against a mock backend

use crate::integration::test_utils::{closed_address, serve};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use checkdesk::error::QueryError;
use checkdesk::graph::{GraphClient, HeaderSet, PendingQuery, QueryRequest, StaticHeaders};
use checkdesk::navigation::{Navigation, RecordingNavigator};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn client(base: &str, timeout: Option<Duration>) -> (GraphClient, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::new());
    let client = GraphClient::new(
        format!("{}/api/graphql", base),
        navigator.clone(),
        "/404",
        timeout,
    )
    .unwrap();
    (client, navigator)
}

/// Echoes back a body chosen by the query text
async fn scripted(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let query = body["query"].as_str().unwrap_or_default().to_string();
    match query.as_str() {
        "ok" => (
            StatusCode::OK,
            Json(json!({ "data": { "echo": body["variables"] } })),
        ),
        "errors" => (
            StatusCode::OK,
            Json(json!({ "errors": [{ "message": "x" }] })),
        ),
        "missing" => (StatusCode::OK, Json(json!({ "extensions": {} }))),
        _ => (StatusCode::BAD_REQUEST, Json(json!({}))),
    }
}

#[tokio::test]
async fn test_batch_settles_each_request_independently() {
    let base = serve(Router::new().route("/api/graphql", post(scripted))).await;
    let (client, _) = client(&base, None);

    let (ok, ok_handle) = PendingQuery::new("ok", json!({ "id": 7 }), "OkQuery");
    let (errors, errors_handle) = PendingQuery::new("errors", json!({}), "ErrorsQuery");
    let (missing, missing_handle) = PendingQuery::new("missing", json!({}), "MissingQuery");
    let batch: Vec<Arc<dyn QueryRequest>> = vec![ok, errors, missing];

    client.send_queries(batch).await;

    let response = ok_handle.outcome().await.unwrap();
    assert_eq!(response.response, json!({ "echo": { "id": 7 } }));

    match errors_handle.outcome().await.unwrap_err() {
        QueryError::Application { debug_name, payload } => {
            assert_eq!(debug_name, "ErrorsQuery");
            assert_eq!(payload["errors"][0]["message"], "x");
        }
        other => panic!("Expected application error, got {:?}", other),
    }

    match missing_handle.outcome().await.unwrap_err() {
        QueryError::MissingData { debug_name } => assert_eq!(debug_name, "MissingQuery"),
        other => panic!("Expected missing data, got {:?}", other),
    }
}

#[tokio::test]
async fn test_errors_message_surfaces_in_rejection() {
    let base = serve(Router::new().route("/api/graphql", post(scripted))).await;
    let (client, _) = client(&base, None);

    let (request, handle) = PendingQuery::new("errors", json!({}), "TeamQuery");
    client.send_queries(vec![request as Arc<dyn QueryRequest>]).await;

    let error = handle.outcome().await.unwrap_err();
    let message = error.to_string();
    assert!(message.contains("TeamQuery"));
    assert!(message.contains("status 200"));
    assert!(message.contains("\"x\""));
}

#[tokio::test]
async fn test_404_navigates_once_per_request_and_still_settles() {
    let app = Router::new().route(
        "/api/graphql",
        post(|| async { (StatusCode::NOT_FOUND, Json(json!({ "data": { "node": null } }))) }),
    );
    let base = serve(app).await;
    let (client, navigator) = client(&base, None);

    let (first, first_handle) = PendingQuery::new("q", json!({}), "First");
    let (second, second_handle) = PendingQuery::new("q", json!({}), "Second");
    let batch: Vec<Arc<dyn QueryRequest>> = vec![first, second];
    client.send_queries(batch).await;

    assert_eq!(
        navigator.navigations(),
        vec![
            Navigation::Push("/404".to_string()),
            Navigation::Push("/404".to_string())
        ]
    );
    assert_eq!(
        first_handle.outcome().await.unwrap().response,
        json!({ "node": null })
    );
    assert!(second_handle.outcome().await.is_ok());
}

#[tokio::test]
async fn test_configured_headers_are_sent() {
    let app = Router::new().route(
        "/api/graphql",
        post(|headers: HeaderMap| async move {
            let read = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            };
            Json(json!({
                "data": {
                    "accept": read("accept"),
                    "content_type": read("content-type"),
                    "token": read("x-checkdesk-token"),
                    "team": read("x-checkdesk-context-team"),
                }
            }))
        }),
    );
    let base = serve(app).await;
    let (client, _) = client(&base, None);
    client.configure(Arc::new(StaticHeaders(
        HeaderSet::new()
            .with("X-Checkdesk-Token", "abc")
            .with("X-Checkdesk-Context-Team", "5")
            .with("Accept", "text/html"),
    )));

    let (request, handle) = PendingQuery::new("q", json!({}), "Headers");
    client.send_queries(vec![request as Arc<dyn QueryRequest>]).await;

    let response = handle.outcome().await.unwrap().response;
    assert_eq!(response["accept"], "*/*");
    assert_eq!(response["content_type"], "application/json");
    assert_eq!(response["token"], "abc");
    assert_eq!(response["team"], "5");
}

#[tokio::test]
async fn test_requests_settle_in_arrival_order() {
    let app = Router::new().route(
        "/api/graphql",
        post(|Json(body): Json<Value>| async move {
            if body["query"] == "slow" {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            Json(json!({ "data": { "query": body["query"] } }))
        }),
    );
    let base = serve(app).await;
    let (client, _) = client(&base, None);

    let order: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let (slow, slow_handle) = PendingQuery::new("slow", json!({}), "Slow");
    let (fast, fast_handle) = PendingQuery::new("fast", json!({}), "Fast");

    let mut watchers = Vec::new();
    for handle in [slow_handle, fast_handle] {
        let order = order.clone();
        watchers.push(tokio::spawn(async move {
            let name = handle.debug_name().to_string();
            handle.outcome().await.unwrap();
            order.lock().unwrap().push(name);
        }));
    }

    let batch: Vec<Arc<dyn QueryRequest>> = vec![slow, fast];
    client.send_queries(batch).await;
    for watcher in watchers {
        watcher.await.unwrap();
    }

    assert_eq!(*order.lock().unwrap(), vec!["Fast".to_string(), "Slow".to_string()]);
}

#[tokio::test]
async fn test_timeout_rejects_with_timeout_error() {
    let app = Router::new().route(
        "/api/graphql",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "data": {} }))
        }),
    );
    let base = serve(app).await;
    let (client, _) = client(&base, Some(Duration::from_millis(200)));

    let (request, handle) = PendingQuery::new("q", json!({}), "SlowQuery");
    client.send_queries(vec![request as Arc<dyn QueryRequest>]).await;

    match handle.outcome().await.unwrap_err() {
        QueryError::Timeout { debug_name } => assert_eq!(debug_name, "SlowQuery"),
        other => panic!("Expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_rejects_every_request() {
    let base = closed_address().await;
    let (client, navigator) = client(&base, None);

    let (first, first_handle) = PendingQuery::new("q", json!({}), "First");
    let (second, second_handle) = PendingQuery::new("q", json!({}), "Second");
    let batch: Vec<Arc<dyn QueryRequest>> = vec![first, second];
    client.send_queries(batch).await;

    assert!(matches!(
        first_handle.outcome().await,
        Err(QueryError::Transport(_))
    ));
    assert!(matches!(
        second_handle.outcome().await,
        Err(QueryError::Transport(_))
    ));
    assert_eq!(navigator.count(), 0);
}

#[tokio::test]
async fn test_non_json_body_is_transport_error() {
    let app = Router::new().route("/api/graphql", post(|| async { "<html>oops</html>" }));
    let base = serve(app).await;
    let (client, _) = client(&base, None);

    let (request, handle) = PendingQuery::new("q", json!({}), "Html");
    client.send_queries(vec![request as Arc<dyn QueryRequest>]).await;

    assert!(matches!(handle.outcome().await, Err(QueryError::Transport(_))));
}

#[tokio::test]
async fn test_empty_batch_completes() {
    let base = closed_address().await;
    let (client, _) = client(&base, None);
    client.send_queries(Vec::new()).await;
}
