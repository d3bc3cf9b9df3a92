//! REST dispatcher against a mock backend

use crate::integration::test_utils::{closed_address, serve};
use axum::extract::{Multipart, RawQuery};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use checkdesk::error::FailureKind;
use checkdesk::rest::{FormData, RestClient};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

fn no_headers() -> BTreeMap<String, String> {
    BTreeMap::new()
}

#[tokio::test]
async fn test_get_appends_naive_query_string() {
    let app = Router::new().route(
        "/api/search",
        get(|RawQuery(query): RawQuery| async move {
            Json(json!({ "data": { "query": query } }))
        }),
    );
    let base = serve(app).await;
    let client = RestClient::new(format!("{}/api/", base)).unwrap();

    let data = FormData::new().field("a", "1").field("b", "two");
    let result = client.request("GET", "search", data, &no_headers()).await.unwrap();
    assert_eq!(result["query"], "a=1&b=two&");
}

#[tokio::test]
async fn test_post_sends_multipart_fields() {
    let app = Router::new().route(
        "/api/users",
        post(|mut multipart: Multipart| async move {
            let mut fields = serde_json::Map::new();
            while let Some(field) = multipart.next_field().await.unwrap() {
                let name = field.name().unwrap_or_default().to_string();
                let value = field.text().await.unwrap();
                fields.insert(name, Value::String(value));
            }
            Json(json!({ "data": fields }))
        }),
    );
    let base = serve(app).await;
    let client = RestClient::new(format!("{}/api", base)).unwrap();

    let data = FormData::new()
        .field("user[email]", "ana@example.org")
        .field("user[password]", "secret");
    let result = client.request("post", "users", data, &no_headers()).await.unwrap();
    assert_eq!(result["user[email]"], "ana@example.org");
    assert_eq!(result["user[password]"], "secret");
}

#[tokio::test]
async fn test_success_without_data_member_is_null() {
    let app = Router::new().route("/api/me", get(|| async { Json(json!({ "type": "user" })) }));
    let base = serve(app).await;
    let client = RestClient::new(format!("{}/api/", base)).unwrap();

    let result = client.request("get", "me", FormData::new(), &no_headers()).await.unwrap();
    assert_eq!(result, Value::Null);
}

#[tokio::test]
async fn test_non_200_uses_data_message() {
    let app = Router::new().route(
        "/api/me",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "data": { "message": "Not authorized" } })),
            )
        }),
    );
    let base = serve(app).await;
    let client = RestClient::new(format!("{}/api/", base)).unwrap();

    let failure = client
        .request("get", "me", FormData::new(), &no_headers())
        .await
        .unwrap_err();
    assert_eq!(failure.message, "Not authorized");
    assert_eq!(failure.status(), Some(401));
}

#[tokio::test]
async fn test_non_200_falls_back_to_error_member() {
    let app = Router::new().route(
        "/api/me",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Something broke" })),
            )
        }),
    );
    let base = serve(app).await;
    let client = RestClient::new(format!("{}/api/", base)).unwrap();

    let failure = client
        .request("get", "me", FormData::new(), &no_headers())
        .await
        .unwrap_err();
    assert_eq!(failure.message, "Something broke");
    assert_eq!(failure.kind, FailureKind::Http { status: 500 });
}

#[tokio::test]
async fn test_201_is_a_failure() {
    let app = Router::new().route(
        "/api/users",
        post(|| async {
            (
                StatusCode::CREATED,
                Json(json!({ "data": { "message": "Created" } })),
            )
        }),
    );
    let base = serve(app).await;
    let client = RestClient::new(format!("{}/api/", base)).unwrap();

    let failure = client
        .request("post", "users", FormData::new().field("x", "y"), &no_headers())
        .await
        .unwrap_err();
    assert_eq!(failure.status(), Some(201));
    assert_eq!(failure.message, "Created");
}

#[tokio::test]
async fn test_refused_connection_is_transport_failure() {
    let base = closed_address().await;
    let client = RestClient::new(format!("{}/api/", base)).unwrap();

    let failure = client
        .request("get", "me", FormData::new(), &no_headers())
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Transport);
    assert!(!failure.message.is_empty());
}

#[tokio::test]
async fn test_caller_headers_are_sent() {
    let app = Router::new().route(
        "/api/me",
        get(|headers: HeaderMap| async move {
            let value = headers
                .get("x-check-client")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!({ "data": { "client": value } }))
        }),
    );
    let base = serve(app).await;
    let client = RestClient::new(format!("{}/api/", base)).unwrap();

    let mut headers = BTreeMap::new();
    headers.insert("X-Check-Client".to_string(), "web".to_string());
    let result = client.request("get", "me", FormData::new(), &headers).await.unwrap();
    assert_eq!(result["client"], "web");
}

#[tokio::test]
async fn test_cookies_persist_between_calls() {
    let app = Router::new()
        .route(
            "/api/login",
            get(|| async {
                (
                    [("set-cookie", "_checkdesk_session=s3cr3t; Path=/")],
                    Json(json!({ "data": {} })),
                )
            }),
        )
        .route(
            "/api/me",
            get(|headers: HeaderMap| async move {
                let cookie = headers
                    .get("cookie")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({ "data": { "cookie": cookie } }))
            }),
        );
    let base = serve(app).await;
    let client = RestClient::new(format!("{}/api/", base)).unwrap();

    client.request("get", "login", FormData::new(), &no_headers()).await.unwrap();
    let result = client.request("get", "me", FormData::new(), &no_headers()).await.unwrap();
    assert_eq!(result["cookie"], "_checkdesk_session=s3cr3t");
}

#[tokio::test]
async fn test_dispatch_runs_exactly_one_callback() {
    let app = Router::new()
        .route("/api/ok", get(|| async { Json(json!({ "data": { "ok": true } })) }))
        .route(
            "/api/bad",
            get(|| async { (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))) }),
        );
    let base = serve(app).await;
    let client = RestClient::new(format!("{}/api/", base)).unwrap();

    let calls: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let (failures, successes) = (calls.clone(), calls.clone());
    client
        .dispatch(
            "get",
            "ok",
            move |message| failures.lock().unwrap().push(format!("failure:{}", message)),
            move |data| successes.lock().unwrap().push(format!("success:{}", data["ok"])),
            FormData::new(),
            &no_headers(),
        )
        .await;

    let (failures, successes) = (calls.clone(), calls.clone());
    client
        .dispatch(
            "get",
            "bad",
            move |message| failures.lock().unwrap().push(format!("failure:{}", message)),
            move |data| successes.lock().unwrap().push(format!("success:{}", data)),
            FormData::new(),
            &no_headers(),
        )
        .await;

    assert_eq!(
        *calls.lock().unwrap(),
        vec!["success:true".to_string(), "failure:Forbidden".to_string()]
    );
}

#[tokio::test]
async fn test_unknown_method_fails_without_network() {
    let base = closed_address().await;
    let client = RestClient::new(format!("{}/api/", base)).unwrap();

    let failure = client
        .request("options", "me", FormData::new(), &no_headers())
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Transport);
    assert!(failure.message.contains("options"));
}
