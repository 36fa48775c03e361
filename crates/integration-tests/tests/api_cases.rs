use std::sync::Arc;

use api_adapters::{router, ApiConfig, AppState};
use auth_adapters::{Argon2Hasher, JwtTokenService};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use domains::{NewUser, TokenService, UserRepository};
use serde_json::{json, Value};
use services::{Ports, ReviewerPolicy};
use storage_adapters::{InMemoryFileStorage, InMemoryStore};
use tower::ServiceExt;

const SECRET: &[u8] = b"api-cases-secret";
const BOUNDARY: &str = "cbra-boundary";

struct Api {
    app: Router,
    token: String,
}

impl Api {
    async fn new() -> Self {
        let store = InMemoryStore::shared();
        store
            .insert_user(NewUser {
                username: "analyst".into(),
                is_staff: true,
                ..Default::default()
            })
            .await
            .unwrap();

        let ports = Ports::from_store(store, Arc::new(InMemoryFileStorage::default()));
        let tokens = Arc::new(JwtTokenService::new(SECRET, 300));
        let token = tokens.issue("analyst").unwrap().token;
        let state = AppState::new(ports, ReviewerPolicy::default(), Arc::new(Argon2Hasher::new()), tokens);
        Self { app: router(state, &ApiConfig::default()), token }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        self.app.clone().oneshot(request.unwrap()).await.unwrap()
    }

    async fn json(&self, method: Method, uri: &str, body: Option<Value>, expect: StatusCode) -> Value {
        let response = self.send(method, uri, body).await;
        assert_eq!(response.status(), expect, "{uri}");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn upload(&self, uri: &str, filename: &str, contents: &[u8]) -> Response {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::post(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Requester, property and a fresh case; returns the case id.
    async fn intake(&self) -> i64 {
        let requester = self
            .json(
                Method::POST,
                "/api/requesters",
                Some(json!({
                    "first_name": "Dana",
                    "last_name": "Reyes",
                    "email": "dana@gulftitle.example",
                    "street": "12 Harbor Rd",
                    "city": "Apalachicola",
                    "state": "FL",
                    "zipcode": "32320"
                })),
                StatusCode::CREATED,
            )
            .await;
        let property = self
            .json(
                Method::POST,
                "/api/properties",
                Some(json!({ "street": "4 Dune Ln", "city": "St. George Island", "state": "FL" })),
                StatusCode::CREATED,
            )
            .await;
        let case = self
            .json(
                Method::POST,
                "/api/cases",
                Some(json!({ "requester": requester["id"], "property": property["id"], "priority": true })),
                StatusCode::CREATED,
            )
            .await;
        assert_eq!(case["status"], "Received");
        assert_eq!(case["case_number"], case["id"].to_string());
        case["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn status_follows_the_workflow() {
    let api = Api::new().await;
    let id = api.intake().await;

    let steps = [
        ("signoff", json!({ "role": "analyst" }), "Awaiting QC"),
        ("signoff", json!({ "role": "qc_reviewer", "date": "2016-04-05" }), "Awaiting FWS Review"),
        ("signoff", json!({ "role": "fws_reviewer" }), "Awaiting Final Letter"),
        ("final-letter", json!({ "date": "2016-04-20" }), "Awaiting Final Letter"),
        ("close", json!({}), "Final"),
    ];
    for (action, body, expected) in steps {
        let case = api.json(Method::POST, &format!("/api/cases/{id}/{action}"), Some(body), StatusCode::OK).await;
        assert_eq!(case["status"], expected, "after {action}");
    }

    let case = api.json(Method::GET, &format!("/api/cases/{id}"), None, StatusCode::OK).await;
    assert_eq!(case["qc_reviewer_signoff_date"], "2016-04-05");
    assert_eq!(case["final_letter_date"], "2016-04-20");
}

#[tokio::test]
async fn list_filters_by_status_label() {
    let api = Api::new().await;
    let first = api.intake().await;
    let id = api
        .json(Method::POST, "/api/cases", Some(json!({ "requester": 1, "property": 1 })), StatusCode::CREATED)
        .await["id"]
        .as_i64()
        .unwrap();
    api.json(Method::POST, &format!("/api/cases/{id}/close"), Some(json!({})), StatusCode::OK).await;

    let closed = api
        .json(Method::GET, "/api/cases?status=Closed%20with%20no%20Final%20Letter", None, StatusCode::OK)
        .await;
    assert_eq!(closed.as_array().unwrap().len(), 1);
    assert_eq!(closed[0]["id"], id);

    let lowercase = api
        .json(Method::GET, "/api/cases?status=closed%20with%20no%20final%20letter", None, StatusCode::OK)
        .await;
    assert_eq!(lowercase, closed);
    let received = api.json(Method::GET, "/api/cases?status=RECEIVED", None, StatusCode::OK).await;
    assert_eq!(received[0]["id"], first);

    let urgent = api.json(Method::GET, "/api/cases?priority=true", None, StatusCode::OK).await;
    assert_eq!(urgent[0]["id"], first);
    assert_eq!(urgent.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn patch_can_clear_a_milestone() {
    let api = Api::new().await;
    let id = api.intake().await;
    api.json(Method::POST, &format!("/api/cases/{id}/close"), Some(json!({})), StatusCode::OK).await;

    let case = api
        .json(Method::PATCH, &format!("/api/cases/{id}"), Some(json!({ "close_date": null })), StatusCode::OK)
        .await;
    assert_eq!(case["status"], "Received");
    assert_eq!(case["close_date"], Value::Null);
}

#[tokio::test]
async fn tags_and_comments_round_out_a_case() {
    let api = Api::new().await;
    let id = api.intake().await;
    let tag = api
        .json(Method::POST, "/api/tags", Some(json!({ "name": "flood zone" })), StatusCode::CREATED)
        .await;

    api.json(Method::POST, &format!("/api/cases/{id}/tags"), Some(json!({ "tag": tag["id"] })), StatusCode::CREATED)
        .await;
    let case = api.json(Method::GET, &format!("/api/cases/{id}"), None, StatusCode::OK).await;
    assert_eq!(case["tags"][0]["name"], "flood zone");

    let response = api.send(Method::DELETE, &format!("/api/cases/{id}/tags/{}", tag["id"]), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    api.json(
        Method::POST,
        &format!("/api/cases/{id}/comments"),
        Some(json!({ "comment": "left a voicemail" })),
        StatusCode::CREATED,
    )
    .await;
    let comments = api.json(Method::GET, &format!("/api/cases/{id}/comments"), None, StatusCode::OK).await;
    assert_eq!(comments[0]["comment"], "left a voicemail");
}

#[tokio::test]
async fn uploaded_file_can_be_downloaded() {
    let api = Api::new().await;
    let id = api.intake().await;

    let response = api.upload(&format!("/api/cases/{id}/files"), "survey.pdf", b"%PDF-1.4 survey").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let file: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(file["file"], format!("casefiles/{id}/survey.pdf"));

    let response = api.send(Method::GET, &format!("/api/cases/{id}/files/{}", file["id"]), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"%PDF-1.4 survey");

    let rejected = api.upload(&format!("/api/cases/{id}/files"), "run.exe", b"MZ").await;
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn history_lists_field_changes() {
    let api = Api::new().await;
    let id = api.intake().await;
    api.json(Method::POST, &format!("/api/cases/{id}/close"), Some(json!({ "date": "2016-05-01" })), StatusCode::OK)
        .await;

    let history = api.json(Method::GET, &format!("/api/cases/{id}/history"), None, StatusCode::OK).await;
    let entries = history.as_array().unwrap();
    assert_eq!(entries[0]["action"], "created");
    let close = entries.iter().find(|e| e["field"] == "close_date").unwrap();
    assert_eq!(close["action"], "updated");
    assert_eq!(close["old_value"], Value::Null);
    assert_eq!(close["new_value"], "2016-05-01");
}

#[tokio::test]
async fn errors_map_to_status_codes() {
    let api = Api::new().await;
    let missing = api.json(Method::GET, "/api/cases/999", None, StatusCode::NOT_FOUND).await;
    assert_eq!(missing["error"], "not_found");

    api.json(
        Method::POST,
        "/api/cases",
        Some(json!({ "requester": 5, "property": 5 })),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;

    api.intake().await;
    api.json(
        Method::POST,
        "/api/tags",
        Some(json!({ "name": "dup" })),
        StatusCode::CREATED,
    )
    .await;
    let conflict = api.json(Method::POST, "/api/tags", Some(json!({ "name": "dup" })), StatusCode::CONFLICT).await;
    assert_eq!(conflict["error"], "conflict");
}
