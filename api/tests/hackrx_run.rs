//! End-to-end tests for `/hackrx/run` through the full router, with the
//! document source and the provider replaced by in-process fakes.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hackrx_api::auth::ServiceToken;
use hackrx_api::{build_router, AppState};
use hackrx_engine::error::Result as QueryResult;
use hackrx_engine::{AnswerSynthesizer, DocumentSource, QueryError, QueryService};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for oneshot()
use url::Url;

const TOKEN: &str = "team-secret-token";
const POLICY: &str = "Coverage limit: 50,000 per claim. Fire damage is covered.";

#[derive(Default)]
struct FakeDocuments {
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl DocumentSource for FakeDocuments {
    async fn fetch_text(&self, url: &Url) -> QueryResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(QueryError::document_fetch(format!("{} responded with status 404 Not Found", url)));
        }
        Ok(POLICY.to_string())
    }
}

/// Answers from the context the way a well-behaved model would, finishing
/// the first question last.
#[derive(Default)]
struct FakeProvider {
    fail_on: Option<String>,
    calls: AtomicUsize,
}

#[async_trait]
impl AnswerSynthesizer for FakeProvider {
    async fn answer(&self, question: &str, context: &str) -> QueryResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.as_deref() == Some(question) {
            return Err(QueryError::Upstream {
                status: 503,
                body: "provider overloaded".to_string(),
            });
        }
        if call == 0 {
            tokio::time::sleep(Duration::from_millis(40)).await;
        }
        if question.contains("coverage limit") && context.contains("50,000") {
            Ok("50,000 per claim.".to_string())
        } else {
            Ok("Not found in document.".to_string())
        }
    }
}

fn app(documents: Arc<FakeDocuments>, provider: Arc<FakeProvider>) -> Router {
    let state = AppState::new(
        ServiceToken::new(TOKEN),
        QueryService::new(documents, provider),
    );
    build_router(state)
}

fn run_request(auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/hackrx/run")
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn policy_request() -> Value {
    json!({
        "documents": "https://example.com/policy.txt",
        "questions": ["What is the coverage limit?", "Is flood damage covered?"]
    })
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_answers_policy_questions_in_order() {
    let documents = Arc::new(FakeDocuments::default());
    let provider = Arc::new(FakeProvider::default());
    let app = app(documents.clone(), provider.clone());

    let response = app
        .oneshot(run_request(Some(&format!("Bearer {}", TOKEN)), policy_request()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"answers": ["50,000 per claim.", "Not found in document."]})
    );
    assert_eq!(documents.calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_lowercase_scheme_is_accepted() {
    let app = app(Arc::default(), Arc::default());

    let response = app
        .oneshot(run_request(Some(&format!("bearer {}", TOKEN)), policy_request()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_token_is_unauthorized_and_does_no_work() {
    let documents = Arc::new(FakeDocuments::default());
    let provider = Arc::new(FakeProvider::default());
    let app = app(documents.clone(), provider.clone());

    let response = app
        .oneshot(run_request(Some("Bearer wrong"), policy_request()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"detail": "Invalid or missing authorization token"})
    );
    assert_eq!(documents.calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_auth_runs_before_body_validation() {
    let documents = Arc::new(FakeDocuments::default());
    let provider = Arc::new(FakeProvider::default());

    for body in [json!({"nonsense": true}), json!("not an object"), policy_request()] {
        let response = app(documents.clone(), provider.clone())
            .oneshot(run_request(None, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app(documents.clone(), provider.clone())
        .oneshot(run_request(Some(&format!("Basic {}", TOKEN)), policy_request()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(documents.calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_document_failure_is_bad_request_without_provider_calls() {
    let documents = Arc::new(FakeDocuments {
        fail: true,
        ..Default::default()
    });
    let provider = Arc::new(FakeProvider::default());
    let app = app(documents, provider.clone());

    let response = app
        .oneshot(run_request(Some(&format!("Bearer {}", TOKEN)), policy_request()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let detail = json_body(response).await["detail"].as_str().unwrap().to_string();
    assert!(detail.starts_with("Failed to download document:"), "detail was {}", detail);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_provider_failure_is_internal_error_without_partial_answers() {
    let provider = Arc::new(FakeProvider {
        fail_on: Some("Is flood damage covered?".to_string()),
        ..Default::default()
    });
    let app = app(Arc::default(), provider);

    let response = app
        .oneshot(run_request(Some(&format!("Bearer {}", TOKEN)), policy_request()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body.get("answers").is_none());
    assert!(!body["detail"].as_str().unwrap().contains("provider overloaded"));
}

#[tokio::test]
async fn test_empty_question_list_returns_empty_answers() {
    let provider = Arc::new(FakeProvider::default());
    let app = app(Arc::default(), provider.clone());

    let response = app
        .oneshot(run_request(
            Some(&format!("Bearer {}", TOKEN)),
            json!({"documents": "https://example.com/policy.txt", "questions": []}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"answers": []}));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_input_is_bad_request() {
    let bodies = [
        json!({"documents": "not a url", "questions": ["q"]}),
        json!({"documents": "ftp://example.com/policy.txt", "questions": ["q"]}),
        json!({"documents": "https://example.com/policy.txt"}),
        json!({"documents": "https://example.com/policy.txt", "questions": "q"}),
    ];

    for body in bodies {
        let documents = Arc::new(FakeDocuments::default());
        let response = app(documents.clone(), Arc::default())
            .oneshot(run_request(Some(&format!("Bearer {}", TOKEN)), body.clone()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        assert!(json_body(response).await["detail"].is_string());
        assert_eq!(documents.calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = app(Arc::default(), Arc::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "HackRx LLM Query-Retrieval API");
}
