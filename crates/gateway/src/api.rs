//! Chat API.
//!
//! Endpoints:
//!
//! - `POST   /api`          Send `{text, sessionId?}`, get `{generatedText}`
//! - `GET    /api/history`  Current entries of a session
//! - `DELETE /api/history`  Forget a session's conversation

use axum::{
    Router,
    extract::rejection::JsonRejection,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use gemrelay_core::SessionId;

use crate::SharedState;

/// Message returned on any remote failure. The cause is only logged.
pub const GENERATION_FAILED: &str = "Failed to generate content";

/// Build the API routes. State is attached by the caller.
pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api", post(generate_handler))
        .route("/api/history", get(history_handler).delete(reset_handler))
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub text: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub generated_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub session_id: String,
    pub entries: Vec<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Blank or missing ids select the shared default session.
fn resolve_session(session_id: Option<String>) -> SessionId {
    match session_id {
        Some(id) if !id.trim().is_empty() => SessionId::from(id.trim()),
        _ => SessionId::default(),
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn generate_handler(
    State(state): State<SharedState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(reason = %rejection.body_text(), "Rejected /api request");
        api_error(StatusCode::BAD_REQUEST, rejection.body_text())
    })?;

    let session = resolve_session(payload.session_id);
    info!(session = %session, text_len = payload.text.len(), "/api request");

    match state.manager.generate(&session, &payload.text).await {
        Ok(generated_text) => Ok(Json(GenerateResponse { generated_text })),
        Err(e) => {
            error!(session = %session, error = %e, "Error processing request");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, GENERATION_FAILED))
        }
    }
}

async fn history_handler(
    State(state): State<SharedState>,
    Query(query): Query<SessionQuery>,
) -> Json<HistoryResponse> {
    let session = resolve_session(query.session_id);
    let entries = state.manager.history(&session).await;
    Json(HistoryResponse {
        session_id: session.to_string(),
        entries,
    })
}

async fn reset_handler(
    State(state): State<SharedState>,
    Query(query): Query<SessionQuery>,
) -> StatusCode {
    let session = resolve_session(query.session_id);
    state.manager.reset(&session).await;
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockProvider, test_state};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(state: SharedState) -> Router {
        api_router().with_state(state)
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn blank_session_ids_use_default() {
        assert!(resolve_session(None).is_default());
        assert!(resolve_session(Some("   ".into())).is_default());
        assert_eq!(resolve_session(Some(" abc ".into())).as_str(), "abc");
    }

    #[tokio::test]
    async fn generate_returns_cleaned_text() {
        let provider = Arc::new(MockProvider::replying("Hi there! 2 more facts: x"));
        let state = test_state(provider);

        let response = app(state.clone())
            .oneshot(post_json(r#"{"text": "Hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: GenerateResponse = body_json(response).await;
        assert_eq!(json.generated_text, "Hi there!\n 2 more facts: x");
        assert_eq!(
            state.manager.history(&SessionId::default()).await,
            vec!["Hello", "Hi there!\n 2 more facts: x"]
        );
    }

    #[tokio::test]
    async fn response_uses_generated_text_key() {
        let state = test_state(Arc::new(MockProvider::replying("ok")));
        let response = app(state).oneshot(post_json(r#"{"text": "x"}"#)).await.unwrap();

        let json: serde_json::Value = body_json(response).await;
        assert_eq!(json, serde_json::json!({"generatedText": "ok"}));
    }

    #[tokio::test]
    async fn missing_text_is_bad_request() {
        let provider = Arc::new(MockProvider::replying("unused"));
        let state = test_state(provider.clone());

        let response = app(state.clone()).oneshot(post_json("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json: ErrorResponse = body_json(response).await;
        assert!(json.error.contains("text"));
        assert_eq!(provider.calls(), 0);
        assert!(state.manager.history(&SessionId::default()).await.is_empty());
    }

    #[tokio::test]
    async fn non_string_text_is_bad_request() {
        let state = test_state(Arc::new(MockProvider::replying("unused")));
        let response = app(state).oneshot(post_json(r#"{"text": 42}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let state = test_state(Arc::new(MockProvider::replying("unused")));
        let response = app(state).oneshot(post_json("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_text_is_accepted() {
        let state = test_state(Arc::new(MockProvider::replying("still here")));
        let response = app(state).oneshot(post_json(r#"{"text": ""}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn remote_failure_is_generic_500() {
        let state = test_state(Arc::new(MockProvider::failing()));

        let response = app(state.clone())
            .oneshot(post_json(r#"{"text": "Hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json: ErrorResponse = body_json(response).await;
        assert_eq!(json.error, GENERATION_FAILED);
        assert!(state.manager.history(&SessionId::default()).await.is_empty());
    }

    #[tokio::test]
    async fn session_id_selects_isolated_history() {
        let state = test_state(Arc::new(MockProvider::replying("reply")));

        let response = app(state.clone())
            .oneshot(post_json(r#"{"text": "hi", "sessionId": "tab-1"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let req = Request::builder()
            .uri("/api/history?sessionId=tab-1")
            .body(Body::empty())
            .unwrap();
        let history: HistoryResponse = body_json(app(state.clone()).oneshot(req).await.unwrap()).await;
        assert_eq!(history.session_id, "tab-1");
        assert_eq!(history.entries, vec!["hi", "reply"]);

        let req = Request::builder()
            .uri("/api/history")
            .body(Body::empty())
            .unwrap();
        let default: HistoryResponse = body_json(app(state).oneshot(req).await.unwrap()).await;
        assert_eq!(default.session_id, "default");
        assert!(default.entries.is_empty());
    }

    #[tokio::test]
    async fn delete_history_resets_session() {
        let state = test_state(Arc::new(MockProvider::replying("reply")));
        app(state.clone())
            .oneshot(post_json(r#"{"text": "hi"}"#))
            .await
            .unwrap();

        let req = Request::builder()
            .method("DELETE")
            .uri("/api/history")
            .body(Body::empty())
            .unwrap();
        let response = app(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.manager.history(&SessionId::default()).await.is_empty());
    }
}
