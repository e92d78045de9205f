//! REST endpoints for translation and avatar control.
//!
//! Collaborator failures are logged in full and reported to the caller as an
//! opaque 500 body.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::error::PipelineError;
use crate::pipeline::{Dispatcher, ProcessingRequest, TranslationProcessor, parse_iterations};
use crate::services::PublishReceipt;

/// Shared state for the API routes.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<TranslationProcessor>,
    pub dispatcher: Arc<Dispatcher>,
}

#[derive(Deserialize)]
struct TranslateRequest {
    message: Option<String>,
    /// Any JSON value; coerced to a non-negative count.
    #[serde(default)]
    iterations: Value,
}

/// POST /api/translate
///
/// Runs the message through the pipeline and publishes the outcome.
async fn translate(
    State(state): State<AppState>,
    body: Result<Json<TranslateRequest>, JsonRejection>,
) -> Response {
    let body = match read_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let Some(message) = body.message else {
        warn!("Translate request without a message");
        return bad_request();
    };

    let request = ProcessingRequest::new(message, parse_iterations(&body.iterations));
    let outcome = match state.processor.process(&request).await {
        Ok(outcome) => outcome,
        Err(e) => return failure("translation", e),
    };

    match state.dispatcher.dispatch(&outcome).await {
        Ok(receipt) => {
            info!(message_id = %receipt.message_id, "Translation dispatched");
            (
                StatusCode::OK,
                Json(json!({
                    "statusCode": 200,
                    "result": "success",
                    "outcome": outcome,
                    "messageId": receipt.message_id,
                    "sequenceNumber": receipt.sequence_number,
                })),
            )
                .into_response()
        }
        Err(e) => failure("translation", e),
    }
}

#[derive(Deserialize)]
struct AvatarRequest {
    avatar: Option<String>,
}

/// POST /api/avatar
async fn change_avatar(
    State(state): State<AppState>,
    body: Result<Json<AvatarRequest>, JsonRejection>,
) -> Response {
    let body = match read_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let Some(avatar) = body.avatar else {
        return bad_request();
    };
    receipt_response("avatar change", state.dispatcher.change_avatar(&avatar).await)
}

#[derive(Deserialize)]
struct SignRateRequest {
    #[serde(default)]
    sign_rate: Value,
}

/// POST /api/sign-rate
///
/// Accepts the rate as a number or a string and forwards it as text.
async fn change_sign_rate(
    State(state): State<AppState>,
    body: Result<Json<SignRateRequest>, JsonRejection>,
) -> Response {
    let body = match read_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let rate = match body.sign_rate {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => return bad_request(),
    };
    receipt_response("sign rate change", state.dispatcher.change_sign_rate(&rate).await)
}

/// POST /api/stop
async fn stop_all(State(state): State<AppState>) -> Response {
    receipt_response("stop", state.dispatcher.stop_all().await)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "service": "asl-relay"}))
}

fn receipt_response(what: &str, result: Result<PublishReceipt, PipelineError>) -> Response {
    match result {
        Ok(receipt) => (
            StatusCode::OK,
            Json(json!({
                "statusCode": 200,
                "result": "success",
                "messageId": receipt.message_id,
                "sequenceNumber": receipt.sequence_number,
            })),
        )
            .into_response(),
        Err(e) => failure(what, e),
    }
}

fn failure(what: &str, e: PipelineError) -> Response {
    error!(error = %e, "{what} failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"statusCode": 500, "error": format!("{what} failed")})),
    )
        .into_response()
}

/// Unwrap a JSON body, turning axum's rejection into the opaque 400.
fn read_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match body {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            warn!(
                status = %rejection.status(),
                error = %rejection.body_text(),
                "Rejected request body"
            );
            Err(bad_request())
        }
    }
}

fn bad_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"statusCode": 400, "error": "invalid request"})),
    )
        .into_response()
}

/// Build the API router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/translate", post(translate))
        .route("/api/avatar", post(change_avatar))
        .route("/api/sign-rate", post(change_sign_rate))
        .route("/api/stop", post(stop_all))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::config::{ImageStyle, PipelineConfig};
    use crate::pipeline::PipelineDeps;
    use crate::pipeline::test_support::{
        FailingScorer, FixedSentiment, KeywordScorer, RecordingPublisher, ScriptedGenerator,
    };
    use crate::services::{Action, Score};

    const UNETHICAL: &str = "Pay Attention! Unethical Input.";

    fn app_with(
        responses: &[&str],
        scorer: Arc<dyn Score>,
        publisher: Arc<RecordingPublisher>,
    ) -> Router {
        let config = PipelineConfig::default();
        let processor = TranslationProcessor::new(
            &config,
            PipelineDeps {
                llm: Arc::new(ScriptedGenerator::new(responses.iter().copied())),
                scorer,
                sentiment: Arc::new(FixedSentiment::new("NEUTRAL")),
            },
        );
        let dispatcher = Dispatcher::new(publisher, ImageStyle::default(), UNETHICAL);
        api_routes(AppState {
            processor: Arc::new(processor),
            dispatcher: Arc::new(dispatcher),
        })
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn translate_passes_through_with_zero_iterations() {
        let publisher = Arc::new(RecordingPublisher::default());
        let app = app_with(&[], Arc::new(KeywordScorer::benign()), publisher.clone());

        let (status, body) = post_json(
            app,
            "/api/translate",
            json!({"message": "Hello there", "iterations": "0"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["result"], "success");
        assert_eq!(body["outcome"]["simplifiedText"], "Hello there");
        assert_eq!(body["outcome"]["aslText"], "");
        assert_eq!(body["outcome"]["tense"], "present");
        assert_eq!(body["outcome"]["sentiment"], "NEUTRAL");
        assert_eq!(body["messageId"], "msg-1");

        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0.action, Action::AnimateSentence);
    }

    #[tokio::test]
    async fn translate_reports_unethical_tuple() {
        let publisher = Arc::new(RecordingPublisher::default());
        let scorer = Arc::new(KeywordScorer::new("hateful", "HATE_SPEECH", 0.9));
        let app = app_with(&[], scorer, publisher);

        let (status, body) = post_json(
            app,
            "/api/translate",
            json!({"message": "something hateful", "iterations": 0}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["simplifiedText"], UNETHICAL);
        assert_eq!(body["outcome"]["aslText"], UNETHICAL);
        assert_eq!(body["outcome"]["sentiment"], "SHOCKED");
    }

    #[tokio::test]
    async fn missing_message_is_bad_request() {
        let publisher = Arc::new(RecordingPublisher::default());
        let app = app_with(&[], Arc::new(KeywordScorer::benign()), publisher.clone());

        let (status, body) = post_json(app, "/api/translate", json!({"iterations": 1})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn mistyped_message_is_opaque_bad_request() {
        let publisher = Arc::new(RecordingPublisher::default());
        let app = app_with(&[], Arc::new(KeywordScorer::benign()), publisher.clone());

        let (status, body) = post_json(
            app,
            "/api/translate",
            json!({"message": 42, "iterations": 1}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"statusCode": 400, "error": "invalid request"}));
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_opaque_bad_request() {
        let app = app_with(
            &[],
            Arc::new(KeywordScorer::benign()),
            Arc::new(RecordingPublisher::default()),
        );
        let response = app
            .oneshot(
                Request::post("/api/translate")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"message\": "))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"statusCode": 400, "error": "invalid request"}));
    }

    #[tokio::test]
    async fn control_routes_reject_mistyped_bodies() {
        let publisher = Arc::new(RecordingPublisher::default());
        let app = app_with(&[], Arc::new(KeywordScorer::benign()), publisher.clone());

        let (status, body) = post_json(app.clone(), "/api/avatar", json!({"avatar": [1]})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);

        let (status, _) = post_json(app, "/api/sign-rate", json!({"sign_rate": true})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn collaborator_failure_is_opaque() {
        let publisher = Arc::new(RecordingPublisher::default());
        let app = app_with(&[], Arc::new(FailingScorer), publisher.clone());

        let (status, body) =
            post_json(app, "/api/translate", json!({"message": "hi", "iterations": 0})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"statusCode": 500, "error": "translation failed"}));
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn publish_failure_is_opaque() {
        let app = app_with(
            &[],
            Arc::new(KeywordScorer::benign()),
            Arc::new(RecordingPublisher::failing()),
        );
        let (status, body) =
            post_json(app, "/api/translate", json!({"message": "hi", "iterations": 0})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "translation failed");
    }

    #[tokio::test]
    async fn sign_rate_accepts_numbers() {
        let publisher = Arc::new(RecordingPublisher::default());
        let app = app_with(&[], Arc::new(KeywordScorer::benign()), publisher.clone());

        let (status, _) = post_json(app, "/api/sign-rate", json!({"sign_rate": 1.5})).await;
        assert_eq!(status, StatusCode::OK);

        let published = publisher.published();
        assert_eq!(published[0].0.action, Action::ChangeSignRate);
        assert_eq!(published[0].0.data.as_deref(), Some("1.5"));
    }

    #[tokio::test]
    async fn avatar_and_stop_publish() {
        let publisher = Arc::new(RecordingPublisher::default());
        let app = app_with(&[], Arc::new(KeywordScorer::benign()), publisher.clone());

        let (status, body) =
            post_json(app.clone(), "/api/avatar", json!({"avatar": "Ana"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messageId"], "msg-1");

        let (status, _) = post_json(app, "/api/stop", json!({})).await;
        assert_eq!(status, StatusCode::OK);

        let published = publisher.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[1].0.action, Action::StopAllAnimations);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app_with(
            &[],
            Arc::new(KeywordScorer::benign()),
            Arc::new(RecordingPublisher::default()),
        );
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
