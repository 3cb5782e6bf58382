use crate::models::chat::{ ChatRequest, ChatResponse };
use crate::relay::{ ChatRelay, RelayError };
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ State, rejection::JsonRejection },
    response::{ IntoResponse, Response },
    http::StatusCode,
};
use serde::Serialize;
use tower_http::cors::{ Any, CorsLayer };
use log::warn;

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Error half of the `/chat` handler: a rejected payload keeps the extractor's
/// client-error status, a relay failure is a 500 with the raw error text.
pub enum ApiError {
    BadRequest(JsonRejection),
    Relay(RelayError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection)
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        ApiError::Relay(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, detail) = match self {
            ApiError::BadRequest(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::Relay(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };
        (code, Json(ErrorResponse { detail })).into_response()
    }
}

#[derive(Clone)]
struct AppState {
    relay: Arc<ChatRelay>,
}

/// Routes with fully open CORS; the widget is embedded in third-party pages.
pub fn router(relay: Arc<ChatRelay>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .layer(cors)
        .with_state(AppState { relay })
}

async fn root_handler() -> impl IntoResponse {
    Json(StatusResponse {
        status: "OK",
        message: Some("RUFO API funcionando ✅"),
    })
}

async fn health_handler() -> impl IntoResponse {
    Json(StatusResponse {
        status: "healthy",
        message: None,
    })
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected /chat payload: {}", rejection.body_text());
        rejection
    })?;

    let response = state.relay.chat(&request).await?;
    Ok(Json(response))
}
