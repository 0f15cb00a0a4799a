use crate::llm::chat::ChatClient;
use crate::models::catalog::ModelList;
use crate::models::chat::{ ChatRequest, ChatResponse };
use crate::models::structured::{ StructuredPrompt, StructuredRequest, StructuredResult };
use crate::server::error::ApiError;
use crate::server::relay;
use crate::structured::into_structured_result;
use std::path::PathBuf;
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
    extract::{ State, rejection::JsonRejection },
    response::{ IntoResponse, Response },
    Json,
};
use futures::StreamExt;
use serde::Serialize;
use tower_http::cors::{ Any, CorsLayer };
use tower_http::services::ServeFile;
use log::{ info, error };
use uuid::Uuid;

const HEALTH_MESSAGE: &str = "Backend is running";

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn ChatClient>,
    pub index_path: PathBuf,
}

impl AppState {
    pub fn new(client: Arc<dyn ChatClient>, index_path: impl Into<PathBuf>) -> Self {
        Self { client, index_path: index_path.into() }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route_service("/", ServeFile::new(&state.index_path))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/stream", post(chat_stream_handler))
        .route("/models", get(models_handler))
        .route("/structured", post(structured_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let backend = state.client.kind().health_tag();
    Json(HealthResponse {
        status: "ok",
        backend,
        message: if backend.is_none() { Some(HEALTH_MESSAGE) } else { None },
    })
}

async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = body?;
    let message = req.message.clone().ok_or_else(|| ApiError::missing_field("message"))?;
    let messages = req.into_messages(message);

    info!("POST /chat with {} messages", messages.len());
    let completion = state.client.complete_chat(&messages).await.map_err(|e| {
        error!("Chat error: {}", e);
        ApiError::Upstream(e)
    })?;

    Ok(Json(completion.into_response()))
}

async fn chat_stream_handler(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let message = req.message.clone().ok_or_else(|| ApiError::missing_field("message"))?;
    let messages = req.into_messages(message);

    let request_id = Uuid::new_v4().to_string();
    info!("[{}] POST /chat/stream with {} messages", request_id, messages.len());

    let mut tokens = state.client.complete_chat_streaming(&messages).await.map_err(|e| {
        error!("[{}] Stream error: {}", request_id, e);
        ApiError::Upstream(e)
    })?;

    let first = match tokens.next().await {
        Some(Err(e)) => {
            error!("[{}] Stream error before first token: {}", request_id, e);
            return Err(ApiError::Upstream(e));
        }
        first => first,
    };

    Ok(relay::relay(request_id, first, tokens).into_response())
}

async fn models_handler(State(state): State<AppState>) -> Result<Json<ModelList>, ApiError> {
    let models = state.client.list_models().await.map_err(|e| {
        error!("Model listing error: {}", e);
        ApiError::Passthrough(e)
    })?;
    Ok(Json(models))
}

async fn structured_handler(
    State(state): State<AppState>,
    body: Result<Json<StructuredRequest>, JsonRejection>
) -> Result<Json<StructuredResult>, ApiError> {
    let Json(req) = body?;
    let prompt = req.prompt.ok_or_else(|| ApiError::missing_field("prompt"))?;
    let request = StructuredPrompt {
        prompt,
        data: req.data,
        schema: req.schema,
    };

    info!("POST /structured (schema: {})", request.schema.is_some());
    let completion = state.client.complete_structured(&request).await.map_err(|e| {
        error!("Structured error: {}", e);
        ApiError::Upstream(e)
    })?;

    let result = into_structured_result(completion);
    if !result.is_success() {
        info!("Structured reply was not valid JSON; returning raw text");
    }
    Ok(Json(result))
}
