// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP API
//
// Routes:
//   GET  /                              service descriptor
//   GET  /health                        gateway health
//   POST /api/v1/{provider}/chat
//   POST /api/v1/{provider}/embeddings
//   GET  /api/v1/{provider}/models
//   GET  /api/v1/{provider}/health      registry-only health, never builds a client
//   GET  /api/v1/{provider}/status      live reachability probe
//
// Provider failures are answered with 200 and `success: false`; only routing,
// validation and configuration problems use error statuses.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyCors, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::application::dispatcher::{DispatchError, RequestDispatcher};
use crate::application::health::{GatewayHealth, HealthReporter, ProviderHealth};
use crate::application::registry::{RegistryError, ServiceRegistry};
use crate::domain::credentials::Credentials;
use crate::domain::gateway_config::{Environment, GatewayConfig};
use crate::domain::provider::ProviderKind;
use crate::domain::request::{ChatRequest, EmbeddingRequest};
use crate::domain::response::{ChatResult, EmbeddingResult, ModelListResult, StatusResult};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const BASE_URL_HEADER: &str = "x-base-url";
pub const DOLIBARR_URL_HEADER: &str = "x-dolibarr-url";

pub struct AppState {
    pub dispatcher: RequestDispatcher,
    pub health: HealthReporter,
    pub registry: Arc<ServiceRegistry>,
    pub environment: Environment,
}

impl AppState {
    pub fn new(registry: Arc<ServiceRegistry>, environment: Environment) -> Self {
        Self {
            dispatcher: RequestDispatcher::new(registry.clone()),
            health: HealthReporter::new(registry.clone()),
            registry,
            environment,
        }
    }
}

/// Build the gateway router with CORS, request tracing and panic containment
pub fn app(config: &GatewayConfig, registry: Arc<ServiceRegistry>) -> Router {
    let environment = config.server.environment;
    let state = Arc::new(AppState::new(registry, environment));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(gateway_health_handler))
        .route("/api/v1/{provider}/chat", post(chat_handler))
        .route("/api/v1/{provider}/embeddings", post(embeddings_handler))
        .route("/api/v1/{provider}/models", get(models_handler))
        .route("/api/v1/{provider}/health", get(provider_health_handler))
        .route("/api/v1/{provider}/status", get(status_handler))
        .fallback(fallback_handler)
        .with_state(state)
        .layer(CatchPanicLayer::custom(move |err: Box<dyn Any + Send + 'static>| {
            panic_response(environment, err)
        }))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server.cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AnyCors)
        .allow_headers(AnyCors)
}

fn panic_response(environment: Environment, err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Unhandled fault while serving request: {}", detail);

    let message = if environment.is_production() {
        "An unexpected error occurred".to_string()
    } else {
        detail
    };
    ApiError::Internal(message).into_response()
}

/// Errors that map to a non-200 status
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    success: bool,
    error: &'a str,
    message: String,
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation_error",
            ApiError::Configuration(_) => "configuration_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Configuration(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = ErrorPayload {
            success: false,
            error: self.kind(),
            message: self.to_string(),
        };
        (self.status(), Json(payload)).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UnknownProvider(_) | DispatchError::Unsupported { .. } => {
                ApiError::NotFound(err.to_string())
            }
            DispatchError::InvalidRequest(reason) => ApiError::Validation(reason),
            DispatchError::ServiceUnavailable { reason, .. } => ApiError::Configuration(reason),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        ApiError::from(DispatchError::from(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

fn parse_provider(slug: &str) -> Result<ProviderKind, ApiError> {
    slug.parse::<ProviderKind>()
        .map_err(|e| ApiError::NotFound(e.to_string()))
}

/// Per-request credential override from `X-API-Key` and `X-Dolibarr-URL`
/// or `X-Base-URL`
pub fn credentials_from_headers(headers: &HeaderMap) -> Option<Credentials> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let base_url = header(DOLIBARR_URL_HEADER)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| header(BASE_URL_HEADER));
    Credentials::from_parts(header(API_KEY_HEADER), base_url)
}

async fn root_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let providers: Vec<&str> = state.registry.providers().map(|k| k.slug()).collect();
    Json(json!({
        "service": "llm-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "environment": state.environment.as_str(),
        "providers": providers,
        "endpoints": {
            "health": "/health",
            "chat": "/api/v1/{provider}/chat",
            "embeddings": "/api/v1/{provider}/embeddings",
            "models": "/api/v1/{provider}/models",
            "provider_health": "/api/v1/{provider}/health",
            "status": "/api/v1/{provider}/status",
        }
    }))
}

async fn gateway_health_handler(State(state): State<Arc<AppState>>) -> Json<GatewayHealth> {
    Json(state.health.check_all())
}

async fn provider_health_handler(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<Json<ProviderHealth>, ApiError> {
    let kind = parse_provider(&provider)?;
    Ok(Json(state.health.check(kind)?))
}

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResult>, ApiError> {
    let kind = parse_provider(&provider)?;
    let Json(request) = payload?;
    let credentials = credentials_from_headers(&headers);
    let result = state
        .dispatcher
        .chat(kind, request, credentials.as_ref())
        .await?;
    Ok(Json(result))
}

async fn embeddings_handler(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<EmbeddingRequest>, JsonRejection>,
) -> Result<Json<EmbeddingResult>, ApiError> {
    let kind = parse_provider(&provider)?;
    let Json(request) = payload?;
    let credentials = credentials_from_headers(&headers);
    let result = state
        .dispatcher
        .embed(kind, request, credentials.as_ref())
        .await?;
    Ok(Json(result))
}

async fn models_handler(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ModelListResult>, ApiError> {
    let kind = parse_provider(&provider)?;
    let credentials = credentials_from_headers(&headers);
    let result = state
        .dispatcher
        .list_models(kind, credentials.as_ref())
        .await?;
    Ok(Json(result))
}

async fn status_handler(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
) -> Result<Json<StatusResult>, ApiError> {
    let kind = parse_provider(&provider)?;
    let credentials = credentials_from_headers(&headers);
    let result = state
        .dispatcher
        .status(kind, credentials.as_ref())
        .await?;
    Ok(Json(result))
}

async fn fallback_handler() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
