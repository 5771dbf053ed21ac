//! HTTP server for the SMS webhook

use axum::{
    async_trait,
    extract::{FromRequest, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{any, get},
    Form, Json, Router,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::link_registry::resolve;
use crate::relay::{Dispatch, SharedRelay};
use crate::types::InboundMessage;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Webhook payload: JSON when the request says so, otherwise a urlencoded
/// body or query string
pub struct Inbound(pub InboundMessage);

#[async_trait]
impl<S> FromRequest<S> for Inbound
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.trim_start().starts_with("application/json"));

        if is_json {
            let Json(msg) = Json::<InboundMessage>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(msg))
        } else {
            let Form(msg) = Form::<InboundMessage>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(msg))
        }
    }
}

async fn root_handler() -> &'static str {
    "Hello!"
}

/// Health check handler
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "pagetext".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// SMS webhook: fetch the page named in the message body and text it back.
/// Replies go out in the background; the response carries the sanitized
/// fragment on success and a JSON error otherwise.
async fn relay_handler(
    State(relay): State<SharedRelay>,
    Inbound(msg): Inbound,
) -> Response {
    info!("Received SMS from {} ({}): {:?}", msg.from, msg.message_sid, msg.body);

    let Dispatch {
        to,
        messages,
        outcome,
        ..
    } = match relay.process(&msg).await {
        Ok(dispatch) => dispatch,
        Err(e) => {
            warn!("Dropping request {}: {}", msg.message_sid, e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "Fetch failed".to_string(),
                    details: Some(e.to_string()),
                }),
            )
                .into_response();
        }
    };

    let delivery = relay.clone();
    tokio::spawn(async move {
        delivery.deliver(&to, &messages).await;
    });

    match outcome {
        Ok(sanitized) => Html(sanitized).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Transformation failed".to_string(),
                details: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

/// Look up the URL behind a link token
async fn resolve_handler(
    State(relay): State<SharedRelay>,
    Path((conversation_id, token)): Path<(String, String)>,
) -> Response {
    match resolve(relay.pipeline().store(), &conversation_id, &token).await {
        Ok(Some(url)) => url.into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Unknown link".to_string(),
                details: None,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Link lookup {}_{} failed: {:?}", conversation_id, token, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Link lookup failed".to_string(),
                    details: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// Create and configure the HTTP server
pub fn create_router(relay: SharedRelay) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/get", any(relay_handler))
        .route("/links/:conversation_id/:token", get(resolve_handler))
        .with_state(relay)
}

/// Run the HTTP server
pub async fn run_server(relay: SharedRelay, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!("Starting pagetext server on {}", addr);

    let app = create_router(relay);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
