use std::net::SocketAddr;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method},
    routing::{any, get},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::ApiError;
use crate::event::{HandlerEvent, HandlerResponse};
use crate::state::AppState;
use crate::{auth, products};

/// Largest request body the handlers will buffer.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/auth", any(auth_endpoint))
        .route("/products", any(products_endpoint))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
        .layer(CorsLayer::permissive())
}

// Buffered by hand so body failures still go out as the JSON error envelope.
async fn read_event(method: &Method, headers: &HeaderMap, body: Body) -> Result<HandlerEvent, HandlerResponse> {
    let bytes: Bytes = axum::body::to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        tracing::warn!(error = %e, "request body rejected");
        ApiError::PayloadTooLarge.into_handler_response()
    })?;
    Ok(HandlerEvent::from_http(method, headers, bytes))
}

async fn auth_endpoint(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> HandlerResponse {
    match read_event(&method, &headers, body).await {
        Ok(event) => auth::handle(&state, event).await,
        Err(resp) => resp,
    }
}

async fn products_endpoint(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> HandlerResponse {
    match read_event(&method, &headers, body).await {
        Ok(event) => products::handle(&state, event).await,
        Err(resp) => resp,
    }
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
