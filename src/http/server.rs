//! HTTP façade server setup.
//!
//! # Responsibilities
//! - Create the Axum router with all REST routes
//! - Wire up middleware (request ID, tracing, timeout, CORS, metrics)
//! - Serve until shutdown

use std::time::Duration;

use axum::extract::{MatchedPath, Request};
use axum::http::{header, HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, put};
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::client::ProtocolClient;
use crate::config::HttpConfig;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;

use super::handlers;
use super::request::UuidRequestId;

/// Error type for façade setup.
#[derive(Debug, Error)]
pub enum HttpServerError {
    #[error("invalid frontend origin '{0}'")]
    InvalidOrigin(String),
}

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: ProtocolClient,
}

/// HTTP façade over the protocol service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create the façade for the given configuration.
    pub fn new(config: &HttpConfig) -> Result<Self, HttpServerError> {
        let client_timeout = Duration::from_secs(config.request_timeout_secs);
        let state = AppState {
            client: ProtocolClient::new(config.protocol_address.clone(), client_timeout),
        };
        let cors = build_cors(config.frontend_origin.as_deref())?;
        // One second beyond the client deadline, so a slow protocol service
        // surfaces as 502 rather than the layer's 408.
        let router = build_router(state, cors, client_timeout + Duration::from_secs(1));
        Ok(Self { router })
    }

    /// The router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP façade starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP façade stopped");
        Ok(())
    }
}

#[allow(deprecated)]
fn build_router(state: AppState, cors: CorsLayer, timeout: Duration) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/ping", get(handlers::ping))
        .route("/api/robots", get(handlers::list_robots))
        .route("/api/robots/positions", get(handlers::robot_positions))
        .route("/api/robots/{id}", get(handlers::get_robot))
        .route("/api/robots/{id}/position", put(handlers::update_position))
        .route("/api/robots/{id}/speed", put(handlers::update_speed))
        .route("/api/robots/{id}/battery", put(handlers::update_battery))
        .route_layer(middleware::from_fn(track_metrics))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors)
                .layer(TimeoutLayer::new(timeout)),
        )
}

fn build_cors(origin: Option<&str>) -> Result<CorsLayer, HttpServerError> {
    let allow_origin = match origin {
        Some(origin) => AllowOrigin::exact(
            HeaderValue::from_str(origin)
                .map_err(|_| HttpServerError::InvalidOrigin(origin.to_string()))?,
        ),
        None => AllowOrigin::any(),
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let response = next.run(request).await;
    metrics::record_http_request(route, response.status().as_u16());
    response
}
