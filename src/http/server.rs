//! HTTP server setup and the request pipeline.
//!
//! # Responsibilities
//! - Match every request against the frozen route table
//! - Gate repository actions through the authorization engine
//! - Dispatch to the matched handler or reject with a JSON error
//! - Wire up middleware (request ID, tracing, body limit, metrics)
//! - Serve over a plain TCP listener or TLS
//!
//! # Design Decisions
//! - The axum router is composed, not extended: its fallback is the master handler
//! - `Gateway` holds no mutable state; it is shared by `Arc` across all requests

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware;
use axum::response::Response;
use axum::routing::get;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::request::{request_span, MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
use crate::http::response;
use crate::observability::metrics::{self, MatchedParams};
use crate::routing::{RouteRequest, RouteTable, Router};
use crate::security::{authorize, AuthPolicy, AuthRequest, KeyError};

/// How long in-flight TLS connections get to finish after shutdown is requested.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// The request pipeline: route table plus the active auth policy.
#[derive(Debug)]
pub struct Gateway {
    router: Router,
    policy: AuthPolicy,
}

impl Gateway {
    pub fn new(router: Router, policy: AuthPolicy) -> Self {
        tracing::info!(
            policy = policy.name(),
            routes = router.table().len(),
            "Gateway initialized"
        );
        Self { router, policy }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    /// Match, authorize, and dispatch one request.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let Some(matched) = self.router.match_route(&method, &path) else {
            tracing::debug!(request_id = %request.request_id(), %method, %path, "No route matched");
            return response::not_found();
        };
        let action = matched.route.action();
        let handler = matched.route.handler().clone();
        let params = matched.params;

        let verdict = if action.requires_authorization() {
            let verdict = authorize(
                action,
                &self.policy,
                &AuthRequest::new(&method, request.headers(), params.repo()),
            );
            if !verdict.authorized {
                tracing::info!(
                    request_id = %request.request_id(),
                    %method,
                    %path,
                    %action,
                    policy = self.policy.name(),
                    "Request unauthorized"
                );
                let mut rejection = response::unauthorized();
                verdict.apply(rejection.headers_mut());
                rejection.extensions_mut().insert(MatchedParams(params));
                return rejection;
            }
            Some(verdict)
        } else {
            None
        };

        let mut response = handler
            .call(RouteRequest {
                params: params.clone(),
                request,
            })
            .await;
        if let Some(verdict) = verdict {
            verdict.apply(response.headers_mut());
        }
        response.extensions_mut().insert(MatchedParams(params));
        response
    }
}

/// Fallback of the axum router: every request goes through the pipeline.
async fn master_handler(State(gateway): State<Arc<Gateway>>, request: Request<Body>) -> Response {
    gateway.dispatch(request).await
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    app: axum::Router,
}

impl GatewayServer {
    /// Build the server from configuration and a route table.
    ///
    /// Fails if the bearer public key cannot be loaded.
    pub fn from_config(config: &GatewayConfig, routes: RouteTable) -> Result<Self, KeyError> {
        let policy = AuthPolicy::from_config(&config.auth)?;
        let router = Router::new(routes, config.server.context_path.clone(), config.repository.depth);
        Ok(Self::new(Gateway::new(router, policy), config))
    }

    pub fn new(gateway: Gateway, config: &GatewayConfig) -> Self {
        let metrics_handle = if config.observability.enable_metrics {
            metrics::install_recorder()
        } else {
            None
        };

        let mut app: axum::Router<Arc<Gateway>> = axum::Router::new();
        if let Some(handle) = metrics_handle {
            app = app.route("/metrics", get(move || std::future::ready(handle.render())));
        }
        let mut app = app.fallback(master_handler).with_state(Arc::new(gateway));

        if config.observability.enable_metrics {
            app = app.layer(middleware::from_fn(metrics::track_requests));
        }

        let app = app.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| request_span(request)))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(RequestBodyLimitLayer::new(config.server.max_upload_size)),
        );

        Self { app }
    }

    /// The composed axum router, for embedding or in-process testing.
    pub fn into_router(self) -> axum::Router {
        self.app
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = false, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, tls = true, "HTTP server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.app.into_make_service())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
