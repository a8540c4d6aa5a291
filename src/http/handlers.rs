//! Route table for a chart repository.
//!
//! # Responsibilities
//! - Register system info and repository routes in priority order
//! - Serve the system info endpoints
//! - Accept repository handlers from the storage collaborator
//!
//! # Design Decisions
//! - `/api` routes are registered before the bare `/:repo/...` routes
//! - Repository operations default to a structured 501 until storage is wired in

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::http::response::error_response;
use crate::routing::{Action, Handler, RouteRequest, RouteTable};

/// Handlers for the repository operations, supplied by the storage layer.
#[derive(Debug, Clone)]
pub struct RepositoryHandlers {
    /// `GET|HEAD /:repo/index.yaml`
    pub index: Handler,
    /// `GET /:repo/charts/:filename`
    pub download: Handler,
    /// `GET /api/:repo/charts`
    pub list_charts: Handler,
    /// `GET|HEAD /api/:repo/charts/:name`
    pub describe_chart: Handler,
    /// `GET|HEAD /api/:repo/charts/:name/:version`
    pub describe_version: Handler,
    /// `POST /api/:repo/charts`
    pub upload_chart: Handler,
    /// `POST /api/:repo/prov`
    pub upload_provenance: Handler,
    /// `DELETE /api/:repo/charts/:name/:version`
    pub delete_version: Handler,
}

impl Default for RepositoryHandlers {
    fn default() -> Self {
        let unavailable = Handler::new(storage_unavailable);
        Self {
            index: unavailable.clone(),
            download: unavailable.clone(),
            list_charts: unavailable.clone(),
            describe_chart: unavailable.clone(),
            describe_version: unavailable.clone(),
            upload_chart: unavailable.clone(),
            upload_provenance: unavailable.clone(),
            delete_version: unavailable,
        }
    }
}

/// The full route table, in match priority order.
pub fn chart_routes(repo: RepositoryHandlers) -> RouteTable {
    use Action::{RepoPull, RepoPush, SystemInfo};

    RouteTable::new()
        .route(Method::GET, "/", SystemInfo, Handler::new(welcome))
        .route(Method::GET, "/health", SystemInfo, Handler::new(health))
        .route(Method::GET, "/info", SystemInfo, Handler::new(info))
        .route(Method::GET, "/api/:repo/charts", RepoPull, repo.list_charts)
        .route(Method::GET, "/api/:repo/charts/:name", RepoPull, repo.describe_chart.clone())
        .route(Method::HEAD, "/api/:repo/charts/:name", RepoPull, repo.describe_chart)
        .route(Method::GET, "/api/:repo/charts/:name/:version", RepoPull, repo.describe_version.clone())
        .route(Method::HEAD, "/api/:repo/charts/:name/:version", RepoPull, repo.describe_version)
        .route(Method::POST, "/api/:repo/charts", RepoPush, repo.upload_chart)
        .route(Method::POST, "/api/:repo/prov", RepoPush, repo.upload_provenance)
        .route(Method::DELETE, "/api/:repo/charts/:name/:version", RepoPush, repo.delete_version)
        .route(Method::GET, "/:repo/index.yaml", RepoPull, repo.index.clone())
        .route(Method::HEAD, "/:repo/index.yaml", RepoPull, repo.index)
        .route(Method::GET, "/:repo/charts/:filename", RepoPull, repo.download)
}

/// Route table with system endpoints only wired to real handlers.
pub fn default_routes() -> RouteTable {
    chart_routes(RepositoryHandlers::default())
}

async fn welcome(_: RouteRequest) -> Response {
    Json(json!({ "message": "Welcome to chart-gateway" })).into_response()
}

async fn health(_: RouteRequest) -> Response {
    Json(json!({ "healthy": true })).into_response()
}

async fn info(_: RouteRequest) -> Response {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") })).into_response()
}

async fn storage_unavailable(req: RouteRequest) -> Response {
    tracing::warn!(
        method = %req.request.method(),
        path = %req.request.uri().path(),
        "Repository operation without a storage backend"
    );
    error_response(StatusCode::NOT_IMPLEMENTED, "storage backend not configured")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Router;

    #[test]
    fn api_and_bare_routes_coexist() {
        let router = Router::new(default_routes(), "", 1);
        let m = router.match_route(&Method::GET, "/api/stable/charts/mychart").unwrap();
        assert_eq!(m.route.pattern(), "/api/:repo/charts/:name");
        assert_eq!(m.params.repo(), "stable");

        let m = router.match_route(&Method::GET, "/stable/charts/mychart-0.1.0.tgz").unwrap();
        assert_eq!(m.route.pattern(), "/:repo/charts/:filename");
    }

    #[test]
    fn every_route_is_classified() {
        let table = default_routes();
        for route in table.routes() {
            let method = route.method();
            let expected = if method == Method::POST || method == Method::DELETE {
                Action::RepoPush
            } else if route.is_namespaced() {
                Action::RepoPull
            } else {
                Action::SystemInfo
            };
            assert_eq!(route.action(), expected, "{} {}", route.method(), route.pattern());
        }
    }

    #[test]
    fn head_mirrors_get_for_metadata() {
        let router = Router::new(default_routes(), "", 0);
        assert!(router.match_route(&Method::HEAD, "/index.yaml").is_some());
        assert!(router.match_route(&Method::HEAD, "/api/charts/mychart/0.1.0").is_some());
        assert!(router.match_route(&Method::HEAD, "/health").is_none());
    }
}
