//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use serde_json::json;
use tokio::sync::broadcast;

use chart_gateway::config::GatewayConfig;
use chart_gateway::http::{chart_routes, GatewayServer, RepositoryHandlers};
use chart_gateway::routing::{Handler, RouteRequest, RouteTable};

pub const TOKEN_REALM: &str = "https://auth.example.com/token";
pub const TOKEN_SERVICE: &str = "chart-gateway";
pub const TOKEN_ISSUER: &str = "Acme auth server";

/// Counts how many requests reached a repository handler.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Repository handlers that record each call and echo the bound params.
pub fn recording_routes() -> (RouteTable, Calls) {
    let calls = Calls::default();
    let counter = calls.0.clone();
    let handler = Handler::new(move |req: RouteRequest| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            echo(req)
        }
    });
    let routes = chart_routes(RepositoryHandlers {
        index: handler.clone(),
        download: handler.clone(),
        list_charts: handler.clone(),
        describe_chart: handler.clone(),
        describe_version: handler.clone(),
        upload_chart: handler.clone(),
        upload_provenance: handler.clone(),
        delete_version: handler,
    });
    (routes, calls)
}

fn echo(req: RouteRequest) -> Response {
    let params: serde_json::Map<String, serde_json::Value> = req
        .params
        .iter()
        .map(|(name, value)| (name.to_string(), json!(value)))
        .collect();
    Json(json!({
        "method": req.request.method().as_str(),
        "params": params,
    }))
    .into_response()
}

/// The composed app for in-process requests.
pub fn app(config: &GatewayConfig) -> (axum::Router, Calls) {
    let (routes, calls) = recording_routes();
    let server = GatewayServer::from_config(config, routes).unwrap();
    (server.into_router(), calls)
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Config with token auth against the fixture key pair.
pub fn bearer_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.bearer_auth = true;
    config.auth.auth_type = Some("token".to_string());
    config.auth.realm = Some(TOKEN_REALM.to_string());
    config.auth.service = Some(TOKEN_SERVICE.to_string());
    config.auth.issuer = Some(TOKEN_ISSUER.to_string());
    config.auth.cert_path = Some(fixture("token_public_key.pem").display().to_string());
    config
}

/// A valid token granting `actions` on `repo`.
pub fn sign_token(repo: &str, actions: &[&str]) -> String {
    let pem = std::fs::read(fixture("token_signing_key.pem")).unwrap();
    let key = EncodingKey::from_ec_pem(&pem).unwrap();
    let claims = json!({
        "iss": TOKEN_ISSUER,
        "aud": TOKEN_SERVICE,
        "sub": "ci-bot",
        "exp": get_current_timestamp() + 600,
        "access": [{"type": "artifact-repository", "name": repo, "actions": actions}],
    });
    encode(&Header::new(Algorithm::ES256), &claims, &key).unwrap()
}

/// Serve `config` on an ephemeral local port; returns the address and the shutdown trigger.
pub async fn spawn_server(config: &GatewayConfig) -> (SocketAddr, broadcast::Sender<()>, Calls) {
    let (routes, calls) = recording_routes();
    let server = GatewayServer::from_config(config, routes).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = broadcast::channel(1);
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });
    (addr, tx, calls)
}
