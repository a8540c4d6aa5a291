//! In-process tests of the request pipeline: match, authorize, dispatch.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH, VARY, WWW_AUTHENTICATE};
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tower::ServiceExt;

use chart_gateway::config::GatewayConfig;
use chart_gateway::http::GatewayServer;
use chart_gateway::routing::{Action, Handler, RouteRequest, RouteTable};
use chart_gateway::security::basic::basic_auth_header;

use common::{app, bearer_config, sign_token, TOKEN_REALM, TOKEN_SERVICE};

async fn send(app: &axum::Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

fn with_auth(method: &str, uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, authorization)
        .body(Body::empty())
        .unwrap()
}

async fn json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn basic_config(anonymous_get: bool) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.username = Some("admin".to_string());
    config.auth.password = Some("secret".to_string());
    config.auth.anonymous_get = anonymous_get;
    config
}

#[tokio::test]
async fn anonymous_read_under_context_path_reaches_handler() {
    let mut config = basic_config(true);
    config.server.context_path = "/cm".to_string();
    config.repository.depth = 1;
    let (app, calls) = app(&config);

    let response = send(&app, request("GET", "/cm/stable/index.yaml")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[VARY], "Authorization");
    assert_eq!(calls.count(), 1);

    let body = json(response).await;
    assert_eq!(body["params"]["repo"], "stable");
}

#[tokio::test]
async fn open_policy_lists_charts_under_context_path() {
    let mut config = GatewayConfig::default();
    config.server.context_path = "/cm".to_string();
    config.repository.depth = 1;
    config.auth.anonymous_get = true;
    let (app, calls) = app(&config);

    let response = send(&app, request("GET", "/cm/api/demo/charts")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.count(), 1);
    let body = json(response).await;
    assert_eq!(body["method"], "GET");
    assert_eq!(body["params"]["repo"], "demo");
}

#[tokio::test]
async fn handlers_receive_decoded_params() {
    let (app, _) = app(&GatewayConfig::default());

    let response = send(&app, request("GET", "/charts/my%20chart-0.1.0%2Bbuild.1.tgz")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["params"]["filename"], "my chart-0.1.0+build.1.tgz");

    let response = send(&app, request("GET", "/charts/%FF.tgz")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn handler_vary_survives_authorization() {
    let handler = Handler::new(|_: RouteRequest| async {
        ([(VARY, "Accept-Encoding")], "index").into_response()
    });
    let routes = RouteTable::new().route(Method::GET, "/:repo/index.yaml", Action::RepoPull, handler);
    let config = basic_config(true);
    let app = GatewayServer::from_config(&config, routes).unwrap().into_router();

    let response = send(&app, request("GET", "/index.yaml")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let vary: Vec<_> = response
        .headers()
        .get_all(VARY)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(vary, vec!["Accept-Encoding", "Authorization"]);
}

#[tokio::test]
async fn no_auth_policy_serves_everything() {
    let mut config = GatewayConfig::default();
    config.server.context_path = "/cm".to_string();
    config.repository.depth = 1;
    let (app, calls) = app(&config);

    let response = send(&app, request("GET", "/cm/stable/charts/mychart-0.1.0.tgz")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(VARY).is_none());

    let response = send(&app, request("DELETE", "/cm/api/stable/charts/mychart/0.1.0")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["params"]["name"], "mychart");
    assert_eq!(body["params"]["version"], "0.1.0");
    assert_eq!(calls.count(), 2);
}

#[tokio::test]
async fn push_without_credentials_is_challenged() {
    let mut config = basic_config(true);
    config.server.context_path = "/cm".to_string();
    config.repository.depth = 1;
    let (app, calls) = app(&config);

    let response = send(&app, request("POST", "/cm/api/stable/charts")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[WWW_AUTHENTICATE], "Basic realm=\"chart-gateway\"");
    assert_eq!(response.headers()[VARY], "Authorization");
    assert_eq!(json(response).await["error"], "unauthorized");
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn basic_credentials_unlock_push() {
    let (app, calls) = app(&basic_config(false));

    let header = basic_auth_header("admin", "secret");
    let response = send(&app, with_auth("POST", "/api/charts", &header)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.count(), 1);

    let wrong = basic_auth_header("admin", "guess");
    let response = send(&app, with_auth("POST", "/api/charts", &wrong)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn reads_need_credentials_without_anonymous_get() {
    let (app, _) = app(&basic_config(false));

    let response = send(&app, request("GET", "/index.yaml")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, request("HEAD", "/api/charts/mychart")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn system_info_is_never_gated() {
    let (app, calls) = app(&basic_config(false));

    let response = send(&app, request("GET", "/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    assert_eq!(json(response).await["healthy"], true);

    let response = send(&app, request("GET", "/info")).await;
    assert_eq!(json(response).await["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn unmatched_requests_are_json_404() {
    let mut config = basic_config(false);
    config.server.context_path = "/cm".to_string();
    let (app, calls) = app(&config);

    for (method, uri) in [
        ("GET", "/index.yaml"),
        ("GET", "/cm/nope/deeper/still"),
        ("PUT", "/cm/api/charts"),
        ("GET", "/cmx/index.yaml"),
    ] {
        let response = send(&app, request(method, uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
        assert_eq!(json(response).await["error"], "not found");
    }
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn namespace_depth_binds_multi_segment_repo() {
    let mut config = GatewayConfig::default();
    config.repository.depth = 2;
    let (app, _) = app(&config);

    let response = send(&app, request("GET", "/api/org/team/charts/mychart/1.0.0")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["params"]["repo"], "org/team");

    let response = send(&app, request("GET", "/org/index.yaml")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bearer_token_scoped_to_repo() {
    let mut config = bearer_config();
    config.repository.depth = 1;
    let (app, calls) = app(&config);

    let token = format!("Bearer {}", sign_token("stable", &["pull"]));
    let response = send(&app, with_auth("GET", "/stable/index.yaml", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[VARY], "Authorization");
    assert_eq!(calls.count(), 1);

    let response = send(&app, with_auth("GET", "/incubator/index.yaml", &token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[WWW_AUTHENTICATE],
        format!(
            "Bearer realm=\"{TOKEN_REALM}\",service=\"{TOKEN_SERVICE}\",\
             scope=\"artifact-repository:incubator:pull\",error=\"insufficient_scope\""
        )
        .as_str()
    );

    let response = send(&app, with_auth("POST", "/api/stable/charts", &token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn bearer_challenge_without_token() {
    let mut config = bearer_config();
    config.auth.anonymous_get = true;
    let (app, calls) = app(&config);

    let response = send(&app, request("GET", "/index.yaml")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[WWW_AUTHENTICATE],
        format!("Bearer realm=\"{TOKEN_REALM}\",service=\"{TOKEN_SERVICE}\",scope=\"artifact-repository:repo:pull\"").as_str()
    );
    assert_eq!(calls.count(), 0);

    let response = send(&app, with_auth("GET", "/index.yaml", "Bearer not.a.token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response.headers()[WWW_AUTHENTICATE].to_str().unwrap();
    assert!(challenge.ends_with(",error=\"invalid_token\""), "{challenge}");
}

#[tokio::test]
async fn request_id_is_generated_or_propagated() {
    let (app, _) = app(&GatewayConfig::default());

    let response = send(&app, request("GET", "/health")).await;
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());

    let incoming = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-me")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, incoming).await;
    assert_eq!(response.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let mut config = GatewayConfig::default();
    config.server.max_upload_size = 16;
    let (app, calls) = app(&config);

    let upload = Request::builder()
        .method("POST")
        .uri("/api/charts")
        .header(CONTENT_LENGTH, "32")
        .body(Body::from(vec![0u8; 32]))
        .unwrap();
    let response = send(&app, upload).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn metrics_use_route_templates() {
    let mut config = GatewayConfig::default();
    config.repository.depth = 1;
    config.observability.enable_metrics = true;
    let (app, _) = app(&config);

    let response = send(&app, request("GET", "/stable/charts/mychart-0.1.0.tgz")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, request("GET", "/api/stable/charts/mychart/0.1.0")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, request("GET", "/metrics")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains("chartgateway_requests_total"), "{text}");
    assert!(text.contains("url=\"/:repo/charts/:filename\""), "{text}");
    assert!(text.contains("url=\"/api/:repo/charts/:name/:version\""), "{text}");
    assert!(!text.contains("mychart-0.1.0.tgz"), "{text}");
}

#[tokio::test]
async fn metrics_route_absent_when_disabled() {
    let (app, _) = app(&GatewayConfig::default());
    let response = send(&app, request("GET", "/metrics")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
