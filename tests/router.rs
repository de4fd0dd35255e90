//! Router assembly: common routes, application routes, request log, body limit.

use axum::body::Body;
use axum::extract::Path;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use shore::request_log::REQUEST_ID_HEADER;
use shore::server::{build_router, ServerSettings};
use shore::{AppInfo, AppState, Application, Configuration, Param, Properties, Services, Stage};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

struct Echo {
    mount: Option<&'static str>,
}

impl Application for Echo {
    fn executable_name(&self) -> &str {
        "echo"
    }

    fn version(&self) -> &str {
        "1.2.3"
    }

    fn configure(&self, config: &mut Configuration) {
        config.do_not_log_requests_for("/health");
        if let Some(mount) = self.mount {
            config.set_mount_path(mount);
        }
    }

    fn routes(&self) -> Router<AppState> {
        Router::new()
            .route("/echo/:word", get(|Path(word): Path<String>| async move { word }))
            .route("/double/:n", get(|Path(n): Path<Param<i64>>| async move { (*n * 2).to_string() }))
            .route("/upload", post(|body: String| async move { body.len().to_string() }))
    }
}

fn router(app: &Echo, settings: ServerSettings) -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/shore_test")
        .unwrap();
    let mut config = Configuration::default();
    app.configure(&mut config);
    let state = AppState::new(
        AppInfo::of(app),
        pool,
        Properties::new(),
        Services::new(),
        Stage::Development,
    );
    build_router(app, &config, state, &settings).unwrap()
}

async fn get_body(router: Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn health_is_always_available() {
    let (status, body) = get_body(router(&Echo { mount: None }, ServerSettings::default()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn version_reports_the_application() {
    let (status, body) = get_body(router(&Echo { mount: None }, ServerSettings::default()), "/version").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["name"], "echo");
    assert_eq!(json["version"], "1.2.3");
    assert!(json["started_at"].as_str().is_some());
}

#[tokio::test]
async fn application_routes_are_merged() {
    let (status, body) = get_body(router(&Echo { mount: None }, ServerSettings::default()), "/echo/dingo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "dingo");
}

#[tokio::test]
async fn application_routes_honor_mount_path() {
    let app = Echo { mount: Some("/api") };
    let (status, body) = get_body(router(&app, ServerSettings::default()), "/api/echo/dingo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "dingo");

    let (status, _) = get_body(router(&app, ServerSettings::default()), "/echo/dingo").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_body(router(&app, ServerSettings::default()), "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logged_requests_carry_an_id() {
    let app = Echo { mount: None };
    let response = router(&app, ServerSettings::default())
        .oneshot(Request::builder().uri("/echo/x").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let id = response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
    assert_eq!(id.len(), 36);

    let response = router(&app, ServerSettings::default())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().get(REQUEST_ID_HEADER).is_none());
}

#[tokio::test]
async fn malformed_params_are_bad_requests() {
    let app = Echo { mount: None };
    let (status, body) = get_body(router(&app, ServerSettings::default()), "/double/21").await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "42"));

    let (status, body) = get_body(router(&app, ServerSettings::default()), "/double/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid parameter: abc"), "{body}");
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let settings = ServerSettings {
        max_body_bytes: 16,
        ..ServerSettings::default()
    };
    let response = router(&Echo { mount: None }, settings)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-length", "64")
                .body(Body::from("x".repeat(64)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
