#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bank_server::{http, AppState, BankConfig, Database};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub root: TempDir,
}

/// Router over a fresh in-memory store, with help and upload directories
/// inside a temp root.
pub async fn spawn_app() -> TestApp {
    let root = tempfile::tempdir().unwrap();
    let help_dir = root.path().join("help");
    std::fs::create_dir_all(&help_dir).unwrap();
    std::fs::write(help_dir.join("welcome.txt"), "Welcome to BuggyBank help.").unwrap();

    let config = BankConfig {
        database_url: "sqlite::memory:".to_string(),
        upload_dir: root.path().join("uploads"),
        help_dir,
        ..BankConfig::default()
    };
    let db = Database::new(&config.database_url).await.unwrap();
    let state = AppState::new(db, config);

    TestApp {
        router: http::router(state.clone()),
        state,
        root,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("session={}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)], token: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("session={}", token));
        }
        self.send(builder.body(Body::from(encode_form(fields))).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("session={}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Log in through `/login` using `token` as the pre-set session cookie.
    pub async fn login(&self, username: &str, password: &str, token: &str) -> Response {
        let response = self
            .post_form(
                "/login",
                &[("username", username), ("password", password)],
                Some(token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "login for {} failed", username);
        response
    }

    pub async fn user_id(&self, username: &str) -> i64 {
        self.state.db.find_by_username(username).await.unwrap().id
    }

    pub async fn balance(&self, username: &str) -> f64 {
        self.state.db.find_by_username(username).await.unwrap().balance
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// `application/x-www-form-urlencoded` body.
pub fn encode_form(fields: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(fields).unwrap()
}
