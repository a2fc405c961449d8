use std::sync::Arc;

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        Request, Response, StatusCode,
    },
    Router,
};
use clicker::{
    server::{build_router, AppState},
    session::MemorySessionStore,
    storage::{GameStore, SqliteStore},
    Settings,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

async fn app_with(settings: Settings) -> (Router, SqlitePool) {
    let store = SqliteStore::in_memory().await.unwrap();
    store.migrate().await.unwrap();
    let pool = store.pool().clone();

    let state = AppState::new(
        settings,
        Arc::new(store),
        Arc::new(MemorySessionStore::default()),
    );
    (build_router(state), pool)
}

async fn app() -> Router {
    app_with(Settings::default()).await.0
}

fn avatar_upload(cookie: &str, filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--XYZ\r\n\
        Content-Disposition: form-data; name=\"avatar\"; filename=\"{}\"\r\n\
        Content-Type: image/png\r\n\r\n\
        {}\r\n\
        --XYZ--\r\n",
        filename, content
    );
    Request::builder()
        .method("POST")
        .uri("/upload_avatar")
        .header(COOKIE, cookie)
        .header(CONTENT_TYPE, "multipart/form-data; boundary=XYZ")
        .body(Body::from(body))
        .unwrap()
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed(method: &str, uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn session_of(response: &Response<Body>) -> String {
    let header = response.headers()[SET_COOKIE].to_str().unwrap();
    header.split(';').next().unwrap().to_string()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(form("/register", &format!("username={}&password=pw", username)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    session_of(&response)
}

#[tokio::test]
async fn test_register_click_dashboard_flow() {
    let app = app().await;
    let cookie = register(&app, "alice").await;

    for expected in 1..=2 {
        let response = app.clone().oneshot(authed("POST", "/click", &cookie)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["clicks"], expected);
        assert_eq!(body["level"]["level"], 1);
        assert_eq!(body["winning_tap"], false);
    }

    let response = app.clone().oneshot(authed("GET", "/", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["clicks"], 2);
    assert_eq!(body["place"], 1);
    assert_eq!(body["level"]["threshold"], 10);
    assert_eq!(body["leaderboard"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_requests_without_session_are_rejected() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Not logged in");

    let response = app
        .oneshot(authed("POST", "/click", "clicker_session=bogus"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_and_login() {
    let app = app().await;
    register(&app, "alice").await;

    let response = app
        .clone()
        .oneshot(form("/register", "username=alice&password=other"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(form("/login", "username=alice&password=wrong"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(form("/login", "username=alice&password=pw"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_of(&response);

    let response = app.oneshot(authed("GET", "/", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = app().await;
    let cookie = register(&app, "alice").await;

    let response = app.clone().oneshot(authed("GET", "/logout", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_of(&response).ends_with('='));

    let response = app.oneshot(authed("GET", "/", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_avatar_upload_locked_below_level_five() {
    let app = app().await;
    let cookie = register(&app, "alice").await;

    let response = app.oneshot(avatar_upload(&cookie, "me.png", "png")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_avatar_upload_served_and_replaced_at_level_five() {
    let uploads = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.server.upload_dir = uploads.path().to_path_buf();
    let (app, pool) = app_with(settings).await;

    let cookie = register(&app, "me").await;
    sqlx::query("UPDATE users SET clicks = 252000 WHERE username = 'me'")
        .execute(&pool)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(avatar_upload(&cookie, "me.png", "png-bytes"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["avatar"], "1_me.png");

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/uploads/1_me.png").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"png-bytes");

    let response = app.clone().oneshot(authed("GET", "/", &cookie)).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["user"]["avatar"], "1_me.png");
    assert_eq!(body["level"]["level"], 5);

    let response = app
        .clone()
        .oneshot(avatar_upload(&cookie, "new.png", "newer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["avatar"], "1_new.png");
    assert!(!uploads.path().join("1_me.png").exists());
    assert!(uploads.path().join("1_new.png").exists());

    let response = app
        .oneshot(Request::builder().uri("/uploads/1_me.png").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_locations_visible_to_admin_only() {
    let app = app().await;
    let admin = register(&app, "admin").await;
    let alice = register(&app, "alice").await;

    let request = Request::builder()
        .method("POST")
        .uri("/location")
        .header(COOKIE, &alice)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"lat":51.5,"lon":-0.12,"city":"London"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(authed("GET", "/admin/locations", &alice))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.oneshot(authed("GET", "/admin/locations", &admin)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["username"], "alice");
    assert_eq!(entries[0]["location"]["city"], "London");
}

#[tokio::test]
async fn test_chat_history_starts_empty() {
    let app = app().await;
    let cookie = register(&app, "alice").await;

    let response = app.oneshot(authed("GET", "/chat", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["messages"].as_array().unwrap().is_empty());
}
