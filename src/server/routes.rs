use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    game::{ChatHistory, Dashboard, TapOutcome},
    models::{ClickerError, Location, User, UserLocation},
    session::new_session_token,
};
use super::{
    auth::{expired_cookie, session_cookie, session_token, CurrentUser},
    state::AppState,
    upload::{remove_avatar, save_avatar},
};

type ApiResult<T> = Result<T, ClickerError>;

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

fn start_session(state: &AppState, user: &User) -> String {
    let token = new_session_token();
    state.sessions.set(token.clone(), user.id);
    session_cookie(
        &state.settings.session.cookie_name,
        &token,
        state.settings.session.ttl_seconds,
    )
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.game.dashboard(user_id).await?))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> ApiResult<impl IntoResponse> {
    let user = state.game.register(&form.username, &form.password).await?;
    let cookie = start_session(&state, &user);

    Ok((StatusCode::CREATED, [(SET_COOKIE, cookie)], Json(user)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> ApiResult<impl IntoResponse> {
    let user = state.game.login(&form.username, &form.password).await?;
    let cookie = start_session(&state, &user);
    info!("User {} logged in", user.username);

    Ok(([(SET_COOKIE, cookie)], Json(user)))
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let cookie_name = &state.settings.session.cookie_name;
    if let Some(token) = session_token(&headers, cookie_name) {
        state.sessions.remove(&token);
    }

    ([(SET_COOKIE, expired_cookie(cookie_name))], Json(json!({ "logged_out": true })))
}

pub async fn click(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<TapOutcome>> {
    Ok(Json(state.game.tap(user_id).await?))
}

pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    // Check the gate before reading the body so locked users never write files.
    let previous = state.game.authorize_avatar(user_id).await?.avatar;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ClickerError::Upload(e.to_string()))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ClickerError::Upload(e.to_string()))?;

        let upload_dir = &state.settings.server.upload_dir;
        let stored = save_avatar(upload_dir, user_id, &original_name, &bytes).await?;
        state.game.set_avatar(user_id, &stored).await?;

        if previous != stored {
            remove_avatar(upload_dir, user_id, &previous).await;
        }

        return Ok(Json(json!({ "avatar": stored })));
    }

    Err(ClickerError::Upload("missing avatar field".to_string()))
}

pub async fn submit_location(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(location): Json<Location>,
) -> ApiResult<StatusCode> {
    state.game.submit_location(user_id, location).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn admin_locations(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<Vec<UserLocation>>> {
    Ok(Json(state.game.locations(user_id).await?))
}

pub async fn chat_history(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<ChatHistory>> {
    Ok(Json(state.game.chat_history(user_id).await?))
}
