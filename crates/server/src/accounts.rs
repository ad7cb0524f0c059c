//! Account API endpoints

use api_types::accounts::{Login, LogoutView, RegisterUser, TokenView, UserView};
use axum::{Extension, Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};

use crate::{ServerError, server::ServerState, server::TokenAuthorization};

/// Handle requests for creating a new user
pub async fn register(
    State(state): State<ServerState>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let Json(payload) = payload?;
    let user = state
        .engine
        .register(payload.username.as_deref(), payload.password.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserView {
            id: user.id,
            username: user.username,
        }),
    ))
}

/// Handle requests exchanging credentials for a token
pub async fn login(
    State(state): State<ServerState>,
    payload: Result<Json<Login>, JsonRejection>,
) -> Result<Json<TokenView>, ServerError> {
    let Json(payload) = payload?;
    let token = state
        .engine
        .login(payload.username.as_deref(), payload.password.as_deref())
        .await?;

    Ok(Json(TokenView { token }))
}

/// Handle requests invalidating the caller's token
pub async fn logout(
    Extension(user): Extension<engine::User>,
    Extension(token): Extension<TokenAuthorization>,
    State(state): State<ServerState>,
) -> Result<Json<LogoutView>, ServerError> {
    state.engine.logout(&token.0).await?;
    tracing::info!(user_id = user.id, "logged out");

    Ok(Json(LogoutView {
        detail: "Successfully logged out.".to_string(),
    }))
}
