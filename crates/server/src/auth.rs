//! Registration, login and logout.

use api_types::{
    MessageResponse,
    auth::{AuthResponse, Login, Register},
};
use axum::{Json, extract::State, http::StatusCode};

use crate::{ApiJson, ServerError, server::ServerState, user::map_user};

pub async fn register(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<Register>,
) -> Result<(StatusCode, Json<AuthResponse>), ServerError> {
    let user = state
        .engine
        .register_user(&payload.email, &payload.password, &payload.name)
        .await?;
    tracing::info!(user_id = user.id, "user registered");

    let token = state.tokens.issue(user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: map_user(user),
        }),
    ))
}

pub async fn login(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<Login>,
) -> Result<Json<AuthResponse>, ServerError> {
    let user = state
        .engine
        .authenticate(&payload.email, &payload.password)
        .await
        .inspect_err(|err| {
            if matches!(err, engine::EngineError::InvalidCredentials) {
                tracing::warn!("failed login attempt");
            }
        })?;

    let token = state.tokens.issue(user.id)?;
    Ok(Json(AuthResponse {
        token,
        user: map_user(user),
    }))
}

/// Tokens are stateless: the client drops its copy.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::new("Logged out successfully"))
}
