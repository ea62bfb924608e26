//! Profile of the acting user and the admin user listing.

use api_types::user::{ProfileUpdate, UserListResponse, UserResponse, UserView};
use axum::{Extension, Json, extract::State};

use crate::{ApiJson, ServerError, acl::Principal, server::ServerState};

pub(crate) fn map_user(user: engine::User) -> UserView {
    UserView {
        id: user.id,
        email: user.email,
        name: user.name,
        is_admin: user.is_admin,
        created_at: user.created_at,
    }
}

pub async fn profile(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
) -> Result<Json<UserResponse>, ServerError> {
    let user = state.engine.user(principal.user_id).await?;
    Ok(Json(UserResponse {
        message: None,
        user: map_user(user),
    }))
}

pub async fn update_profile(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<ProfileUpdate>,
) -> Result<Json<UserResponse>, ServerError> {
    let user = state
        .engine
        .update_profile(
            principal.user_id,
            payload.name.as_deref(),
            payload.password.as_deref(),
        )
        .await?;
    Ok(Json(UserResponse {
        message: Some("Profile updated".to_string()),
        user: map_user(user),
    }))
}

/// Every registered user. Admin only.
pub async fn list(State(state): State<ServerState>) -> Result<Json<UserListResponse>, ServerError> {
    let users = state
        .engine
        .list_users()
        .await?
        .into_iter()
        .map(map_user)
        .collect();
    Ok(Json(UserListResponse { users }))
}
