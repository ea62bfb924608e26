use api_types::notification::{NotificationListResponse, NotificationView};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, acl::Principal, server::ServerState};

pub async fn list(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
) -> Result<Json<NotificationListResponse>, ServerError> {
    let notifications = state
        .engine
        .list_notifications(principal.user_id)
        .await?
        .into_iter()
        .map(|notification| NotificationView {
            id: notification.id,
            message: notification.message,
            date: notification.date.date_naive(),
        })
        .collect();
    Ok(Json(NotificationListResponse { notifications }))
}
