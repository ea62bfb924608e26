use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};

use crate::{EngineError, Notification, ResultEngine, notifications, users};

use super::Engine;

impl Engine {
    /// Notifications of the user, newest first.
    pub async fn list_notifications(&self, user_id: i32) -> ResultEngine<Vec<Notification>> {
        let models = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .order_by_desc(notifications::Column::Date)
            .order_by_desc(notifications::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Notification::from).collect())
    }

    pub async fn create_notification(
        &self,
        user_id: i32,
        message: &str,
    ) -> ResultEngine<Notification> {
        let message = message.trim();
        if message.is_empty() {
            return Err(EngineError::MissingField(
                "message must not be empty".to_string(),
            ));
        }
        if users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .is_none()
        {
            return Err(EngineError::KeyNotFound("User not found".to_string()));
        }

        let model = notifications::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            message: ActiveValue::Set(message.to_string()),
            date: ActiveValue::Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.database)
        .await?;
        Ok(Notification::from(model))
    }
}
