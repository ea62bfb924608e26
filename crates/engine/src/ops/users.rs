use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine, User,
    password::{hash_password, verify_password},
    users,
    util::{normalize_email, validate_password},
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Register a regular user.
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> ResultEngine<User> {
        if email.trim().is_empty() || password.is_empty() || name.trim().is_empty() {
            return Err(EngineError::MissingField(
                "Email, password, and name are required".to_string(),
            ));
        }
        self.create_user(email, password, name, false).await
    }

    /// Insert a user, hashing the password.
    ///
    /// The email is lower-cased and must be unused.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
        is_admin: bool,
    ) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        let name = normalize_required_name(name, "user")?;
        validate_password(password)?;
        let password_hash = hash_password(password).await?;

        with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(
                    "Email already registered".to_string(),
                ));
            }

            let model = users::ActiveModel {
                email: ActiveValue::Set(email),
                password_hash: ActiveValue::Set(password_hash),
                name: ActiveValue::Set(name),
                is_admin: ActiveValue::Set(is_admin),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            tracing::debug!(user_id = model.id, "user created");

            Ok(User::from(model))
        })
    }

    /// Check an email/password pair.
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(EngineError::MissingField(
                "Email and password are required".to_string(),
            ));
        }

        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.database)
            .await?
            .ok_or(EngineError::InvalidCredentials)?;

        if !verify_password(password, &model.password_hash).await? {
            return Err(EngineError::InvalidCredentials);
        }
        Ok(User::from(model))
    }

    pub async fn user(&self, user_id: i32) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound("User not found".to_string()))
    }

    pub async fn list_users(&self) -> ResultEngine<Vec<User>> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    /// Change name and/or password of the acting user.
    pub async fn update_profile(
        &self,
        user_id: i32,
        name: Option<&str>,
        password: Option<&str>,
    ) -> ResultEngine<User> {
        let password = password.filter(|p| !p.is_empty());
        if name.is_none() && password.is_none() {
            return Err(EngineError::MissingField("No fields to update".to_string()));
        }
        let name = name
            .map(|value| normalize_required_name(value, "user"))
            .transpose()?;
        let password_hash = match password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password).await?)
            }
            None => None,
        };

        with_tx!(self, |db_tx| {
            let model = users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("User not found".to_string()))?;

            let mut active: users::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(password_hash) = password_hash {
                active.password_hash = ActiveValue::Set(password_hash);
            }
            let model = active.update(&db_tx).await?;

            Ok(User::from(model))
        })
    }
}
