use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    Category, EngineError, ResultEngine, TransactionKind, budgets, categories, transactions,
    util::{normalize_display, normalize_key},
};

use super::{Engine, with_tx};

const UNCATEGORIZED_NAME: &str = "Uncategorized";
const UNCATEGORIZED_NAME_NORM: &str = "uncategorized";

fn parse_category_kind(value: &str) -> ResultEngine<TransactionKind> {
    TransactionKind::try_from(value)
        .map_err(|_| EngineError::InvalidKind("Invalid category type".to_string()))
}

fn category_names(name: &str) -> ResultEngine<(String, String)> {
    let display = normalize_display(name)
        .ok_or_else(|| EngineError::InvalidName("category name must not be empty".to_string()))?;
    let norm = normalize_key(&display).ok_or_else(|| {
        EngineError::InvalidName(format!("category name '{display}' has no letters or digits"))
    })?;
    Ok((display, norm))
}

impl Engine {
    /// Categories of the user, income first, then by name.
    pub async fn list_categories(
        &self,
        user_id: i32,
        kind: Option<TransactionKind>,
    ) -> ResultEngine<Vec<Category>> {
        let mut query = categories::Entity::find().filter(categories::Column::UserId.eq(user_id));
        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_str()));
        }
        query
            .order_by_desc(categories::Column::Kind)
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    pub async fn create_category(
        &self,
        user_id: i32,
        name: &str,
        kind: &str,
    ) -> ResultEngine<Category> {
        if name.trim().is_empty() || kind.trim().is_empty() {
            return Err(EngineError::MissingField("Missing fields".to_string()));
        }
        let kind = parse_category_kind(kind)?;
        let (display, norm) = category_names(name)?;

        with_tx!(self, |db_tx| {
            if Self::find_category_by_norm(&db_tx, user_id, kind, &norm)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(
                    "Category already exists".to_string(),
                ));
            }
            let model = Self::insert_category(&db_tx, user_id, kind, display, norm).await?;
            Category::try_from(model)
        })
    }

    /// Rename a category and/or change its type.
    ///
    /// The type can only change while no transaction or budget references the
    /// category.
    pub async fn update_category(
        &self,
        user_id: i32,
        category_id: i32,
        name: Option<&str>,
        kind: Option<&str>,
    ) -> ResultEngine<Category> {
        if name.is_none() && kind.is_none() {
            return Err(EngineError::MissingField("No fields to update".to_string()));
        }
        let kind = kind.map(parse_category_kind).transpose()?;
        let names = name.map(category_names).transpose()?;

        with_tx!(self, |db_tx| {
            let model = Self::require_category(&db_tx, user_id, category_id).await?;
            let current_kind = TransactionKind::try_from(model.kind.as_str())?;
            let target_kind = kind.unwrap_or(current_kind);

            if target_kind != current_kind {
                let tx_refs = transactions::Entity::find()
                    .filter(transactions::Column::CategoryId.eq(category_id))
                    .count(&db_tx)
                    .await?;
                if tx_refs > 0 {
                    return Err(EngineError::InUse(
                        "Category type cannot change while transactions use it".to_string(),
                    ));
                }
                // Budgets only track expense categories.
                let budget_refs = budgets::Entity::find()
                    .filter(budgets::Column::CategoryId.eq(category_id))
                    .count(&db_tx)
                    .await?;
                if budget_refs > 0 {
                    return Err(EngineError::InUse(
                        "Category type cannot change while budgets use it".to_string(),
                    ));
                }
            }

            let (display, norm) = names.unwrap_or((model.name.clone(), model.name_norm.clone()));
            if let Some(other) = Self::find_category_by_norm(&db_tx, user_id, target_kind, &norm).await?
                && other.id != category_id
            {
                return Err(EngineError::ExistingKey(
                    "Category already exists".to_string(),
                ));
            }

            let mut active: categories::ActiveModel = model.into();
            active.name = ActiveValue::Set(display);
            active.name_norm = ActiveValue::Set(norm);
            active.kind = ActiveValue::Set(target_kind.as_str().to_string());
            let model = active.update(&db_tx).await?;
            Category::try_from(model)
        })
    }

    /// Delete a category nothing references.
    pub async fn delete_category(&self, user_id: i32, category_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = Self::require_category(&db_tx, user_id, category_id).await?;

            let tx_refs = transactions::Entity::find()
                .filter(transactions::Column::CategoryId.eq(category_id))
                .count(&db_tx)
                .await?;
            let budget_refs = budgets::Entity::find()
                .filter(budgets::Column::CategoryId.eq(category_id))
                .count(&db_tx)
                .await?;
            if tx_refs > 0 || budget_refs > 0 {
                return Err(EngineError::InUse("Category is in use".to_string()));
            }

            model.delete(&db_tx).await?;
            Ok(())
        })
    }

    pub(super) async fn require_category<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        category_id: i32,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("Category not found".to_string()))
    }

    /// Pick the category of a transaction of `kind`.
    ///
    /// An explicit id must belong to the user and match `kind`. A name is
    /// looked up case/accent-insensitively and created when missing. Without
    /// either, the "Uncategorized" category of `kind` is used.
    pub(super) async fn resolve_category<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        kind: TransactionKind,
        category_id: Option<i32>,
        name: Option<&str>,
    ) -> ResultEngine<categories::Model> {
        if let Some(category_id) = category_id {
            let model = Self::require_category(conn, user_id, category_id).await?;
            if model.kind != kind.as_str() {
                return Err(EngineError::KindMismatch(format!(
                    "Category '{}' is not an {} category",
                    model.name,
                    kind.as_str()
                )));
            }
            return Ok(model);
        }

        let (display, norm) = match name.filter(|value| !value.trim().is_empty()) {
            Some(name) => category_names(name)?,
            None => (
                UNCATEGORIZED_NAME.to_string(),
                UNCATEGORIZED_NAME_NORM.to_string(),
            ),
        };

        if let Some(model) = Self::find_category_by_norm(conn, user_id, kind, &norm).await? {
            return Ok(model);
        }
        let model = Self::insert_category(conn, user_id, kind, display, norm).await?;
        tracing::debug!(user_id, category_id = model.id, "category created on demand");
        Ok(model)
    }

    async fn find_category_by_norm<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        kind: TransactionKind,
        norm: &str,
    ) -> ResultEngine<Option<categories::Model>> {
        Ok(categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::NameNorm.eq(norm))
            .one(conn)
            .await?)
    }

    async fn insert_category<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        kind: TransactionKind,
        display: String,
        norm: String,
    ) -> ResultEngine<categories::Model> {
        let active = categories::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            name: ActiveValue::Set(display),
            name_norm: ActiveValue::Set(norm),
            kind: ActiveValue::Set(kind.as_str().to_string()),
            created_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        Ok(active.insert(conn).await?)
    }
}
