use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, Statement, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    Budget, BudgetInput, EngineError, ResultEngine, TransactionKind, budgets, categories,
    transactions,
    util::{month_bounds_of, month_label, parse_optional_date, require_amount},
};

use super::{Engine, normalize_optional_text, today, with_tx};

const DEFAULT_BUDGET_DESCRIPTION: &str = "Default budget created automatically";

/// Fill missing period ends from the month of the known one, or the current month.
fn budget_period(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, month_bounds_of(start)?.1),
        (None, Some(end)) => (month_bounds_of(end)?.0, end),
        (None, None) => month_bounds_of(today())?,
    };
    if end < start {
        return Err(EngineError::InvalidDate(
            "end_date must not be before start_date".to_string(),
        ));
    }
    Ok((start, end))
}

impl Engine {
    /// Budgets of the user, newest period first, with their spent amount.
    pub async fn list_budgets(&self, user_id: i32) -> ResultEngine<Vec<Budget>> {
        let models = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .order_by_desc(budgets::Column::StartDate)
            .order_by_desc(budgets::Column::Id)
            .all(&self.database)
            .await?;

        let category_names: HashMap<i32, String> = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let stmt = Statement::from_sql_and_values(
            self.database.get_database_backend(),
            "SELECT budget_id, COALESCE(SUM(amount), 0) AS spent \
             FROM transactions \
             WHERE user_id = ? AND kind = ? AND budget_id IS NOT NULL \
             GROUP BY budget_id",
            vec![user_id.into(), TransactionKind::Expense.as_str().into()],
        );
        let mut spent_by_budget: HashMap<i32, i64> = HashMap::new();
        for row in self.database.query_all(stmt).await? {
            let budget_id: i32 = row.try_get("", "budget_id")?;
            let spent: i64 = row.try_get("", "spent")?;
            spent_by_budget.insert(budget_id, spent);
        }

        Ok(models
            .into_iter()
            .map(|model| {
                let category = model
                    .category_id
                    .and_then(|id| category_names.get(&id).cloned());
                let spent = spent_by_budget.get(&model.id).copied().unwrap_or(0);
                Budget::from_model(model, category, spent)
            })
            .collect())
    }

    pub async fn budget(&self, user_id: i32, budget_id: i32) -> ResultEngine<Budget> {
        let model = Self::require_budget(&self.database, user_id, budget_id).await?;
        Self::budget_view(&self.database, model).await
    }

    /// Create a budget.
    ///
    /// `amount` is mandatory. The name defaults to "Budget for {category}" or
    /// "Budget {Month YYYY}".
    pub async fn create_budget(&self, user_id: i32, input: BudgetInput) -> ResultEngine<Budget> {
        let amount = require_amount(input.amount)?;
        let (start, end) = budget_period(
            parse_optional_date(input.start_date.as_deref())?,
            parse_optional_date(input.end_date.as_deref())?,
        )?;
        let description = normalize_optional_text(input.description.as_deref());

        with_tx!(self, |db_tx| {
            let category =
                Self::budget_category(&db_tx, user_id, input.category_id, input.category.as_deref())
                    .await?;
            let name = match normalize_optional_text(input.name.as_deref()) {
                Some(name) => name,
                None => match &category {
                    Some(category) => format!("Budget for {}", category.name),
                    None => format!("Budget {}", month_label(start)),
                },
            };

            let model = budgets::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                category_id: ActiveValue::Set(category.as_ref().map(|c| c.id)),
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(description),
                amount: ActiveValue::Set(amount),
                start_date: ActiveValue::Set(start),
                end_date: ActiveValue::Set(end),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            tracing::debug!(user_id, budget_id = model.id, amount, "budget created");

            Ok(Budget::from_model(model, category.map(|c| c.name), 0))
        })
    }

    /// Update a budget. `amount` is mandatory, other fields replace the
    /// stored ones only when present.
    pub async fn update_budget(
        &self,
        user_id: i32,
        budget_id: i32,
        input: BudgetInput,
    ) -> ResultEngine<Budget> {
        let amount = require_amount(input.amount)?;
        let start = parse_optional_date(input.start_date.as_deref())?;
        let end = parse_optional_date(input.end_date.as_deref())?;

        with_tx!(self, |db_tx| {
            let model = Self::require_budget(&db_tx, user_id, budget_id).await?;
            let start = start.unwrap_or(model.start_date);
            let end = end.unwrap_or(model.end_date);
            if end < start {
                return Err(EngineError::InvalidDate(
                    "end_date must not be before start_date".to_string(),
                ));
            }
            let category =
                Self::budget_category(&db_tx, user_id, input.category_id, input.category.as_deref())
                    .await?;

            let mut active: budgets::ActiveModel = model.into();
            active.amount = ActiveValue::Set(amount);
            active.start_date = ActiveValue::Set(start);
            active.end_date = ActiveValue::Set(end);
            if let Some(name) = normalize_optional_text(input.name.as_deref()) {
                active.name = ActiveValue::Set(name);
            }
            if input.description.is_some() {
                active.description =
                    ActiveValue::Set(normalize_optional_text(input.description.as_deref()));
            }
            if let Some(category) = category {
                active.category_id = ActiveValue::Set(Some(category.id));
            }
            let model = active.update(&db_tx).await?;

            Self::budget_view(&db_tx, model).await
        })
    }

    /// Delete a budget. Its transactions are kept and lose their budget.
    pub async fn delete_budget(&self, user_id: i32, budget_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = Self::require_budget(&db_tx, user_id, budget_id).await?;

            transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::BudgetId,
                    Expr::value(Option::<i32>::None),
                )
                .filter(transactions::Column::BudgetId.eq(budget_id))
                .exec(&db_tx)
                .await?;
            model.delete(&db_tx).await?;
            tracing::debug!(user_id, budget_id, "budget deleted");
            Ok(())
        })
    }

    pub(super) async fn require_budget<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        budget_id: i32,
    ) -> ResultEngine<budgets::Model> {
        budgets::Entity::find_by_id(budget_id)
            .filter(budgets::Column::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("Budget not found".to_string()))
    }

    /// Pick the budget of a transaction dated `date`.
    ///
    /// An explicit id must belong to the user. Otherwise the newest budget
    /// whose period covers `date` wins, then the oldest budget of the user.
    /// A user without budgets gets a zero-amount default budget for the
    /// month of `date`.
    pub(super) async fn resolve_budget<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        budget_id: Option<i32>,
        date: NaiveDate,
    ) -> ResultEngine<budgets::Model> {
        if let Some(budget_id) = budget_id {
            return Self::require_budget(conn, user_id, budget_id).await;
        }

        if let Some(model) = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .filter(budgets::Column::StartDate.lte(date))
            .filter(budgets::Column::EndDate.gte(date))
            .order_by_desc(budgets::Column::StartDate)
            .order_by_desc(budgets::Column::Id)
            .one(conn)
            .await?
        {
            return Ok(model);
        }

        if let Some(model) = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .order_by_asc(budgets::Column::Id)
            .one(conn)
            .await?
        {
            return Ok(model);
        }

        let (start, end) = month_bounds_of(date)?;
        let model = budgets::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            category_id: ActiveValue::Set(None),
            name: ActiveValue::Set(format!("Default Budget {}", month_label(date))),
            description: ActiveValue::Set(Some(DEFAULT_BUDGET_DESCRIPTION.to_string())),
            amount: ActiveValue::Set(0),
            start_date: ActiveValue::Set(start),
            end_date: ActiveValue::Set(end),
            created_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        tracing::info!(user_id, budget_id = model.id, "default budget created");
        Ok(model)
    }

    async fn budget_category<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        category_id: Option<i32>,
        name: Option<&str>,
    ) -> ResultEngine<Option<categories::Model>> {
        let name = name.filter(|value| !value.trim().is_empty());
        if category_id.is_none() && name.is_none() {
            return Ok(None);
        }
        Self::resolve_category(conn, user_id, TransactionKind::Expense, category_id, name)
            .await
            .map(Some)
    }

    async fn budget_view<C: ConnectionTrait>(
        conn: &C,
        model: budgets::Model,
    ) -> ResultEngine<Budget> {
        let category = match model.category_id {
            Some(id) => categories::Entity::find_by_id(id)
                .one(conn)
                .await?
                .map(|c| c.name),
            None => None,
        };

        let stmt = Statement::from_sql_and_values(
            conn.get_database_backend(),
            "SELECT COALESCE(SUM(amount), 0) AS sum \
             FROM transactions \
             WHERE budget_id = ? AND kind = ?",
            vec![model.id.into(), TransactionKind::Expense.as_str().into()],
        );
        let row = conn.query_one(stmt).await?;
        let spent = row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0);

        Ok(Budget::from_model(model, category, spent))
    }
}
