use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, ResultEngine, Transaction, TransactionInput, TransactionKind, TransactionPatch,
    categories, transactions,
    util::{parse_date, parse_optional_date, require_amount},
};

use super::{Engine, normalize_optional_text, today, with_tx};

const DEFAULT_LIST_LIMIT: u64 = 100;
const MAX_LIST_LIMIT: u64 = 500;

/// Filters for listing transactions.
///
/// `from` and `to` are both inclusive calendar dates.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub kind: Option<TransactionKind>,
    pub category_id: Option<i32>,
    pub budget_id: Option<i32>,
    /// `YYYY-MM-DD`
    pub from: Option<String>,
    /// `YYYY-MM-DD`
    pub to: Option<String>,
    /// Defaults to 100, capped at 500.
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Date bounds of a validated list filter.
struct ListBounds {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<ListBounds> {
    let from = parse_optional_date(filter.from.as_deref())?;
    let to = parse_optional_date(filter.to.as_deref())?;
    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err(EngineError::InvalidDate(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    if filter.limit == Some(0) {
        return Err(EngineError::InvalidAmount(
            "limit must be greater than zero".to_string(),
        ));
    }
    // SQLite binds LIMIT/OFFSET as signed 64-bit integers.
    if filter.offset.is_some_and(|offset| i64::try_from(offset).is_err()) {
        return Err(EngineError::InvalidAmount(
            "offset out of range".to_string(),
        ));
    }
    Ok(ListBounds { from, to })
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter, bounds: &ListBounds) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter, bounds: &ListBounds) -> Self {
        if let Some(kind) = filter.kind {
            self = self.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(category_id) = filter.category_id {
            self = self.filter(transactions::Column::CategoryId.eq(category_id));
        }
        if let Some(budget_id) = filter.budget_id {
            self = self.filter(transactions::Column::BudgetId.eq(budget_id));
        }
        if let Some(from) = bounds.from {
            self = self.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = bounds.to {
            self = self.filter(transactions::Column::Date.lte(to));
        }
        self
    }
}

fn with_category(
    model: transactions::Model,
    category: Option<categories::Model>,
) -> ResultEngine<Transaction> {
    let name = category.map(|c| c.name).unwrap_or_default();
    Transaction::from_model(model, name)
}

impl Engine {
    /// Book an income or an expense.
    ///
    /// The category and budget are resolved (and created when needed) in the
    /// same DB transaction as the insert.
    pub async fn create_transaction(
        &self,
        user_id: i32,
        input: TransactionInput,
    ) -> ResultEngine<Transaction> {
        let amount = require_amount(input.amount)?;
        let kind = match input.kind.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => TransactionKind::try_from(raw)?,
            None => TransactionKind::Expense,
        };
        let date = parse_optional_date(input.date.as_deref())?.unwrap_or_else(today);
        let description = normalize_optional_text(input.description.as_deref());

        with_tx!(self, |db_tx| {
            let category = Self::resolve_category(
                &db_tx,
                user_id,
                kind,
                input.category_id,
                input.category.as_deref(),
            )
            .await?;
            let budget = Self::resolve_budget(&db_tx, user_id, input.budget_id, date).await?;

            let model = transactions::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                category_id: ActiveValue::Set(category.id),
                budget_id: ActiveValue::Set(Some(budget.id)),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                amount: ActiveValue::Set(amount),
                description: ActiveValue::Set(description),
                date: ActiveValue::Set(date),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            tracing::debug!(
                user_id,
                transaction_id = model.id,
                kind = kind.as_str(),
                amount,
                "transaction created"
            );

            Transaction::from_model(model, category.name)
        })
    }

    pub async fn transaction(&self, user_id: i32, transaction_id: i32) -> ResultEngine<Transaction> {
        let (model, category) = transactions::Entity::find_by_id(transaction_id)
            .filter(transactions::Column::UserId.eq(user_id))
            .find_also_related(categories::Entity)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("Transaction not found".to_string()))?;
        with_category(model, category)
    }

    /// Lists transactions of the user, newest first.
    pub async fn list_transactions(
        &self,
        user_id: i32,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        let bounds = validate_list_filter(filter)?;
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .min(MAX_LIST_LIMIT);

        transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .apply_tx_filters(filter, &bounds)
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .offset(filter.offset)
            .find_also_related(categories::Entity)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|(model, category)| with_category(model, category))
            .collect()
    }

    /// Partially update a transaction.
    ///
    /// Changing the type without naming a new category requires the current
    /// category to have the new type.
    pub async fn update_transaction(
        &self,
        user_id: i32,
        transaction_id: i32,
        patch: TransactionPatch,
    ) -> ResultEngine<Transaction> {
        if patch.is_empty() {
            return Err(EngineError::MissingField("No fields to update".to_string()));
        }
        let amount = patch.amount.map(|a| require_amount(Some(a))).transpose()?;
        let kind = patch
            .kind
            .as_deref()
            .map(TransactionKind::try_from)
            .transpose()?;
        let date = patch.date.as_deref().map(parse_date).transpose()?;

        with_tx!(self, |db_tx| {
            let model = Self::require_transaction(&db_tx, user_id, transaction_id).await?;
            let kind = kind.unwrap_or(TransactionKind::try_from(model.kind.as_str())?);

            let category = if patch.category_id.is_some()
                || patch
                    .category
                    .as_deref()
                    .is_some_and(|name| !name.trim().is_empty())
            {
                Self::resolve_category(
                    &db_tx,
                    user_id,
                    kind,
                    patch.category_id,
                    patch.category.as_deref(),
                )
                .await?
            } else {
                Self::resolve_category(&db_tx, user_id, kind, Some(model.category_id), None)
                    .await?
            };

            let mut active: transactions::ActiveModel = model.into();
            if let Some(budget_id) = patch.budget_id {
                let budget = Self::require_budget(&db_tx, user_id, budget_id).await?;
                active.budget_id = ActiveValue::Set(Some(budget.id));
            }
            if let Some(amount) = amount {
                active.amount = ActiveValue::Set(amount);
            }
            if let Some(date) = date {
                active.date = ActiveValue::Set(date);
            }
            if patch.description.is_some() {
                active.description =
                    ActiveValue::Set(normalize_optional_text(patch.description.as_deref()));
            }
            active.kind = ActiveValue::Set(kind.as_str().to_string());
            active.category_id = ActiveValue::Set(category.id);
            let model = active.update(&db_tx).await?;

            Transaction::from_model(model, category.name)
        })
    }

    pub async fn delete_transaction(&self, user_id: i32, transaction_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = Self::require_transaction(&db_tx, user_id, transaction_id).await?;
            model.delete(&db_tx).await?;
            Ok(())
        })
    }

    async fn require_transaction<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        transaction_id: i32,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id)
            .filter(transactions::Column::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("Transaction not found".to_string()))
    }
}
