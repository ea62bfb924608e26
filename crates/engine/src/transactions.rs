//! Transaction primitives.
//!
//! A `Transaction` is a single income or expense booked on a category and,
//! unless its budget has been deleted, on a budget.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidKind(format!(
                "Invalid transaction type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,
    pub budget_id: Option<i32>,
    pub kind: String,
    pub amount: i64,
    pub description: Option<String>,
    pub date: Date,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Budget,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: i32,
    pub user_id: i32,
    pub kind: TransactionKind,
    pub amount: i64,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub category_id: i32,
    /// Display name of `category_id`.
    pub category: String,
    pub budget_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn from_model(model: Model, category: String) -> Result<Self, EngineError> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: model.amount,
            description: model.description,
            date: model.date,
            category_id: model.category_id,
            category,
            budget_id: model.budget_id,
            created_at: model.created_at,
        })
    }
}

/// Input of [`Engine::create_transaction`](crate::Engine::create_transaction).
#[derive(Clone, Debug, Default)]
pub struct TransactionInput {
    pub amount: Option<i64>,
    /// `income` or `expense`; defaults to `expense`.
    pub kind: Option<String>,
    pub description: Option<String>,
    /// `YYYY-MM-DD`; defaults to today.
    pub date: Option<String>,
    pub category_id: Option<i32>,
    /// Category name, used when `category_id` is absent.
    pub category: Option<String>,
    pub budget_id: Option<i32>,
}

/// Partial update of a transaction. `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct TransactionPatch {
    pub amount: Option<i64>,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub category_id: Option<i32>,
    pub category: Option<String>,
    pub budget_id: Option<i32>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.kind.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.category_id.is_none()
            && self.category.is_none()
            && self.budget_id.is_none()
    }
}
