//! Budgets: a spending limit over an inclusive date range, optionally tied
//! to one expense category.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub category_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub amount: i64,
    pub start_date: Date,
    pub end_date: Date,
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
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
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

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Budget {
    pub id: i32,
    pub user_id: i32,
    pub category_id: Option<i32>,
    /// Display name of `category_id`, when set.
    pub category: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub amount: i64,
    /// Sum of the expense transactions booked on this budget.
    pub spent: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Budget {
    pub(crate) fn from_model(model: Model, category: Option<String>, spent: i64) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            category_id: model.category_id,
            category,
            name: model.name,
            description: model.description,
            amount: model.amount,
            spent,
            start_date: model.start_date,
            end_date: model.end_date,
            created_at: model.created_at,
        }
    }

    pub fn remaining(&self) -> i64 {
        self.amount - self.spent
    }
}

/// Input of [`Engine::create_budget`](crate::Engine::create_budget) and
/// [`Engine::update_budget`](crate::Engine::update_budget).
///
/// Dates are `YYYY-MM-DD` strings; missing ones default to the current month.
#[derive(Clone, Debug, Default)]
pub struct BudgetInput {
    pub amount: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    /// Category name, resolved (or created) as an expense category.
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
