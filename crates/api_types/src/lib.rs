//! JSON bodies exchanged with the Momono HTTP API.
//!
//! Amounts are whole currency units. Dates are `YYYY-MM-DD` strings on the
//! way in (the engine validates them) and [`NaiveDate`] on the way out.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

pub mod auth {
    use super::*;
    use crate::user::UserView;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub password: String,
        #[serde(default)]
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub password: String,
    }

    /// Returned by register and login.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthResponse {
        /// HS256 bearer token.
        pub token: String,
        pub user: UserView,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i32,
        pub email: String,
        pub name: String,
        pub is_admin: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        pub name: Option<String>,
        pub password: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserResponse {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub message: Option<String>,
        pub user: UserView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserListResponse {
        pub users: Vec<UserView>,
    }
}

pub mod budget {
    use super::*;

    /// Create and update body. `amount` is mandatory for both.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetUpsert {
        pub amount: Option<i64>,
        pub name: Option<String>,
        pub description: Option<String>,
        pub category_id: Option<i32>,
        /// Expense category name, created when unknown.
        pub category: Option<String>,
        pub start_date: Option<String>,
        pub end_date: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: i32,
        pub name: String,
        pub description: Option<String>,
        pub category_id: Option<i32>,
        pub category: Option<String>,
        pub amount: i64,
        /// Sum of the expenses booked on this budget.
        pub spent: i64,
        pub remaining: i64,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetResponse {
        pub budget: BudgetView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetListResponse {
        pub budgets: Vec<BudgetView>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryListQuery {
        #[serde(rename = "type")]
        pub kind: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: i32,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryResponse {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub message: Option<String>,
        pub category: CategoryView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub amount: Option<i64>,
        /// `income` or `expense`, defaults to `expense`.
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub description: Option<String>,
        pub date: Option<String>,
        pub category_id: Option<i32>,
        pub category: Option<String>,
        pub budget_id: Option<i32>,
    }

    /// Partial update; absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub amount: Option<i64>,
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub description: Option<String>,
        pub date: Option<String>,
        pub category_id: Option<i32>,
        pub category: Option<String>,
        pub budget_id: Option<i32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub category_id: Option<i32>,
        pub budget_id: Option<i32>,
        /// Inclusive lower bound, `YYYY-MM-DD`.
        pub from: Option<String>,
        /// Inclusive upper bound, `YYYY-MM-DD`.
        pub to: Option<String>,
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i32,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub amount: i64,
        pub description: Option<String>,
        pub date: NaiveDate,
        pub category_id: i32,
        pub category: String,
        pub budget_id: Option<i32>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionResponse {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub message: Option<String>,
        pub transaction: TransactionView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }
}

pub mod stats {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StatsQuery {
        pub month: Option<u32>,
        pub year: Option<i32>,
        /// Only for by-category stats.
        #[serde(rename = "type")]
        pub kind: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyStats {
        pub month: u32,
        pub year: i32,
        pub total_income: i64,
        pub total_expense: i64,
        pub balance: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryStat {
        pub category_id: i32,
        pub category: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub total: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryStatsResponse {
        pub stats: Vec<CategoryStat>,
    }
}

pub mod notification {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationView {
        pub id: i32,
        pub message: String,
        /// Day the notification was issued.
        pub date: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationListResponse {
        pub notifications: Vec<NotificationView>,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Banner {
        pub name: String,
        pub version: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
    }
}
