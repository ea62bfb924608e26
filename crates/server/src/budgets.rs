//! Budgets API endpoints.

use api_types::{
    MessageResponse,
    budget::{BudgetListResponse, BudgetResponse, BudgetUpsert, BudgetView},
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use engine::BudgetInput;

use crate::{ApiJson, ApiPath, ServerError, acl::Principal, server::ServerState};

fn map_budget(budget: engine::Budget) -> BudgetView {
    BudgetView {
        remaining: budget.remaining(),
        id: budget.id,
        name: budget.name,
        description: budget.description,
        category_id: budget.category_id,
        category: budget.category,
        amount: budget.amount,
        spent: budget.spent,
        start_date: budget.start_date,
        end_date: budget.end_date,
        created_at: budget.created_at,
    }
}

fn budget_input(payload: BudgetUpsert) -> BudgetInput {
    BudgetInput {
        amount: payload.amount,
        name: payload.name,
        description: payload.description,
        category_id: payload.category_id,
        category: payload.category,
        start_date: payload.start_date,
        end_date: payload.end_date,
    }
}

pub async fn list(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
) -> Result<Json<BudgetListResponse>, ServerError> {
    let budgets = state
        .engine
        .list_budgets(principal.user_id)
        .await?
        .into_iter()
        .map(map_budget)
        .collect();
    Ok(Json(BudgetListResponse { budgets }))
}

pub async fn get(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiPath(budget_id): ApiPath<i32>,
) -> Result<Json<BudgetResponse>, ServerError> {
    let budget = state.engine.budget(principal.user_id, budget_id).await?;
    Ok(Json(BudgetResponse {
        budget: map_budget(budget),
    }))
}

pub async fn create(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<BudgetUpsert>,
) -> Result<(StatusCode, Json<BudgetResponse>), ServerError> {
    let budget = state
        .engine
        .create_budget(principal.user_id, budget_input(payload))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(BudgetResponse {
            budget: map_budget(budget),
        }),
    ))
}

pub async fn update(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiPath(budget_id): ApiPath<i32>,
    ApiJson(payload): ApiJson<BudgetUpsert>,
) -> Result<Json<BudgetResponse>, ServerError> {
    let budget = state
        .engine
        .update_budget(principal.user_id, budget_id, budget_input(payload))
        .await?;
    Ok(Json(BudgetResponse {
        budget: map_budget(budget),
    }))
}

pub async fn delete(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiPath(budget_id): ApiPath<i32>,
) -> Result<Json<MessageResponse>, ServerError> {
    state
        .engine
        .delete_budget(principal.user_id, budget_id)
        .await?;
    Ok(Json(MessageResponse::new("Budget deleted successfully")))
}
