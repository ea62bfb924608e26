//! Transactions API endpoints.

use api_types::{
    MessageResponse,
    transaction::{
        TransactionListQuery, TransactionListResponse, TransactionNew, TransactionResponse,
        TransactionUpdate, TransactionView,
    },
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use engine::{TransactionInput, TransactionKind, TransactionListFilter, TransactionPatch};

use crate::{ApiJson, ApiPath, ApiQuery, ServerError, acl::Principal, map_kind, server::ServerState};

fn map_transaction(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: map_kind(tx.kind),
        amount: tx.amount,
        description: tx.description,
        date: tx.date,
        category_id: tx.category_id,
        category: tx.category,
        budget_id: tx.budget_id,
        created_at: tx.created_at,
    }
}

fn list_filter(query: TransactionListQuery) -> Result<TransactionListFilter, ServerError> {
    Ok(TransactionListFilter {
        kind: query
            .kind
            .as_deref()
            .map(TransactionKind::try_from)
            .transpose()?,
        category_id: query.category_id,
        budget_id: query.budget_id,
        from: query.from,
        to: query.to,
        limit: query.limit,
        offset: query.offset,
    })
}

pub async fn list(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = list_filter(query)?;
    let transactions = state
        .engine
        .list_transactions(principal.user_id, &filter)
        .await?
        .into_iter()
        .map(map_transaction)
        .collect();
    Ok(Json(TransactionListResponse { transactions }))
}

pub async fn get(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiPath(transaction_id): ApiPath<i32>,
) -> Result<Json<TransactionResponse>, ServerError> {
    let tx = state
        .engine
        .transaction(principal.user_id, transaction_id)
        .await?;
    Ok(Json(TransactionResponse {
        message: None,
        transaction: map_transaction(tx),
    }))
}

pub async fn create(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionResponse>), ServerError> {
    let tx = state
        .engine
        .create_transaction(
            principal.user_id,
            TransactionInput {
                amount: payload.amount,
                kind: payload.kind,
                description: payload.description,
                date: payload.date,
                category_id: payload.category_id,
                category: payload.category,
                budget_id: payload.budget_id,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse {
            message: Some("Transaction created successfully".to_string()),
            transaction: map_transaction(tx),
        }),
    ))
}

pub async fn update(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiPath(transaction_id): ApiPath<i32>,
    ApiJson(payload): ApiJson<TransactionUpdate>,
) -> Result<Json<TransactionResponse>, ServerError> {
    let tx = state
        .engine
        .update_transaction(
            principal.user_id,
            transaction_id,
            TransactionPatch {
                amount: payload.amount,
                kind: payload.kind,
                description: payload.description,
                date: payload.date,
                category_id: payload.category_id,
                category: payload.category,
                budget_id: payload.budget_id,
            },
        )
        .await?;
    Ok(Json(TransactionResponse {
        message: Some("Transaction updated successfully".to_string()),
        transaction: map_transaction(tx),
    }))
}

pub async fn delete(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiPath(transaction_id): ApiPath<i32>,
) -> Result<Json<MessageResponse>, ServerError> {
    state
        .engine
        .delete_transaction(principal.user_id, transaction_id)
        .await?;
    Ok(Json(MessageResponse::new("Transaction deleted successfully")))
}
