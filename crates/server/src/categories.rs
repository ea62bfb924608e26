//! Categories API endpoints.

use api_types::{
    MessageResponse,
    category::{
        CategoryListQuery, CategoryListResponse, CategoryNew, CategoryResponse, CategoryUpdate,
        CategoryView,
    },
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use engine::{EngineError, TransactionKind};

use crate::{ApiJson, ApiPath, ApiQuery, ServerError, acl::Principal, map_kind, server::ServerState};

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        kind: map_kind(category.kind),
    }
}

pub async fn list(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<CategoryListQuery>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let kind = query
        .kind
        .as_deref()
        .map(|kind| {
            TransactionKind::try_from(kind)
                .map_err(|_| EngineError::InvalidKind("Invalid category type".to_string()))
        })
        .transpose()?;

    let categories = state
        .engine
        .list_categories(principal.user_id, kind)
        .await?
        .into_iter()
        .map(map_category)
        .collect();
    Ok(Json(CategoryListResponse { categories }))
}

pub async fn create(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryResponse>), ServerError> {
    let category = state
        .engine
        .create_category(
            principal.user_id,
            payload.name.as_deref().unwrap_or_default(),
            payload.kind.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            message: Some("Category created".to_string()),
            category: map_category(category),
        }),
    ))
}

pub async fn update(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiPath(category_id): ApiPath<i32>,
    ApiJson(payload): ApiJson<CategoryUpdate>,
) -> Result<Json<CategoryResponse>, ServerError> {
    let category = state
        .engine
        .update_category(
            principal.user_id,
            category_id,
            payload.name.as_deref(),
            payload.kind.as_deref(),
        )
        .await?;
    Ok(Json(CategoryResponse {
        message: None,
        category: map_category(category),
    }))
}

pub async fn delete(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiPath(category_id): ApiPath<i32>,
) -> Result<Json<MessageResponse>, ServerError> {
    state
        .engine
        .delete_category(principal.user_id, category_id)
        .await?;
    Ok(Json(MessageResponse::new("Category deleted")))
}
