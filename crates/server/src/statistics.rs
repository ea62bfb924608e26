//! Statistics API endpoints

use api_types::stats::{CategoryStat, CategoryStatsResponse, MonthlyStats, StatsQuery};
use axum::{Extension, Json, extract::State};
use engine::TransactionKind;

use crate::{ApiQuery, ServerError, acl::Principal, map_kind, server::ServerState};

/// Monthly income, expenses and balance. Both `month` and `year` are required.
pub async fn monthly(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<MonthlyStats>, ServerError> {
    let (Some(month), Some(year)) = (query.month, query.year) else {
        return Err(ServerError::BadRequest(
            "month and year are required".to_string(),
        ));
    };

    let totals = state
        .engine
        .monthly_totals(principal.user_id, year, month)
        .await?;
    Ok(Json(MonthlyStats {
        month: totals.month,
        year: totals.year,
        total_income: totals.total_income,
        total_expense: totals.total_expense,
        balance: totals.balance(),
    }))
}

/// Totals per category, optionally restricted to one month and one type.
pub async fn by_category(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<CategoryStatsResponse>, ServerError> {
    let period = match (query.year, query.month) {
        (Some(year), Some(month)) => Some((year, month)),
        (None, None) => None,
        _ => {
            return Err(ServerError::BadRequest(
                "month and year must be given together".to_string(),
            ));
        }
    };
    let kind = query
        .kind
        .as_deref()
        .map(TransactionKind::try_from)
        .transpose()?;

    let stats = state
        .engine
        .category_totals(principal.user_id, period, kind)
        .await?
        .into_iter()
        .map(|total| CategoryStat {
            category_id: total.category_id,
            category: total.category,
            kind: map_kind(total.kind),
            total: total.total,
        })
        .collect();
    Ok(Json(CategoryStatsResponse { stats }))
}
