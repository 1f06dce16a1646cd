use axum::{ extract::{ Path, Query, State }, Json };
use serde::Deserialize;

use crate::db::entity::transaction;
use crate::db::TransactionFilter;
use crate::enums::ActivityType;
use crate::error::Result;
use crate::services::transaction_service::{ AnalyticsSummary, ReconciliationReport };

use super::{ AppState, AuthUser };

#[derive(Deserialize)]
pub struct TransactionQueryParams {
    pub activity: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
pub struct SummaryParams {
    pub days: Option<i64>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<TransactionQueryParams>
) -> Result<Json<Vec<transaction::Model>>> {
    let activity = params.activity
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(str::parse::<ActivityType>)
        .transpose()?;

    let transactions = state.transaction_service.list(user.user_id, user.mode, TransactionFilter {
        activity,
        limit: params.limit,
        offset: params.offset,
    }).await?;

    Ok(Json(transactions))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(reference): Path<String>
) -> Result<Json<transaction::Model>> {
    let transaction = state.transaction_service.get_by_reference(
        user.user_id,
        user.mode,
        &reference
    ).await?;
    Ok(Json(transaction))
}

pub async fn analytics_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<SummaryParams>
) -> Result<Json<AnalyticsSummary>> {
    let summary = state.transaction_service.summary(user.user_id, user.mode, params.days).await?;
    Ok(Json(summary))
}

pub async fn reconcile(
    State(state): State<AppState>,
    user: AuthUser
) -> Result<Json<ReconciliationReport>> {
    let report = state.transaction_service.reconcile(user.user_id, user.mode).await?;
    Ok(Json(report))
}
