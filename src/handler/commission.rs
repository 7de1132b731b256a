// handler/commission.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{commissiondtos::*, commondtos::*},
    error::HttpError,
    utils::currency::yuan_to_fen,
    AppState,
};

pub fn commission_handler() -> Router {
    Router::new()
        .route("/commissions", get(list_commissions).post(record_order_commission))
        .route("/commissions/stats", get(get_commission_stats))
        .route("/commissions/settle-due", post(settle_due_commissions))
        .route("/commissions/:id/settle", post(settle_commission))
}

pub async fn list_commissions(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<CommissionQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (page, limit) = params.page_and_limit();
    let (commissions, total) = app_state
        .commission_service
        .list_commissions(&params.filter(), page, limit)
        .await?;

    let data: Vec<CommissionResponseDto> = commissions.into_iter().map(Into::into).collect();
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}

pub async fn get_commission_stats(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.commission_service.get_statistics().await?;

    let response: CommissionStatsDto = stats.into();
    Ok(Json(ApiResponse::success("Commission statistics retrieved successfully", response)))
}

pub async fn record_order_commission(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RecordOrderCommissionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let amount = yuan_to_fen(body.order_amount)
        .ok_or_else(|| HttpError::bad_request("Invalid order amount"))?;

    let commissions = app_state
        .commission_service
        .record_order_commission(
            body.order_id,
            body.from_user_id,
            amount,
            body.referrer_distributor_id,
        )
        .await?;

    let response: Vec<CommissionResponseDto> = commissions.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success("Order commission recorded", response)))
}

pub async fn settle_commission(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(commission_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let outcome = app_state
        .commission_service
        .settle_commission(commission_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Commission settlement processed",
        TransitionResponseDto { id: commission_id, outcome },
    )))
}

pub async fn settle_due_commissions(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let settled = app_state
        .commission_service
        .settle_due_commissions(Utc::now())
        .await?;

    Ok(Json(ApiResponse::success(
        "Due commissions settled",
        SettleDueResponseDto { settled },
    )))
}
