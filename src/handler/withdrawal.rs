// handler/withdrawal.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{commondtos::*, withdrawaldtos::*},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    utils::currency::yuan_to_fen,
    AppState,
};

pub fn withdrawal_admin_handler() -> Router {
    Router::new()
        .route("/withdrawals", get(list_withdrawals))
        .route("/withdrawals/:id", get(get_withdrawal))
        .route("/withdrawals/:id/approve", post(approve_withdrawal))
        .route("/withdrawals/:id/reject", post(reject_withdrawal))
        .route("/withdrawals/:id/process", post(process_withdrawal))
        .route("/withdrawals/:id/complete", post(complete_withdrawal))
}

pub fn withdrawal_user_handler() -> Router {
    Router::new()
        .route("/withdrawals", get(list_my_withdrawals).post(request_withdrawal))
}

pub async fn list_withdrawals(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<WithdrawalQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (page, limit) = params.page_and_limit();
    let (withdrawals, total) = app_state
        .withdrawal_service
        .list_withdrawals(&params.filter(), page, limit)
        .await?;

    let data: Vec<WithdrawalResponseDto> = withdrawals.into_iter().map(Into::into).collect();
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}

pub async fn get_withdrawal(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(withdrawal_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let withdrawal = app_state
        .withdrawal_service
        .get_withdrawal(withdrawal_id)
        .await?;

    let response: WithdrawalResponseDto = withdrawal.into();
    Ok(Json(ApiResponse::success("Withdrawal retrieved successfully", response)))
}

pub async fn approve_withdrawal(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(withdrawal_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let outcome = app_state
        .withdrawal_service
        .approve(withdrawal_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Withdrawal approval processed",
        TransitionResponseDto { id: withdrawal_id, outcome },
    )))
}

pub async fn reject_withdrawal(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(withdrawal_id): Path<Uuid>,
    Json(body): Json<RejectRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let outcome = app_state
        .withdrawal_service
        .reject(withdrawal_id, auth.user.id, &body.reason)
        .await?;

    Ok(Json(ApiResponse::success(
        "Withdrawal rejection processed",
        TransitionResponseDto { id: withdrawal_id, outcome },
    )))
}

pub async fn process_withdrawal(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(withdrawal_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let outcome = app_state
        .withdrawal_service
        .process(withdrawal_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Withdrawal marked as processing",
        TransitionResponseDto { id: withdrawal_id, outcome },
    )))
}

pub async fn complete_withdrawal(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(withdrawal_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let outcome = app_state
        .withdrawal_service
        .complete(withdrawal_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Withdrawal completion processed",
        TransitionResponseDto { id: withdrawal_id, outcome },
    )))
}

pub async fn request_withdrawal(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<WithdrawalRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let amount = yuan_to_fen(body.amount)
        .ok_or_else(|| HttpError::bad_request("Invalid withdrawal amount"))?;

    let withdrawal = app_state
        .withdrawal_service
        .request_withdrawal(
            auth.user.id,
            body.withdrawal_type,
            amount,
            body.withdraw_to,
        )
        .await?;

    let response: WithdrawalResponseDto = withdrawal.into();
    Ok(Json(ApiResponse::success("Withdrawal request submitted", response)))
}

pub async fn list_my_withdrawals(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<WithdrawalQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let mut filter = params.filter();
    filter.user_id = Some(auth.user.id);

    let (page, limit) = params.page_and_limit();
    let (withdrawals, total) = app_state
        .withdrawal_service
        .list_withdrawals(&filter, page, limit)
        .await?;

    let data: Vec<WithdrawalResponseDto> = withdrawals.into_iter().map(Into::into).collect();
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}
