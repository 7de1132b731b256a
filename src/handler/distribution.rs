// handler/distribution.rs
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
    dtos::{commondtos::*, distributiondtos::*},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn distribution_admin_handler() -> Router {
    Router::new()
        .route("/distributors", get(list_distributors))
        .route("/distributors/:id", get(get_distributor))
        .route("/distributors/:id/approve", post(approve_distributor))
        .route("/distributors/:id/reject", post(reject_distributor))
}

pub fn distribution_user_handler() -> Router {
    Router::new()
        .route("/apply", post(apply_distributor))
        .route("/me", get(get_my_distributor))
}

pub async fn list_distributors(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<DistributorQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (page, limit) = params.page_and_limit();
    let (distributors, total) = app_state
        .distribution_service
        .list_distributors(&params.filter(), page, limit)
        .await?;

    let data: Vec<DistributorResponseDto> = distributors.into_iter().map(Into::into).collect();
    Ok(Json(PaginatedResponse::new(data, total, page, limit)))
}

pub async fn get_distributor(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(distributor_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let distributor = app_state
        .distribution_service
        .get_distributor(distributor_id)
        .await?;

    let response: DistributorResponseDto = distributor.into();
    Ok(Json(ApiResponse::success("Distributor retrieved successfully", response)))
}

pub async fn approve_distributor(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(distributor_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let outcome = app_state
        .distribution_service
        .approve(distributor_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Distributor approval processed",
        TransitionResponseDto { id: distributor_id, outcome },
    )))
}

pub async fn reject_distributor(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(distributor_id): Path<Uuid>,
    Json(body): Json<RejectRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let outcome = app_state
        .distribution_service
        .reject(distributor_id, auth.user.id, &body.reason)
        .await?;

    Ok(Json(ApiResponse::success(
        "Distributor rejection processed",
        TransitionResponseDto { id: distributor_id, outcome },
    )))
}

pub async fn apply_distributor(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<ApplyDistributorDto>,
) -> Result<impl IntoResponse, HttpError> {
    let distributor = app_state
        .distribution_service
        .apply(auth.user.id, body.referrer_user_id)
        .await?;

    let response: DistributorResponseDto = distributor.into();
    Ok(Json(ApiResponse::success("Application submitted", response)))
}

pub async fn get_my_distributor(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let distributor = app_state
        .distribution_service
        .get_distributor_by_user(auth.user.id)
        .await?;

    let response: DistributorResponseDto = distributor.into();
    Ok(Json(ApiResponse::success("Distributor retrieved successfully", response)))
}
