// handler/setting.rs
use std::sync::Arc;

use axum::{
    extract::Query,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{commissiondtos::*, commondtos::ApiResponse},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

const DEFAULT_HISTORY_LIMIT: i64 = 20;

pub fn setting_handler() -> Router {
    Router::new()
        .route("/config", get(get_config).put(update_config))
        .route("/config/history", get(get_config_history))
}

pub async fn get_config(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let config = app_state.setting_service.get_config().await?;

    let response: CommissionConfigDto = config.into();
    Ok(Json(ApiResponse::success("Commission config retrieved successfully", response)))
}

pub async fn update_config(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CommissionConfigDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    let config = body
        .to_config()
        .ok_or_else(|| HttpError::bad_request("Invalid minimum withdrawal amount"))?;

    let setting = app_state
        .setting_service
        .update_config(config, auth.user.id)
        .await?;

    let response: CommissionSettingDto = setting.into();
    Ok(Json(ApiResponse::success("Commission config updated", response)))
}

pub async fn get_config_history(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<ConfigHistoryQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let history = app_state
        .setting_service
        .get_config_history(params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await?;

    let response: Vec<CommissionSettingDto> = history.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success("Commission config history retrieved successfully", response)))
}
