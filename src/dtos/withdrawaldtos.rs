// dtos/withdrawaldtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::commondtos::DEFAULT_PAGE_SIZE,
    models::withdrawalmodel::*,
    utils::currency::fen_to_yuan,
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct WithdrawalRequestDto {
    pub withdrawal_type: WithdrawalType,
    #[validate(range(min = 0.01, max = 1000000.0, message = "Amount must be between ¥0.01 and ¥1,000,000"))]
    pub amount: f64, // In yuan
    pub withdraw_to: WithdrawTo,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct WithdrawalQueryDto {
    pub user_id: Option<Uuid>,
    pub status: Option<WithdrawalStatus>,
    pub withdrawal_type: Option<WithdrawalType>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

impl WithdrawalQueryDto {
    pub fn filter(&self) -> WithdrawalFilter {
        WithdrawalFilter {
            user_id: self.user_id,
            status: self.status,
            withdrawal_type: self.withdrawal_type,
        }
    }

    pub fn page_and_limit(&self) -> (u32, usize) {
        (self.page.unwrap_or(1), self.limit.unwrap_or(DEFAULT_PAGE_SIZE))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawalResponseDto {
    pub id: Uuid,
    pub withdrawal_no: String,
    pub user_id: Uuid,
    pub withdrawal_type: WithdrawalType,
    pub amount: f64,
    pub fee: f64,
    pub actual_amount: f64,
    pub withdraw_to: WithdrawTo,
    pub status: WithdrawalStatus,
    pub is_final: bool,
    pub operator_id: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub reject_reason: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResponseDto {
    fn from(w: Withdrawal) -> Self {
        Self {
            id: w.id,
            withdrawal_no: w.withdrawal_no,
            user_id: w.user_id,
            withdrawal_type: w.withdrawal_type,
            amount: fen_to_yuan(w.amount),
            fee: fen_to_yuan(w.fee),
            actual_amount: fen_to_yuan(w.actual_amount),
            withdraw_to: w.withdraw_to,
            is_final: w.status.is_terminal(),
            status: w.status,
            operator_id: w.operator_id,
            processed_at: w.processed_at,
            reject_reason: w.reject_reason,
            created_at: w.created_at,
        }
    }
}
