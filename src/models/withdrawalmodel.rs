// models/withdrawalmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "withdrawal_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalType {
    Commission,
    Balance,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "withdraw_channel", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WithdrawTo {
    Wechat,
    Bank,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "withdrawal_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Processing,
    Success,
}

impl WithdrawalStatus {
    /// The only state a withdrawal may move to `self` from.
    pub fn required_prior(&self) -> Option<WithdrawalStatus> {
        match self {
            WithdrawalStatus::Pending => None,
            WithdrawalStatus::Approved | WithdrawalStatus::Rejected => Some(WithdrawalStatus::Pending),
            WithdrawalStatus::Processing => Some(WithdrawalStatus::Approved),
            WithdrawalStatus::Success => Some(WithdrawalStatus::Processing),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WithdrawalStatus::Rejected | WithdrawalStatus::Success)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Withdrawal {
    pub id: Uuid,
    pub withdrawal_no: String,
    pub user_id: Uuid,
    pub withdrawal_type: WithdrawalType,
    pub amount: i64, // in fen
    pub fee: i64,
    pub actual_amount: i64,
    pub withdraw_to: WithdrawTo,
    pub status: WithdrawalStatus,
    pub operator_id: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub withdrawal_no: String,
    pub user_id: Uuid,
    pub withdrawal_type: WithdrawalType,
    pub amount: i64,
    pub fee: i64,
    pub actual_amount: i64,
    pub withdraw_to: WithdrawTo,
}

#[derive(Debug, Clone, Default)]
pub struct WithdrawalFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<WithdrawalStatus>,
    pub withdrawal_type: Option<WithdrawalType>,
}

/// Plain-balance ledger, used for `WithdrawalType::Balance`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserWallet {
    pub user_id: Uuid,
    pub balance: i64,
    pub frozen_balance: i64,
    pub total_withdrawn: i64,
    pub updated_at: DateTime<Utc>,
}

/// Signed deltas against a (available, frozen, withdrawn) triple. For a
/// distributor that is the commission columns, for a wallet it is
/// `balance`, `frozen_balance` and `total_withdrawn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceMove {
    pub available: i64,
    pub frozen: i64,
    pub withdrawn: i64,
}

impl BalanceMove {
    pub fn freeze(amount: i64) -> Self {
        Self { available: -amount, frozen: amount, withdrawn: 0 }
    }

    pub fn unfreeze(amount: i64) -> Self {
        Self { available: amount, frozen: -amount, withdrawn: 0 }
    }

    /// Drop `frozen` from the frozen pot and record `withdrawn` as paid out.
    pub fn pay_out(frozen: i64, withdrawn: i64) -> Self {
        Self { available: 0, frozen: -frozen, withdrawn }
    }

    pub fn credit(amount: i64) -> Self {
        Self { available: amount, frozen: 0, withdrawn: 0 }
    }
}

pub fn generate_withdrawal_no() -> String {
    use rand::Rng;

    let suffix: u32 = rand::rng().random_range(0..1_000_000);
    format!("WD{}{:06}", Utc::now().format("%Y%m%d%H%M%S%3f"), suffix)
}
