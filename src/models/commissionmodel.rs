// models/commissionmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "commission_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CommissionType {
    Direct,
    Indirect,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "commission_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
    Pending,
    Settled,
}

/// One commission fact produced by an order. Only `status` and
/// `settled_at` ever change after insert.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Commission {
    pub id: Uuid,
    pub distributor_id: Uuid,
    pub order_id: Uuid,
    pub from_user_id: Uuid,
    pub commission_type: CommissionType,
    pub order_amount: i64,
    pub rate: f64,
    pub amount: i64,
    pub status: CommissionStatus,
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCommission {
    pub distributor_id: Uuid,
    pub order_id: Uuid,
    pub from_user_id: Uuid,
    pub commission_type: CommissionType,
    pub order_amount: i64,
    pub rate: f64,
    pub amount: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CommissionFilter {
    pub distributor_id: Option<Uuid>,
    pub status: Option<CommissionStatus>,
    pub commission_type: Option<CommissionType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommissionStats {
    pub approved_distributors: i64,
    pub pending_distributors: i64,
    pub total_commission: i64,
    pub total_withdrawn: i64,
}

/// Tunables for commission accrual and withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionConfig {
    pub direct_rate: f64,
    pub indirect_rate: f64,
    /// fen
    pub min_withdraw: i64,
    pub withdraw_fee: f64,
    pub settle_delay_days: i32,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            direct_rate: 0.10,
            indirect_rate: 0.05,
            min_withdraw: 1_000,
            withdraw_fee: 0.006,
            settle_delay_days: 7,
        }
    }
}

/// A stored config version. The current version is whichever one the
/// single-row `commission_setting_current` pointer references.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommissionSetting {
    pub version: i64,
    pub direct_rate: f64,
    pub indirect_rate: f64,
    pub min_withdraw: i64,
    pub withdraw_fee: f64,
    pub settle_delay_days: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl CommissionSetting {
    pub fn config(&self) -> CommissionConfig {
        CommissionConfig {
            direct_rate: self.direct_rate,
            indirect_rate: self.indirect_rate,
            min_withdraw: self.min_withdraw,
            withdraw_fee: self.withdraw_fee,
            settle_delay_days: self.settle_delay_days,
        }
    }
}

/// Amount owed for `order_amount` at `rate`, rounded to the nearest fen.
pub fn commission_amount(order_amount: i64, rate: f64) -> i64 {
    (order_amount as f64 * rate).round() as i64
}
