// dtos/commissiondtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::commondtos::DEFAULT_PAGE_SIZE,
    models::commissionmodel::*,
    utils::currency::{fen_to_yuan, yuan_to_fen},
};

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct CommissionQueryDto {
    pub distributor_id: Option<Uuid>,
    pub status: Option<CommissionStatus>,
    pub commission_type: Option<CommissionType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

impl CommissionQueryDto {
    pub fn filter(&self) -> CommissionFilter {
        CommissionFilter {
            distributor_id: self.distributor_id,
            status: self.status,
            commission_type: self.commission_type,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    pub fn page_and_limit(&self) -> (u32, usize) {
        (self.page.unwrap_or(1), self.limit.unwrap_or(DEFAULT_PAGE_SIZE))
    }
}

/// Posted by the order service once an order is paid.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RecordOrderCommissionDto {
    pub order_id: Uuid,
    pub from_user_id: Uuid,
    #[validate(range(min = 0.01, max = 10000000.0, message = "Order amount must be between ¥0.01 and ¥10,000,000"))]
    pub order_amount: f64, // In yuan
    pub referrer_distributor_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommissionResponseDto {
    pub id: Uuid,
    pub distributor_id: Uuid,
    pub order_id: Uuid,
    pub from_user_id: Uuid,
    pub commission_type: CommissionType,
    pub order_amount: f64,
    pub rate: f64,
    pub amount: f64,
    pub status: CommissionStatus,
    pub settled_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Commission> for CommissionResponseDto {
    fn from(c: Commission) -> Self {
        Self {
            id: c.id,
            distributor_id: c.distributor_id,
            order_id: c.order_id,
            from_user_id: c.from_user_id,
            commission_type: c.commission_type,
            order_amount: fen_to_yuan(c.order_amount),
            rate: c.rate,
            amount: fen_to_yuan(c.amount),
            status: c.status,
            settled_at: c.settled_at,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommissionStatsDto {
    pub approved_distributors: i64,
    pub pending_distributors: i64,
    pub total_commission: f64,
    pub total_withdrawn: f64,
}

impl From<CommissionStats> for CommissionStatsDto {
    fn from(s: CommissionStats) -> Self {
        Self {
            approved_distributors: s.approved_distributors,
            pending_distributors: s.pending_distributors,
            total_commission: fen_to_yuan(s.total_commission),
            total_withdrawn: fen_to_yuan(s.total_withdrawn),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettleDueResponseDto {
    pub settled: u64,
}

/// Commission config as exchanged over HTTP; `min_withdraw` is in yuan.
/// Rate rules are checked by the setting service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Validate)]
pub struct CommissionConfigDto {
    pub direct_rate: f64,
    pub indirect_rate: f64,
    #[validate(range(min = 0.0, max = 1000000.0, message = "Minimum withdrawal must be between ¥0 and ¥1,000,000"))]
    pub min_withdraw: f64,
    pub withdraw_fee: f64,
    pub settle_delay_days: i32,
}

impl From<CommissionConfig> for CommissionConfigDto {
    fn from(c: CommissionConfig) -> Self {
        Self {
            direct_rate: c.direct_rate,
            indirect_rate: c.indirect_rate,
            min_withdraw: fen_to_yuan(c.min_withdraw),
            withdraw_fee: c.withdraw_fee,
            settle_delay_days: c.settle_delay_days,
        }
    }
}

impl CommissionConfigDto {
    /// `None` when `min_withdraw` has no fen representation.
    pub fn to_config(&self) -> Option<CommissionConfig> {
        Some(CommissionConfig {
            direct_rate: self.direct_rate,
            indirect_rate: self.indirect_rate,
            min_withdraw: yuan_to_fen(self.min_withdraw)?,
            withdraw_fee: self.withdraw_fee,
            settle_delay_days: self.settle_delay_days,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommissionSettingDto {
    pub version: i64,
    #[serde(flatten)]
    pub config: CommissionConfigDto,
    pub created_by: Option<Uuid>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<CommissionSetting> for CommissionSettingDto {
    fn from(s: CommissionSetting) -> Self {
        Self {
            version: s.version,
            config: s.config().into(),
            created_by: s.created_by,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct ConfigHistoryQueryDto {
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}
