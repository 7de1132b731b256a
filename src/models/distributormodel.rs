// models/distributormodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "distributor_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DistributorStatus {
    Pending,
    Approved,
    Rejected,
}

impl DistributorStatus {
    pub fn to_str(&self) -> &str {
        match self {
            DistributorStatus::Pending => "pending",
            DistributorStatus::Approved => "approved",
            DistributorStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "distributor_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DistributorLevel {
    Direct,
    Indirect,
}

/// A node in the referral tree. Balances are in fen.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Distributor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub level: DistributorLevel,
    pub status: DistributorStatus,
    pub direct_count: i32,
    pub team_count: i32,
    pub available_commission: i64,
    pub frozen_commission: i64,
    pub withdrawn_commission: i64,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Distributor {
    pub fn is_approved(&self) -> bool {
        self.status == DistributorStatus::Approved
    }
}

#[derive(Debug, Clone)]
pub struct NewDistributor {
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub level: DistributorLevel,
}

#[derive(Debug, Clone, Default)]
pub struct DistributorFilter {
    pub status: Option<DistributorStatus>,
    pub parent_id: Option<Uuid>,
}

