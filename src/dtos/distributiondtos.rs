// dtos/distributiondtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::commondtos::DEFAULT_PAGE_SIZE,
    models::distributormodel::*,
    utils::currency::fen_to_yuan,
};

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct ApplyDistributorDto {
    pub referrer_user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct DistributorQueryDto {
    pub status: Option<DistributorStatus>,
    pub parent_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

impl DistributorQueryDto {
    pub fn filter(&self) -> DistributorFilter {
        DistributorFilter {
            status: self.status,
            parent_id: self.parent_id,
        }
    }

    pub fn page_and_limit(&self) -> (u32, usize) {
        (self.page.unwrap_or(1), self.limit.unwrap_or(DEFAULT_PAGE_SIZE))
    }
}

// Commission balances in yuan
#[derive(Debug, Serialize, Deserialize)]
pub struct DistributorResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub level: DistributorLevel,
    pub status: DistributorStatus,
    pub direct_count: i32,
    pub team_count: i32,
    pub available_commission: f64,
    pub frozen_commission: f64,
    pub withdrawn_commission: f64,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub reject_reason: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Distributor> for DistributorResponseDto {
    fn from(d: Distributor) -> Self {
        Self {
            id: d.id,
            user_id: d.user_id,
            parent_id: d.parent_id,
            level: d.level,
            status: d.status,
            direct_count: d.direct_count,
            team_count: d.team_count,
            available_commission: fen_to_yuan(d.available_commission),
            frozen_commission: fen_to_yuan(d.frozen_commission),
            withdrawn_commission: fen_to_yuan(d.withdrawn_commission),
            approved_at: d.approved_at,
            approved_by: d.approved_by,
            reject_reason: d.reject_reason,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}
