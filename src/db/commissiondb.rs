// db/commissiondb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::{Error, Row};
use uuid::Uuid;

use super::DBClient;
use crate::models::commissionmodel::*;
use crate::utils::decimal::BigDecimalHelpers;

#[async_trait]
pub trait CommissionExt: Send + Sync {
    /// `RowNotFound` when there is no such commission.
    async fn get_commission(&self, commission_id: Uuid) -> Result<Commission, Error>;

    async fn get_commissions(
        &self,
        filter: &CommissionFilter,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Commission>, Error>;

    async fn count_commissions(&self, filter: &CommissionFilter) -> Result<i64, Error>;

    async fn get_commission_stats(&self) -> Result<CommissionStats, Error>;
}

#[async_trait]
impl CommissionExt for DBClient {
    async fn get_commission(&self, commission_id: Uuid) -> Result<Commission, Error> {
        sqlx::query_as::<_, Commission>(
            r#"
            SELECT
                id,
                distributor_id,
                order_id,
                from_user_id,
                commission_type,
                order_amount,
                rate,
                amount,
                status,
                settled_at,
                created_at
            FROM commissions
            WHERE id = $1
            "#
        )
        .bind(commission_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_commissions(
        &self,
        filter: &CommissionFilter,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Commission>, Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        sqlx::query_as::<_, Commission>(
            r#"
            SELECT
                id,
                distributor_id,
                order_id,
                from_user_id,
                commission_type,
                order_amount,
                rate,
                amount,
                status,
                settled_at,
                created_at
            FROM commissions
            WHERE ($1::uuid IS NULL OR distributor_id = $1)
              AND ($2::commission_status IS NULL OR status = $2)
              AND ($3::commission_type IS NULL OR commission_type = $3)
              AND ($4::timestamptz IS NULL OR created_at >= $4)
              AND ($5::timestamptz IS NULL OR created_at <= $5)
            ORDER BY created_at DESC
            LIMIT $6 OFFSET $7
            "#
        )
        .bind(filter.distributor_id)
        .bind(filter.status)
        .bind(filter.commission_type)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_commissions(&self, filter: &CommissionFilter) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM commissions
            WHERE ($1::uuid IS NULL OR distributor_id = $1)
              AND ($2::commission_status IS NULL OR status = $2)
              AND ($3::commission_type IS NULL OR commission_type = $3)
              AND ($4::timestamptz IS NULL OR created_at >= $4)
              AND ($5::timestamptz IS NULL OR created_at <= $5)
            "#
        )
        .bind(filter.distributor_id)
        .bind(filter.status)
        .bind(filter.commission_type)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_commission_stats(&self) -> Result<CommissionStats, Error> {
        let counts = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'approved'::distributor_status) AS approved,
                COUNT(*) FILTER (WHERE status = 'pending'::distributor_status) AS pending
            FROM distributors
            "#
        )
        .fetch_one(&self.pool)
        .await?;

        let total_commission = sqlx::query(
            "SELECT SUM(amount) AS total FROM commissions"
        )
        .fetch_one(&self.pool)
        .await?;

        let total_withdrawn = sqlx::query(
            r#"
            SELECT SUM(amount) AS total FROM withdrawals
            WHERE status = 'success'::withdrawal_status
              AND withdrawal_type = 'commission'::withdrawal_type
            "#
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CommissionStats {
            approved_distributors: counts.get::<i64, _>("approved"),
            pending_distributors: counts.get::<i64, _>("pending"),
            total_commission: total_commission.get::<Option<BigDecimal>, _>("total").to_i64_or_zero(),
            total_withdrawn: total_withdrawn.get::<Option<BigDecimal>, _>("total").to_i64_or_zero(),
        })
    }
}
