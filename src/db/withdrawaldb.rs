// db/withdrawaldb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::DBClient;
use crate::models::withdrawalmodel::*;

#[async_trait]
pub trait WithdrawalExt: Send + Sync {
    /// `RowNotFound` when there is no such withdrawal.
    async fn get_withdrawal(&self, withdrawal_id: Uuid) -> Result<Withdrawal, Error>;

    async fn get_withdrawals(
        &self,
        filter: &WithdrawalFilter,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Withdrawal>, Error>;

    async fn count_withdrawals(&self, filter: &WithdrawalFilter) -> Result<i64, Error>;
}

#[async_trait]
impl WithdrawalExt for DBClient {
    async fn get_withdrawal(&self, withdrawal_id: Uuid) -> Result<Withdrawal, Error> {
        sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT
                id,
                withdrawal_no,
                user_id,
                withdrawal_type,
                amount,
                fee,
                actual_amount,
                withdraw_to,
                status,
                operator_id,
                processed_at,
                reject_reason,
                created_at
            FROM withdrawals
            WHERE id = $1
            "#
        )
        .bind(withdrawal_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_withdrawals(
        &self,
        filter: &WithdrawalFilter,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Withdrawal>, Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT
                id,
                withdrawal_no,
                user_id,
                withdrawal_type,
                amount,
                fee,
                actual_amount,
                withdraw_to,
                status,
                operator_id,
                processed_at,
                reject_reason,
                created_at
            FROM withdrawals
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::withdrawal_status IS NULL OR status = $2)
              AND ($3::withdrawal_type IS NULL OR withdrawal_type = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#
        )
        .bind(filter.user_id)
        .bind(filter.status)
        .bind(filter.withdrawal_type)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_withdrawals(&self, filter: &WithdrawalFilter) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM withdrawals
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::withdrawal_status IS NULL OR status = $2)
              AND ($3::withdrawal_type IS NULL OR withdrawal_type = $3)
            "#
        )
        .bind(filter.user_id)
        .bind(filter.status)
        .bind(filter.withdrawal_type)
        .fetch_one(&self.pool)
        .await
    }
}
