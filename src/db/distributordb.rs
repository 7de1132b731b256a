// db/distributordb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::DBClient;
use crate::models::distributormodel::*;

#[async_trait]
pub trait DistributorExt: Send + Sync {
    /// `RowNotFound` when there is no such distributor.
    async fn get_distributor(&self, distributor_id: Uuid) -> Result<Distributor, Error>;

    async fn get_distributor_by_user(&self, user_id: Uuid) -> Result<Option<Distributor>, Error>;

    async fn get_distributors(
        &self,
        filter: &DistributorFilter,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Distributor>, Error>;

    async fn count_distributors(&self, filter: &DistributorFilter) -> Result<i64, Error>;
}

#[async_trait]
impl DistributorExt for DBClient {
    async fn get_distributor(&self, distributor_id: Uuid) -> Result<Distributor, Error> {
        sqlx::query_as::<_, Distributor>(
            r#"
            SELECT
                id,
                user_id,
                parent_id,
                level,
                status,
                direct_count,
                team_count,
                available_commission,
                frozen_commission,
                withdrawn_commission,
                approved_at,
                approved_by,
                reject_reason,
                created_at,
                updated_at
            FROM distributors
            WHERE id = $1
            "#
        )
        .bind(distributor_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_distributor_by_user(&self, user_id: Uuid) -> Result<Option<Distributor>, Error> {
        sqlx::query_as::<_, Distributor>(
            r#"
            SELECT
                id,
                user_id,
                parent_id,
                level,
                status,
                direct_count,
                team_count,
                available_commission,
                frozen_commission,
                withdrawn_commission,
                approved_at,
                approved_by,
                reject_reason,
                created_at,
                updated_at
            FROM distributors
            WHERE user_id = $1
            "#
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_distributors(
        &self,
        filter: &DistributorFilter,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Distributor>, Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        sqlx::query_as::<_, Distributor>(
            r#"
            SELECT
                id,
                user_id,
                parent_id,
                level,
                status,
                direct_count,
                team_count,
                available_commission,
                frozen_commission,
                withdrawn_commission,
                approved_at,
                approved_by,
                reject_reason,
                created_at,
                updated_at
            FROM distributors
            WHERE ($1::distributor_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR parent_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        )
        .bind(filter.status)
        .bind(filter.parent_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_distributors(&self, filter: &DistributorFilter) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM distributors
            WHERE ($1::distributor_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR parent_id = $2)
            "#
        )
        .bind(filter.status)
        .bind(filter.parent_id)
        .fetch_one(&self.pool)
        .await
    }
}
