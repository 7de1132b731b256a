// db/settingdb.rs
use async_trait::async_trait;
use sqlx::Error;

use super::DBClient;
use crate::models::commissionmodel::CommissionSetting;

#[async_trait]
pub trait SettingExt: Send + Sync {
    /// The version `commission_setting_current` points at, if any.
    async fn get_current_setting(&self) -> Result<Option<CommissionSetting>, Error>;

    async fn get_setting_history(&self, limit: i64) -> Result<Vec<CommissionSetting>, Error>;
}

#[async_trait]
impl SettingExt for DBClient {
    async fn get_current_setting(&self) -> Result<Option<CommissionSetting>, Error> {
        sqlx::query_as::<_, CommissionSetting>(
            r#"
            SELECT
                s.version,
                s.direct_rate,
                s.indirect_rate,
                s.min_withdraw,
                s.withdraw_fee,
                s.settle_delay_days,
                s.created_by,
                s.created_at
            FROM commission_setting_current c
            JOIN commission_settings s ON s.version = c.version
            "#
        )
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_setting_history(&self, limit: i64) -> Result<Vec<CommissionSetting>, Error> {
        sqlx::query_as::<_, CommissionSetting>(
            r#"
            SELECT
                version,
                direct_rate,
                indirect_rate,
                min_withdraw,
                withdraw_fee,
                settle_delay_days,
                created_by,
                created_at
            FROM commission_settings
            ORDER BY version DESC
            LIMIT $1
            "#
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
