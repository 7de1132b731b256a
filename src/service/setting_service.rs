// service/setting_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::DistributionStore,
    models::commissionmodel::*,
    service::error::ServiceError,
};

pub const MAX_COMBINED_RATE: f64 = 0.5;
pub const MAX_SETTLE_DELAY_DAYS: i32 = 3650;

#[derive(Clone)]
pub struct SettingService {
    store: Arc<dyn DistributionStore>,
}

impl std::fmt::Debug for SettingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingService").finish()
    }
}

/// Checks a candidate config; the first violated rule is reported.
pub fn validate_config(config: &CommissionConfig) -> Result<(), ServiceError> {
    let in_unit = |v: f64| (0.0..=1.0).contains(&v);

    if !in_unit(config.direct_rate) {
        return Err(ServiceError::Validation("直推佣金比例必须在0到1之间".to_string()));
    }
    if !in_unit(config.indirect_rate) {
        return Err(ServiceError::Validation("间推佣金比例必须在0到1之间".to_string()));
    }
    if config.direct_rate + config.indirect_rate > MAX_COMBINED_RATE {
        return Err(ServiceError::Validation("直推和间推佣金比例之和不能超过50%".to_string()));
    }
    if config.min_withdraw < 0 {
        return Err(ServiceError::Validation("最低提现金额不能为负数".to_string()));
    }
    if !in_unit(config.withdraw_fee) {
        return Err(ServiceError::Validation("提现手续费比例必须在0到1之间".to_string()));
    }
    if config.settle_delay_days < 0 {
        return Err(ServiceError::Validation("结算延迟天数不能为负数".to_string()));
    }
    if config.settle_delay_days > MAX_SETTLE_DELAY_DAYS {
        return Err(ServiceError::Validation(format!(
            "结算延迟天数不能超过{}天",
            MAX_SETTLE_DELAY_DAYS
        )));
    }
    Ok(())
}

impl SettingService {
    pub fn new(store: Arc<dyn DistributionStore>) -> Self {
        Self { store }
    }

    /// The current config, or the built-in defaults when none was ever saved.
    pub async fn get_config(&self) -> Result<CommissionConfig, ServiceError> {
        Ok(self
            .store
            .get_current_setting()
            .await?
            .map(|s| s.config())
            .unwrap_or_default())
    }

    pub async fn update_config(
        &self,
        config: CommissionConfig,
        operator_id: Uuid,
    ) -> Result<CommissionSetting, ServiceError> {
        validate_config(&config).map_err(|e| {
            tracing::warn!("commission config update by {} refused: {}", operator_id, e);
            e
        })?;

        let mut tx = self.store.begin().await?;
        let setting = tx.insert_setting(&config, operator_id).await?;
        tx.commit().await?;

        tracing::info!(
            "commission config version {} saved by {}",
            setting.version,
            operator_id
        );
        Ok(setting)
    }

    pub async fn get_config_history(&self, limit: i64) -> Result<Vec<CommissionSetting>, ServiceError> {
        Ok(self.store.get_setting_history(limit).await?)
    }
}
