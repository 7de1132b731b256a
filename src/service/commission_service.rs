// service/commission_service.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    db::DistributionStore,
    models::{commissionmodel::*, withdrawalmodel::BalanceMove},
    service::{
        distribution_service::TransitionOutcome,
        error::ServiceError,
        setting_service::SettingService,
    },
    utils::currency::format_fen_as_yuan,
};

#[derive(Clone)]
pub struct CommissionService {
    store: Arc<dyn DistributionStore>,
    settings: SettingService,
}

impl std::fmt::Debug for CommissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommissionService").finish()
    }
}

impl CommissionService {
    pub fn new(store: Arc<dyn DistributionStore>, settings: SettingService) -> Self {
        Self { store, settings }
    }

    pub async fn get_commission(&self, commission_id: Uuid) -> Result<Commission, ServiceError> {
        self.store
            .get_commission(commission_id)
            .await
            .map_err(|e| ServiceError::from_lookup(e, ServiceError::CommissionNotFound(commission_id)))
    }

    pub async fn list_commissions(
        &self,
        filter: &CommissionFilter,
        page: u32,
        limit: usize,
    ) -> Result<(Vec<Commission>, i64), ServiceError> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(ServiceError::Validation("start_date must not be after end_date".to_string()));
            }
        }

        let rows = self.store.get_commissions(filter, page, limit).await?;
        let total = self.store.count_commissions(filter).await?;
        Ok((rows, total))
    }

    pub async fn get_statistics(&self) -> Result<CommissionStats, ServiceError> {
        Ok(self.store.get_commission_stats().await?)
    }

    /// Books the commissions a completed order earns: a direct commission to
    /// the referring distributor and, when that distributor has an approved
    /// upline, an indirect one to the upline. Each recipient's available
    /// commission is credited in the same transaction.
    pub async fn record_order_commission(
        &self,
        order_id: Uuid,
        from_user_id: Uuid,
        order_amount: i64,
        referrer_distributor_id: Uuid,
    ) -> Result<Vec<Commission>, ServiceError> {
        if order_amount <= 0 {
            return Err(ServiceError::Validation("order_amount must be positive".to_string()));
        }

        let config = self.settings.get_config().await?;
        let mut tx = self.store.begin().await?;

        if tx.order_has_commissions(order_id).await? {
            return Err(ServiceError::CommissionAlreadyRecorded(order_id));
        }

        let referrer = tx
            .lock_distributor(referrer_distributor_id)
            .await?
            .ok_or(ServiceError::DistributorNotFound(referrer_distributor_id))?;
        if !referrer.is_approved() {
            return Err(ServiceError::InvalidReferrer(referrer.user_id));
        }

        let mut recipients = vec![(referrer.id, CommissionType::Direct, config.direct_rate)];
        if let Some(upline_id) = referrer.parent_id {
            match tx.lock_distributor(upline_id).await? {
                Some(upline) if upline.is_approved() => {
                    recipients.push((upline.id, CommissionType::Indirect, config.indirect_rate))
                }
                Some(_) => {}
                None => {
                    return Err(ServiceError::BrokenReferralChain {
                        distributor_id: referrer.id,
                        missing: upline_id,
                    })
                }
            }
        }

        let mut booked = Vec::with_capacity(recipients.len());
        for (distributor_id, commission_type, rate) in recipients {
            let amount = commission_amount(order_amount, rate);
            if amount == 0 {
                continue;
            }

            let commission = tx
                .insert_commission(&NewCommission {
                    distributor_id,
                    order_id,
                    from_user_id,
                    commission_type,
                    order_amount,
                    rate,
                    amount,
                })
                .await?;
            let rows = tx
                .move_commission_balance(distributor_id, BalanceMove::credit(amount))
                .await?;
            if rows == 0 {
                tracing::warn!(
                    "order {} could not credit {} to distributor {}",
                    order_id,
                    format_fen_as_yuan(amount),
                    distributor_id
                );
                return Err(ServiceError::InsufficientBalance(format!(
                    "commission balance of distributor {} cannot take a credit of {}",
                    distributor_id,
                    format_fen_as_yuan(amount)
                )));
            }
            booked.push(commission);
        }

        tx.commit().await?;

        for c in &booked {
            tracing::info!(
                "order {} booked {:?} commission {} for distributor {}",
                order_id,
                c.commission_type,
                format_fen_as_yuan(c.amount),
                c.distributor_id
            );
        }
        Ok(booked)
    }

    pub async fn settle_commission(&self, commission_id: Uuid) -> Result<TransitionOutcome, ServiceError> {
        let mut tx = self.store.begin().await?;

        if tx.lock_commission(commission_id).await?.is_none() {
            return Err(ServiceError::CommissionNotFound(commission_id));
        }

        let outcome = TransitionOutcome::from_rows(
            tx.settle_commission_if_pending(commission_id, Utc::now()).await?,
        );
        tx.commit().await?;

        if outcome == TransitionOutcome::Applied {
            tracing::info!("commission {} settled", commission_id);
        }
        Ok(outcome)
    }

    /// Settles every pending commission older than the configured delay.
    /// Returns how many rows were settled.
    pub async fn settle_due_commissions(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        let config = self.settings.get_config().await?;
        let cutoff = Duration::try_days(config.settle_delay_days as i64)
            .and_then(|delay| now.checked_sub_signed(delay))
            .ok_or_else(|| {
                ServiceError::Validation(format!(
                    "settle delay of {} days is out of range",
                    config.settle_delay_days
                ))
            })?;

        let mut tx = self.store.begin().await?;
        let settled = tx.settle_commissions_created_before(cutoff, now).await?;
        tx.commit().await?;

        tracing::info!("settled {} commissions created before {}", settled, cutoff);
        Ok(settled)
    }
}
