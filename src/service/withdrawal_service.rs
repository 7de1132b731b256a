// service/withdrawal_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{ledgerdb::LedgerTx, DistributionStore},
    models::withdrawalmodel::*,
    service::{
        distribution_service::TransitionOutcome,
        error::ServiceError,
        setting_service::SettingService,
    },
    utils::currency::format_fen_as_yuan,
};

/// Drives withdrawals through
/// `pending -> {approved, rejected}`, `approved -> processing -> success`.
///
/// Each transition is one status-guarded `UPDATE ... WHERE status = <prior>`
/// in the same transaction as the balance movement it implies. A duplicate
/// or racing call finds the row already moved, touches nothing and reports
/// `TransitionOutcome::Skipped`.
#[derive(Clone)]
pub struct WithdrawalService {
    store: Arc<dyn DistributionStore>,
    settings: SettingService,
}

impl std::fmt::Debug for WithdrawalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WithdrawalService").finish()
    }
}

impl WithdrawalService {
    pub fn new(store: Arc<dyn DistributionStore>, settings: SettingService) -> Self {
        Self { store, settings }
    }

    pub async fn get_withdrawal(&self, withdrawal_id: Uuid) -> Result<Withdrawal, ServiceError> {
        self.store
            .get_withdrawal(withdrawal_id)
            .await
            .map_err(|e| ServiceError::from_lookup(e, ServiceError::WithdrawalNotFound(withdrawal_id)))
    }

    pub async fn list_withdrawals(
        &self,
        filter: &WithdrawalFilter,
        page: u32,
        limit: usize,
    ) -> Result<(Vec<Withdrawal>, i64), ServiceError> {
        let rows = self.store.get_withdrawals(filter, page, limit).await?;
        let total = self.store.count_withdrawals(filter).await?;
        Ok((rows, total))
    }

    /// Opens a pending withdrawal and freezes `amount` out of the user's
    /// available funds.
    pub async fn request_withdrawal(
        &self,
        user_id: Uuid,
        withdrawal_type: WithdrawalType,
        amount: i64,
        withdraw_to: WithdrawTo,
    ) -> Result<Withdrawal, ServiceError> {
        let config = self.settings.get_config().await?;

        if amount <= 0 {
            return Err(ServiceError::Validation("Withdrawal amount must be positive".to_string()));
        }
        if amount < config.min_withdraw {
            return Err(ServiceError::Validation(format!(
                "Minimum withdrawal is {}",
                format_fen_as_yuan(config.min_withdraw)
            )));
        }

        let fee = (amount as f64 * config.withdraw_fee).round() as i64;
        let new = NewWithdrawal {
            withdrawal_no: generate_withdrawal_no(),
            user_id,
            withdrawal_type,
            amount,
            fee,
            actual_amount: amount - fee,
            withdraw_to,
        };

        let mut tx = self.store.begin().await?;
        self.move_funds(tx.as_mut(), user_id, withdrawal_type, BalanceMove::freeze(amount))
            .await?;
        let withdrawal = tx.insert_withdrawal(&new).await?;
        tx.commit().await?;

        tracing::info!(
            "withdrawal {} requested by {}: {} ({:?})",
            withdrawal.withdrawal_no,
            user_id,
            format_fen_as_yuan(amount),
            withdrawal_type
        );
        Ok(withdrawal)
    }

    /// pending -> approved. No money moves.
    pub async fn approve(&self, withdrawal_id: Uuid, operator_id: Uuid) -> Result<TransitionOutcome, ServiceError> {
        self.transition(withdrawal_id, WithdrawalStatus::Approved, operator_id, None)
            .await
    }

    /// pending -> rejected, returning the full frozen `amount` to available.
    pub async fn reject(
        &self,
        withdrawal_id: Uuid,
        operator_id: Uuid,
        reason: &str,
    ) -> Result<TransitionOutcome, ServiceError> {
        self.transition(withdrawal_id, WithdrawalStatus::Rejected, operator_id, Some(reason))
            .await
    }

    /// approved -> processing. No money moves.
    pub async fn process(&self, withdrawal_id: Uuid, operator_id: Uuid) -> Result<TransitionOutcome, ServiceError> {
        self.transition(withdrawal_id, WithdrawalStatus::Processing, operator_id, None)
            .await
    }

    /// processing -> success, paying the frozen amount out.
    pub async fn complete(&self, withdrawal_id: Uuid, operator_id: Uuid) -> Result<TransitionOutcome, ServiceError> {
        self.transition(withdrawal_id, WithdrawalStatus::Success, operator_id, None)
            .await
    }

    async fn transition(
        &self,
        withdrawal_id: Uuid,
        to: WithdrawalStatus,
        operator_id: Uuid,
        reject_reason: Option<&str>,
    ) -> Result<TransitionOutcome, ServiceError> {
        let from = to.required_prior().ok_or_else(|| {
            ServiceError::OperationFailed(format!("no transition leads into {:?}", to))
        })?;

        let mut tx = self.store.begin().await?;

        let withdrawal = tx
            .lock_withdrawal(withdrawal_id)
            .await?
            .ok_or(ServiceError::WithdrawalNotFound(withdrawal_id))?;

        let rows = tx
            .transition_withdrawal(withdrawal_id, from, to, operator_id, reject_reason)
            .await?;
        if rows == 0 {
            tracing::debug!(
                "withdrawal {} is {:?}, not {:?}; {:?} skipped",
                withdrawal.withdrawal_no,
                withdrawal.status,
                from,
                to
            );
            return Ok(TransitionOutcome::Skipped);
        }

        if let Some(movement) = Self::settlement_for(&withdrawal, to) {
            self.move_funds(tx.as_mut(), withdrawal.user_id, withdrawal.withdrawal_type, movement)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "withdrawal {} {:?} -> {:?} by {}",
            withdrawal.withdrawal_no,
            from,
            to,
            operator_id
        );
        Ok(TransitionOutcome::Applied)
    }

    /// Balance effect of entering `to`.
    ///
    /// Rejection refunds the full `amount`. Completion drops `amount` from
    /// the frozen pot; the running withdrawn total records `amount` for
    /// commission withdrawals but `actual_amount` (after fee) for wallet
    /// withdrawals.
    fn settlement_for(withdrawal: &Withdrawal, to: WithdrawalStatus) -> Option<BalanceMove> {
        match to {
            WithdrawalStatus::Rejected => Some(BalanceMove::unfreeze(withdrawal.amount)),
            WithdrawalStatus::Success => Some(match withdrawal.withdrawal_type {
                WithdrawalType::Commission => BalanceMove::pay_out(withdrawal.amount, withdrawal.amount),
                WithdrawalType::Balance => BalanceMove::pay_out(withdrawal.amount, withdrawal.actual_amount),
            }),
            _ => None,
        }
    }

    async fn move_funds(
        &self,
        tx: &mut dyn LedgerTx,
        user_id: Uuid,
        withdrawal_type: WithdrawalType,
        movement: BalanceMove,
    ) -> Result<(), ServiceError> {
        let rows = match withdrawal_type {
            WithdrawalType::Commission => {
                let distributor = tx
                    .lock_distributor_by_user(user_id)
                    .await?
                    .ok_or(ServiceError::DistributorNotFoundForUser(user_id))?;
                if !distributor.is_approved() {
                    return Err(ServiceError::Validation(format!(
                        "Distributor for user {} is not approved",
                        user_id
                    )));
                }
                tx.move_commission_balance(distributor.id, movement).await?
            }
            WithdrawalType::Balance => tx.move_wallet_balance(user_id, movement).await?,
        };

        if rows == 0 {
            tracing::warn!("balance move {:?} for user {} refused", movement, user_id);
            return Err(ServiceError::InsufficientBalance(format!(
                "{:?} balance of user {} cannot cover the movement",
                withdrawal_type, user_id
            )));
        }
        Ok(())
    }
}
