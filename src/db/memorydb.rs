// db/memorydb.rs
//
// In-memory DistributionStore for tests. `begin` takes the store lock and
// works on a copy; `commit` writes the copy back and dropping the
// transaction discards it, so partial writes are never visible.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    commissiondb::CommissionExt,
    distributordb::DistributorExt,
    ledgerdb::LedgerTx,
    settingdb::SettingExt,
    withdrawaldb::WithdrawalExt,
    DistributionStore,
};
use crate::models::{
    commissionmodel::*,
    distributormodel::*,
    withdrawalmodel::*,
};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub distributors: HashMap<Uuid, Distributor>,
    pub commissions: HashMap<Uuid, Commission>,
    pub withdrawals: HashMap<Uuid, Withdrawal>,
    pub wallets: HashMap<Uuid, UserWallet>,
    pub settings: Vec<CommissionSetting>,
    pub current_version: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

fn page_of<T: Clone>(mut rows: Vec<T>, page: u32, limit: usize) -> Vec<T> {
    let offset = (page.max(1) as usize - 1) * limit;
    if offset >= rows.len() {
        return Vec::new();
    }
    rows.drain(offset..).take(limit).collect()
}

fn distributor_matches(filter: &DistributorFilter, d: &Distributor) -> bool {
    filter.status.map_or(true, |s| d.status == s)
        && filter.parent_id.map_or(true, |p| d.parent_id == Some(p))
}

fn commission_matches(filter: &CommissionFilter, c: &Commission) -> bool {
    filter.distributor_id.map_or(true, |id| c.distributor_id == id)
        && filter.status.map_or(true, |s| c.status == s)
        && filter.commission_type.map_or(true, |t| c.commission_type == t)
        && filter.start_date.map_or(true, |start| c.created_at >= start)
        && filter.end_date.map_or(true, |end| c.created_at <= end)
}

fn withdrawal_matches(filter: &WithdrawalFilter, w: &Withdrawal) -> bool {
    filter.user_id.map_or(true, |id| w.user_id == id)
        && filter.status.map_or(true, |s| w.status == s)
        && filter.withdrawal_type.map_or(true, |t| w.withdrawal_type == t)
}

fn newest_first<T, F: Fn(&T) -> DateTime<Utc>>(rows: &mut [T], key: F) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

/// Mirrors the guarded `UPDATE ... SET x = x + $n WHERE x + $n >= 0` of the
/// Postgres store: 1 when applied, 0 when a component would go negative, and
/// an error where Postgres would raise `bigint out of range`.
pub(crate) fn apply_move(
    available: &mut i64,
    frozen: &mut i64,
    withdrawn: &mut i64,
    movement: BalanceMove,
) -> Result<u64, Error> {
    let add = |a: i64, b: i64| {
        a.checked_add(b)
            .ok_or_else(|| Error::Protocol("bigint out of range".to_string()))
    };
    let next = (
        add(*available, movement.available)?,
        add(*frozen, movement.frozen)?,
        add(*withdrawn, movement.withdrawn)?,
    );
    if next.0 < 0 || next.1 < 0 || next.2 < 0 {
        return Ok(0);
    }
    *available = next.0;
    *frozen = next.1;
    *withdrawn = next.2;
    Ok(1)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    pub async fn distributor(&self, distributor_id: Uuid) -> Distributor {
        self.state.lock().await.distributors[&distributor_id].clone()
    }

    pub async fn withdrawal(&self, withdrawal_id: Uuid) -> Withdrawal {
        self.state.lock().await.withdrawals[&withdrawal_id].clone()
    }

    pub async fn wallet(&self, user_id: Uuid) -> UserWallet {
        self.state.lock().await.wallets[&user_id].clone()
    }

    pub async fn add_distributor(
        &self,
        parent_id: Option<Uuid>,
        status: DistributorStatus,
    ) -> Distributor {
        let now = Utc::now();
        let distributor = Distributor {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            parent_id,
            level: DistributorLevel::Direct,
            status,
            direct_count: 0,
            team_count: 0,
            available_commission: 0,
            frozen_commission: 0,
            withdrawn_commission: 0,
            approved_at: None,
            approved_by: None,
            reject_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .distributors
            .insert(distributor.id, distributor.clone());
        distributor
    }

    pub async fn set_parent(&self, distributor_id: Uuid, parent_id: Option<Uuid>) {
        let mut state = self.state.lock().await;
        if let Some(d) = state.distributors.get_mut(&distributor_id) {
            d.parent_id = parent_id;
        }
    }

    pub async fn set_commission_balances(
        &self,
        distributor_id: Uuid,
        available: i64,
        frozen: i64,
        withdrawn: i64,
    ) {
        let mut state = self.state.lock().await;
        let d = state
            .distributors
            .get_mut(&distributor_id)
            .expect("unknown distributor");
        d.available_commission = available;
        d.frozen_commission = frozen;
        d.withdrawn_commission = withdrawn;
    }

    pub async fn set_team_counts(&self, distributor_id: Uuid, direct: i32, team: i32) {
        let mut state = self.state.lock().await;
        if let Some(d) = state.distributors.get_mut(&distributor_id) {
            d.direct_count = direct;
            d.team_count = team;
        }
    }

    pub async fn add_wallet(&self, user_id: Uuid, balance: i64, frozen_balance: i64) {
        self.state.lock().await.wallets.insert(
            user_id,
            UserWallet {
                user_id,
                balance,
                frozen_balance,
                total_withdrawn: 0,
                updated_at: Utc::now(),
            },
        );
    }

    pub async fn add_withdrawal(
        &self,
        user_id: Uuid,
        withdrawal_type: WithdrawalType,
        amount: i64,
        fee: i64,
        status: WithdrawalStatus,
    ) -> Withdrawal {
        let withdrawal = Withdrawal {
            id: Uuid::new_v4(),
            withdrawal_no: generate_withdrawal_no(),
            user_id,
            withdrawal_type,
            amount,
            fee,
            actual_amount: amount - fee,
            withdraw_to: WithdrawTo::Wechat,
            status,
            operator_id: None,
            processed_at: None,
            reject_reason: None,
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .await
            .withdrawals
            .insert(withdrawal.id, withdrawal.clone());
        withdrawal
    }

    pub async fn add_commission(
        &self,
        distributor_id: Uuid,
        commission_type: CommissionType,
        amount: i64,
        status: CommissionStatus,
        created_at: DateTime<Utc>,
    ) -> Commission {
        let commission = Commission {
            id: Uuid::new_v4(),
            distributor_id,
            order_id: Uuid::new_v4(),
            from_user_id: Uuid::new_v4(),
            commission_type,
            order_amount: amount * 10,
            rate: 0.1,
            amount,
            status,
            settled_at: None,
            created_at,
        };
        self.state
            .lock()
            .await
            .commissions
            .insert(commission.id, commission.clone());
        commission
    }
}

#[async_trait]
impl DistributorExt for MemoryStore {
    async fn get_distributor(&self, distributor_id: Uuid) -> Result<Distributor, Error> {
        self.state
            .lock()
            .await
            .distributors
            .get(&distributor_id)
            .cloned()
            .ok_or(Error::RowNotFound)
    }

    async fn get_distributor_by_user(&self, user_id: Uuid) -> Result<Option<Distributor>, Error> {
        Ok(self
            .state
            .lock()
            .await
            .distributors
            .values()
            .find(|d| d.user_id == user_id)
            .cloned())
    }

    async fn get_distributors(
        &self,
        filter: &DistributorFilter,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Distributor>, Error> {
        let state = self.state.lock().await;
        let mut rows: Vec<Distributor> = state
            .distributors
            .values()
            .filter(|d| distributor_matches(filter, d))
            .cloned()
            .collect();
        newest_first(&mut rows, |d| d.created_at);
        Ok(page_of(rows, page, limit))
    }

    async fn count_distributors(&self, filter: &DistributorFilter) -> Result<i64, Error> {
        let state = self.state.lock().await;
        Ok(state
            .distributors
            .values()
            .filter(|d| distributor_matches(filter, d))
            .count() as i64)
    }
}

#[async_trait]
impl CommissionExt for MemoryStore {
    async fn get_commission(&self, commission_id: Uuid) -> Result<Commission, Error> {
        self.state
            .lock()
            .await
            .commissions
            .get(&commission_id)
            .cloned()
            .ok_or(Error::RowNotFound)
    }

    async fn get_commissions(
        &self,
        filter: &CommissionFilter,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Commission>, Error> {
        let state = self.state.lock().await;
        let mut rows: Vec<Commission> = state
            .commissions
            .values()
            .filter(|c| commission_matches(filter, c))
            .cloned()
            .collect();
        newest_first(&mut rows, |c| c.created_at);
        Ok(page_of(rows, page, limit))
    }

    async fn count_commissions(&self, filter: &CommissionFilter) -> Result<i64, Error> {
        let state = self.state.lock().await;
        Ok(state
            .commissions
            .values()
            .filter(|c| commission_matches(filter, c))
            .count() as i64)
    }

    async fn get_commission_stats(&self) -> Result<CommissionStats, Error> {
        let state = self.state.lock().await;
        let count_status = |status: DistributorStatus| {
            state
                .distributors
                .values()
                .filter(|d| d.status == status)
                .count() as i64
        };

        Ok(CommissionStats {
            approved_distributors: count_status(DistributorStatus::Approved),
            pending_distributors: count_status(DistributorStatus::Pending),
            total_commission: state.commissions.values().map(|c| c.amount).sum(),
            total_withdrawn: state
                .withdrawals
                .values()
                .filter(|w| {
                    w.status == WithdrawalStatus::Success
                        && w.withdrawal_type == WithdrawalType::Commission
                })
                .map(|w| w.amount)
                .sum(),
        })
    }
}

#[async_trait]
impl WithdrawalExt for MemoryStore {
    async fn get_withdrawal(&self, withdrawal_id: Uuid) -> Result<Withdrawal, Error> {
        self.state
            .lock()
            .await
            .withdrawals
            .get(&withdrawal_id)
            .cloned()
            .ok_or(Error::RowNotFound)
    }

    async fn get_withdrawals(
        &self,
        filter: &WithdrawalFilter,
        page: u32,
        limit: usize,
    ) -> Result<Vec<Withdrawal>, Error> {
        let state = self.state.lock().await;
        let mut rows: Vec<Withdrawal> = state
            .withdrawals
            .values()
            .filter(|w| withdrawal_matches(filter, w))
            .cloned()
            .collect();
        newest_first(&mut rows, |w| w.created_at);
        Ok(page_of(rows, page, limit))
    }

    async fn count_withdrawals(&self, filter: &WithdrawalFilter) -> Result<i64, Error> {
        let state = self.state.lock().await;
        Ok(state
            .withdrawals
            .values()
            .filter(|w| withdrawal_matches(filter, w))
            .count() as i64)
    }
}

#[async_trait]
impl SettingExt for MemoryStore {
    async fn get_current_setting(&self) -> Result<Option<CommissionSetting>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .current_version
            .and_then(|v| state.settings.iter().find(|s| s.version == v).cloned()))
    }

    async fn get_setting_history(&self, limit: i64) -> Result<Vec<CommissionSetting>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .settings
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DistributionStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, Error> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn lock_distributor(&mut self, distributor_id: Uuid) -> Result<Option<Distributor>, Error> {
        Ok(self.working.distributors.get(&distributor_id).cloned())
    }

    async fn lock_distributor_by_user(&mut self, user_id: Uuid) -> Result<Option<Distributor>, Error> {
        Ok(self
            .working
            .distributors
            .values()
            .find(|d| d.user_id == user_id)
            .cloned())
    }

    async fn insert_distributor(&mut self, new: &NewDistributor) -> Result<Distributor, Error> {
        let now = Utc::now();
        let distributor = Distributor {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            parent_id: new.parent_id,
            level: new.level,
            status: DistributorStatus::Pending,
            direct_count: 0,
            team_count: 0,
            available_commission: 0,
            frozen_commission: 0,
            withdrawn_commission: 0,
            approved_at: None,
            approved_by: None,
            reject_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.working
            .distributors
            .insert(distributor.id, distributor.clone());
        Ok(distributor)
    }

    async fn approve_distributor_if_pending(
        &mut self,
        distributor_id: Uuid,
        operator_id: Uuid,
        approved_at: DateTime<Utc>,
    ) -> Result<u64, Error> {
        match self.working.distributors.get_mut(&distributor_id) {
            Some(d) if d.status == DistributorStatus::Pending => {
                d.status = DistributorStatus::Approved;
                d.approved_at = Some(approved_at);
                d.approved_by = Some(operator_id);
                d.updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn reject_distributor_if_pending(
        &mut self,
        distributor_id: Uuid,
        reason: &str,
    ) -> Result<u64, Error> {
        match self.working.distributors.get_mut(&distributor_id) {
            Some(d) if d.status == DistributorStatus::Pending => {
                d.status = DistributorStatus::Rejected;
                d.reject_reason = Some(reason.to_string());
                d.updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn add_team_counts(
        &mut self,
        distributor_id: Uuid,
        direct: i32,
        team: i32,
    ) -> Result<u64, Error> {
        match self.working.distributors.get_mut(&distributor_id) {
            Some(d) if d.direct_count + direct >= 0 && d.team_count + team >= 0 => {
                d.direct_count += direct;
                d.team_count += team;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn move_commission_balance(
        &mut self,
        distributor_id: Uuid,
        movement: BalanceMove,
    ) -> Result<u64, Error> {
        match self.working.distributors.get_mut(&distributor_id) {
            Some(d) => apply_move(
                &mut d.available_commission,
                &mut d.frozen_commission,
                &mut d.withdrawn_commission,
                movement,
            ),
            None => Ok(0),
        }
    }

    async fn move_wallet_balance(
        &mut self,
        user_id: Uuid,
        movement: BalanceMove,
    ) -> Result<u64, Error> {
        match self.working.wallets.get_mut(&user_id) {
            Some(w) => apply_move(
                &mut w.balance,
                &mut w.frozen_balance,
                &mut w.total_withdrawn,
                movement,
            ),
            None => Ok(0),
        }
    }

    async fn order_has_commissions(&mut self, order_id: Uuid) -> Result<bool, Error> {
        Ok(self
            .working
            .commissions
            .values()
            .any(|c| c.order_id == order_id))
    }

    async fn insert_commission(&mut self, new: &NewCommission) -> Result<Commission, Error> {
        let commission = Commission {
            id: Uuid::new_v4(),
            distributor_id: new.distributor_id,
            order_id: new.order_id,
            from_user_id: new.from_user_id,
            commission_type: new.commission_type,
            order_amount: new.order_amount,
            rate: new.rate,
            amount: new.amount,
            status: CommissionStatus::Pending,
            settled_at: None,
            created_at: Utc::now(),
        };
        self.working
            .commissions
            .insert(commission.id, commission.clone());
        Ok(commission)
    }

    async fn lock_commission(&mut self, commission_id: Uuid) -> Result<Option<Commission>, Error> {
        Ok(self.working.commissions.get(&commission_id).cloned())
    }

    async fn settle_commission_if_pending(
        &mut self,
        commission_id: Uuid,
        settled_at: DateTime<Utc>,
    ) -> Result<u64, Error> {
        match self.working.commissions.get_mut(&commission_id) {
            Some(c) if c.status == CommissionStatus::Pending => {
                c.status = CommissionStatus::Settled;
                c.settled_at = Some(settled_at);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn settle_commissions_created_before(
        &mut self,
        cutoff: DateTime<Utc>,
        settled_at: DateTime<Utc>,
    ) -> Result<u64, Error> {
        let mut settled = 0;
        for c in self.working.commissions.values_mut() {
            if c.status == CommissionStatus::Pending && c.created_at <= cutoff {
                c.status = CommissionStatus::Settled;
                c.settled_at = Some(settled_at);
                settled += 1;
            }
        }
        Ok(settled)
    }

    async fn lock_withdrawal(&mut self, withdrawal_id: Uuid) -> Result<Option<Withdrawal>, Error> {
        Ok(self.working.withdrawals.get(&withdrawal_id).cloned())
    }

    async fn insert_withdrawal(&mut self, new: &NewWithdrawal) -> Result<Withdrawal, Error> {
        if self
            .working
            .withdrawals
            .values()
            .any(|w| w.withdrawal_no == new.withdrawal_no)
        {
            return Err(Error::Protocol(format!(
                "duplicate withdrawal_no {}",
                new.withdrawal_no
            )));
        }

        let withdrawal = Withdrawal {
            id: Uuid::new_v4(),
            withdrawal_no: new.withdrawal_no.clone(),
            user_id: new.user_id,
            withdrawal_type: new.withdrawal_type,
            amount: new.amount,
            fee: new.fee,
            actual_amount: new.actual_amount,
            withdraw_to: new.withdraw_to,
            status: WithdrawalStatus::Pending,
            operator_id: None,
            processed_at: None,
            reject_reason: None,
            created_at: Utc::now(),
        };
        self.working
            .withdrawals
            .insert(withdrawal.id, withdrawal.clone());
        Ok(withdrawal)
    }

    async fn transition_withdrawal(
        &mut self,
        withdrawal_id: Uuid,
        from: WithdrawalStatus,
        to: WithdrawalStatus,
        operator_id: Uuid,
        reject_reason: Option<&str>,
    ) -> Result<u64, Error> {
        match self.working.withdrawals.get_mut(&withdrawal_id) {
            Some(w) if w.status == from => {
                w.status = to;
                w.operator_id = Some(operator_id);
                w.processed_at = Some(Utc::now());
                if let Some(reason) = reject_reason {
                    w.reject_reason = Some(reason.to_string());
                }
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn insert_setting(
        &mut self,
        config: &CommissionConfig,
        created_by: Uuid,
    ) -> Result<CommissionSetting, Error> {
        let version = self.working.settings.last().map_or(1, |s| s.version + 1);
        let setting = CommissionSetting {
            version,
            direct_rate: config.direct_rate,
            indirect_rate: config.indirect_rate,
            min_withdraw: config.min_withdraw,
            withdraw_fee: config.withdraw_fee,
            settle_delay_days: config.settle_delay_days,
            created_by: Some(created_by),
            created_at: Utc::now(),
        };
        self.working.settings.push(setting.clone());
        self.working.current_version = Some(version);
        Ok(setting)
    }

    async fn commit(self: Box<Self>) -> Result<(), Error> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
