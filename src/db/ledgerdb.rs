// db/ledgerdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Error, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{
    commissionmodel::*,
    distributormodel::*,
    withdrawalmodel::*,
};

/// One database transaction over the referral ledger.
///
/// Every `*_if_*` / `transition_*` method is a compare-and-swap: the update
/// carries the expected prior state in its `WHERE` clause and reports the
/// number of rows it touched. Zero means another caller got there first (or
/// the row is not in the expected state) and nothing was written. Balance
/// moves are guarded the same way so no pot can go negative.
///
/// Dropping the transaction without calling `commit` rolls everything back.
#[async_trait]
pub trait LedgerTx: Send {
    async fn lock_distributor(&mut self, distributor_id: Uuid) -> Result<Option<Distributor>, Error>;

    async fn lock_distributor_by_user(&mut self, user_id: Uuid) -> Result<Option<Distributor>, Error>;

    async fn insert_distributor(&mut self, new: &NewDistributor) -> Result<Distributor, Error>;

    async fn approve_distributor_if_pending(
        &mut self,
        distributor_id: Uuid,
        operator_id: Uuid,
        approved_at: DateTime<Utc>,
    ) -> Result<u64, Error>;

    async fn reject_distributor_if_pending(
        &mut self,
        distributor_id: Uuid,
        reason: &str,
    ) -> Result<u64, Error>;

    async fn add_team_counts(
        &mut self,
        distributor_id: Uuid,
        direct: i32,
        team: i32,
    ) -> Result<u64, Error>;

    async fn move_commission_balance(
        &mut self,
        distributor_id: Uuid,
        movement: BalanceMove,
    ) -> Result<u64, Error>;

    async fn move_wallet_balance(
        &mut self,
        user_id: Uuid,
        movement: BalanceMove,
    ) -> Result<u64, Error>;

    async fn order_has_commissions(&mut self, order_id: Uuid) -> Result<bool, Error>;

    async fn insert_commission(&mut self, new: &NewCommission) -> Result<Commission, Error>;

    async fn lock_commission(&mut self, commission_id: Uuid) -> Result<Option<Commission>, Error>;

    async fn settle_commission_if_pending(
        &mut self,
        commission_id: Uuid,
        settled_at: DateTime<Utc>,
    ) -> Result<u64, Error>;

    async fn settle_commissions_created_before(
        &mut self,
        cutoff: DateTime<Utc>,
        settled_at: DateTime<Utc>,
    ) -> Result<u64, Error>;

    async fn lock_withdrawal(&mut self, withdrawal_id: Uuid) -> Result<Option<Withdrawal>, Error>;

    async fn insert_withdrawal(&mut self, new: &NewWithdrawal) -> Result<Withdrawal, Error>;

    async fn transition_withdrawal(
        &mut self,
        withdrawal_id: Uuid,
        from: WithdrawalStatus,
        to: WithdrawalStatus,
        operator_id: Uuid,
        reject_reason: Option<&str>,
    ) -> Result<u64, Error>;

    /// Stores a new config version and points `current` at it.
    async fn insert_setting(
        &mut self,
        config: &CommissionConfig,
        created_by: Uuid,
    ) -> Result<CommissionSetting, Error>;

    async fn commit(self: Box<Self>) -> Result<(), Error>;
}

const APPROVE_DISTRIBUTOR_SQL: &str = r#"
    UPDATE distributors
    SET status = 'approved'::distributor_status,
        approved_at = $3,
        approved_by = $2,
        updated_at = NOW()
    WHERE id = $1 AND status = 'pending'::distributor_status
"#;

const REJECT_DISTRIBUTOR_SQL: &str = r#"
    UPDATE distributors
    SET status = 'rejected'::distributor_status,
        reject_reason = $2,
        updated_at = NOW()
    WHERE id = $1 AND status = 'pending'::distributor_status
"#;

const ADD_TEAM_COUNTS_SQL: &str = r#"
    UPDATE distributors
    SET direct_count = direct_count + $2,
        team_count = team_count + $3,
        updated_at = NOW()
    WHERE id = $1
      AND direct_count + $2 >= 0
      AND team_count + $3 >= 0
"#;

const MOVE_COMMISSION_BALANCE_SQL: &str = r#"
    UPDATE distributors
    SET available_commission = available_commission + $2,
        frozen_commission = frozen_commission + $3,
        withdrawn_commission = withdrawn_commission + $4,
        updated_at = NOW()
    WHERE id = $1
      AND available_commission + $2 >= 0
      AND frozen_commission + $3 >= 0
      AND withdrawn_commission + $4 >= 0
"#;

const MOVE_WALLET_BALANCE_SQL: &str = r#"
    UPDATE user_wallets
    SET balance = balance + $2,
        frozen_balance = frozen_balance + $3,
        total_withdrawn = total_withdrawn + $4,
        updated_at = NOW()
    WHERE user_id = $1
      AND balance + $2 >= 0
      AND frozen_balance + $3 >= 0
      AND total_withdrawn + $4 >= 0
"#;

const SETTLE_COMMISSION_SQL: &str = r#"
    UPDATE commissions
    SET status = 'settled'::commission_status, settled_at = $2
    WHERE id = $1 AND status = 'pending'::commission_status
"#;

const SETTLE_DUE_COMMISSIONS_SQL: &str = r#"
    UPDATE commissions
    SET status = 'settled'::commission_status, settled_at = $2
    WHERE status = 'pending'::commission_status AND created_at <= $1
"#;

const TRANSITION_WITHDRAWAL_SQL: &str = r#"
    UPDATE withdrawals
    SET status = $3,
        operator_id = $4,
        processed_at = NOW(),
        reject_reason = COALESCE($5, reject_reason)
    WHERE id = $1 AND status = $2
"#;

pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

impl PgLedgerTx {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_distributor(&mut self, distributor_id: Uuid) -> Result<Option<Distributor>, Error> {
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
            FOR UPDATE
            "#
        )
        .bind(distributor_id)
        .fetch_optional(&mut *self.tx)
        .await
    }

    async fn lock_distributor_by_user(&mut self, user_id: Uuid) -> Result<Option<Distributor>, Error> {
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
            FOR UPDATE
            "#
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
    }

    async fn insert_distributor(&mut self, new: &NewDistributor) -> Result<Distributor, Error> {
        sqlx::query_as::<_, Distributor>(
            r#"
            INSERT INTO distributors (user_id, parent_id, level, status)
            VALUES ($1, $2, $3, 'pending'::distributor_status)
            RETURNING
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
            "#
        )
        .bind(new.user_id)
        .bind(new.parent_id)
        .bind(new.level)
        .fetch_one(&mut *self.tx)
        .await
    }

    async fn approve_distributor_if_pending(
        &mut self,
        distributor_id: Uuid,
        operator_id: Uuid,
        approved_at: DateTime<Utc>,
    ) -> Result<u64, Error> {
        let result = sqlx::query(APPROVE_DISTRIBUTOR_SQL)
            .bind(distributor_id)
            .bind(operator_id)
            .bind(approved_at)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn reject_distributor_if_pending(
        &mut self,
        distributor_id: Uuid,
        reason: &str,
    ) -> Result<u64, Error> {
        let result = sqlx::query(REJECT_DISTRIBUTOR_SQL)
            .bind(distributor_id)
            .bind(reason)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn add_team_counts(
        &mut self,
        distributor_id: Uuid,
        direct: i32,
        team: i32,
    ) -> Result<u64, Error> {
        let result = sqlx::query(ADD_TEAM_COUNTS_SQL)
            .bind(distributor_id)
            .bind(direct)
            .bind(team)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn move_commission_balance(
        &mut self,
        distributor_id: Uuid,
        movement: BalanceMove,
    ) -> Result<u64, Error> {
        let result = sqlx::query(MOVE_COMMISSION_BALANCE_SQL)
            .bind(distributor_id)
            .bind(movement.available)
            .bind(movement.frozen)
            .bind(movement.withdrawn)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn move_wallet_balance(
        &mut self,
        user_id: Uuid,
        movement: BalanceMove,
    ) -> Result<u64, Error> {
        let result = sqlx::query(MOVE_WALLET_BALANCE_SQL)
            .bind(user_id)
            .bind(movement.available)
            .bind(movement.frozen)
            .bind(movement.withdrawn)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn order_has_commissions(&mut self, order_id: Uuid) -> Result<bool, Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM commissions WHERE order_id = $1)"
        )
        .bind(order_id)
        .fetch_one(&mut *self.tx)
        .await
    }

    async fn insert_commission(&mut self, new: &NewCommission) -> Result<Commission, Error> {
        sqlx::query_as::<_, Commission>(
            r#"
            INSERT INTO commissions
            (distributor_id, order_id, from_user_id, commission_type, order_amount, rate, amount, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending'::commission_status)
            RETURNING
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
            "#
        )
        .bind(new.distributor_id)
        .bind(new.order_id)
        .bind(new.from_user_id)
        .bind(new.commission_type)
        .bind(new.order_amount)
        .bind(new.rate)
        .bind(new.amount)
        .fetch_one(&mut *self.tx)
        .await
    }

    async fn lock_commission(&mut self, commission_id: Uuid) -> Result<Option<Commission>, Error> {
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
            FOR UPDATE
            "#
        )
        .bind(commission_id)
        .fetch_optional(&mut *self.tx)
        .await
    }

    async fn settle_commission_if_pending(
        &mut self,
        commission_id: Uuid,
        settled_at: DateTime<Utc>,
    ) -> Result<u64, Error> {
        let result = sqlx::query(SETTLE_COMMISSION_SQL)
            .bind(commission_id)
            .bind(settled_at)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn settle_commissions_created_before(
        &mut self,
        cutoff: DateTime<Utc>,
        settled_at: DateTime<Utc>,
    ) -> Result<u64, Error> {
        let result = sqlx::query(SETTLE_DUE_COMMISSIONS_SQL)
            .bind(cutoff)
            .bind(settled_at)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn lock_withdrawal(&mut self, withdrawal_id: Uuid) -> Result<Option<Withdrawal>, Error> {
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
            FOR UPDATE
            "#
        )
        .bind(withdrawal_id)
        .fetch_optional(&mut *self.tx)
        .await
    }

    async fn insert_withdrawal(&mut self, new: &NewWithdrawal) -> Result<Withdrawal, Error> {
        sqlx::query_as::<_, Withdrawal>(
            r#"
            INSERT INTO withdrawals
            (withdrawal_no, user_id, withdrawal_type, amount, fee, actual_amount, withdraw_to, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending'::withdrawal_status)
            RETURNING
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
            "#
        )
        .bind(&new.withdrawal_no)
        .bind(new.user_id)
        .bind(new.withdrawal_type)
        .bind(new.amount)
        .bind(new.fee)
        .bind(new.actual_amount)
        .bind(new.withdraw_to)
        .fetch_one(&mut *self.tx)
        .await
    }

    async fn transition_withdrawal(
        &mut self,
        withdrawal_id: Uuid,
        from: WithdrawalStatus,
        to: WithdrawalStatus,
        operator_id: Uuid,
        reject_reason: Option<&str>,
    ) -> Result<u64, Error> {
        let result = sqlx::query(TRANSITION_WITHDRAWAL_SQL)
            .bind(withdrawal_id)
            .bind(from)
            .bind(to)
            .bind(operator_id)
            .bind(reject_reason)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_setting(
        &mut self,
        config: &CommissionConfig,
        created_by: Uuid,
    ) -> Result<CommissionSetting, Error> {
        let setting = sqlx::query_as::<_, CommissionSetting>(
            r#"
            INSERT INTO commission_settings
            (direct_rate, indirect_rate, min_withdraw, withdraw_fee, settle_delay_days, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING
                version,
                direct_rate,
                indirect_rate,
                min_withdraw,
                withdraw_fee,
                settle_delay_days,
                created_by,
                created_at
            "#
        )
        .bind(config.direct_rate)
        .bind(config.indirect_rate)
        .bind(config.min_withdraw)
        .bind(config.withdraw_fee)
        .bind(config.settle_delay_days)
        .bind(created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        // single-row pointer table, the primary key is the constant TRUE
        sqlx::query(
            r#"
            INSERT INTO commission_setting_current (singleton, version)
            VALUES (TRUE, $1)
            ON CONFLICT (singleton) DO UPDATE SET version = EXCLUDED.version
            "#
        )
        .bind(setting.version)
        .execute(&mut *self.tx)
        .await?;

        Ok(setting)
    }

    async fn commit(self: Box<Self>) -> Result<(), Error> {
        self.tx.commit().await
    }
}
