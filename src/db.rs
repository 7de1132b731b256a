//5
use async_trait::async_trait;
use sqlx::{Pool, Postgres};

pub mod commissiondb;
pub mod distributordb;
pub mod ledgerdb;
pub mod settingdb;
pub mod withdrawaldb;

#[cfg(test)]
pub mod memorydb;

use commissiondb::CommissionExt;
use distributordb::DistributorExt;
use ledgerdb::{LedgerTx, PgLedgerTx};
use settingdb::SettingExt;
use withdrawaldb::WithdrawalExt;

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .field("size", &self.pool.size())
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}

/// Everything the referral services need from storage: plain reads through
/// the per-entity traits, and `begin` for multi-row writes.
#[async_trait]
pub trait DistributionStore: DistributorExt + CommissionExt + WithdrawalExt + SettingExt {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, sqlx::Error>;
}

#[async_trait]
impl DistributionStore for DBClient {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, sqlx::Error> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTx::new(tx)))
    }
}
