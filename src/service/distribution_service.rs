// service/distribution_service.rs
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{ledgerdb::LedgerTx, DistributionStore},
    models::distributormodel::*,
    service::error::ServiceError,
};

/// Result of a status-guarded update. `Skipped` means the row was not in the
/// expected prior state, so the call changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionOutcome {
    Applied,
    Skipped,
}

impl TransitionOutcome {
    pub fn from_rows(rows: u64) -> Self {
        if rows == 0 {
            TransitionOutcome::Skipped
        } else {
            TransitionOutcome::Applied
        }
    }
}

#[derive(Clone)]
pub struct DistributionService {
    store: Arc<dyn DistributionStore>,
    max_depth: usize,
}

impl std::fmt::Debug for DistributionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributionService")
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl DistributionService {
    pub fn new(store: Arc<dyn DistributionStore>, max_depth: usize) -> Self {
        Self { store, max_depth }
    }

    pub async fn get_distributor(&self, distributor_id: Uuid) -> Result<Distributor, ServiceError> {
        self.store
            .get_distributor(distributor_id)
            .await
            .map_err(|e| ServiceError::from_lookup(e, ServiceError::DistributorNotFound(distributor_id)))
    }

    pub async fn get_distributor_by_user(&self, user_id: Uuid) -> Result<Distributor, ServiceError> {
        self.store
            .get_distributor_by_user(user_id)
            .await?
            .ok_or(ServiceError::DistributorNotFoundForUser(user_id))
    }

    pub async fn list_distributors(
        &self,
        filter: &DistributorFilter,
        page: u32,
        limit: usize,
    ) -> Result<(Vec<Distributor>, i64), ServiceError> {
        let rows = self.store.get_distributors(filter, page, limit).await?;
        let total = self.store.count_distributors(filter).await?;
        Ok((rows, total))
    }

    /// Enrols `user_id` as a pending distributor, optionally under the
    /// distributor owned by `referrer_user_id`.
    pub async fn apply(
        &self,
        user_id: Uuid,
        referrer_user_id: Option<Uuid>,
    ) -> Result<Distributor, ServiceError> {
        if referrer_user_id == Some(user_id) {
            return Err(ServiceError::Validation("A user cannot refer themselves".to_string()));
        }

        let mut tx = self.store.begin().await?;

        if tx.lock_distributor_by_user(user_id).await?.is_some() {
            return Err(ServiceError::DistributorAlreadyExists(user_id));
        }

        let (parent_id, level) = match referrer_user_id {
            Some(referrer) => {
                let parent = tx
                    .lock_distributor_by_user(referrer)
                    .await?
                    .filter(Distributor::is_approved)
                    .ok_or(ServiceError::InvalidReferrer(referrer))?;
                let level = if parent.parent_id.is_some() {
                    DistributorLevel::Indirect
                } else {
                    DistributorLevel::Direct
                };
                (Some(parent.id), level)
            }
            None => (None, DistributorLevel::Direct),
        };

        let distributor = tx
            .insert_distributor(&NewDistributor { user_id, parent_id, level })
            .await?;
        tx.commit().await?;

        tracing::info!(
            "distributor {} applied for user {} (parent: {:?})",
            distributor.id,
            user_id,
            parent_id
        );
        Ok(distributor)
    }

    /// Approves a pending distributor and credits its upline: the parent
    /// gains one direct member and one team member, every further ancestor
    /// one team member. Already-reviewed distributors are left alone.
    pub async fn approve(
        &self,
        distributor_id: Uuid,
        operator_id: Uuid,
    ) -> Result<TransitionOutcome, ServiceError> {
        let mut tx = self.store.begin().await?;

        let distributor = tx
            .lock_distributor(distributor_id)
            .await?
            .ok_or(ServiceError::DistributorNotFound(distributor_id))?;

        if distributor.status != DistributorStatus::Pending {
            tracing::debug!(
                "distributor {} already {}, approval skipped",
                distributor_id,
                distributor.status.to_str()
            );
            return Ok(TransitionOutcome::Skipped);
        }

        let rows = tx
            .approve_distributor_if_pending(distributor_id, operator_id, Utc::now())
            .await?;
        if rows == 0 {
            return Ok(TransitionOutcome::Skipped);
        }

        if let Some(parent_id) = distributor.parent_id {
            self.credit_upline(tx.as_mut(), distributor_id, parent_id).await?;
        }

        tx.commit().await?;

        tracing::info!("distributor {} approved by {}", distributor_id, operator_id);
        Ok(TransitionOutcome::Applied)
    }

    async fn credit_upline(
        &self,
        tx: &mut dyn LedgerTx,
        distributor_id: Uuid,
        parent_id: Uuid,
    ) -> Result<(), ServiceError> {
        let parent = tx
            .lock_distributor(parent_id)
            .await?
            .ok_or(ServiceError::BrokenReferralChain { distributor_id, missing: parent_id })?;
        if tx.add_team_counts(parent.id, 1, 1).await? == 0 {
            return Err(ServiceError::BrokenReferralChain { distributor_id, missing: parent.id });
        }

        let mut next = parent.parent_id;
        let mut depth = 1;
        while let Some(ancestor_id) = next {
            depth += 1;
            if depth > self.max_depth {
                tracing::warn!(
                    "referral chain of {} is deeper than {}, possible cycle",
                    distributor_id,
                    self.max_depth
                );
                return Err(ServiceError::ReferralChainTooDeep {
                    distributor_id,
                    max_depth: self.max_depth,
                });
            }

            let ancestor = tx
                .lock_distributor(ancestor_id)
                .await?
                .ok_or(ServiceError::BrokenReferralChain { distributor_id, missing: ancestor_id })?;
            if tx.add_team_counts(ancestor.id, 0, 1).await? == 0 {
                return Err(ServiceError::BrokenReferralChain { distributor_id, missing: ancestor.id });
            }
            next = ancestor.parent_id;
        }

        Ok(())
    }

    /// Rejects a pending distributor; any other status is a no-op.
    pub async fn reject(
        &self,
        distributor_id: Uuid,
        operator_id: Uuid,
        reason: &str,
    ) -> Result<TransitionOutcome, ServiceError> {
        let mut tx = self.store.begin().await?;

        if tx.lock_distributor(distributor_id).await?.is_none() {
            return Err(ServiceError::DistributorNotFound(distributor_id));
        }

        let outcome = TransitionOutcome::from_rows(
            tx.reject_distributor_if_pending(distributor_id, reason).await?,
        );
        tx.commit().await?;

        match outcome {
            TransitionOutcome::Applied => {
                tracing::info!("distributor {} rejected by {}: {}", distributor_id, operator_id, reason)
            }
            TransitionOutcome::Skipped => {
                tracing::debug!("distributor {} not pending, rejection skipped", distributor_id)
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memorydb::MemoryStore;

    fn service(store: &MemoryStore) -> DistributionService {
        DistributionService::new(Arc::new(store.clone()), 64)
    }

    #[tokio::test]
    async fn approving_child_credits_parent() {
        let store = MemoryStore::new();
        let a = store.add_distributor(None, DistributorStatus::Approved).await;
        let b = store.add_distributor(Some(a.id), DistributorStatus::Pending).await;
        let op = Uuid::new_v4();

        let outcome = service(&store).approve(b.id, op).await.unwrap();
        assert_eq!(outcome, TransitionOutcome::Applied);

        let b = store.distributor(b.id).await;
        assert_eq!(b.status, DistributorStatus::Approved);
        assert_eq!(b.approved_by, Some(op));
        assert!(b.approved_at.is_some());

        let a = store.distributor(a.id).await;
        assert_eq!(a.direct_count, 1);
        assert_eq!(a.team_count, 1);
    }

    #[tokio::test]
    async fn approving_walks_every_ancestor() {
        let store = MemoryStore::new();
        let root = store.add_distributor(None, DistributorStatus::Approved).await;
        let mid = store.add_distributor(Some(root.id), DistributorStatus::Approved).await;
        let parent = store.add_distributor(Some(mid.id), DistributorStatus::Approved).await;
        let child = store.add_distributor(Some(parent.id), DistributorStatus::Pending).await;

        service(&store).approve(child.id, Uuid::new_v4()).await.unwrap();

        let parent = store.distributor(parent.id).await;
        assert_eq!((parent.direct_count, parent.team_count), (1, 1));
        let mid = store.distributor(mid.id).await;
        assert_eq!((mid.direct_count, mid.team_count), (0, 1));
        let root = store.distributor(root.id).await;
        assert_eq!((root.direct_count, root.team_count), (0, 1));
    }

    #[tokio::test]
    async fn approving_twice_changes_nothing() {
        let store = MemoryStore::new();
        let a = store.add_distributor(None, DistributorStatus::Approved).await;
        let b = store.add_distributor(Some(a.id), DistributorStatus::Pending).await;
        let svc = service(&store);

        svc.approve(b.id, Uuid::new_v4()).await.unwrap();
        let outcome = svc.approve(b.id, Uuid::new_v4()).await.unwrap();
        assert_eq!(outcome, TransitionOutcome::Skipped);

        let a = store.distributor(a.id).await;
        assert_eq!((a.direct_count, a.team_count), (1, 1));
    }

    #[tokio::test]
    async fn approving_rejected_distributor_is_a_no_op() {
        let store = MemoryStore::new();
        let a = store.add_distributor(None, DistributorStatus::Approved).await;
        let b = store.add_distributor(Some(a.id), DistributorStatus::Rejected).await;

        let outcome = service(&store).approve(b.id, Uuid::new_v4()).await.unwrap();
        assert_eq!(outcome, TransitionOutcome::Skipped);
        assert_eq!(store.distributor(b.id).await.status, DistributorStatus::Rejected);
        assert_eq!(store.distributor(a.id).await.team_count, 0);
    }

    #[tokio::test]
    async fn broken_chain_rolls_back_everything() {
        let store = MemoryStore::new();
        let ghost = Uuid::new_v4();
        let parent = store.add_distributor(Some(ghost), DistributorStatus::Approved).await;
        let child = store.add_distributor(Some(parent.id), DistributorStatus::Pending).await;

        let err = service(&store).approve(child.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::BrokenReferralChain { distributor_id, missing } if distributor_id == child.id && missing == ghost
        ));

        assert_eq!(store.distributor(child.id).await.status, DistributorStatus::Pending);
        let parent = store.distributor(parent.id).await;
        assert_eq!((parent.direct_count, parent.team_count), (0, 0));
    }

    #[tokio::test]
    async fn refused_team_count_update_rolls_back() {
        let store = MemoryStore::new();
        let root = store.add_distributor(None, DistributorStatus::Approved).await;
        let parent = store.add_distributor(Some(root.id), DistributorStatus::Approved).await;
        let child = store.add_distributor(Some(parent.id), DistributorStatus::Pending).await;
        store.set_team_counts(root.id, 0, -5).await;

        let err = service(&store).approve(child.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::BrokenReferralChain { distributor_id, missing } if distributor_id == child.id && missing == root.id
        ));

        assert_eq!(store.distributor(child.id).await.status, DistributorStatus::Pending);
        let parent = store.distributor(parent.id).await;
        assert_eq!((parent.direct_count, parent.team_count), (0, 0));
    }

    #[tokio::test]
    async fn cyclic_chain_hits_depth_guard() {
        let store = MemoryStore::new();
        let a = store.add_distributor(None, DistributorStatus::Approved).await;
        let b = store.add_distributor(Some(a.id), DistributorStatus::Approved).await;
        store.set_parent(a.id, Some(b.id)).await;
        let child = store.add_distributor(Some(b.id), DistributorStatus::Pending).await;

        let svc = DistributionService::new(Arc::new(store.clone()), 8);
        let err = svc.approve(child.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::ReferralChainTooDeep { max_depth: 8, .. }));

        assert_eq!(store.distributor(child.id).await.status, DistributorStatus::Pending);
        assert_eq!(store.distributor(a.id).await.team_count, 0);
        assert_eq!(store.distributor(b.id).await.team_count, 0);
    }

    #[tokio::test]
    async fn chain_exactly_at_depth_limit_is_accepted() {
        let store = MemoryStore::new();
        let mut upline = None;
        let mut ids = Vec::new();
        for _ in 0..3 {
            let d = store.add_distributor(upline, DistributorStatus::Approved).await;
            upline = Some(d.id);
            ids.push(d.id);
        }
        let child = store.add_distributor(upline, DistributorStatus::Pending).await;

        let svc = DistributionService::new(Arc::new(store.clone()), 3);
        svc.approve(child.id, Uuid::new_v4()).await.unwrap();
        for id in ids {
            assert_eq!(store.distributor(id).await.team_count, 1);
        }

        let deeper = store.add_distributor(Some(child.id), DistributorStatus::Pending).await;
        let err = svc.approve(deeper.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::ReferralChainTooDeep { .. }));
    }

    #[tokio::test]
    async fn missing_distributor_is_not_found() {
        let store = MemoryStore::new();
        let err = service(&store).approve(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::DistributorNotFound(_)));
    }

    #[tokio::test]
    async fn reject_only_applies_to_pending() {
        let store = MemoryStore::new();
        let pending = store.add_distributor(None, DistributorStatus::Pending).await;
        let approved = store.add_distributor(None, DistributorStatus::Approved).await;
        let svc = service(&store);

        let outcome = svc.reject(pending.id, Uuid::new_v4(), "incomplete profile").await.unwrap();
        assert_eq!(outcome, TransitionOutcome::Applied);
        let pending = store.distributor(pending.id).await;
        assert_eq!(pending.status, DistributorStatus::Rejected);
        assert_eq!(pending.reject_reason.as_deref(), Some("incomplete profile"));

        let outcome = svc.reject(approved.id, Uuid::new_v4(), "late").await.unwrap();
        assert_eq!(outcome, TransitionOutcome::Skipped);
        assert_eq!(store.distributor(approved.id).await.status, DistributorStatus::Approved);
    }

    #[tokio::test]
    async fn apply_sets_level_from_referrer_depth() {
        let store = MemoryStore::new();
        let root = store.add_distributor(None, DistributorStatus::Approved).await;
        let mid = store.add_distributor(Some(root.id), DistributorStatus::Approved).await;
        let svc = service(&store);

        let under_root = svc.apply(Uuid::new_v4(), Some(root.user_id)).await.unwrap();
        assert_eq!(under_root.level, DistributorLevel::Direct);
        assert_eq!(under_root.parent_id, Some(root.id));
        assert_eq!(under_root.status, DistributorStatus::Pending);

        let under_mid = svc.apply(Uuid::new_v4(), Some(mid.user_id)).await.unwrap();
        assert_eq!(under_mid.level, DistributorLevel::Indirect);
    }

    #[tokio::test]
    async fn apply_rejects_duplicates_and_unapproved_referrers() {
        let store = MemoryStore::new();
        let pending = store.add_distributor(None, DistributorStatus::Pending).await;
        let svc = service(&store);

        let err = svc.apply(Uuid::new_v4(), Some(pending.user_id)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidReferrer(_)));

        let user = Uuid::new_v4();
        svc.apply(user, None).await.unwrap();
        let err = svc.apply(user, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::DistributorAlreadyExists(u) if u == user));
    }
}
