use thiserror::Error;
use uuid::Uuid;
use axum::http::StatusCode;

use crate::error::{ErrorMessage, HttpError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Distributor {0} not found")]
    DistributorNotFound(Uuid),

    #[error("No distributor record for user {0}")]
    DistributorNotFoundForUser(Uuid),

    #[error("User {0} is already registered as a distributor")]
    DistributorAlreadyExists(Uuid),

    #[error("Commission {0} not found")]
    CommissionNotFound(Uuid),

    #[error("Commissions for order {0} have already been recorded")]
    CommissionAlreadyRecorded(Uuid),

    #[error("Withdrawal {0} not found")]
    WithdrawalNotFound(Uuid),

    #[error("Referrer {0} is not an approved distributor")]
    InvalidReferrer(Uuid),

    #[error("Referral chain of distributor {distributor_id} is broken: ancestor {missing} does not exist")]
    BrokenReferralChain { distributor_id: Uuid, missing: Uuid },

    #[error("Referral chain of distributor {distributor_id} exceeds the maximum depth of {max_depth}")]
    ReferralChainTooDeep { distributor_id: Uuid, max_depth: usize },

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    /// Repository lookups report a missing row as `RowNotFound`; callers
    /// swap that for the entity's own sentinel and pass the rest through.
    pub fn from_lookup(err: sqlx::Error, not_found: ServiceError) -> ServiceError {
        match err {
            sqlx::Error::RowNotFound => not_found,
            other => ServiceError::Database(other),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::DistributorNotFound(_)
            | ServiceError::DistributorNotFoundForUser(_)
            | ServiceError::CommissionNotFound(_)
            | ServiceError::WithdrawalNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::DistributorAlreadyExists(_)
            | ServiceError::CommissionAlreadyRecorded(_) => StatusCode::CONFLICT,

            ServiceError::InvalidReferrer(_)
            | ServiceError::InsufficientBalance(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::BrokenReferralChain { .. }
            | ServiceError::ReferralChainTooDeep { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            ServiceError::OperationFailed(_)
            | ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Database(ref e) => {
                tracing::error!("database error: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
            _ => HttpError::new(error.to_string(), error.status_code()),
        }
    }
}
