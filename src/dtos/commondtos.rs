// dtos/commondtos.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::service::distribution_service::TransitionOutcome;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub status: String,
    pub data: Vec<T>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PaginationMetadata {
    pub total: i64,
    pub page: u32,
    pub limit: usize,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: u32, limit: usize) -> Self {
        let per_page = limit.max(1) as i64;
        Self {
            status: "success".to_string(),
            data,
            pagination: PaginationMetadata {
                total,
                page,
                limit,
                total_pages: (total + per_page - 1) / per_page,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RejectRequestDto {
    #[validate(length(min = 1, max = 500, message = "Reason must be between 1 and 500 characters"))]
    pub reason: String,
}

/// Body of every state-transition endpoint. A `skipped` outcome means the
/// record was no longer in the state the action starts from.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionResponseDto {
    pub id: Uuid,
    pub outcome: TransitionOutcome,
}
