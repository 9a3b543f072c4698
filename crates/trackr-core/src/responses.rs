//! Result objects returned by the engine's outward operations.
//!
//! Every operation answers with an [`ApiResponse`] carrying a status code, the
//! payload, and a human-readable message. Listing returns a [`Page`].

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::ErrorKind;

/// Envelope for a successful operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            data,
            message: message.into(),
            success: true,
        }
    }

    #[must_use]
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: 201,
            data,
            message: message.into(),
            success: true,
        }
    }

    /// Consume the envelope, keeping only the payload.
    pub fn into_data(self) -> T {
        self.data
    }
}

/// Envelope for a failed operation, as emitted by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status_code: u16,
    pub kind: ErrorKind,
    pub message: String,
    pub success: bool,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status_code: kind.status_code(),
            kind,
            message: message.into(),
            success: false,
        }
    }
}

/// Pagination metadata for listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub limit: u32,
}

impl PageInfo {
    #[must_use]
    pub fn new(page: u32, limit: u32, total_items: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = u32::try_from(total_items.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);
        Self {
            current_page: page,
            total_pages,
            total_items,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
            limit,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

/// Outcome of a soft delete, naming every issue the cascade touched.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DeleteReport {
    pub issue_id: String,
    pub key: String,
    /// Subtasks deleted along with the issue.
    pub cascaded: Vec<String>,
    pub deleted_by: String,
    pub deleted_at: DateTime<Utc>,
}
