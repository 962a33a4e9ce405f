//! Shared query parameter types for API handlers.

use carehook_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// `(limit, offset)` clamped to the listing bounds.
    pub fn window(&self) -> (i64, i64) {
        (
            clamp_limit(self.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
            clamp_offset(self.offset),
        )
    }
}

/// `GET /webhooks` parameters. `tenant_id` is required but kept optional
/// here so a missing value becomes a JSON 400 rather than a plain-text
/// extractor rejection.
#[derive(Debug, Deserialize)]
pub struct ListEndpointsParams {
    pub tenant_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListEndpointsParams {
    pub fn page(&self) -> PaginationParams {
        PaginationParams {
            limit: self.limit,
            offset: self.offset,
        }
    }
}
