//! Pagination utilities for list endpoints.
//!
//! List endpoints are page-based:
//! - `page`: Page number (1-indexed, default: 1)
//! - `page_size`: Items per page (1-100, default: 10)
//!
//! Responses wrap the rows in a [`Paginated`] envelope:
//!
//! ```json
//! {
//!   "data": [...],
//!   "meta": { "total": 42, "page": 2, "page_size": 10, "has_more": true }
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Deserializes an optional string into an optional i64.
///
/// Query strings may carry empty values (`?page=`), which are treated as `None`.
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Metadata about a paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of items visible to the caller
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page that was applied
    pub page_size: i64,
    /// Whether there are more items after this page
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(params: &PaginationParams, total: i64) -> Self {
        Self {
            total,
            page: params.page(),
            page_size: params.page_size(),
            has_more: params.offset() + params.page_size() < total,
        }
    }
}

/// Query parameters for pagination.
///
/// `page_size` is clamped to [1, 100] and `page` to a minimum of 1.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    /// Items per page (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page_size: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn page_size(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows to skip for the current page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.page_size()
    }
}

/// Paginated response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total: i64) -> Self {
        Self {
            data,
            meta: PaginationMeta::new(params, total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
