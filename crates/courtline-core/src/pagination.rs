// ABOUTME: Limit/offset pagination parameters and page envelope
// ABOUTME: Clamps client-supplied limits so list endpoints stay bounded
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

use crate::constants::pagination::{DEFAULT_LIMIT, MAX_LIMIT};

/// Query parameters accepted by list endpoints
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct PageParams {
    /// Page size
    #[serde(default)]
    pub limit: Option<i64>,
    /// Rows to skip
    #[serde(default)]
    pub offset: Option<i64>,
}

impl PageParams {
    /// Page size clamped to `1..=MAX_LIMIT`
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Offset, never negative
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// A page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in this page
    pub items: Vec<T>,
    /// Total matching rows
    pub total: i64,
    /// Page size used
    pub limit: i64,
    /// Offset used
    pub offset: i64,
}

impl<T> Page<T> {
    /// Build a page from a query result
    #[must_use]
    pub fn new(items: Vec<T>, total: i64, params: &PageParams) -> Self {
        Self {
            items,
            total,
            limit: params.limit(),
            offset: params.offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_are_clamped() {
        let params = PageParams {
            limit: Some(10_000),
            offset: Some(-5),
        };
        assert_eq!(params.limit(), MAX_LIMIT);
        assert_eq!(params.offset(), 0);
        assert_eq!(PageParams::default().limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_page_records_clamped_window() {
        let params = PageParams {
            limit: Some(2),
            offset: Some(-1),
        };
        let page = Page::new(vec![1, 2], 5, &params);
        assert_eq!(page.total, 5);
        assert_eq!(page.limit, 2);
        assert_eq!(page.offset, 0);
    }
}
