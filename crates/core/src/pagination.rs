//! List pagination shared by every listing endpoint.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 25;
pub const MAX_LIMIT: u32 = 50;

/// Normalized page request.
///
/// Construct with [`ListQuery::new`]; out-of-range input is clamped rather than rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ListQuery {
    page: u32,
    limit: u32,
}

impl ListQuery {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = match limit {
            None | Some(0) => DEFAULT_LIMIT,
            Some(l) => l.min(MAX_LIMIT),
        };
        Self { page, limit }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Apply this window to an already ordered, fully materialized list.
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let count = items.len() as u64;
        let data = items
            .into_iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(self.limit as usize)
            .collect();
        Page {
            count,
            page: self.page,
            limit: self.limit,
            data,
        }
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u32,
    pub limit: u32,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            limit: self.limit,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_absent() {
        let q = ListQuery::new(None, None);
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 25);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn limit_is_capped_and_page_floored() {
        let q = ListQuery::new(Some(0), Some(500));
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), MAX_LIMIT);
    }

    #[test]
    fn slice_reports_total_count() {
        let q = ListQuery::new(Some(2), Some(3));
        let page = q.slice((1..=8).collect::<Vec<_>>());
        assert_eq!(page.count, 8);
        assert_eq!(page.data, vec![4, 5, 6]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            #[test]
            fn slice_never_exceeds_limit(page in 0u32..20, limit in 0u32..100, len in 0usize..200) {
                let q = ListQuery::new(Some(page), Some(limit));
                let result = q.slice((0..len).collect::<Vec<_>>());
                prop_assert!(result.data.len() <= q.limit() as usize);
                prop_assert_eq!(result.count, len as u64);
                if let Some(first) = result.data.first() {
                    prop_assert_eq!(*first as u64, q.offset());
                }
            }
        }
    }
}
