//! Pagination math and response metadata.

use serde::Serialize;

/// Pagination block returned alongside listings. `pages` is always computed
/// fresh from the query's total count at response time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub limit: i64,
    pub page: i64,
    pub pages: i64,
    pub rows: i64,
}

impl PageInfo {
    pub fn compute(limit: i64, page: i64, rows: i64) -> Self {
        let pages = if limit > 0 { (rows + limit - 1) / limit } else { 0 };
        Self { limit, page, pages, rows }
    }
}

/// Offset for a 1-indexed page.
pub fn offset(page: i64, limit: i64) -> i64 {
    (page - 1) * limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_use_ceiling_division() {
        assert_eq!(PageInfo::compute(10, 2, 25).pages, 3);
        assert_eq!(PageInfo::compute(10, 1, 30).pages, 3);
        assert_eq!(PageInfo::compute(10, 1, 31).pages, 4);
        assert_eq!(PageInfo::compute(10, 1, 0).pages, 0);
    }

    #[test]
    fn metadata_matches_the_request() {
        let info = PageInfo::compute(10, 2, 25);
        assert_eq!(info, PageInfo { limit: 10, page: 2, pages: 3, rows: 25 });
    }

    #[test]
    fn offset_is_zero_based_from_page_one() {
        assert_eq!(offset(1, 10), 0);
        assert_eq!(offset(2, 10), 10);
        assert_eq!(offset(3, 25), 50);
    }
}
