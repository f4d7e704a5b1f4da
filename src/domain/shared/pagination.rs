//! Pagination window resolution.
//!
//! Raw `page`/`limit` request parameters are resolved into a concrete
//! limit/skip window. Malformed or missing input silently falls back to
//! defaults; resolution never fails.

use serde::Serialize;

/// Page size used when the request carries no usable `limit`.
pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub limit: i64,
    pub skip: i64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            skip: 0,
        }
    }
}

impl PageWindow {
    /// Resolve raw `page`/`limit` parameters into a window.
    ///
    /// `limit` below 1 (or absent) falls back to [`DEFAULT_LIMIT`]; `page`
    /// below 1 (or absent) falls back to 1. `skip = (page - 1) * limit`.
    pub fn resolve(page: Option<i64>, limit: Option<i64>) -> Self {
        let limit = limit.filter(|l| *l >= 1).unwrap_or(DEFAULT_LIMIT);
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        Self {
            limit,
            skip: (page - 1) * limit,
        }
    }
}

/// Total page count for `matches` results at `limit` per page.
///
/// Rounds up; resolves to 0 whenever the match count is zero or the inputs
/// are unusable, never to a negative value.
pub fn page_count(matches: i64, limit: i64) -> i64 {
    if matches <= 0 || limit <= 0 {
        return 0;
    }
    (matches + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_is_page_minus_one_times_limit() {
        for page in 1..=5 {
            for limit in 1..=25 {
                let window = PageWindow::resolve(Some(page), Some(limit));
                assert_eq!(window.skip, (page - 1) * limit);
                assert_eq!(window.limit, limit);
            }
        }
    }

    #[test]
    fn missing_or_invalid_limit_uses_default() {
        assert_eq!(PageWindow::resolve(None, None).limit, DEFAULT_LIMIT);
        assert_eq!(PageWindow::resolve(Some(2), Some(0)).limit, DEFAULT_LIMIT);
        assert_eq!(PageWindow::resolve(Some(2), Some(-3)).limit, DEFAULT_LIMIT);
    }

    #[test]
    fn invalid_page_falls_back_to_first() {
        assert_eq!(PageWindow::resolve(Some(0), Some(10)).skip, 0);
        assert_eq!(PageWindow::resolve(Some(-1), Some(10)).skip, 0);
        assert_eq!(PageWindow::resolve(None, Some(10)).skip, 0);
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(25, 10), 3);
        assert_eq!(page_count(30, 10), 3);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(5, 10), 1);
    }

    #[test]
    fn page_count_degrades_to_zero() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(-4, 10), 0);
        assert_eq!(page_count(10, 0), 0);
    }
}
