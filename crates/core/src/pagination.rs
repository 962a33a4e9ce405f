//! Limit/offset helpers shared by every paginated list.

/// Default page size for endpoint and delivery listings.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: i64 = 200;

/// One window of a newest-first listing plus the total count of the
/// unwindowed result.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    /// Cut `[offset, offset + limit)` out of an already-ordered list.
    pub fn from_ordered(all: Vec<T>, limit: i64, offset: i64) -> Self {
        let total = all.len() as i64;
        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let items = all.into_iter().skip(offset).take(limit).collect();
        Self { items, total }
    }
}

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limit_uses_default_when_none() {
        assert_eq!(clamp_limit(None, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT), 50);
    }

    #[test]
    fn clamp_limit_respects_max() {
        assert_eq!(clamp_limit(Some(1000), 50, 200), 200);
    }

    #[test]
    fn clamp_limit_floors_at_one() {
        assert_eq!(clamp_limit(Some(0), 50, 200), 1);
        assert_eq!(clamp_limit(Some(-3), 50, 200), 1);
    }

    #[test]
    fn clamp_offset_floors_at_zero() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(-10)), 0);
        assert_eq!(clamp_offset(Some(7)), 7);
    }

    #[test]
    fn page_total_ignores_window() {
        let page = Page::from_ordered((0..10).collect::<Vec<_>>(), 3, 4);
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total, 10);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = Page::from_ordered(vec!['a', 'b'], 5, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
    }
}
