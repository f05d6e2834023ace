/// Database models for TaskDesk
///
/// Each model owns its PostgreSQL queries as associated functions taking a
/// `&PgPool`; the [`crate::repository`] layer wraps them behind traits.
///
/// # Models
///
/// - `user`: Manager and employee accounts
/// - `task`: Assigned work and its lifecycle
/// - `notification`: Per-user inbox entries

pub mod notification;
pub mod task;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page selection for list queries (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Builds a pagination, applying defaults and clamping out-of-range values
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    /// Slices an in-memory result set
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .iter()
            .skip(start)
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Deserializes a present field into `Some`, so that together with
/// `#[serde(default)]` an absent key becomes `None` and `null` becomes
/// `Some(None)`
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_clamping() {
        assert_eq!(Pagination::default(), Pagination { page: 1, limit: 10 });
        assert_eq!(Pagination::new(Some(0), Some(0)), Pagination { page: 1, limit: 1 });
        assert_eq!(Pagination::new(Some(3), Some(500)).limit, MAX_PAGE_SIZE);
        assert_eq!(Pagination::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn test_pagination_slice() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(Pagination::new(Some(3), Some(10)).slice(&items), vec![21, 22, 23, 24, 25]);
        assert!(Pagination::new(Some(9), Some(10)).slice(&items).is_empty());
    }
}
