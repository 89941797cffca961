use serde::{Deserialize, Serialize};

/// Aggregate over a user's completed books and current page counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeStats {
    pub total_books_completed: u32,
    pub total_pages_read: u64,
    /// Pages per day since the earliest history start date, rounded.
    pub average_daily_rate: u32,
}
