use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Book;

// ─── Current ───────────────────────────────────────────────

/// A book a user is currently reading (or has added but not started).
///
/// `page` and `start_date` are set together by the first page update, so a
/// record never has a page without a start date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub book: Book,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
}

impl ReadingRecord {
    /// Pages read so far, `None` until reading has started.
    pub fn pages_read(&self) -> Option<u32> {
        self.start_date.map(|_| self.page.unwrap_or(0))
    }

    pub fn pages_left(&self) -> u32 {
        self.book.pages.saturating_sub(self.page.unwrap_or(0))
    }
}

// ─── History ───────────────────────────────────────────────

/// Immutable record of a completed book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub book: Book,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Inclusive day count, at least 1.
    pub days: u32,
    /// Pages per day over `days`.
    pub rate: f64,
}
