use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::MutexGuard;

use crate::dates::parse_iso_date;
use crate::error::Result;
use crate::models::{LifetimeStats, UserId};
use crate::progress::average_rate;

pub struct LifetimeStatsQuery<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> LifetimeStatsQuery<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    pub fn books_completed(&self, user: UserId) -> Result<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM history WHERE user_id = ?1",
            rusqlite::params![user.0],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    /// Whole page counts of finished books plus pages read in current ones.
    pub fn pages_read(&self, user: UserId) -> Result<u64> {
        let history: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(b.pages), 0) FROM history h JOIN books b ON b.id = h.book_id
             WHERE h.user_id = ?1",
            rusqlite::params![user.0],
            |row| row.get(0),
        )?;

        let current: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(page), 0) FROM current_reading WHERE user_id = ?1",
            rusqlite::params![user.0],
            |row| row.get(0),
        )?;

        Ok((history + current) as u64)
    }

    pub fn earliest_start(&self, user: UserId) -> Result<Option<NaiveDate>> {
        let raw: Option<String> = self.conn.query_row(
            "SELECT MIN(start_date) FROM history WHERE user_id = ?1",
            rusqlite::params![user.0],
            |row| row.get(0),
        )?;
        Ok(raw.map(|s| parse_iso_date(&s)).transpose()?)
    }

    pub fn get_stats(&self, user: UserId, today: NaiveDate) -> Result<LifetimeStats> {
        let total_books_completed = self.books_completed(user)?;
        let total_pages_read = self.pages_read(user)?;
        let average_daily_rate = average_rate(total_pages_read, self.earliest_start(user)?, today);

        Ok(LifetimeStats {
            total_books_completed,
            total_pages_read,
            average_daily_rate,
        })
    }
}
