use rusqlite::{params, Connection};
use std::sync::MutexGuard;

use crate::error::Result;
use crate::models::{HistoryEntry, UserId};

use super::{required_date_column, row_to_book, BOOK_COLUMNS};

/// Completed books. Entries are only ever inserted (see
/// `ReadingRepository::move_to_history`), never updated.
pub trait HistoryRepository {
    /// Most recently finished first.
    fn list(&self, user: UserId) -> Result<Vec<HistoryEntry>>;
}

pub struct SqliteHistoryRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteHistoryRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
        Ok(HistoryEntry {
            book: row_to_book(row, 0)?,
            start_date: required_date_column(row, 5)?,
            end_date: required_date_column(row, 6)?,
            days: row.get(7)?,
            rate: row.get(8)?,
        })
    }
}

impl<'a> HistoryRepository for SqliteHistoryRepository<'a> {
    fn list(&self, user: UserId) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOK_COLUMNS}, h.start_date, h.end_date, h.days, h.rate
             FROM history h JOIN books b ON b.id = h.book_id
             WHERE h.user_id = ?1 ORDER BY h.end_date DESC, h.id DESC"
        ))?;
        let rows = stmt
            .query_map(params![user.0], Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::models::Book;
    use crate::storage::repositories::test_support::{pool, seed_book, seed_user};
    use crate::storage::repositories::{ReadingRepository, SqliteReadingRepository};
    use crate::storage::database::ConnectionPool;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn finish(pool: &ConnectionPool, user: UserId, book: &Book, start: NaiveDate, end: NaiveDate) {
        let repo = SqliteReadingRepository::new(pool.get_connection());
        repo.insert(user, book.id, None).unwrap();
        let days = (end - start).num_days() as u32 + 1;
        let entry = HistoryEntry {
            book: book.clone(),
            start_date: start,
            end_date: end,
            days,
            rate: f64::from(book.pages) / f64::from(days),
        };
        repo.move_to_history(user, &entry).unwrap();
    }

    #[test]
    fn test_list_newest_finished_first() {
        let pool = pool();
        let user = seed_user(pool.get_connection(), "jack");
        let a = seed_book(pool.get_connection(), "9780306406157", 300);
        let b = seed_book(pool.get_connection(), "9780441172719", 412);
        finish(&pool, user.id, &a, date(2020, 1, 1), date(2020, 3, 1));
        finish(&pool, user.id, &b, date(2020, 2, 1), date(2020, 2, 20));

        let repo = SqliteHistoryRepository::new(pool.get_connection());
        let newest: Vec<_> = repo.list(user.id).unwrap();
        assert_eq!(newest[0].book.id, a.id);
        assert_eq!(newest[1].days, 20);
    }

    #[test]
    fn test_empty_history() {
        let pool = pool();
        let user = seed_user(pool.get_connection(), "jack");
        let repo = SqliteHistoryRepository::new(pool.get_connection());
        assert!(repo.list(user.id).unwrap().is_empty());
    }
}
