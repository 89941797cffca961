use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::MutexGuard;

use crate::dates::to_iso_date;
use crate::error::{Result, TrackerError};
use crate::isbn::Isbn13;
use crate::models::{BookId, HistoryEntry, ReadingRecord, UserId};

use super::{date_column, row_to_book, Repository, BOOK_COLUMNS};

/// A user's current books. Every method is scoped by an explicit `UserId`.
pub trait ReadingRepository: Repository<Entity = ReadingRecord, Id = (UserId, BookId)> {
    fn insert(&self, user: UserId, book: BookId, target: Option<NaiveDate>) -> Result<()>;
    fn find_by_isbn(&self, user: UserId, isbn: &Isbn13) -> Result<Option<ReadingRecord>>;
    /// Most recently started first; books not started yet come last.
    fn list(&self, user: UserId) -> Result<Vec<ReadingRecord>>;
    /// Sets the page and, on the first update, the start date. Returns
    /// whether a row matched.
    fn record_page(&self, user: UserId, book: BookId, page: u32, today: NaiveDate) -> Result<bool>;
    fn set_target(&self, user: UserId, book: BookId, target: Option<NaiveDate>) -> Result<bool>;
    fn delete(&self, user: UserId, book: BookId) -> Result<bool>;
    /// Inserts the history entry and removes the current row atomically.
    fn move_to_history(&self, user: UserId, entry: &HistoryEntry) -> Result<()>;
}

pub struct SqliteReadingRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteReadingRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn select(filter: &str) -> String {
        format!(
            "SELECT {BOOK_COLUMNS}, c.page, c.start_date, c.target_date
             FROM current_reading c JOIN books b ON b.id = c.book_id
             WHERE c.user_id = ?1 {filter}"
        )
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ReadingRecord> {
        Ok(ReadingRecord {
            book: row_to_book(row, 0)?,
            page: row.get(5)?,
            start_date: date_column(row, 6)?,
            target_date: date_column(row, 7)?,
        })
    }
}

impl<'a> Repository for SqliteReadingRepository<'a> {
    type Entity = ReadingRecord;
    type Id = (UserId, BookId);

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let (user, book) = id;
        let record = self
            .conn
            .query_row(
                &Self::select("AND c.book_id = ?2"),
                params![user.0, book.0],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }
}

impl<'a> ReadingRepository for SqliteReadingRepository<'a> {
    fn insert(&self, user: UserId, book: BookId, target: Option<NaiveDate>) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO current_reading (user_id, book_id, target_date) VALUES (?1, ?2, ?3)",
                params![user.0, book.0, target.map(to_iso_date)],
            )
            .map_err(|e| {
                if super::is_constraint_violation(&e) {
                    TrackerError::AlreadyReading(book.to_string())
                } else {
                    TrackerError::Database(e)
                }
            })?;
        Ok(())
    }

    fn find_by_isbn(&self, user: UserId, isbn: &Isbn13) -> Result<Option<ReadingRecord>> {
        let record = self
            .conn
            .query_row(
                &Self::select("AND b.isbn = ?2"),
                params![user.0, isbn.as_str()],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn list(&self, user: UserId) -> Result<Vec<ReadingRecord>> {
        let mut stmt = self
            .conn
            .prepare(&Self::select("ORDER BY c.start_date DESC, b.title ASC"))?;
        let rows = stmt
            .query_map(params![user.0], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn record_page(&self, user: UserId, book: BookId, page: u32, today: NaiveDate) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE current_reading
             SET page = ?1, start_date = COALESCE(start_date, ?2)
             WHERE user_id = ?3 AND book_id = ?4",
            params![page, to_iso_date(today), user.0, book.0],
        )?;
        Ok(updated > 0)
    }

    fn set_target(&self, user: UserId, book: BookId, target: Option<NaiveDate>) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE current_reading SET target_date = ?1 WHERE user_id = ?2 AND book_id = ?3",
            params![target.map(to_iso_date), user.0, book.0],
        )?;
        Ok(updated > 0)
    }

    fn delete(&self, user: UserId, book: BookId) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM current_reading WHERE user_id = ?1 AND book_id = ?2",
            params![user.0, book.0],
        )?;
        Ok(deleted > 0)
    }

    fn move_to_history(&self, user: UserId, entry: &HistoryEntry) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO history (user_id, book_id, start_date, end_date, days, rate)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.0,
                entry.book.id.0,
                to_iso_date(entry.start_date),
                to_iso_date(entry.end_date),
                entry.days,
                entry.rate,
            ],
        )?;
        let deleted = tx.execute(
            "DELETE FROM current_reading WHERE user_id = ?1 AND book_id = ?2",
            params![user.0, entry.book.id.0],
        )?;
        if deleted == 0 {
            // dropping the transaction rolls the history insert back
            return Err(TrackerError::BookNotFound(entry.book.id.to_string()));
        }
        tx.commit()?;
        Ok(())
    }
}
