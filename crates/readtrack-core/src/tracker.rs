use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{days_between, tomorrow};
use crate::error::{Result, TrackerError};
use crate::isbn::Isbn13;
use crate::models::{Book, BookId, HistoryEntry, LifetimeStats, NewBook, ReadingRecord, User, UserId};
use crate::progress::{compute_progress, compute_rate, BookDashboard, FixedRate};
use crate::storage::database::Database;

/// A current book with its progress percentage, as listed on the overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentBook {
    #[serde(flatten)]
    pub record: ReadingRecord,
    pub progress: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingHistory {
    pub entries: Vec<HistoryEntry>,
    pub stats: LifetimeStats,
}

/// Account and reading lifecycle operations on top of the store.
///
/// Nothing is remembered between calls: the caller authenticates once and
/// passes the resulting [`UserId`] along with the date it considers today.
pub struct ReadingTracker<'a> {
    db: &'a Database,
    bcrypt_cost: u32,
}

impl<'a> ReadingTracker<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    // ─── Accounts ──────────────────────────────────────────

    pub fn register(&self, username: &str, password: &str, confirmation: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(TrackerError::Validation("username must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(TrackerError::Validation("password must not be empty".to_string()));
        }
        if password != confirmation {
            return Err(TrackerError::PasswordMismatch);
        }
        if self.db.find_user_by_name(username)?.is_some() {
            return Err(TrackerError::UsernameTaken(username.to_string()));
        }

        let hash = bcrypt::hash(password, self.bcrypt_cost)?;
        let user = self.db.insert_user(username, &hash)?;
        tracing::info!(user = %user.id, username, "registered user");
        Ok(user)
    }

    /// Unknown users and wrong passwords fail the same way.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let Some(user) = self.db.find_user_by_name(username.trim())? else {
            tracing::debug!(username, "login for unknown user");
            return Err(TrackerError::InvalidCredentials);
        };
        if !bcrypt::verify(password, &user.password_hash).unwrap_or(false) {
            tracing::debug!(user = %user.id, "login with wrong password");
            return Err(TrackerError::InvalidCredentials);
        }
        Ok(user)
    }

    // ─── Catalogue ─────────────────────────────────────────

    /// Returns the existing entry when the ISBN is already catalogued.
    pub fn catalog_book(&self, book: &NewBook) -> Result<Book> {
        if let Some(existing) = self.db.find_book_by_isbn(&book.isbn)? {
            return Ok(existing);
        }
        let created = self.db.insert_book(book)?;
        tracing::debug!(book = %created.id, isbn = %created.isbn, "catalogued book");
        Ok(created)
    }

    pub fn find_book(&self, isbn: &Isbn13) -> Result<Option<Book>> {
        self.db.find_book_by_isbn(isbn)
    }

    pub fn current_by_isbn(&self, user: UserId, isbn: &Isbn13) -> Result<Option<ReadingRecord>> {
        self.db.find_current_by_isbn(user, isbn)
    }

    // ─── Current books ─────────────────────────────────────

    pub fn start_tracking(
        &self,
        user: UserId,
        book: BookId,
        target: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<ReadingRecord> {
        if let Some(target) = target {
            validate_target(target, today)?;
        }
        if self.db.find_book(book)?.is_none() {
            return Err(TrackerError::BookNotFound(book.to_string()));
        }
        self.db.insert_current(user, book, target)?;
        tracing::info!(%user, %book, "started tracking book");
        self.current(user, book)
    }

    pub fn update_page(&self, user: UserId, book: BookId, page: u32, today: NaiveDate) -> Result<ReadingRecord> {
        let record = self.current(user, book)?;
        if page > record.book.pages {
            return Err(TrackerError::PageOutOfRange {
                page,
                pages: record.book.pages,
            });
        }
        self.db.record_page(user, book, page, today)?;
        tracing::debug!(%user, %book, page, "recorded page");
        self.current(user, book)
    }

    /// `None` clears the target.
    pub fn set_target(
        &self,
        user: UserId,
        book: BookId,
        target: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<ReadingRecord> {
        if let Some(target) = target {
            validate_target(target, today)?;
        }
        if !self.db.set_target(user, book, target)? {
            return Err(TrackerError::BookNotFound(book.to_string()));
        }
        self.current(user, book)
    }

    pub fn complete(&self, user: UserId, book: BookId, today: NaiveDate) -> Result<HistoryEntry> {
        let record = self.current(user, book)?;
        let Some(start_date) = record.start_date else {
            return Err(TrackerError::NotStarted(record.book.title));
        };

        let days = days_between(start_date, today) + 1;
        let rate = compute_rate(start_date, today, record.book.pages)?;
        let entry = HistoryEntry {
            book: record.book,
            start_date,
            end_date: today,
            days: u32::try_from(days).map_err(|_| TrackerError::EmptyPeriod { start: start_date, end: today })?,
            rate,
        };
        self.db.move_to_history(user, &entry)?;
        tracing::info!(%user, %book, days = entry.days, rate = entry.rate, "completed book");
        Ok(entry)
    }

    pub fn remove(&self, user: UserId, book: BookId) -> Result<()> {
        if !self.db.delete_current(user, book)? {
            return Err(TrackerError::BookNotFound(book.to_string()));
        }
        tracing::info!(%user, %book, "removed book");
        Ok(())
    }

    /// Builds the per-book view. A target that is no longer in the future is
    /// cleared from the store and reported through `target_reset`.
    pub fn dashboard(&self, user: UserId, book: BookId, today: NaiveDate, rates: &[FixedRate]) -> Result<BookDashboard> {
        let mut record = self.current(user, book)?;

        let expired = record.target_date.filter(|target| *target < tomorrow(today));
        if expired.is_some() {
            record.target_date = None;
        }

        let mut dashboard = BookDashboard::build(record, today, rates)?;
        if let Some(target) = expired {
            self.db.set_target(user, book, None)?;
            dashboard.target_reset = true;
            tracing::info!(%user, %book, %target, "cleared expired target");
        }
        Ok(dashboard)
    }

    pub fn current_books(&self, user: UserId) -> Result<Vec<CurrentBook>> {
        self.db
            .list_current(user)?
            .into_iter()
            .map(|record| {
                let progress = compute_progress(record.pages_read(), record.book.pages)?;
                Ok(CurrentBook { record, progress })
            })
            .collect()
    }

    // ─── History ───────────────────────────────────────────

    pub fn history(&self, user: UserId, today: NaiveDate) -> Result<ReadingHistory> {
        let entries = self.db.list_history(user)?;
        let stats = self.db.lifetime_stats(user, today)?;
        Ok(ReadingHistory { entries, stats })
    }

    fn current(&self, user: UserId, book: BookId) -> Result<ReadingRecord> {
        self.db
            .find_current(user, book)?
            .ok_or_else(|| TrackerError::BookNotFound(book.to_string()))
    }
}

/// Targets must lie after `today`.
pub fn validate_target(target: NaiveDate, today: NaiveDate) -> Result<()> {
    if target <= today {
        return Err(TrackerError::InvalidTarget { target, today });
    }
    Ok(())
}
