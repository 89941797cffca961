mod connection;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use migrations::{get_applied_versions, run_migrations, Migration};
pub use schema::{init_schema, SCHEMA_VERSION};

use std::path::Path;

use chrono::NaiveDate;

use crate::error::Result;
use crate::isbn::Isbn13;
use crate::models::{Book, BookId, HistoryEntry, LifetimeStats, NewBook, ReadingRecord, User, UserId};

use super::queries::LifetimeStatsQuery;
use super::repositories::{
    BookRepository, HistoryRepository, ReadingRepository, Repository, SqliteBookRepository,
    SqliteHistoryRepository, SqliteReadingRepository, SqliteUserRepository, UserRepository,
};

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    let pool = ConnectionPool::open(path)?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    let pool = ConnectionPool::open_in_memory()?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

/// Facade over the repositories. Nothing here knows who is logged in: every
/// user-scoped call names its user.
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let pool = open_database(path)?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self { pool })
    }

    pub fn path(&self) -> Option<&str> {
        self.pool.path()
    }

    pub fn schema_versions(&self) -> Result<Vec<u32>> {
        let conn = self.pool.get_connection();
        get_applied_versions(&conn)
    }

    // ─── Users ─────────────────────────────────────────────

    pub fn insert_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let conn = self.pool.get_connection();
        let repo = SqliteUserRepository::new(conn);
        repo.insert(username, password_hash)
    }

    pub fn find_user_by_name(&self, username: &str) -> Result<Option<User>> {
        let conn = self.pool.get_connection();
        let repo = SqliteUserRepository::new(conn);
        repo.find_by_username(username)
    }

    // ─── Catalogue ─────────────────────────────────────────

    pub fn insert_book(&self, book: &NewBook) -> Result<Book> {
        let conn = self.pool.get_connection();
        let repo = SqliteBookRepository::new(conn);
        repo.insert(book)
    }

    pub fn find_book_by_isbn(&self, isbn: &Isbn13) -> Result<Option<Book>> {
        let conn = self.pool.get_connection();
        let repo = SqliteBookRepository::new(conn);
        repo.find_by_isbn(isbn)
    }

    pub fn find_book(&self, id: BookId) -> Result<Option<Book>> {
        let conn = self.pool.get_connection();
        let repo = SqliteBookRepository::new(conn);
        repo.find_by_id(&id)
    }

    pub fn count_books(&self) -> Result<usize> {
        let conn = self.pool.get_connection();
        let repo = SqliteBookRepository::new(conn);
        repo.count()
    }

    // ─── Current reading ───────────────────────────────────

    pub fn insert_current(&self, user: UserId, book: BookId, target: Option<NaiveDate>) -> Result<()> {
        let conn = self.pool.get_connection();
        let repo = SqliteReadingRepository::new(conn);
        repo.insert(user, book, target)
    }

    pub fn find_current(&self, user: UserId, book: BookId) -> Result<Option<ReadingRecord>> {
        let conn = self.pool.get_connection();
        let repo = SqliteReadingRepository::new(conn);
        repo.find_by_id(&(user, book))
    }

    pub fn find_current_by_isbn(&self, user: UserId, isbn: &Isbn13) -> Result<Option<ReadingRecord>> {
        let conn = self.pool.get_connection();
        let repo = SqliteReadingRepository::new(conn);
        repo.find_by_isbn(user, isbn)
    }

    pub fn list_current(&self, user: UserId) -> Result<Vec<ReadingRecord>> {
        let conn = self.pool.get_connection();
        let repo = SqliteReadingRepository::new(conn);
        repo.list(user)
    }

    pub fn record_page(&self, user: UserId, book: BookId, page: u32, today: NaiveDate) -> Result<bool> {
        let conn = self.pool.get_connection();
        let repo = SqliteReadingRepository::new(conn);
        repo.record_page(user, book, page, today)
    }

    pub fn set_target(&self, user: UserId, book: BookId, target: Option<NaiveDate>) -> Result<bool> {
        let conn = self.pool.get_connection();
        let repo = SqliteReadingRepository::new(conn);
        repo.set_target(user, book, target)
    }

    pub fn delete_current(&self, user: UserId, book: BookId) -> Result<bool> {
        let conn = self.pool.get_connection();
        let repo = SqliteReadingRepository::new(conn);
        repo.delete(user, book)
    }

    pub fn move_to_history(&self, user: UserId, entry: &HistoryEntry) -> Result<()> {
        let conn = self.pool.get_connection();
        let repo = SqliteReadingRepository::new(conn);
        repo.move_to_history(user, entry)
    }

    // ─── History ───────────────────────────────────────────

    pub fn list_history(&self, user: UserId) -> Result<Vec<HistoryEntry>> {
        let conn = self.pool.get_connection();
        let repo = SqliteHistoryRepository::new(conn);
        repo.list(user)
    }

    pub fn lifetime_stats(&self, user: UserId, today: NaiveDate) -> Result<LifetimeStats> {
        let conn = self.pool.get_connection();
        let query = LifetimeStatsQuery::new(conn);
        query.get_stats(user, today)
    }
}
