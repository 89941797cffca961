mod book_repository;
mod history_repository;
mod reading_repository;
mod user_repository;

pub use book_repository::{BookRepository, SqliteBookRepository};
pub use history_repository::{HistoryRepository, SqliteHistoryRepository};
pub use reading_repository::{ReadingRepository, SqliteReadingRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{ErrorCode, Row};

use crate::dates::parse_iso_date;
use crate::error::Result;
use crate::isbn::Isbn13;
use crate::models::{Book, BookId};

pub trait Repository {
    type Entity;
    type Id;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
}

/// Columns `id, title, author, pages, isbn` starting at `offset`.
pub(crate) const BOOK_COLUMNS: &str = "b.id, b.title, b.author, b.pages, b.isbn";

pub(crate) fn row_to_book(row: &Row, offset: usize) -> rusqlite::Result<Book> {
    let isbn_str: String = row.get(offset + 4)?;
    let isbn = Isbn13::parse(&isbn_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(offset + 4, Type::Text, Box::new(e)))?;

    Ok(Book {
        id: BookId(row.get(offset)?),
        title: row.get(offset + 1)?,
        author: row.get(offset + 2)?,
        pages: row.get(offset + 3)?,
        isbn,
    })
}

pub(crate) fn date_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        parse_iso_date(&s).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub(crate) fn required_date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    date_column(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(idx, "date".to_string(), Type::Null))
}

pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}
