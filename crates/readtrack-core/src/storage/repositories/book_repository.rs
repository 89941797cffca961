use rusqlite::{params, Connection, OptionalExtension};
use std::sync::MutexGuard;

use crate::error::{Result, TrackerError};
use crate::isbn::Isbn13;
use crate::models::{Book, BookId, NewBook};

use super::{is_constraint_violation, row_to_book, Repository, BOOK_COLUMNS};

pub trait BookRepository: Repository<Entity = Book, Id = BookId> {
    fn insert(&self, book: &NewBook) -> Result<Book>;
    fn find_by_isbn(&self, isbn: &Isbn13) -> Result<Option<Book>>;
    fn count(&self) -> Result<usize>;
}

pub struct SqliteBookRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteBookRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }
}

impl<'a> Repository for SqliteBookRepository<'a> {
    type Entity = Book;
    type Id = BookId;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let book = self
            .conn
            .query_row(
                &format!("SELECT {BOOK_COLUMNS} FROM books b WHERE b.id = ?1"),
                params![id.0],
                |row| row_to_book(row, 0),
            )
            .optional()?;
        Ok(book)
    }
}

impl<'a> BookRepository for SqliteBookRepository<'a> {
    fn insert(&self, book: &NewBook) -> Result<Book> {
        if book.pages == 0 {
            return Err(TrackerError::InvalidPageCount(0));
        }

        self.conn
            .execute(
                "INSERT INTO books (title, author, pages, isbn) VALUES (?1, ?2, ?3, ?4)",
                params![book.title, book.author, book.pages, book.isbn.as_str()],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    TrackerError::Validation(format!("book with ISBN {} already catalogued", book.isbn))
                } else {
                    TrackerError::Database(e)
                }
            })?;

        Ok(Book {
            id: BookId(self.conn.last_insert_rowid()),
            title: book.title.clone(),
            author: book.author.clone(),
            pages: book.pages,
            isbn: book.isbn.clone(),
        })
    }

    fn find_by_isbn(&self, isbn: &Isbn13) -> Result<Option<Book>> {
        let book = self
            .conn
            .query_row(
                &format!("SELECT {BOOK_COLUMNS} FROM books b WHERE b.isbn = ?1"),
                params![isbn.as_str()],
                |row| row_to_book(row, 0),
            )
            .optional()?;
        Ok(book)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repositories::test_support::{new_book, pool};

    #[test]
    fn test_insert_and_lookup() {
        let pool = pool();
        let book = SqliteBookRepository::new(pool.get_connection())
            .insert(&new_book("9780306406157", 320))
            .unwrap();

        let repo = SqliteBookRepository::new(pool.get_connection());
        let by_isbn = repo.find_by_isbn(&book.isbn).unwrap().unwrap();
        assert_eq!(by_isbn, book);
        assert_eq!(repo.find_by_id(&book.id).unwrap().unwrap().pages, 320);
        assert!(repo.find_by_id(&BookId(999)).unwrap().is_none());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_isbn_is_unique() {
        let pool = pool();
        let repo = SqliteBookRepository::new(pool.get_connection());
        repo.insert(&new_book("9780306406157", 320)).unwrap();
        assert!(matches!(
            repo.insert(&new_book("9780306406157", 100)),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_pages_rejected() {
        let pool = pool();
        let repo = SqliteBookRepository::new(pool.get_connection());
        assert!(matches!(
            repo.insert(&new_book("9780306406157", 0)),
            Err(TrackerError::InvalidPageCount(0))
        ));
    }
}
