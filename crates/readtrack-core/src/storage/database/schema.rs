use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 1;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT UNIQUE NOT NULL,
            hash        TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS books (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            author      TEXT NOT NULL,
            pages       INTEGER NOT NULL CHECK(pages > 0),
            isbn        TEXT UNIQUE NOT NULL
        );

        CREATE TABLE IF NOT EXISTS current_reading (
            user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            book_id     INTEGER NOT NULL REFERENCES books(id),
            page        INTEGER CHECK(page >= 0),
            start_date  TEXT,
            target_date TEXT,
            PRIMARY KEY (user_id, book_id),
            CHECK (page IS NULL OR start_date IS NOT NULL)
        );

        CREATE TABLE IF NOT EXISTS history (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            book_id     INTEGER NOT NULL REFERENCES books(id),
            start_date  TEXT NOT NULL,
            end_date    TEXT NOT NULL,
            days        INTEGER NOT NULL CHECK(days >= 1),
            rate        REAL NOT NULL
        );
        ",
    )?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_current_user_start ON current_reading(user_id, start_date);
        CREATE INDEX IF NOT EXISTS idx_history_user_end   ON history(user_id, end_date);
        CREATE INDEX IF NOT EXISTS idx_history_user_start ON history(user_id, start_date);
        ",
    )?;
    Ok(())
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    create_tables(conn)?;
    create_indexes(conn)?;
    Ok(())
}
