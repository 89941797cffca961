use rusqlite::{params, Connection, OptionalExtension};
use std::sync::MutexGuard;

use chrono::Utc;

use crate::error::{Result, TrackerError};
use crate::models::{User, UserId};

use super::{is_constraint_violation, Repository};

pub trait UserRepository: Repository<Entity = User, Id = UserId> {
    fn insert(&self, username: &str, password_hash: &str) -> Result<User>;
    fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}

pub struct SqliteUserRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteUserRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: UserId(row.get(0)?),
            username: row.get(1)?,
            password_hash: row.get(2)?,
        })
    }
}

impl<'a> Repository for SqliteUserRepository<'a> {
    type Entity = User;
    type Id = UserId;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, hash FROM users WHERE id = ?1",
                params![id.0],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }
}

impl<'a> UserRepository for SqliteUserRepository<'a> {
    fn insert(&self, username: &str, password_hash: &str) -> Result<User> {
        self.conn
            .execute(
                "INSERT INTO users (username, hash, created_at) VALUES (?1, ?2, ?3)",
                params![username, password_hash, Utc::now().to_rfc3339()],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    TrackerError::UsernameTaken(username.to_string())
                } else {
                    TrackerError::Database(e)
                }
            })?;

        Ok(User {
            id: UserId(self.conn.last_insert_rowid()),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, hash FROM users WHERE username = ?1",
                params![username],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }
}
