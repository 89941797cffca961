use thiserror::Error;

use crate::dates::DateParseError;

/// All errors that can occur in readtrack-core.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid ISBN-13: {0}")]
    InvalidIsbn(String),

    #[error("Invalid date: {0}")]
    InvalidDate(#[from] DateParseError),

    #[error("Invalid page count: {0}")]
    InvalidPageCount(u32),

    #[error("Page {page} is beyond the last page ({pages})")]
    PageOutOfRange { page: u32, pages: u32 },

    #[error("Daily rate must be positive, got {0}")]
    NonPositiveRate(f64),

    #[error("Period from {start} to {end} contains no days")]
    EmptyPeriod {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Passwords must match")]
    PasswordMismatch,

    #[error("Invalid username and/or password")]
    InvalidCredentials,

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("This book is already in your current books: {0}")]
    AlreadyReading(String),

    #[error("You haven't started this book yet: {0}")]
    NotStarted(String),

    #[error("Target date must be after {today}, got {target}")]
    InvalidTarget {
        target: chrono::NaiveDate,
        today: chrono::NaiveDate,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Exit codes used by the readtrack binary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    FileSystemError = 4,
    AuthError = 5,
    NetworkError = 6,
    Conflict = 7,
}

impl ExitCode {
    /// Short machine-readable name used in JSON error envelopes.
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::GeneralError => "error",
            Self::NotFound => "not_found",
            Self::InvalidArgs => "invalid_args",
            Self::FileSystemError => "filesystem",
            Self::AuthError => "auth",
            Self::NetworkError => "network",
            Self::Conflict => "conflict",
        }
    }
}

impl TrackerError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::BookNotFound(_) => ExitCode::NotFound,
            Self::InvalidIsbn(_)
            | Self::InvalidDate(_)
            | Self::InvalidPageCount(_)
            | Self::PageOutOfRange { .. }
            | Self::NonPositiveRate(_)
            | Self::EmptyPeriod { .. }
            | Self::PasswordMismatch
            | Self::InvalidTarget { .. }
            | Self::Validation(_) => ExitCode::InvalidArgs,
            Self::InvalidCredentials => ExitCode::AuthError,
            Self::UsernameTaken(_) | Self::AlreadyReading(_) | Self::NotStarted(_) => {
                ExitCode::Conflict
            }
            Self::Io(_) => ExitCode::FileSystemError,
            _ => ExitCode::GeneralError,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
