pub mod config;
pub mod dates;
pub mod error;
pub mod isbn;
pub mod models;
pub mod progress;
pub mod storage;
pub mod tracker;

pub use config::AppConfig;
pub use error::{ExitCode, Result, TrackerError};
pub use isbn::{is_valid_isbn13, Isbn13};
pub use models::*;

pub use progress::{BookDashboard, FixedRate, TargetStatus};
pub use storage::database::{open_database, open_in_memory, ConnectionPool, Database};
pub use tracker::{validate_target, CurrentBook, ReadingHistory, ReadingTracker};
