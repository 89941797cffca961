//! Book metadata lookup: a rate-limited HTTP client, an on-disk response
//! cache and the Open Library source used when a user adds a book.

pub mod error;
pub mod http;
pub mod sources;

pub use error::{LookupError, Result};
pub use http::{DiskCache, RateLimitedClient};
pub use sources::openlibrary::OpenLibrarySource;
pub use sources::BookMetadataSource;
