use async_trait::async_trait;
use readtrack_core::{Isbn13, NewBook};

use crate::error::Result;

pub mod openlibrary;

/// A remote catalogue that can describe a book from its ISBN.
///
/// `Ok(None)` means the source answered but has no usable record: unknown
/// ISBN, or a record missing the title, author or page count.
#[async_trait]
pub trait BookMetadataSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_by_isbn(&self, isbn: &Isbn13) -> Result<Option<NewBook>>;
}
