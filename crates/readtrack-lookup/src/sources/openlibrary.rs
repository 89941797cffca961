use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use readtrack_core::config::LookupConfig;
use readtrack_core::{Isbn13, NewBook};
use reqwest::Url;
use serde_json::Value;

use crate::error::{LookupError, Result};
use crate::http::{DiskCache, RateLimitedClient};
use crate::sources::BookMetadataSource;

/// Open Library Books API (`/api/books?jscmd=data`).
pub struct OpenLibrarySource {
    client: RateLimitedClient,
    cache: DiskCache,
    base_url: String,
}

impl OpenLibrarySource {
    pub fn from_config(config: &LookupConfig, cache_dir: &Path) -> Result<Self> {
        Self::with_params(
            &config.base_url,
            Duration::from_millis(config.min_interval_ms),
            config.max_retries,
            &config.user_agent,
            DiskCache::new(cache_dir.join("openlibrary"), config.cache_ttl()),
        )
    }

    pub fn with_params(
        base_url: &str,
        min_interval: Duration,
        max_retries: u32,
        user_agent: &str,
        cache: DiskCache,
    ) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, max_retries, user_agent)?,
            cache,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn books_url(&self, isbn: &Isbn13) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| LookupError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| LookupError::InvalidUrl(self.base_url.clone()))?;
            segs.pop_if_empty();
            segs.push("api");
            segs.push("books");
        }
        url.query_pairs_mut()
            .append_pair("bibkeys", &bibkey(isbn))
            .append_pair("format", "json")
            .append_pair("jscmd", "data");
        Ok(url)
    }
}

fn bibkey(isbn: &Isbn13) -> String {
    format!("ISBN:{}", isbn.as_str())
}

/// A record is usable only with a title, a first author name and a positive
/// page count.
fn parse_record(isbn: &Isbn13, record: &Value) -> Option<NewBook> {
    let title = record.get("title").and_then(Value::as_str)?.trim();
    let author = record
        .get("authors")
        .and_then(Value::as_array)
        .and_then(|authors| authors.first())
        .and_then(|author| author.get("name"))
        .and_then(Value::as_str)?
        .trim();
    let pages = record.get("number_of_pages").and_then(Value::as_u64)?;

    if title.is_empty() || author.is_empty() || pages == 0 {
        return None;
    }
    let pages = u32::try_from(pages).ok()?;

    Some(NewBook {
        title: title.to_string(),
        author: author.to_string(),
        pages,
        isbn: isbn.clone(),
    })
}

#[async_trait]
impl BookMetadataSource for OpenLibrarySource {
    fn name(&self) -> &'static str {
        "openlibrary"
    }

    async fn fetch_by_isbn(&self, isbn: &Isbn13) -> Result<Option<NewBook>> {
        let cache_key = format!("isbn:{}", isbn.as_str());
        if let Some(cached) = self.cache.get::<NewBook>(&cache_key).await {
            return Ok(Some(cached));
        }

        let url = self.books_url(isbn)?;
        let json: Value = self.client.get_json(url.as_str()).await?;

        let Some(record) = json.get(bibkey(isbn)) else {
            tracing::debug!(%isbn, "no Open Library record");
            return Ok(None);
        };
        let Some(book) = parse_record(isbn, record) else {
            tracing::debug!(%isbn, "Open Library record lacks title, author or pages");
            return Ok(None);
        };

        self.cache.set(&cache_key, &book).await;
        Ok(Some(book))
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    const DUNE: &str = "9780441172719";

    fn source(server: &ServerGuard, cache_dir: &Path) -> OpenLibrarySource {
        OpenLibrarySource::with_params(
            &server.url(),
            Duration::from_millis(1),
            0,
            "readtrack-test",
            DiskCache::new(cache_dir, Duration::from_secs(60)),
        )
        .unwrap()
    }

    fn books_query(isbn: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("bibkeys".into(), format!("ISBN:{isbn}")),
            Matcher::UrlEncoded("format".into(), "json".into()),
            Matcher::UrlEncoded("jscmd".into(), "data".into()),
        ])
    }

    #[test]
    fn parses_complete_record() {
        let isbn = Isbn13::parse(DUNE).unwrap();
        let record = json!({
            "title": "Dune",
            "authors": [{"url": "https://openlibrary.org/authors/OL79034A", "name": "Frank Herbert"}],
            "number_of_pages": 412,
            "publishers": [{"name": "Ace Books"}]
        });
        let book = parse_record(&isbn, &record).unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.pages, 412);
        assert_eq!(book.isbn, isbn);
    }

    #[test]
    fn rejects_incomplete_records() {
        let isbn = Isbn13::parse(DUNE).unwrap();
        let no_pages = json!({"title": "Dune", "authors": [{"name": "Frank Herbert"}]});
        let no_authors = json!({"title": "Dune", "authors": [], "number_of_pages": 412});
        let zero_pages = json!({"title": "Dune", "authors": [{"name": "Frank Herbert"}], "number_of_pages": 0});
        let no_title = json!({"authors": [{"name": "Frank Herbert"}], "number_of_pages": 412});

        for record in [no_pages, no_authors, zero_pages, no_title] {
            assert_eq!(parse_record(&isbn, &record), None, "{record}");
        }
    }

    #[tokio::test]
    async fn from_config_accepts_huge_cache_ttl() {
        let cache = TempDir::new().unwrap();
        let config = LookupConfig {
            cache_ttl_hours: u64::MAX / 1000,
            ..LookupConfig::default()
        };
        let src = OpenLibrarySource::from_config(&config, cache.path()).unwrap();
        assert!(cache.path().join("openlibrary").is_dir());

        let isbn = Isbn13::parse(DUNE).unwrap();
        let book = NewBook {
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            pages: 412,
            isbn: isbn.clone(),
        };
        src.cache.set("isbn:9780441172719", &book).await;
        assert_eq!(src.fetch_by_isbn(&isbn).await.unwrap(), Some(book));
    }

    #[test]
    fn builds_books_url() {
        let cache = TempDir::new().unwrap();
        let src = OpenLibrarySource::with_params(
            "https://openlibrary.org/",
            Duration::from_millis(1),
            0,
            "readtrack-test",
            DiskCache::new(cache.path(), Duration::from_secs(60)),
        )
        .unwrap();
        let url = src.books_url(&Isbn13::parse(DUNE).unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://openlibrary.org/api/books?bibkeys=ISBN%3A9780441172719&format=json&jscmd=data"
        );
    }

    #[tokio::test]
    async fn fetches_and_caches_by_isbn() {
        let mut server = Server::new_async().await;
        let cache = TempDir::new().unwrap();

        let m = server
            .mock("GET", "/api/books")
            .match_query(books_query(DUNE))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "ISBN:9780441172719": {
                        "title": "Dune",
                        "authors": [{"name": "Frank Herbert"}],
                        "number_of_pages": 412
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let src = source(&server, cache.path());
        let isbn = Isbn13::parse(DUNE).unwrap();
        let first = src.fetch_by_isbn(&isbn).await.unwrap().unwrap();
        let second = src.fetch_by_isbn(&isbn).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.pages, 412);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_isbn_is_none() {
        let mut server = Server::new_async().await;
        let cache = TempDir::new().unwrap();

        let _m = server
            .mock("GET", "/api/books")
            .match_query(books_query("9780306406157"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let src = source(&server, cache.path());
        let isbn = Isbn13::parse("9780306406157").unwrap();
        assert_eq!(src.fetch_by_isbn(&isbn).await.unwrap(), None);
        assert_eq!(src.name(), "openlibrary");
    }

    #[tokio::test]
    async fn server_error_propagates() {
        let mut server = Server::new_async().await;
        let cache = TempDir::new().unwrap();

        let _m = server
            .mock("GET", "/api/books")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let src = source(&server, cache.path());
        let isbn = Isbn13::parse(DUNE).unwrap();
        assert!(matches!(src.fetch_by_isbn(&isbn).await, Err(LookupError::ApiError(..))));
    }
}
