use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::{LookupError, Result};

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

// ─── RateLimitedClient ────────────────────────────────────────────────────────

/// GET client that keeps at least `min_interval` between requests, backs off
/// exponentially on transport errors and waits out `429` responses.
pub struct RateLimitedClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
    max_retries: u32,
}

impl RateLimitedClient {
    pub fn new(min_interval: Duration, max_retries: u32, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
            max_retries,
        })
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            self.wait_for_rate_limit().await;
            match self.client.get(url).send().await {
                Ok(r) if r.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let wait = r
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    if attempt >= self.max_retries {
                        return Err(LookupError::RateLimit(host_of(url), wait));
                    }
                    tracing::warn!(url, wait_secs = wait, attempt, "rate limited, waiting");
                    sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                Ok(r) if !r.status().is_success() => {
                    let status = r.status().as_u16();
                    let body = r.text().await.unwrap_or_default();
                    return Err(LookupError::ApiError(url.to_string(), format!("HTTP {status}: {body}")));
                }
                Ok(r) => return r.text().await.map_err(LookupError::Http),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(LookupError::Http(e));
                    }
                    let backoff = 2u64.pow(attempt);
                    tracing::warn!(url, error = %e, backoff_secs = backoff, "request failed, retrying");
                    sleep(Duration::from_secs(backoff)).await;
                    attempt += 1;
                }
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let text = self.get(url).await?;
        serde_json::from_str(&text).map_err(|e| LookupError::Parse(e.to_string()))
    }
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(ToOwned::to_owned))
        .unwrap_or_else(|| url.to_string())
}

// ─── DiskCache ────────────────────────────────────────────────────────────────

/// One JSON file per cache key. Cache failures are never errors: a broken
/// entry reads as a miss.
pub struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

/// File names are derived from the key itself so they survive toolchain
/// upgrades. Characters outside `[A-Za-z0-9-]` become `_`.
fn cache_key_to_path(dir: &Path, key: &str) -> PathBuf {
    let name: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    dir.join(format!("{name}.json"))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[derive(Serialize, serde::Deserialize)]
struct CacheEntry<T> {
    stored_at: u64, // Unix timestamp secs
    value: T,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::debug!(dir = %dir.display(), error = %e, "cannot create cache dir");
        }
        Self { dir, ttl }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = cache_key_to_path(&self.dir, key);
        let data = tokio::fs::read(&path).await.ok()?;
        let entry: CacheEntry<T> = serde_json::from_slice(&data).ok()?;
        if unix_now().saturating_sub(entry.stored_at) > self.ttl.as_secs() {
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }
        tracing::debug!(key, "cache hit");
        Some(entry.value)
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let path = cache_key_to_path(&self.dir, key);
        let entry = CacheEntry {
            stored_at: unix_now(),
            value,
        };
        if let Ok(data) = serde_json::to_vec(&entry)
            && let Err(e) = tokio::fs::write(&path, data).await
        {
            tracing::debug!(key, error = %e, "cache write failed");
        }
    }
}
