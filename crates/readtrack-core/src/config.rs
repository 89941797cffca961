use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::progress::{self, FixedRate, DEFAULT_PAGES_PER_HOUR, DEFAULT_SESSION_MINUTES};

/// Root application configuration, loaded from `~/.config/readtrack/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub reading: ReadingConfig,
    pub lookup: LookupConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub data_dir: String,
}

/// Assumptions behind the fixed-rate completion projections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    pub pages_per_hour: u32,
    pub session_minutes: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub base_url: String,
    pub min_interval_ms: u64,
    pub max_retries: u32,
    pub cache_ttl_hours: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `READTRACK_LOG` wins over it.
    pub level: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("readtrack");

        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
        }
    }
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            pages_per_hour: DEFAULT_PAGES_PER_HOUR,
            session_minutes: DEFAULT_SESSION_MINUTES.to_vec(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openlibrary.org".to_string(),
            min_interval_ms: 500,
            max_retries: 3,
            cache_ttl_hours: 7 * 24,
            user_agent: concat!("readtrack/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl LookupConfig {
    /// Saturates instead of overflowing for absurd hour counts.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours.saturating_mul(60 * 60))
    }
}

// ─── Load ──────────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/readtrack/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("READTRACK_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("readtrack")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reading.pages_per_hour == 0 {
            return Err(TrackerError::Config("reading.pages_per_hour must be positive".to_string()));
        }
        if self.reading.session_minutes.contains(&0) {
            return Err(TrackerError::Config("reading.session_minutes must all be positive".to_string()));
        }
        Ok(())
    }

    pub fn set_data_dir(&mut self, path: PathBuf) {
        self.core.data_dir = path.to_string_lossy().to_string();
    }

    // ─── Derived values ────────────────────────────────────

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.core.data_dir)
    }

    /// Path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("readtrack.db")
    }

    /// Path to the metadata lookup cache.
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir().join("cache")
    }

    pub fn fixed_rates(&self) -> Vec<FixedRate> {
        progress::fixed_rates(self.reading.pages_per_hour, &self.reading.session_minutes)
    }
}
