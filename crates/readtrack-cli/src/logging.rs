use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "READTRACK_LOG";

/// `READTRACK_LOG` wins over the configured level.
fn directive(from_env: Option<String>, configured: &str) -> String {
    match from_env {
        Some(value) if !value.trim().is_empty() => value,
        _ => configured.to_string(),
    }
}

/// Logs go to stderr so that `--json` output on stdout stays parseable.
pub fn init_tracing(configured_level: &str) {
    let directive = directive(std::env::var(LOG_ENV).ok(), configured_level);
    let env_filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_config() {
        assert_eq!(directive(Some("readtrack_core=debug".into()), "warn"), "readtrack_core=debug");
        assert_eq!(directive(None, "info"), "info");
        assert_eq!(directive(Some("  ".into()), "error"), "error");
    }
}
