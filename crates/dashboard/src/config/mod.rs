pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Load and merge all config JSON files into a single [`DashboardConfig`],
/// then apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   sources.json
///   refresh.json
/// ```
///
/// # Environment variable overrides
///
/// | Env Var                     | Config Field                        |
/// |-----------------------------|-------------------------------------|
/// | `DASHBOARD_BIND_ADDR`       | `app.server.bind_addr`              |
/// | `DASHBOARD_CORS_MAX_AGE`    | `app.server.cors_max_age_seconds`   |
/// | `DASHBOARD_LOG_DIR`         | `app.logging.log_dir`               |
/// | `DASHBOARD_REFRESH_SECONDS` | `refresh.interval_seconds`          |
pub fn load_config(config_dir: &Path) -> Result<DashboardConfig> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let app: AppConfig = serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    let sources: SourcesConfig =
        serde_json::from_str(&read("sources.json")?).context("parsing sources.json")?;

    let refresh: RefreshConfig =
        serde_json::from_str(&read("refresh.json")?).context("parsing refresh.json")?;

    let mut config = DashboardConfig {
        app,
        sources,
        refresh,
    };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Only non-empty env vars take effect. Parse failures are skipped and the
/// JSON value remains.
fn apply_env_overrides(config: &mut DashboardConfig) {
    // -- Server --------------------------------------------------------------
    if let Some(val) = env_string("DASHBOARD_BIND_ADDR") {
        info!(%val, "env override: DASHBOARD_BIND_ADDR");
        config.app.server.bind_addr = val;
    }

    if let Some(val) = env_parse::<u64>("DASHBOARD_CORS_MAX_AGE") {
        info!(val, "env override: DASHBOARD_CORS_MAX_AGE");
        config.app.server.cors_max_age_seconds = val;
    }

    // -- Logging -------------------------------------------------------------
    if let Some(val) = env_string("DASHBOARD_LOG_DIR") {
        info!(%val, "env override: DASHBOARD_LOG_DIR");
        config.app.logging.log_dir = val;
    }

    // -- Refresh -------------------------------------------------------------
    if let Some(val) = env_parse::<u64>("DASHBOARD_REFRESH_SECONDS") {
        info!(val, "env override: DASHBOARD_REFRESH_SECONDS");
        config.refresh.interval_seconds = val;
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a non-empty env var and parse it as `T`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}
