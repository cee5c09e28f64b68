//! Configuration loader for the `crop-advisor` service.
//!
//! All runtime settings and their defaults live here and are read from
//! environment variables (with optional `.env` file support provided by the
//! caller), so the rest of the crate never calls `env::var` directly.
//!
use std::env;

use anyhow::{anyhow, Result};

/// Base URL of the hosted prediction backend.
pub const DEFAULT_BACKEND_URL: &str = "https://crop-advisor-backend-3hsd.onrender.com";

pub const DEFAULT_CITY: &str = "Pune";

/// Parse an optional variable into `$ty`, falling back to a default.
macro_rules! parse_env {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string variable, falling back to a default.
macro_rules! env_or {
    ($lookup:expr, $var_name:expr, $default:expr) => {
        $lookup($var_name)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| $default.to_string())
    };
}

/// Strongly typed application configuration.
///
/// Immutable after loading.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Prediction backend base URL, without trailing slash.
    pub backend_url: String,

    /// Port the HTTP API listens on.
    pub port: u16,

    /// City used by `/weather` when the caller names none.
    pub default_city: String,

    /// Run the recommendation workflow once at startup.
    pub refresh_on_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            port: 8080,
            default_city: DEFAULT_CITY.to_string(),
            refresh_on_start: true,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `ADVISOR_BACKEND_URL` – prediction backend (default: hosted backend)
/// - `ADVISOR_PORT` – listen port (default: 8080)
/// - `ADVISOR_DEFAULT_CITY` – weather city (default: Pune)
/// - `ADVISOR_REFRESH_ON_START` – `true`/`false` (default: true)
///
/// Returns an error if any variable is set but invalid.
pub fn load_from_env() -> Result<Config> {
    load_from(|name| env::var(name).ok())
}

/// Build the configuration from an arbitrary variable lookup.
pub fn load_from<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let backend_url = env_or!(lookup, "ADVISOR_BACKEND_URL", DEFAULT_BACKEND_URL)
        .trim_end_matches('/')
        .to_string();
    let port = parse_env!(lookup, "ADVISOR_PORT", u16, 8080);
    let default_city = env_or!(lookup, "ADVISOR_DEFAULT_CITY", DEFAULT_CITY);
    let refresh_on_start = parse_env!(lookup, "ADVISOR_REFRESH_ON_START", bool, true);

    if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
        return Err(anyhow!(
            "ADVISOR_BACKEND_URL must be an http(s) URL, got '{}'",
            backend_url
        ));
    }

    Ok(Config {
        backend_url,
        port,
        default_city,
        refresh_on_start,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  ADVISOR_BACKEND_URL      : {}", self.backend_url);
        tracing::info!("  ADVISOR_PORT             : {}", self.port);
        tracing::info!("  ADVISOR_DEFAULT_CITY     : {}", self.default_city);
        tracing::info!("  ADVISOR_REFRESH_ON_START : {}", self.refresh_on_start);
    }
}
