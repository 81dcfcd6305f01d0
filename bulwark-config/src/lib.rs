//! Configuration for the Bulwark security pipeline.
//!
//! [`SecuritySettings`] is read once at startup and handed to the security
//! middleware. Values come from, in increasing precedence: defaults, a JSON
//! or TOML file, a `.env` file, `BULWARK_*` process variables, and explicit
//! builder calls.
//!
//! | variable | key |
//! |---|---|
//! | `BULWARK_ENV` | `environment` (`development` / `production`) |
//! | `BULWARK_CSP_REPORT_URI` | `report_uri` |
//! | `BULWARK_NONCE_SIZE` | `nonce_size` |
//! | `BULWARK_SCRIPT_HASHES` | `script_hashes` (comma-separated) |
//! | `BULWARK_STYLE_HASHES` | `style_hashes` (comma-separated) |
//! | `BULWARK_HSTS_MAX_AGE` | `hsts_max_age` |

pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Prefix for all process variables read by [`SecuritySettings::from_env`]
pub const ENV_PREFIX: &str = "BULWARK";

/// Nonce length in bytes when none is configured
pub const DEFAULT_NONCE_SIZE: usize = 16;

/// Upper bound on configured nonce length in bytes
pub const MAX_NONCE_SIZE: usize = 256;

/// One year, in seconds
pub const DEFAULT_HSTS_MAX_AGE: u64 = 31_536_000;

/// Five minutes; `max-age=0` tells browsers to drop HSTS for the host
pub const MIN_HSTS_MAX_AGE: u64 = 300;

/// Two years, in seconds
pub const MAX_HSTS_MAX_AGE: u64 = 63_072_000;

/// Deployment environment; selects how strict the generated policy is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::ParseError(format!(
                "unknown environment {:?} (expected development or production)",
                other
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Startup settings for the security headers middleware
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    pub environment: Environment,
    /// Violation report endpoint; production falls back to `/api/csp-report`
    pub report_uri: Option<String>,
    /// Nonce length in bytes
    pub nonce_size: usize,
    /// Digests of static inline scripts
    pub script_hashes: Vec<String>,
    /// Digests of static inline styles
    pub style_hashes: Vec<String>,
    /// `Strict-Transport-Security` max-age in seconds
    pub hsts_max_age: u64,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            report_uri: None,
            nonce_size: DEFAULT_NONCE_SIZE,
            script_hashes: Vec::new(),
            style_hashes: Vec::new(),
            hsts_max_age: DEFAULT_HSTS_MAX_AGE,
        }
    }
}

impl SecuritySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn report_uri(mut self, uri: impl Into<String>) -> Self {
        self.report_uri = Some(uri.into());
        self
    }

    pub fn nonce_size(mut self, size: usize) -> Self {
        self.nonce_size = size;
        self
    }

    pub fn script_hash(mut self, hash: impl Into<String>) -> Self {
        self.script_hashes.push(hash.into());
        self
    }

    pub fn style_hash(mut self, hash: impl Into<String>) -> Self {
        self.style_hashes.push(hash.into());
        self
    }

    pub fn hsts_max_age(mut self, seconds: u64) -> Self {
        self.hsts_max_age = seconds;
        self
    }

    /// Load from `BULWARK_*` process variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env(&EnvLoader::new(Some(ENV_PREFIX.to_string())).load())
    }

    /// Load a `.env` file into the process environment, then read
    /// `BULWARK_*` variables. A missing default `.env` is not an error; a
    /// missing explicit path is.
    pub fn from_dotenv(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
                debug!(path = %path.display(), "Loaded .env file");
            }
            None => {
                if let Ok(path) = dotenvy::dotenv() {
                    debug!(path = %path.display(), "Loaded .env file");
                }
            }
        }
        Self::from_env()
    }

    /// Load from a JSON or TOML file, detected from the extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings: Self = ConfigLoader::auto(path)?.load_file(path)?;
        settings.validate()?;
        info!(
            path = %path.display(),
            environment = %settings.environment,
            "Loaded security settings"
        );
        Ok(settings)
    }

    /// Overlay values from an env map (keys as produced by [`EnvLoader`])
    pub fn merge_env(mut self, vars: &HashMap<String, String>) -> Result<Self> {
        if let Some(value) = vars.get("env") {
            self.environment = value.parse()?;
        }

        if let Some(value) = vars.get("csp_report_uri") {
            let value = value.trim();
            self.report_uri = (!value.is_empty()).then(|| value.to_string());
        }

        if let Some(value) = vars.get("nonce_size") {
            self.nonce_size = value.trim().parse().map_err(|_| {
                ConfigError::ParseError(format!("nonce_size must be an integer (got {:?})", value))
            })?;
        }

        if let Some(value) = vars.get("script_hashes") {
            self.script_hashes = split_list(value);
        }

        if let Some(value) = vars.get("style_hashes") {
            self.style_hashes = split_list(value);
        }

        if let Some(value) = vars.get("hsts_max_age") {
            self.hsts_max_age = value.trim().parse().map_err(|_| {
                ConfigError::ParseError(format!(
                    "hsts_max_age must be an integer (got {:?})",
                    value
                ))
            })?;
        }

        self.validate()?;
        Ok(self)
    }
}

impl Validate for SecuritySettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::in_range(self.nonce_size, 1, MAX_NONCE_SIZE, "nonce_size")?;
        ConfigValidator::in_range(
            self.hsts_max_age,
            MIN_HSTS_MAX_AGE,
            MAX_HSTS_MAX_AGE,
            "hsts_max_age",
        )?;

        if let Some(ref uri) = self.report_uri {
            ConfigValidator::is_directive_token(uri, "report_uri")?;
        }

        for hash in self.script_hashes.iter().chain(&self.style_hashes) {
            ConfigValidator::is_directive_token(hash, "hash")?;
        }

        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
