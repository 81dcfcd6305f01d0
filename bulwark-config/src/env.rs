// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;

/// Environment variable loader
///
/// With a prefix of `BULWARK`, the variable `BULWARK_NONCE_SIZE` is exposed
/// under the key `nonce_size`.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all matching variables from the process environment
    pub fn load(&self) -> HashMap<String, String> {
        self.load_from(env::vars())
    }

    /// Load all matching variables from an explicit set of pairs
    pub fn load_from<I>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = HashMap::new();

        for (key, value) in vars {
            match self.prefix {
                Some(ref prefix) => {
                    let Some(rest) = key.strip_prefix(prefix.as_str()) else {
                        continue;
                    };
                    let Some(trimmed) = rest.strip_prefix('_') else {
                        continue;
                    };
                    config.insert(trimmed.to_lowercase(), value);
                }
                None => {
                    config.insert(key.to_lowercase(), value);
                }
            }
        }

        config
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        env::var(self.full_key(key)).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Name of the process variable backing `key`
    pub fn full_key(&self, key: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_loader_with_default() {
        let loader = EnvLoader::new(None);
        let value = loader.load_var_or("NONEXISTENT_VAR_12345", "default");

        assert_eq!(value, "default");
    }

    #[test]
    fn test_env_loader_missing_var() {
        let loader = EnvLoader::new(Some("BULWARK_TEST".to_string()));
        assert!(loader.load_var("MISSING_VAR_67890").is_err());
    }

    #[test]
    fn test_full_key() {
        let loader = EnvLoader::new(Some("BULWARK".to_string()));
        assert_eq!(loader.full_key("nonce_size"), "BULWARK_NONCE_SIZE");
        assert_eq!(EnvLoader::default().full_key("path"), "PATH");
    }

    #[test]
    fn test_load_from_filters_prefix() {
        let loader = EnvLoader::new(Some("BULWARK".to_string()));
        let loaded = loader.load_from(vars(&[
            ("BULWARK_ENV", "development"),
            ("BULWARK_CSP_REPORT_URI", "/csp"),
            ("BULWARKISH", "ignored"),
            ("HOME", "/root"),
        ]));

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("env").map(String::as_str), Some("development"));
        assert_eq!(loaded.get("csp_report_uri").map(String::as_str), Some("/csp"));
    }

    #[test]
    fn test_load_from_without_prefix() {
        let loaded = EnvLoader::default().load_from(vars(&[("HOME", "/root")]));
        assert_eq!(loaded.get("home").map(String::as_str), Some("/root"));
    }
}
