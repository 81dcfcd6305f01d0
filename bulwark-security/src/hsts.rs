//! HTTP Strict Transport Security (HSTS)
//!
//! Tells browsers to reach the host over HTTPS only.

use crate::headers::SecurityHeader;

/// One year, the minimum max-age accepted by the preload list
pub const PRELOAD_MIN_MAX_AGE: u64 = 31_536_000;

/// `Strict-Transport-Security` settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HstsConfig {
    /// Max age in seconds
    pub max_age: u64,

    pub include_subdomains: bool,

    /// Opt in to the browser preload list
    pub preload: bool,
}

impl HstsConfig {
    pub fn new(max_age: u64) -> Self {
        Self {
            max_age,
            include_subdomains: true,
            preload: false,
        }
    }

    pub fn include_subdomains(mut self, include: bool) -> Self {
        self.include_subdomains = include;
        self
    }

    pub fn preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    /// Whether the value meets the preload list's submission rules
    pub fn is_preload_eligible(&self) -> bool {
        self.preload && self.include_subdomains && self.max_age >= PRELOAD_MIN_MAX_AGE
    }
}

impl Default for HstsConfig {
    fn default() -> Self {
        Self::new(PRELOAD_MIN_MAX_AGE).preload(true)
    }
}

impl SecurityHeader for HstsConfig {
    const NAME: &'static str = "Strict-Transport-Security";

    fn header_value(&self) -> String {
        let mut parts = vec![format!("max-age={}", self.max_age)];

        if self.include_subdomains {
            parts.push("includeSubDomains".to_string());
        }

        if self.preload {
            parts.push("preload".to_string());
        }

        parts.join("; ")
    }
}
