//! Policy rendering
//!
//! [`PolicyBuilder`] layers a [`PolicyConfig`] over a validated baseline
//! [`DirectiveTable`] and renders the CSP header plus the full security
//! header set. The baseline is validated once, when the builder is created,
//! so rendering never fails.
//!
//! ```
//! use bulwark_security::content_security_policy::PolicyConfig;
//! use bulwark_security::policy::generate_csp;
//!
//! let config = PolicyConfig::builder().script_nonce("abc123").build().unwrap();
//! let csp = generate_csp(&config);
//!
//! assert_eq!(csp.name, "Content-Security-Policy");
//! assert!(csp.value.contains("'nonce-abc123'"));
//! assert!(csp.value.ends_with("; upgrade-insecure-requests"));
//! ```

use crate::content_security_policy::{CSP_HEADER, CSP_REPORT_ONLY_HEADER, CspHeader, PolicyConfig};
use crate::directives::{self, DirectiveTable};
use crate::error::Result;
use crate::headers::{SecurityHeaders, SecurityHeadersConfig};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

static DEFAULT_BUILDER: Lazy<PolicyBuilder> = Lazy::new(PolicyBuilder::default);

/// Renders policies from a shared, immutable baseline
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    baseline: Arc<DirectiveTable>,
    headers: Arc<SecurityHeadersConfig>,
}

impl PolicyBuilder {
    /// Builder over a custom baseline; fails with `InvalidBaseline` if the
    /// table would render a malformed or loosened policy
    pub fn new(baseline: DirectiveTable) -> Result<Self> {
        baseline.validate()?;
        Ok(Self {
            baseline: Arc::new(baseline),
            headers: Arc::new(SecurityHeadersConfig::default()),
        })
    }

    pub fn with_headers(mut self, headers: SecurityHeadersConfig) -> Self {
        self.headers = Arc::new(headers);
        self
    }

    pub fn baseline(&self) -> &DirectiveTable {
        &self.baseline
    }

    pub fn headers_config(&self) -> &SecurityHeadersConfig {
        &self.headers
    }

    /// Per-request copy of the baseline with nonces, hashes and the report
    /// endpoint merged in
    pub fn directives(&self, config: &PolicyConfig) -> DirectiveTable {
        let mut table = self.baseline.as_ref().clone();

        if let Some(nonce) = config.script_nonce() {
            table.append(directives::SCRIPT_SRC, format!("'nonce-{}'", nonce));
        }
        if let Some(nonce) = config.style_nonce() {
            table.append(directives::STYLE_SRC, format!("'nonce-{}'", nonce));
        }

        for hash in config.script_hashes() {
            table.append(directives::SCRIPT_SRC, hash.clone());
        }
        for hash in config.style_hashes() {
            table.append(directives::STYLE_SRC, hash.clone());
        }

        if let Some(uri) = config.report_uri() {
            table.set(directives::REPORT_URI, vec![uri.to_string()]);
        }

        table
    }

    /// Render the CSP header for one request
    pub fn generate_csp(&self, config: &PolicyConfig) -> CspHeader {
        let table = self.directives(config);
        let mut value = table.render();

        if config.upgrade_insecure_requests() {
            value.push_str("; ");
            value.push_str(directives::UPGRADE_INSECURE_REQUESTS);
        }

        let name = if config.report_only() {
            CSP_REPORT_ONLY_HEADER
        } else {
            CSP_HEADER
        };

        debug!(
            header = name,
            directives = table.len(),
            has_nonce = config.script_nonce().is_some() || config.style_nonce().is_some(),
            "Generated content security policy"
        );

        CspHeader { name, value }
    }

    /// CSP header followed by the fixed non-CSP set.
    ///
    /// `domain` does not change the output; it is accepted so callers can
    /// pass the request host uniformly.
    pub fn security_headers(&self, _domain: &str, config: &PolicyConfig) -> SecurityHeaders {
        let mut headers = SecurityHeaders::new();
        headers.set_csp(self.generate_csp(config));
        self.headers.write_into(&mut headers);
        headers
    }

    /// CSP header for `config` reshaped for the environment; see
    /// [`PolicyConfig::for_environment`]
    pub fn environment_csp(&self, config: &PolicyConfig, is_development: bool) -> CspHeader {
        self.generate_csp(&config.for_environment(is_development))
    }
}

impl Default for PolicyBuilder {
    /// Builder over the built-in baseline and default header set
    fn default() -> Self {
        Self {
            baseline: DirectiveTable::shared_baseline(),
            headers: Arc::new(SecurityHeadersConfig::default()),
        }
    }
}

/// [`PolicyBuilder::generate_csp`] with the built-in baseline
pub fn generate_csp(config: &PolicyConfig) -> CspHeader {
    DEFAULT_BUILDER.generate_csp(config)
}

/// [`PolicyBuilder::security_headers`] with the built-in baseline
pub fn get_security_headers(domain: &str, config: &PolicyConfig) -> SecurityHeaders {
    DEFAULT_BUILDER.security_headers(domain, config)
}

/// [`PolicyBuilder::environment_csp`] with the built-in baseline
pub fn get_environment_csp(config: &PolicyConfig, is_development: bool) -> CspHeader {
    DEFAULT_BUILDER.environment_csp(config, is_development)
}
