//! Content Security Policy (CSP) configuration
//!
//! [`PolicyConfig`] carries the per-request inputs that are layered over the
//! baseline directive table: nonces, inline-asset hashes, the report
//! endpoint, and the enforcement mode. It can only be built through
//! [`PolicyConfigBuilder::build`], which rejects any value that would
//! produce a malformed header.
//!
//! ```
//! use bulwark_security::content_security_policy::PolicyConfig;
//!
//! let config = PolicyConfig::builder()
//!     .nonce("rAnd0mNonce==")
//!     .script_hash("'sha256-B2yPHKaXnvFWtRChIbabYmUBFZdVfKKXHbWtWidDVF8='")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.script_hashes()[0], "'sha256-B2yPHKaXnvFWtRChIbabYmUBFZdVfKKXHbWtWidDVF8='");
//! ```

use crate::directives::is_source_token;
use crate::error::{Result, SecurityError};
use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256, Sha384, Sha512};

pub const CSP_HEADER: &str = "Content-Security-Policy";
pub const CSP_REPORT_ONLY_HEADER: &str = "Content-Security-Policy-Report-Only";

/// Report endpoint used in production when none is configured
pub const DEFAULT_REPORT_URI: &str = "/api/csp-report";

const HASH_ALGORITHMS: &[&str] = &["sha256", "sha384", "sha512"];

/// Digest algorithms allowed in hash sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

/// Hash source for a static inline `<script>` or `<style>` body.
///
/// `content` must be the exact text between the tags, whitespace included.
///
/// ```
/// use bulwark_security::content_security_policy::{HashAlgorithm, hash_source};
///
/// assert_eq!(
///     hash_source(HashAlgorithm::Sha256, "alert('Hello, world.');"),
///     "'sha256-qznLcsROx4GACP2dm0UCKCzCG+HiZ1guq6ZZDob/Tng='"
/// );
/// ```
pub fn hash_source(algorithm: HashAlgorithm, content: impl AsRef<[u8]>) -> String {
    let content = content.as_ref();
    let digest = match algorithm {
        HashAlgorithm::Sha256 => STANDARD.encode(Sha256::digest(content)),
        HashAlgorithm::Sha384 => STANDARD.encode(Sha384::digest(content)),
        HashAlgorithm::Sha512 => STANDARD.encode(Sha512::digest(content)),
    };
    format!("'{}-{}'", algorithm.as_str(), digest)
}

/// Rendered CSP header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspHeader {
    pub name: &'static str,
    pub value: String,
}

impl CspHeader {
    pub fn is_report_only(&self) -> bool {
        self.name == CSP_REPORT_ONLY_HEADER
    }
}

/// Validated per-request policy inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    report_only: bool,
    report_uri: Option<String>,
    upgrade_insecure_requests: bool,
    script_nonce: Option<String>,
    style_nonce: Option<String>,
    script_hashes: Vec<String>,
    style_hashes: Vec<String>,
}

impl PolicyConfig {
    pub fn builder() -> PolicyConfigBuilder {
        PolicyConfigBuilder::default()
    }

    /// Builder pre-filled with this config's values
    pub fn to_builder(&self) -> PolicyConfigBuilder {
        PolicyConfigBuilder {
            report_only: self.report_only,
            report_uri: self.report_uri.clone(),
            upgrade_insecure_requests: self.upgrade_insecure_requests,
            script_nonce: self.script_nonce.clone(),
            style_nonce: self.style_nonce.clone(),
            script_hashes: self.script_hashes.clone(),
            style_hashes: self.style_hashes.clone(),
        }
    }

    /// Emit the `-Report-Only` header instead of enforcing
    pub fn report_only(&self) -> bool {
        self.report_only
    }

    pub fn report_uri(&self) -> Option<&str> {
        self.report_uri.as_deref()
    }

    pub fn upgrade_insecure_requests(&self) -> bool {
        self.upgrade_insecure_requests
    }

    pub fn script_nonce(&self) -> Option<&str> {
        self.script_nonce.as_deref()
    }

    pub fn style_nonce(&self) -> Option<&str> {
        self.style_nonce.as_deref()
    }

    /// Normalized `'<alg>-<digest>'` sources for `script-src`
    pub fn script_hashes(&self) -> &[String] {
        &self.script_hashes
    }

    /// Normalized `'<alg>-<digest>'` sources for `style-src`
    pub fn style_hashes(&self) -> &[String] {
        &self.style_hashes
    }

    /// The policy shape for a deployment environment.
    ///
    /// Development: report-only, no `upgrade-insecure-requests`, no report
    /// endpoint. Production: enforcing, `upgrade-insecure-requests`, and
    /// [`DEFAULT_REPORT_URI`] unless a report endpoint is already set.
    /// Nonces and hashes are kept in both cases. No other code path looks at
    /// the environment.
    pub fn for_environment(&self, is_development: bool) -> PolicyConfig {
        let mut config = self.clone();
        if is_development {
            config.report_only = true;
            config.upgrade_insecure_requests = false;
            config.report_uri = None;
        } else {
            config.report_only = false;
            config.upgrade_insecure_requests = true;
            if config.report_uri.is_none() {
                config.report_uri = Some(DEFAULT_REPORT_URI.to_string());
            }
        }
        config
    }

    /// Same config with both nonces replaced
    pub fn with_nonce(&self, nonce: Option<&str>) -> Result<PolicyConfig> {
        let mut builder = self.to_builder();
        builder.script_nonce = nonce.map(str::to_string);
        builder.style_nonce = nonce.map(str::to_string);
        builder.build()
    }
}

impl Default for PolicyConfig {
    /// Enforcing, `upgrade-insecure-requests`, no nonces, hashes or report
    /// endpoint
    fn default() -> Self {
        Self {
            report_only: false,
            report_uri: None,
            upgrade_insecure_requests: true,
            script_nonce: None,
            style_nonce: None,
            script_hashes: Vec::new(),
            style_hashes: Vec::new(),
        }
    }
}

/// Unvalidated inputs for a [`PolicyConfig`]
#[derive(Debug, Clone)]
pub struct PolicyConfigBuilder {
    report_only: bool,
    report_uri: Option<String>,
    upgrade_insecure_requests: bool,
    script_nonce: Option<String>,
    style_nonce: Option<String>,
    script_hashes: Vec<String>,
    style_hashes: Vec<String>,
}

impl Default for PolicyConfigBuilder {
    fn default() -> Self {
        PolicyConfig::default().to_builder()
    }
}

impl PolicyConfigBuilder {
    pub fn report_only(mut self, enabled: bool) -> Self {
        self.report_only = enabled;
        self
    }

    pub fn report_uri(mut self, uri: impl Into<String>) -> Self {
        self.report_uri = Some(uri.into());
        self
    }

    pub fn upgrade_insecure_requests(mut self, enabled: bool) -> Self {
        self.upgrade_insecure_requests = enabled;
        self
    }

    pub fn script_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.script_nonce = Some(nonce.into());
        self
    }

    pub fn style_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.style_nonce = Some(nonce.into());
        self
    }

    /// Use one nonce for both scripts and styles
    pub fn nonce(self, nonce: impl Into<String>) -> Self {
        let nonce = nonce.into();
        self.script_nonce(nonce.clone()).style_nonce(nonce)
    }

    pub fn script_hash(mut self, hash: impl Into<String>) -> Self {
        self.script_hashes.push(hash.into());
        self
    }

    pub fn script_hashes<I, S>(mut self, hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script_hashes.extend(hashes.into_iter().map(Into::into));
        self
    }

    pub fn style_hash(mut self, hash: impl Into<String>) -> Self {
        self.style_hashes.push(hash.into());
        self
    }

    pub fn style_hashes<I, S>(mut self, hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.style_hashes.extend(hashes.into_iter().map(Into::into));
        self
    }

    /// Validate every value and normalize hashes
    pub fn build(self) -> Result<PolicyConfig> {
        let script_nonce = self.script_nonce.map(validate_nonce).transpose()?;
        let style_nonce = self.style_nonce.map(validate_nonce).transpose()?;
        let report_uri = self.report_uri.map(validate_report_uri).transpose()?;

        Ok(PolicyConfig {
            report_only: self.report_only,
            report_uri,
            upgrade_insecure_requests: self.upgrade_insecure_requests,
            script_nonce,
            style_nonce,
            script_hashes: normalize_hashes(&self.script_hashes)?,
            style_hashes: normalize_hashes(&self.style_hashes)?,
        })
    }
}

/// Normalize a digest into a quoted hash source.
///
/// Surrounding single quotes are stripped, a missing algorithm prefix
/// becomes `sha256-`, and the digest must be base64 (standard or URL-safe).
///
/// ```
/// use bulwark_security::content_security_policy::normalize_hash;
///
/// assert_eq!(normalize_hash("'sha256-XYZ'").unwrap(), "'sha256-XYZ'");
/// assert_eq!(normalize_hash("XYZ2").unwrap(), "'sha256-XYZ2'");
/// assert!(normalize_hash("").is_err());
/// ```
pub fn normalize_hash(raw: &str) -> Result<String> {
    let stripped = raw.trim_matches('\'');

    let (algorithm, digest) = match stripped.split_once('-') {
        Some((algorithm, digest)) if HASH_ALGORITHMS.contains(&algorithm) => (algorithm, digest),
        _ => ("sha256", stripped),
    };

    if !is_base64_value(digest) {
        return Err(SecurityError::MalformedHash(raw.to_string()));
    }

    Ok(format!("'{}-{}'", algorithm, digest))
}

fn normalize_hashes(raw: &[String]) -> Result<Vec<String>> {
    raw.iter().map(|hash| normalize_hash(hash)).collect()
}

fn validate_nonce(nonce: String) -> Result<String> {
    if is_base64_value(&nonce) {
        Ok(nonce)
    } else {
        Err(SecurityError::MalformedNonce(nonce))
    }
}

fn validate_report_uri(uri: String) -> Result<String> {
    if is_source_token(&uri) {
        Ok(uri)
    } else {
        Err(SecurityError::InvalidReportUri(uri))
    }
}

/// `base64-value` from the CSP grammar: `1*( ALPHA / DIGIT / "+" / "/" /
/// "-" / "_" ) *2( "=" )`
pub(crate) fn is_base64_value(value: &str) -> bool {
    let body = value.trim_end_matches('=');
    let padding = value.len() - body.len();

    !body.is_empty()
        && padding <= 2
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'-' | b'_'))
}
