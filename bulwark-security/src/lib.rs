//! Per-request Content Security Policy and security headers for Bulwark.
//!
//! Every request gets a fresh nonce from the OS CSPRNG, a policy rendered
//! from an immutable baseline directive table, and the full set of security
//! headers: CSP, HSTS, `X-Frame-Options`, `X-Content-Type-Options`,
//! `X-XSS-Protection`, `Referrer-Policy`, `Permissions-Policy` and the three
//! cross-origin isolation headers.
//!
//! # Example
//!
//! ```
//! use bulwark_security::{PolicyConfig, generate_csp, get_environment_csp, get_security_headers};
//!
//! let config = PolicyConfig::builder()
//!     .nonce("r4nd0m")
//!     .script_hash("B2yPHKaXnvFWtRChIbabYmUBFZdVfKKXHbWtWidDVF8=")
//!     .build()
//!     .unwrap();
//!
//! let csp = generate_csp(&config);
//! assert!(csp.value.contains("'nonce-r4nd0m'"));
//!
//! // Development is always report-only
//! assert_eq!(get_environment_csp(&config, true).name, "Content-Security-Policy-Report-Only");
//!
//! let headers = get_security_headers("example.com", &config);
//! assert_eq!(headers.get("X-Frame-Options"), Some("DENY"));
//! ```
//!
//! In an application the [`SecurityHeadersMiddleware`] does all of this per
//! request and stores the nonce as a [`CspNonce`] request extension for the
//! templating layer.

pub mod content_security_policy;
pub mod content_type_options;
pub mod cross_origin;
pub mod directives;
pub mod error;
pub mod frame_guard;
pub mod headers;
pub mod hsts;
pub mod middleware;
pub mod nonce;
pub mod permissions_policy;
pub mod policy;
pub mod referrer_policy;
pub mod report;
pub mod xss_filter;

pub use content_security_policy::{
    CSP_HEADER, CSP_REPORT_ONLY_HEADER, CspHeader, DEFAULT_REPORT_URI, HashAlgorithm, PolicyConfig,
    PolicyConfigBuilder, hash_source, normalize_hash,
};
pub use content_type_options::ContentTypeOptions;
pub use cross_origin::{CrossOriginEmbedderPolicy, CrossOriginOpenerPolicy, CrossOriginResourcePolicy};
pub use directives::DirectiveTable;
pub use error::{Result, SecurityError};
pub use frame_guard::FrameGuard;
pub use headers::{SecurityHeader, SecurityHeaders, SecurityHeadersConfig};
pub use hsts::HstsConfig;
pub use middleware::{CspNonce, SecurityHeadersMiddleware};
pub use nonce::{EntropySource, NonceGenerator, OsEntropy, generate_nonce};
pub use permissions_policy::{Allowlist, PermissionsPolicy};
pub use policy::{PolicyBuilder, generate_csp, get_environment_csp, get_security_headers};
pub use referrer_policy::ReferrerPolicy;
pub use report::{CspReportHandler, CspViolation, parse_reports};
pub use xss_filter::XssFilter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_error_into_core_error() {
        let err: bulwark_core::Error = SecurityError::MalformedReport("bad".into()).into();
        assert_eq!(err.status_code(), 400);

        let err: bulwark_core::Error = SecurityError::EntropyUnavailable("none".into()).into();
        assert_eq!(err.status_code(), 503);

        let err: bulwark_core::Error = SecurityError::MalformedHash("x y".into()).into();
        assert_eq!(err.status_code(), 500);
    }
}
