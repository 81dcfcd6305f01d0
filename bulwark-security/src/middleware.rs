//! Security headers middleware
//!
//! Runs once per request: issues a nonce, hands it to the handler through
//! the request's typed extensions, renders the policy for the configured
//! environment, and writes the full header set onto whatever response comes
//! back, including error responses.
//!
//! ```
//! use bulwark_core::{HttpRequest, HttpResponse, MiddlewareChain, handler};
//! use bulwark_config::Environment;
//! use bulwark_security::middleware::{CspNonce, SecurityHeadersMiddleware};
//!
//! # tokio_test::block_on(async {
//! let mut chain = MiddlewareChain::new();
//! chain.use_middleware(SecurityHeadersMiddleware::new(Environment::Production));
//!
//! let page = handler(|req: HttpRequest| async move {
//!     let nonce = req.extension::<CspNonce>().map(|n| n.attribute()).unwrap_or_default();
//!     Ok(HttpResponse::ok().with_html(format!("<script {}>boot()</script>", nonce)))
//! });
//!
//! let response = chain
//!     .respond(HttpRequest::new("GET".into(), "/".into()), page)
//!     .await;
//! assert!(response.header("Content-Security-Policy").is_some());
//! # });
//! ```

use crate::content_security_policy::PolicyConfig;
use crate::error::Result;
use crate::headers::{SecurityHeaders, SecurityHeadersConfig};
use crate::hsts::{HstsConfig, PRELOAD_MIN_MAX_AGE};
use crate::nonce::NonceGenerator;
use crate::policy::PolicyBuilder;
use async_trait::async_trait;
use bulwark_config::{Environment, SecuritySettings};
use bulwark_core::middleware::Next;
use bulwark_core::{Error, HttpRequest, HttpResponse, Middleware};
use std::fmt;
use tracing::{error, info, trace, warn};

/// The nonce issued for the current request.
///
/// Stored in the request's extensions; templates put
/// [`attribute`](Self::attribute) on every inline `<script>` and `<style>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspNonce(pub String);

impl CspNonce {
    pub fn value(&self) -> &str {
        &self.0
    }

    /// `nonce="<value>"`
    pub fn attribute(&self) -> String {
        format!("nonce=\"{}\"", self.0)
    }
}

impl fmt::Display for CspNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request hook that emits the CSP and security headers
#[derive(Debug, Clone)]
pub struct SecurityHeadersMiddleware {
    builder: PolicyBuilder,
    environment: Environment,
    mode: Mode,
}

#[derive(Debug, Clone)]
enum Mode {
    /// Fresh nonce and policy per request
    PerRequest {
        nonces: NonceGenerator,
        config: PolicyConfig,
    },
    /// One pre-rendered header set for every response
    Fixed { headers: SecurityHeaders },
}

impl SecurityHeadersMiddleware {
    /// Per-request nonces over the built-in baseline, shaped for
    /// `environment`
    pub fn new(environment: Environment) -> Self {
        Self {
            builder: PolicyBuilder::default(),
            environment,
            mode: Mode::PerRequest {
                nonces: NonceGenerator::default(),
                config: PolicyConfig::default().for_environment(environment.is_development()),
            },
        }
    }

    /// Build from startup settings: hashes, report endpoint, nonce size and
    /// HSTS max-age
    pub fn from_settings(settings: &SecuritySettings) -> Result<Self> {
        let mut config = PolicyConfig::builder()
            .script_hashes(settings.script_hashes.iter().cloned())
            .style_hashes(settings.style_hashes.iter().cloned());
        if let Some(ref uri) = settings.report_uri {
            config = config.report_uri(uri.clone());
        }
        let config = config.build()?;

        let hsts = HstsConfig::new(settings.hsts_max_age)
            .preload(settings.hsts_max_age >= PRELOAD_MIN_MAX_AGE);
        let builder =
            PolicyBuilder::default().with_headers(SecurityHeadersConfig::default().with_hsts(hsts));

        info!(
            environment = %settings.environment,
            nonce_size = settings.nonce_size,
            script_hashes = settings.script_hashes.len(),
            style_hashes = settings.style_hashes.len(),
            "Security headers configured"
        );

        Ok(Self {
            builder,
            environment: settings.environment,
            mode: Mode::PerRequest {
                nonces: NonceGenerator::new(settings.nonce_size)?,
                config: config.for_environment(settings.environment.is_development()),
            },
        })
    }

    /// Static mode: render `config` once for `domain` and apply it to every
    /// response without generating nonces. The config is used as given.
    pub fn fixed(domain: &str, config: &PolicyConfig) -> Self {
        Self::fixed_with(PolicyBuilder::default(), domain, config)
    }

    pub fn fixed_with(builder: PolicyBuilder, domain: &str, config: &PolicyConfig) -> Self {
        let headers = builder.security_headers(domain, config);
        Self {
            builder,
            environment: Environment::default(),
            mode: Mode::Fixed { headers },
        }
    }

    /// Replace the policy builder for per-request rendering. A fixed header
    /// set keeps the builder it was rendered with; use [`fixed_with`](Self::fixed_with).
    pub fn with_policy_builder(mut self, builder: PolicyBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Replace the nonce generator; no effect in static mode
    pub fn with_nonce_generator(mut self, generator: NonceGenerator) -> Self {
        if let Mode::PerRequest { ref mut nonces, .. } = self.mode {
            *nonces = generator;
        }
        self
    }

    /// Replace the base policy; it is reshaped for the environment
    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        if let Mode::PerRequest { ref mut config, .. } = self.mode {
            *config = policy.for_environment(self.environment.is_development());
        }
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.mode, Mode::Fixed { .. })
    }

    /// The environment-shaped base policy, before any nonce is added
    pub fn policy(&self) -> Option<&PolicyConfig> {
        match self.mode {
            Mode::PerRequest { ref config, .. } => Some(config),
            Mode::Fixed { .. } => None,
        }
    }

    /// Headers for one request with the given host and nonce.
    ///
    /// Fails with `MalformedNonce` unless the nonce is a CSP `base64-value`.
    pub fn headers_for(&self, host: &str, nonce: Option<&str>) -> Result<SecurityHeaders> {
        match self.mode {
            Mode::PerRequest { ref config, .. } => Ok(self
                .builder
                .security_headers(host, &config.with_nonce(nonce)?)),
            Mode::Fixed { ref headers } => Ok(headers.clone()),
        }
    }

    fn issue_nonce(&self, req: &HttpRequest) -> Option<String> {
        let Mode::PerRequest { ref nonces, .. } = self.mode else {
            return None;
        };

        match nonces.generate() {
            Ok(nonce) => Some(nonce),
            Err(err) => {
                error!(
                    error = %err,
                    method = %req.method,
                    path = %req.path,
                    "Nonce generation failed, sending policy without nonce"
                );
                None
            }
        }
    }
}

#[async_trait]
impl Middleware for SecurityHeadersMiddleware {
    async fn handle(&self, mut req: HttpRequest, next: Next) -> std::result::Result<HttpResponse, Error> {
        let nonce = self.issue_nonce(&req);
        if let Some(ref nonce) = nonce {
            req.insert_extension(CspNonce(nonce.clone()));
        }

        let host = req.host().unwrap_or_default().to_string();
        let headers = match self.headers_for(&host, nonce.as_deref()) {
            Ok(headers) => headers,
            Err(err) => {
                error!(error = %err, "Rejected nonce, sending policy without nonce");
                self.headers_for(&host, None)?
            }
        };

        trace!(
            host = %host,
            header_count = headers.len(),
            fixed = self.is_fixed(),
            "Applying security headers"
        );

        let mut response = match next(req).await {
            Ok(response) => response,
            Err(err) => {
                warn!(status = err.status_code(), error = %err, "Handler failed");
                err.into_response()
            }
        };

        headers.apply_to(&mut response);
        Ok(response)
    }
}
