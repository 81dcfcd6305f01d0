// Bulwark - per-request Content-Security-Policy nonces and HTTP security
// headers for Rust web pipelines.
//
// The core crate provides the request/response types and the middleware
// chain; the security crate issues nonces, renders policies and writes
// headers; the config crate loads startup settings.

// Re-export core functionality
pub use bulwark_core::*;

// Re-export optional crates
#[cfg(feature = "config")]
pub use bulwark_config;

#[cfg(feature = "security")]
pub use bulwark_security;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Error, HandlerFn, HttpRequest, HttpResponse, HttpStatus, LoggingMiddleware, Middleware,
        MiddlewareChain, handler,
    };

    pub use crate::logging::{LogConfig, LogFormat, LogLevel, LogOutput};

    #[cfg(feature = "config")]
    pub use bulwark_config::{Environment, SecuritySettings};

    #[cfg(feature = "security")]
    pub use bulwark_security::{
        CspNonce, CspReportHandler, PolicyBuilder, PolicyConfig, SecurityHeaders,
        SecurityHeadersConfig, SecurityHeadersMiddleware, generate_csp, generate_nonce,
        get_environment_csp, get_security_headers,
    };
}
