//! CSP violation report endpoint
//!
//! Browsers POST violations to the policy's `report-uri` in one of two
//! shapes:
//!
//! - the legacy envelope, `{"csp-report": {"document-uri": ..., ...}}`, sent
//!   as `application/csp-report`
//! - a Reporting API batch, `[{"type": "csp-violation", "body": {...}}]`,
//!   sent as `application/reports+json`
//!
//! [`CspReportHandler`] accepts both, logs every violation and answers
//! `204 No Content`.

use crate::content_security_policy::DEFAULT_REPORT_URI;
use crate::error::{Result, SecurityError};
use async_trait::async_trait;
use bulwark_config::SecuritySettings;
use bulwark_core::middleware::Next;
use bulwark_core::{Error, HandlerFn, HttpRequest, HttpResponse, Middleware, handler};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Largest report body accepted, in bytes
pub const MAX_REPORT_BODY_SIZE: usize = 64 * 1024;

const SUPPORTED_CONTENT_TYPES: &[&str] = &[
    "application/csp-report",
    "application/json",
    "application/reports+json",
];

/// One violation, in legacy `report-uri` field names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CspViolation {
    pub document_uri: Option<String>,
    pub referrer: Option<String>,
    pub violated_directive: Option<String>,
    pub effective_directive: Option<String>,
    pub original_policy: Option<String>,
    pub disposition: Option<String>,
    pub blocked_uri: Option<String>,
    pub status_code: Option<u16>,
    pub source_file: Option<String>,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
    pub script_sample: Option<String>,
}

#[derive(Deserialize)]
struct LegacyEnvelope {
    #[serde(rename = "csp-report")]
    csp_report: CspViolation,
}

#[derive(Deserialize)]
struct Report {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    body: Value,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ReportBody {
    #[serde(rename = "documentURL")]
    document_url: Option<String>,
    referrer: Option<String>,
    #[serde(rename = "blockedURL")]
    blocked_url: Option<String>,
    effective_directive: Option<String>,
    original_policy: Option<String>,
    source_file: Option<String>,
    sample: Option<String>,
    disposition: Option<String>,
    status_code: Option<u16>,
    line_number: Option<u32>,
    column_number: Option<u32>,
}

impl From<ReportBody> for CspViolation {
    fn from(body: ReportBody) -> Self {
        Self {
            document_uri: body.document_url,
            referrer: body.referrer,
            violated_directive: body.effective_directive.clone(),
            effective_directive: body.effective_directive,
            original_policy: body.original_policy,
            disposition: body.disposition,
            blocked_uri: body.blocked_url,
            status_code: body.status_code,
            source_file: body.source_file,
            line_number: body.line_number,
            column_number: body.column_number,
            script_sample: body.sample,
        }
    }
}

/// Parse a report body in either format.
///
/// Reporting API entries of other types (deprecation, intervention, ...) are
/// skipped.
pub fn parse_reports(body: &[u8]) -> Result<Vec<CspViolation>> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| SecurityError::MalformedReport(e.to_string()))?;

    match value {
        Value::Array(_) => {
            let reports: Vec<Report> = serde_json::from_value(value)
                .map_err(|e| SecurityError::MalformedReport(e.to_string()))?;
            reports
                .into_iter()
                .filter(|report| report.kind == "csp-violation")
                .map(|report| {
                    serde_json::from_value::<ReportBody>(report.body)
                        .map(CspViolation::from)
                        .map_err(|e| SecurityError::MalformedReport(e.to_string()))
                })
                .collect()
        }
        Value::Object(_) => {
            let envelope: LegacyEnvelope = serde_json::from_value(value)
                .map_err(|e| SecurityError::MalformedReport(e.to_string()))?;
            Ok(vec![envelope.csp_report])
        }
        _ => Err(SecurityError::MalformedReport(
            "expected a csp-report object or a report array".to_string(),
        )),
    }
}

/// Receives violation reports at a fixed path
#[derive(Debug, Clone)]
pub struct CspReportHandler {
    path: String,
    max_body_size: usize,
}

impl CspReportHandler {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            max_body_size: MAX_REPORT_BODY_SIZE,
        }
    }

    /// Handler for the `report-uri` the production policy will carry.
    ///
    /// `None` in development, where the policy has no report endpoint, and
    /// when the endpoint is an absolute URL served elsewhere.
    pub fn from_settings(settings: &SecuritySettings) -> Option<Self> {
        if settings.environment.is_development() {
            return None;
        }

        let uri = settings.report_uri.as_deref().unwrap_or(DEFAULT_REPORT_URI);
        uri.starts_with('/').then(|| Self::new(uri))
    }

    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the request targets this endpoint, ignoring any query string
    pub fn matches(&self, req: &HttpRequest) -> bool {
        req.path.split('?').next() == Some(self.path.as_str())
    }

    /// Answer one report request
    pub fn respond(&self, req: &HttpRequest) -> HttpResponse {
        if !req.method.eq_ignore_ascii_case("POST") {
            return Error::MethodNotAllowed(format!("{} {}", req.method, self.path))
                .into_response()
                .with_header("Allow", "POST");
        }

        if req.body.len() > self.max_body_size {
            return Error::PayloadTooLarge(format!(
                "report body is {} bytes (limit {})",
                req.body.len(),
                self.max_body_size
            ))
            .into_response();
        }

        if let Some(content_type) = req.content_type()
            && !SUPPORTED_CONTENT_TYPES
                .iter()
                .any(|supported| content_type.eq_ignore_ascii_case(supported))
        {
            return Error::UnsupportedMediaType(content_type.to_string()).into_response();
        }

        match parse_reports(&req.body) {
            Ok(violations) => {
                for violation in &violations {
                    log_violation(violation);
                }
                debug!(count = violations.len(), "Processed CSP reports");
                HttpResponse::no_content()
            }
            Err(err) => Error::from(err).into_response(),
        }
    }

    /// Standalone handler for mounting the endpoint directly
    pub fn into_handler(self) -> HandlerFn {
        let this = Arc::new(self);
        handler(move |req: HttpRequest| {
            let this = Arc::clone(&this);
            async move { Ok(this.respond(&req)) }
        })
    }
}

#[async_trait]
impl Middleware for CspReportHandler {
    async fn handle(&self, req: HttpRequest, next: Next) -> std::result::Result<HttpResponse, Error> {
        if self.matches(&req) {
            Ok(self.respond(&req))
        } else {
            next(req).await
        }
    }
}

fn log_violation(violation: &CspViolation) {
    warn!(
        document_uri = violation.document_uri.as_deref().unwrap_or("-"),
        violated_directive = violation.violated_directive.as_deref().unwrap_or("-"),
        blocked_uri = violation.blocked_uri.as_deref().unwrap_or("-"),
        disposition = violation.disposition.as_deref().unwrap_or("-"),
        source_file = violation.source_file.as_deref().unwrap_or("-"),
        line_number = violation.line_number,
        "CSP violation reported"
    );
}
