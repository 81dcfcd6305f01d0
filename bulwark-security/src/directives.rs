//! CSP directive tables
//!
//! A [`DirectiveTable`] maps directive names to ordered source lists. Order
//! matters: directives render in insertion order, so equal tables always
//! produce byte-identical headers.

use crate::error::{Result, SecurityError};
use once_cell::sync::Lazy;
use std::sync::Arc;

pub const DEFAULT_SRC: &str = "default-src";
pub const SCRIPT_SRC: &str = "script-src";
pub const STYLE_SRC: &str = "style-src";
pub const IMG_SRC: &str = "img-src";
pub const FONT_SRC: &str = "font-src";
pub const CONNECT_SRC: &str = "connect-src";
pub const FRAME_SRC: &str = "frame-src";
pub const OBJECT_SRC: &str = "object-src";
pub const BASE_URI: &str = "base-uri";
pub const FORM_ACTION: &str = "form-action";
pub const REPORT_URI: &str = "report-uri";
pub const UPGRADE_INSECURE_REQUESTS: &str = "upgrade-insecure-requests";

/// Directives every finalized table must carry, with their only allowed value.
const PINNED: &[(&str, &str)] = &[
    (DEFAULT_SRC, "'self'"),
    (FRAME_SRC, "'none'"),
    (OBJECT_SRC, "'none'"),
    (BASE_URI, "'self'"),
    (FORM_ACTION, "'self'"),
];

/// Rendered from [`PolicyConfig`](crate::content_security_policy::PolicyConfig)
/// only; a baseline carrying them would leak into development policies.
const CONFIG_DIRECTIVES: &[&str] = &[REPORT_URI, UPGRADE_INSECURE_REQUESTS];

const BASELINE_DIRECTIVES: &[(&str, &[&str])] = &[
    (DEFAULT_SRC, &["'self'"]),
    (
        SCRIPT_SRC,
        &[
            "'self'",
            "https://www.googletagmanager.com",
            "https://www.google-analytics.com",
            "https://js.sentry-cdn.com",
            "https://www.clarity.ms",
        ],
    ),
    (STYLE_SRC, &["'self'", "https://fonts.googleapis.com"]),
    (
        IMG_SRC,
        &[
            "'self'",
            "data:",
            "https:",
            "https://www.google-analytics.com",
            "https://www.googletagmanager.com",
        ],
    ),
    (FONT_SRC, &["'self'", "https://fonts.gstatic.com", "data:"]),
    (
        CONNECT_SRC,
        &[
            "'self'",
            "https://www.google-analytics.com",
            "https://region1.google-analytics.com",
            "https://www.googletagmanager.com",
            "https://*.ingest.sentry.io",
            "https://www.clarity.ms",
            "https://c.clarity.ms",
        ],
    ),
    (FRAME_SRC, &["'none'"]),
    (OBJECT_SRC, &["'none'"]),
    (BASE_URI, &["'self'"]),
    (FORM_ACTION, &["'self'"]),
];

static BASELINE: Lazy<Arc<DirectiveTable>> = Lazy::new(|| {
    Arc::new(DirectiveTable {
        directives: BASELINE_DIRECTIVES
            .iter()
            .map(|(name, sources)| {
                (
                    name.to_string(),
                    sources.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect(),
    })
});

/// Ordered mapping from directive name to source expressions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveTable {
    directives: Vec<(String, Vec<String>)>,
}

impl DirectiveTable {
    /// Empty table; fails [`validate`](Self::validate) until populated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh copy of the built-in baseline
    pub fn baseline() -> Self {
        BASELINE.as_ref().clone()
    }

    /// The process-wide baseline, built once and never mutated
    pub fn shared_baseline() -> Arc<DirectiveTable> {
        Arc::clone(&BASELINE)
    }

    /// Set a directive's sources, keeping its position if already present
    pub fn directive<I, S>(mut self, name: impl Into<String>, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(name, sources.into_iter().map(Into::into).collect());
        self
    }

    /// Replace a directive's sources, or add it at the end
    pub fn set(&mut self, name: impl Into<String>, sources: Vec<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(index) => self.directives[index].1 = sources,
            None => self.directives.push((name, sources)),
        }
    }

    /// Append one source to a directive, adding the directive at the end if
    /// it does not exist yet
    pub fn append(&mut self, name: &str, source: impl Into<String>) {
        let source = source.into();
        match self.position(name) {
            Some(index) => self.directives[index].1.push(source),
            None => self.directives.push((name.to_string(), vec![source])),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name)
            .map(|index| self.directives[index].1.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.directives.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.directives
            .iter()
            .map(|(name, sources)| (name.as_str(), sources.as_slice()))
    }

    /// Render as `name src src; name src` in insertion order
    pub fn render(&self) -> String {
        self.directives
            .iter()
            .map(|(name, sources)| format!("{} {}", name, sources.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Check the table can be rendered into a well-formed policy.
    ///
    /// Rejects empty tables, malformed names or sources, empty source lists,
    /// `report-uri` and `upgrade-insecure-requests` entries, and any
    /// deviation from the pinned `default-src`, `frame-src`, `object-src`,
    /// `base-uri` and `form-action` values.
    pub fn validate(&self) -> Result<()> {
        if self.directives.is_empty() {
            return Err(SecurityError::InvalidBaseline(
                "table has no directives".to_string(),
            ));
        }

        for (index, (name, sources)) in self.directives.iter().enumerate() {
            if !is_directive_name(name) {
                return Err(SecurityError::InvalidBaseline(format!(
                    "invalid directive name {:?}",
                    name
                )));
            }
            if CONFIG_DIRECTIVES.contains(&name.as_str()) {
                return Err(SecurityError::InvalidBaseline(format!(
                    "directive {} is set by the policy config, not the baseline",
                    name
                )));
            }
            if self.directives[..index].iter().any(|(seen, _)| seen == name) {
                return Err(SecurityError::InvalidBaseline(format!(
                    "directive {} appears twice",
                    name
                )));
            }
            if sources.is_empty() {
                return Err(SecurityError::InvalidBaseline(format!(
                    "directive {} has no sources",
                    name
                )));
            }
            if let Some(bad) = sources.iter().find(|s| !is_source_token(s)) {
                return Err(SecurityError::InvalidBaseline(format!(
                    "directive {} has malformed source {:?}",
                    name, bad
                )));
            }
        }

        for (name, value) in PINNED {
            match self.get(name) {
                Some([only]) if only == value => {}
                Some(other) => {
                    return Err(SecurityError::InvalidBaseline(format!(
                        "{} must be exactly {} (got {})",
                        name,
                        value,
                        other.join(" ")
                    )));
                }
                None => {
                    return Err(SecurityError::InvalidBaseline(format!(
                        "missing required directive {}",
                        name
                    )));
                }
            }
        }

        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.directives.iter().position(|(key, _)| key == name)
    }
}

fn is_directive_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// A source expression may not contain whitespace or the `;` and `,`
/// separators, which would split it into another directive or policy.
pub(crate) fn is_source_token(source: &str) -> bool {
    !source.is_empty()
        && source
            .chars()
            .all(|c| c.is_ascii_graphic() && c != ';' && c != ',')
}
